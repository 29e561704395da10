// Copyright 2026 The Bedrock Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Surrogate keys into table bodies. A link is a fixed-width
//! little-endian integer of 3 to 5 bytes; the all-ones value is the
//! `terminal` sentinel meaning absent or end-of-chain.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// A fixed-width surrogate key of `N` little-endian bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link<const N: usize>(u64);

impl<const N: usize> Link<N> {
	/// Width of the serialized link in bytes.
	pub const BYTES: usize = N;

	/// The all-ones sentinel meaning absent or end-of-chain.
	pub const TERMINAL: Link<N> = Link(!0u64 >> (64 - 8 * N as u32));

	/// Construct from a raw value, saturating to terminal on overflow.
	pub fn new(value: u64) -> Link<N> {
		if value >= Self::TERMINAL.0 {
			Self::TERMINAL
		} else {
			Link(value)
		}
	}

	/// True if this is the terminal sentinel.
	pub fn is_terminal(self) -> bool {
		self == Self::TERMINAL
	}

	/// The raw link value.
	pub fn value(self) -> u64 {
		self.0
	}

	/// The raw link value as a usize index.
	pub fn index(self) -> usize {
		self.0 as usize
	}

	/// Deserialize a link from the first `N` bytes of the slice.
	pub fn from_slice(bytes: &[u8]) -> Link<N> {
		Link(LittleEndian::read_uint(&bytes[..N], N))
	}

	/// Serialize the link into the first `N` bytes of the slice.
	pub fn write_to(self, bytes: &mut [u8]) {
		LittleEndian::write_uint(&mut bytes[..N], self.0, N);
	}
}

impl<const N: usize> fmt::Debug for Link<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_terminal() {
			write!(f, "Link<{}>(terminal)", N)
		} else {
			write!(f, "Link<{}>({})", N, self.0)
		}
	}
}

impl<const N: usize> fmt::Display for Link<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

impl<const N: usize> Default for Link<N> {
	fn default() -> Link<N> {
		Self::TERMINAL
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn terminal_is_all_ones() {
		assert_eq!(Link::<3>::TERMINAL.value(), 0x00ff_ffff);
		assert_eq!(Link::<4>::TERMINAL.value(), 0xffff_ffff);
		assert_eq!(Link::<5>::TERMINAL.value(), 0x00ff_ffff_ffff);
	}

	#[test]
	fn round_trip() {
		let mut buf = [0u8; 5];
		let link = Link::<5>::new(0x01_0203_0405);
		link.write_to(&mut buf);
		assert_eq!(Link::<5>::from_slice(&buf), link);
		assert_eq!(buf, [0x05, 0x04, 0x03, 0x02, 0x01]);
	}

	#[test]
	fn overflow_saturates_to_terminal() {
		assert!(Link::<3>::new(0x0100_0000).is_terminal());
		assert!(!Link::<3>::new(0x00ff_fffe).is_terminal());
	}
}
