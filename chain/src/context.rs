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

//! Validation context persisted with each header: the active fork
//! rules, the height and the median time past. The engine consults
//! the context for the storage-side consensus checks (bip30 duplicate
//! coinbase, bip68 relative locktime, coinbase maturity); everything
//! else about consensus lives outside the store.

bitflags! {
	/// Fork rules active at a given header.
	pub struct Forks: u32 {
		/// Disallow collision of unspent transaction hashes (bip30).
		const BIP30_RULE = 1 << 0;
		/// Enforce relative locktime (bip68).
		const BIP68_RULE = 1 << 1;
		/// Coinbase must include height (bip34).
		const BIP34_RULE = 1 << 2;
		/// Strict DER signatures (bip66).
		const BIP66_RULE = 1 << 3;
		/// Check locktime verify (bip65).
		const BIP65_RULE = 1 << 4;
		/// Check sequence verify (bip112).
		const BIP112_RULE = 1 << 5;
		/// Median time past for locktime (bip113).
		const BIP113_RULE = 1 << 6;
	}
}

/// Number of confirmations a coinbase output requires before spend.
pub const COINBASE_MATURITY: u32 = 100;

/// Relative locktime disable bit (bip68).
pub const SEQUENCE_DISABLED: u32 = 1 << 31;
/// Relative locktime time-type bit (bip68).
pub const SEQUENCE_TIME_TYPE: u32 = 1 << 22;
/// Relative locktime value mask (bip68).
pub const SEQUENCE_MASK: u32 = 0x0000_ffff;
/// Relative time locks are in units of 512 seconds (bip68).
pub const SEQUENCE_GRANULARITY: u32 = 9;
/// Transactions below this version are exempt from bip68.
pub const RELATIVE_LOCKTIME_MIN_VERSION: u32 = 2;

/// The validation context of one header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Context {
	/// Active fork rules.
	pub flags: Forks,
	/// Block height.
	pub height: u32,
	/// Median time past.
	pub mtp: u32,
}

impl Context {
	/// A context with no active forks at the given height.
	pub fn at_height(height: u32) -> Context {
		Context {
			flags: Forks::empty(),
			height,
			mtp: 0,
		}
	}
}

/// True if the input is still locked by bip68 relative locktime,
/// comparing the current context against the prevout's context.
pub fn is_relative_locked(
	sequence: u32,
	version: u32,
	current: &Context,
	prevout_height: u32,
	prevout_mtp: u32,
) -> bool {
	if version < RELATIVE_LOCKTIME_MIN_VERSION {
		return false;
	}
	if sequence & SEQUENCE_DISABLED != 0 {
		return false;
	}
	let value = sequence & SEQUENCE_MASK;
	if sequence & SEQUENCE_TIME_TYPE != 0 {
		prevout_mtp.saturating_add(value << SEQUENCE_GRANULARITY) > current.mtp
	} else {
		prevout_height.saturating_add(value) > current.height
	}
}

/// True if a coinbase output at `prevout_height` is not yet mature
/// at `height`.
pub fn is_immature(height: u32, prevout_height: u32) -> bool {
	prevout_height.saturating_add(COINBASE_MATURITY) > height
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maturity_boundary() {
		assert!(is_immature(100, 1));
		assert!(!is_immature(101, 1));
		assert!(is_immature(1, 0));
	}

	#[test]
	fn relative_locktime_height() {
		let current = Context {
			flags: Forks::BIP68_RULE,
			height: 10,
			mtp: 0,
		};
		// Locked for 5 blocks from a prevout at height 8.
		assert!(is_relative_locked(5, 2, &current, 8, 0));
		assert!(!is_relative_locked(2, 2, &current, 8, 0));
		// Version 1 and disabled sequences are exempt.
		assert!(!is_relative_locked(5, 1, &current, 8, 0));
		assert!(!is_relative_locked(5 | SEQUENCE_DISABLED, 2, &current, 8, 0));
	}

	#[test]
	fn relative_locktime_time() {
		let current = Context {
			flags: Forks::BIP68_RULE,
			height: 10,
			mtp: 10_000,
		};
		let sequence = SEQUENCE_TIME_TYPE | 4; // 4 * 512 seconds
		assert!(is_relative_locked(sequence, 2, &current, 8, 9_000));
		assert!(!is_relative_locked(sequence, 2, &current, 8, 7_000));
	}
}
