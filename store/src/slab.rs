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

//! Variable-size slab allocator over a body file. Links are byte
//! offsets; each slab's length is implied by its record structure
//! (fixed prefix plus variable tail), so reads are bounded by the
//! body's logical size and parsed by the caller.

use crate::error::Error;
use crate::file_map::{Access, AccessMut, FileMap};
use crate::link::Link;

/// Allocator of variable-size slabs addressed by byte-offset `Link<L>`.
pub struct SlabManager<const L: usize> {
	file: FileMap,
}

impl<const L: usize> SlabManager<L> {
	/// Wrap a body file as a slab store.
	pub fn new(file: FileMap) -> SlabManager<L> {
		SlabManager { file }
	}

	/// The underlying body file.
	pub fn file(&self) -> &FileMap {
		&self.file
	}

	/// Logical body size in bytes.
	pub fn size(&self) -> usize {
		self.file.size()
	}

	/// Extend the body by `size` bytes, returning the slab link.
	pub fn allocate(&self, size: usize) -> Result<Link<L>, Error> {
		let offset = self.file.allocate(size)?;
		Ok(Link::new(offset as u64))
	}

	/// Truncate the body to `size` bytes.
	pub fn truncate(&self, size: usize) -> Result<(), Error> {
		self.file.truncate(size)
	}

	/// Shared view from the slab to the end of the body; the caller
	/// parses the slab's own length from its content.
	pub fn read(&self, link: Link<L>) -> Result<Access<'_>, Error> {
		self.file.read(link.index())
	}

	/// Shared view of exactly `size` bytes at the slab.
	pub fn read_span(&self, link: Link<L>, size: usize) -> Result<Access<'_>, Error> {
		self.file.read_span(link.index(), size)
	}

	/// Exclusive view of exactly `size` bytes at the slab.
	pub fn write_span(&self, link: Link<L>, size: usize) -> Result<AccessMut<'_>, Error> {
		self.file.write_span(link.index(), size)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slabs_are_byte_addressed() {
		let dir = tempfile::tempdir().unwrap();
		let file = FileMap::new(dir.path().join("slabs.data"), 32, 50);
		file.open().unwrap();
		file.load().unwrap();
		let slabs: SlabManager<5> = SlabManager::new(file);

		let first = slabs.allocate(10).unwrap();
		let second = slabs.allocate(3).unwrap();
		assert_eq!(first.value(), 0);
		assert_eq!(second.value(), 10);

		slabs.write_span(second, 3).unwrap().copy_from_slice(b"abc");
		assert_eq!(&slabs.read_span(second, 3).unwrap()[..], b"abc");

		// An open-ended read is bounded by the logical size.
		assert_eq!(slabs.read(first).unwrap().len(), 13);
	}
}
