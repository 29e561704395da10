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

//! Table head files. A head holds a format version word, the body
//! byte count recorded at the last flush (crash detection), its own
//! cell count, and the bucket cells: one link per bucket,
//! terminal-filled at create.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;
use crate::file_map::FileMap;
use crate::link::Link;

/// Head format version word.
pub const HEAD_VERSION: u32 = 1;

/// Bytes of head metadata preceding the bucket cells:
/// version u32, body count u64, cell count u64.
pub const HEAD_PREFIX: usize = 20;

/// The bucket/array file of one table.
pub struct Head<const L: usize> {
	file: FileMap,
}

impl<const L: usize> Head<L> {
	/// Create a head with `buckets` terminal-filled cells.
	pub fn create(file: FileMap, buckets: usize) -> Result<Head<L>, Error> {
		file.open().map_err(|_| Error::CreateTable)?;
		file.load()?;
		file.truncate(0)?;
		file.set(0, HEAD_PREFIX, 0)?;
		file.set(HEAD_PREFIX, buckets * L, 0xff)?;
		let head = Head { file };
		head.write_word(0, HEAD_VERSION as u64, 4)?;
		head.set_body_count(0)?;
		head.write_word(12, buckets as u64, 8)?;
		Ok(head)
	}

	/// Open an existing head and verify its format version.
	pub fn open(file: FileMap) -> Result<Head<L>, Error> {
		file.open()?;
		file.load()?;
		if file.size() < HEAD_PREFIX {
			return Err(Error::VerifyTable);
		}
		let head = Head { file };
		if head.read_word(0, 4)? != HEAD_VERSION as u64 {
			return Err(Error::VerifyTable);
		}
		if HEAD_PREFIX + head.buckets() * L > head.file.size() {
			return Err(Error::VerifyTable);
		}
		Ok(head)
	}

	/// The underlying head file.
	pub fn file(&self) -> &FileMap {
		&self.file
	}

	/// Logical head size in bytes.
	pub fn size(&self) -> usize {
		HEAD_PREFIX + self.buckets() * L
	}

	/// Number of bucket cells.
	pub fn buckets(&self) -> usize {
		self.read_word(12, 8).unwrap_or(0) as usize
	}

	fn read_word(&self, offset: usize, width: usize) -> Result<u64, Error> {
		let view = self.file.read_span(offset, width)?;
		Ok(LittleEndian::read_uint(&view, width))
	}

	fn write_word(&self, offset: usize, value: u64, width: usize) -> Result<(), Error> {
		let mut view = self.file.write_span(offset, width)?;
		LittleEndian::write_uint(&mut view, value, width);
		Ok(())
	}

	/// The body byte count recorded at the last flush.
	pub fn body_count(&self) -> Result<u64, Error> {
		self.read_word(4, 8)
	}

	/// Record the body byte count (called at flush).
	pub fn set_body_count(&self, count: u64) -> Result<(), Error> {
		self.write_word(4, count, 8)
	}

	/// Map a search key to its bucket. Search keys are already
	/// uniformly distributed, so the low bytes are used directly.
	pub fn bucket(&self, key: &[u8]) -> usize {
		let width = std::cmp::min(key.len(), 8);
		let value = LittleEndian::read_uint(&key[..width], width);
		(value % self.buckets() as u64) as usize
	}

	/// Read the link stored in a cell; terminal beyond the head.
	pub fn get_link(&self, index: usize) -> Result<Link<L>, Error> {
		if index >= self.buckets() {
			return Ok(Link::TERMINAL);
		}
		let view = self.file.read_span(HEAD_PREFIX + index * L, L)?;
		Ok(Link::from_slice(&view))
	}

	/// Store a link into a cell, expanding the cell region to cover
	/// `index` (new cells terminal-filled).
	pub fn set_link(&self, index: usize, link: Link<L>) -> Result<(), Error> {
		let buckets = self.buckets();
		if index >= buckets {
			let size = HEAD_PREFIX + buckets * L;
			self.file.set(size, (index + 1) * L + HEAD_PREFIX - size, 0xff)?;
			self.write_word(12, (index + 1) as u64, 8)?;
		}
		let mut view = self.file.write_span(HEAD_PREFIX + index * L, L)?;
		link.write_to(&mut view);
		Ok(())
	}

	/// Refill every cell with the terminal sentinel.
	pub fn clear_links(&self) -> Result<(), Error> {
		self.file.set(HEAD_PREFIX, self.buckets() * L, 0xff)
	}

	/// Flush the head to disk.
	pub fn flush(&self) -> Result<(), Error> {
		self.file.flush()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn head(dir: &tempfile::TempDir, buckets: usize) -> Head<3> {
		let file = FileMap::new(dir.path().join("table.head"), 32, 50);
		Head::create(file, buckets).unwrap()
	}

	#[test]
	fn create_fills_cells_with_terminal() {
		let dir = tempfile::tempdir().unwrap();
		let head = head(&dir, 4);
		assert_eq!(head.buckets(), 4);
		for index in 0..4 {
			assert!(head.get_link(index).unwrap().is_terminal());
		}
	}

	#[test]
	fn links_round_trip_and_expand() {
		let dir = tempfile::tempdir().unwrap();
		let head = head(&dir, 2);
		head.set_link(1, Link::new(42)).unwrap();
		assert_eq!(head.get_link(1).unwrap().value(), 42);

		// Setting past the end expands with terminal fill.
		head.set_link(5, Link::new(7)).unwrap();
		assert_eq!(head.buckets(), 6);
		assert!(head.get_link(4).unwrap().is_terminal());
		assert_eq!(head.get_link(5).unwrap().value(), 7);
	}

	#[test]
	fn version_is_verified_on_open() {
		let dir = tempfile::tempdir().unwrap();
		{
			let head = head(&dir, 2);
			head.file().unload().unwrap();
			head.file().close().unwrap();
		}
		let file = FileMap::new(dir.path().join("table.head"), 32, 50);
		let reopened: Head<3> = Head::open(file).unwrap();
		assert_eq!(reopened.buckets(), 2);
	}
}
