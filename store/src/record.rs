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

//! Fixed-size record allocator over a body file. Links are record
//! indexes; byte offsets are derived from the fixed record size.

use crate::error::Error;
use crate::file_map::{Access, AccessMut, FileMap};
use crate::link::Link;

/// Allocator of fixed-size records addressed by `Link<L>`.
pub struct RecordManager<const L: usize> {
	file: FileMap,
	record_size: usize,
}

impl<const L: usize> RecordManager<L> {
	/// Wrap a body file as a record store of `record_size`-byte rows.
	pub fn new(file: FileMap, record_size: usize) -> RecordManager<L> {
		debug_assert!(record_size > 0);
		RecordManager { file, record_size }
	}

	/// The fixed record size in bytes.
	pub fn record_size(&self) -> usize {
		self.record_size
	}

	/// The underlying body file.
	pub fn file(&self) -> &FileMap {
		&self.file
	}

	/// Logical record count.
	pub fn count(&self) -> u64 {
		(self.file.size() / self.record_size) as u64
	}

	/// Logical body size in bytes.
	pub fn size(&self) -> usize {
		self.file.size()
	}

	/// Extend the body by `count` records, returning the link of the
	/// first. The eof sentinel surfaces as `DiskFull` from the map.
	pub fn allocate(&self, count: usize) -> Result<Link<L>, Error> {
		let offset = self.file.allocate(count * self.record_size)?;
		Ok(Link::new((offset / self.record_size) as u64))
	}

	/// Truncate the body to `count` records, discarding the rest.
	pub fn truncate(&self, count: u64) -> Result<(), Error> {
		self.file.truncate(count as usize * self.record_size)
	}

	/// Shared view of one record.
	pub fn read(&self, link: Link<L>) -> Result<Access<'_>, Error> {
		self.file
			.read_span(link.index() * self.record_size, self.record_size)
	}

	/// Exclusive view of one record.
	pub fn write(&self, link: Link<L>) -> Result<AccessMut<'_>, Error> {
		self.file
			.write_span(link.index() * self.record_size, self.record_size)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn manager(dir: &tempfile::TempDir) -> RecordManager<4> {
		let file = FileMap::new(dir.path().join("records.data"), 64, 50);
		file.open().unwrap();
		file.load().unwrap();
		RecordManager::new(file, 8)
	}

	#[test]
	fn allocate_links_are_sequential() {
		let dir = tempfile::tempdir().unwrap();
		let records = manager(&dir);
		assert_eq!(records.count(), 0);
		assert_eq!(records.allocate(1).unwrap().value(), 0);
		assert_eq!(records.allocate(3).unwrap().value(), 1);
		assert_eq!(records.allocate(1).unwrap().value(), 4);
		assert_eq!(records.count(), 5);
	}

	#[test]
	fn write_then_read_round_trips() {
		let dir = tempfile::tempdir().unwrap();
		let records = manager(&dir);
		let link = records.allocate(2).unwrap();
		{
			let mut record = records.write(link).unwrap();
			record.copy_from_slice(&[7u8; 8]);
		}
		assert_eq!(&records.read(link).unwrap()[..], &[7u8; 8]);
	}

	#[test]
	fn truncate_pops_records() {
		let dir = tempfile::tempdir().unwrap();
		let records = manager(&dir);
		records.allocate(5).unwrap();
		records.truncate(2).unwrap();
		assert_eq!(records.count(), 2);
		assert!(records.read(Link::new(2)).is_err());
	}
}
