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

//! Dense-index maps, used where the key is already a surrogate
//! integer: the height indexes (push/pop arrays of bare links) and
//! the per-header caches (head cell per index pointing at a slab).

use crate::error::Error;
use crate::file_map::{Access, FileMap};
use crate::head::Head;
use crate::link::Link;
use crate::record::RecordManager;
use crate::slab::SlabManager;

/// Head cell per dense index, each pointing at a body slab.
pub struct ArrayMap<const L: usize> {
	head: Head<L>,
	body: SlabManager<L>,
}

impl<const L: usize> ArrayMap<L> {
	/// Bind a head and a body file.
	pub fn new(head: Head<L>, body: FileMap) -> ArrayMap<L> {
		ArrayMap {
			head,
			body: SlabManager::new(body),
		}
	}

	/// The head file wrapper.
	pub fn head(&self) -> &Head<L> {
		&self.head
	}

	/// The body slab manager.
	pub fn body(&self) -> &SlabManager<L> {
		&self.body
	}

	/// The slab link stored at `index`, terminal if never put.
	pub fn at(&self, index: usize) -> Result<Link<L>, Error> {
		self.head.get_link(index)
	}

	/// Allocate and write a slab, committing its link at `index`.
	pub fn put(&self, index: usize, payload: &[u8]) -> Result<Link<L>, Error> {
		let link = self.body.allocate(payload.len())?;
		self.body
			.write_span(link, payload.len())?
			.copy_from_slice(payload);
		self.head.set_link(index, link)?;
		Ok(link)
	}

	/// Open-ended view of a slab; the caller parses its length.
	pub fn payload(&self, link: Link<L>) -> Result<Access<'_>, Error> {
		self.body.read(link)
	}

	/// Drop every slab and terminal-fill the head (prune support).
	pub fn clear(&self) -> Result<(), Error> {
		self.body.truncate(0)?;
		self.head.clear_links()
	}

	/// Record the body extent in the head and flush both files.
	pub fn flush(&self) -> Result<(), Error> {
		self.head.set_body_count(self.body.size() as u64)?;
		self.body.file().flush()?;
		self.head.flush()
	}

	/// Compare the body extent with the head record.
	pub fn verify_body(&self) -> Result<bool, Error> {
		let recorded = self.head.body_count()? as usize;
		let actual = self.body.size();
		if actual < recorded {
			return Err(Error::VerifyTable);
		}
		Ok(actual > recorded)
	}

	/// Truncate the body back to the head-recorded extent.
	pub fn restore_body(&self) -> Result<(), Error> {
		let recorded = self.head.body_count()? as usize;
		if recorded > self.body.size() {
			return Err(Error::RestoreTable);
		}
		self.body.truncate(recorded)
	}
}

/// A push/pop array of bare links, indexed densely from zero. The
/// candidate and confirmed height indexes are instances; the top is
/// the count minus one.
pub struct ArrayIndex<const L: usize> {
	head: Head<L>,
	body: RecordManager<L>,
}

impl<const L: usize> ArrayIndex<L> {
	/// Bind a head and a body file; records are bare links.
	pub fn new(head: Head<L>, body: FileMap) -> ArrayIndex<L> {
		ArrayIndex {
			head,
			body: RecordManager::new(body, L),
		}
	}

	/// The head file wrapper.
	pub fn head(&self) -> &Head<L> {
		&self.head
	}

	/// The body record manager.
	pub fn body(&self) -> &RecordManager<L> {
		&self.body
	}

	/// Number of indexed entries.
	pub fn count(&self) -> u64 {
		self.body.count()
	}

	/// The link at `index`, terminal beyond the top.
	pub fn at(&self, index: usize) -> Result<Link<L>, Error> {
		if index as u64 >= self.count() {
			return Ok(Link::TERMINAL);
		}
		let record = self.body.read(Link::new(index as u64))?;
		Ok(Link::from_slice(&record))
	}

	/// Append a link at the top.
	pub fn push(&self, link: Link<L>) -> Result<(), Error> {
		let slot = self.body.allocate(1)?;
		link.write_to(&mut self.body.write(slot)?);
		Ok(())
	}

	/// Truncate the top entry.
	pub fn pop(&self) -> Result<(), Error> {
		let count = self.count();
		if count == 0 {
			return Err(Error::Integrity);
		}
		self.body.truncate(count - 1)
	}

	/// Record the body extent in the head and flush both files.
	pub fn flush(&self) -> Result<(), Error> {
		self.head.set_body_count(self.body.size() as u64)?;
		self.body.file().flush()?;
		self.head.flush()
	}

	/// Compare the body extent with the head record.
	pub fn verify_body(&self) -> Result<bool, Error> {
		let recorded = self.head.body_count()? as usize;
		let actual = self.body.size();
		if actual < recorded {
			return Err(Error::VerifyTable);
		}
		Ok(actual > recorded)
	}

	/// Truncate the body back to the head-recorded extent.
	pub fn restore_body(&self) -> Result<(), Error> {
		let recorded = self.head.body_count()? as usize;
		if recorded > self.body.size() {
			return Err(Error::RestoreTable);
		}
		self.body.file().truncate(recorded)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn array_index_push_pop() {
		let dir = tempfile::tempdir().unwrap();
		let head = Head::create(FileMap::new(dir.path().join("index.head"), 32, 50), 0).unwrap();
		let index: ArrayIndex<3> =
			ArrayIndex::new(head, FileMap::new(dir.path().join("index.data"), 32, 50));
		index.body().file().open().unwrap();
		index.body().file().load().unwrap();

		index.push(Link::new(5)).unwrap();
		index.push(Link::new(9)).unwrap();
		assert_eq!(index.count(), 2);
		assert_eq!(index.at(1).unwrap().value(), 9);
		assert!(index.at(2).unwrap().is_terminal());

		index.pop().unwrap();
		assert_eq!(index.count(), 1);
		assert!(index.at(1).unwrap().is_terminal());
	}

	#[test]
	fn array_map_put_and_clear() {
		let dir = tempfile::tempdir().unwrap();
		let head = Head::create(FileMap::new(dir.path().join("cache.head"), 32, 50), 4).unwrap();
		let map: ArrayMap<5> =
			ArrayMap::new(head, FileMap::new(dir.path().join("cache.data"), 32, 50));
		map.body().file().open().unwrap();
		map.body().file().load().unwrap();

		let link = map.put(2, b"payload").unwrap();
		assert_eq!(map.at(2).unwrap(), link);
		assert_eq!(&map.payload(link).unwrap()[..7], b"payload");
		assert!(map.at(3).unwrap().is_terminal());

		map.clear().unwrap();
		assert!(map.at(2).unwrap().is_terminal());
		assert_eq!(map.body().size(), 0);
	}
}
