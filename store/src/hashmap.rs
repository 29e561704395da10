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

//! Bucketed hash maps over head and body files. Rows carry a
//! next-link and the search key ahead of the payload, so a bucket is
//! a singly linked chain walked on find. Collision cost is chain
//! length only; bucket counts are fixed at create time.
//!
//! Committing a key into a bucket is the only step that makes a row
//! observable. Rows allocated but never committed are orphan blobs,
//! unreachable from any index and ignored on open and restore.

use crate::error::Error;
use crate::file_map::{Access, AccessMut, FileMap};
use crate::head::Head;
use crate::link::Link;
use crate::record::RecordManager;
use crate::slab::SlabManager;

/// Hash map of fixed-size rows: `[next: L][key: K][value]`.
pub struct HashRecordMap<const L: usize, const K: usize> {
	head: Head<L>,
	body: RecordManager<L>,
	value_size: usize,
}

impl<const L: usize, const K: usize> HashRecordMap<L, K> {
	/// Bind a head and a body file; rows are `L + K + value_size`.
	pub fn new(head: Head<L>, body: FileMap, value_size: usize) -> HashRecordMap<L, K> {
		HashRecordMap {
			head,
			body: RecordManager::new(body, L + K + value_size),
			value_size,
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

	/// The fixed value size in bytes.
	pub fn value_size(&self) -> usize {
		self.value_size
	}

	/// Logical row count (committed and orphaned).
	pub fn records(&self) -> u64 {
		self.body.count()
	}

	/// Find the first (most recent) row committed under `key`.
	pub fn find_link(&self, key: &[u8; K]) -> Result<Link<L>, Error> {
		let mut link = self.head.get_link(self.head.bucket(key))?;
		while !link.is_terminal() {
			let row = self.body.read(link)?;
			if &row[L..L + K] == &key[..] {
				return Ok(link);
			}
			link = Link::from_slice(&row);
		}
		Ok(Link::TERMINAL)
	}

	/// True if a row is committed under `key`.
	pub fn contains(&self, key: &[u8; K]) -> Result<bool, Error> {
		Ok(!self.find_link(key)?.is_terminal())
	}

	/// The search key stored in a row.
	pub fn key_at(&self, link: Link<L>) -> Result<[u8; K], Error> {
		let row = self.body.read(link)?;
		let mut key = [0u8; K];
		key.copy_from_slice(&row[L..L + K]);
		Ok(key)
	}

	/// Shared view of a row's value bytes.
	pub fn value(&self, link: Link<L>) -> Result<Access<'_>, Error> {
		Ok(self.body.read(link)?.narrow(L + K, self.value_size))
	}

	/// Exclusive view of a row's value bytes.
	pub fn value_mut(&self, link: Link<L>) -> Result<AccessMut<'_>, Error> {
		let offset = link.index() * self.body.record_size() + L + K;
		self.body.file().write_span(offset, self.value_size)
	}

	/// Allocate `count` uncommitted rows, returning the first link.
	pub fn allocate(&self, count: usize) -> Result<Link<L>, Error> {
		self.body.allocate(count)
	}

	/// Commit a row under `key`: the row's next-link is pointed at
	/// the current bucket chain and the bucket at the row. This is
	/// the observability step.
	pub fn commit(&self, link: Link<L>, key: &[u8; K]) -> Result<(), Error> {
		let bucket = self.head.bucket(key);
		let top = self.head.get_link(bucket)?;
		{
			let mut row = self.body.write(link)?;
			top.write_to(&mut row);
			row[L..L + K].copy_from_slice(&key[..]);
		}
		self.head.set_link(bucket, link)
	}

	/// Allocate, write and commit one row.
	pub fn put(&self, key: &[u8; K], value: &[u8]) -> Result<Link<L>, Error> {
		debug_assert_eq!(value.len(), self.value_size);
		let link = self.allocate(1)?;
		self.value_mut(link)?.copy_from_slice(value);
		self.commit(link, key)?;
		Ok(link)
	}

	/// Iterate every row committed under `key`, most recent first.
	pub fn it(&self, key: [u8; K]) -> KeyIter<'_, L, K> {
		let next = match self.head.get_link(self.head.bucket(&key)) {
			Ok(link) => link,
			Err(_) => Link::TERMINAL,
		};
		KeyIter {
			map: self,
			key,
			next,
		}
	}

	/// The top of a bucket chain (hash map enumeration).
	pub fn top(&self, bucket: usize) -> Result<Link<L>, Error> {
		self.head.get_link(bucket)
	}

	/// Record the body extent in the head and flush both files.
	pub fn flush(&self) -> Result<(), Error> {
		self.head.set_body_count(self.body.size() as u64)?;
		self.body.file().flush()?;
		self.head.flush()
	}

	/// Compare the body extent with the head record. True means the
	/// body carries orphan bytes (dirty); shorter bodies are corrupt.
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

/// Iterator over the rows committed under one key.
pub struct KeyIter<'a, const L: usize, const K: usize> {
	map: &'a HashRecordMap<L, K>,
	key: [u8; K],
	next: Link<L>,
}

impl<'a, const L: usize, const K: usize> Iterator for KeyIter<'a, L, K> {
	type Item = Link<L>;

	fn next(&mut self) -> Option<Link<L>> {
		while !self.next.is_terminal() {
			let link = self.next;
			let row = self.map.body.read(link).ok()?;
			self.next = Link::from_slice(&row);
			if &row[L..L + K] == &self.key[..] {
				return Some(link);
			}
		}
		None
	}
}

/// Hash map of variable-size rows: `[next: L][key: K][payload…]`.
pub struct HashSlabMap<const L: usize, const K: usize> {
	head: Head<L>,
	body: SlabManager<L>,
}

impl<const L: usize, const K: usize> HashSlabMap<L, K> {
	/// Bind a head and a body file.
	pub fn new(head: Head<L>, body: FileMap) -> HashSlabMap<L, K> {
		HashSlabMap {
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

	/// Find the first (most recent) slab committed under `key`.
	pub fn find_link(&self, key: &[u8; K]) -> Result<Link<L>, Error> {
		let mut link = self.head.get_link(self.head.bucket(key))?;
		while !link.is_terminal() {
			let row = self.body.read_span(link, L + K)?;
			if &row[L..L + K] == &key[..] {
				return Ok(link);
			}
			link = Link::from_slice(&row);
		}
		Ok(Link::TERMINAL)
	}

	/// True if a slab is committed under `key`.
	pub fn contains(&self, key: &[u8; K]) -> Result<bool, Error> {
		Ok(!self.find_link(key)?.is_terminal())
	}

	/// Open-ended view of a slab's payload; the caller parses the
	/// payload's own length from its content.
	pub fn payload(&self, link: Link<L>) -> Result<Access<'_>, Error> {
		let row = self.body.read(link)?;
		if row.len() < L + K {
			return Err(Error::Integrity);
		}
		let size = row.len() - (L + K);
		Ok(row.narrow(L + K, size))
	}

	/// Allocate, write and commit one slab under `key`.
	pub fn put(&self, key: &[u8; K], payload: &[u8]) -> Result<Link<L>, Error> {
		let bucket = self.head.bucket(key);
		let top = self.head.get_link(bucket)?;
		let size = L + K + payload.len();
		let link = self.body.allocate(size)?;
		{
			let mut row = self.body.write_span(link, size)?;
			top.write_to(&mut row);
			row[L..L + K].copy_from_slice(&key[..]);
			row[L + K..].copy_from_slice(payload);
		}
		self.head.set_link(bucket, link)?;
		Ok(link)
	}

	/// Iterate every slab committed under `key`, most recent first.
	pub fn it(&self, key: [u8; K]) -> SlabKeyIter<'_, L, K> {
		let next = match self.head.get_link(self.head.bucket(&key)) {
			Ok(link) => link,
			Err(_) => Link::TERMINAL,
		};
		SlabKeyIter {
			map: self,
			key,
			next,
		}
	}

	/// Record the body extent in the head and flush both files.
	pub fn flush(&self) -> Result<(), Error> {
		self.head.set_body_count(self.body.size() as u64)?;
		self.body.file().flush()?;
		self.head.flush()
	}

	/// Compare the body extent with the head record; see the record
	/// map variant.
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

/// Iterator over the slabs committed under one key.
pub struct SlabKeyIter<'a, const L: usize, const K: usize> {
	map: &'a HashSlabMap<L, K>,
	key: [u8; K],
	next: Link<L>,
}

impl<'a, const L: usize, const K: usize> Iterator for SlabKeyIter<'a, L, K> {
	type Item = Link<L>;

	fn next(&mut self) -> Option<Link<L>> {
		while !self.next.is_terminal() {
			let link = self.next;
			let row = self.map.body.read_span(link, L + K).ok()?;
			self.next = Link::from_slice(&row);
			if &row[L..L + K] == &self.key[..] {
				return Some(link);
			}
		}
		None
	}
}
