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

//! Record multimap: a hash map of key to chain head over an auxiliary
//! record manager of `[next][payload]` cells. Linking a cell pushes
//! it to the front of its key's chain; unlink pops the front. Cells
//! can be allocated (contiguously) and written long before they are
//! linked, which is how deferred commits keep crash consistency.

use crate::error::Error;
use crate::file_map::{Access, AccessMut, FileMap};
use crate::head::Head;
use crate::link::Link;
use crate::record::RecordManager;

/// Multi-value chain per key, built from an anchor hash map and an
/// auxiliary cell manager.
pub struct MultiMap<const L: usize, const K: usize> {
	anchors: crate::hashmap::HashRecordMap<L, K>,
	cells: RecordManager<L>,
	cell_head: Head<L>,
	cell_size: usize,
}

impl<const L: usize, const K: usize> MultiMap<L, K> {
	/// Bind an anchor head/body pair and a cell head/body pair; cells
	/// are `L + cell_size` bytes. The cell head carries no buckets,
	/// only the cell body extent record.
	pub fn new(
		head: Head<L>,
		anchor_body: FileMap,
		cell_head: Head<L>,
		cell_body: FileMap,
		cell_size: usize,
	) -> MultiMap<L, K> {
		MultiMap {
			anchors: crate::hashmap::HashRecordMap::new(head, anchor_body, L),
			cells: RecordManager::new(cell_body, L + cell_size),
			cell_head,
			cell_size,
		}
	}

	/// The anchor hash map.
	pub fn anchors(&self) -> &crate::hashmap::HashRecordMap<L, K> {
		&self.anchors
	}

	/// The auxiliary cell manager.
	pub fn cells(&self) -> &RecordManager<L> {
		&self.cells
	}

	/// The cell body's head (extent record only).
	pub fn cell_head(&self) -> &Head<L> {
		&self.cell_head
	}

	/// The fixed cell payload size in bytes.
	pub fn cell_size(&self) -> usize {
		self.cell_size
	}

	/// Allocate `count` contiguous unlinked cells.
	pub fn allocate(&self, count: usize) -> Result<Link<L>, Error> {
		self.cells.allocate(count)
	}

	/// Shared view of a cell's payload bytes.
	pub fn cell(&self, link: Link<L>) -> Result<Access<'_>, Error> {
		Ok(self.cells.read(link)?.narrow(L, self.cell_size))
	}

	/// Exclusive view of a cell's payload bytes.
	pub fn cell_mut(&self, link: Link<L>) -> Result<AccessMut<'_>, Error> {
		let offset = link.index() * self.cells.record_size() + L;
		self.cells.file().write_span(offset, self.cell_size)
	}

	/// Link a written cell under `key`, pushing it to the chain
	/// front. This is the observability step for the cell.
	pub fn link(&self, key: &[u8; K], cell: Link<L>) -> Result<(), Error> {
		let anchor = self.anchors.find_link(key)?;
		if anchor.is_terminal() {
			Link::<L>::TERMINAL.write_to(&mut self.cells.write(cell)?);
			let mut value = [0u8; 8];
			cell.write_to(&mut value);
			self.anchors.put(key, &value[..L])?;
		} else {
			let top = Link::<L>::from_slice(&self.anchors.value(anchor)?);
			top.write_to(&mut self.cells.write(cell)?);
			cell.write_to(&mut self.anchors.value_mut(anchor)?);
		}
		Ok(())
	}

	/// Iterate the cells linked under `key`, most recent first.
	pub fn find(&self, key: &[u8; K]) -> Result<CellIter<'_, L, K>, Error> {
		let anchor = self.anchors.find_link(key)?;
		let next = if anchor.is_terminal() {
			Link::TERMINAL
		} else {
			Link::from_slice(&self.anchors.value(anchor)?)
		};
		Ok(CellIter { map: self, next })
	}

	/// Pop the front cell of `key`'s chain. False if the chain is
	/// empty or the key is absent.
	pub fn unlink(&self, key: &[u8; K]) -> Result<bool, Error> {
		let anchor = self.anchors.find_link(key)?;
		if anchor.is_terminal() {
			return Ok(false);
		}
		let top = Link::<L>::from_slice(&self.anchors.value(anchor)?);
		if top.is_terminal() {
			return Ok(false);
		}
		let next = Link::<L>::from_slice(&self.cells.read(top)?);
		next.write_to(&mut self.anchors.value_mut(anchor)?);
		Ok(true)
	}

	/// Record body extents in both heads and flush all four files.
	pub fn flush(&self) -> Result<(), Error> {
		self.cell_head.set_body_count(self.cells.size() as u64)?;
		self.cells.file().flush()?;
		self.cell_head.flush()?;
		self.anchors.flush()
	}

	/// Compare body extents with the head records.
	pub fn verify_body(&self) -> Result<bool, Error> {
		let recorded = self.cell_head.body_count()? as usize;
		let actual = self.cells.size();
		if actual < recorded {
			return Err(Error::VerifyTable);
		}
		let dirty = self.anchors.verify_body()?;
		Ok(dirty || actual > recorded)
	}

	/// Truncate both bodies back to the head-recorded extents.
	pub fn restore_body(&self) -> Result<(), Error> {
		let recorded = self.cell_head.body_count()? as usize;
		if recorded > self.cells.size() {
			return Err(Error::RestoreTable);
		}
		self.cells.file().truncate(recorded)?;
		self.anchors.restore_body()
	}
}

/// Iterator over the cells of one key's chain.
pub struct CellIter<'a, const L: usize, const K: usize> {
	map: &'a MultiMap<L, K>,
	next: Link<L>,
}

impl<'a, const L: usize, const K: usize> Iterator for CellIter<'a, L, K> {
	type Item = Link<L>;

	fn next(&mut self) -> Option<Link<L>> {
		if self.next.is_terminal() {
			return None;
		}
		let link = self.next;
		let cell = self.map.cells.read(link).ok()?;
		self.next = Link::from_slice(&cell);
		Some(link)
	}
}
