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

//! Typed tables over the substrate primitives: the archive (headers,
//! txs, puts, points, spends, txs bindings), the chain indexes, the
//! reconstructable caches and the optional indexes.

use bedrock_store::{Access, Error, FileMap, Head, Link, SlabManager};

pub mod archive;
pub mod caches;
pub mod indexes;
pub mod optionals;

pub use self::archive::{
	HeaderRecord, HeaderTable, InputTable, OutputTable, PointTable, PutsTable, SpendCell,
	SpendTable, TxRecord, TxTable, TxsTable,
};
pub use self::caches::{
	DuplicateTable, PrevoutSlab, PrevoutTable, ValidatedBkTable, ValidatedTxRecord,
	ValidatedTxTable,
};
pub use self::indexes::{HeightTable, StrongRecord, StrongTxTable};
pub use self::optionals::{AddressTable, FilterTable};

/// An unindexed slab body paired with a head that carries only the
/// extent record (inputs, outputs and puts have no search keys).
pub struct Body<const L: usize> {
	head: Head<L>,
	body: SlabManager<L>,
}

impl<const L: usize> Body<L> {
	/// Bind a head and a body file.
	pub fn new(head: Head<L>, body: FileMap) -> Body<L> {
		Body {
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

	/// Extend the body, returning the slab link.
	pub fn allocate(&self, size: usize) -> Result<Link<L>, Error> {
		self.body.allocate(size)
	}

	/// Write a slab in place.
	pub fn put(&self, size: usize, bytes: &[u8]) -> Result<Link<L>, Error> {
		let link = self.body.allocate(size)?;
		self.body.write_span(link, size)?.copy_from_slice(bytes);
		Ok(link)
	}

	/// Open-ended view of a slab.
	pub fn read(&self, link: Link<L>) -> Result<Access<'_>, Error> {
		self.body.read(link)
	}

	/// Bounded view of a slab.
	pub fn read_span(&self, link: Link<L>, size: usize) -> Result<Access<'_>, Error> {
		self.body.read_span(link, size)
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

	/// The head and body files, for store lifecycle sweeps.
	pub fn files(&self) -> Vec<&FileMap> {
		vec![self.head.file(), self.body.file()]
	}
}
