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

//! Chain index tables: the candidate and confirmed height arrays and
//! the strong-tx index binding txs to the headers that claim them.

use bedrock_store::{ArrayIndex, Error, FileMap, HashRecordMap, Head};

use crate::schema::{self, HeaderLink, TxLink};

/// A height index: header links addressed densely by height. The top
/// is the count minus one; height zero is the genesis.
pub struct HeightTable(pub ArrayIndex<3>);

impl HeightTable {
	/// Bind the head and body files.
	pub fn new(head: Head<3>, body: FileMap) -> HeightTable {
		HeightTable(ArrayIndex::new(head, body))
	}

	/// Number of indexed heights.
	pub fn count(&self) -> u64 {
		self.0.count()
	}

	/// The header link at `height`, terminal above the top.
	pub fn at(&self, height: usize) -> Result<HeaderLink, Error> {
		self.0.at(height)
	}

	/// Append a header at the next height.
	pub fn push(&self, link: HeaderLink) -> Result<(), Error> {
		self.0.push(link)
	}

	/// Truncate the top height.
	pub fn pop(&self) -> Result<(), Error> {
		self.0.pop()
	}
}

/// A strong-tx record: the claiming header and the sign bit. A
/// positive record asserts strength; a later negative record for the
/// same tx revokes it. Records are never deleted, so reorgs unwind
/// by superseding rather than erasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrongRecord {
	/// The header claiming (or un-claiming) the tx.
	pub header: HeaderLink,
	/// True asserts strength, false revokes it.
	pub positive: bool,
}

/// Strong-tx index: hash map keyed by tx link. The most recent
/// record for a key is the current strength.
pub struct StrongTxTable(pub HashRecordMap<4, 4>);

impl StrongTxTable {
	/// Bind the head and body files.
	pub fn new(head: Head<4>, body: FileMap) -> StrongTxTable {
		StrongTxTable(HashRecordMap::new(head, body, schema::STRONG_VALUE_SIZE))
	}

	fn key(tx: TxLink) -> [u8; 4] {
		let mut key = [0u8; 4];
		tx.write_to(&mut key);
		key
	}

	/// The current strong record for a tx, if any.
	pub fn find(&self, tx: TxLink) -> Result<Option<StrongRecord>, Error> {
		let link = self.0.find_link(&Self::key(tx))?;
		if link.is_terminal() {
			return Ok(None);
		}
		let value = self.0.value(link)?;
		Ok(Some(StrongRecord {
			header: HeaderLink::from_slice(&value[0..3]),
			positive: value[3] != 0,
		}))
	}

	/// Append a strong record for a tx; supersedes prior records.
	pub fn put(&self, tx: TxLink, record: &StrongRecord) -> Result<(), Error> {
		let mut value = [0u8; schema::STRONG_VALUE_SIZE];
		record.header.write_to(&mut value[0..3]);
		value[3] = record.positive as u8;
		self.0.put(&Self::key(tx), &value)?;
		Ok(())
	}
}
