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

//! Optional tables, gated at store create: the address index (script
//! hash to output links) and the per-header filter tables.

use bitcoin::consensus::encode::{serialize, Decodable, VarInt};

use bedrock_store::{Error, FileMap, HashSlabMap, Head, MultiMap};

use crate::schema::{self, AddressLink, HeaderLink, OutputLink};

/// Address index: record multimap keyed by the output script hash,
/// one cell per archived output.
pub struct AddressTable(pub MultiMap<5, 32>);

impl AddressTable {
	/// Bind the anchor and cell head/body files.
	pub fn new(
		head: Head<5>,
		anchor_body: FileMap,
		cell_head: Head<5>,
		cell_body: FileMap,
	) -> AddressTable {
		AddressTable(MultiMap::new(
			head,
			anchor_body,
			cell_head,
			cell_body,
			schema::ADDRESS_CELL_SIZE,
		))
	}

	/// Allocate `count` contiguous unlinked cells.
	pub fn allocate(&self, count: usize) -> Result<AddressLink, Error> {
		self.0.allocate(count)
	}

	/// Write a cell and link it under the script hash.
	pub fn commit(
		&self,
		cell: AddressLink,
		script_hash: &[u8; 32],
		output: OutputLink,
	) -> Result<(), Error> {
		let mut value = [0u8; schema::ADDRESS_CELL_SIZE];
		output.write_to(&mut value);
		self.0.cell_mut(cell)?.copy_from_slice(&value);
		self.0.link(script_hash, cell)
	}

	/// All output links recorded for a script hash, newest first.
	pub fn outputs(&self, script_hash: &[u8; 32]) -> Result<Vec<OutputLink>, Error> {
		let mut outputs = vec![];
		for cell in self.0.find(script_hash)? {
			outputs.push(OutputLink::from_slice(&self.0.cell(cell)?));
		}
		Ok(outputs)
	}
}

/// A per-header filter table: slab hash map keyed by header link,
/// payload length-prefixed and otherwise opaque. One instance holds
/// filter headers, another filter bodies.
pub struct FilterTable(pub HashSlabMap<5, 3>);

impl FilterTable {
	/// Bind the head and body files.
	pub fn new(head: Head<5>, body: FileMap) -> FilterTable {
		FilterTable(HashSlabMap::new(head, body))
	}

	fn key(header: HeaderLink) -> [u8; 3] {
		let mut key = [0u8; 3];
		header.write_to(&mut key);
		key
	}

	/// True if the header has an entry.
	pub fn contains(&self, header: HeaderLink) -> Result<bool, Error> {
		self.0.contains(&Self::key(header))
	}

	/// Store a filter blob for the header.
	pub fn put(&self, header: HeaderLink, bytes: &[u8]) -> Result<(), Error> {
		let mut payload = serialize(&VarInt(bytes.len() as u64));
		payload.extend_from_slice(bytes);
		self.0.put(&Self::key(header), &payload)?;
		Ok(())
	}

	/// Load the filter blob of the header.
	pub fn get(&self, header: HeaderLink) -> Result<Option<Vec<u8>>, Error> {
		let link = self.0.find_link(&Self::key(header))?;
		if link.is_terminal() {
			return Ok(None);
		}
		let payload = self.0.payload(link)?;
		let mut cursor = &payload[..];
		let length = VarInt::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		if cursor.len() < length.0 as usize {
			return Err(Error::Integrity);
		}
		Ok(Some(cursor[..length.0 as usize].to_vec()))
	}
}
