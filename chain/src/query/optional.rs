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

//! Optional tables: address queries keyed by output script hash and
//! the per-header filter data. All operations report absent when the
//! corresponding table was not enabled at store create.

use bitcoin::hashes::{sha256, Hash};
use bitcoin::Script;

use bedrock_store::Error;

use crate::schema::{HeaderLink, OutputLink};
use crate::store::Storage;

use super::Query;

impl<'a, S: Storage> Query<'a, S> {
	/// True if the address index was enabled at create.
	pub fn address_enabled(&self) -> bool {
		self.tables().address.is_some()
	}

	/// True if the filter tables were enabled at create.
	pub fn filter_enabled(&self) -> bool {
		self.tables().filter_bk.is_some() && self.tables().filter_tx.is_some()
	}

	/// Every archived output paying the script, newest first.
	pub fn to_address_outputs(&self, script: &Script) -> Option<Vec<OutputLink>> {
		let _token = self.store.begin_read();
		let address = self.tables().address.as_ref()?;
		let script_hash = sha256::Hash::hash(script.as_bytes()).to_byte_array();
		address.outputs(&script_hash).ok()
	}

	/// The script's archived outputs that are confirmed and not
	/// spent by any confirmed input.
	pub fn to_confirmed_unspent_outputs(&self, script: &Script) -> Option<Vec<OutputLink>> {
		let outputs = self.to_address_outputs(script)?;
		Some(
			outputs
				.into_iter()
				.filter(|&output| self.is_confirmed_unspent(output))
				.collect(),
		)
	}

	/// The summed value of the script's confirmed unspent outputs.
	pub fn get_confirmed_balance(&self, script: &Script) -> Option<u64> {
		let outputs = self.to_confirmed_unspent_outputs(script)?;
		Some(
			outputs
				.iter()
				.filter_map(|&output| self.get_value(output))
				.sum(),
		)
	}

	fn is_confirmed_unspent(&self, link: OutputLink) -> bool {
		if !self.is_confirmed_output(link) {
			return false;
		}
		let spenders = {
			let _token = self.store.begin_read();
			let parent = match self.tables().output.parent(link) {
				Ok(parent) => parent,
				Err(_) => return false,
			};
			let index = match self.to_output_index(parent, link) {
				Some(index) => index,
				None => return false,
			};
			let hash = match self.tables().tx.key_at(parent) {
				Ok(hash) => hash,
				Err(_) => return false,
			};
			self.to_spenders_inner(&bitcoin::OutPoint {
				txid: bitcoin::Txid::from_byte_array(hash),
				vout: index,
			})
		};
		!spenders.into_iter().any(|spend| self.is_confirmed_input(spend))
	}

	/// Store a block's filter header. Fails when the filter tables
	/// were not enabled at create (their files do not exist).
	pub fn set_filter_head(&self, link: HeaderLink, head: &[u8; 32]) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		match &self.tables().filter_bk {
			Some(table) => table.put(link, head),
			None => Err(Error::UnloadedFile),
		}
	}

	/// Store a block's filter body.
	pub fn set_filter_body(&self, link: HeaderLink, body: &[u8]) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		match &self.tables().filter_tx {
			Some(table) => table.put(link, body),
			None => Err(Error::UnloadedFile),
		}
	}

	/// Load a block's filter header.
	pub fn get_filter_head(&self, link: HeaderLink) -> Option<[u8; 32]> {
		let _token = self.store.begin_read();
		let bytes = self.tables().filter_bk.as_ref()?.get(link).ok()??;
		if bytes.len() != 32 {
			return None;
		}
		let mut head = [0u8; 32];
		head.copy_from_slice(&bytes);
		Some(head)
	}

	/// Load a block's filter body.
	pub fn get_filter_body(&self, link: HeaderLink) -> Option<Vec<u8>> {
		let _token = self.store.begin_read();
		self.tables().filter_tx.as_ref()?.get(link).ok()?
	}

	/// True if both filter entries exist for the block.
	pub fn is_filtered(&self, link: HeaderLink) -> bool {
		let _token = self.store.begin_read();
		let filtered_bk = match &self.tables().filter_bk {
			Some(table) => table.contains(link).unwrap_or(false),
			None => false,
		};
		let filtered_tx = match &self.tables().filter_tx {
			Some(table) => table.contains(link).unwrap_or(false),
			None => false,
		};
		filtered_bk && filtered_tx
	}
}
