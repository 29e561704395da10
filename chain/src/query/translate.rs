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

//! Key-to-link and link-to-link translation. Lookups return the
//! terminal sentinel for anything absent; they do not fail.

use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, OutPoint, Txid};

use crate::schema::{HeaderLink, OutputLink, PointLink, SpendLink, TxLink};
use crate::store::Storage;

use super::Query;

impl<'a, S: Storage> Query<'a, S> {
	/// The header at a candidate height, terminal above the top.
	pub fn to_candidate(&self, height: usize) -> HeaderLink {
		let _token = self.store.begin_read();
		self.tables()
			.candidate
			.at(height)
			.unwrap_or(HeaderLink::TERMINAL)
	}

	/// The header at a confirmed height, terminal above the top.
	pub fn to_confirmed(&self, height: usize) -> HeaderLink {
		let _token = self.store.begin_read();
		self.tables()
			.confirmed
			.at(height)
			.unwrap_or(HeaderLink::TERMINAL)
	}

	/// Translate a block hash to its header link.
	pub fn to_header(&self, hash: &BlockHash) -> HeaderLink {
		let _token = self.store.begin_read();
		self.tables()
			.header
			.find(&hash.to_byte_array())
			.unwrap_or(HeaderLink::TERMINAL)
	}

	/// Translate a txid to its tx link.
	pub fn to_tx(&self, hash: &Txid) -> TxLink {
		let _token = self.store.begin_read();
		self.tables()
			.tx
			.find(&hash.to_byte_array())
			.unwrap_or(TxLink::TERMINAL)
	}

	/// Translate a prevout hash to its most recent point record.
	pub fn to_point(&self, hash: &Txid) -> PointLink {
		let _token = self.store.begin_read();
		self.tables()
			.point
			.find(&hash.to_byte_array())
			.unwrap_or(PointLink::TERMINAL)
	}

	// The oldest point record for a hash, which is the stable one
	// the duplicate table is keyed by.
	pub(crate) fn first_point(&self, hash: &[u8; 32]) -> PointLink {
		self.tables()
			.point
			.0
			.it(*hash)
			.last()
			.unwrap_or(PointLink::TERMINAL)
	}

	/// The parent of a header, terminal at the genesis only.
	pub fn to_parent(&self, link: HeaderLink) -> HeaderLink {
		let _token = self.store.begin_read();
		match self.tables().header.get(link) {
			Ok(record) => record.parent,
			Err(_) => HeaderLink::TERMINAL,
		}
	}

	/// The header presently claiming a tx: the tx's own positive
	/// strong record, or that of any archived tx sharing its hash
	/// (the duplicate-hash case).
	pub fn to_block(&self, tx: TxLink) -> HeaderLink {
		let _token = self.store.begin_read();
		self.to_block_inner(tx)
	}

	pub(crate) fn to_block_inner(&self, tx: TxLink) -> HeaderLink {
		if let Ok(Some(record)) = self.tables().strong_tx.find(tx) {
			if record.positive && self.tables().header.get(record.header).is_ok() {
				return record.header;
			}
		}
		// Probe duplicate-hash txs for a surviving strong record.
		let hash = match self.tables().tx.key_at(tx) {
			Ok(hash) => hash,
			Err(_) => return HeaderLink::TERMINAL,
		};
		for twin in self.tables().tx.0.it(hash) {
			if twin == tx {
				continue;
			}
			if let Ok(Some(record)) = self.tables().strong_tx.find(twin) {
				if record.positive && self.tables().header.get(record.header).is_ok() {
					return record.header;
				}
			}
		}
		HeaderLink::TERMINAL
	}

	/// The header presently claiming the tx with this hash.
	pub fn to_strong(&self, hash: &Txid) -> HeaderLink {
		let tx = self.to_tx(hash);
		if tx.is_terminal() {
			return HeaderLink::TERMINAL;
		}
		self.to_block(tx)
	}

	/// The tx links bound to a header, empty if unassociated.
	pub fn to_transactions(&self, link: HeaderLink) -> Vec<TxLink> {
		let _token = self.store.begin_read();
		match self.tables().txs.get(link) {
			Ok(Some((_, links))) => links,
			_ => vec![],
		}
	}

	/// The first (coinbase) tx of a block.
	pub fn to_coinbase(&self, link: HeaderLink) -> TxLink {
		let _token = self.store.begin_read();
		match self.tables().txs.get(link) {
			Ok(Some((_, links))) => links.first().copied().unwrap_or(TxLink::TERMINAL),
			_ => TxLink::TERMINAL,
		}
	}

	/// The spend cell of a tx's input by index, from the contiguous
	/// per-tx run.
	pub fn to_spend(&self, tx: TxLink, input_index: u32) -> SpendLink {
		let _token = self.store.begin_read();
		match self.tables().tx.get(tx) {
			Ok(record) if input_index < record.ins => {
				SpendLink::new(record.ins_fk.value() + u64::from(input_index))
			}
			_ => SpendLink::TERMINAL,
		}
	}

	/// A tx's output link by index, from the puts run.
	pub fn to_output(&self, tx: TxLink, output_index: u32) -> OutputLink {
		let _token = self.store.begin_read();
		let record = match self.tables().tx.get(tx) {
			Ok(record) if output_index < record.outs => record,
			_ => return OutputLink::TERMINAL,
		};
		match self
			.tables()
			.puts
			.get(record.outs_fk, record.outs as usize)
		{
			Ok(links) => links
				.get(output_index as usize)
				.copied()
				.unwrap_or(OutputLink::TERMINAL),
			Err(_) => OutputLink::TERMINAL,
		}
	}

	/// The parent tx of an output.
	pub fn to_output_tx(&self, output: OutputLink) -> TxLink {
		let _token = self.store.begin_read();
		self.tables()
			.output
			.parent(output)
			.unwrap_or(TxLink::TERMINAL)
	}

	/// The position of an output within its parent tx, if resolvable.
	pub(crate) fn to_output_index(&self, parent: TxLink, output: OutputLink) -> Option<u32> {
		let record = self.tables().tx.get(parent).ok()?;
		let links = self
			.tables()
			.puts
			.get(record.outs_fk, record.outs as usize)
			.ok()?;
		links
			.iter()
			.position(|&link| link == output)
			.map(|index| index as u32)
	}

	/// Every archived spend of a prevout: the point hash chain is
	/// walked and each record's fingerprint chain collected, so
	/// spends recorded against any twin point record are found.
	pub fn to_spenders(&self, prevout: &OutPoint) -> Vec<SpendLink> {
		let _token = self.store.begin_read();
		self.to_spenders_inner(prevout)
	}

	pub(crate) fn to_spenders_inner(&self, prevout: &OutPoint) -> Vec<SpendLink> {
		let hash = prevout.txid.to_byte_array();
		let mut spends = vec![];
		for point in self.tables().point.0.it(hash) {
			match self.tables().spend.spenders(point, prevout.vout) {
				Ok(links) => spends.extend(links),
				Err(_) => return vec![],
			}
		}
		spends
	}

	/// Every archived spend of a tx's output by index.
	pub fn to_spenders_of(&self, tx: TxLink, output_index: u32) -> Vec<SpendLink> {
		let hash = {
			let _token = self.store.begin_read();
			match self.tables().tx.key_at(tx) {
				Ok(hash) => hash,
				Err(_) => return vec![],
			}
		};
		self.to_spenders(&OutPoint {
			txid: Txid::from_byte_array(hash),
			vout: output_index,
		})
	}

	/// The top of a header bucket chain (hash map enumeration).
	pub fn top_header(&self, bucket: usize) -> HeaderLink {
		let _token = self.store.begin_read();
		self.tables()
			.header
			.0
			.top(bucket)
			.unwrap_or(HeaderLink::TERMINAL)
	}

	/// The top of a tx bucket chain.
	pub fn top_tx(&self, bucket: usize) -> TxLink {
		let _token = self.store.begin_read();
		self.tables().tx.0.top(bucket).unwrap_or(TxLink::TERMINAL)
	}

	/// The top of a point bucket chain.
	pub fn top_point(&self, bucket: usize) -> PointLink {
		let _token = self.store.begin_read();
		self.tables()
			.point
			.0
			.top(bucket)
			.unwrap_or(PointLink::TERMINAL)
	}
}
