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

//! Archive read assemblers. Chain objects are materialized by
//! walking surrogate links and copying the opaque script/witness
//! blobs; missing cross-references yield absent results.

use bitcoin::absolute::LockTime;
use bitcoin::block::{Header, Version as BlockVersion};
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version as TxVersion;
use bitcoin::{
	Amount, Block, BlockHash, CompactTarget, OutPoint, Sequence, Transaction, TxIn, TxMerkleNode,
	TxOut, Txid,
};

use crate::schema::{HeaderLink, OutputLink, SpendLink, TxLink};
use crate::store::Storage;

use super::Query;

impl<'a, S: Storage> Query<'a, S> {
	/// True if the hash names an archived header.
	pub fn is_header(&self, hash: &BlockHash) -> bool {
		!self.to_header(hash).is_terminal()
	}

	/// True if the hash names an archived, associated block.
	pub fn is_block(&self, hash: &BlockHash) -> bool {
		let link = self.to_header(hash);
		!link.is_terminal() && self.is_associated(link)
	}

	/// True if the hash names an archived tx.
	pub fn is_tx(&self, hash: &Txid) -> bool {
		!self.to_tx(hash).is_terminal()
	}

	/// True if the tx record carries the coinbase mark.
	pub fn is_coinbase(&self, tx: TxLink) -> bool {
		let _token = self.store.begin_read();
		self.tables()
			.tx
			.get(tx)
			.map(|record| record.coinbase)
			.unwrap_or(false)
	}

	/// True if the header carries the milestone mark.
	pub fn is_milestone(&self, link: HeaderLink) -> bool {
		let _token = self.store.begin_read();
		self.tables()
			.header
			.get(link)
			.map(|record| record.milestone)
			.unwrap_or(false)
	}

	/// True if the header is bound to its txs.
	pub fn is_associated(&self, link: HeaderLink) -> bool {
		let _token = self.store.begin_read();
		self.tables().txs.contains(link).unwrap_or(false)
	}

	/// The block hash of a header record.
	pub fn get_header_key(&self, link: HeaderLink) -> Option<BlockHash> {
		let _token = self.store.begin_read();
		self.tables()
			.header
			.key_at(link)
			.ok()
			.map(BlockHash::from_byte_array)
	}

	/// The txid of a tx record.
	pub fn get_tx_key(&self, link: TxLink) -> Option<Txid> {
		let _token = self.store.begin_read();
		self.tables().tx.key_at(link).ok().map(Txid::from_byte_array)
	}

	/// The number of txs bound to a header, zero if unassociated.
	pub fn get_tx_count(&self, link: HeaderLink) -> usize {
		self.to_transactions(link).len()
	}

	/// The txids bound to a header, empty if unassociated.
	pub fn get_tx_keys(&self, link: HeaderLink) -> Vec<Txid> {
		let _token = self.store.begin_read();
		let links = match self.tables().txs.get(link) {
			Ok(Some((_, links))) => links,
			_ => return vec![],
		};
		links
			.iter()
			.filter_map(|&tx| self.tables().tx.key_at(tx).ok().map(Txid::from_byte_array))
			.collect()
	}

	/// The recorded wire size of a block, zero if unassociated.
	pub fn get_block_size(&self, link: HeaderLink) -> usize {
		let _token = self.store.begin_read();
		match self.tables().txs.get(link) {
			Ok(Some((wire_size, _))) => wire_size as usize,
			_ => 0,
		}
	}

	/// The light (no witness) and heavy (with witness) serialized
	/// sizes of a tx.
	pub fn get_tx_sizes(&self, link: TxLink) -> Option<(usize, usize)> {
		let _token = self.store.begin_read();
		let record = self.tables().tx.get(link).ok()?;
		Some((record.light as usize, record.heavy as usize))
	}

	/// The confirmed height of a tx, absent if not strong.
	pub fn get_tx_height(&self, link: TxLink) -> Option<usize> {
		let _token = self.store.begin_read();
		let header = self.to_block_inner(link);
		if header.is_terminal() {
			return None;
		}
		self.tables()
			.header
			.get(header)
			.ok()
			.map(|record| record.height as usize)
	}

	/// The position of a tx within its claiming block, absent if not
	/// strong.
	pub fn get_tx_position(&self, link: TxLink) -> Option<usize> {
		let _token = self.store.begin_read();
		let header = self.to_block_inner(link);
		if header.is_terminal() {
			return None;
		}
		match self.tables().txs.get(header) {
			Ok(Some((_, links))) => links.iter().position(|&tx| tx == link),
			_ => None,
		}
	}

	/// The value of an output in satoshis.
	pub fn get_value(&self, link: OutputLink) -> Option<u64> {
		let _token = self.store.begin_read();
		self.tables()
			.output
			.get(link)
			.ok()
			.map(|(_, value, _)| value)
	}

	/// Assemble a header from its record and its parent's key.
	pub fn get_header(&self, link: HeaderLink) -> Option<Header> {
		let _token = self.store.begin_read();
		self.get_header_inner(link)
	}

	pub(crate) fn get_header_inner(&self, link: HeaderLink) -> Option<Header> {
		let record = self.tables().header.get(link).ok()?;
		let prev_blockhash = if record.parent.is_terminal() {
			BlockHash::all_zeros()
		} else {
			BlockHash::from_byte_array(self.tables().header.key_at(record.parent).ok()?)
		};
		Some(Header {
			version: BlockVersion::from_consensus(record.version as i32),
			prev_blockhash,
			merkle_root: TxMerkleNode::from_byte_array(record.merkle_root),
			time: record.time,
			bits: CompactTarget::from_consensus(record.bits),
			nonce: record.nonce,
		})
	}

	/// Assemble one input from its spend cell.
	pub fn get_input(&self, link: SpendLink) -> Option<TxIn> {
		let _token = self.store.begin_read();
		self.get_input_inner(link)
	}

	fn get_input_inner(&self, link: SpendLink) -> Option<TxIn> {
		let cell = self.tables().spend.get(link).ok()?;
		let (script_sig, witness) = self.tables().input.get(cell.input).ok()?;
		let previous_output = if cell.index == u32::max_value() {
			// All coinbase inputs share the canonical null point.
			OutPoint::null()
		} else {
			OutPoint {
				txid: Txid::from_byte_array(self.tables().point.key_at(cell.point).ok()?),
				vout: cell.index,
			}
		};
		Some(TxIn {
			previous_output,
			script_sig,
			sequence: Sequence(cell.sequence),
			witness,
		})
	}

	/// The prevout named by a spend cell.
	pub fn get_point(&self, link: SpendLink) -> Option<OutPoint> {
		let _token = self.store.begin_read();
		let cell = self.tables().spend.get(link).ok()?;
		if cell.index == u32::max_value() {
			return Some(OutPoint::null());
		}
		Some(OutPoint {
			txid: Txid::from_byte_array(self.tables().point.key_at(cell.point).ok()?),
			vout: cell.index,
		})
	}

	/// Assemble one output.
	pub fn get_output(&self, link: OutputLink) -> Option<TxOut> {
		let _token = self.store.begin_read();
		self.get_output_inner(link)
	}

	fn get_output_inner(&self, link: OutputLink) -> Option<TxOut> {
		let (_, value, script_pubkey) = self.tables().output.get(link).ok()?;
		Some(TxOut {
			value: Amount::from_sat(value),
			script_pubkey,
		})
	}

	/// Assemble a tx's inputs in order.
	pub fn get_inputs(&self, link: TxLink) -> Option<Vec<TxIn>> {
		let _token = self.store.begin_read();
		self.get_inputs_inner(link)
	}

	fn get_inputs_inner(&self, link: TxLink) -> Option<Vec<TxIn>> {
		let record = self.tables().tx.get(link).ok()?;
		(0..u64::from(record.ins))
			.map(|at| self.get_input_inner(SpendLink::new(record.ins_fk.value() + at)))
			.collect()
	}

	/// Assemble a tx's outputs in order.
	pub fn get_outputs(&self, link: TxLink) -> Option<Vec<TxOut>> {
		let _token = self.store.begin_read();
		self.get_outputs_inner(link)
	}

	fn get_outputs_inner(&self, link: TxLink) -> Option<Vec<TxOut>> {
		let record = self.tables().tx.get(link).ok()?;
		let links = self
			.tables()
			.puts
			.get(record.outs_fk, record.outs as usize)
			.ok()?;
		links
			.iter()
			.map(|&output| self.get_output_inner(output))
			.collect()
	}

	/// Assemble a full transaction. The nominal hash is recoverable
	/// from the result; the witness hash is recomputed by callers.
	pub fn get_transaction(&self, link: TxLink) -> Option<Transaction> {
		let _token = self.store.begin_read();
		self.get_transaction_inner(link)
	}

	pub(crate) fn get_transaction_inner(&self, link: TxLink) -> Option<Transaction> {
		let record = self.tables().tx.get(link).ok()?;
		Some(Transaction {
			version: TxVersion(record.version as i32),
			lock_time: LockTime::from_consensus(record.locktime),
			input: self.get_inputs_inner(link)?,
			output: self.get_outputs_inner(link)?,
		})
	}

	/// Assemble every tx bound to a header, in block order.
	pub fn get_transactions(&self, link: HeaderLink) -> Option<Vec<Transaction>> {
		let _token = self.store.begin_read();
		let (_, links) = match self.tables().txs.get(link) {
			Ok(Some(slab)) => slab,
			_ => return None,
		};
		links
			.iter()
			.map(|&tx| self.get_transaction_inner(tx))
			.collect()
	}

	/// Assemble a full block.
	pub fn get_block(&self, link: HeaderLink) -> Option<Block> {
		let header = self.get_header(link)?;
		let txdata = self.get_transactions(link)?;
		Some(Block { header, txdata })
	}

	/// Assemble the inputs spending an output.
	pub fn get_spenders(&self, link: OutputLink) -> Vec<TxIn> {
		let spends = {
			let _token = self.store.begin_read();
			let parent = match self.tables().output.parent(link) {
				Ok(parent) => parent,
				Err(_) => return vec![],
			};
			let index = match self.to_output_index(parent, link) {
				Some(index) => index,
				None => return vec![],
			};
			let hash = match self.tables().tx.key_at(parent) {
				Ok(hash) => hash,
				Err(_) => return vec![],
			};
			self.to_spenders_inner(&OutPoint {
				txid: Txid::from_byte_array(hash),
				vout: index,
			})
		};
		spends
			.iter()
			.filter_map(|&spend| self.get_input(spend))
			.collect()
	}

	/// The block hashes at the given candidate heights.
	pub fn get_candidate_hashes(&self, heights: &[usize]) -> Vec<BlockHash> {
		let _token = self.store.begin_read();
		heights
			.iter()
			.filter_map(|&height| {
				let link = self.tables().candidate.at(height).ok()?;
				if link.is_terminal() {
					return None;
				}
				self.tables()
					.header
					.key_at(link)
					.ok()
					.map(BlockHash::from_byte_array)
			})
			.collect()
	}

	/// The block hashes at the given confirmed heights.
	pub fn get_confirmed_hashes(&self, heights: &[usize]) -> Vec<BlockHash> {
		let _token = self.store.begin_read();
		heights
			.iter()
			.filter_map(|&height| {
				let link = self.tables().confirmed.at(height).ok()?;
				if link.is_terminal() {
					return None;
				}
				self.tables()
					.header
					.key_at(link)
					.ok()
					.map(BlockHash::from_byte_array)
			})
			.collect()
	}
}
