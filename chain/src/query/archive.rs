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

//! Archive writes. The tx insert is the only multi-table write; its
//! order is what makes a crash leave nothing but orphan blobs: body
//! records are allocated and written first, the tx key is committed
//! next, and only then are the spend fingerprints linked. Nothing
//! allocated before the key commit is reachable from any index.

use bitcoin::hashes::{sha256, Hash};
use bitcoin::{Block, OutPoint, Transaction};

use bedrock_store::Error;

use crate::context::Context;
use crate::schema::{HeaderLink, InputLink, OutputLink, PointLink, SpendLink, TxLink};
use crate::store::Storage;
use crate::tables::{HeaderRecord, SpendCell, TxRecord};

use super::Query;

impl<'a, S: Storage> Query<'a, S> {
	/// Archive a header under its validation context. Idempotent:
	/// an already archived header returns its existing link.
	pub fn set_header(
		&self,
		header: &bitcoin::block::Header,
		ctx: &Context,
		milestone: bool,
	) -> Result<HeaderLink, Error> {
		let _guard = self.store.begin_write();
		self.set_header_locked(header, ctx, milestone)
	}

	pub(crate) fn set_header_locked(
		&self,
		header: &bitcoin::block::Header,
		ctx: &Context,
		milestone: bool,
	) -> Result<HeaderLink, Error> {
		let hash = header.block_hash().to_byte_array();
		let existing = self.tables().header.find(&hash)?;
		if !existing.is_terminal() {
			return Ok(existing);
		}

		// The parent is absent iff the previous hash is null, and a
		// null previous hash names the genesis alone.
		let previous = header.prev_blockhash.to_byte_array();
		let parent = if previous == [0u8; 32] {
			if ctx.height != 0 {
				return Err(Error::OrphanBlock);
			}
			HeaderLink::TERMINAL
		} else {
			let parent = self.tables().header.find(&previous)?;
			if parent.is_terminal() {
				return Err(Error::OrphanBlock);
			}
			parent
		};

		let record = HeaderRecord {
			flags: ctx.flags.bits(),
			height: ctx.height,
			mtp: ctx.mtp,
			milestone,
			parent,
			version: header.version.to_consensus() as u32,
			time: header.time,
			bits: header.bits.to_consensus(),
			nonce: header.nonce,
			merkle_root: header.merkle_root.to_byte_array(),
		};
		self.tables()
			.header
			.put(&hash, &record)
			.map_err(|_| Error::HeaderPut)
	}

	/// Archive a transaction. Idempotent: an already committed tx
	/// returns its existing link and the archive does not regrow.
	pub fn set_tx(&self, tx: &Transaction) -> Result<TxLink, Error> {
		let _guard = self.store.begin_write();
		self.set_tx_locked(tx, false)
	}

	/// Archive a transaction, optionally bypassing the duplicate
	/// guards (checkpointed/turbo inserts).
	pub fn set_tx_bypass(&self, tx: &Transaction, bypass: bool) -> Result<TxLink, Error> {
		let _guard = self.store.begin_write();
		self.set_tx_locked(tx, bypass)
	}

	pub(crate) fn set_tx_locked(&self, tx: &Transaction, bypass: bool) -> Result<TxLink, Error> {
		if tx.input.is_empty() || tx.output.is_empty() {
			return Err(Error::TxEmpty);
		}
		let txid = tx.compute_txid().to_byte_array();
		let existing = self.tables().tx.find(&txid)?;
		if !existing.is_terminal() {
			return Ok(existing);
		}

		let coinbase = tx.is_coinbase();
		let ins = tx.input.len();
		let outs = tx.output.len();
		// A dirty store may carry orphaned spends from a prior crash,
		// so the duplicate guard cannot be bypassed on it.
		let guarded = self.store.is_dirty() || !bypass;
		let minimize = self.store.settings().minimize;

		// Allocate the tx slot and the contiguous spend run first;
		// both stay unreachable until the commits at the end.
		let tx_fk = self.tables().tx.allocate().map_err(|_| Error::TxTxAllocate)?;
		let spend_fk = self
			.tables()
			.spend
			.allocate(ins)
			.map_err(|_| Error::TxSpendAllocate)?;

		let mut input_links: Vec<InputLink> = Vec::with_capacity(ins);
		for input in &tx.input {
			let link = self
				.tables()
				.input
				.put(&input.script_sig, &input.witness)
				.map_err(|_| Error::TxInputPut)?;
			input_links.push(link);
		}

		let puts_fk = self
			.tables()
			.puts
			.allocate(outs)
			.map_err(|_| Error::TxInsAllocate)?;
		let mut output_links: Vec<OutputLink> = Vec::with_capacity(outs);
		for output in &tx.output {
			let link = self
				.tables()
				.output
				.put(tx_fk, output.value.to_sat(), &output.script_pubkey)
				.map_err(|_| Error::TxOutputPut)?;
			output_links.push(link);
		}
		self.tables().puts.set(puts_fk, &output_links)?;

		// One point record per input. Null (coinbase) prevouts are
		// written unconditionally; minimize reuses existing records
		// for identical hashes at the cost of a probe.
		let mut point_links: Vec<PointLink> = Vec::with_capacity(ins);
		for input in &tx.input {
			let hash = input.previous_output.txid.to_byte_array();
			let null = input.previous_output == OutPoint::null();
			let reused = if minimize {
				self.tables().point.find(&hash)?
			} else {
				PointLink::TERMINAL
			};
			let link = if !reused.is_terminal() {
				reused
			} else {
				let allocated = self
					.tables()
					.point
					.0
					.allocate(1)
					.map_err(|_| Error::TxPointAllocate)?;
				self.tables().point.0.commit(allocated, &hash).map_err(|_| {
					if null {
						Error::TxNullPointPut
					} else {
						Error::TxPointPut
					}
				})?;
				allocated
			};
			point_links.push(link);
		}

		// Guard against duplicate spends: a prevout already spent by
		// an archived input becomes a twin in the duplicate table.
		// The domain is bounded; overflow is a hard error.
		if guarded && !coinbase {
			for input in &tx.input {
				if self.to_spenders_inner(&input.previous_output).is_empty() {
					continue;
				}
				let first = self.first_point(&input.previous_output.txid.to_byte_array());
				if first.is_terminal() {
					continue;
				}
				self.tables()
					.duplicate
					.put(first, input.previous_output.vout)
					.map_err(|_| Error::TxDuplicatePut)?;
			}
		}

		// Spend cells are written now but linked only after the tx
		// key commit below.
		for (at, input) in tx.input.iter().enumerate() {
			let cell = SpendCell {
				point: point_links[at],
				index: if null_point(&input.previous_output) {
					u32::max_value()
				} else {
					input.previous_output.vout
				},
				parent: tx_fk,
				sequence: input.sequence.0,
				input: input_links[at],
			};
			self.tables()
				.spend
				.set(SpendLink::new(spend_fk.value() + at as u64), &cell)
				.map_err(|_| Error::TxSpendPut)?;
		}

		if let Some(address) = &self.tables().address {
			for (output, &link) in tx.output.iter().zip(output_links.iter()) {
				let cell = address.allocate(1).map_err(|_| Error::TxAddressAllocate)?;
				let script_hash =
					sha256::Hash::hash(output.script_pubkey.as_bytes()).to_byte_array();
				address
					.commit(cell, &script_hash, link)
					.map_err(|_| Error::TxAddressPut)?;
			}
		}

		let record = TxRecord {
			coinbase,
			light: tx.base_size() as u32,
			heavy: tx.total_size() as u32,
			version: tx.version.0 as u32,
			locktime: tx.lock_time.to_consensus_u32(),
			ins: ins as u32,
			outs: outs as u32,
			ins_fk: spend_fk,
			outs_fk: puts_fk,
		};
		self.tables()
			.tx
			.set(tx_fk, &record)
			.map_err(|_| Error::TxTxSet)?;

		// The key commit: only now is the tx observable.
		self.tables()
			.tx
			.commit(tx_fk, &txid)
			.map_err(|_| Error::TxTxCommit)?;

		// And only now may the spend fingerprints be linked.
		for at in 0..ins {
			self.tables()
				.spend
				.commit(SpendLink::new(spend_fk.value() + at as u64))
				.map_err(|_| Error::TxSpendCommit)?;
		}

		Ok(tx_fk)
	}

	/// Bind a block's txs to its archived header, archiving each tx
	/// and optionally making them strong for the header.
	pub fn set_txs(
		&self,
		link: HeaderLink,
		block: &Block,
		strong: bool,
		bypass: bool,
	) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.set_txs_locked(link, block, strong, bypass)
	}

	pub(crate) fn set_txs_locked(
		&self,
		link: HeaderLink,
		block: &Block,
		strong: bool,
		bypass: bool,
	) -> Result<(), Error> {
		if block.txdata.is_empty() {
			return Err(Error::TxsEmpty);
		}
		if self.tables().header.get(link).is_err() {
			return Err(Error::TxsHeader);
		}
		if self.tables().txs.contains(link)? {
			return Ok(());
		}

		let mut links: Vec<TxLink> = Vec::with_capacity(block.txdata.len());
		for tx in &block.txdata {
			links.push(self.set_tx_locked(tx, bypass)?);
		}

		if strong {
			self.set_strong_links(link, &links, true)
				.map_err(|_| Error::TxsConfirm)?;
		}

		self.tables()
			.txs
			.put(link, block.total_size() as u32, &links)
			.map_err(|_| Error::TxsTxsPut)?;
		Ok(())
	}

	/// Archive a full block: header, then txs. Blocks-first sync
	/// uses `strong` to make the txs strong immediately.
	pub fn set_block(
		&self,
		block: &Block,
		ctx: &Context,
		milestone: bool,
		strong: bool,
	) -> Result<HeaderLink, Error> {
		let _guard = self.store.begin_write();
		let bypass = self.store.settings().turbo && milestone;
		let link = self.set_header_locked(&block.header, ctx, milestone)?;
		self.set_txs_locked(link, block, strong, bypass)?;
		Ok(link)
	}
}

fn null_point(prevout: &OutPoint) -> bool {
	*prevout == OutPoint::null()
}
