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

//! Confirmation state and height indexation. Strength is recorded by
//! appending signed strong-tx records, never by deletion, so reorgs
//! unwind by superseding; the candidate and confirmed indexes grow by
//! push and shrink by pop.

use bitcoin::Block;

use bedrock_store::Error;

use crate::context::Context;
use crate::schema::{HeaderLink, OutputLink, SpendLink, TxLink};
use crate::store::Storage;
use crate::tables::StrongRecord;

use super::Query;

impl<'a, S: Storage> Query<'a, S> {
	/// Make every tx of the block strong for its header. Idempotent
	/// in effect: the newest record wins.
	pub fn set_strong(&self, link: HeaderLink) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.set_strong_locked(link, true)
	}

	/// Revoke the block's claim on its txs.
	pub fn set_unstrong(&self, link: HeaderLink) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.set_strong_locked(link, false)
	}

	pub(crate) fn set_strong_locked(&self, link: HeaderLink, positive: bool) -> Result<(), Error> {
		let links = match self.tables().txs.get(link)? {
			Some((_, links)) => links,
			None => return Err(Error::Unassociated),
		};
		self.set_strong_links(link, &links, positive)
	}

	pub(crate) fn set_strong_links(
		&self,
		link: HeaderLink,
		txs: &[TxLink],
		positive: bool,
	) -> Result<(), Error> {
		let record = StrongRecord {
			header: link,
			positive,
		};
		for &tx in txs {
			self.tables()
				.strong_tx
				.put(tx, &record)
				.map_err(|_| Error::TxsConfirm)?;
		}
		Ok(())
	}

	/// True if the tx's current strong record is positive.
	pub fn is_strong_tx(&self, tx: TxLink) -> bool {
		let _token = self.store.begin_read();
		self.is_strong_tx_inner(tx)
	}

	pub(crate) fn is_strong_tx_inner(&self, tx: TxLink) -> bool {
		match self.tables().strong_tx.find(tx) {
			Ok(Some(record)) => record.positive,
			_ => false,
		}
	}

	/// True if the block presently claims its own coinbase.
	pub fn is_strong_block(&self, link: HeaderLink) -> bool {
		let _token = self.store.begin_read();
		let coinbase = match self.tables().txs.get(link) {
			Ok(Some((_, links))) => match links.first() {
				Some(&coinbase) => coinbase,
				None => return false,
			},
			_ => return false,
		};
		match self.tables().strong_tx.find(coinbase) {
			Ok(Some(record)) => record.positive && record.header == link,
			_ => false,
		}
	}

	/// Create a one-entry store from the genesis block.
	pub fn initialize(&self, genesis: &Block) -> Result<HeaderLink, Error> {
		let _guard = self.store.begin_write();
		let ctx = Context::at_height(0);
		let link = self.set_header_locked(&genesis.header, &ctx, false)?;
		self.set_txs_locked(link, genesis, true, false)?;
		self.tables().candidate.push(link)?;
		self.tables().confirmed.push(link)?;
		Ok(link)
	}

	/// True once the genesis is indexed on both chains.
	pub fn is_initialized(&self) -> bool {
		let _token = self.store.begin_read();
		self.tables().candidate.count() > 0 && self.tables().confirmed.count() > 0
	}

	/// Append a header to the candidate index.
	pub fn push_candidate(&self, link: HeaderLink) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables().candidate.push(link)
	}

	/// Append a header to the confirmed index, optionally making its
	/// txs strong first.
	pub fn push_confirmed(&self, link: HeaderLink, strong: bool) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		if strong {
			self.set_strong_locked(link, true)?;
		}
		self.tables().confirmed.push(link)
	}

	/// Truncate the candidate top.
	pub fn pop_candidate(&self) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables().candidate.pop()
	}

	/// Truncate the confirmed top.
	pub fn pop_confirmed(&self) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables().confirmed.pop()
	}

	/// The candidate top height (zero for a genesis-only store).
	pub fn get_top_candidate(&self) -> usize {
		let _token = self.store.begin_read();
		(self.tables().candidate.count() as usize).saturating_sub(1)
	}

	/// The confirmed top height.
	pub fn get_top_confirmed(&self) -> usize {
		let _token = self.store.begin_read();
		(self.tables().confirmed.count() as usize).saturating_sub(1)
	}

	/// The highest height at which the candidate and confirmed
	/// indexes agree.
	pub fn get_fork(&self) -> usize {
		let _token = self.store.begin_read();
		let mut height = std::cmp::min(
			self.tables().candidate.count(),
			self.tables().confirmed.count(),
		) as usize;
		while height > 0 {
			height -= 1;
			let candidate = self.tables().candidate.at(height).unwrap_or_default();
			let confirmed = self.tables().confirmed.at(height).unwrap_or_default();
			if !candidate.is_terminal() && candidate == confirmed {
				break;
			}
		}
		height
	}

	/// True if the header occupies its height in the candidate index.
	pub fn is_candidate_header(&self, link: HeaderLink) -> bool {
		let _token = self.store.begin_read();
		match self.tables().header.get(link) {
			Ok(record) => self
				.tables()
				.candidate
				.at(record.height as usize)
				.map(|indexed| indexed == link)
				.unwrap_or(false),
			Err(_) => false,
		}
	}

	/// True if the header occupies its height in the confirmed index.
	pub fn is_confirmed_block(&self, link: HeaderLink) -> bool {
		let _token = self.store.begin_read();
		self.is_confirmed_block_inner(link)
	}

	pub(crate) fn is_confirmed_block_inner(&self, link: HeaderLink) -> bool {
		match self.tables().header.get(link) {
			Ok(record) => self
				.tables()
				.confirmed
				.at(record.height as usize)
				.map(|indexed| indexed == link)
				.unwrap_or(false),
			Err(_) => false,
		}
	}

	/// True if the tx is claimed by a confirmed block.
	pub fn is_confirmed_tx(&self, tx: TxLink) -> bool {
		let _token = self.store.begin_read();
		self.is_confirmed_tx_inner(tx)
	}

	pub(crate) fn is_confirmed_tx_inner(&self, tx: TxLink) -> bool {
		let header = self.to_block_inner(tx);
		!header.is_terminal() && self.is_confirmed_block_inner(header)
	}

	/// True if the spending input belongs to a confirmed tx.
	pub fn is_confirmed_input(&self, link: SpendLink) -> bool {
		let _token = self.store.begin_read();
		match self.tables().spend.get(link) {
			Ok(cell) => self.is_confirmed_tx_inner(cell.parent),
			Err(_) => false,
		}
	}

	/// True if the output belongs to a confirmed tx.
	pub fn is_confirmed_output(&self, link: OutputLink) -> bool {
		let _token = self.store.begin_read();
		match self.tables().output.parent(link) {
			Ok(parent) => self.is_confirmed_tx_inner(parent),
			Err(_) => false,
		}
	}

	/// True if the prevout is spent by a confirmed input.
	///
	/// TODO: derive spentness from the spend multimap filtered to
	/// confirmed spenders; callers of the coinbase-collision check
	/// under-report spent-ness until then.
	pub fn is_spent_prevout(&self, _tx: TxLink, _index: u32) -> bool {
		false
	}
}
