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

//! Validation state. Block states live in the validated-block cache;
//! tx states accumulate in the validated-tx cache, where the newest
//! entry evaluated under a sufficient context wins.

use bedrock_store::Error;

use crate::context::{Context, Forks};
use crate::schema::{BlockState, HeaderLink, TxLink, TxState};
use crate::store::Storage;
use crate::tables::ValidatedTxRecord;

use super::{HeaderState, Query};

impl<'a, S: Storage> Query<'a, S> {
	/// The validation context recorded with a header.
	pub fn get_context(&self, link: HeaderLink) -> Option<Context> {
		let _token = self.store.begin_read();
		self.get_context_inner(link)
	}

	pub(crate) fn get_context_inner(&self, link: HeaderLink) -> Option<Context> {
		let record = self.tables().header.get(link).ok()?;
		Some(Context {
			flags: Forks::from_bits_truncate(record.flags),
			height: record.height,
			mtp: record.mtp,
		})
	}

	/// Record the block as valid with its fees.
	pub fn set_block_valid(&self, link: HeaderLink, fees: u64) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables()
			.validated_bk
			.put(link, BlockState::Valid as u8, fees)
	}

	/// Record the block as confirmable.
	pub fn set_block_confirmable(&self, link: HeaderLink) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables()
			.validated_bk
			.put(link, BlockState::Confirmable as u8, 0)
	}

	/// Record the block as unconfirmable.
	pub fn set_block_unconfirmable(&self, link: HeaderLink) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables()
			.validated_bk
			.put(link, BlockState::Unconfirmable as u8, 0)
	}

	/// The block's validation state as a result code: `BlockValid`,
	/// `BlockConfirmable`, `BlockUnconfirmable`, `Unvalidated` for no
	/// entry, `Unassociated` for a block without txs, `UnknownState`
	/// for an unrecognized code.
	pub fn get_block_state(&self, link: HeaderLink) -> Error {
		let _token = self.store.begin_read();
		if !self.tables().txs.contains(link).unwrap_or(false) {
			return Error::Unassociated;
		}
		self.header_state_code(link)
	}

	/// The header's validation state, association not required.
	pub fn get_header_state(&self, link: HeaderLink) -> HeaderState {
		let _token = self.store.begin_read();
		match self.header_state_code(link) {
			Error::BlockConfirmable => HeaderState::Confirmable,
			Error::BlockValid => HeaderState::Valid,
			Error::BlockUnconfirmable => HeaderState::Unconfirmable,
			_ => HeaderState::Unvalidated,
		}
	}

	fn header_state_code(&self, link: HeaderLink) -> Error {
		match self.tables().validated_bk.get(link) {
			Ok(Some((state, _))) => match BlockState::from_u8(state) {
				Some(BlockState::Confirmable) => Error::BlockConfirmable,
				Some(BlockState::Valid) => Error::BlockValid,
				Some(BlockState::Unconfirmable) => Error::BlockUnconfirmable,
				None => Error::UnknownState,
			},
			Ok(None) => Error::Unvalidated,
			Err(code) => code,
		}
	}

	/// The fees recorded with a valid block.
	pub fn get_block_fees(&self, link: HeaderLink) -> Option<u64> {
		let _token = self.store.begin_read();
		match self.tables().validated_bk.get(link) {
			Ok(Some((_, fees))) => Some(fees),
			_ => None,
		}
	}

	/// True if the block is recorded unconfirmable.
	pub fn is_unconfirmable(&self, link: HeaderLink) -> bool {
		self.get_header_state(link) == HeaderState::Unconfirmable
	}

	/// True if the block is recorded confirmable.
	pub fn is_confirmable(&self, link: HeaderLink) -> bool {
		self.get_header_state(link) == HeaderState::Confirmable
	}

	/// True if the block is recorded valid.
	pub fn is_valid(&self, link: HeaderLink) -> bool {
		self.get_header_state(link) == HeaderState::Valid
	}

	/// Record the tx as connected under the context, with its fee
	/// and sigop count. Prior entries are retained.
	pub fn set_tx_connected(
		&self,
		link: TxLink,
		ctx: &Context,
		fee: u64,
		sigops: u64,
	) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables()
			.validated_tx
			.put(
				link,
				&ValidatedTxRecord {
					flags: ctx.flags.bits(),
					height: ctx.height,
					mtp: ctx.mtp,
					state: TxState::Connected as u8,
					fee,
					sigops,
				},
			)
			.map(|_| ())
	}

	/// Record the tx as disconnected under the context.
	pub fn set_tx_disconnected(&self, link: TxLink, ctx: &Context) -> Result<(), Error> {
		let _guard = self.store.begin_write();
		self.tables()
			.validated_tx
			.put(
				link,
				&ValidatedTxRecord {
					flags: ctx.flags.bits(),
					height: ctx.height,
					mtp: ctx.mtp,
					state: TxState::Disconnected as u8,
					fee: 0,
					sigops: 0,
				},
			)
			.map(|_| ())
	}

	/// The newest tx state evaluated under a context sufficient for
	/// `ctx`: same fork flags, at or below its height.
	pub fn get_tx_state(&self, link: TxLink, ctx: &Context) -> Option<(TxState, u64, u64)> {
		let _token = self.store.begin_read();
		let mut key = [0u8; 4];
		link.write_to(&mut key);
		for entry in self.tables().validated_tx.0.it(key) {
			let record = match self.tables().validated_tx.get(entry) {
				Ok(record) => record,
				Err(_) => return None,
			};
			if record.flags == ctx.flags.bits() && record.height <= ctx.height {
				let state = TxState::from_u8(record.state)?;
				return Some((state, record.fee, record.sigops));
			}
		}
		None
	}
}
