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

//! Storage-side consensus evaluation: the prevout cache and block
//! confirmability (bip30 duplicate coinbase, bip68 relative
//! locktime, coinbase maturity, double spends). The per-tx
//! spendability pass is a parallel map over independent work; the
//! first failure wins through a release-acquire error slot.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use bitcoin::hashes::Hash;
use bitcoin::Block;

use bedrock_store::Error;

use crate::context::{self, Context, Forks};
use crate::schema::{HeaderLink, SpendLink, TxLink};
use crate::store::Storage;
use crate::tables::PrevoutSlab;

use super::Query;

// Sets per worker below which the pass stays on the calling thread.
const PARALLEL_THRESHOLD: usize = 8;
const WORKERS: usize = 4;

/// The spendability view of one spending tx: its version and, per
/// input, the sequence and the cached prevout resolution.
#[derive(Clone, Debug)]
pub struct PointSet {
	/// The spending tx's version (bip68 gate).
	pub version: u32,
	/// Per input: `(sequence, prevout tx, prevout is coinbase)`.
	pub points: Vec<(u32, TxLink, bool)>,
}

// The failures the per-tx pass may report, as a constant lookup
// table so the winner travels through one atomic word.
const SLOT_CODES: [Error; 7] = [
	Error::MissingPreviousOutput,
	Error::UnconfirmedSpend,
	Error::RelativeTimeLocked,
	Error::CoinbaseMaturity,
	Error::ConfirmedDoubleSpend,
	Error::Integrity6,
	Error::Integrity,
];

// First-failure-wins error slot with release-acquire ordering.
struct ErrorSlot(AtomicUsize);

impl ErrorSlot {
	fn new() -> ErrorSlot {
		ErrorSlot(AtomicUsize::new(0))
	}

	fn store(&self, code: Error) {
		let slot = SLOT_CODES
			.iter()
			.position(|&known| known == code)
			.unwrap_or(SLOT_CODES.len() - 1);
		let _ = self
			.0
			.compare_exchange(0, slot + 1, Ordering::AcqRel, Ordering::Relaxed);
	}

	fn is_set(&self) -> bool {
		self.0.load(Ordering::Acquire) != 0
	}

	fn get(&self) -> Option<Error> {
		match self.0.load(Ordering::Acquire) {
			0 => None,
			slot => Some(SLOT_CODES[slot - 1]),
		}
	}
}

impl<'a, S: Storage> Query<'a, S> {
	/// Pre-resolve and cache the prevout metadata of every input of
	/// every non-coinbase tx of the block, plus the conflicting
	/// spender txs observed through the duplicate table.
	pub fn set_prevouts(&self, link: HeaderLink, block: &Block) -> Result<(), Error> {
		let _guard = self.store.begin_write();

		// Spends internal to the block are not conflicts.
		let own: HashSet<TxLink> = block
			.txdata
			.iter()
			.filter_map(|tx| {
				let found = self
					.tables()
					.tx
					.find(&tx.compute_txid().to_byte_array())
					.ok()?;
				if found.is_terminal() {
					None
				} else {
					Some(found)
				}
			})
			.collect();

		let mut slab = PrevoutSlab::default();
		for tx in block.txdata.iter().skip(1) {
			for input in &tx.input {
				let hash = input.previous_output.txid.to_byte_array();
				let first = self.first_point(&hash);
				if !first.is_terminal()
					&& self
						.tables()
						.duplicate
						.contains(first, input.previous_output.vout)?
				{
					for spend in self.to_spenders_inner(&input.previous_output) {
						let parent = self.tables().spend.get(spend)?.parent;
						if !own.contains(&parent) && !slab.conflicts.contains(&parent) {
							slab.conflicts.push(parent);
						}
					}
				}

				let output_tx = self.tables().tx.find(&hash)?;
				let coinbase = if output_tx.is_terminal() {
					false
				} else {
					self.tables().tx.get(output_tx)?.coinbase
				};
				slab.prevouts
					.push((output_tx, coinbase, input.sequence.0));
			}
		}

		self.tables()
			.prevout
			.put(link, &slab)
			.map_err(|_| Error::Integrity5)
	}

	/// True if the header's prevout cache is populated.
	pub fn is_prevouts_cached(&self, link: HeaderLink) -> bool {
		let _token = self.store.begin_read();
		self.tables().prevout.contains(link).unwrap_or(false)
	}

	/// Evaluate whether the block may extend the confirmed chain:
	/// bip30 duplicate-coinbase spentness, cached double-spend
	/// conflicts, and per-input spendability (confirmation, bip68
	/// relative locktime, coinbase maturity).
	pub fn block_confirmable(&self, link: HeaderLink) -> Result<(), Error> {
		let _token = self.store.begin_read();

		let ctx = self.get_context_inner(link).ok_or(Error::Integrity6)?;
		if ctx.flags.contains(Forks::BIP30_RULE) {
			self.unspent_duplicates(link, &ctx)?;
		}

		let links = match self.tables().txs.get(link)? {
			Some((_, links)) => links,
			None => return Err(Error::Unassociated),
		};
		// The coinbase spends nothing; an empty remainder succeeds.
		if links.len() <= 1 {
			return Ok(());
		}

		let mut sets = Vec::with_capacity(links.len() - 1);
		for &tx in &links[1..] {
			sets.push(self.to_point_set(tx)?);
		}

		// The cache read precedes the per-tx spendability pass.
		let cache = self
			.tables()
			.prevout
			.get(link)?
			.ok_or(Error::Integrity7)?;
		for &conflict in &cache.conflicts {
			if self.is_strong_tx_inner(conflict) {
				return Err(Error::ConfirmedDoubleSpend);
			}
		}

		// Populate each point from the cache, in the same order the
		// cache was written.
		let mut at = 0;
		for set in &mut sets {
			for point in &mut set.points {
				let &(prevout_tx, coinbase, sequence) =
					cache.prevouts.get(at).ok_or(Error::Integrity7)?;
				point.0 = sequence;
				point.1 = prevout_tx;
				point.2 = coinbase;
				at += 1;
			}
		}
		if at != cache.prevouts.len() {
			return Err(Error::Integrity7);
		}

		self.check_point_sets(&sets, &ctx)
	}

	// The archived spend run of a tx as an unpopulated point set.
	fn to_point_set(&self, tx: TxLink) -> Result<PointSet, Error> {
		let record = self.tables().tx.get(tx)?;
		let mut points = Vec::with_capacity(record.ins as usize);
		for at in 0..u64::from(record.ins) {
			let cell = self
				.tables()
				.spend
				.get(SpendLink::new(record.ins_fk.value() + at))?;
			points.push((cell.sequence, TxLink::TERMINAL, false));
		}
		Ok(PointSet {
			version: record.version,
			points,
		})
	}

	// Parallel map over per-tx spendability; first failure wins via
	// the atomic slot.
	fn check_point_sets(&self, sets: &[PointSet], ctx: &Context) -> Result<(), Error> {
		let slot = ErrorSlot::new();
		if sets.len() < PARALLEL_THRESHOLD * WORKERS {
			for set in sets {
				if slot.is_set() {
					break;
				}
				if let Err(code) = self.check_point_set(set, ctx) {
					slot.store(code);
				}
			}
		} else {
			let chunk = (sets.len() + WORKERS - 1) / WORKERS;
			std::thread::scope(|scope| {
				for sets in sets.chunks(chunk) {
					let slot = &slot;
					scope.spawn(move || {
						for set in sets {
							if slot.is_set() {
								return;
							}
							if let Err(code) = self.check_point_set(set, ctx) {
								slot.store(code);
							}
						}
					});
				}
			});
		}
		match slot.get() {
			Some(code) => Err(code),
			None => Ok(()),
		}
	}

	fn check_point_set(&self, set: &PointSet, ctx: &Context) -> Result<(), Error> {
		for &(sequence, prevout_tx, coinbase) in &set.points {
			if prevout_tx.is_terminal() {
				return Err(Error::MissingPreviousOutput);
			}
			let strong = self.to_block_inner(prevout_tx);
			if strong.is_terminal() {
				return Err(Error::UnconfirmedSpend);
			}
			let prevout = self
				.tables()
				.header
				.get(strong)
				.map_err(|_| Error::Integrity6)?;
			if ctx.flags.contains(Forks::BIP68_RULE)
				&& context::is_relative_locked(
					sequence,
					set.version,
					ctx,
					prevout.height,
					prevout.mtp,
				) {
				return Err(Error::RelativeTimeLocked);
			}
			if coinbase && context::is_immature(ctx.height, prevout.height) {
				return Err(Error::CoinbaseMaturity);
			}
		}
		Ok(())
	}

	// bip30: every strong predecessor sharing the coinbase hash must
	// have all outputs confirmed-spent.
	fn unspent_duplicates(&self, link: HeaderLink, ctx: &Context) -> Result<(), Error> {
		if !ctx.flags.contains(Forks::BIP30_RULE) {
			return Ok(());
		}
		let coinbase = match self.tables().txs.get(link)? {
			Some((_, links)) => match links.first() {
				Some(&coinbase) => coinbase,
				None => return Err(Error::Integrity1),
			},
			None => return Err(Error::Unassociated),
		};
		let hash = self.tables().tx.key_at(coinbase)?;
		for twin in self.tables().tx.0.it(hash) {
			if twin == coinbase {
				continue;
			}
			if !self.is_strong_tx_inner(twin) {
				continue;
			}
			if !self.is_spent_coinbase(twin)? {
				return Err(Error::UnspentCoinbaseCollision);
			}
		}
		Ok(())
	}

	// True if every output of the (coinbase) tx is confirmed-spent.
	fn is_spent_coinbase(&self, tx: TxLink) -> Result<bool, Error> {
		let record = self.tables().tx.get(tx)?;
		Ok((0..record.outs).all(|index| self.is_spent_prevout(tx, index)))
	}
}
