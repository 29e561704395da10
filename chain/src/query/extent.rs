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

//! Store extent and counters, expected only for diagnostics.

use bedrock_store::Error;

use crate::schema::TxLink;
use crate::store::Storage;

use super::Query;

impl<'a, S: Storage> Query<'a, S> {
	/// Logical byte size of the full store (heads and bodies).
	pub fn store_size(&self) -> usize {
		let _token = self.store.begin_read();
		self.tables().files().iter().map(|file| file.size()).sum()
	}

	/// Logical byte size of the archive bodies.
	pub fn archive_body_size(&self) -> usize {
		let _token = self.store.begin_read();
		let tables = self.tables();
		tables.header.0.body().size()
			+ tables.tx.0.body().size()
			+ tables.point.0.body().size()
			+ tables.input.0.body().size()
			+ tables.output.0.body().size()
			+ tables.puts.0.body().size()
			+ tables.spend.0.anchors().body().size()
			+ tables.spend.0.cells().size()
			+ tables.txs.0.body().size()
	}

	/// Logical byte size of the archive heads.
	pub fn archive_head_size(&self) -> usize {
		let _token = self.store.begin_read();
		let tables = self.tables();
		tables.header.0.head().size()
			+ tables.tx.0.head().size()
			+ tables.point.0.head().size()
			+ tables.input.0.head().size()
			+ tables.output.0.head().size()
			+ tables.puts.0.head().size()
			+ tables.spend.0.anchors().head().size()
			+ tables.spend.0.cell_head().size()
			+ tables.txs.0.head().size()
	}

	/// Logical byte size of the archive (heads and bodies).
	pub fn archive_size(&self) -> usize {
		self.archive_head_size() + self.archive_body_size()
	}

	/// Archived header count (committed and orphaned).
	pub fn header_records(&self) -> u64 {
		let _token = self.store.begin_read();
		self.tables().header.0.records()
	}

	/// Archived tx count (committed and orphaned).
	pub fn tx_records(&self) -> u64 {
		let _token = self.store.begin_read();
		self.tables().tx.0.records()
	}

	/// Archived point count.
	pub fn point_records(&self) -> u64 {
		let _token = self.store.begin_read();
		self.tables().point.0.records()
	}

	/// Candidate index length.
	pub fn candidate_records(&self) -> u64 {
		let _token = self.store.begin_read();
		self.tables().candidate.count()
	}

	/// Confirmed index length.
	pub fn confirmed_records(&self) -> u64 {
		let _token = self.store.begin_read();
		self.tables().confirmed.count()
	}

	/// Strong record count.
	pub fn strong_tx_records(&self) -> u64 {
		let _token = self.store.begin_read();
		self.tables().strong_tx.0.records()
	}

	/// Marked twin count.
	pub fn duplicate_records(&self) -> u64 {
		let _token = self.store.begin_read();
		self.tables().duplicate.records()
	}

	/// Header table bucket count.
	pub fn header_buckets(&self) -> usize {
		let _token = self.store.begin_read();
		self.tables().header.0.head().buckets()
	}

	/// Tx table bucket count.
	pub fn tx_buckets(&self) -> usize {
		let _token = self.store.begin_read();
		self.tables().tx.0.head().buckets()
	}

	/// Point table bucket count.
	pub fn point_buckets(&self) -> usize {
		let _token = self.store.begin_read();
		self.tables().point.0.head().buckets()
	}

	/// A tx's input count.
	pub fn input_count(&self, tx: TxLink) -> Option<usize> {
		let _token = self.store.begin_read();
		self.tables().tx.get(tx).ok().map(|record| record.ins as usize)
	}

	/// A tx's output count.
	pub fn output_count(&self, tx: TxLink) -> Option<usize> {
		let _token = self.store.begin_read();
		self.tables()
			.tx
			.get(tx)
			.ok()
			.map(|record| record.outs as usize)
	}

	/// A tx's input and output counts.
	pub fn put_counts(&self, tx: TxLink) -> Option<(usize, usize)> {
		let _token = self.store.begin_read();
		self.tables()
			.tx
			.get(tx)
			.ok()
			.map(|record| (record.ins as usize, record.outs as usize))
	}

	/// Summed input and output counts over a tx set.
	pub fn put_counts_all(&self, txs: &[TxLink]) -> (usize, usize) {
		txs.iter()
			.filter_map(|&tx| self.put_counts(tx))
			.fold((0, 0), |acc, counts| (acc.0 + counts.0, acc.1 + counts.1))
	}

	/// Summed recorded block sizes over the candidate range.
	pub fn get_candidate_size(&self) -> usize {
		let top = self.get_top_candidate();
		self.get_candidate_size_from(top)
	}

	/// Summed recorded block sizes up to a candidate height.
	pub fn get_candidate_size_from(&self, top: usize) -> usize {
		(0..=top)
			.map(|height| self.get_block_size(self.to_candidate(height)))
			.sum()
	}

	/// Summed recorded block sizes over the confirmed range.
	pub fn get_confirmed_size(&self) -> usize {
		let top = self.get_top_confirmed();
		self.get_confirmed_size_from(top)
	}

	/// Summed recorded block sizes up to a confirmed height.
	pub fn get_confirmed_size_from(&self, top: usize) -> usize {
		(0..=top)
			.map(|height| self.get_block_size(self.to_confirmed(height)))
			.sum()
	}

	/// First latched fault across the store's files, if any.
	pub fn get_fault(&self) -> Option<Error> {
		self.tables().files().iter().find_map(|file| file.fault())
	}

	/// True if any file is latched disk-full.
	pub fn is_full(&self) -> bool {
		self.tables().files().iter().any(|file| file.is_full())
	}

	/// True if any file carries a latched fault.
	pub fn is_fault(&self) -> bool {
		self.get_fault().is_some()
	}

	/// Bytes required to clear the disk-full condition.
	pub fn get_space(&self) -> usize {
		self.tables().files().iter().map(|file| file.space()).sum()
	}
}
