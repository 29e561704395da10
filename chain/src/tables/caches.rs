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

//! Cache tables, reconstructable from the archive: the duplicate
//! point set, the per-header prevout cache and the block/tx
//! validation state caches.

use bitcoin::consensus::encode::{serialize, Decodable, VarInt};
use byteorder::{ByteOrder, LittleEndian};

use bedrock_store::{ArrayMap, Error, FileMap, HashRecordMap, HashSlabMap, Head};

use crate::schema::{self, HeaderLink, PointLink, TxLink, ValidatedTxLink};

fn read_u24(bytes: &[u8]) -> u32 {
	LittleEndian::read_uint(&bytes[..3], 3) as u32
}

fn write_u24(bytes: &mut [u8], value: u32) {
	LittleEndian::write_uint(&mut bytes[..3], u64::from(value) & 0x00ff_ffff, 3);
}

/// Duplicate point set: hash map keyed by the spend fingerprint,
/// empty value. The domain is points observed spent more than once,
/// which is rare and bounded.
pub struct DuplicateTable(pub HashRecordMap<4, 7>);

impl DuplicateTable {
	/// Bind the head and body files.
	pub fn new(head: Head<4>, body: FileMap) -> DuplicateTable {
		DuplicateTable(HashRecordMap::new(head, body, schema::DUPLICATE_VALUE_SIZE))
	}

	/// True if the fingerprint is marked as a twin.
	pub fn contains(&self, point: PointLink, index: u32) -> Result<bool, Error> {
		self.0.contains(&super::archive::fingerprint(point, index))
	}

	/// Mark a fingerprint as a twin; idempotent.
	pub fn put(&self, point: PointLink, index: u32) -> Result<(), Error> {
		let key = super::archive::fingerprint(point, index);
		if self.0.contains(&key)? {
			return Ok(());
		}
		self.0.put(&key, &[])?;
		Ok(())
	}

	/// Number of marked twins.
	pub fn records(&self) -> u64 {
		self.0.records()
	}
}

/// The decoded per-header prevout cache: the conflicting spender txs
/// observed at association time, and per non-coinbase input in block
/// order, the prevout's tx, its coinbase flag and the spending
/// input's sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrevoutSlab {
	/// Spender txs that double-spend a point of this block.
	pub conflicts: Vec<TxLink>,
	/// Per-input `(output tx, coinbase, sequence)` in block order.
	pub prevouts: Vec<(TxLink, bool, u32)>,
}

// Per-entry presence byte. A flag byte keeps the terminal sentinel
// disjoint from every valid `(tx, coinbase)` pair.
const PREVOUT_ABSENT: u8 = 0;
const PREVOUT_PLAIN: u8 = 1;
const PREVOUT_COINBASE: u8 = 2;

// Entry layout: presence byte, tx link, sequence.
const PREVOUT_ENTRY_SIZE: usize = 1 + 4 + 4;

impl PrevoutSlab {
	fn encode(&self) -> Vec<u8> {
		let mut bytes =
			vec![0u8; 8 + self.conflicts.len() * 4 + self.prevouts.len() * PREVOUT_ENTRY_SIZE];
		LittleEndian::write_u32(&mut bytes[0..4], self.conflicts.len() as u32);
		let mut at = 4;
		for conflict in &self.conflicts {
			conflict.write_to(&mut bytes[at..at + 4]);
			at += 4;
		}
		LittleEndian::write_u32(&mut bytes[at..at + 4], self.prevouts.len() as u32);
		at += 4;
		for &(tx, coinbase, sequence) in &self.prevouts {
			bytes[at] = if tx.is_terminal() {
				PREVOUT_ABSENT
			} else if coinbase {
				PREVOUT_COINBASE
			} else {
				PREVOUT_PLAIN
			};
			tx.write_to(&mut bytes[at + 1..at + 5]);
			LittleEndian::write_u32(&mut bytes[at + 5..at + 9], sequence);
			at += PREVOUT_ENTRY_SIZE;
		}
		bytes
	}

	fn decode(bytes: &[u8]) -> Result<PrevoutSlab, Error> {
		if bytes.len() < 8 {
			return Err(Error::Integrity7);
		}
		let conflict_count = LittleEndian::read_u32(&bytes[0..4]) as usize;
		let mut at = 4;
		if bytes.len() < at + conflict_count * 4 + 4 {
			return Err(Error::Integrity7);
		}
		let mut conflicts = Vec::with_capacity(conflict_count);
		for _ in 0..conflict_count {
			conflicts.push(TxLink::from_slice(&bytes[at..at + 4]));
			at += 4;
		}
		let prevout_count = LittleEndian::read_u32(&bytes[at..at + 4]) as usize;
		at += 4;
		if bytes.len() < at + prevout_count * PREVOUT_ENTRY_SIZE {
			return Err(Error::Integrity7);
		}
		let mut prevouts = Vec::with_capacity(prevout_count);
		for _ in 0..prevout_count {
			let tx = TxLink::from_slice(&bytes[at + 1..at + 5]);
			let sequence = LittleEndian::read_u32(&bytes[at + 5..at + 9]);
			let entry = match bytes[at] {
				PREVOUT_ABSENT => (TxLink::TERMINAL, false, sequence),
				PREVOUT_PLAIN => (tx, false, sequence),
				PREVOUT_COINBASE => (tx, true, sequence),
				_ => return Err(Error::Integrity7),
			};
			prevouts.push(entry);
			at += PREVOUT_ENTRY_SIZE;
		}
		Ok(PrevoutSlab {
			conflicts,
			prevouts,
		})
	}
}

/// Prevout cache: array map keyed by header link. The only table
/// that shrinks (prune).
pub struct PrevoutTable(pub ArrayMap<5>);

impl PrevoutTable {
	/// Bind the head and body files.
	pub fn new(head: Head<5>, body: FileMap) -> PrevoutTable {
		PrevoutTable(ArrayMap::new(head, body))
	}

	/// True if the header's prevouts are cached.
	pub fn contains(&self, header: HeaderLink) -> Result<bool, Error> {
		Ok(!self.0.at(header.index())?.is_terminal())
	}

	/// Cache the prevout set of a header.
	pub fn put(&self, header: HeaderLink, slab: &PrevoutSlab) -> Result<(), Error> {
		self.0.put(header.index(), &slab.encode())?;
		Ok(())
	}

	/// Load the cached prevout set of a header.
	pub fn get(&self, header: HeaderLink) -> Result<Option<PrevoutSlab>, Error> {
		let link = self.0.at(header.index())?;
		if link.is_terminal() {
			return Ok(None);
		}
		let payload = self.0.payload(link)?;
		Ok(Some(PrevoutSlab::decode(&payload)?))
	}

	/// Drop every cached set (prune).
	pub fn clear(&self) -> Result<(), Error> {
		self.0.clear().map_err(|_| Error::PruneTable)
	}
}

/// Validated-block cache: slab hash map keyed by header link holding
/// the block state and fees.
pub struct ValidatedBkTable(pub HashSlabMap<3, 3>);

impl ValidatedBkTable {
	/// Bind the head and body files.
	pub fn new(head: Head<3>, body: FileMap) -> ValidatedBkTable {
		ValidatedBkTable(HashSlabMap::new(head, body))
	}

	fn key(header: HeaderLink) -> [u8; 3] {
		let mut key = [0u8; 3];
		header.write_to(&mut key);
		key
	}

	/// Record a block state; supersedes prior records.
	pub fn put(&self, header: HeaderLink, state: u8, fees: u64) -> Result<(), Error> {
		let mut payload = vec![state];
		payload.extend_from_slice(&serialize(&VarInt(fees)));
		self.0.put(&Self::key(header), &payload)?;
		Ok(())
	}

	/// The most recent block state and fees.
	pub fn get(&self, header: HeaderLink) -> Result<Option<(u8, u64)>, Error> {
		let link = self.0.find_link(&Self::key(header))?;
		if link.is_terminal() {
			return Ok(None);
		}
		let payload = self.0.payload(link)?;
		if payload.is_empty() {
			return Err(Error::Integrity);
		}
		let mut cursor = &payload[1..];
		let fees = VarInt::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		Ok(Some((payload[0], fees.0)))
	}
}

/// The decoded validated-tx entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedTxRecord {
	/// Fork flags the tx was evaluated under.
	pub flags: u32,
	/// Height the tx was evaluated at.
	pub height: u32,
	/// Median time past the tx was evaluated at.
	pub mtp: u32,
	/// Persisted tx state byte.
	pub state: u8,
	/// Fee determined at connection.
	pub fee: u64,
	/// Signature op count determined at connection.
	pub sigops: u64,
}

/// Validated-tx cache: slab hash map keyed by tx link. Entries
/// accumulate over time; prior entries are retained and the most
/// recent sufficient one wins.
pub struct ValidatedTxTable(pub HashSlabMap<5, 4>);

impl ValidatedTxTable {
	/// Bind the head and body files.
	pub fn new(head: Head<5>, body: FileMap) -> ValidatedTxTable {
		ValidatedTxTable(HashSlabMap::new(head, body))
	}

	fn key(tx: TxLink) -> [u8; 4] {
		let mut key = [0u8; 4];
		tx.write_to(&mut key);
		key
	}

	/// Append a validation entry for a tx.
	pub fn put(&self, tx: TxLink, record: &ValidatedTxRecord) -> Result<ValidatedTxLink, Error> {
		let mut payload = vec![0u8; 12];
		LittleEndian::write_u32(&mut payload[0..4], record.flags);
		write_u24(&mut payload[4..7], record.height);
		LittleEndian::write_u32(&mut payload[7..11], record.mtp);
		payload[11] = record.state;
		payload.extend_from_slice(&serialize(&VarInt(record.fee)));
		payload.extend_from_slice(&serialize(&VarInt(record.sigops)));
		self.0.put(&Self::key(tx), &payload)
	}

	/// The most recent entry for a tx, newest first on iteration.
	pub fn get(&self, link: ValidatedTxLink) -> Result<ValidatedTxRecord, Error> {
		let payload = self.0.payload(link)?;
		if payload.len() < 12 {
			return Err(Error::Integrity);
		}
		let mut cursor = &payload[12..];
		let fee = VarInt::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		let sigops = VarInt::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		Ok(ValidatedTxRecord {
			flags: LittleEndian::read_u32(&payload[0..4]),
			height: read_u24(&payload[4..7]),
			mtp: LittleEndian::read_u32(&payload[7..11]),
			state: payload[11],
			fee: fee.0,
			sigops: sigops.0,
		})
	}

	/// The most recent entry link for a tx.
	pub fn find(&self, tx: TxLink) -> Result<ValidatedTxLink, Error> {
		self.0.find_link(&Self::key(tx))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prevout_slab_round_trip() {
		let slab = PrevoutSlab {
			conflicts: vec![TxLink::new(9), TxLink::new(12)],
			prevouts: vec![
				(TxLink::new(4), true, 0xffff_ffff),
				(TxLink::new(5), false, 17),
				(TxLink::TERMINAL, false, 0),
			],
		};
		assert_eq!(PrevoutSlab::decode(&slab.encode()).unwrap(), slab);
	}

	#[test]
	fn prevout_slab_keeps_coinbase_links_distinct_from_terminal() {
		// No link/flag combination may alias the absent sentinel.
		let slab = PrevoutSlab {
			conflicts: vec![],
			prevouts: vec![
				(TxLink::new(0x7fff_ffff), true, 0),
				(TxLink::new(0x7fff_ffff), false, 0),
				(TxLink::TERMINAL, false, 0),
			],
		};
		let decoded = PrevoutSlab::decode(&slab.encode()).unwrap();
		assert_eq!(decoded, slab);
		assert!(!decoded.prevouts[0].0.is_terminal());
		assert!(decoded.prevouts[0].1);
		assert!(decoded.prevouts[2].0.is_terminal());
	}

	#[test]
	fn prevout_slab_rejects_short_bytes() {
		assert_eq!(
			PrevoutSlab::decode(&[0u8; 4]).unwrap_err(),
			Error::Integrity7
		);
	}
}
