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

//! Archive tables: the authoritative chain record. Headers and txs
//! are hash maps keyed by their 32-byte hashes; inputs, outputs and
//! the puts link-lists are unindexed slabs; points assert prevout
//! hash presence; spends bind prevout fingerprints to spending
//! inputs; txs bind a header to its transactions.

use bitcoin::consensus::encode::{serialize, Decodable, VarInt};
use bitcoin::{ScriptBuf, Witness};
use byteorder::{ByteOrder, LittleEndian};

use bedrock_store::{Error, FileMap, HashRecordMap, HashSlabMap, Head, MultiMap};

use crate::schema::{
	self, HeaderLink, InputLink, OutputLink, PointLink, PutsLink, SpendLink, TxLink, TxsLink,
};
use crate::tables::Body;

fn read_u24(bytes: &[u8]) -> u32 {
	LittleEndian::read_uint(&bytes[..3], 3) as u32
}

fn write_u24(bytes: &mut [u8], value: u32) {
	LittleEndian::write_uint(&mut bytes[..3], u64::from(value) & 0x00ff_ffff, 3);
}

/// The decoded header record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderRecord {
	/// Fork flags of the validation context.
	pub flags: u32,
	/// Height of the header.
	pub height: u32,
	/// Median time past of the validation context.
	pub mtp: u32,
	/// Application milestone marker.
	pub milestone: bool,
	/// Parent header, terminal at genesis only.
	pub parent: HeaderLink,
	/// Header version field.
	pub version: u32,
	/// Header timestamp.
	pub time: u32,
	/// Header bits field.
	pub bits: u32,
	/// Header nonce field.
	pub nonce: u32,
	/// Header merkle root.
	pub merkle_root: [u8; 32],
}

impl HeaderRecord {
	fn write(&self, buf: &mut [u8]) {
		LittleEndian::write_u32(&mut buf[0..4], self.flags);
		write_u24(&mut buf[4..7], self.height);
		LittleEndian::write_u32(&mut buf[7..11], self.mtp);
		buf[11] = self.milestone as u8;
		self.parent.write_to(&mut buf[12..15]);
		LittleEndian::write_u32(&mut buf[15..19], self.version);
		LittleEndian::write_u32(&mut buf[19..23], self.time);
		LittleEndian::write_u32(&mut buf[23..27], self.bits);
		LittleEndian::write_u32(&mut buf[27..31], self.nonce);
		buf[31..63].copy_from_slice(&self.merkle_root);
	}

	fn read(buf: &[u8]) -> HeaderRecord {
		let mut merkle_root = [0u8; 32];
		merkle_root.copy_from_slice(&buf[31..63]);
		HeaderRecord {
			flags: LittleEndian::read_u32(&buf[0..4]),
			height: read_u24(&buf[4..7]),
			mtp: LittleEndian::read_u32(&buf[7..11]),
			milestone: buf[11] != 0,
			parent: HeaderLink::from_slice(&buf[12..15]),
			version: LittleEndian::read_u32(&buf[15..19]),
			time: LittleEndian::read_u32(&buf[19..23]),
			bits: LittleEndian::read_u32(&buf[23..27]),
			nonce: LittleEndian::read_u32(&buf[27..31]),
			merkle_root,
		}
	}
}

/// Header archive: hash map keyed by block hash.
pub struct HeaderTable(pub HashRecordMap<3, 32>);

impl HeaderTable {
	/// Bind the head and body files.
	pub fn new(head: Head<3>, body: FileMap) -> HeaderTable {
		HeaderTable(HashRecordMap::new(head, body, schema::HEADER_VALUE_SIZE))
	}

	/// Translate a block hash to its header link.
	pub fn find(&self, hash: &[u8; 32]) -> Result<HeaderLink, Error> {
		self.0.find_link(hash)
	}

	/// Write and commit a header record.
	pub fn put(&self, hash: &[u8; 32], record: &HeaderRecord) -> Result<HeaderLink, Error> {
		let mut value = [0u8; schema::HEADER_VALUE_SIZE];
		record.write(&mut value);
		self.0.put(hash, &value)
	}

	/// Read a header record.
	pub fn get(&self, link: HeaderLink) -> Result<HeaderRecord, Error> {
		Ok(HeaderRecord::read(&self.0.value(link)?))
	}

	/// The block hash of a header record.
	pub fn key_at(&self, link: HeaderLink) -> Result<[u8; 32], Error> {
		self.0.key_at(link)
	}
}

/// The decoded tx record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxRecord {
	/// True for the coinbase of a block.
	pub coinbase: bool,
	/// Serialized size without witness data.
	pub light: u32,
	/// Serialized size with witness data.
	pub heavy: u32,
	/// Tx version field.
	pub version: u32,
	/// Tx locktime field.
	pub locktime: u32,
	/// Input count.
	pub ins: u32,
	/// Output count.
	pub outs: u32,
	/// First cell of the contiguous per-tx spend run.
	pub ins_fk: SpendLink,
	/// Start of the output link run in the puts slab.
	pub outs_fk: PutsLink,
}

impl TxRecord {
	fn write(&self, buf: &mut [u8]) {
		buf[0] = self.coinbase as u8;
		write_u24(&mut buf[1..4], self.light);
		write_u24(&mut buf[4..7], self.heavy);
		LittleEndian::write_u32(&mut buf[7..11], self.version);
		LittleEndian::write_u32(&mut buf[11..15], self.locktime);
		write_u24(&mut buf[15..18], self.ins);
		write_u24(&mut buf[18..21], self.outs);
		self.ins_fk.write_to(&mut buf[21..25]);
		self.outs_fk.write_to(&mut buf[25..30]);
	}

	fn read(buf: &[u8]) -> TxRecord {
		TxRecord {
			coinbase: buf[0] != 0,
			light: read_u24(&buf[1..4]),
			heavy: read_u24(&buf[4..7]),
			version: LittleEndian::read_u32(&buf[7..11]),
			locktime: LittleEndian::read_u32(&buf[11..15]),
			ins: read_u24(&buf[15..18]),
			outs: read_u24(&buf[18..21]),
			ins_fk: SpendLink::from_slice(&buf[21..25]),
			outs_fk: PutsLink::from_slice(&buf[25..30]),
		}
	}
}

/// Tx archive: hash map keyed by txid, with deferred key commit.
pub struct TxTable(pub HashRecordMap<4, 32>);

impl TxTable {
	/// Bind the head and body files.
	pub fn new(head: Head<4>, body: FileMap) -> TxTable {
		TxTable(HashRecordMap::new(head, body, schema::TX_VALUE_SIZE))
	}

	/// Translate a txid to its tx link.
	pub fn find(&self, hash: &[u8; 32]) -> Result<TxLink, Error> {
		self.0.find_link(hash)
	}

	/// Allocate an uncommitted tx record slot.
	pub fn allocate(&self) -> Result<TxLink, Error> {
		self.0.allocate(1)
	}

	/// Write a tx record into an allocated slot (not yet observable).
	pub fn set(&self, link: TxLink, record: &TxRecord) -> Result<(), Error> {
		let mut value = [0u8; schema::TX_VALUE_SIZE];
		record.write(&mut value);
		self.0.value_mut(link)?.copy_from_slice(&value);
		Ok(())
	}

	/// Commit the txid into the hash bucket; the observability step.
	pub fn commit(&self, link: TxLink, hash: &[u8; 32]) -> Result<(), Error> {
		self.0.commit(link, hash)
	}

	/// Read a tx record.
	pub fn get(&self, link: TxLink) -> Result<TxRecord, Error> {
		Ok(TxRecord::read(&self.0.value(link)?))
	}

	/// The txid of a tx record.
	pub fn key_at(&self, link: TxLink) -> Result<[u8; 32], Error> {
		self.0.key_at(link)
	}
}

/// Point archive: hash map keyed by prevout hash, empty value.
/// Presence asserts the hash is referenced by some input.
pub struct PointTable(pub HashRecordMap<4, 32>);

impl PointTable {
	/// Bind the head and body files.
	pub fn new(head: Head<4>, body: FileMap) -> PointTable {
		PointTable(HashRecordMap::new(head, body, schema::POINT_VALUE_SIZE))
	}

	/// Translate a prevout hash to its most recent point record.
	pub fn find(&self, hash: &[u8; 32]) -> Result<PointLink, Error> {
		self.0.find_link(hash)
	}

	/// Append and commit a point record for the hash.
	pub fn put(&self, hash: &[u8; 32]) -> Result<PointLink, Error> {
		self.0.put(hash, &[])
	}

	/// The prevout hash of a point record.
	pub fn key_at(&self, link: PointLink) -> Result<[u8; 32], Error> {
		self.0.key_at(link)
	}
}

/// Input archive: unindexed slabs of opaque `(script, witness)`.
pub struct InputTable(pub Body<5>);

impl InputTable {
	/// Bind the head and body files.
	pub fn new(head: Head<5>, body: FileMap) -> InputTable {
		InputTable(Body::new(head, body))
	}

	/// Store an input's script and witness blobs.
	pub fn put(&self, script: &ScriptBuf, witness: &Witness) -> Result<InputLink, Error> {
		let mut bytes = serialize(script);
		bytes.extend_from_slice(&serialize(witness));
		self.0.put(bytes.len(), &bytes)
	}

	/// Load an input's script and witness blobs.
	pub fn get(&self, link: InputLink) -> Result<(ScriptBuf, Witness), Error> {
		let slab = self.0.read(link)?;
		let mut cursor = &slab[..];
		let script = ScriptBuf::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		let witness = Witness::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		Ok((script, witness))
	}
}

/// Output archive: unindexed slabs of `(parent tx, value, script)`.
pub struct OutputTable(pub Body<5>);

impl OutputTable {
	/// Bind the head and body files.
	pub fn new(head: Head<5>, body: FileMap) -> OutputTable {
		OutputTable(Body::new(head, body))
	}

	/// Store an output under its parent tx.
	pub fn put(&self, parent: TxLink, value: u64, script: &ScriptBuf) -> Result<OutputLink, Error> {
		let mut bytes = vec![0u8; 4];
		parent.write_to(&mut bytes[..4]);
		bytes.extend_from_slice(&serialize(&VarInt(value)));
		bytes.extend_from_slice(&serialize(script));
		self.0.put(bytes.len(), &bytes)
	}

	/// Load an output and its parent tx.
	pub fn get(&self, link: OutputLink) -> Result<(TxLink, u64, ScriptBuf), Error> {
		let slab = self.0.read(link)?;
		if slab.len() < 4 {
			return Err(Error::Integrity);
		}
		let parent = TxLink::from_slice(&slab[..4]);
		let mut cursor = &slab[4..];
		let value = VarInt::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		let script = ScriptBuf::consensus_decode(&mut cursor).map_err(|_| Error::Integrity)?;
		Ok((parent, value.0, script))
	}

	/// The parent tx of an output.
	pub fn parent(&self, link: OutputLink) -> Result<TxLink, Error> {
		let slab = self.0.read_span(link, 4)?;
		Ok(TxLink::from_slice(&slab))
	}
}

/// Puts archive: contiguous output link runs, one run per tx.
pub struct PutsTable(pub Body<5>);

impl PutsTable {
	/// Bind the head and body files.
	pub fn new(head: Head<5>, body: FileMap) -> PutsTable {
		PutsTable(Body::new(head, body))
	}

	/// Allocate a run for `count` output links.
	pub fn allocate(&self, count: usize) -> Result<PutsLink, Error> {
		self.0.allocate(count * 5)
	}

	/// Write the links of a run in place.
	pub fn set(&self, link: PutsLink, links: &[OutputLink]) -> Result<(), Error> {
		let mut span = self
			.0
			.body()
			.write_span(link, links.len() * 5)
			.map_err(|_| Error::TxPutsPut)?;
		for (index, output) in links.iter().enumerate() {
			output.write_to(&mut span[index * 5..index * 5 + 5]);
		}
		Ok(())
	}

	/// Read the links of a run.
	pub fn get(&self, link: PutsLink, count: usize) -> Result<Vec<OutputLink>, Error> {
		let span = self.0.read_span(link, count * 5)?;
		Ok((0..count)
			.map(|index| OutputLink::from_slice(&span[index * 5..index * 5 + 5]))
			.collect())
	}
}

/// The decoded spend cell. The fingerprint fields (point, index) are
/// carried in the cell as well as in the anchor key so the per-tx
/// spend run can be read without a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendCell {
	/// The prevout's point record.
	pub point: PointLink,
	/// The prevout's output index (null index for coinbase).
	pub index: u32,
	/// The spending tx.
	pub parent: TxLink,
	/// The spending input's sequence field.
	pub sequence: u32,
	/// The spending input's slab.
	pub input: InputLink,
}

impl SpendCell {
	fn write(&self, buf: &mut [u8]) {
		self.point.write_to(&mut buf[0..4]);
		write_u24(&mut buf[4..7], schema::to_index(self.index));
		self.parent.write_to(&mut buf[7..11]);
		LittleEndian::write_u32(&mut buf[11..15], self.sequence);
		self.input.write_to(&mut buf[15..20]);
	}

	fn read(buf: &[u8]) -> SpendCell {
		SpendCell {
			point: PointLink::from_slice(&buf[0..4]),
			index: schema::from_index(read_u24(&buf[4..7])),
			parent: TxLink::from_slice(&buf[7..11]),
			sequence: LittleEndian::read_u32(&buf[11..15]),
			input: InputLink::from_slice(&buf[15..20]),
		}
	}

	/// The cell's spend fingerprint.
	pub fn fingerprint(&self) -> [u8; 7] {
		fingerprint(self.point, self.index)
	}
}

/// The compact spend key: point stub and point index.
pub fn fingerprint(point: PointLink, index: u32) -> [u8; 7] {
	let mut key = [0u8; 7];
	point.write_to(&mut key[0..4]);
	write_u24(&mut key[4..7], schema::to_index(index));
	key
}

/// Spend archive: record multimap keyed by the 7-byte fingerprint.
/// Cells are allocated contiguously per tx and linked only after the
/// owning tx record is committed.
pub struct SpendTable(pub MultiMap<4, 7>);

impl SpendTable {
	/// Bind the anchor and cell head/body files.
	pub fn new(
		head: Head<4>,
		anchor_body: FileMap,
		cell_head: Head<4>,
		cell_body: FileMap,
	) -> SpendTable {
		SpendTable(MultiMap::new(
			head,
			anchor_body,
			cell_head,
			cell_body,
			schema::SPEND_CELL_SIZE,
		))
	}

	/// Allocate `count` contiguous unlinked cells.
	pub fn allocate(&self, count: usize) -> Result<SpendLink, Error> {
		self.0.allocate(count)
	}

	/// Write a cell in place (not yet observable).
	pub fn set(&self, link: SpendLink, cell: &SpendCell) -> Result<(), Error> {
		let mut buf = [0u8; schema::SPEND_CELL_SIZE];
		cell.write(&mut buf);
		self.0.cell_mut(link)?.copy_from_slice(&buf);
		Ok(())
	}

	/// Read a cell.
	pub fn get(&self, link: SpendLink) -> Result<SpendCell, Error> {
		Ok(SpendCell::read(&self.0.cell(link)?))
	}

	/// Link a written cell under its fingerprint; the observability
	/// step for the spend.
	pub fn commit(&self, link: SpendLink) -> Result<(), Error> {
		let key = self.get(link)?.fingerprint();
		self.0.link(&key, link)
	}

	/// All spends of the fingerprinted prevout, most recent first.
	pub fn spenders(&self, point: PointLink, index: u32) -> Result<Vec<SpendLink>, Error> {
		Ok(self.0.find(&fingerprint(point, index))?.collect())
	}
}

/// Txs archive: slab hash map binding a header to its tx links.
pub struct TxsTable(pub HashSlabMap<5, 3>);

impl TxsTable {
	/// Bind the head and body files.
	pub fn new(head: Head<5>, body: FileMap) -> TxsTable {
		TxsTable(HashSlabMap::new(head, body))
	}

	fn key(header: HeaderLink) -> [u8; 3] {
		let mut key = [0u8; 3];
		header.write_to(&mut key);
		key
	}

	/// True if the header is associated.
	pub fn contains(&self, header: HeaderLink) -> Result<bool, Error> {
		self.0.contains(&Self::key(header))
	}

	/// Bind a header to its txs; the observability step for a block.
	pub fn put(
		&self,
		header: HeaderLink,
		wire_size: u32,
		links: &[TxLink],
	) -> Result<TxsLink, Error> {
		let mut payload = vec![0u8; 7 + links.len() * 4];
		write_u24(&mut payload[0..3], links.len() as u32);
		LittleEndian::write_u32(&mut payload[3..7], wire_size);
		for (index, link) in links.iter().enumerate() {
			link.write_to(&mut payload[7 + index * 4..11 + index * 4]);
		}
		self.0.put(&Self::key(header), &payload)
	}

	/// The wire size and tx links bound to a header.
	pub fn get(&self, header: HeaderLink) -> Result<Option<(u32, Vec<TxLink>)>, Error> {
		let link = self.0.find_link(&Self::key(header))?;
		if link.is_terminal() {
			return Ok(None);
		}
		let payload = self.0.payload(link)?;
		if payload.len() < 7 {
			return Err(Error::Integrity);
		}
		let count = read_u24(&payload[0..3]) as usize;
		let wire_size = LittleEndian::read_u32(&payload[3..7]);
		if payload.len() < 7 + count * 4 {
			return Err(Error::Integrity);
		}
		let links = (0..count)
			.map(|index| TxLink::from_slice(&payload[7 + index * 4..11 + index * 4]))
			.collect();
		Ok(Some((wire_size, links)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_record_round_trip() {
		let record = HeaderRecord {
			flags: 0x0102_0304,
			height: 812_345,
			mtp: 1_700_000_000,
			milestone: true,
			parent: HeaderLink::new(41),
			version: 0x2000_0000,
			time: 1_700_000_600,
			bits: 0x1703_abcd,
			nonce: 0xdead_beef,
			merkle_root: [7u8; 32],
		};
		let mut buf = [0u8; schema::HEADER_VALUE_SIZE];
		record.write(&mut buf);
		assert_eq!(HeaderRecord::read(&buf), record);
	}

	#[test]
	fn tx_record_round_trip() {
		let record = TxRecord {
			coinbase: false,
			light: 225,
			heavy: 373,
			version: 2,
			locktime: 0,
			ins: 2,
			outs: 3,
			ins_fk: SpendLink::new(17),
			outs_fk: PutsLink::new(93),
		};
		let mut buf = [0u8; schema::TX_VALUE_SIZE];
		record.write(&mut buf);
		assert_eq!(TxRecord::read(&buf), record);
	}

	#[test]
	fn spend_cell_null_index_round_trip() {
		let cell = SpendCell {
			point: PointLink::new(3),
			index: u32::max_value(),
			parent: TxLink::new(9),
			sequence: 0xffff_ffff,
			input: InputLink::new(1000),
		};
		let mut buf = [0u8; schema::SPEND_CELL_SIZE];
		cell.write(&mut buf);
		let read = SpendCell::read(&buf);
		assert_eq!(read, cell);
		assert_eq!(read.fingerprint(), fingerprint(cell.point, cell.index));
	}
}
