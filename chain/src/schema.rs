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

//! The fixed table schema: link widths, record sizes, file names and
//! persisted state codes. All widths are byte counts; all on-disk
//! integers are little-endian. Link widths and record sizes are fixed
//! here at compile time; body growth never changes them.

use bedrock_store::Link;

/// Surrogate key of a header record.
pub type HeaderLink = Link<3>;
/// Surrogate key of a tx record.
pub type TxLink = Link<4>;
/// Surrogate key of a point record.
pub type PointLink = Link<4>;
/// Surrogate key of a spend cell.
pub type SpendLink = Link<4>;
/// Surrogate key of an input slab.
pub type InputLink = Link<5>;
/// Surrogate key of an output slab.
pub type OutputLink = Link<5>;
/// Surrogate key into the puts link-list slab.
pub type PutsLink = Link<5>;
/// Surrogate key of a txs slab.
pub type TxsLink = Link<5>;
/// Surrogate key of a validated-block slab.
pub type ValidatedBkLink = Link<3>;
/// Surrogate key of a validated-tx slab.
pub type ValidatedTxLink = Link<5>;
/// Surrogate key of a filter slab.
pub type FilterLink = Link<5>;
/// Surrogate key of an address cell.
pub type AddressLink = Link<5>;
/// Surrogate key of a prevout cache slab.
pub type PrevoutLink = Link<5>;
/// Surrogate key of a strong-tx record.
pub type StrongLink = Link<4>;
/// Surrogate key of a duplicate record.
pub type DuplicateLink = Link<4>;

/// Natural keys are 32-byte hashes.
pub const HASH_SIZE: usize = 32;
/// The spend/duplicate fingerprint: point stub (4) and index (3).
pub const FINGERPRINT_SIZE: usize = 7;

/// Header record value: flags, height, mtp, milestone, parent,
/// version, time, bits, nonce, merkle root.
pub const HEADER_VALUE_SIZE: usize = 4 + 3 + 4 + 1 + 3 + 4 + 4 + 4 + 4 + 32;
/// Tx record value: coinbase, light, heavy, version, locktime, ins,
/// outs, first spend, outs puts.
pub const TX_VALUE_SIZE: usize = 1 + 3 + 3 + 4 + 4 + 3 + 3 + 4 + 5;
/// Point record value is empty; presence asserts the hash.
pub const POINT_VALUE_SIZE: usize = 0;
/// Spend cell: point, index, parent tx, sequence, input.
pub const SPEND_CELL_SIZE: usize = 4 + 3 + 4 + 4 + 5;
/// Strong record value: header and sign bit.
pub const STRONG_VALUE_SIZE: usize = 3 + 1;
/// Duplicate record value is empty; presence marks a twin point.
pub const DUPLICATE_VALUE_SIZE: usize = 0;
/// Address cell: one output link.
pub const ADDRESS_CELL_SIZE: usize = 5;

/// Store directory names.
pub mod dir {
	/// Table heads and snapshot generations.
	pub const HEADS: &str = "heads";
	/// Most recent head snapshot.
	pub const PRIMARY: &str = "primary";
	/// Previous head snapshot.
	pub const SECONDARY: &str = "secondary";
	/// In-flight snapshot staging.
	pub const TEMPORARY: &str = "temporary";
}

/// Table file stem names.
pub mod table {
	/// Header archive.
	pub const HEADER: &str = "archive_header";
	/// Tx archive.
	pub const TX: &str = "archive_tx";
	/// Point archive.
	pub const POINT: &str = "archive_point";
	/// Input archive.
	pub const INPUT: &str = "archive_input";
	/// Output archive.
	pub const OUTPUT: &str = "archive_output";
	/// Output link-list archive.
	pub const PUTS: &str = "archive_puts";
	/// Spend anchor archive.
	pub const SPEND: &str = "archive_spend";
	/// Spend cell archive.
	pub const SPEND_CELLS: &str = "archive_spend_cells";
	/// Header-to-txs binding.
	pub const TXS: &str = "archive_txs";
	/// Candidate height index.
	pub const CANDIDATE: &str = "candidate";
	/// Confirmed height index.
	pub const CONFIRMED: &str = "confirmed";
	/// Strong tx index.
	pub const STRONG_TX: &str = "strong_tx";
	/// Duplicate point set.
	pub const DUPLICATE: &str = "duplicate";
	/// Prevout cache.
	pub const PREVOUT: &str = "prevout";
	/// Block validation cache.
	pub const VALIDATED_BK: &str = "validated_bk";
	/// Tx validation cache.
	pub const VALIDATED_TX: &str = "validated_tx";
	/// Address anchor index (optional).
	pub const ADDRESS: &str = "address";
	/// Address cell index (optional).
	pub const ADDRESS_CELLS: &str = "address_cells";
	/// Per-header filter headers (optional).
	pub const FILTER_BK: &str = "filter_bk";
	/// Per-header filter bodies (optional).
	pub const FILTER_TX: &str = "filter_tx";
}

/// File extensions.
pub mod ext {
	/// Head file extension.
	pub const HEAD: &str = "head";
	/// Body file extension.
	pub const DATA: &str = "data";
}

/// Lifecycle lock file names.
pub mod lock {
	/// Present while the store is open; detects unclean shutdown.
	pub const FLUSH: &str = "flush.lock";
	/// Held exclusively by the owning process.
	pub const PROCESS: &str = "process.lock";
}

/// Persisted block validation states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
	/// Validated and eligible to extend the confirmed chain.
	Confirmable = 0,
	/// Validated but not yet confirmable (transitional).
	Valid = 1,
	/// Validated and rejected (final).
	Unconfirmable = 2,
}

impl BlockState {
	/// Decode a persisted state byte.
	pub fn from_u8(value: u8) -> Option<BlockState> {
		match value {
			0 => Some(BlockState::Confirmable),
			1 => Some(BlockState::Valid),
			2 => Some(BlockState::Unconfirmable),
			_ => None,
		}
	}
}

/// Persisted tx validation states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxState {
	/// Inputs connected under some context.
	Connected = 0,
	/// Disconnected under some context (final).
	Disconnected = 1,
}

impl TxState {
	/// Decode a persisted state byte.
	pub fn from_u8(value: u8) -> Option<TxState> {
		match value {
			0 => Some(TxState::Connected),
			1 => Some(TxState::Disconnected),
			_ => None,
		}
	}
}

/// The index value stored for a null (coinbase) point. Point indexes
/// are three bytes on disk; the all-ones value maps to the u32 null
/// index on read.
pub const NULL_INDEX: u32 = 0x00ff_ffff;

/// Encode an output index into its three-byte representation.
pub fn to_index(index: u32) -> u32 {
	if index == u32::max_value() {
		NULL_INDEX
	} else {
		index
	}
}

/// Decode a three-byte output index.
pub fn from_index(index: u32) -> u32 {
	if index == NULL_INDEX {
		u32::max_value()
	} else {
		index
	}
}
