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

//! The process-wide error enumeration. Every fallible operation in the
//! store substrate and the chain layers above it resolves to one of
//! these codes, so results are directly comparable with `==` across
//! crate boundaries.

/// All failure codes of the archive engine, one flat enumeration.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Fail)]
pub enum Error {
	// File lifecycle.
	/// Attempt to reopen a file that is already open.
	#[fail(display = "file is already open")]
	OpenOpen,
	/// The file size could not be obtained.
	#[fail(display = "file size failed")]
	SizeFailure,
	/// Attempt to close a file that is still loaded.
	#[fail(display = "cannot close a loaded file")]
	CloseLoaded,
	/// Attempt to load a file that is already loaded.
	#[fail(display = "file is already loaded")]
	LoadLoaded,
	/// Load blocked by outstanding accessors.
	#[fail(display = "load blocked by outstanding accessors")]
	LoadLocked,
	/// The file could not be opened or read.
	#[fail(display = "file load failed")]
	LoadFailure,
	/// Attempt to reload a file that is not loaded.
	#[fail(display = "cannot reload an unloaded file")]
	ReloadUnloaded,
	/// Reload blocked by outstanding accessors.
	#[fail(display = "reload blocked by outstanding accessors")]
	ReloadLocked,
	/// Attempt to flush a file that is not loaded.
	#[fail(display = "cannot flush an unloaded file")]
	FlushUnloaded,
	/// The flush (msync/fsync) failed.
	#[fail(display = "file flush failed")]
	FlushFailure,
	/// Unload blocked by outstanding accessors.
	#[fail(display = "unload blocked by outstanding accessors")]
	UnloadLocked,
	/// The unmap-and-trim failed.
	#[fail(display = "file unload failed")]
	UnloadFailure,
	/// The disk is full; retry after reload.
	#[fail(display = "disk full")]
	DiskFull,
	/// Memory mapping failed.
	#[fail(display = "mmap failed")]
	MmapFailure,
	/// Memory remapping failed.
	#[fail(display = "mremap failed")]
	MremapFailure,
	/// Memory unmapping failed.
	#[fail(display = "munmap failed")]
	MunmapFailure,
	/// Mapping advice failed.
	#[fail(display = "madvise failed")]
	MadviseFailure,
	/// File truncation failed.
	#[fail(display = "ftruncate failed")]
	FtruncateFailure,
	/// File synchronization failed.
	#[fail(display = "fsync failed")]
	FsyncFailure,
	/// Operation requires a loaded file.
	#[fail(display = "file is not loaded")]
	UnloadedFile,

	// Locks.
	/// The transactor lock could not be acquired.
	#[fail(display = "transactor lock failed")]
	TransactorLock,
	/// The process lock could not be acquired.
	#[fail(display = "process lock failed")]
	ProcessLock,
	/// The flush lock could not be acquired.
	#[fail(display = "flush lock failed")]
	FlushLock,
	/// The flush lock could not be released.
	#[fail(display = "flush unlock failed")]
	FlushUnlock,
	/// The process lock could not be released.
	#[fail(display = "process unlock failed")]
	ProcessUnlock,

	// Storage layout.
	/// The store directory is missing.
	#[fail(display = "missing store directory")]
	MissingDirectory,
	/// The store directory could not be cleared.
	#[fail(display = "clear directory failed")]
	ClearDirectory,
	/// A snapshot directory rename failed.
	#[fail(display = "rename directory failed")]
	RenameDirectory,
	/// Neither a primary nor a secondary snapshot exists.
	#[fail(display = "missing snapshot")]
	MissingSnapshot,
	/// A table could not be created.
	#[fail(display = "create table failed")]
	CreateTable,
	/// A table could not be closed.
	#[fail(display = "close table failed")]
	CloseTable,
	/// A table head could not be backed up.
	#[fail(display = "backup table failed")]
	BackupTable,
	/// A table head could not be restored.
	#[fail(display = "restore table failed")]
	RestoreTable,
	/// A table head failed format verification.
	#[fail(display = "verify table failed")]
	VerifyTable,
	/// Candidate and confirmed indexes have not coalesced.
	#[fail(display = "indexes not coalesced")]
	NotCoalesced,
	/// The prevout table could not be pruned.
	#[fail(display = "prune table failed")]
	PruneTable,

	// Integrity.
	/// An impossible cross-reference was encountered.
	#[fail(display = "store integrity failure")]
	Integrity,
	/// Integrity failure in strong association.
	#[fail(display = "store integrity failure (1)")]
	Integrity1,
	/// Integrity failure in transaction navigation.
	#[fail(display = "store integrity failure (2)")]
	Integrity2,
	/// Integrity failure in point navigation.
	#[fail(display = "store integrity failure (3)")]
	Integrity3,
	/// Integrity failure in spend navigation.
	#[fail(display = "store integrity failure (4)")]
	Integrity4,
	/// Integrity failure writing the prevout cache.
	#[fail(display = "store integrity failure (5)")]
	Integrity5,
	/// Integrity failure reading confirmation context.
	#[fail(display = "store integrity failure (6)")]
	Integrity6,
	/// Integrity failure reading the prevout cache.
	#[fail(display = "store integrity failure (7)")]
	Integrity7,
	/// A validation state code is unrecognized.
	#[fail(display = "unknown validation state")]
	UnknownState,

	// Consensus surface.
	/// The block's transactions are not associated.
	#[fail(display = "block is unassociated")]
	Unassociated,
	/// The block has not been validated.
	#[fail(display = "block is unvalidated")]
	Unvalidated,
	/// A spent previous output is missing.
	#[fail(display = "missing previous output")]
	MissingPreviousOutput,
	/// A coinbase output is spent before maturity.
	#[fail(display = "immature coinbase spend")]
	CoinbaseMaturity,
	/// A duplicate coinbase has unspent outputs (bip30).
	#[fail(display = "unspent coinbase collision")]
	UnspentCoinbaseCollision,
	/// An input is under relative locktime (bip68).
	#[fail(display = "relative time locked")]
	RelativeTimeLocked,
	/// A spent previous output is not confirmed.
	#[fail(display = "unconfirmed spend")]
	UnconfirmedSpend,
	/// A previous output is spent by a confirmed transaction.
	#[fail(display = "confirmed double spend")]
	ConfirmedDoubleSpend,
	/// The header's parent is not archived and not null.
	#[fail(display = "orphan block")]
	OrphanBlock,
	/// The block is valid (state, not failure).
	#[fail(display = "block valid")]
	BlockValid,
	/// The block is confirmable (state, not failure).
	#[fail(display = "block confirmable")]
	BlockConfirmable,
	/// The block is unconfirmable (state, not failure).
	#[fail(display = "block unconfirmable")]
	BlockUnconfirmable,

	// Archive writes.
	/// The transaction has no inputs or no outputs.
	#[fail(display = "transaction is empty")]
	TxEmpty,
	/// Transaction record allocation failed.
	#[fail(display = "tx allocate failed")]
	TxTxAllocate,
	/// Spend record allocation failed.
	#[fail(display = "tx spend allocate failed")]
	TxSpendAllocate,
	/// Input slab write failed.
	#[fail(display = "tx input put failed")]
	TxInputPut,
	/// Point record allocation failed.
	#[fail(display = "tx point allocate failed")]
	TxPointAllocate,
	/// Point record write failed.
	#[fail(display = "tx point put failed")]
	TxPointPut,
	/// Input link-list allocation failed.
	#[fail(display = "tx ins allocate failed")]
	TxInsAllocate,
	/// Input link-list write failed.
	#[fail(display = "tx ins put failed")]
	TxInsPut,
	/// Output slab write failed.
	#[fail(display = "tx output put failed")]
	TxOutputPut,
	/// Output link-list write failed.
	#[fail(display = "tx puts put failed")]
	TxPutsPut,
	/// Transaction record write failed.
	#[fail(display = "tx record set failed")]
	TxTxSet,
	/// Spend record write failed.
	#[fail(display = "tx spend put failed")]
	TxSpendPut,
	/// Address record allocation failed.
	#[fail(display = "tx address allocate failed")]
	TxAddressAllocate,
	/// Address record write failed.
	#[fail(display = "tx address put failed")]
	TxAddressPut,
	/// Transaction key commit failed.
	#[fail(display = "tx commit failed")]
	TxTxCommit,
	/// Duplicate table write failed.
	#[fail(display = "tx duplicate put failed")]
	TxDuplicatePut,
	/// Spend key commit failed.
	#[fail(display = "tx spend commit failed")]
	TxSpendCommit,
	/// Null point write failed.
	#[fail(display = "tx null point put failed")]
	TxNullPointPut,
	/// Header record write failed.
	#[fail(display = "header put failed")]
	HeaderPut,
	/// Block txs write against a missing header.
	#[fail(display = "txs header missing")]
	TxsHeader,
	/// Block txs write with an empty block.
	#[fail(display = "txs empty block")]
	TxsEmpty,
	/// Strong record write failed during txs confirmation.
	#[fail(display = "txs confirm failed")]
	TxsConfirm,
	/// The txs slab write failed.
	#[fail(display = "txs put failed")]
	TxsTxsPut,
}

impl Error {
	/// True for conditions that latch a file into fail-fast mode.
	/// Disk full is recoverable and is not a fault.
	pub fn is_fault(self) -> bool {
		match self {
			Error::MmapFailure
			| Error::MremapFailure
			| Error::MunmapFailure
			| Error::MadviseFailure
			| Error::FtruncateFailure
			| Error::FsyncFailure
			| Error::FlushFailure => true,
			_ => false,
		}
	}
}
