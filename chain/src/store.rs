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

//! The store: owner of every table's head/body pair, the lifecycle
//! locks and the transactor. Writers serialize on the transactor's
//! exclusive side; readers share it. Snapshot rotates up to two
//! generations of head backups; restore rebuilds a crashed store
//! from the newest generation and truncates orphan body bytes.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use bedrock_store::{Error, FileMap, Head, ProcessLock, SentinelLock};

use crate::schema::{dir, ext, lock, table};
use crate::settings::Settings;
use crate::tables::{
	AddressTable, DuplicateTable, HeaderTable, HeightTable, InputTable, OutputTable, PointTable,
	PrevoutTable, PutsTable, SpendTable, StrongTxTable, TxTable, TxsTable, ValidatedBkTable,
	ValidatedTxTable,
};
use crate::tables::FilterTable;

/// The fixed family of tables.
pub struct Tables {
	/// Header archive.
	pub header: HeaderTable,
	/// Tx archive.
	pub tx: TxTable,
	/// Point archive.
	pub point: PointTable,
	/// Input archive.
	pub input: InputTable,
	/// Output archive.
	pub output: OutputTable,
	/// Output link-list archive.
	pub puts: PutsTable,
	/// Spend archive.
	pub spend: SpendTable,
	/// Header-to-txs binding.
	pub txs: TxsTable,
	/// Candidate height index.
	pub candidate: HeightTable,
	/// Confirmed height index.
	pub confirmed: HeightTable,
	/// Strong tx index.
	pub strong_tx: StrongTxTable,
	/// Duplicate point set.
	pub duplicate: DuplicateTable,
	/// Prevout cache.
	pub prevout: PrevoutTable,
	/// Block validation cache.
	pub validated_bk: ValidatedBkTable,
	/// Tx validation cache.
	pub validated_tx: ValidatedTxTable,
	/// Address index, present when enabled at create.
	pub address: Option<AddressTable>,
	/// Filter headers, present when enabled at create.
	pub filter_bk: Option<FilterTable>,
	/// Filter bodies, present when enabled at create.
	pub filter_tx: Option<FilterTable>,
}

fn head_file(settings: &Settings, name: &str) -> FileMap {
	let path = settings
		.path
		.join(dir::HEADS)
		.join(format!("{}.{}", name, ext::HEAD));
	FileMap::new(path, 64, settings.expansion)
}

fn body_file(settings: &Settings, name: &str, minimum: usize) -> FileMap {
	let path = settings.path.join(format!("{}.{}", name, ext::DATA));
	FileMap::new(path, minimum, settings.expansion)
}

fn create_head<const L: usize>(
	settings: &Settings,
	name: &str,
	buckets: usize,
) -> Result<Head<L>, Error> {
	Head::create(head_file(settings, name), buckets)
}

fn open_head<const L: usize>(settings: &Settings, name: &str) -> Result<Head<L>, Error> {
	Head::open(head_file(settings, name))
}

fn create_body(settings: &Settings, name: &str, minimum: usize) -> Result<FileMap, Error> {
	let file = body_file(settings, name, minimum);
	file.open().map_err(|_| Error::CreateTable)?;
	file.load()?;
	file.truncate(0)?;
	Ok(file)
}

fn open_body(settings: &Settings, name: &str, minimum: usize) -> Result<FileMap, Error> {
	let file = body_file(settings, name, minimum);
	file.open()?;
	file.load()?;
	Ok(file)
}

impl Tables {
	fn create(s: &Settings) -> Result<Tables, Error> {
		Ok(Tables {
			header: HeaderTable::new(
				create_head(s, table::HEADER, s.header.buckets)?,
				create_body(s, table::HEADER, s.header.minimum)?,
			),
			tx: TxTable::new(
				create_head(s, table::TX, s.tx.buckets)?,
				create_body(s, table::TX, s.tx.minimum)?,
			),
			point: PointTable::new(
				create_head(s, table::POINT, s.point.buckets)?,
				create_body(s, table::POINT, s.point.minimum)?,
			),
			input: InputTable::new(
				create_head(s, table::INPUT, 0)?,
				create_body(s, table::INPUT, s.input.minimum)?,
			),
			output: OutputTable::new(
				create_head(s, table::OUTPUT, 0)?,
				create_body(s, table::OUTPUT, s.output.minimum)?,
			),
			puts: PutsTable::new(
				create_head(s, table::PUTS, 0)?,
				create_body(s, table::PUTS, s.puts.minimum)?,
			),
			spend: SpendTable::new(
				create_head(s, table::SPEND, s.spend.buckets)?,
				create_body(s, table::SPEND, s.spend.minimum)?,
				create_head(s, table::SPEND_CELLS, 0)?,
				create_body(s, table::SPEND_CELLS, s.spend.minimum)?,
			),
			txs: TxsTable::new(
				create_head(s, table::TXS, s.txs.buckets)?,
				create_body(s, table::TXS, s.txs.minimum)?,
			),
			candidate: HeightTable::new(
				create_head(s, table::CANDIDATE, 0)?,
				create_body(s, table::CANDIDATE, s.candidate.minimum)?,
			),
			confirmed: HeightTable::new(
				create_head(s, table::CONFIRMED, 0)?,
				create_body(s, table::CONFIRMED, s.confirmed.minimum)?,
			),
			strong_tx: StrongTxTable::new(
				create_head(s, table::STRONG_TX, s.strong_tx.buckets)?,
				create_body(s, table::STRONG_TX, s.strong_tx.minimum)?,
			),
			duplicate: DuplicateTable::new(
				create_head(s, table::DUPLICATE, s.duplicate.buckets)?,
				create_body(s, table::DUPLICATE, s.duplicate.minimum)?,
			),
			prevout: PrevoutTable::new(
				create_head(s, table::PREVOUT, 0)?,
				create_body(s, table::PREVOUT, s.prevout.minimum)?,
			),
			validated_bk: ValidatedBkTable::new(
				create_head(s, table::VALIDATED_BK, s.validated_bk.buckets)?,
				create_body(s, table::VALIDATED_BK, s.validated_bk.minimum)?,
			),
			validated_tx: ValidatedTxTable::new(
				create_head(s, table::VALIDATED_TX, s.validated_tx.buckets)?,
				create_body(s, table::VALIDATED_TX, s.validated_tx.minimum)?,
			),
			address: if s.address_enabled {
				Some(AddressTable::new(
					create_head(s, table::ADDRESS, s.address.buckets)?,
					create_body(s, table::ADDRESS, s.address.minimum)?,
					create_head(s, table::ADDRESS_CELLS, 0)?,
					create_body(s, table::ADDRESS_CELLS, s.address.minimum)?,
				))
			} else {
				None
			},
			filter_bk: if s.filter_enabled {
				Some(FilterTable::new(
					create_head(s, table::FILTER_BK, s.filter_bk.buckets)?,
					create_body(s, table::FILTER_BK, s.filter_bk.minimum)?,
				))
			} else {
				None
			},
			filter_tx: if s.filter_enabled {
				Some(FilterTable::new(
					create_head(s, table::FILTER_TX, s.filter_tx.buckets)?,
					create_body(s, table::FILTER_TX, s.filter_tx.minimum)?,
				))
			} else {
				None
			},
		})
	}

	fn open(s: &Settings) -> Result<Tables, Error> {
		Ok(Tables {
			header: HeaderTable::new(
				open_head(s, table::HEADER)?,
				open_body(s, table::HEADER, s.header.minimum)?,
			),
			tx: TxTable::new(
				open_head(s, table::TX)?,
				open_body(s, table::TX, s.tx.minimum)?,
			),
			point: PointTable::new(
				open_head(s, table::POINT)?,
				open_body(s, table::POINT, s.point.minimum)?,
			),
			input: InputTable::new(
				open_head(s, table::INPUT)?,
				open_body(s, table::INPUT, s.input.minimum)?,
			),
			output: OutputTable::new(
				open_head(s, table::OUTPUT)?,
				open_body(s, table::OUTPUT, s.output.minimum)?,
			),
			puts: PutsTable::new(
				open_head(s, table::PUTS)?,
				open_body(s, table::PUTS, s.puts.minimum)?,
			),
			spend: SpendTable::new(
				open_head(s, table::SPEND)?,
				open_body(s, table::SPEND, s.spend.minimum)?,
				open_head(s, table::SPEND_CELLS)?,
				open_body(s, table::SPEND_CELLS, s.spend.minimum)?,
			),
			txs: TxsTable::new(
				open_head(s, table::TXS)?,
				open_body(s, table::TXS, s.txs.minimum)?,
			),
			candidate: HeightTable::new(
				open_head(s, table::CANDIDATE)?,
				open_body(s, table::CANDIDATE, s.candidate.minimum)?,
			),
			confirmed: HeightTable::new(
				open_head(s, table::CONFIRMED)?,
				open_body(s, table::CONFIRMED, s.confirmed.minimum)?,
			),
			strong_tx: StrongTxTable::new(
				open_head(s, table::STRONG_TX)?,
				open_body(s, table::STRONG_TX, s.strong_tx.minimum)?,
			),
			duplicate: DuplicateTable::new(
				open_head(s, table::DUPLICATE)?,
				open_body(s, table::DUPLICATE, s.duplicate.minimum)?,
			),
			prevout: PrevoutTable::new(
				open_head(s, table::PREVOUT)?,
				open_body(s, table::PREVOUT, s.prevout.minimum)?,
			),
			validated_bk: ValidatedBkTable::new(
				open_head(s, table::VALIDATED_BK)?,
				open_body(s, table::VALIDATED_BK, s.validated_bk.minimum)?,
			),
			validated_tx: ValidatedTxTable::new(
				open_head(s, table::VALIDATED_TX)?,
				open_body(s, table::VALIDATED_TX, s.validated_tx.minimum)?,
			),
			address: if s.address_enabled {
				Some(AddressTable::new(
					open_head(s, table::ADDRESS)?,
					open_body(s, table::ADDRESS, s.address.minimum)?,
					open_head(s, table::ADDRESS_CELLS)?,
					open_body(s, table::ADDRESS_CELLS, s.address.minimum)?,
				))
			} else {
				None
			},
			filter_bk: if s.filter_enabled {
				Some(FilterTable::new(
					open_head(s, table::FILTER_BK)?,
					open_body(s, table::FILTER_BK, s.filter_bk.minimum)?,
				))
			} else {
				None
			},
			filter_tx: if s.filter_enabled {
				Some(FilterTable::new(
					open_head(s, table::FILTER_TX)?,
					open_body(s, table::FILTER_TX, s.filter_tx.minimum)?,
				))
			} else {
				None
			},
		})
	}

	/// Record body extents and flush every file.
	pub fn flush(&self) -> Result<(), Error> {
		self.header.0.flush()?;
		self.tx.0.flush()?;
		self.point.0.flush()?;
		self.input.0.flush()?;
		self.output.0.flush()?;
		self.puts.0.flush()?;
		self.spend.0.flush()?;
		self.txs.0.flush()?;
		self.candidate.0.flush()?;
		self.confirmed.0.flush()?;
		self.strong_tx.0.flush()?;
		self.duplicate.0.flush()?;
		self.prevout.0.flush()?;
		self.validated_bk.0.flush()?;
		self.validated_tx.0.flush()?;
		if let Some(address) = &self.address {
			address.0.flush()?;
		}
		if let Some(filter_bk) = &self.filter_bk {
			filter_bk.0.flush()?;
		}
		if let Some(filter_tx) = &self.filter_tx {
			filter_tx.0.flush()?;
		}
		Ok(())
	}

	/// True if any body carries bytes beyond its head record.
	pub fn verify(&self) -> Result<bool, Error> {
		let mut dirty = false;
		dirty |= self.header.0.verify_body()?;
		dirty |= self.tx.0.verify_body()?;
		dirty |= self.point.0.verify_body()?;
		dirty |= self.input.0.verify_body()?;
		dirty |= self.output.0.verify_body()?;
		dirty |= self.puts.0.verify_body()?;
		dirty |= self.spend.0.verify_body()?;
		dirty |= self.txs.0.verify_body()?;
		dirty |= self.candidate.0.verify_body()?;
		dirty |= self.confirmed.0.verify_body()?;
		dirty |= self.strong_tx.0.verify_body()?;
		dirty |= self.duplicate.0.verify_body()?;
		dirty |= self.prevout.0.verify_body()?;
		dirty |= self.validated_bk.0.verify_body()?;
		dirty |= self.validated_tx.0.verify_body()?;
		if let Some(address) = &self.address {
			dirty |= address.0.verify_body()?;
		}
		if let Some(filter_bk) = &self.filter_bk {
			dirty |= filter_bk.0.verify_body()?;
		}
		if let Some(filter_tx) = &self.filter_tx {
			dirty |= filter_tx.0.verify_body()?;
		}
		Ok(dirty)
	}

	/// Truncate every body back to its head-recorded extent.
	pub fn restore(&self) -> Result<(), Error> {
		self.header.0.restore_body()?;
		self.tx.0.restore_body()?;
		self.point.0.restore_body()?;
		self.input.0.restore_body()?;
		self.output.0.restore_body()?;
		self.puts.0.restore_body()?;
		self.spend.0.restore_body()?;
		self.txs.0.restore_body()?;
		self.candidate.0.restore_body()?;
		self.confirmed.0.restore_body()?;
		self.strong_tx.0.restore_body()?;
		self.duplicate.0.restore_body()?;
		self.prevout.0.restore_body()?;
		self.validated_bk.0.restore_body()?;
		self.validated_tx.0.restore_body()?;
		if let Some(address) = &self.address {
			address.0.restore_body()?;
		}
		if let Some(filter_bk) = &self.filter_bk {
			filter_bk.0.restore_body()?;
		}
		if let Some(filter_tx) = &self.filter_tx {
			filter_tx.0.restore_body()?;
		}
		Ok(())
	}

	/// Every file of the store, for lifecycle sweeps.
	pub fn files(&self) -> Vec<&FileMap> {
		let mut files = vec![
			self.header.0.head().file(),
			self.header.0.body().file(),
			self.tx.0.head().file(),
			self.tx.0.body().file(),
			self.point.0.head().file(),
			self.point.0.body().file(),
			self.txs.0.head().file(),
			self.txs.0.body().file(),
			self.spend.0.anchors().head().file(),
			self.spend.0.anchors().body().file(),
			self.spend.0.cell_head().file(),
			self.spend.0.cells().file(),
			self.candidate.0.head().file(),
			self.candidate.0.body().file(),
			self.confirmed.0.head().file(),
			self.confirmed.0.body().file(),
			self.strong_tx.0.head().file(),
			self.strong_tx.0.body().file(),
			self.duplicate.0.head().file(),
			self.duplicate.0.body().file(),
			self.prevout.0.head().file(),
			self.prevout.0.body().file(),
			self.validated_bk.0.head().file(),
			self.validated_bk.0.body().file(),
			self.validated_tx.0.head().file(),
			self.validated_tx.0.body().file(),
		];
		files.extend(self.input.0.files());
		files.extend(self.output.0.files());
		files.extend(self.puts.0.files());
		if let Some(address) = &self.address {
			files.push(address.0.anchors().head().file());
			files.push(address.0.anchors().body().file());
			files.push(address.0.cell_head().file());
			files.push(address.0.cells().file());
		}
		if let Some(filter_bk) = &self.filter_bk {
			files.push(filter_bk.0.head().file());
			files.push(filter_bk.0.body().file());
		}
		if let Some(filter_tx) = &self.filter_tx {
			files.push(filter_tx.0.head().file());
			files.push(filter_tx.0.body().file());
		}
		files
	}
}

/// The storage seam the query layer consumes; concrete stores plug
/// in by implementing it.
pub trait Storage: Send + Sync {
	/// The table family.
	fn tables(&self) -> &Tables;
	/// The create-time configuration.
	fn settings(&self) -> &Settings;
	/// True if open found body bytes beyond the head records.
	fn is_dirty(&self) -> bool;
	/// Shared transactor token for reads.
	fn begin_read(&self) -> RwLockReadGuard<'_, ()>;
	/// Exclusive transactor scope for one logical write.
	fn begin_write(&self) -> RwLockWriteGuard<'_, ()>;
}

/// The concrete store.
pub struct Store {
	settings: Settings,
	tables: Tables,
	transactor: RwLock<()>,
	dirty: bool,
	flush_lock: Option<SentinelLock>,
	// Held for the life of the store.
	#[allow(dead_code)]
	process_lock: ProcessLock,
}

impl Store {
	fn heads_path(settings: &Settings) -> PathBuf {
		settings.path.join(dir::HEADS)
	}

	fn locks(settings: &Settings) -> Result<(ProcessLock, PathBuf), Error> {
		let process_lock = ProcessLock::acquire(settings.path.join(lock::PROCESS))?;
		Ok((process_lock, settings.path.join(lock::FLUSH)))
	}

	/// Create a fresh store under the settings path.
	pub fn create(settings: Settings) -> Result<Store, Error> {
		fs::create_dir_all(&settings.path).map_err(|_| Error::MissingDirectory)?;
		let (process_lock, flush_path) = Self::locks(&settings)?;
		let flush_lock = SentinelLock::acquire(&flush_path)?;

		let heads = Self::heads_path(&settings);
		if heads.exists() {
			fs::remove_dir_all(&heads).map_err(|_| Error::ClearDirectory)?;
		}
		fs::create_dir_all(&heads).map_err(|_| Error::ClearDirectory)?;

		let tables = Tables::create(&settings)?;
		info!("store created at {:?}", settings.path);
		Ok(Store {
			settings,
			tables,
			transactor: RwLock::new(()),
			dirty: false,
			flush_lock: Some(flush_lock),
			process_lock,
		})
	}

	/// Open an existing, cleanly closed store.
	pub fn open(settings: Settings) -> Result<Store, Error> {
		if !settings.path.exists() {
			return Err(Error::MissingDirectory);
		}
		let (process_lock, flush_path) = Self::locks(&settings)?;
		if SentinelLock::exists(&flush_path) {
			// The previous process did not exit cleanly.
			return Err(Error::FlushLock);
		}
		let flush_lock = SentinelLock::acquire(&flush_path)?;

		let tables = Tables::open(&settings)?;
		let dirty = tables.verify()?;
		if dirty {
			warn!("store opened dirty at {:?}", settings.path);
		}
		Ok(Store {
			settings,
			tables,
			transactor: RwLock::new(()),
			dirty,
			flush_lock: Some(flush_lock),
			process_lock,
		})
	}

	/// Restore a crashed store (flush lock present) from the newest
	/// snapshot generation, truncating orphan body bytes.
	pub fn restore(settings: Settings) -> Result<Store, Error> {
		if !settings.path.exists() {
			return Err(Error::MissingDirectory);
		}
		let (process_lock, flush_path) = Self::locks(&settings)?;
		let flush_lock = SentinelLock::adopt(&flush_path)?;

		let heads = Self::heads_path(&settings);
		let _ = fs::remove_dir_all(heads.join(dir::TEMPORARY));

		let primary = heads.join(dir::PRIMARY);
		let secondary = heads.join(dir::SECONDARY);
		let source = if primary.exists() {
			primary
		} else if secondary.exists() {
			secondary
		} else {
			return Err(Error::MissingSnapshot);
		};
		info!("restoring heads from {:?}", source);
		let entries = fs::read_dir(&source).map_err(|_| Error::RestoreTable)?;
		for entry in entries {
			let entry = entry.map_err(|_| Error::RestoreTable)?;
			let path = entry.path();
			if path.extension().and_then(|e| e.to_str()) == Some(ext::HEAD) {
				let name = path.file_name().ok_or(Error::RestoreTable)?.to_owned();
				fs::copy(&path, heads.join(name)).map_err(|_| Error::RestoreTable)?;
			}
		}

		let tables = Tables::open(&settings)?;
		tables.restore()?;
		Ok(Store {
			settings,
			tables,
			transactor: RwLock::new(()),
			dirty: false,
			flush_lock: Some(flush_lock),
			process_lock,
		})
	}

	/// Flush every table and rotate the head backups: temporary is
	/// staged, primary becomes secondary, temporary becomes primary.
	pub fn snapshot(&self) -> Result<(), Error> {
		let _guard = self.begin_write();
		info!("snapshot begin");
		self.tables.flush()?;
		self.backup()?;
		info!("snapshot end");
		Ok(())
	}

	fn backup(&self) -> Result<(), Error> {
		let heads = Self::heads_path(&self.settings);
		let temporary = heads.join(dir::TEMPORARY);
		let primary = heads.join(dir::PRIMARY);
		let secondary = heads.join(dir::SECONDARY);

		let _ = fs::remove_dir_all(&temporary);
		fs::create_dir_all(&temporary).map_err(|_| Error::BackupTable)?;
		let entries = fs::read_dir(&heads).map_err(|_| Error::BackupTable)?;
		for entry in entries {
			let entry = entry.map_err(|_| Error::BackupTable)?;
			let path = entry.path();
			if path.extension().and_then(|e| e.to_str()) == Some(ext::HEAD) {
				let name = path.file_name().ok_or(Error::BackupTable)?.to_owned();
				fs::copy(&path, temporary.join(name)).map_err(|_| Error::BackupTable)?;
			}
		}

		if primary.exists() {
			let _ = fs::remove_dir_all(&secondary);
			fs::rename(&primary, &secondary).map_err(|_| Error::RenameDirectory)?;
		}
		fs::rename(&temporary, &primary).map_err(|_| Error::RenameDirectory)?;
		Ok(())
	}

	/// Clear the prevout cache and snapshot. Valid only when the
	/// candidate and confirmed indexes have coalesced.
	pub fn prune(&self) -> Result<(), Error> {
		let _guard = self.begin_write();
		let candidate = &self.tables.candidate;
		let confirmed = &self.tables.confirmed;
		if candidate.count() != confirmed.count() {
			return Err(Error::NotCoalesced);
		}
		let top = candidate.count();
		if top > 0 && candidate.at(top as usize - 1)? != confirmed.at(top as usize - 1)? {
			return Err(Error::NotCoalesced);
		}
		info!("pruning prevout cache");
		self.tables.prevout.clear()?;
		self.tables.flush()?;
		self.backup()
	}

	/// Flush, release the locks and close every file.
	pub fn close(mut self) -> Result<(), Error> {
		{
			let _guard = self.begin_write();
			self.tables.flush()?;
			for file in self.tables.files() {
				file.unload()?;
				file.close()?;
			}
		}
		if let Some(flush_lock) = self.flush_lock.take() {
			flush_lock.release()?;
		}
		Ok(())
	}

	/// First latched fault across the store's files.
	pub fn get_fault(&self) -> Option<Error> {
		self.tables.files().iter().find_map(|file| file.fault())
	}

	/// True if any file is in the disk-full condition.
	pub fn is_full(&self) -> bool {
		self.tables.files().iter().any(|file| file.is_full())
	}

	/// Space required to clear the disk-full condition.
	pub fn get_space(&self) -> usize {
		self.tables.files().iter().map(|file| file.space()).sum()
	}

	/// Clear disk-full conditions so writes may be retried.
	pub fn reload(&self) -> Result<(), Error> {
		let _guard = self.begin_write();
		for file in self.tables.files() {
			if file.is_full() {
				file.reload()?;
			}
		}
		Ok(())
	}
}

impl Storage for Store {
	fn tables(&self) -> &Tables {
		&self.tables
	}

	fn settings(&self) -> &Settings {
		&self.settings
	}

	fn is_dirty(&self) -> bool {
		self.dirty
	}

	fn begin_read(&self) -> RwLockReadGuard<'_, ()> {
		self.transactor.read()
	}

	fn begin_write(&self) -> RwLockWriteGuard<'_, ()> {
		loop {
			match self.transactor.try_write_for(Duration::from_secs(1)) {
				Some(guard) => return guard,
				None => warn!("wait_lock: transactor contended"),
			}
		}
	}
}
