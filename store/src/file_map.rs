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

//! A growable memory-mapped file with bounded, lock-scoped views.
//!
//! Each table file (head or body) is owned by one `FileMap`. Reads are
//! backed by the map and returned as `Access` tokens holding a shared
//! remap lock; while any token lives the file cannot be remapped,
//! truncated or unloaded. Writes take the exclusive side of the same
//! lock, so growth drains readers before the mapping is replaced.
//!
//! Disk-full during growth is latched and recoverable via `reload`.
//! Any other mapping fault is latched as a first-fault code and every
//! subsequent operation fails fast with it.

use memmap::MmapMut;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::error::Error;

struct Inner {
	file: Option<File>,
	map: Option<MmapMut>,
	logical: usize,
	capacity: usize,
	fault: Option<Error>,
	full: Option<usize>,
}

impl Inner {
	fn faulted(&self) -> Result<(), Error> {
		match self.fault {
			Some(code) => Err(code),
			None => Ok(()),
		}
	}

	fn latch(&mut self, code: Error) -> Error {
		if self.fault.is_none() && code.is_fault() {
			error!("latching first fault: {}", code);
			self.fault = Some(code);
		}
		code
	}

	// Extend capacity to hold at least `required` bytes, remapping.
	// On ENOSPC nothing is altered and the disk-full state is set.
	fn grow(&mut self, required: usize, expansion: usize) -> Result<(), Error> {
		if required <= self.capacity {
			return Ok(());
		}
		let file = self.file.as_ref().ok_or(Error::UnloadedFile)?;
		if self.map.is_none() {
			return Err(Error::UnloadedFile);
		}

		let expanded = self.capacity + (self.capacity / 100) * expansion;
		let target = std::cmp::max(required, expanded);

		if let Err(e) = file.set_len(target as u64) {
			return if e.raw_os_error() == Some(libc::ENOSPC) {
				warn!("disk full growing map to {} bytes", target);
				self.full = Some(target - self.capacity);
				Err(Error::DiskFull)
			} else {
				Err(self.latch(Error::FtruncateFailure))
			};
		}

		// The old mapping remains valid for its range until replaced.
		match unsafe { MmapMut::map_mut(file) } {
			Ok(map) => {
				self.map = Some(map);
				self.capacity = target;
				Ok(())
			}
			Err(_) => Err(self.latch(Error::MremapFailure)),
		}
	}

	// Resize capacity to exactly `capacity` bytes, remapping.
	fn resize(&mut self, capacity: usize) -> Result<(), Error> {
		let file = self.file.as_ref().ok_or(Error::UnloadedFile)?;
		if self.map.is_none() {
			return Err(Error::UnloadedFile);
		}
		if file.set_len(capacity as u64).is_err() {
			return Err(self.latch(Error::FtruncateFailure));
		}
		match unsafe { MmapMut::map_mut(file) } {
			Ok(map) => {
				self.map = Some(map);
				self.capacity = capacity;
				Ok(())
			}
			Err(_) => Err(self.latch(Error::MremapFailure)),
		}
	}
}

/// One file handle and its current memory-mapped view.
pub struct FileMap {
	path: PathBuf,
	minimum: usize,
	expansion: usize,
	inner: RwLock<Inner>,
}

impl FileMap {
	/// Define a file map over the given path. `minimum` is the initial
	/// capacity in bytes and `expansion` the growth rate in percent.
	/// The file is not touched until `open`.
	pub fn new<P: AsRef<Path>>(path: P, minimum: usize, expansion: usize) -> FileMap {
		FileMap {
			path: path.as_ref().to_path_buf(),
			minimum: std::cmp::max(minimum, 1),
			expansion,
			inner: RwLock::new(Inner {
				file: None,
				map: None,
				logical: 0,
				capacity: 0,
				fault: None,
				full: None,
			}),
		}
	}

	/// Path of the underlying file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Open (creating if absent) the file and record its logical size.
	pub fn open(&self) -> Result<(), Error> {
		let mut inner = self.inner.write();
		if inner.file.is_some() {
			return Err(Error::OpenOpen);
		}
		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.open(&self.path)
			.map_err(|_| Error::LoadFailure)?;
		inner.logical = file
			.metadata()
			.map_err(|_| Error::SizeFailure)?
			.len() as usize;
		inner.file = Some(file);
		Ok(())
	}

	/// Close the file. The map must be unloaded first.
	pub fn close(&self) -> Result<(), Error> {
		let mut inner = self.inner.write();
		if inner.map.is_some() {
			return Err(Error::CloseLoaded);
		}
		inner.file = None;
		Ok(())
	}

	/// Map the file into memory at its current capacity.
	pub fn load(&self) -> Result<(), Error> {
		let mut inner = self.inner.try_write().ok_or(Error::LoadLocked)?;
		inner.faulted()?;
		if inner.map.is_some() {
			return Err(Error::LoadLoaded);
		}
		let file = inner.file.as_ref().ok_or(Error::UnloadedFile)?;
		let capacity = std::cmp::max(inner.logical, self.minimum);
		file.set_len(capacity as u64).map_err(|_| Error::LoadFailure)?;
		let map = unsafe { MmapMut::map_mut(file) }.map_err(|_| Error::MmapFailure)?;
		inner.map = Some(map);
		inner.capacity = capacity;
		Ok(())
	}

	/// Flush, unmap and trim the file to its logical size.
	pub fn unload(&self) -> Result<(), Error> {
		let mut inner = self.inner.try_write().ok_or(Error::UnloadLocked)?;
		if let Some(map) = inner.map.take() {
			map.flush().map_err(|_| Error::UnloadFailure)?;
			let logical = inner.logical;
			let file = inner.file.as_ref().ok_or(Error::UnloadedFile)?;
			file.set_len(logical as u64)
				.map_err(|_| Error::UnloadFailure)?;
			inner.capacity = 0;
		}
		Ok(())
	}

	/// Clear the disk-full condition so growth may be retried.
	pub fn reload(&self) -> Result<(), Error> {
		let mut inner = self.inner.try_write().ok_or(Error::ReloadLocked)?;
		if inner.map.is_none() {
			return Err(Error::ReloadUnloaded);
		}
		inner.full = None;
		Ok(())
	}

	/// msync the mapping and fsync the file.
	pub fn flush(&self) -> Result<(), Error> {
		let inner = self.inner.read();
		inner.faulted()?;
		let map = inner.map.as_ref().ok_or(Error::FlushUnloaded)?;
		map.flush().map_err(|_| Error::FlushFailure)?;
		let file = inner.file.as_ref().ok_or(Error::FlushUnloaded)?;
		file.sync_all().map_err(|_| Error::FsyncFailure)?;
		Ok(())
	}

	/// Logical size in bytes.
	pub fn size(&self) -> usize {
		self.inner.read().logical
	}

	/// Mapped capacity in bytes.
	pub fn capacity(&self) -> usize {
		self.inner.read().capacity
	}

	/// First latched fault, if any.
	pub fn fault(&self) -> Option<Error> {
		self.inner.read().fault
	}

	/// True while the disk-full condition is latched.
	pub fn is_full(&self) -> bool {
		self.inner.read().full.is_some()
	}

	/// Bytes required to clear the disk-full condition.
	pub fn space(&self) -> usize {
		self.inner.read().full.unwrap_or(0)
	}

	/// Truncate the logical size (and the file) to `size` bytes.
	pub fn truncate(&self, size: usize) -> Result<(), Error> {
		let mut inner = self.inner.write();
		inner.faulted()?;
		if size > inner.logical {
			return Err(Error::Integrity);
		}
		let capacity = std::cmp::max(size, self.minimum);
		inner.resize(capacity)?;
		inner.logical = size;
		Ok(())
	}

	/// Extend the logical size by `size` bytes, growing capacity
	/// geometrically as needed. Returns the prior logical size, which
	/// is the offset of the allocation.
	pub fn allocate(&self, size: usize) -> Result<usize, Error> {
		let mut inner = self.inner.write();
		inner.faulted()?;
		if inner.full.is_some() {
			return Err(Error::DiskFull);
		}
		let offset = inner.logical;
		let expansion = self.expansion;
		inner.grow(offset + size, expansion)?;
		inner.logical = offset + size;
		Ok(offset)
	}

	/// Ensure capacity for `size` more bytes without changing the
	/// logical size.
	pub fn reserve(&self, size: usize) -> Result<(), Error> {
		let mut inner = self.inner.write();
		inner.faulted()?;
		let required = inner.logical + size;
		let expansion = self.expansion;
		inner.grow(required, expansion)
	}

	/// Fill `[offset, offset + size)` with the given byte, extending
	/// the logical size to cover the region if necessary.
	pub fn set(&self, offset: usize, size: usize, fill: u8) -> Result<(), Error> {
		let mut inner = self.inner.write();
		inner.faulted()?;
		if inner.full.is_some() {
			return Err(Error::DiskFull);
		}
		let expansion = self.expansion;
		inner.grow(offset + size, expansion)?;
		if offset + size > inner.logical {
			inner.logical = offset + size;
		}
		let map = inner.map.as_mut().ok_or(Error::UnloadedFile)?;
		for byte in &mut map[offset..offset + size] {
			*byte = fill;
		}
		Ok(())
	}

	/// A shared view from `offset` to the current logical size.
	pub fn read(&self, offset: usize) -> Result<Access<'_>, Error> {
		let inner = self.inner.read();
		inner.faulted()?;
		if inner.map.is_none() {
			return Err(Error::UnloadedFile);
		}
		if offset > inner.logical {
			return Err(Error::Integrity);
		}
		let end = inner.logical;
		Ok(Access {
			guard: inner,
			start: offset,
			end,
		})
	}

	/// A shared view from `offset` to the mapped capacity, spanning
	/// allocated-but-unwritten space (fixed table heads use this).
	pub fn read_capacity(&self, offset: usize) -> Result<Access<'_>, Error> {
		let inner = self.inner.read();
		inner.faulted()?;
		if inner.map.is_none() {
			return Err(Error::UnloadedFile);
		}
		if offset > inner.capacity {
			return Err(Error::Integrity);
		}
		let end = inner.capacity;
		Ok(Access {
			guard: inner,
			start: offset,
			end,
		})
	}

	/// A shared view of exactly `[offset, offset + size)`.
	pub fn read_span(&self, offset: usize, size: usize) -> Result<Access<'_>, Error> {
		let access = self.read(offset)?;
		if offset + size > access.end {
			return Err(Error::Integrity);
		}
		Ok(Access {
			end: offset + size,
			..access
		})
	}

	/// An exclusive view of exactly `[offset, offset + size)`. The
	/// span must already be allocated.
	pub fn write_span(&self, offset: usize, size: usize) -> Result<AccessMut<'_>, Error> {
		let inner = self.inner.write();
		inner.faulted()?;
		if inner.map.is_none() {
			return Err(Error::UnloadedFile);
		}
		if offset + size > inner.logical {
			return Err(Error::Integrity);
		}
		Ok(AccessMut {
			guard: inner,
			start: offset,
			end: offset + size,
		})
	}
}

/// A bounded shared view into the mapping. Holding one pins the map;
/// callers must not allocate on the same file while one lives.
pub struct Access<'a> {
	guard: RwLockReadGuard<'a, Inner>,
	start: usize,
	end: usize,
}

impl<'a> Access<'a> {
	/// Narrow the view to `size` bytes starting `from` bytes in.
	pub fn narrow(self, from: usize, size: usize) -> Access<'a> {
		debug_assert!(self.start + from + size <= self.end);
		Access {
			start: self.start + from,
			end: self.start + from + size,
			guard: self.guard,
		}
	}

	/// Length of the view in bytes.
	pub fn len(&self) -> usize {
		self.end - self.start
	}

	/// True if the view is empty.
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}
}

impl<'a> Deref for Access<'a> {
	type Target = [u8];

	fn deref(&self) -> &[u8] {
		&self.guard.map.as_ref().expect("mapped")[self.start..self.end]
	}
}

impl<'a> std::fmt::Debug for Access<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Access")
			.field("start", &self.start)
			.field("end", &self.end)
			.finish()
	}
}

/// A bounded exclusive view into the mapping.
pub struct AccessMut<'a> {
	guard: RwLockWriteGuard<'a, Inner>,
	start: usize,
	end: usize,
}

impl<'a> Deref for AccessMut<'a> {
	type Target = [u8];

	fn deref(&self) -> &[u8] {
		&self.guard.map.as_ref().expect("mapped")[self.start..self.end]
	}
}

impl<'a> DerefMut for AccessMut<'a> {
	fn deref_mut(&mut self) -> &mut [u8] {
		&mut self.guard.map.as_mut().expect("mapped")[self.start..self.end]
	}
}

impl<'a> std::fmt::Debug for AccessMut<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccessMut")
			.field("start", &self.start)
			.field("end", &self.end)
			.finish()
	}
}
