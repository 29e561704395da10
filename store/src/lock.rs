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

//! Lifecycle lock files. The process lock is an OS advisory lock
//! held for the life of the owning process; the flush lock is a
//! sentinel whose presence across a restart means the previous
//! process did not exit cleanly.

use std::fs::{self, File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// An exclusive advisory lock on a file, released on drop. A stale
/// lock file from a crashed process does not block reacquisition.
pub struct ProcessLock {
	file: File,
}

impl ProcessLock {
	/// Acquire the lock, failing if another process holds it.
	pub fn acquire<P: AsRef<Path>>(path: P) -> Result<ProcessLock, Error> {
		let file = OpenOptions::new()
			.write(true)
			.create(true)
			.open(path)
			.map_err(|_| Error::ProcessLock)?;
		let taken = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
		if taken != 0 {
			return Err(Error::ProcessLock);
		}
		Ok(ProcessLock { file })
	}
}

impl Drop for ProcessLock {
	fn drop(&mut self) {
		unsafe {
			libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
		}
	}
}

/// The flush sentinel. It is created at open, held while the store
/// is live, and removed only by a clean close; dropping the token
/// without `release` leaves the file behind, which is how a crash
/// is detected on the next open.
#[derive(Debug)]
pub struct SentinelLock {
	path: PathBuf,
}

impl SentinelLock {
	/// True if the sentinel file exists.
	pub fn exists<P: AsRef<Path>>(path: P) -> bool {
		path.as_ref().exists()
	}

	/// Create the sentinel; fails if it already exists (the store
	/// was not closed cleanly and must be restored).
	pub fn acquire<P: AsRef<Path>>(path: P) -> Result<SentinelLock, Error> {
		OpenOptions::new()
			.write(true)
			.create_new(true)
			.open(path.as_ref())
			.map_err(|_| Error::FlushLock)?;
		Ok(SentinelLock {
			path: path.as_ref().to_path_buf(),
		})
	}

	/// Adopt an existing sentinel (the restore path).
	pub fn adopt<P: AsRef<Path>>(path: P) -> Result<SentinelLock, Error> {
		if !Self::exists(path.as_ref()) {
			return Err(Error::FlushLock);
		}
		Ok(SentinelLock {
			path: path.as_ref().to_path_buf(),
		})
	}

	/// Remove the sentinel, marking a clean close.
	pub fn release(self) -> Result<(), Error> {
		fs::remove_file(&self.path).map_err(|_| Error::FlushUnlock)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sentinel_survives_drop_but_not_release() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("flush.lock");

		let lock = SentinelLock::acquire(&path).unwrap();
		assert!(SentinelLock::exists(&path));
		assert_eq!(
			SentinelLock::acquire(&path).unwrap_err(),
			Error::FlushLock
		);
		drop(lock);

		// Dropped without release: the crash marker remains.
		assert!(SentinelLock::exists(&path));
		let adopted = SentinelLock::adopt(&path).unwrap();
		adopted.release().unwrap();
		assert!(!SentinelLock::exists(&path));
	}

	#[test]
	fn process_lock_is_exclusive_and_reacquirable() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("process.lock");

		let lock = ProcessLock::acquire(&path).unwrap();
		drop(lock);
		// A stale file does not block reacquisition.
		assert!(path.exists());
		ProcessLock::acquire(&path).unwrap();
	}
}
