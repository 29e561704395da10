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

extern crate bedrock_store as store;
extern crate env_logger;
extern crate tempfile;

use store::{Error, FileMap};

fn setup() -> tempfile::TempDir {
	let _ = env_logger::try_init();
	tempfile::tempdir().unwrap()
}

#[test]
fn allocations_survive_reopen() {
	let dir = setup();
	let path = dir.path().join("body.data");
	{
		let file = FileMap::new(&path, 16, 50);
		file.open().unwrap();
		file.load().unwrap();

		let offset = file.allocate(8).unwrap();
		assert_eq!(offset, 0);
		file.write_span(0, 8).unwrap().copy_from_slice(b"8 bytes!");

		// Growth past the minimum capacity remaps transparently.
		let offset = file.allocate(64).unwrap();
		assert_eq!(offset, 8);
		assert_eq!(file.size(), 72);
		assert!(file.capacity() >= 72);

		file.flush().unwrap();
		file.unload().unwrap();
		file.close().unwrap();
	}
	{
		let file = FileMap::new(&path, 16, 50);
		file.open().unwrap();
		file.load().unwrap();
		assert_eq!(file.size(), 72);
		assert_eq!(&file.read_span(0, 8).unwrap()[..], b"8 bytes!");
	}
}

#[test]
fn views_are_bounded_by_logical_size() {
	let dir = setup();
	let file = FileMap::new(dir.path().join("body.data"), 64, 50);
	file.open().unwrap();
	file.load().unwrap();
	file.allocate(10).unwrap();

	// Open-ended views stop at the logical size, not the capacity.
	assert_eq!(file.read(4).unwrap().len(), 6);
	assert_eq!(file.read(10).unwrap().len(), 0);
	assert_eq!(file.read(11).unwrap_err(), Error::Integrity);
	assert_eq!(file.read_span(8, 4).unwrap_err(), Error::Integrity);
}

#[test]
fn truncate_discards_the_tail() {
	let dir = setup();
	let file = FileMap::new(dir.path().join("body.data"), 16, 50);
	file.open().unwrap();
	file.load().unwrap();
	file.allocate(32).unwrap();
	file.set(0, 32, 0xab).unwrap();

	file.truncate(8).unwrap();
	assert_eq!(file.size(), 8);
	assert_eq!(&file.read(0).unwrap()[..], &[0xab; 8][..]);
	assert_eq!(file.truncate(9).unwrap_err(), Error::Integrity);
}

#[test]
fn lifecycle_misuse_is_coded() {
	let dir = setup();
	let file = FileMap::new(dir.path().join("body.data"), 16, 50);

	assert_eq!(file.flush().unwrap_err(), Error::FlushUnloaded);
	file.open().unwrap();
	assert_eq!(file.open().unwrap_err(), Error::OpenOpen);
	file.load().unwrap();
	assert_eq!(file.load().unwrap_err(), Error::LoadLoaded);
	assert_eq!(file.close().unwrap_err(), Error::CloseLoaded);
	file.unload().unwrap();
	file.close().unwrap();
}

#[test]
fn set_zero_fills_any_region() {
	let dir = setup();
	let file = FileMap::new(dir.path().join("head.data"), 16, 50);
	file.open().unwrap();
	file.load().unwrap();

	file.set(0, 4, 0x00).unwrap();
	file.set(4, 12, 0xff).unwrap();
	assert_eq!(file.size(), 16);
	assert_eq!(&file.read_span(0, 4).unwrap()[..], &[0u8; 4][..]);
	assert_eq!(&file.read_span(4, 12).unwrap()[..], &[0xffu8; 12][..]);
}
