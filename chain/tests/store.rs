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

extern crate bedrock_chain as chain;
extern crate bitcoin;
extern crate env_logger;
extern crate tempfile;

use bitcoin::blockdata::constants::genesis_block;
use bitcoin::Network;

use chain::{Error, Query, Settings, Storage, Store};

fn setup() -> (tempfile::TempDir, Settings) {
	let _ = env_logger::try_init();
	let dir = tempfile::tempdir().unwrap();
	let settings = Settings::with_path(dir.path().join("store"));
	(dir, settings)
}

#[test]
fn create_close_open_round_trip() {
	let (_dir, settings) = setup();
	let genesis = genesis_block(Network::Bitcoin);
	let genesis_hash = genesis.header.block_hash();

	{
		let store = Store::create(settings.clone()).unwrap();
		let query = Query::new(&store);
		query.initialize(&genesis).unwrap();
		assert!(query.is_header(&genesis_hash));
		store.close().unwrap();
	}

	let store = Store::open(settings).unwrap();
	assert!(!store.is_dirty());
	let query = Query::new(&store);
	assert!(query.is_header(&genesis_hash));
	assert!(query.is_initialized());
	assert_eq!(query.get_top_candidate(), 0);
	store.close().unwrap();
}

#[test]
fn open_refuses_a_crashed_store() {
	let (_dir, settings) = setup();
	{
		let store = Store::create(settings.clone()).unwrap();
		let query = Query::new(&store);
		query.initialize(&genesis_block(Network::Bitcoin)).unwrap();
		// Dropped without close: the flush lock remains.
	}
	assert_eq!(Store::open(settings).err(), Some(Error::FlushLock));
}

#[test]
fn restore_requires_a_snapshot_generation() {
	let (_dir, settings) = setup();
	{
		let _store = Store::create(settings.clone()).unwrap();
	}
	assert_eq!(
		Store::restore(settings).err(),
		Some(Error::MissingSnapshot)
	);
}

#[test]
fn snapshot_rotates_two_generations() {
	let (_dir, settings) = setup();
	let store = Store::create(settings.clone()).unwrap();
	let query = Query::new(&store);
	query.initialize(&genesis_block(Network::Bitcoin)).unwrap();

	store.snapshot().unwrap();
	let heads = settings.path.join("heads");
	assert!(heads.join("primary").exists());
	assert!(!heads.join("secondary").exists());

	store.snapshot().unwrap();
	assert!(heads.join("primary").exists());
	assert!(heads.join("secondary").exists());
	assert!(!heads.join("temporary").exists());
	store.close().unwrap();
}

#[test]
fn restore_recovers_snapshotted_writes() {
	let (_dir, settings) = setup();
	let genesis = genesis_block(Network::Bitcoin);
	let genesis_hash = genesis.header.block_hash();

	{
		let store = Store::create(settings.clone()).unwrap();
		let query = Query::new(&store);
		query.initialize(&genesis).unwrap();
		store.snapshot().unwrap();
		// Crash: dropped without close.
	}

	let store = Store::restore(settings).unwrap();
	let query = Query::new(&store);
	assert!(query.is_header(&genesis_hash));
	assert_eq!(query.get_top_candidate(), 0);
	assert_eq!(query.get_top_confirmed(), 0);
	store.close().unwrap();
}

#[test]
fn second_process_is_locked_out() {
	let (_dir, settings) = setup();
	let store = Store::create(settings.clone()).unwrap();
	assert_eq!(Store::open(settings).err(), Some(Error::ProcessLock));
	store.close().unwrap();
}

#[test]
fn prune_requires_coalesced_indexes() {
	let (_dir, settings) = setup();
	let store = Store::create(settings).unwrap();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	let link = query.initialize(&genesis).unwrap();

	// Coalesced at genesis: prune succeeds.
	store.prune().unwrap();

	// A candidate ahead of confirmed is not coalesced.
	query.push_candidate(link).unwrap();
	assert_eq!(store.prune().unwrap_err(), Error::NotCoalesced);
	store.close().unwrap();
}
