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
extern crate rand;
extern crate tempfile;

use rand::{Rng, SeedableRng};
use store::{FileMap, HashRecordMap, HashSlabMap, Head, Link, MultiMap};

fn setup() -> tempfile::TempDir {
	let _ = env_logger::try_init();
	tempfile::tempdir().unwrap()
}

fn body(dir: &tempfile::TempDir, name: &str) -> FileMap {
	let file = FileMap::new(dir.path().join(name), 64, 50);
	file.open().unwrap();
	file.load().unwrap();
	file
}

fn record_map(dir: &tempfile::TempDir, buckets: usize, value: usize) -> HashRecordMap<4, 8> {
	let head = Head::create(FileMap::new(dir.path().join("t.head"), 64, 50), buckets).unwrap();
	HashRecordMap::new(head, body(dir, "t.data"), value)
}

#[test]
fn hashmap_put_and_find_with_collisions() {
	let dir = setup();
	// Two buckets force chains quickly.
	let map = record_map(&dir, 2, 4);

	let mut rng = rand::rngs::StdRng::seed_from_u64(42);
	let mut entries = vec![];
	for index in 0u32..64 {
		let mut key = [0u8; 8];
		rng.fill(&mut key);
		let value = index.to_le_bytes();
		map.put(&key, &value).unwrap();
		entries.push((key, value));
	}

	for (key, value) in &entries {
		let link = map.find_link(key).unwrap();
		assert!(!link.is_terminal());
		assert_eq!(&map.value(link).unwrap()[..], &value[..]);
	}
	assert!(map.find_link(&[0xee; 8]).unwrap().is_terminal());
}

#[test]
fn uncommitted_rows_are_invisible() {
	let dir = setup();
	let map = record_map(&dir, 4, 4);

	let key = [7u8; 8];
	let link = map.allocate(1).unwrap();
	map.value_mut(link).unwrap().copy_from_slice(&[1, 2, 3, 4]);

	// Allocated but not committed: an orphan blob.
	assert!(map.find_link(&key).unwrap().is_terminal());
	assert_eq!(map.records(), 1);

	map.commit(link, &key).unwrap();
	assert_eq!(map.find_link(&key).unwrap(), link);
}

#[test]
fn duplicate_keys_iterate_most_recent_first() {
	let dir = setup();
	let map = record_map(&dir, 4, 4);

	let key = [9u8; 8];
	let first = map.put(&key, &[1, 0, 0, 0]).unwrap();
	let second = map.put(&key, &[2, 0, 0, 0]).unwrap();

	assert_eq!(map.find_link(&key).unwrap(), second);
	let chain: Vec<Link<4>> = map.it(key).collect();
	assert_eq!(chain, vec![second, first]);
}

#[test]
fn slab_map_round_trips_variable_payloads() {
	let dir = setup();
	let head = Head::create(FileMap::new(dir.path().join("s.head"), 64, 50), 4).unwrap();
	let map: HashSlabMap<5, 3> = HashSlabMap::new(head, body(&dir, "s.data"));

	map.put(&[1, 1, 1], b"short").unwrap();
	map.put(&[2, 2, 2], b"a considerably longer payload").unwrap();

	let link = map.find_link(&[2, 2, 2]).unwrap();
	let payload = map.payload(link).unwrap();
	assert_eq!(&payload[..29], b"a considerably longer payload");
	assert!(map.find_link(&[3, 3, 3]).unwrap().is_terminal());
}

#[test]
fn multimap_links_chains_per_key() {
	let dir = setup();
	let head = Head::create(FileMap::new(dir.path().join("m.head"), 64, 50), 4).unwrap();
	let cell_head = Head::create(FileMap::new(dir.path().join("m_cells.head"), 64, 50), 0).unwrap();
	let map: MultiMap<4, 7> = MultiMap::new(
		head,
		body(&dir, "m.data"),
		cell_head,
		body(&dir, "m_cells.data"),
		4,
	);

	let key = [5u8; 7];
	// Cells are allocated and written before they are linked.
	let run = map.allocate(2).unwrap();
	let next = Link::<4>::new(run.value() + 1);
	map.cell_mut(run).unwrap().copy_from_slice(&[1, 0, 0, 0]);
	map.cell_mut(next).unwrap().copy_from_slice(&[2, 0, 0, 0]);

	// Unlinked cells are invisible.
	assert_eq!(map.find(&key).unwrap().count(), 0);

	map.link(&key, run).unwrap();
	map.link(&key, next).unwrap();

	let cells: Vec<Link<4>> = map.find(&key).unwrap().collect();
	assert_eq!(cells, vec![next, run]);
	assert_eq!(&map.cell(cells[0]).unwrap()[..], &[2, 0, 0, 0]);

	assert!(map.unlink(&key).unwrap());
	let cells: Vec<Link<4>> = map.find(&key).unwrap().collect();
	assert_eq!(cells, vec![run]);
}

#[test]
fn restore_discards_orphans_only() {
	let dir = setup();
	let map = record_map(&dir, 4, 4);

	map.put(&[1u8; 8], &[1, 0, 0, 0]).unwrap();
	map.flush().unwrap();

	// A crash mid-insert leaves an allocated, uncommitted row.
	map.allocate(1).unwrap();
	assert!(map.verify_body().unwrap());

	map.restore_body().unwrap();
	assert!(!map.verify_body().unwrap());
	assert!(!map.find_link(&[1u8; 8]).unwrap().is_terminal());
	assert_eq!(map.records(), 1);
}
