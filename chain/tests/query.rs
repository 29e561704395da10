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
extern crate hex;
extern crate tempfile;

use bitcoin::absolute::LockTime;
use bitcoin::blockdata::constants::genesis_block;
use bitcoin::consensus::deserialize;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version as TxVersion;
use bitcoin::{
	Amount, Block, BlockHash, CompactTarget, Network, OutPoint, ScriptBuf, Sequence, Transaction,
	TxIn, TxMerkleNode, TxOut, Txid,
};

use chain::{Context, Error, Forks, Query, Settings, Store};

// Canonical mainnet block 1 (spends nothing, one coinbase).
const BLOCK_1_HEX: &str = "010000006fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d619000000\
                           0000982051fd1e4ba744bbbe680e1fee14677ba1a3c3540bf7b1cdb606e857233e0e61bc\
                           6649ffff001d01e362990101000000010000000000000000000000000000000000000000\
                           000000000000000000000000ffffffff0704ffff001d0104ffffffff0100f2052a010000\
                           0043410496b538e853519c726a2c91e61ec11600ae1390813a627c66fb8be7947be63c52\
                           da7589379515d4e0a604f8141781e62294721166bf621e73a82cbf2342c858eeac000000\
                           00";

// The first ever wallet-to-wallet transaction (mainnet block 170).
const FINNEY_TX_HEX: &str = "0100000001c997a5e56e104102fa209c6a852dd90660a20b2d9c352423edce25\
                             857fcd3704000000004847304402204e45e16932b8af514961a1d3a1a25fdf3f\
                             4f7732e9d624c6c61548ab5fb8cd410220181522ec8eca07de4860a4acdd1290\
                             9d831cc56cbbac4622082221a8768d1d0901ffffffff0200ca9a3b0000000043\
                             4104ae1a62fe09c5f51b13905f07f06b99a2f7159b2225f374cd378d71302fa2\
                             8414e7aab37397f554a7df5f142c21c1b7303b8a0626f1baded5c72a704f7e6c\
                             d84cac00286bee0000000043410411db93e1dcdb8a016b49840f8c53bc1eb68a\
                             382e97b1482ecad7b148a6909a5cb2e0eaddfb84ccf9744464f82e160bfa9b8b\
                             64f9d4c03f999b8643f656b412a3ac00000000";

fn setup() -> (tempfile::TempDir, Store) {
	let _ = env_logger::try_init();
	let dir = tempfile::tempdir().unwrap();
	let store = Store::create(Settings::with_path(dir.path().join("store"))).unwrap();
	(dir, store)
}

fn block_1() -> Block {
	deserialize(&hex::decode(BLOCK_1_HEX).unwrap()).unwrap()
}

fn finney_tx() -> Transaction {
	deserialize(&hex::decode(FINNEY_TX_HEX).unwrap()).unwrap()
}

fn header_on(prev: BlockHash, nonce: u32) -> bitcoin::block::Header {
	bitcoin::block::Header {
		version: bitcoin::block::Version::from_consensus(1),
		prev_blockhash: prev,
		merkle_root: TxMerkleNode::all_zeros(),
		time: 1_231_500_000 + nonce,
		bits: CompactTarget::from_consensus(0x1d00_ffff),
		nonce,
	}
}

fn coinbase_tx(tag: u8) -> Transaction {
	Transaction {
		version: TxVersion(1),
		lock_time: LockTime::from_consensus(0),
		input: vec![TxIn {
			previous_output: OutPoint::null(),
			script_sig: ScriptBuf::from(vec![0x01, tag]),
			sequence: Sequence(0xffff_ffff),
			witness: Default::default(),
		}],
		output: vec![TxOut {
			value: Amount::from_sat(5_000_000_000),
			script_pubkey: ScriptBuf::from(vec![0x51]),
		}],
	}
}

fn spend_tx(prevout: OutPoint, sequence: u32) -> Transaction {
	Transaction {
		version: TxVersion(2),
		lock_time: LockTime::from_consensus(0),
		input: vec![TxIn {
			previous_output: prevout,
			script_sig: ScriptBuf::from(vec![0x00]),
			sequence: Sequence(sequence),
			witness: Default::default(),
		}],
		output: vec![TxOut {
			value: Amount::from_sat(4_900_000_000),
			script_pubkey: ScriptBuf::from(vec![0x52]),
		}],
	}
}

// Scenario 1: genesis initialization.
#[test]
fn initialize_indexes_the_genesis() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	let genesis_hash = genesis.header.block_hash();

	let link = query.initialize(&genesis).unwrap();
	assert_eq!(link.value(), 0);
	assert_eq!(query.get_top_candidate(), 0);
	assert_eq!(query.get_top_confirmed(), 0);
	assert!(query.is_header(&genesis_hash));
	assert!(query.is_block(&genesis_hash));

	// The genesis coinbase is tx link zero and strong for header zero.
	let coinbase = query.to_coinbase(link);
	assert_eq!(coinbase.value(), 0);
	assert_eq!(query.to_block(coinbase), link);
	assert!(query.to_parent(link).is_terminal());
	store.close().unwrap();
}

// Scenario 2: mainnet block 1 extends the genesis.
#[test]
fn block_one_extends_the_genesis() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	let genesis_link = query.initialize(&genesis).unwrap();

	let block = block_1();
	let hash = block.header.block_hash();
	let ctx = Context::at_height(1);
	let link = query.set_block(&block, &ctx, false, false).unwrap();
	query.push_candidate(link).unwrap();
	query.set_strong(link).unwrap();
	query.push_confirmed(link, false).unwrap();

	assert_eq!(query.get_top_candidate(), 1);
	assert_eq!(query.get_top_confirmed(), 1);
	assert_eq!(query.to_header(&hash), link);
	assert_eq!(query.to_parent(link), genesis_link);
	assert_eq!(
		query.get_header_key(genesis_link).unwrap(),
		genesis.header.block_hash()
	);

	// P1: the parent's key equals the previous-hash field.
	assert_eq!(
		query.get_header_key(query.to_parent(link)).unwrap(),
		block.header.prev_blockhash
	);
	// P5: round trip.
	assert_eq!(query.get_block(link).unwrap(), block);
	store.close().unwrap();
}

// Scenario 3: a non-genesis header with a null previous hash.
#[test]
fn null_parent_beyond_genesis_is_orphan() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	query.initialize(&genesis_block(Network::Bitcoin)).unwrap();

	let rogue = header_on(BlockHash::all_zeros(), 7);
	let result = query.set_header(&rogue, &Context::at_height(7), false);
	assert_eq!(result.unwrap_err(), Error::OrphanBlock);

	// An unknown (non-null) parent is equally an orphan.
	let orphan = header_on(block_1().header.block_hash(), 8);
	let result = query.set_header(&orphan, &Context::at_height(2), false);
	assert_eq!(result.unwrap_err(), Error::OrphanBlock);
	store.close().unwrap();
}

// Scenario 4: duplicate tx insert is idempotent.
#[test]
fn duplicate_tx_insert_returns_the_first_link() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	query.initialize(&genesis_block(Network::Bitcoin)).unwrap();

	let tx = finney_tx();
	let txid = tx.compute_txid();
	let first = query.set_tx(&tx).unwrap();
	let records = query.tx_records();
	let body = query.archive_body_size();

	let second = query.set_tx(&tx).unwrap();
	assert_eq!(second, first);
	assert_eq!(query.tx_records(), records);
	assert_eq!(query.archive_body_size(), body);

	assert!(!query.to_tx(&txid).is_terminal());
	// P3: the committed entry matches the first insert.
	assert_eq!(query.get_transaction(first).unwrap(), tx);
	assert_eq!(
		query.get_transaction(first).unwrap().compute_txid(),
		txid
	);
	store.close().unwrap();
}

// Scenario 5: snapshot, crash, restore.
#[test]
fn restore_preserves_committed_txs() {
	let _ = env_logger::try_init();
	let dir = tempfile::tempdir().unwrap();
	let settings = Settings::with_path(dir.path().join("store"));
	let tx = finney_tx();
	let txid = tx.compute_txid();

	let link = {
		let store = Store::create(settings.clone()).unwrap();
		let query = Query::new(&store);
		query.initialize(&genesis_block(Network::Bitcoin)).unwrap();
		let link = query.set_tx(&tx).unwrap();
		store.snapshot().unwrap();
		link
		// Crash: dropped without close, flush lock left behind.
	};

	let store = Store::restore(settings).unwrap();
	let query = Query::new(&store);
	assert_eq!(query.to_tx(&txid), link);
	assert_eq!(query.get_transaction(link).unwrap(), tx);
	store.close().unwrap();
}

// Scenario 6a: a block spending a confirmed non-coinbase output is
// confirmable.
#[test]
fn spend_of_confirmed_output_is_confirmable() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	query.initialize(&genesis).unwrap();

	// Block E: coinbase plus a funding tx (its prevout is foreign,
	// which confirmation of a later spender does not examine).
	let funding = spend_tx(
		OutPoint {
			txid: Txid::from_byte_array([0xaa; 32]),
			vout: 0,
		},
		0xffff_ffff,
	);
	let block_e = Block {
		header: header_on(genesis.header.block_hash(), 1),
		txdata: vec![coinbase_tx(1), funding.clone()],
	};
	let link_e = query
		.set_block(&block_e, &Context::at_height(1), false, true)
		.unwrap();
	query.push_candidate(link_e).unwrap();
	query.push_confirmed(link_e, false).unwrap();

	// Block X: second tx spends the funding tx's sole output.
	let spender = spend_tx(
		OutPoint {
			txid: funding.compute_txid(),
			vout: 0,
		},
		0xffff_ffff,
	);
	let block_x = Block {
		header: header_on(block_e.header.block_hash(), 2),
		txdata: vec![coinbase_tx(2), spender],
	};
	let link_x = query
		.set_block(&block_x, &Context::at_height(2), false, false)
		.unwrap();
	query.set_prevouts(link_x, &block_x).unwrap();
	assert!(query.is_prevouts_cached(link_x));
	assert_eq!(query.block_confirmable(link_x), Ok(()));
	store.close().unwrap();
}

// Scenario 6b: spending the preceding block's coinbase is immature.
#[test]
fn immature_coinbase_spend_is_unconfirmable() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	query.initialize(&genesis).unwrap();

	let coinbase = coinbase_tx(1);
	let block_e = Block {
		header: header_on(genesis.header.block_hash(), 1),
		txdata: vec![coinbase.clone()],
	};
	let link_e = query
		.set_block(&block_e, &Context::at_height(1), false, true)
		.unwrap();
	query.push_candidate(link_e).unwrap();
	query.push_confirmed(link_e, false).unwrap();

	// Disabled sequence: bip68 passes, maturity does not.
	let spender = spend_tx(
		OutPoint {
			txid: coinbase.compute_txid(),
			vout: 0,
		},
		0xffff_ffff,
	);
	let block_y = Block {
		header: header_on(block_e.header.block_hash(), 2),
		txdata: vec![coinbase_tx(2), spender],
	};
	let ctx = Context {
		flags: Forks::BIP68_RULE,
		height: 2,
		mtp: 0,
	};
	let link_y = query.set_block(&block_y, &ctx, false, false).unwrap();
	query.set_prevouts(link_y, &block_y).unwrap();
	assert_eq!(
		query.block_confirmable(link_y),
		Err(Error::CoinbaseMaturity)
	);
	store.close().unwrap();
}

// B3: a tx without inputs or outputs is rejected.
#[test]
fn empty_tx_is_rejected() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let empty = Transaction {
		version: TxVersion(1),
		lock_time: LockTime::from_consensus(0),
		input: vec![],
		output: vec![],
	};
	assert_eq!(query.set_tx(&empty).unwrap_err(), Error::TxEmpty);
	store.close().unwrap();
}

// B5: a coinbase-only block is trivially confirmable.
#[test]
fn coinbase_only_block_is_confirmable() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	query.initialize(&genesis).unwrap();

	let block = block_1();
	let link = query
		.set_block(&block, &Context::at_height(1), false, false)
		.unwrap();
	assert_eq!(query.block_confirmable(link), Ok(()));
	store.close().unwrap();
}

// P4: height translation is terminal exactly above the top.
#[test]
fn height_translation_is_bounded_by_the_top() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	query.initialize(&genesis_block(Network::Bitcoin)).unwrap();

	assert!(!query.to_candidate(0).is_terminal());
	assert!(query.to_candidate(1).is_terminal());
	assert!(!query.to_confirmed(0).is_terminal());
	assert!(query.to_confirmed(1).is_terminal());

	query.pop_candidate().unwrap();
	assert!(query.to_candidate(0).is_terminal());
	store.close().unwrap();
}

// P6: strength survives revoke-and-reassert.
#[test]
fn strength_is_idempotent_across_reorg() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	query.initialize(&genesis).unwrap();

	let block = block_1();
	let link = query
		.set_block(&block, &Context::at_height(1), false, false)
		.unwrap();
	let coinbase = query.to_coinbase(link);

	query.set_strong(link).unwrap();
	let claimed = query.to_block(coinbase);
	query.set_unstrong(link).unwrap();
	assert!(!query.is_strong_block(link));
	assert!(query.to_block(coinbase).is_terminal());

	query.set_strong(link).unwrap();
	assert!(query.is_strong_block(link));
	assert!(query.is_strong_tx(coinbase));
	assert_eq!(query.to_block(coinbase), claimed);
	store.close().unwrap();
}

// P2: txs bound to a header resolve to it or to terminal.
#[test]
fn bound_txs_resolve_to_their_block_or_terminal() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	query.initialize(&genesis_block(Network::Bitcoin)).unwrap();

	let block = block_1();
	let link = query
		.set_block(&block, &Context::at_height(1), false, false)
		.unwrap();

	// No strong record yet: terminal.
	for tx in query.to_transactions(link) {
		assert!(query.to_block(tx).is_terminal());
	}
	query.set_strong(link).unwrap();
	for tx in query.to_transactions(link) {
		assert_eq!(query.to_block(tx), link);
	}
	store.close().unwrap();
}

// P7: the address index resolves archived outputs by script hash.
#[test]
fn address_index_resolves_output_scripts() {
	let _ = env_logger::try_init();
	let dir = tempfile::tempdir().unwrap();
	let mut settings = Settings::with_path(dir.path().join("store"));
	settings.address_enabled = true;
	let store = Store::create(settings).unwrap();
	let query = Query::new(&store);
	assert!(query.address_enabled());

	query.initialize(&genesis_block(Network::Bitcoin)).unwrap();
	let tx = finney_tx();
	let link = query.set_tx(&tx).unwrap();

	for (index, output) in tx.output.iter().enumerate() {
		let outputs = query.to_address_outputs(&output.script_pubkey).unwrap();
		assert_eq!(outputs.len(), 1);
		assert_eq!(outputs[0], query.to_output(link, index as u32));
		assert_eq!(query.get_value(outputs[0]), Some(output.value.to_sat()));
	}
	store.close().unwrap();
}

// Spender navigation: point chain to spend cells and back.
#[test]
fn spenders_are_found_through_the_point_chain() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	query.initialize(&genesis_block(Network::Bitcoin)).unwrap();

	let funding = finney_tx();
	let funding_link = query.set_tx(&funding).unwrap();
	let prevout = OutPoint {
		txid: funding.compute_txid(),
		vout: 0,
	};
	let spender = spend_tx(prevout, 17);
	let spender_link = query.set_tx(&spender).unwrap();

	let spends = query.to_spenders(&prevout);
	assert_eq!(spends.len(), 1);
	let assembled = query.get_input(spends[0]).unwrap();
	assert_eq!(assembled, spender.input[0]);
	assert_eq!(query.to_spend(spender_link, 0), spends[0]);

	// The other output is unspent.
	let spends = query.to_spenders_of(funding_link, 1);
	assert!(spends.is_empty());
	store.close().unwrap();
}

// Double spends surface through the duplicate table and the prevout
// cache conflicts.
#[test]
fn confirmed_double_spend_is_rejected() {
	let (_dir, store) = setup();
	let query = Query::new(&store);
	let genesis = genesis_block(Network::Bitcoin);
	query.initialize(&genesis).unwrap();

	let funding = spend_tx(
		OutPoint {
			txid: Txid::from_byte_array([0xbb; 32]),
			vout: 0,
		},
		0xffff_ffff,
	);
	let prevout = OutPoint {
		txid: funding.compute_txid(),
		vout: 0,
	};

	// Block E confirms the funding tx and a first spend of it.
	let first_spend = spend_tx(prevout, 0xffff_ffff);
	let block_e = Block {
		header: header_on(genesis.header.block_hash(), 1),
		txdata: vec![coinbase_tx(1), funding, first_spend],
	};
	let link_e = query
		.set_block(&block_e, &Context::at_height(1), false, true)
		.unwrap();
	query.push_candidate(link_e).unwrap();
	query.push_confirmed(link_e, false).unwrap();

	// Block X tries to spend the same prevout to a different output.
	let mut second_spend = spend_tx(prevout, 0xffff_ffff);
	second_spend.output[0].value = Amount::from_sat(1);
	let block_x = Block {
		header: header_on(block_e.header.block_hash(), 2),
		txdata: vec![coinbase_tx(2), second_spend],
	};
	let link_x = query
		.set_block(&block_x, &Context::at_height(2), false, false)
		.unwrap();
	query.set_prevouts(link_x, &block_x).unwrap();
	assert_eq!(
		query.block_confirmable(link_x),
		Err(Error::ConfirmedDoubleSpend)
	);
	store.close().unwrap();
}
