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

//! Store configuration, fixed at create time and stable thereafter.

use std::path::PathBuf;

/// Bucket count and body sizing of one table.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TableSettings {
	/// Bucket cells in the head (hash map tables).
	pub buckets: usize,
	/// Initial body capacity in bytes.
	pub minimum: usize,
}

impl TableSettings {
	fn new(buckets: usize, minimum: usize) -> TableSettings {
		TableSettings { buckets, minimum }
	}
}

/// Store configuration. The defaults are sized for a small archive;
/// mainnet-scale deployments raise the bucket counts and minimums.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
	/// Root directory of the store.
	pub path: PathBuf,
	/// Body growth rate in percent.
	pub expansion: usize,
	/// Skip duplicate guards on checkpointed block inserts.
	pub turbo: bool,
	/// Reuse point records for identical hashes; smaller bodies at
	/// the cost of a probe per insert.
	pub minimize: bool,
	/// Populate the address index.
	pub address_enabled: bool,
	/// Populate the filter tables.
	pub filter_enabled: bool,
	/// Granularity of the txs interval index (diagnostic only).
	pub interval_depth: usize,

	/// Header table sizing.
	pub header: TableSettings,
	/// Tx table sizing.
	pub tx: TableSettings,
	/// Point table sizing.
	pub point: TableSettings,
	/// Input body sizing.
	pub input: TableSettings,
	/// Output body sizing.
	pub output: TableSettings,
	/// Puts body sizing.
	pub puts: TableSettings,
	/// Spend table sizing.
	pub spend: TableSettings,
	/// Txs table sizing.
	pub txs: TableSettings,
	/// Candidate index sizing.
	pub candidate: TableSettings,
	/// Confirmed index sizing.
	pub confirmed: TableSettings,
	/// Strong tx table sizing.
	pub strong_tx: TableSettings,
	/// Duplicate table sizing.
	pub duplicate: TableSettings,
	/// Prevout cache sizing.
	pub prevout: TableSettings,
	/// Validated block cache sizing.
	pub validated_bk: TableSettings,
	/// Validated tx cache sizing.
	pub validated_tx: TableSettings,
	/// Address table sizing.
	pub address: TableSettings,
	/// Filter header table sizing.
	pub filter_bk: TableSettings,
	/// Filter body table sizing.
	pub filter_tx: TableSettings,
}

impl Settings {
	/// Settings rooted at the given directory.
	pub fn with_path<P: Into<PathBuf>>(path: P) -> Settings {
		Settings {
			path: path.into(),
			..Default::default()
		}
	}
}

impl Default for Settings {
	fn default() -> Settings {
		Settings {
			path: PathBuf::from("bedrock"),
			expansion: 50,
			turbo: false,
			minimize: false,
			address_enabled: false,
			filter_enabled: false,
			interval_depth: 0,
			header: TableSettings::new(1 << 10, 1 << 12),
			tx: TableSettings::new(1 << 12, 1 << 14),
			point: TableSettings::new(1 << 12, 1 << 13),
			input: TableSettings::new(0, 1 << 14),
			output: TableSettings::new(0, 1 << 14),
			puts: TableSettings::new(0, 1 << 13),
			spend: TableSettings::new(1 << 12, 1 << 13),
			txs: TableSettings::new(1 << 10, 1 << 12),
			candidate: TableSettings::new(0, 1 << 10),
			confirmed: TableSettings::new(0, 1 << 10),
			strong_tx: TableSettings::new(1 << 12, 1 << 12),
			duplicate: TableSettings::new(1 << 4, 1 << 8),
			prevout: TableSettings::new(0, 1 << 12),
			validated_bk: TableSettings::new(1 << 10, 1 << 10),
			validated_tx: TableSettings::new(1 << 12, 1 << 12),
			address: TableSettings::new(1 << 12, 1 << 12),
			filter_bk: TableSettings::new(1 << 10, 1 << 10),
			filter_tx: TableSettings::new(1 << 10, 1 << 12),
		}
	}
}
