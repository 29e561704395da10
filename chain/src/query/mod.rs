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

//! The query layer: translation between natural keys and surrogate
//! links, archive read and write assemblers, chain-state extension
//! and the storage-side consensus checks. Reads take a shared
//! transactor token; every write holds the transactor exclusively
//! for the duration of one logical operation.
//!
//! Read assemblers return absent on missing cross-references;
//! integrity codes are reserved for impossible states.

use crate::store::{Storage, Tables};

mod archive;
mod confirm;
mod consensus;
mod extent;
mod objects;
mod optional;
mod translate;
mod validate;

pub use self::consensus::PointSet;

/// The header's validation disposition, from the validated-block
/// cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderState {
	/// Validated and eligible to extend the confirmed chain.
	Confirmable,
	/// Validated but not yet confirmable.
	Valid,
	/// Validated and rejected.
	Unconfirmable,
	/// No validation state recorded.
	Unvalidated,
}

/// The query interface over a storage implementation.
pub struct Query<'a, S: Storage> {
	pub(crate) store: &'a S,
}

impl<'a, S: Storage> Query<'a, S> {
	/// Bind a query to a store.
	pub fn new(store: &'a S) -> Query<'a, S> {
		Query { store }
	}

	pub(crate) fn tables(&self) -> &Tables {
		self.store.tables()
	}
}
