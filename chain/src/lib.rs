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

//! The bedrock chain archive: persistent storage for headers, txs,
//! inputs, outputs and points; the candidate/confirmed chain indexes;
//! the validation and confirmation caches; and the query layer the
//! node's synchronization, validation and RPC subsystems consume.
//!
//! Chain objects come and go as rust-bitcoin values; their wire
//! encoding is external to the store. Script and witness blobs are
//! archived opaquely and never evaluated here.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

extern crate bitcoin;
#[macro_use]
extern crate bitflags;
extern crate byteorder;
#[macro_use]
extern crate log;
extern crate parking_lot;
extern crate serde;
#[macro_use]
extern crate serde_derive;

extern crate bedrock_store;

pub mod context;
pub mod query;
pub mod schema;
pub mod settings;
pub mod store;
pub mod tables;

pub use crate::context::{Context, Forks, COINBASE_MATURITY};
pub use crate::query::{HeaderState, Query};
pub use crate::schema::{HeaderLink, OutputLink, PointLink, SpendLink, TxLink};
pub use crate::settings::Settings;
pub use crate::store::{Storage, Store, Tables};
pub use bedrock_store::Error;
