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

//! Memory-mapped table substrate for the bedrock chain archive.
//!
//! A table is a head file (bucket or array cells) and an append-only
//! body file (fixed records or variable slabs), addressed by
//! fixed-width surrogate links. The primitives here (hash maps, an
//! array map, an array index and a record multimap) are untyped;
//! the chain layer declares the concrete schema over them.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

extern crate byteorder;
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate libc;
#[macro_use]
extern crate log;
extern crate memmap;
extern crate parking_lot;

pub mod arraymap;
pub mod error;
pub mod file_map;
pub mod hashmap;
pub mod head;
pub mod link;
pub mod lock;
pub mod multimap;
pub mod record;
pub mod slab;

pub use crate::arraymap::{ArrayIndex, ArrayMap};
pub use crate::error::Error;
pub use crate::file_map::{Access, AccessMut, FileMap};
pub use crate::hashmap::{HashRecordMap, HashSlabMap};
pub use crate::head::{Head, HEAD_PREFIX, HEAD_VERSION};
pub use crate::link::Link;
pub use crate::lock::{ProcessLock, SentinelLock};
pub use crate::multimap::MultiMap;
pub use crate::record::RecordManager;
pub use crate::slab::SlabManager;
