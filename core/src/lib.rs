// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Core components for signing AWS SigV4 requests.
//!
//! This crate provides the foundational pieces shared by the amzsign
//! signers: the error type, hashing and HMAC helpers, time formatting, an
//! environment abstraction used for configuration, and redaction for secrets.
//!
//! ## Example
//!
//! ```
//! use amzsign_core::hash::{hex_hmac_sha256, hex_sha256};
//! use amzsign_core::time::{format_date, format_iso8601, parse_iso8601};
//!
//! # fn main() -> amzsign_core::Result<()> {
//! let time = parse_iso8601("20130524T000000Z")?;
//! assert_eq!(format_date(time), "20130524");
//! assert_eq!(format_iso8601(time), "20130524T000000Z");
//!
//! let digest = hex_sha256(b"");
//! assert_eq!(digest.len(), 64);
//!
//! let mac = hex_hmac_sha256(b"key", b"content")?;
//! assert_eq!(mac.len(), 64);
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction
//! - [`Env`]: Environment variable access

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod env;
pub use env::Env;
pub use env::OsEnv;
pub use env::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};
