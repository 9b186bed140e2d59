// Copyright 2025 dumpscope Contributors
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
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dumpscope
//!
//! A cross-platform framework for parsing and inspecting Windows minidump (crash dump)
//! files. Built in pure Rust, `dumpscope` decodes the container's stream directory and
//! every common stream type - threads, modules, memory ranges, open handles, exception
//! context, and the informational blocks - without requiring Windows or the Debugging
//! Tools.
//!
//! ## Features
//!
//! - **📦 Efficient memory access** - Memory-mapped file access; only the streams you
//!   read are ever decoded
//! - **🔍 Complete stream coverage** - Threads, modules, memory (32- and 64-bit lists),
//!   memory regions, handles, unloaded modules, thread names, exception, system,
//!   process, and comment streams
//! - **🛡️ Defensive by default** - Every read is bounds-checked; malformed counts and
//!   out-of-range offsets fail that stream, never the process, and never other streams
//! - **⚡ Lazy and cached** - Streams decode on first request and are shared afterwards;
//!   repeated reads cost nothing
//! - **🔧 Cross-platform** - Works on Windows, Linux, macOS, and any Rust-supported
//!   platform
//! - **🧩 Thread-friendly** - Decode from a worker thread while inspecting from another;
//!   closing is safe against in-flight decodes
//!
//! ## Quick Start
//!
//! Add `dumpscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dumpscope = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! ```rust,no_run
//! use dumpscope::prelude::*;
//!
//! let session = Session::open("crash.dmp")?;
//! println!("{} streams present", session.list_streams().len());
//! # Ok::<(), dumpscope::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use dumpscope::{Session, StreamType};
//!
//! // Open and validate the container
//! let session = Session::open("crash.dmp")?;
//!
//! // Cheap overview for initial display
//! let summary = session.summary()?;
//! println!("container declares {} streams", summary.stream_count);
//!
//! // Decode the module list on demand
//! if let Some(stream) = session.read_stream(StreamType::ModuleList)? {
//!     for module in stream.as_modules().unwrap_or_default() {
//!         println!("{:#018x} {}", module.base_of_image, module.name);
//!     }
//! }
//!
//! // Absence is a state, not an error: a non-crash snapshot has no exception
//! match session.read_stream(StreamType::Exception)? {
//!     Some(stream) => println!("crash dump: {:?}", stream.as_exception()),
//!     None => println!("no exception captured"),
//! }
//!
//! session.close();
//! # Ok::<(), dumpscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `dumpscope` is organized into two layers:
//!
//! - [`file`] - Byte source abstraction: bounds-checked access over memory-mapped files
//!   and in-memory buffers
//! - [`minidump`] - The format itself: header, stream directory, per-stream decoders,
//!   the lazily-caching [`Session`], and the [`Summary`] builder
//!
//! The main entry point is [`Session`]: open a file, enumerate streams through the
//! catalog, decode on demand through [`Session::read_stream`], and close (or drop) to
//! release the mapping.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Open-level failures (bad
//! signature, truncated directory, I/O) abort the open; stream-level failures are
//! scoped to the one stream and leave every other stream readable:
//!
//! ```rust,no_run
//! use dumpscope::{Error, Session};
//!
//! match Session::open("crash.dmp") {
//!     Ok(session) => println!("opened"),
//!     Err(Error::Format { message, .. }) => println!("not a minidump: {}", message),
//!     Err(Error::Truncated { message, .. }) => println!("cut short: {}", message),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```
//!
//! ## Format Reference
//!
//! The on-disk layouts follow the `MINIDUMP_*` structures of the Windows
//! `minidumpapiset.h` header; all integer fields are fixed-width little-endian.

#[macro_use]
pub(crate) mod error;
pub mod file;
pub mod minidump;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the dumpscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use dumpscope::prelude::*;
///
/// let session = Session::open("crash.dmp")?;
/// let summary = session.summary()?;
/// # Ok::<(), dumpscope::Error>(())
/// ```
pub mod prelude;

/// The result type used throughout dumpscope.
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;
pub use minidump::{
    is_recognized_extension, DecodedStream, DirectoryEntry, DumpFlags, Header, Session,
    StreamCatalog, StreamType, Summary, SummaryEntry, DUMP_FILE_EXTENSIONS,
};
