//! Minidump container parsing, stream decoding, and session management.
//!
//! This module implements the complete read path for Windows minidump files: header
//! validation, stream directory cataloging, per-stream decoders, the lazily-caching
//! [`Session`], and the cheap [`Summary`] overview.
//!
//! # Architecture
//!
//! The pieces layer bottom-up, each consuming only the one below:
//!
//! - [`header`] - the fixed 32-byte container header (`MDMP` signature, version,
//!   directory location)
//! - [`directory`] - the stream directory and its in-memory index,
//!   [`StreamCatalog`]
//! - [`streamtype`] - the [`StreamType`] ids naming what a directory entry holds
//! - `strings` - out-of-line UTF-16 string records shared by several decoders
//! - [`streams`] - one pure decoder per stream type plus the dispatch registry
//! - [`session`] - the open container: ownership, lazy decode, caching, close
//! - [`summary`] - presence and declared counts without full decodes
//!
//! # Key Types
//!
//! - [`Session`] - Main entry point; open, read streams, close
//! - [`DecodedStream`] - One decoded stream of any record family
//! - [`StreamType`] - Known stream type ids
//! - [`Header`] - The validated container header
//! - [`Summary`] - The cheap overview
//!
//! # Example
//!
//! ```rust,no_run
//! use dumpscope::{Session, StreamType};
//!
//! let session = Session::open("crash.dmp")?;
//!
//! let summary = session.summary()?;
//! println!("container declares {} streams", summary.stream_count);
//!
//! if let Some(stream) = session.read_stream(StreamType::ThreadList)? {
//!     println!("{} threads captured", stream.len());
//! }
//! # Ok::<(), dumpscope::Error>(())
//! ```

pub mod directory;
pub mod header;
pub mod session;
pub mod streams;
pub mod streamtype;
pub mod summary;

pub(crate) mod strings;

pub use directory::{DirectoryEntry, StreamCatalog};
pub use header::{DumpFlags, Header};
pub use session::{is_recognized_extension, Session, DUMP_FILE_EXTENSIONS};
pub use streams::DecodedStream;
pub use streamtype::StreamType;
pub use summary::{Summary, SummaryEntry};
