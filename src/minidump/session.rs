//! The open minidump container: lifecycle, lazy decoding, and caching.
//!
//! A [`Session`] owns the byte source, the validated header, and the stream catalog of
//! one container, and decodes streams on demand. Each stream type is decoded at most
//! once per session; the result is cached and every later read returns the same shared
//! value without touching the file again.
//!
//! # Lifecycle
//!
//! `open` (or `from_mem`) → any number of `read_stream`/`summary` calls → `close`.
//! Closing releases the byte source and invalidates the session; it also happens
//! automatically on drop, so release is guaranteed on every exit path including early
//! returns and errors. Opening a new session never implicitly closes a prior one -
//! disposal of the old session is its owner's explicit responsibility.
//!
//! # Thread Safety
//!
//! [`Session`] is `Send + Sync`. A consumer may dispatch a decode to a worker thread
//! while inspecting the session from another; the byte source is reference-counted so
//! `close` defers the actual release until the last in-flight decode finishes, and
//! concurrent decodes of the same stream type single-flight through the cache - the
//! second caller blocks until the first result lands, then shares it.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

use dashmap::DashMap;
use tracing::debug;

use crate::{
    file::{Backend, Memory, Physical},
    minidump::{
        directory::{DirectoryEntry, StreamCatalog},
        header::Header,
        streams::{self, DecodedStream},
        streamtype::StreamType,
        summary::Summary,
    },
    Result,
};

/// File extensions conventionally used for full and mini dump files.
///
/// This is a hint for file pickers and drag-and-drop filtering only - whether a file
/// actually is a minidump is determined solely by its header signature and version,
/// never by its name.
pub const DUMP_FILE_EXTENSIONS: [&str; 2] = ["dmp", "hdmp"];

/// Returns `true` if the path carries one of the conventional dump file extensions.
///
/// # Examples
///
/// ```rust
/// use dumpscope::is_recognized_extension;
///
/// assert!(is_recognized_extension("crash.dmp"));
/// assert!(is_recognized_extension("full.HDMP"));
/// assert!(!is_recognized_extension("report.txt"));
/// ```
#[must_use]
pub fn is_recognized_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            DUMP_FILE_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

/// An open minidump container with decode-on-demand stream access.
///
/// The session is the main entry point of this crate. It validates the container on
/// open, exposes the stream catalog for navigation, decodes streams lazily with
/// per-type caching, and guarantees the byte source is released exactly once.
///
/// # Usage Examples
///
/// ```rust,no_run
/// use dumpscope::{Session, StreamType};
///
/// let session = Session::open("crash.dmp")?;
///
/// for stream_type in session.list_streams() {
///     println!("present: {}", stream_type);
/// }
///
/// if let Some(modules) = session.read_stream(StreamType::ModuleList)? {
///     for module in modules.as_modules().unwrap_or_default() {
///         println!("{:#018x} {}", module.base_of_image, module.name);
///     }
/// }
///
/// session.close();
/// # Ok::<(), dumpscope::Error>(())
/// ```
///
/// # Thread Safety
///
/// All methods take `&self` and are safe to call concurrently. See the module
/// documentation for the close/decode interaction.
pub struct Session {
    /// The byte source; `None` once the session is closed. In-flight decodes hold
    /// their own `Arc` clone, deferring the actual release past `close`.
    backend: RwLock<Option<Arc<dyn Backend>>>,
    /// The validated container header
    header: Header,
    /// The stream directory index
    catalog: StreamCatalog,
    /// Per-type decode cache; populated at most once per stream type
    cache: DashMap<StreamType, Arc<DecodedStream>>,
    /// Set by `close`; checked before any file-touching operation
    closed: AtomicBool,
}

impl Session {
    /// Opens a minidump file from disk.
    ///
    /// The file is memory-mapped, its header validated, and its stream directory read
    /// into the catalog. No stream content is decoded yet.
    ///
    /// # Arguments
    /// * `path` - Path to the dump file. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened or mapped ([`crate::Error::FileError`],
    ///   [`crate::Error::Error`])
    /// - The file is empty ([`crate::Error::Empty`])
    /// - The header signature or version does not match ([`crate::Error::Format`])
    /// - The stream directory exceeds the file bounds ([`crate::Error::Truncated`])
    pub fn open(path: impl AsRef<Path>) -> Result<Session> {
        let backend = Physical::new(path)?;

        Self::load(Arc::new(backend))
    }

    /// Opens a minidump from a buffer already in memory.
    ///
    /// Same validation as [`Session::open`]; useful for dumps received over IPC or
    /// embedded in tests.
    ///
    /// # Errors
    /// Same as [`Session::open`], minus the file access failures.
    pub fn from_mem(data: Vec<u8>) -> Result<Session> {
        Self::load(Arc::new(Memory::new(data)))
    }

    /// Internal loader for any backend.
    fn load(backend: Arc<dyn Backend>) -> Result<Session> {
        if backend.is_empty() {
            return Err(crate::Error::Empty);
        }

        let header = Header::read(backend.data())?;
        let catalog = StreamCatalog::read(backend.as_ref(), &header)?;

        debug!(
            streams = header.stream_count,
            bytes = backend.len(),
            "opened minidump container"
        );

        Ok(Session {
            backend: RwLock::new(Some(backend)),
            header,
            catalog,
            cache: DashMap::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the validated container header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the stream catalog.
    #[must_use]
    pub fn catalog(&self) -> &StreamCatalog {
        &self.catalog
    }

    /// Returns the known stream types present in this container, in file order.
    ///
    /// This keeps working after `close` - the catalog is in-memory state and a shell
    /// may still need it to render the tree of a closed session.
    #[must_use]
    pub fn list_streams(&self) -> Vec<StreamType> {
        self.catalog.stream_types()
    }

    /// Returns all raw directory entries in file order, including types this crate
    /// cannot decode.
    #[must_use]
    pub fn entries(&self) -> &[DirectoryEntry] {
        self.catalog.entries()
    }

    /// Decodes a stream on first request and returns the cached result afterwards.
    ///
    /// Returns `Ok(None)` when the container has no entry of this type - absence is a
    /// legitimate state, not an error. Two calls for the same type return the same
    /// `Arc`; the second performs no file access.
    ///
    /// # Errors
    /// - [`crate::Error::UseAfterClose`] if the session is closed
    /// - [`crate::Error::Truncated`] if this entry's range exceeds the file bounds
    /// - [`crate::Error::StreamDecode`] if this stream's content is inconsistent
    ///
    /// Stream-scoped errors never poison the session: other streams remain readable,
    /// and a failed decode is not cached, so a retry re-runs it.
    pub fn read_stream(&self, stream_type: StreamType) -> Result<Option<Arc<DecodedStream>>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(crate::Error::UseAfterClose);
        }

        if let Some(hit) = self.cache.get(&stream_type) {
            return Ok(Some(hit.value().clone()));
        }

        let Some(entry) = self.catalog.lookup(stream_type) else {
            return Ok(None);
        };

        let backend = self.backend()?;

        // The entry API holds the shard lock while decoding, so a concurrent request
        // for the same type waits here and then finds the cached value instead of
        // decoding a second time.
        let decoded = self
            .cache
            .entry(stream_type)
            .or_try_insert_with(|| -> Result<Arc<DecodedStream>> {
                debug!(
                    stream = %stream_type,
                    bytes = entry.length,
                    rva = entry.rva,
                    "decoding stream"
                );
                let descriptor = streams::descriptor(stream_type);
                Ok(Arc::new((descriptor.decode)(backend.as_ref(), &entry)?))
            })?
            .value()
            .clone();

        Ok(Some(decoded))
    }

    /// Computes the cheap overview of this container: stream presence and declared
    /// item counts, without fully decoding any stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::UseAfterClose`] if the session is closed. Corruption
    /// inside an individual stream does not fail the summary; that stream's count is
    /// reported as unknown.
    pub fn summary(&self) -> Result<Summary> {
        if self.closed.load(Ordering::Acquire) {
            return Err(crate::Error::UseAfterClose);
        }

        let backend = self.backend()?;
        Ok(Summary::build(&self.header, &self.catalog, backend.as_ref()))
    }

    /// Closes the session, releasing the byte source and dropping the decode cache.
    ///
    /// Safe to call more than once. Decodes already in flight finish against their own
    /// reference to the byte source; the mapping is actually released when the last of
    /// those drops. Any `read_stream` or `summary` call after close fails with
    /// [`crate::Error::UseAfterClose`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);

        if let Ok(mut guard) = self.backend.write() {
            *guard = None;
        }
        self.cache.clear();
    }

    /// Returns `true` once the session has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Clones out the shared byte source, or reports the session closed.
    fn backend(&self) -> Result<Arc<dyn Backend>> {
        let guard = self.backend.read().map_err(|_| crate::Error::LockError)?;
        match guard.as_ref() {
            Some(backend) => Ok(backend.clone()),
            None => Err(crate::Error::UseAfterClose),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("header", &self.header)
            .field("streams", &self.catalog.len())
            .field("cached", &self.cache.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
