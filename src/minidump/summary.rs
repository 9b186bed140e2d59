//! Cheap container overview for fast initial display.
//!
//! A [`Summary`] reports presence and item counts per known stream type without fully
//! decoding anything. Counts come straight from each stream's declared count fields
//! through the registry's summary hooks, so even a multi-gigabyte full-memory dump
//! summarizes with a handful of small reads.

use strum::IntoEnumIterator;

use crate::{
    file::Backend,
    minidump::{
        directory::StreamCatalog,
        header::Header,
        streams::descriptor,
        streamtype::StreamType,
    },
};

/// Presence and item count for one known stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryEntry {
    /// The stream type this line describes
    pub stream_type: StreamType,
    /// Whether the container has a directory entry of this type
    pub present: bool,
    /// Declared item count; `None` when absent or when the count field could not be
    /// read (corrupt entry) - a corrupt stream never fails the whole summary
    pub count: Option<u64>,
}

/// The cheap overview of one container: stream presence and declared item counts.
///
/// # Examples
///
/// ```rust,no_run
/// use dumpscope::{Session, StreamType};
///
/// let session = Session::open("crash.dmp")?;
/// let summary = session.summary()?;
///
/// println!("{} streams", summary.stream_count);
/// for line in &summary.entries {
///     if line.present {
///         match line.count {
///             Some(count) => println!("{}: {} items", line.stream_type, count),
///             None => println!("{}: present", line.stream_type),
///         }
///     }
/// }
/// # Ok::<(), dumpscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Summary {
    /// Total stream count declared by the container header
    pub stream_count: u32,
    /// One line per known stream type, in [`StreamType`] declaration order
    pub entries: Vec<SummaryEntry>,
}

impl Summary {
    /// Builds the summary from the catalog using only declared count fields.
    pub(crate) fn build(header: &Header, catalog: &StreamCatalog, source: &dyn Backend) -> Summary {
        let entries = StreamType::iter()
            .map(|stream_type| match catalog.lookup(stream_type) {
                None => SummaryEntry {
                    stream_type,
                    present: false,
                    count: None,
                },
                Some(entry) => {
                    let count = if entry.range_within(source.len()) {
                        (descriptor(stream_type).summary_count)(source, &entry).ok()
                    } else {
                        None
                    };

                    SummaryEntry {
                        stream_type,
                        present: true,
                        count,
                    }
                }
            })
            .collect();

        Summary {
            stream_count: header.stream_count,
            entries,
        }
    }

    /// Returns whether a stream type is present in the container.
    #[must_use]
    pub fn is_present(&self, stream_type: StreamType) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.stream_type == stream_type && entry.present)
    }

    /// Returns the declared item count for a stream type, if present and readable.
    #[must_use]
    pub fn count_of(&self, stream_type: StreamType) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.stream_type == stream_type)
            .and_then(|entry| entry.count)
    }
}
