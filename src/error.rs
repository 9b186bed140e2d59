use thiserror::Error;

macro_rules! format_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Format {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Format {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! truncated_error {
    ($msg:expr) => {
        crate::Error::Truncated {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Truncated {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! stream_error {
    ($msg:expr) => {
        crate::Error::StreamDecode {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::StreamDecode {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while opening a minidump
/// container and decoding its streams. Each variant provides specific context about the
/// failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Open-level errors (fatal to the session)
/// - [`Error::Format`] - Header signature or version mismatch
/// - [`Error::Truncated`] - Directory range exceeds the file bounds
/// - [`Error::Empty`] - Empty input provided
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// ## Stream-level errors (scoped to one stream)
/// - [`Error::StreamDecode`] - Count/length inconsistency or out-of-range embedded offset
/// - [`Error::Truncated`] - A single directory entry's range exceeds the file bounds
///
/// ## Usage errors
/// - [`Error::UseAfterClose`] - Operation attempted on a closed session
/// - [`Error::LockError`] - Thread synchronization failure
///
/// # Examples
///
/// ```rust,no_run
/// use dumpscope::{Error, Session};
///
/// match Session::open("crash.dmp") {
///     Ok(session) => {
///         println!("Opened minidump with {} streams", session.header().stream_count);
///     }
///     Err(Error::Format { message, .. }) => {
///         eprintln!("Not a minidump: {}", message);
///     }
///     Err(Error::FileError(io_err)) => {
///         eprintln!("I/O error: {}", io_err);
///     }
///     Err(e) => {
///         eprintln!("Other error: {}", e);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The container header is not a valid minidump header.
    ///
    /// This error occurs when the signature or version word of the file does not
    /// match the minidump format constants. It is fatal to the open call; no
    /// session is created. The error includes the source location where the
    /// mismatch was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what did not match
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Format - {file}:{line}: {message}")]
    Format {
        /// The message to be printed for the Format error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The directory, or a stream's declared range, falls outside the file bounds.
    ///
    /// At directory level this error is fatal to the open call. At entry level it
    /// is scoped to the affected stream's decode; other streams remain readable.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the out-of-range structure
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Truncated - {file}:{line}: {message}")]
    Truncated {
        /// The message to be printed for the Truncated error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A single stream's content is internally inconsistent.
    ///
    /// This error occurs when a stream's declared count does not match its computed
    /// count, or when an embedded offset does not resolve within the file. It is
    /// scoped to that stream only; other streams remain independently readable.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the inconsistency
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("StreamDecode - {file}:{line}: {message}")]
    StreamDecode {
        /// The message to be printed for the StreamDecode error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when trying to read data beyond the end of the file
    /// or stream. It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    ///
    /// This error occurs when an empty file or buffer is provided where
    /// actual minidump data was expected.
    #[error("Provided input was empty")]
    Empty,

    /// An operation was attempted on a closed session.
    ///
    /// Once [`crate::Session::close`] has run, the byte source is released and
    /// any further stream read is a usage error, always surfaced as this variant.
    #[error("Session has been closed")]
    UseAfterClose,

    /// Failed to lock target.
    ///
    /// This error occurs when thread synchronization fails, typically
    /// when trying to acquire a lock that is in a poisoned state.
    #[error("Failed to lock target")]
    LockError,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories, such as
    /// a failed memory mapping.
    #[error("{0}")]
    Error(String),
}
