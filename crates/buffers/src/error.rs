//! Error types for buffer, worker and session operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::Coordinator`] operations.
///
/// None of these are fatal: every failure leaves the table in a valid state
/// and the affected buffer in a well-defined life-state.
#[derive(Debug, Error)]
pub enum BufferError {
	/// The file could not be opened or read.
	#[error("could not open file '{}': {source}", path.display())]
	OpenFailed {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// The file exceeds the configured size limit and the user declined to open it.
	#[error("file '{}' is {size} bytes long, larger than the {limit} bytes limit", path.display())]
	TooLarge { path: PathBuf, size: u64, limit: u64 },

	/// A background load was cancelled before it completed.
	#[error("loading '{}' was cancelled", path.display())]
	LoadCancelled { path: PathBuf },

	/// The buffer has not been loaded entirely, so it cannot be saved yet.
	#[error("cannot save '{}' while it is still loading", path.display())]
	NotLoaded { path: PathBuf },

	/// A background save for the buffer is still in flight.
	#[error("'{}' is already being saved", path.display())]
	AlreadySaving { path: PathBuf },

	/// The buffer already runs a background job, so no new load may start.
	#[error("'{}' is busy with a background job", path.display())]
	AlreadyBusy { path: PathBuf },

	/// Another buffer already holds the target path.
	#[error("'{}' is already open in another buffer", path.display())]
	AlreadyOpen { path: PathBuf },

	/// Untitled buffers need an explicit target path.
	#[error("no file name; use save-as with a path")]
	Untitled,

	/// Writing the file failed.
	#[error("could not save file '{}': {source}", path.display())]
	SaveFailed {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// The file changed on disk since it was last read or written.
	#[error("'{}' has been modified on disk", path.display())]
	ConcurrentModification { path: PathBuf },

	/// The table is full and no slot could be freed.
	#[error("no free buffer slot")]
	SlotExhausted,

	/// The user cancelled a confirmation.
	#[error("cancelled")]
	Cancelled,

	/// The index does not address a visible buffer.
	#[error("no buffer at index {0}")]
	NoSuchBuffer(usize),

	/// Reading or writing a session failed.
	#[error(transparent)]
	Session(#[from] SessionError),
}

/// Errors reading or writing session files.
#[derive(Debug, Error)]
pub enum SessionError {
	/// The session file could not be read or written.
	#[error("I/O error on session file {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// A line is neither a comment, blank, nor `key=value`.
	#[error("malformed session line {line}: {text:?}")]
	Malformed { line: usize, text: String },
}

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// Error parsing TOML.
	#[error("TOML parse error in {}: {source}", path.display())]
	Toml {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// The buffer capacity must be at least one.
	#[error("buffers.capacity must be at least 1")]
	ZeroCapacity,
}

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;
