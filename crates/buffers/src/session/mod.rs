//! Session persistence.
//!
//! A session is an ordered set of `key=value` records. Buffer indices and
//! line numbers are 1-based on disk; positions are stored as caret + 1.
//!
//! ```text
//! # session file
//!
//! mru.1.path=/home/u/old.txt
//! mru.2.path=/home/u/newer.txt
//!
//! buffer.1.path=/home/u/a.rs
//! buffer.1.position=120
//! buffer.1.current=1
//! buffer.1.bookmarks=3,17
//! buffer.1.folds=40
//! ```
//!
//! Recent files are written oldest first so replaying them through
//! [`RecentFiles::add`] restores the original order.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::config::SessionConfig;
use crate::error::SessionError;

mod recent;

pub use recent::{RecentFile, RecentFiles};

/// First line of every session file.
pub const SESSION_HEADER: &str = "# session file";

/// Ordered key/value records of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStore {
	records: IndexMap<String, String>,
}

impl SessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.records.get(key).map(String::as_str)
	}

	/// Inserts or replaces `key`, keeping its original position when replaced.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.records.insert(key.into(), value.into());
	}

	pub fn remove(&mut self, key: &str) -> Option<String> {
		self.records.shift_remove(key)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.records.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Parses `key=value` lines; blank lines and `#` comments are skipped.
	pub fn parse(text: &str) -> Result<Self, SessionError> {
		let mut store = Self::new();
		for (number, line) in text.lines().enumerate() {
			let line = line.trim();
			if line.is_empty() || line.starts_with('#') {
				continue;
			}
			let Some((key, value)) = line.split_once('=') else {
				return Err(SessionError::Malformed {
					line: number + 1,
					text: line.to_string(),
				});
			};
			store.set(key.trim(), value.trim());
		}
		Ok(store)
	}

	/// Renders the header and all records, separating record groups with blank lines.
	pub fn render(&self) -> String {
		let mut out = String::from(SESSION_HEADER);
		out.push('\n');
		let mut previous_group = None;
		for (key, value) in self.iter() {
			let group = record_group(key);
			if previous_group != Some(group) {
				out.push('\n');
				previous_group = Some(group);
			}
			out.push_str(key);
			out.push('=');
			out.push_str(value);
			out.push('\n');
		}
		out
	}

	pub fn read_file(path: &Path) -> Result<Self, SessionError> {
		let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let store = Self::parse(&text)?;
		tracing::debug!(path = %path.display(), records = store.len(), "session.read");
		Ok(store)
	}

	/// Writes the session, creating missing parent directories.
	pub fn write_file(&self, path: &Path) -> Result<(), SessionError> {
		let io_err = |source| SessionError::Io {
			path: path.to_path_buf(),
			source,
		};
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent).map_err(io_err)?;
		}
		std::fs::write(path, self.render()).map_err(io_err)?;
		tracing::debug!(path = %path.display(), records = self.len(), "session.written");
		Ok(())
	}
}

/// `buffer.N` for buffer keys, the first segment otherwise.
fn record_group(key: &str) -> &str {
	if key.starts_with("buffer.")
		&& let Some((end, _)) = key.match_indices('.').nth(1)
	{
		return &key[..end];
	}
	key.split('.').next().unwrap_or(key)
}

/// Persisted state of one open buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferState {
	pub path: PathBuf,
	/// Caret byte offset, 0-based.
	pub caret: usize,
	/// Bookmarked lines, 0-based.
	pub bookmarks: Vec<usize>,
	/// Contracted fold lines, 0-based.
	pub folds: Vec<usize>,
	pub is_active: bool,
}

impl BufferState {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			..Self::default()
		}
	}
}

/// Structured view of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
	/// Titled buffers in tab order.
	pub buffers: Vec<BufferState>,
	/// Recent files, most recent first.
	pub recent: Vec<PathBuf>,
}

impl Session {
	pub fn active(&self) -> Option<&BufferState> {
		self.buffers.iter().find(|b| b.is_active)
	}

	/// Encodes the session as records, honouring what `options` persists.
	pub fn to_store(&self, options: &SessionConfig) -> SessionStore {
		let mut store = SessionStore::new();
		if options.save_recent {
			for (n, path) in self.recent.iter().rev().enumerate() {
				store.set(format!("mru.{}.path", n + 1), path.display().to_string());
			}
		}
		for (n, buffer) in self.buffers.iter().enumerate() {
			let key = |field: &str| format!("buffer.{}.{field}", n + 1);
			store.set(key("path"), buffer.path.display().to_string());
			store.set(key("position"), (buffer.caret + 1).to_string());
			if buffer.is_active {
				store.set(key("current"), "1");
			}
			if options.bookmarks && !buffer.bookmarks.is_empty() {
				store.set(key("bookmarks"), join_lines(&buffer.bookmarks));
			}
			if options.folds && !buffer.folds.is_empty() {
				store.set(key("folds"), join_lines(&buffer.folds));
			}
		}
		store
	}

	/// Decodes records. Buffers are ordered by their index, gaps are skipped.
	pub fn from_store(store: &SessionStore, options: &SessionConfig) -> Self {
		let mut buffer_indices = indexed_keys(store, "buffer", "path");
		buffer_indices.sort_unstable();
		let buffers = buffer_indices
			.into_iter()
			.filter_map(|n| {
				let field = |name: &str| store.get(&format!("buffer.{n}.{name}"));
				let path = field("path").filter(|p| !p.is_empty())?;
				let position = field("position").and_then(|v| v.parse::<usize>().ok()).unwrap_or(0);
				Some(BufferState {
					path: PathBuf::from(path),
					caret: position.saturating_sub(1),
					bookmarks: if options.bookmarks { field("bookmarks").map(split_lines).unwrap_or_default() } else { Vec::new() },
					folds: if options.folds { field("folds").map(split_lines).unwrap_or_default() } else { Vec::new() },
					is_active: field("current").and_then(|v| v.parse::<u8>().ok()).is_some_and(|v| v != 0),
				})
			})
			.collect();

		let mut mru_indices = indexed_keys(store, "mru", "path");
		mru_indices.sort_unstable();
		let recent = mru_indices
			.into_iter()
			.rev()
			.filter_map(|n| store.get(&format!("mru.{n}.path")).filter(|p| !p.is_empty()).map(PathBuf::from))
			.collect();

		Self { buffers, recent }
	}
}

/// Indices `n` of keys shaped `{prefix}.{n}.{field}`.
fn indexed_keys(store: &SessionStore, prefix: &str, field: &str) -> Vec<usize> {
	store
		.iter()
		.filter_map(|(key, _)| {
			let rest = key.strip_prefix(prefix)?.strip_prefix('.')?;
			let (n, f) = rest.split_once('.')?;
			(f == field).then(|| n.parse().ok()).flatten()
		})
		.collect()
}

fn join_lines(lines: &[usize]) -> String {
	lines.iter().map(|l| (l + 1).to_string()).collect::<Vec<_>>().join(",")
}

fn split_lines(value: &str) -> Vec<usize> {
	value
		.split(',')
		.filter_map(|s| s.trim().parse::<usize>().ok())
		.filter_map(|l| l.checked_sub(1))
		.collect()
}

#[cfg(test)]
mod tests;
