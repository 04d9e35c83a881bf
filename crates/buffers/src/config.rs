//! Buffer and I/O policy.
//!
//! [`Config`] is an explicit value owned by the [`crate::Coordinator`]; table
//! operations receive the parts they need as arguments. Files are TOML:
//!
//! ```toml
//! [buffers]
//! capacity = 20
//! new_position = "after-current"
//!
//! [io]
//! background_open_size = 1048576
//! background_save_size = 1048576
//!
//! [session]
//! bookmarks = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Default number of buffer slots.
pub const DEFAULT_CAPACITY: usize = 20;

/// Upper bound on buffer slots.
pub const MAX_CAPACITY: usize = 100;

/// Default worker chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Default length of the recent-files list.
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// Where [`crate::BufferTable::add`] places a new slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewBufferPosition {
	/// After the last visible tab.
	#[default]
	Append,
	/// Directly after the current tab.
	AfterCurrent,
	/// Before every other tab.
	Front,
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub buffers: BufferConfig,
	pub io: IoConfig,
	pub session: SessionConfig,
}

/// Table shape and ordering policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
	/// Number of slots, clamped to `1..=MAX_CAPACITY`.
	pub capacity: usize,
	pub new_position: NewBufferPosition,
	/// After closing a tab, activate the most recently used one instead of a neighbour.
	pub zorder_switching: bool,
}

impl Default for BufferConfig {
	fn default() -> Self {
		Self {
			capacity: DEFAULT_CAPACITY,
			new_position: NewBufferPosition::Append,
			zorder_switching: false,
		}
	}
}

/// File I/O thresholds and confirmation policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IoConfig {
	/// Files strictly larger than this load in the background. `None` loads everything inline.
	pub background_open_size: Option<u64>,
	/// Documents strictly larger than this save in the background. `None` saves everything inline.
	pub background_save_size: Option<u64>,
	/// Files larger than this require confirmation before opening.
	pub max_file_size: Option<u64>,
	pub chunk_size: usize,
	/// Delay after every chunk processed by a worker.
	pub worker_sleep_ms: u64,
	/// Ask before overwriting a file whose modification time changed.
	pub check_modified_time: bool,
	/// Reload files modified on disk when their buffer is activated.
	pub load_on_activate: bool,
	/// Ask before discarding changes on close.
	pub are_you_sure: bool,
	/// Ask before reloading a clean buffer modified on disk.
	pub are_you_sure_on_reload: bool,
}

impl Default for IoConfig {
	fn default() -> Self {
		Self {
			background_open_size: None,
			background_save_size: None,
			max_file_size: None,
			chunk_size: DEFAULT_CHUNK_SIZE,
			worker_sleep_ms: 0,
			check_modified_time: false,
			load_on_activate: false,
			are_you_sure: true,
			are_you_sure_on_reload: false,
		}
	}
}

/// What sessions persist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
	pub bookmarks: bool,
	pub folds: bool,
	pub save_recent: bool,
	pub recent_capacity: usize,
	/// Close every buffer before restoring a session.
	pub close_buffers_on_load: bool,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			bookmarks: true,
			folds: true,
			save_recent: true,
			recent_capacity: DEFAULT_RECENT_CAPACITY,
			close_buffers_on_load: true,
		}
	}
}

impl Config {
	/// Parses a configuration from TOML text. `origin` is only used in errors.
	pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text).map_err(|source| ConfigError::Toml {
			path: origin.to_path_buf(),
			source,
		})?;
		config.validated()
	}

	/// Loads a configuration file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_toml(&text, path)?;
		tracing::debug!(path = %path.display(), capacity = config.buffers.capacity, "config.loaded");
		Ok(config)
	}

	/// Loads the user configuration if present, otherwise defaults.
	pub fn load_default() -> Result<Self, ConfigError> {
		match default_config_path() {
			Some(path) if path.exists() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	fn validated(mut self) -> Result<Self, ConfigError> {
		if self.buffers.capacity == 0 {
			return Err(ConfigError::ZeroCapacity);
		}
		self.buffers.capacity = self.buffers.capacity.min(MAX_CAPACITY);
		self.io.chunk_size = self.io.chunk_size.max(1);
		Ok(self)
	}

	/// Returns true when a file of `size` bytes loads in the background.
	pub fn loads_in_background(&self, size: u64) -> bool {
		self.io.background_open_size.is_some_and(|limit| size > limit)
	}

	/// Returns true when a document of `len` bytes saves in the background.
	pub fn saves_in_background(&self, len: u64) -> bool {
		self.io.background_save_size.is_some_and(|limit| len > limit)
	}
}

/// `<config dir>/tabula/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("tabula").join("config.toml"))
}

/// `<data dir>/tabula/tabula.session`.
pub fn default_session_path() -> Option<PathBuf> {
	dirs::data_dir().map(|dir| dir.join("tabula").join("tabula.session"))
}
