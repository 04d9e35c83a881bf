//! User-visible notices raised by background completions and I/O failures.
//!
//! The coordinator only queues notices; presentation is up to the embedding
//! front end, which drains them with [`NoticeCenter::take_pending`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
	#[default]
	Info,
	Warn,
	Error,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
	/// A file could not be opened or read.
	CouldNotOpen,
	/// A file could not be written.
	CouldNotSave,
	/// A background save completed for a buffer that no longer exists.
	BufferNotFound,
	/// A save was refused because the buffer is still loading.
	NotLoadedYet,
	/// A save was refused because one is already running.
	AlreadySaving,
	/// A load could not start because the buffer is busy.
	Busy,
	/// A save-as target is held by another buffer.
	AlreadyOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub level: Level,
	pub kind: NoticeKind,
	pub path: Option<PathBuf>,
	pub message: String,
}

impl Notice {
	pub fn new(level: Level, kind: NoticeKind, path: Option<&Path>, message: impl Into<String>) -> Self {
		Self {
			level,
			kind,
			path: path.map(Path::to_path_buf),
			message: message.into(),
		}
	}

	pub(crate) fn could_not_open(path: &Path, reason: impl std::fmt::Display) -> Self {
		Self::new(
			Level::Warn,
			NoticeKind::CouldNotOpen,
			Some(path),
			format!("Could not open file '{}': {reason}", path.display()),
		)
	}

	pub(crate) fn could_not_save(path: &Path, reason: impl std::fmt::Display) -> Self {
		Self::new(
			Level::Error,
			NoticeKind::CouldNotSave,
			Some(path),
			format!("Could not save file '{}': {reason}", path.display()),
		)
	}
}

/// FIFO of notices awaiting presentation.
#[derive(Debug, Default)]
pub struct NoticeCenter {
	pending: VecDeque<Notice>,
}

impl NoticeCenter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn push(&mut self, notice: Notice) {
		match notice.level {
			Level::Error => tracing::error!(kind = ?notice.kind, message = %notice.message, "notice"),
			Level::Warn => tracing::warn!(kind = ?notice.kind, message = %notice.message, "notice"),
			Level::Info => tracing::info!(kind = ?notice.kind, message = %notice.message, "notice"),
		}
		self.pending.push_back(notice);
	}

	pub fn take_pending(&mut self) -> Vec<Notice> {
		self.pending.drain(..).collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Notice> {
		self.pending.iter()
	}

	pub fn clear(&mut self) {
		self.pending.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn take_pending_drains_in_order() {
		let mut center = NoticeCenter::new();
		center.push(Notice::could_not_open(Path::new("/a"), "gone"));
		center.push(Notice::could_not_save(Path::new("/b"), "full"));
		assert_eq!(center.len(), 2);

		let notices = center.take_pending();
		assert_eq!(notices[0].kind, NoticeKind::CouldNotOpen);
		assert_eq!(notices[0].message, "Could not open file '/a': gone");
		assert_eq!(notices[1].level, Level::Error);
		assert!(center.is_empty());
	}
}
