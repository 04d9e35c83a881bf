//! Bounded most-recently-closed file list.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::record::Selection;

/// A file remembered after its buffer went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentFile {
	pub path: PathBuf,
	pub selection: Selection,
	pub scroll_line: usize,
}

impl RecentFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			selection: Selection::default(),
			scroll_line: 0,
		}
	}
}

/// Most recent first; at most `capacity` entries, unique by file name.
#[derive(Debug, Clone)]
pub struct RecentFiles {
	entries: VecDeque<RecentFile>,
	capacity: usize,
}

impl RecentFiles {
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: VecDeque::with_capacity(capacity),
			capacity,
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&RecentFile> {
		self.entries.get(index)
	}

	pub fn iter(&self) -> impl DoubleEndedIterator<Item = &RecentFile> {
		self.entries.iter()
	}

	pub fn contains(&self, path: &Path) -> bool {
		self.position(path).is_some()
	}

	fn position(&self, path: &Path) -> Option<usize> {
		self.entries.iter().position(|e| crate::paths::same_name(&e.path, path))
	}

	/// Pushes `file` to the front, dropping an older entry for the same name or the oldest entry.
	pub fn add(&mut self, file: RecentFile) {
		if self.capacity == 0 {
			return;
		}
		if let Some(pos) = self.position(&file.path) {
			self.entries.remove(pos);
		}
		self.entries.push_front(file);
		self.entries.truncate(self.capacity);
	}

	pub fn remove(&mut self, path: &Path) -> Option<RecentFile> {
		let pos = self.position(path)?;
		self.entries.remove(pos)
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
