//! One buffer slot's state.
//!
//! Life-state transitions:
//!
//! ```text
//! Empty ──load dispatched──► Reading ──content delivered──► ReadAll ──post-processing──► Open
//!   ▲                           │
//!   └──── cancelled / failed ───┘
//! ```
//!
//! A store runs orthogonally: an `Open` record with a [`Direction::Store`]
//! worker stays `Open` until the worker's completion is applied.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bitflags::bitflags;

use crate::engine::DocumentHandle;
use crate::paths;
use crate::worker::{Direction, Encoding, FileWorker, WorkerId};

/// Position-independent identity of a record, stable across reorders and compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u64);

impl std::fmt::Display for SlotId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "slot#{}", self.0)
	}
}

/// Readiness of a record's document content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifeState {
	/// Nothing loaded.
	#[default]
	Empty,
	/// A background load is in flight.
	Reading,
	/// Content arrived; post-processing pending until the buffer is activated.
	ReadAll,
	/// Ready.
	Open,
}

/// Caret and anchor, as byte offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
	pub anchor: usize,
	pub caret: usize,
}

impl Selection {
	pub const fn point(pos: usize) -> Self {
		Self { anchor: pos, caret: pos }
	}
}

/// Widget state captured when a buffer is deactivated and restored when it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
	pub selection: Selection,
	/// First visible line.
	pub scroll_line: usize,
	/// Contracted fold header lines, 0-based.
	pub folds: Vec<usize>,
	/// Bookmarked lines, 0-based.
	pub bookmarks: Vec<usize>,
}

bitflags! {
	/// Work postponed until the buffer is next activated.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct DeferredActions: u8 {
		/// A background save finished while the buffer was inactive.
		const FINISH_SAVE = 1 << 0;
	}
}

/// Full state of one buffer slot.
#[derive(Debug)]
pub struct BufferRecord {
	id: SlotId,
	document: Option<DocumentHandle>,
	path: Option<PathBuf>,
	/// Unsaved edits exist.
	pub dirty: bool,
	life: LifeState,
	worker: Option<FileWorker>,
	file_mod_time: Option<SystemTime>,
	/// Modification time the user was last asked about.
	pub(crate) file_mod_last_ask: Option<SystemTime>,
	pub view: ViewState,
	pub encoding: Encoding,
	deferred: DeferredActions,
}

impl BufferRecord {
	/// Creates an empty, untitled record.
	pub fn new(id: SlotId) -> Self {
		Self {
			id,
			document: None,
			path: None,
			dirty: false,
			life: LifeState::Empty,
			worker: None,
			file_mod_time: None,
			file_mod_last_ask: None,
			view: ViewState::default(),
			encoding: Encoding::default(),
			deferred: DeferredActions::empty(),
		}
	}

	pub fn id(&self) -> SlotId {
		self.id
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn set_path(&mut self, path: Option<PathBuf>) {
		self.path = path;
	}

	/// Returns true if this record holds `path`, compared the way the filesystem does.
	pub fn same_name_as(&self, path: &Path) -> bool {
		self.path.as_deref().is_some_and(|own| paths::same_name(own, path))
	}

	pub fn is_untitled(&self) -> bool {
		self.path.is_none()
	}

	pub fn document(&self) -> Option<DocumentHandle> {
		self.document
	}

	/// Installs `doc`, returning the handle it replaces.
	pub(crate) fn replace_document(&mut self, doc: Option<DocumentHandle>) -> Option<DocumentHandle> {
		std::mem::replace(&mut self.document, doc)
	}

	pub fn life_state(&self) -> LifeState {
		self.life
	}

	pub(crate) fn set_life_state(&mut self, life: LifeState) {
		tracing::trace!(slot = %self.id, from = ?self.life, to = ?life, "record.life_state");
		self.life = life;
	}

	/// Dirty, or not fully loaded.
	pub fn document_not_saved(&self) -> bool {
		self.dirty || self.life != LifeState::Open
	}

	pub fn worker(&self) -> Option<&FileWorker> {
		self.worker.as_ref()
	}

	pub fn worker_id(&self) -> Option<WorkerId> {
		self.worker.as_ref().map(FileWorker::id)
	}

	pub fn is_loading(&self) -> bool {
		self.worker.as_ref().is_some_and(FileWorker::is_loading)
	}

	/// A store worker is attached; its completion has not been applied yet.
	pub fn has_store_pending(&self) -> bool {
		self.worker.as_ref().is_some_and(|w| w.direction() == Direction::Store)
	}

	pub(crate) fn attach_worker(&mut self, worker: FileWorker) {
		debug_assert!(self.worker.is_none(), "record already owns a worker");
		self.worker = Some(worker);
	}

	pub(crate) fn take_worker(&mut self) -> Option<FileWorker> {
		self.worker.take()
	}

	/// Cancels an in-flight load and waits for the worker thread to stop.
	///
	/// Only acts while a load worker is attached. The record becomes `Empty`;
	/// the returned ID identifies the worker whose completion must be ignored.
	pub fn cancel_load(&mut self) -> Option<WorkerId> {
		if !self.is_loading() {
			return None;
		}
		let mut worker = self.worker.take()?;
		worker.cancel();
		worker.join();
		self.set_life_state(LifeState::Empty);
		tracing::debug!(slot = %self.id, worker = %worker.id(), "record.load_cancelled");
		Some(worker.id())
	}

	/// Marks loading complete and discards a finished load worker.
	pub fn complete_loading(&mut self) -> Option<WorkerId> {
		self.set_life_state(LifeState::Open);
		if self.is_loading() {
			return self.discard_worker();
		}
		None
	}

	/// Discards a finished store worker and records the file's new modification time.
	pub fn complete_storing(&mut self) -> Option<WorkerId> {
		let id = if self.has_store_pending() { self.discard_worker() } else { None };
		self.set_time_from_file();
		id
	}

	fn discard_worker(&mut self) -> Option<WorkerId> {
		let mut worker = self.worker.take()?;
		worker.join();
		Some(worker.id())
	}

	pub fn file_mod_time(&self) -> Option<SystemTime> {
		self.file_mod_time
	}

	pub(crate) fn restore_file_mod_time(&mut self, time: Option<SystemTime>, last_ask: Option<SystemTime>) {
		self.file_mod_time = time;
		self.file_mod_last_ask = last_ask;
	}

	/// Refreshes the last observed modification time from disk.
	pub fn set_time_from_file(&mut self) {
		self.file_mod_time = self.path.as_deref().and_then(paths::modified_time);
		self.file_mod_last_ask = self.file_mod_time;
	}

	pub fn deferred(&self) -> DeferredActions {
		self.deferred
	}

	pub(crate) fn add_deferred(&mut self, actions: DeferredActions) {
		self.deferred |= actions;
	}

	pub(crate) fn finish_deferred(&mut self, actions: DeferredActions) {
		self.deferred &= !actions;
	}
}

#[cfg(test)]
mod tests;
