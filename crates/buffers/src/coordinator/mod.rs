//! Buffer lifecycle coordination.
//!
//! [`Coordinator`] is the only mutator of the [`BufferTable`]. It sequences
//! open, save, close and switch requests, decides between inline and
//! background I/O, and applies worker completions on the main context.
//!
//! Workers report on a single channel. Ownership of an event is resolved
//! through the `WorkerId -> SlotId` map and then by slot identity, never by a
//! position cached when the worker was spawned: tabs may be reordered, closed
//! or parked while a job runs.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::engine::{DocumentEngine, DocumentHandle};
use crate::error::Result;
use crate::notice::{Notice, NoticeCenter};
use crate::progress::BackgroundActivities;
use crate::record::{BufferRecord, LifeState, SlotId};
use crate::session::{RecentFile, RecentFiles};
use crate::table::BufferTable;
use crate::worker::{self, EventReceiver, EventSender, WorkerId, WorkerIdClock};

mod close;
mod completion;
mod open;
mod save;
mod session;
mod switch;

pub use open::OpenFlags;

/// Owns the buffer table, the document engine and all in-flight workers.
pub struct Coordinator<E: DocumentEngine> {
	config: Config,
	table: BufferTable,
	engine: E,
	events_tx: EventSender,
	events_rx: EventReceiver,
	workers: FxHashMap<WorkerId, SlotId>,
	worker_ids: WorkerIdClock,
	recent: RecentFiles,
	notices: NoticeCenter,
}

impl<E: DocumentEngine> Coordinator<E> {
	/// Creates a coordinator with one empty untitled buffer.
	pub fn new(config: Config, mut engine: E) -> Self {
		let mut table = BufferTable::allocate(config.buffers.capacity);
		let doc = engine.create_document();
		let first = table.current_record_mut();
		first.replace_document(Some(doc));
		first.set_life_state(LifeState::Open);
		engine.set_active(doc);

		let (events_tx, events_rx) = worker::channel();
		let recent = RecentFiles::new(config.session.recent_capacity);
		tracing::debug!(capacity = table.capacity(), "coordinator.new");
		Self {
			config,
			table,
			engine,
			events_tx,
			events_rx,
			workers: FxHashMap::default(),
			worker_ids: WorkerIdClock::new(),
			recent,
			notices: NoticeCenter::new(),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn table(&self) -> &BufferTable {
		&self.table
	}

	pub fn engine(&self) -> &E {
		&self.engine
	}

	pub fn engine_mut(&mut self) -> &mut E {
		&mut self.engine
	}

	pub fn recent(&self) -> &RecentFiles {
		&self.recent
	}

	pub fn notices(&self) -> &NoticeCenter {
		&self.notices
	}

	pub fn take_notices(&mut self) -> Vec<Notice> {
		self.notices.take_pending()
	}

	pub fn current(&self) -> usize {
		self.table.current()
	}

	pub fn current_record(&self) -> &BufferRecord {
		self.table.current_record()
	}

	/// Document shown for the current buffer.
	pub fn current_document(&self) -> Option<DocumentHandle> {
		self.table.current_record().document()
	}

	/// Number of workers whose completion has not been applied yet.
	pub fn pending_workers(&self) -> usize {
		self.workers.len()
	}

	pub fn background_activities(&self) -> BackgroundActivities {
		self.table.count_background_activities()
	}

	pub fn saving_in_background(&self) -> bool {
		self.table.saving_in_background()
	}

	fn worker_sleep(&self) -> Duration {
		Duration::from_millis(self.config.io.worker_sleep_ms)
	}

	/// Adds a visible slot with a fresh document and makes it current.
	fn add_slot(&mut self) -> Result<usize> {
		let index = self.table.add(self.config.buffers.new_position)?;
		let doc = self.engine.create_document();
		if let Some(record) = self.table.get_mut(index) {
			record.replace_document(Some(doc));
		}
		self.table.set_current(index);
		self.engine.set_active(doc);
		Ok(index)
	}

	/// Only the initial untitled, unmodified buffer exists.
	fn is_pristine(&self) -> bool {
		let first = self.table.current_record();
		self.table.len() == 1 && self.table.current() == 0 && !first.dirty && first.is_untitled() && first.worker().is_none()
	}

	/// Replaces the record at `index` with a pristine untitled one, recycling its document.
	fn reinit_slot(&mut self, index: usize) {
		let mut old = self.table.reset_slot(index);
		if let Some(worker) = old.take_worker() {
			self.workers.remove(&worker.id());
		}
		let doc = match old.replace_document(None) {
			Some(doc) => doc,
			None => self.engine.create_document(),
		};
		self.engine.clear(doc);
		if let Some(record) = self.table.get_mut(index) {
			record.replace_document(Some(doc));
			record.set_life_state(LifeState::Open);
		}
		if index == self.table.current() {
			self.engine.set_active(doc);
		}
	}

	/// Drops a record that left the table, releasing its document.
	fn retire(&mut self, mut record: BufferRecord) {
		if let Some(worker) = record.take_worker() {
			self.workers.remove(&worker.id());
		}
		if let Some(doc) = record.replace_document(None) {
			self.engine.release(doc);
		}
		tracing::trace!(slot = %record.id(), "coordinator.retire");
	}

	/// Pushes the buffer at `index` onto the recent-files list when it is titled.
	fn remember(&mut self, index: usize) {
		let Some(record) = self.table.get(index) else {
			return;
		};
		if let Some(path) = record.path() {
			self.recent.add(RecentFile {
				path: path.to_path_buf(),
				selection: record.view.selection,
				scroll_line: record.view.scroll_line,
			});
		}
	}
}

impl<E: DocumentEngine> Drop for Coordinator<E> {
	fn drop(&mut self) {
		if !self.workers.is_empty() {
			tracing::debug!(pending = self.workers.len(), "coordinator.drop_waits_for_workers");
			self.wait_for_completion();
		}
	}
}

impl<E: DocumentEngine + std::fmt::Debug> std::fmt::Debug for Coordinator<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Coordinator")
			.field("table", &self.table)
			.field("engine", &self.engine)
			.field("workers", &self.workers)
			.finish_non_exhaustive()
	}
}
