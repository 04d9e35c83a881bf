use tokio::sync::mpsc::error::TryRecvError;

use super::Coordinator;
use crate::engine::DocumentEngine;
use crate::notice::{Level, Notice, NoticeKind};
use crate::record::{DeferredActions, LifeState};
use crate::worker::{Direction, WorkerEvent, WorkerOutcome};

impl<E: DocumentEngine> Coordinator<E> {
	/// Applies every completion already delivered, without blocking.
	///
	/// Returns the number of events that still had an owner.
	pub fn process_completions(&mut self) -> usize {
		let mut applied = 0;
		loop {
			match self.events_rx.try_recv() {
				Ok(event) => applied += usize::from(self.apply_event(event)),
				Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
			}
		}
		applied
	}

	/// Blocks until every in-flight worker has completed and its event is applied.
	pub fn wait_for_completion(&mut self) {
		while !self.workers.is_empty() {
			let Some(event) = self.events_rx.blocking_recv() else {
				break;
			};
			self.apply_event(event);
		}
	}

	/// Blocks until no parked buffer remains.
	pub(crate) fn wait_for_parked(&mut self) {
		while self.table.len() > self.table.visible_len() && !self.workers.is_empty() {
			let Some(event) = self.events_rx.blocking_recv() else {
				break;
			};
			self.apply_event(event);
		}
	}

	fn apply_event(&mut self, event: WorkerEvent) -> bool {
		let WorkerEvent { id, outcome } = event;
		let Some(slot) = self.workers.remove(&id) else {
			tracing::trace!(worker = %id, "buffers.stale_event");
			return false;
		};
		let Some(index) = self.table.position_of(slot) else {
			tracing::warn!(worker = %id, %slot, "buffers.owner_gone");
			self.notices.push(Notice::new(
				Level::Warn,
				NoticeKind::BufferNotFound,
				None,
				format!("Could not find the buffer of {id}."),
			));
			return false;
		};
		let visible = self.table.is_visible(index);
		let is_current = index == self.table.current();
		let Some(record) = self.table.get_mut(index) else {
			return false;
		};
		let Some(mut worker) = record.take_worker() else {
			return false;
		};
		worker.join();
		let direction = worker.direction();
		let path = worker.path().to_path_buf();
		tracing::debug!(worker = %id, index, ?direction, "buffers.completion");

		match (direction, outcome) {
			(_, WorkerOutcome::Loaded { text, encoding }) => {
				record.encoding = encoding;
				let doc = self.engine.create_document();
				self.engine.append_decoded_text(doc, &text);
				if let Some(old) = record.replace_document(Some(doc)) {
					self.engine.release(old);
				}
				record.set_life_state(LifeState::ReadAll);
				if is_current {
					self.engine.set_active(doc);
					self.complete_open(index);
				}
			}
			(Direction::Load, WorkerOutcome::Cancelled) => {
				record.set_life_state(LifeState::Empty);
			}
			(Direction::Load, WorkerOutcome::Failed(error)) => {
				record.set_life_state(LifeState::Empty);
				self.notices.push(Notice::could_not_open(&path, &error));
			}
			(Direction::Store, WorkerOutcome::Stored) => {
				record.complete_storing();
				if !visible {
					if let Some(removed) = self.table.remove_invisible(index) {
						self.retire(removed);
					}
				} else if is_current {
					record.dirty = false;
				} else {
					self.table.add_deferred(index, DeferredActions::FINISH_SAVE);
				}
			}
			(Direction::Store, WorkerOutcome::Failed(error)) => {
				record.complete_storing();
				self.table.set_visible(index, true);
				self.notices.push(Notice::could_not_save(&path, &error));
			}
			(direction, outcome) => {
				tracing::warn!(worker = %id, ?direction, ?outcome, path = %path.display(), "buffers.unexpected_outcome");
			}
		}
		true
	}
}
