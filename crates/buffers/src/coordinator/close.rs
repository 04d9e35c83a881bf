use super::Coordinator;
use crate::engine::DocumentEngine;
use crate::error::{BufferError, Result};
use crate::prompt::{Decision, Prompter};

impl<E: DocumentEngine> Coordinator<E> {
	/// Closes the current buffer after offering to save unsaved changes.
	pub fn close(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		if self.save_if_unsure(false, prompter) == Decision::Cancel {
			return Err(BufferError::Cancelled);
		}
		self.close_current();
		Ok(())
	}

	/// Closes the current buffer without asking.
	///
	/// A pending load is cancelled. A buffer still being saved is parked
	/// until its store completes, with a fresh untitled buffer taking its
	/// place when it was the last visible one. Otherwise the last visible
	/// buffer is re-initialized instead of removed.
	pub(crate) fn close_current(&mut self) {
		let current = self.table.current();
		if let Some(stale) = self.table.current_record_mut().cancel_load() {
			self.workers.remove(&stale);
		}
		self.remember(current);
		let single_slot = self.table.capacity() == 1;
		if single_slot && self.table.current_record().has_store_pending() {
			// No room to park the only slot.
			self.wait_for_completion();
		}

		let closing_last = single_slot || (self.table.visible_len() == 1 && self.table.get(0).is_some_and(|r| r.worker().is_none()));
		if closing_last {
			self.reinit_slot(current);
		} else if self.table.current_record().has_store_pending() {
			tracing::debug!(index = current, "buffers.park");
			self.table.set_visible(current, false);
			if self.table.visible_len() == 0 {
				self.ensure_visible_slot();
			}
		} else {
			let removed = self.table.remove_current(self.config.buffers.zorder_switching);
			self.retire(removed);
		}
		tracing::debug!(current = self.table.current(), len = self.table.len(), visible = self.table.visible_len(), "buffers.closed");
		self.activate_current();
	}

	/// Adds an untitled buffer once every visible one has been parked.
	fn ensure_visible_slot(&mut self) {
		if self.table.is_full() {
			self.wait_for_parked();
		}
		if self.table.visible_len() > 0 {
			if self.table.current() >= self.table.visible_len() {
				self.table.set_current(0);
			}
			return;
		}
		if let Err(error) = self.add_slot() {
			tracing::error!(%error, "buffers.no_visible_slot");
		}
	}

	/// Offers to save every buffer, then closes all of them.
	///
	/// Buffers with pending saves stay parked until their stores complete.
	pub fn close_all(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		if self.save_all(false, prompter) == Decision::Cancel {
			return Err(BufferError::Cancelled);
		}
		while self.table.visible_len() > 1 {
			self.close_current();
		}
		self.close_current();
		Ok(())
	}

	/// Makes an empty untitled buffer current and returns its position.
	///
	/// The pristine initial buffer is reused. With a full table the current
	/// buffer is offered for saving and then replaced.
	pub fn new_buffer(&mut self, prompter: &mut dyn Prompter) -> Result<usize> {
		if !self.can_make_room(true, prompter) {
			return Err(BufferError::SlotExhausted);
		}
		if self.is_pristine() {
			self.reinit_slot(0);
			return Ok(0);
		}
		if self.table.is_full() {
			self.close_current();
			if self.table.len() == 1 {
				return Ok(0);
			}
			if self.table.is_full() {
				self.wait_for_parked();
			}
		}
		let index = self.add_slot()?;
		tracing::debug!(index, "buffers.new");
		Ok(index)
	}
}
