use super::{Coordinator, OpenFlags};
use crate::engine::DocumentEngine;
use crate::error::{BufferError, Result};
use crate::paths;
use crate::prompt::{Decision, Prompt, Prompter};
use crate::record::{DeferredActions, LifeState, ViewState};

impl<E: DocumentEngine> Coordinator<E> {
	/// Makes the visible buffer at `index` current and the most recently used.
	///
	/// Switching to a buffer that is still loading is allowed; a buffer whose
	/// content arrived while it was inactive is finished now.
	pub fn switch_to(&mut self, index: usize) -> Result<()> {
		if !self.table.is_visible(index) {
			return Err(BufferError::NoSuchBuffer(index));
		}
		self.set_document_at(index, true);
		Ok(())
	}

	pub(crate) fn set_document_at(&mut self, index: usize, update_stack: bool) {
		if index >= self.table.len() || index == self.table.current() {
			return;
		}
		self.table.set_current(index);
		if update_stack {
			self.table.move_to_stack_top(index);
		}
		tracing::trace!(index, update_stack, "buffers.switch");
		self.activate_current();
	}

	/// Shows the current document and runs work postponed while it was inactive.
	pub(crate) fn activate_current(&mut self) {
		let index = self.table.current();
		if let Some(doc) = self.table.current_record().document() {
			self.engine.set_active(doc);
		}
		self.perform_deferred_tasks();
		if self.table.current_record().life_state() == LifeState::ReadAll {
			self.complete_open(index);
		}
	}

	fn perform_deferred_tasks(&mut self) {
		let index = self.table.current();
		let record = self.table.current_record_mut();
		if record.deferred().contains(DeferredActions::FINISH_SAVE) {
			record.dirty = false;
			self.table.finish_deferred(index, DeferredActions::FINISH_SAVE);
		}
	}

	/// Records edits to the current buffer.
	pub fn mark_dirty(&mut self) {
		self.table.current_record_mut().dirty = true;
	}

	/// Stores the widget state of the current buffer.
	pub fn update_view(&mut self, view: ViewState) {
		self.table.current_record_mut().view = view;
	}

	/// Next visible tab, wrapping.
	pub fn next(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		let visible = self.table.visible_len();
		if visible == 0 {
			return Ok(());
		}
		self.set_document_at((self.table.current() + 1) % visible, true);
		self.check_reload(prompter)
	}

	/// Previous visible tab, wrapping.
	pub fn prev(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		let visible = self.table.visible_len();
		if visible == 0 {
			return Ok(());
		}
		let current = self.table.current();
		self.set_document_at(if current == 0 { visible - 1 } else { current - 1 }, true);
		self.check_reload(prompter)
	}

	/// Moves the tab at `from` to `to` and makes it current.
	pub fn shift_tab(&mut self, from: usize, to: usize) -> Result<()> {
		for index in [from, to] {
			if !self.table.is_visible(index) {
				return Err(BufferError::NoSuchBuffer(index));
			}
		}
		self.table.shift_to(from, to);
		self.table.move_to_stack_top(to);
		self.set_document_at(to, true);
		Ok(())
	}

	pub fn move_tab_right(&mut self) -> Result<()> {
		let visible = self.table.visible_len();
		if visible < 2 {
			return Ok(());
		}
		let from = self.table.current();
		self.shift_tab(from, (from + 1) % visible)
	}

	pub fn move_tab_left(&mut self) -> Result<()> {
		let visible = self.table.visible_len();
		if visible < 2 {
			return Ok(());
		}
		let from = self.table.current();
		self.shift_tab(from, if from == 0 { visible - 1 } else { from - 1 })
	}

	/// Steps one entry further back in MRU order without committing the order.
	pub fn next_in_stack(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		if let Some(index) = self.step_stack(true) {
			self.set_document_at(index, false);
		}
		self.check_reload(prompter)
	}

	/// Steps one entry towards the most recent in MRU order.
	pub fn prev_in_stack(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		if let Some(index) = self.step_stack(false) {
			self.set_document_at(index, false);
		}
		self.check_reload(prompter)
	}

	/// Commits the buffer reached by stacked tabbing as the most recently used.
	pub fn end_stacked_tabbing(&mut self) {
		self.table.commit_stack_selection();
	}

	/// Moves the MRU cursor to the next visible entry.
	fn step_stack(&mut self, forward: bool) -> Option<usize> {
		for _ in 0..self.table.len() {
			let index = if forward { self.table.stack_next() } else { self.table.stack_prev() };
			if self.table.is_visible(index) {
				return Some(index);
			}
		}
		None
	}

	/// Reacts to the current file changing on disk since it was last read or written.
	///
	/// Only active with `load_on_activate`. A changed file is reloaded,
	/// asking first when the buffer is dirty or `are_you_sure_on_reload` is
	/// set; each on-disk version is asked about once. A vanished file asks
	/// whether to keep the buffer and closes it otherwise.
	pub fn check_reload(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		if !self.config.io.load_on_activate {
			return Ok(());
		}
		let record = self.table.current_record();
		let Some(path) = record.path().map(|p| p.to_path_buf()) else {
			return Ok(());
		};
		if record.worker().is_some() {
			return Ok(());
		}
		let on_disk = paths::modified_time(&path);
		if on_disk == record.file_mod_time() {
			return Ok(());
		}

		let Some(on_disk) = on_disk else {
			self.table.current_record_mut().set_time_from_file();
			if prompter.ask(&Prompt::KeepMissing { path }) == Decision::No {
				self.close_current();
			}
			return Ok(());
		};

		let dirty = record.dirty;
		if !dirty && !self.config.io.are_you_sure_on_reload {
			tracing::debug!(path = %path.display(), "buffers.reload");
			return self.open(&path, OpenFlags::FORCE_LOAD, prompter).map(drop);
		}
		if record.file_mod_last_ask == Some(on_disk) {
			return Ok(());
		}
		let slot = record.id();
		let decision = prompter.ask(&Prompt::Reload { path: path.clone(), dirty });
		if decision == Decision::Yes {
			self.open(&path, OpenFlags::FORCE_LOAD, prompter)?;
		}
		if let Some(index) = self.table.position_of(slot)
			&& let Some(record) = self.table.get_mut(index)
		{
			record.file_mod_last_ask = Some(on_disk);
		}
		Ok(())
	}
}
