use std::path::Path;

use super::{Coordinator, OpenFlags};
use crate::engine::DocumentEngine;
use crate::error::Result;
use crate::notice::Notice;
use crate::paths;
use crate::prompt::Prompter;
use crate::record::Selection;
use crate::session::{BufferState, RecentFile, Session, SessionStore};

impl<E: DocumentEngine> Coordinator<E> {
	/// Captures the titled visible buffers and the recent-files list.
	///
	/// Untitled and parked buffers are not part of a session.
	pub fn save_session(&self) -> Session {
		let current = self.table.current();
		let buffers = self
			.table
			.visible_records()
			.enumerate()
			.filter_map(|(index, record)| {
				let path = record.path()?;
				Some(BufferState {
					path: path.to_path_buf(),
					caret: record.view.selection.caret,
					bookmarks: record.view.bookmarks.clone(),
					folds: record.view.folds.clone(),
					is_active: index == current,
				})
			})
			.collect();
		let recent = self.recent.iter().map(|f| f.path.clone()).collect();
		Session { buffers, recent }
	}

	/// Reopens the buffers of `session` and restores carets, bookmarks and folds.
	///
	/// Existing buffers are closed first when `close_buffers_on_load` is set.
	/// Files that no longer exist are skipped; failures to open one file do
	/// not stop the others.
	pub fn restore_session(&mut self, session: &Session, prompter: &mut dyn Prompter) -> Result<()> {
		if self.config.session.close_buffers_on_load {
			self.close_all(prompter)?;
		}
		for path in session.recent.iter().rev() {
			self.recent.add(RecentFile::new(path.clone()));
		}

		for state in &session.buffers {
			if !state.path.exists() {
				tracing::debug!(path = %state.path.display(), "session.skip_missing");
				continue;
			}
			let index = match self.open(&state.path, OpenFlags::FORCE_LOAD, prompter) {
				Ok(index) => index,
				Err(error) => {
					tracing::warn!(path = %state.path.display(), %error, "session.open_failed");
					continue;
				}
			};
			if let Some(record) = self.table.get_mut(index) {
				record.view.selection = Selection::point(state.caret);
				record.view.scroll_line = 0;
				record.view.bookmarks = state.bookmarks.clone();
				record.view.folds = state.folds.clone();
			}
		}

		if let Some(active) = session.active()
			&& let Ok(path) = paths::absolute(&active.path)
			&& let Some(index) = self.table.find_by_path(&path, false)
		{
			self.switch_to(index)?;
		}
		tracing::debug!(buffers = session.buffers.len(), "session.restored");
		Ok(())
	}

	/// The current session encoded as records.
	pub fn session_store(&self) -> SessionStore {
		self.save_session().to_store(&self.config.session)
	}

	pub fn save_session_file(&self, path: &Path) -> Result<()> {
		self.session_store().write_file(path)?;
		Ok(())
	}

	/// Reads a session file and restores it.
	pub fn load_session_file(&mut self, path: &Path, prompter: &mut dyn Prompter) -> Result<()> {
		let store = match SessionStore::read_file(path) {
			Ok(store) => store,
			Err(error) => {
				self.notices.push(Notice::could_not_open(path, &error));
				return Err(error.into());
			}
		};
		let session = Session::from_store(&store, &self.config.session);
		self.restore_session(&session, prompter)
	}
}
