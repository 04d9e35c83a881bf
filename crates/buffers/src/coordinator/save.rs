use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::Coordinator;
use crate::engine::DocumentEngine;
use crate::error::{BufferError, Result};
use crate::notice::{Level, Notice, NoticeKind};
use crate::paths;
use crate::prompt::{Decision, Prompt, Prompter};
use crate::record::{LifeState, SlotId};
use crate::worker::{self, BomEncoder, FileWorker, StoreRequest};

impl<E: DocumentEngine> Coordinator<E> {
	/// Saves the current buffer to its own path.
	///
	/// Fails without side effects while the buffer is still loading or
	/// already saving. Documents larger than the background threshold are
	/// written by a worker from a snapshot taken now; edits made while it runs
	/// are not part of the written file.
	pub fn save(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
		let path = self.check_saveable()?;
		if self.config.io.check_modified_time {
			let record = self.table.current_record();
			if let (Some(on_disk), Some(known)) = (paths::modified_time(&path), record.file_mod_time())
				&& on_disk != known
			{
				let prompt = Prompt::OverwriteModified { path: path.clone() };
				if prompter.ask(&prompt) != Decision::Yes {
					return Err(BufferError::ConcurrentModification { path });
				}
			}
		}
		self.save_buffer(self.table.current(), path)
	}

	/// Saves the current buffer under a new name, which it keeps afterwards.
	pub fn save_as(&mut self, path: &Path, prompter: &mut dyn Prompter) -> Result<()> {
		let target = paths::absolute(path).map_err(|source| BufferError::SaveFailed {
			path: path.to_path_buf(),
			source,
		})?;
		if !self.table.current_record().is_untitled() {
			self.check_saveable()?;
		} else if self.table.current_record().worker().is_some() {
			return Err(BufferError::AlreadyBusy { path: target });
		}
		if let Some(other) = self.table.find_by_path(&target, true) {
			tracing::debug!(path = %target.display(), other, "buffers.save_as_already_open");
			self.notices.push(Notice::new(
				Level::Warn,
				NoticeKind::AlreadyOpen,
				Some(&target),
				format!("File '{}' is already open in another buffer.", target.display()),
			));
			return Err(BufferError::AlreadyOpen { path: target });
		}

		let record = self.table.current_record_mut();
		let previous = (record.path().map(Path::to_path_buf), record.file_mod_time(), record.file_mod_last_ask);
		record.set_path(Some(target.clone()));
		record.set_time_from_file();
		record.set_life_state(LifeState::Open);
		tracing::debug!(path = %target.display(), "buffers.save_as");
		match self.save(prompter) {
			Ok(()) => {
				self.recent.remove(&target);
				Ok(())
			}
			Err(error) => {
				let (path, time, last_ask) = previous;
				let record = self.table.current_record_mut();
				record.set_path(path);
				record.restore_file_mod_time(time, last_ask);
				Err(error)
			}
		}
	}

	/// Path of the current buffer if it may be saved right now.
	fn check_saveable(&self) -> Result<PathBuf> {
		let record = self.table.current_record();
		let Some(path) = record.path() else {
			return Err(BufferError::Untitled);
		};
		if record.life_state() != LifeState::Open {
			return Err(BufferError::NotLoaded { path: path.to_path_buf() });
		}
		if record.worker().is_some() {
			return Err(BufferError::AlreadySaving { path: path.to_path_buf() });
		}
		Ok(path.to_path_buf())
	}

	fn save_buffer(&mut self, index: usize, path: PathBuf) -> Result<()> {
		let sleep = self.worker_sleep();
		let Some(record) = self.table.get_mut(index) else {
			return Err(BufferError::NoSuchBuffer(index));
		};
		let Some(doc) = record.document() else {
			return Err(BufferError::NoSuchBuffer(index));
		};
		let snapshot = self.engine.snapshot(doc);
		let background = self.config.saves_in_background(snapshot.len() as u64);
		let file = match File::create(&path) {
			Ok(file) => file,
			Err(source) => {
				self.notices.push(Notice::could_not_save(&path, &source));
				return Err(BufferError::SaveFailed { path, source });
			}
		};
		tracing::debug!(index, path = %path.display(), len = snapshot.len(), background, "buffers.save");

		if background {
			let id = self.worker_ids.next();
			let request = StoreRequest {
				id,
				path: path.clone(),
				file,
				snapshot,
				encoder: Box::new(BomEncoder::new(record.encoding)),
				chunk_size: self.config.io.chunk_size,
				sleep,
			};
			let storer = FileWorker::spawn_storer(request, self.events_tx.clone()).map_err(|source| BufferError::SaveFailed {
				path: path.clone(),
				source,
			})?;
			record.attach_worker(storer);
			self.workers.insert(id, record.id());
			record.set_time_from_file();
			return Ok(());
		}

		let mut encoder = BomEncoder::new(record.encoding);
		let mut writer = BufWriter::new(file);
		match worker::job::pump_store(&mut writer, &snapshot, &mut encoder, self.config.io.chunk_size, None, std::time::Duration::ZERO) {
			Ok(()) => {
				record.dirty = false;
				record.set_time_from_file();
				Ok(())
			}
			Err(source) => {
				tracing::warn!(path = %path.display(), error = %source, "buffers.save_failed");
				self.notices.push(Notice::could_not_save(&path, &source));
				Err(BufferError::SaveFailed { path, source })
			}
		}
	}

	/// Offers to save the current buffer before it is discarded.
	///
	/// Returns [`Decision::Yes`] when it is clean or was saved, [`Decision::No`]
	/// when the changes may be dropped and [`Decision::Cancel`] when the caller
	/// must abort. A buffer with a pending background save needs no question.
	pub fn save_if_unsure(&mut self, force_question: bool, prompter: &mut dyn Prompter) -> Decision {
		let record = self.table.current_record();
		if record.has_store_pending() {
			return Decision::No;
		}
		let untitled = record.is_untitled();
		let has_text = record.document().is_some_and(|doc| self.engine.len(doc) > 0);
		if !record.dirty || !(has_text || !untitled || force_question) {
			return Decision::Yes;
		}
		if self.config.io.are_you_sure || untitled || force_question {
			let prompt = Prompt::SaveChanges {
				path: record.path().map(Path::to_path_buf),
			};
			let decision = prompter.ask(&prompt);
			if decision == Decision::Yes && !self.save_accepted(prompter) {
				return Decision::Cancel;
			}
			decision
		} else if self.save_accepted(prompter) {
			Decision::Yes
		} else {
			Decision::Cancel
		}
	}

	/// Saves the current buffer, treating "cannot save right now" as acceptable.
	fn save_accepted(&mut self, prompter: &mut dyn Prompter) -> bool {
		match self.save(prompter) {
			Ok(()) | Err(BufferError::NotLoaded { .. } | BufferError::AlreadySaving { .. }) => true,
			Err(error) => {
				tracing::debug!(%error, "buffers.save_refused");
				false
			}
		}
	}

	/// Offers to save every visible buffer whose document is not saved.
	///
	/// Stops at the first cancel. The current buffer is restored afterwards.
	pub fn save_all(&mut self, force_question: bool, prompter: &mut dyn Prompter) -> Decision {
		let origin = self.table.current_record().id();
		let mut choice = Decision::Yes;
		for slot in self.visible_slots() {
			let Some(index) = self.table.position_of(slot).filter(|&i| self.table.is_visible(i)) else {
				continue;
			};
			if !self.table.get(index).is_some_and(|r| r.document_not_saved()) {
				continue;
			}
			self.set_document_at(index, true);
			choice = self.save_if_unsure(force_question, prompter);
			if choice == Decision::Cancel {
				break;
			}
		}
		self.return_to(origin);
		choice
	}

	/// Saves every titled visible buffer with unsaved changes, without asking.
	pub fn save_titled(&mut self, prompter: &mut dyn Prompter) {
		let origin = self.table.current_record().id();
		for slot in self.visible_slots() {
			let Some(index) = self.table.position_of(slot).filter(|&i| self.table.is_visible(i)) else {
				continue;
			};
			if !self.table.get(index).is_some_and(|r| r.document_not_saved() && !r.is_untitled()) {
				continue;
			}
			self.set_document_at(index, true);
			if let Err(error) = self.save(prompter) {
				tracing::debug!(index, %error, "buffers.save_titled_skipped");
			}
		}
		self.return_to(origin);
	}

	fn visible_slots(&self) -> Vec<SlotId> {
		self.table.visible_records().map(|r| r.id()).collect()
	}

	fn return_to(&mut self, slot: SlotId) {
		if let Some(index) = self.table.position_of(slot).filter(|&i| self.table.is_visible(i)) {
			self.set_document_at(index, true);
		}
	}
}
