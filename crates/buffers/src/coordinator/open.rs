use std::fs::File;
use std::path::Path;
use std::time::Duration;

use bitflags::bitflags;

use super::Coordinator;
use crate::engine::DocumentEngine;
use crate::error::{BufferError, Result};
use crate::notice::{Level, Notice, NoticeKind};
use crate::paths;
use crate::prompt::{Decision, Prompt, Prompter};
use crate::record::LifeState;
use crate::worker::{self, BomCodec, FileWorker, LoadRequest, LoadStop};

bitflags! {
	/// Modifiers for [`Coordinator::open`].
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct OpenFlags: u8 {
		/// Reload even when the file is already open.
		const FORCE_LOAD = 1 << 0;
		/// Do not raise notices for open failures.
		const QUIET = 1 << 1;
		/// Always read inline, whatever the file size.
		const SYNCHRONOUS = 1 << 2;
		/// When the table is full, reuse the current slot without asking to save it.
		const NO_SAVE_IF_DIRTY = 1 << 3;
	}
}

impl<E: DocumentEngine> Coordinator<E> {
	/// Opens `path` and makes it the current buffer, returning its position.
	///
	/// An already-open file is brought into view instead of being read again
	/// unless [`OpenFlags::FORCE_LOAD`] is given. Files larger than the
	/// background threshold are read by a worker; the buffer is then
	/// [`LifeState::Reading`] when this returns.
	pub fn open(&mut self, path: &Path, flags: OpenFlags, prompter: &mut dyn Prompter) -> Result<usize> {
		let path = paths::absolute(path).map_err(|source| BufferError::OpenFailed {
			path: path.to_path_buf(),
			source,
		})?;

		let mut existing = None;
		if let Some(index) = self.table.find_by_path(&path, false) {
			let id = self.table.get(index).map(|r| r.id());
			self.table.set_visible(index, true);
			let index = id.and_then(|id| self.table.position_of(id)).unwrap_or(index);
			self.set_document_at(index, true);
			self.recent.remove(&path);
			if !flags.contains(OpenFlags::FORCE_LOAD) {
				tracing::debug!(index, path = %path.display(), "buffers.open_existing");
				return Ok(index);
			}
			if self.table.current_record().worker().is_some() {
				if !flags.contains(OpenFlags::QUIET) {
					self.notices.push(Notice::new(
						Level::Warn,
						NoticeKind::Busy,
						Some(&path),
						format!("Could not open file '{}' while it is busy.", path.display()),
					));
				}
				return Err(BufferError::AlreadyBusy { path });
			}
			existing = id;
		}

		if existing.is_none() && !self.can_make_room(!flags.contains(OpenFlags::NO_SAVE_IF_DIRTY), prompter) {
			return Err(BufferError::SlotExhausted);
		}

		let opened = File::open(&path).and_then(|file| {
			let size = file.metadata()?.len();
			Ok((file, size))
		});
		let (file, size) = match opened {
			Ok(opened) => opened,
			Err(source) => {
				if !flags.contains(OpenFlags::QUIET) {
					self.notices.push(Notice::could_not_open(&path, &source));
				}
				return Err(BufferError::OpenFailed { path, source });
			}
		};

		if let Some(limit) = self.config.io.max_file_size
			&& size > limit
		{
			let prompt = Prompt::OpenLargeFile {
				path: path.clone(),
				size,
				limit,
			};
			if prompter.ask(&prompt) != Decision::Yes {
				return Err(BufferError::TooLarge { path, size, limit });
			}
		}

		let index = match existing {
			Some(id) => self.table.position_of(id).ok_or(BufferError::SlotExhausted)?,
			None if self.table.is_full() => {
				let current = self.table.current();
				if self.table.current_record().has_store_pending() {
					return Err(BufferError::SlotExhausted);
				}
				if let Some(stale) = self.table.current_record_mut().cancel_load() {
					self.workers.remove(&stale);
				}
				self.remember(current);
				self.reinit_slot(current);
				current
			}
			None if self.is_pristine() => {
				self.reinit_slot(0);
				0
			}
			None => self.add_slot()?,
		};

		let background = self.config.loads_in_background(size) && !flags.contains(OpenFlags::SYNCHRONOUS);
		tracing::debug!(index, path = %path.display(), size, background, "buffers.open");
		self.load_into(index, &path, file, size, background, flags)?;
		self.recent.remove(&path);
		Ok(index)
	}

	/// Ensures a slot is available for a new file.
	///
	/// With a full table the current buffer is going to be reused, so its
	/// unsaved changes are offered for saving first when `may_save_if_dirty`.
	pub(crate) fn can_make_room(&mut self, may_save_if_dirty: bool, prompter: &mut dyn Prompter) -> bool {
		if !self.table.is_full() || !may_save_if_dirty {
			return true;
		}
		self.save_if_unsure(true, prompter) != Decision::Cancel
	}

	fn load_into(&mut self, index: usize, path: &Path, mut file: File, size: u64, background: bool, flags: OpenFlags) -> Result<()> {
		let sleep = self.worker_sleep();
		let Some(record) = self.table.get_mut(index) else {
			return Err(BufferError::NoSuchBuffer(index));
		};
		record.set_path(Some(path.to_path_buf()));
		record.dirty = false;
		record.set_time_from_file();
		let slot = record.id();
		let Some(doc) = record.document() else {
			return Err(BufferError::NoSuchBuffer(index));
		};
		self.engine.clear(doc);
		record.set_life_state(LifeState::Reading);

		if background {
			let id = self.worker_ids.next();
			let request = LoadRequest {
				id,
				path: path.to_path_buf(),
				file,
				expected: size,
				codec: Box::new(BomCodec::new()),
				chunk_size: self.config.io.chunk_size,
				sleep,
			};
			match FileWorker::spawn_loader(request, self.events_tx.clone()) {
				Ok(loader) => {
					record.attach_worker(loader);
					self.workers.insert(id, slot);
					return Ok(());
				}
				Err(source) => {
					record.set_life_state(LifeState::Empty);
					tracing::warn!(path = %path.display(), error = %source, "buffers.loader_spawn_failed");
					if !flags.contains(OpenFlags::QUIET) {
						self.notices.push(Notice::could_not_open(path, &source));
					}
					return Err(BufferError::OpenFailed {
						path: path.to_path_buf(),
						source,
					});
				}
			}
		}

		let mut codec = BomCodec::new();
		let engine = &mut self.engine;
		let result = worker::job::pump_load(&mut file, &mut codec, self.config.io.chunk_size, None, None, Duration::ZERO, |bytes| {
			engine.append_decoded_text(doc, bytes)
		});
		match result {
			Ok(encoding) => {
				record.encoding = encoding;
				self.complete_open(index);
				Ok(())
			}
			Err(LoadStop::Io(source)) => {
				record.set_life_state(LifeState::Empty);
				tracing::warn!(path = %path.display(), error = %source, "buffers.load_failed");
				if !flags.contains(OpenFlags::QUIET) {
					self.notices.push(Notice::could_not_open(path, &source));
				}
				Err(BufferError::OpenFailed {
					path: path.to_path_buf(),
					source,
				})
			}
			Err(LoadStop::Cancelled) => {
				record.set_life_state(LifeState::Empty);
				Err(BufferError::LoadCancelled { path: path.to_path_buf() })
			}
		}
	}

	/// Cancels the background load of the current buffer, which becomes [`LifeState::Empty`].
	///
	/// Returns false when no load was running. The worker is joined before
	/// this returns and its completion is discarded.
	pub fn cancel_load(&mut self) -> bool {
		match self.table.current_record_mut().cancel_load() {
			Some(stale) => {
				self.workers.remove(&stale);
				true
			}
			None => false,
		}
	}

	/// Finishes a buffer whose content is fully present: it becomes `Open` and clean.
	pub(crate) fn complete_open(&mut self, index: usize) {
		if let Some(record) = self.table.get_mut(index) {
			if let Some(stale) = record.complete_loading() {
				self.workers.remove(&stale);
			}
			record.dirty = false;
			tracing::debug!(index, slot = %record.id(), encoding = record.encoding.as_str(), "buffers.open_complete");
		}
	}
}
