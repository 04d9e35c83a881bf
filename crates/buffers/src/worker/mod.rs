//! Background file workers.
//!
//! A [`FileWorker`] runs one load or store job on its own OS thread. The job
//! processes fixed-size chunks, publishes progress through shared atomics and
//! polls its cancellation token between chunks. It finishes by sending
//! exactly one [`WorkerEvent`] on the coordinator's channel:
//!
//! ```text
//! main context                     worker thread
//! ────────────                     ─────────────
//! spawn_loader / spawn_storer ──►  pump chunks ── progress ──► count_background_activities()
//!                                       │
//! process_completions()  ◄── WorkerEvent (exactly once)
//! ```
//!
//! Workers never touch the buffer table; the coordinator maps the event back
//! to its slot by [`WorkerId`].

pub mod codec;
pub mod job;
mod spawn;
mod token;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

pub use codec::{BomCodec, BomEncoder, Codec, Encoder, Encoding};
pub use job::{LoadRequest, LoadStop, StoreRequest};
pub use spawn::{TaskClass, spawn_named_thread};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
pub use token::{WorkerId, WorkerIdClock};

/// Channel sender handed to workers.
pub type EventSender = mpsc::UnboundedSender<WorkerEvent>;

/// Channel receiver drained by the main context.
pub type EventReceiver = mpsc::UnboundedReceiver<WorkerEvent>;

/// Creates a new completion channel pair.
pub fn channel() -> (EventSender, EventReceiver) {
	mpsc::unbounded_channel()
}

/// Whether a worker reads or writes its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Load,
	Store,
}

/// Progress counters shared between a worker thread and the main context.
#[derive(Debug, Default)]
pub struct WorkerProgress {
	expected: AtomicU64,
	done: AtomicU64,
	finished: AtomicBool,
	failed: AtomicBool,
}

impl WorkerProgress {
	pub fn new(expected: u64) -> Self {
		Self {
			expected: AtomicU64::new(expected),
			..Self::default()
		}
	}

	pub fn expected(&self) -> u64 {
		self.expected.load(Ordering::Acquire)
	}

	pub fn done(&self) -> u64 {
		self.done.load(Ordering::Acquire)
	}

	/// Returns true once the job stopped, successfully or not.
	pub fn finished(&self) -> bool {
		self.finished.load(Ordering::Acquire)
	}

	pub fn failed(&self) -> bool {
		self.failed.load(Ordering::Acquire)
	}

	pub(crate) fn advance(&self, n: u64) {
		self.done.fetch_add(n, Ordering::AcqRel);
	}

	fn finish(&self, failed: bool) {
		self.failed.store(failed, Ordering::Release);
		self.finished.store(true, Ordering::Release);
	}
}

/// Result carried by a [`WorkerEvent`].
#[derive(Debug)]
pub enum WorkerOutcome {
	/// The whole file was read and decoded.
	Loaded { text: Vec<u8>, encoding: Encoding },
	/// The snapshot was written.
	Stored,
	/// The load observed its cancellation token.
	Cancelled,
	/// An I/O error ended the job early.
	Failed(io::Error),
}

/// The single completion message of one worker.
#[derive(Debug)]
pub struct WorkerEvent {
	pub id: WorkerId,
	pub outcome: WorkerOutcome,
}

/// Handle to one in-flight background job, exclusively owned by a buffer record.
#[derive(Debug)]
pub struct FileWorker {
	id: WorkerId,
	direction: Direction,
	path: PathBuf,
	progress: Arc<WorkerProgress>,
	cancel: CancellationToken,
	thread: Option<JoinHandle<()>>,
}

impl FileWorker {
	/// Starts reading `request.file` on a new thread.
	pub fn spawn_loader(request: LoadRequest, events: EventSender) -> io::Result<Self> {
		let LoadRequest {
			id,
			path,
			mut file,
			expected,
			mut codec,
			chunk_size,
			sleep,
		} = request;
		let progress = Arc::new(WorkerProgress::new(expected));
		let cancel = CancellationToken::new();

		let thread = {
			let progress = Arc::clone(&progress);
			let cancel = cancel.clone();
			let path = path.clone();
			spawn_named_thread(TaskClass::FileLoad, format!("tabula-load-{}", id.0), move || {
				let mut text = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
				let result = job::pump_load(&mut file, codec.as_mut(), chunk_size, Some(&progress), Some(&cancel), sleep, |bytes| {
					text.extend_from_slice(bytes)
				});
				let outcome = match result {
					Ok(encoding) => WorkerOutcome::Loaded { text, encoding },
					Err(LoadStop::Cancelled) => WorkerOutcome::Cancelled,
					Err(LoadStop::Io(error)) => {
						tracing::warn!(worker = %id, path = %path.display(), %error, "worker.load_failed");
						WorkerOutcome::Failed(error)
					}
				};
				progress.finish(matches!(outcome, WorkerOutcome::Failed(_)));
				send(&events, WorkerEvent { id, outcome });
			})?
		};

		tracing::debug!(worker = %id, path = %path.display(), expected, "worker.loader_started");
		Ok(Self {
			id,
			direction: Direction::Load,
			path,
			progress,
			cancel,
			thread: Some(thread),
		})
	}

	/// Starts writing `request.snapshot` on a new thread.
	pub fn spawn_storer(request: StoreRequest, events: EventSender) -> io::Result<Self> {
		let StoreRequest {
			id,
			path,
			file,
			snapshot,
			mut encoder,
			chunk_size,
			sleep,
		} = request;
		let progress = Arc::new(WorkerProgress::new(snapshot.len() as u64));
		let cancel = CancellationToken::new();

		let thread = {
			let progress = Arc::clone(&progress);
			let path = path.clone();
			spawn_named_thread(TaskClass::FileStore, format!("tabula-store-{}", id.0), move || {
				let mut writer = io::BufWriter::new(file);
				let result = job::pump_store(&mut writer, &snapshot, encoder.as_mut(), chunk_size, Some(&progress), sleep);
				let outcome = match result {
					Ok(()) => WorkerOutcome::Stored,
					Err(error) => {
						tracing::warn!(worker = %id, path = %path.display(), %error, "worker.store_failed");
						WorkerOutcome::Failed(error)
					}
				};
				progress.finish(matches!(outcome, WorkerOutcome::Failed(_)));
				send(&events, WorkerEvent { id, outcome });
			})?
		};

		tracing::debug!(worker = %id, path = %path.display(), "worker.storer_started");
		Ok(Self {
			id,
			direction: Direction::Store,
			path,
			progress,
			cancel,
			thread: Some(thread),
		})
	}

	pub fn id(&self) -> WorkerId {
		self.id
	}

	pub fn direction(&self) -> Direction {
		self.direction
	}

	pub fn is_loading(&self) -> bool {
		self.direction == Direction::Load
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn progress(&self) -> &WorkerProgress {
		&self.progress
	}

	/// Returns true once the job stopped; its event may still be in the channel.
	pub fn finished(&self) -> bool {
		self.progress.finished()
	}

	/// Requests cooperative cancellation; the job stops at its next chunk boundary.
	///
	/// Stores ignore cancellation and always run to completion or failure.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Blocks until the worker thread has exited.
	pub fn join(&mut self) {
		if let Some(thread) = self.thread.take()
			&& thread.join().is_err()
		{
			tracing::error!(worker = %self.id, "worker.thread_panicked");
		}
	}
}

fn send(events: &EventSender, event: WorkerEvent) {
	let id = event.id;
	if events.send(event).is_err() {
		tracing::trace!(worker = %id, "worker.event_dropped");
	}
}

#[cfg(test)]
mod tests;
