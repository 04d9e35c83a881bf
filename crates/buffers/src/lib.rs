//! Multi-buffer document management with background file I/O.
//!
//! A fixed-capacity [`BufferTable`] holds one [`BufferRecord`] per open file,
//! in tab order, plus a most-recently-used stack. The [`Coordinator`] opens,
//! saves, closes and switches buffers; files above a configurable size are
//! read or written by a [`FileWorker`] on its own thread while the main
//! context keeps running. Completions travel back over a channel and are
//! applied by [`Coordinator::process_completions`] or
//! [`Coordinator::wait_for_completion`].
//!
//! Document text lives behind the [`DocumentEngine`] seam; [`MemoryEngine`]
//! is an in-memory implementation. User confirmations go through a
//! [`Prompter`]. Sessions persist the titled buffers and the recent-files list
//! ([`SessionStore`]).
//!
//! ```no_run
//! use std::path::Path;
//!
//! use tabula_buffers::{Always, Config, Coordinator, Decision, MemoryEngine, OpenFlags};
//!
//! let mut buffers = Coordinator::new(Config::default(), MemoryEngine::new());
//! let mut prompter = Always(Decision::Yes);
//! buffers.open(Path::new("notes.txt"), OpenFlags::empty(), &mut prompter)?;
//! buffers.wait_for_completion();
//! buffers.save(&mut prompter)?;
//! # Ok::<(), tabula_buffers::BufferError>(())
//! ```

#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod notice;
pub mod paths;
pub mod progress;
pub mod prompt;
pub mod record;
pub mod session;
pub mod table;
pub mod worker;

pub use config::{Config, NewBufferPosition};
pub use coordinator::{Coordinator, OpenFlags};
pub use engine::{DocumentEngine, DocumentHandle, MemoryEngine};
pub use error::{BufferError, ConfigError, Result, SessionError};
pub use notice::{Notice, NoticeCenter, NoticeKind};
pub use progress::BackgroundActivities;
pub use prompt::{Always, Decision, Prompt, Prompter, Scripted};
pub use record::{BufferRecord, DeferredActions, LifeState, Selection, SlotId, ViewState};
pub use session::{BufferState, RecentFile, RecentFiles, Session, SessionStore};
pub use table::BufferTable;
pub use worker::{Direction, Encoding, FileWorker, WorkerId};
