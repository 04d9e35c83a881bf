#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tabula_buffers::{Always, Config, Coordinator, Decision, MemoryEngine};
use tempfile::TempDir;

/// Coordinator that moves every file through a worker, slowly enough to
/// observe intermediate states.
pub fn background_coordinator(capacity: usize) -> Coordinator<MemoryEngine> {
	let _ = tracing_subscriber::fmt::try_init();
	let mut config = Config::default();
	config.buffers.capacity = capacity;
	config.io.background_open_size = Some(0);
	config.io.background_save_size = Some(0);
	config.io.chunk_size = 64;
	config.io.worker_sleep_ms = 5;
	Coordinator::new(config, MemoryEngine::new())
}

pub struct Fixture {
	dir: TempDir,
}

impl Fixture {
	pub fn new() -> Self {
		Self {
			dir: tempfile::tempdir().expect("tempdir"),
		}
	}

	pub fn path(&self, name: &str) -> PathBuf {
		self.dir.path().join(name)
	}

	pub fn write(&self, name: &str, text: &str) -> PathBuf {
		let path = self.path(name);
		std::fs::write(&path, text).expect("write fixture");
		path
	}

	pub fn root(&self) -> &Path {
		self.dir.path()
	}
}

pub fn yes() -> Always {
	Always(Decision::Yes)
}

pub fn text_of(c: &Coordinator<MemoryEngine>) -> String {
	let doc = c.current_document().expect("current document");
	String::from_utf8(c.engine().text(doc).expect("live document").to_vec()).expect("utf-8")
}

pub fn edit(c: &mut Coordinator<MemoryEngine>, text: &str) {
	let doc = c.current_document().expect("current document");
	c.engine_mut().replace_text(doc, text.as_bytes());
	c.mark_dirty();
}

/// Text long enough to span many chunks.
pub fn long_text(lines: usize) -> String {
	(0..lines).map(|i| format!("line {i}\n")).collect()
}
