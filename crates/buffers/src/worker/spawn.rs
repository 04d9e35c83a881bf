/// Execution classes of file workers, used for thread naming and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Reading and decoding a file.
	FileLoad,
	/// Encoding and writing a document snapshot.
	FileStore,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::FileLoad => "file_load",
			Self::FileStore => "file_store",
		}
	}
}

/// Spawns a dedicated named OS thread for one worker job.
pub fn spawn_named_thread<F>(class: TaskClass, name: impl Into<String>, f: F) -> std::io::Result<std::thread::JoinHandle<()>>
where
	F: FnOnce() + Send + 'static,
{
	let name = name.into();
	tracing::trace!(worker_class = class.as_str(), thread = %name, "worker.spawn_named_thread");
	std::thread::Builder::new().name(name).spawn(f)
}
