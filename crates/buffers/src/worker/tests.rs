use std::fs::File;
use std::time::Duration;

use bytes::Bytes;

use super::*;

fn load_request(id: u64, path: &Path, chunk_size: usize, sleep: Duration) -> LoadRequest {
	let file = File::open(path).unwrap();
	let expected = file.metadata().unwrap().len();
	LoadRequest {
		id: WorkerId(id),
		path: path.to_path_buf(),
		file,
		expected,
		codec: Box::new(BomCodec::new()),
		chunk_size,
		sleep,
	}
}

#[test]
fn loader_delivers_one_loaded_event() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("a.txt");
	std::fs::write(&path, "\u{FEFF}line one\nline two\n").unwrap();

	let (tx, mut rx) = channel();
	let mut worker = FileWorker::spawn_loader(load_request(7, &path, 4, Duration::ZERO), tx).unwrap();
	let event = rx.blocking_recv().unwrap();
	worker.join();

	assert_eq!(event.id, WorkerId(7));
	match event.outcome {
		WorkerOutcome::Loaded { text, encoding } => {
			assert_eq!(text, b"line one\nline two\n");
			assert_eq!(encoding, Encoding::Utf8Bom);
		}
		other => panic!("unexpected outcome {other:?}"),
	}
	assert!(worker.finished());
	assert!(!worker.progress().failed());
	assert_eq!(worker.progress().done(), worker.progress().expected());
	assert!(rx.try_recv().is_err(), "exactly one event per worker");
}

#[test]
fn cancelled_loader_reports_cancelled() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("big.txt");
	std::fs::write(&path, vec![b'z'; 4096]).unwrap();

	let (tx, mut rx) = channel();
	let mut worker = FileWorker::spawn_loader(load_request(1, &path, 16, Duration::from_millis(5)), tx).unwrap();
	worker.cancel();
	worker.join();

	let event = rx.blocking_recv().unwrap();
	assert!(matches!(event.outcome, WorkerOutcome::Cancelled));
	assert!(worker.progress().done() < 4096);
	assert!(worker.is_cancelled());
}

#[test]
fn storer_writes_snapshot() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("out.txt");
	let (tx, mut rx) = channel();
	let request = StoreRequest {
		id: WorkerId(3),
		path: path.clone(),
		file: File::create(&path).unwrap(),
		snapshot: Bytes::from_static(b"stored text"),
		encoder: Box::new(BomEncoder::new(Encoding::EightBit)),
		chunk_size: 3,
		sleep: Duration::ZERO,
	};
	let mut worker = FileWorker::spawn_storer(request, tx).unwrap();
	assert_eq!(worker.direction(), Direction::Store);

	let event = rx.blocking_recv().unwrap();
	worker.join();
	assert!(matches!(event.outcome, WorkerOutcome::Stored));
	assert_eq!(std::fs::read(&path).unwrap(), b"stored text");
	assert_eq!(worker.progress().done(), 11);
}

#[test]
fn storer_failure_sets_error_flag() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("ro.txt");
	std::fs::write(&path, "x").unwrap();
	let (tx, mut rx) = channel();
	let request = StoreRequest {
		id: WorkerId(4),
		path: path.clone(),
		// Opened read-only, so every write fails.
		file: File::open(&path).unwrap(),
		snapshot: Bytes::from_static(b"never written"),
		encoder: Box::new(BomEncoder::new(Encoding::EightBit)),
		chunk_size: 64,
		sleep: Duration::ZERO,
	};
	let mut worker = FileWorker::spawn_storer(request, tx).unwrap();
	let event = rx.blocking_recv().unwrap();
	worker.join();

	assert!(matches!(event.outcome, WorkerOutcome::Failed(_)));
	assert!(worker.progress().failed());
	assert_eq!(std::fs::read(&path).unwrap(), b"x");
}
