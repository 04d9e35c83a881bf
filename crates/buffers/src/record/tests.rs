use std::fs::File;
use std::time::Duration;

use super::*;
use crate::worker::{BomCodec, LoadRequest, WorkerOutcome, channel};

fn loader_for(path: &Path, id: u64) -> (FileWorker, crate::worker::EventReceiver) {
	let (tx, rx) = channel();
	let file = File::open(path).unwrap();
	let expected = file.metadata().unwrap().len();
	let worker = FileWorker::spawn_loader(
		LoadRequest {
			id: WorkerId(id),
			path: path.to_path_buf(),
			file,
			expected,
			codec: Box::new(BomCodec::new()),
			chunk_size: 8,
			sleep: Duration::from_millis(2),
		},
		tx,
	)
	.unwrap();
	(worker, rx)
}

#[test]
fn new_record_is_empty_and_untitled() {
	let record = BufferRecord::new(SlotId(1));
	assert!(record.is_untitled());
	assert_eq!(record.life_state(), LifeState::Empty);
	assert!(record.document_not_saved());
	assert!(record.worker().is_none());
}

#[test]
fn document_not_saved_tracks_dirty_and_life_state() {
	let mut record = BufferRecord::new(SlotId(1));
	record.set_life_state(LifeState::Open);
	assert!(!record.document_not_saved());
	record.dirty = true;
	assert!(record.document_not_saved());
	record.dirty = false;
	record.set_life_state(LifeState::ReadAll);
	assert!(record.document_not_saved());
}

#[test]
fn same_name_as_requires_a_path() {
	let mut record = BufferRecord::new(SlotId(1));
	assert!(!record.same_name_as(Path::new("/tmp/a")));
	record.set_path(Some(PathBuf::from("/tmp/a")));
	assert!(record.same_name_as(Path::new("/tmp/a")));
	assert!(!record.same_name_as(Path::new("/tmp/b")));
}

#[test]
fn cancel_load_forces_empty() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("f.txt");
	std::fs::write(&path, vec![b'a'; 1024]).unwrap();

	let mut record = BufferRecord::new(SlotId(1));
	let (worker, mut rx) = loader_for(&path, 9);
	record.attach_worker(worker);
	record.set_life_state(LifeState::Reading);

	assert_eq!(record.cancel_load(), Some(WorkerId(9)));
	assert_eq!(record.life_state(), LifeState::Empty);
	assert!(record.worker().is_none());
	// The late event is still produced by the thread; the coordinator ignores it.
	assert!(matches!(rx.blocking_recv().unwrap().outcome, WorkerOutcome::Cancelled | WorkerOutcome::Loaded { .. }));
}

#[test]
fn cancel_load_is_a_noop_without_loader() {
	let mut record = BufferRecord::new(SlotId(1));
	record.set_life_state(LifeState::Open);
	assert_eq!(record.cancel_load(), None);
	assert_eq!(record.life_state(), LifeState::Open);
}

#[test]
fn complete_loading_discards_finished_loader() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("f.txt");
	std::fs::write(&path, "abc").unwrap();

	let mut record = BufferRecord::new(SlotId(1));
	let (worker, mut rx) = loader_for(&path, 2);
	record.attach_worker(worker);
	rx.blocking_recv().unwrap();

	assert_eq!(record.complete_loading(), Some(WorkerId(2)));
	assert_eq!(record.life_state(), LifeState::Open);
	assert!(!record.is_loading());
	// Storing completion leaves a record without store worker untouched.
	assert_eq!(record.complete_storing(), None);
}

#[test]
fn deferred_actions_accumulate_and_clear() {
	let mut record = BufferRecord::new(SlotId(1));
	record.add_deferred(DeferredActions::FINISH_SAVE);
	assert!(record.deferred().contains(DeferredActions::FINISH_SAVE));
	record.finish_deferred(DeferredActions::FINISH_SAVE);
	assert!(record.deferred().is_empty());
}
