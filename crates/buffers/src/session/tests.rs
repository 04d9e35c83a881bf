use pretty_assertions::assert_eq;

use super::*;

fn sample() -> Session {
	Session {
		buffers: vec![
			BufferState {
				path: PathBuf::from("/work/a.rs"),
				caret: 119,
				bookmarks: vec![2, 16],
				folds: vec![39],
				is_active: false,
			},
			BufferState {
				path: PathBuf::from("/work/b.rs"),
				caret: 0,
				is_active: true,
				..BufferState::default()
			},
		],
		recent: vec![PathBuf::from("/work/newest.txt"), PathBuf::from("/work/oldest.txt")],
	}
}

#[test]
fn keys_are_one_based() {
	let store = sample().to_store(&SessionConfig::default());
	assert_eq!(store.get("buffer.1.path"), Some("/work/a.rs"));
	assert_eq!(store.get("buffer.1.position"), Some("120"));
	assert_eq!(store.get("buffer.1.bookmarks"), Some("3,17"));
	assert_eq!(store.get("buffer.1.folds"), Some("40"));
	assert_eq!(store.get("buffer.1.current"), None);
	assert_eq!(store.get("buffer.2.current"), Some("1"));
	assert_eq!(store.get("buffer.2.bookmarks"), None);
}

#[test]
fn recent_files_are_written_oldest_first() {
	let store = sample().to_store(&SessionConfig::default());
	assert_eq!(store.get("mru.1.path"), Some("/work/oldest.txt"));
	assert_eq!(store.get("mru.2.path"), Some("/work/newest.txt"));
	let keys: Vec<_> = store.iter().map(|(k, _)| k).take(2).collect();
	assert_eq!(keys, vec!["mru.1.path", "mru.2.path"]);
}

#[test]
fn render_then_parse_restores_session() {
	let options = SessionConfig::default();
	let text = sample().to_store(&options).render();
	assert!(text.starts_with("# session file\n\nmru.1.path="));
	assert!(text.contains("\n\nbuffer.2.path=/work/b.rs\n"));

	let parsed = SessionStore::parse(&text).unwrap();
	assert_eq!(Session::from_store(&parsed, &options), sample());
}

#[test]
fn disabled_options_drop_fields() {
	let options = SessionConfig {
		bookmarks: false,
		folds: false,
		save_recent: false,
		..SessionConfig::default()
	};
	let store = sample().to_store(&options);
	assert!(store.iter().all(|(k, _)| !k.starts_with("mru.")));
	assert_eq!(store.get("buffer.1.bookmarks"), None);
	assert_eq!(store.get("buffer.1.folds"), None);
}

#[test]
fn parse_skips_comments_and_reports_malformed_lines() {
	let store = SessionStore::parse("# c\n\n  key = value \n").unwrap();
	assert_eq!(store.get("key"), Some("value"));

	let err = SessionStore::parse("a=1\nnot a record\n").unwrap_err();
	assert!(matches!(err, SessionError::Malformed { line: 2, .. }));
}

#[test]
fn from_store_orders_by_index_and_tolerates_gaps() {
	let mut store = SessionStore::new();
	store.set("buffer.5.path", "/b");
	store.set("buffer.2.path", "/a");
	store.set("buffer.2.position", "0");
	store.set("buffer.5.bookmarks", "x,0,4");
	let session = Session::from_store(&store, &SessionConfig::default());
	let paths: Vec<_> = session.buffers.iter().map(|b| b.path.clone()).collect();
	assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
	assert_eq!(session.buffers[0].caret, 0);
	assert_eq!(session.buffers[1].bookmarks, vec![3]);
	assert!(session.active().is_none());
}

#[test]
fn write_file_creates_parent_directories() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("nested").join("s.session");
	let store = sample().to_store(&SessionConfig::default());
	store.write_file(&path).unwrap();
	assert_eq!(SessionStore::read_file(&path).unwrap(), store);
}

#[test]
fn read_missing_file_is_io_error() {
	let dir = tempfile::tempdir().unwrap();
	let err = SessionStore::read_file(&dir.path().join("missing")).unwrap_err();
	assert!(matches!(err, SessionError::Io { .. }));
}

#[test]
fn recent_files_are_bounded_and_unique() {
	let mut recent = RecentFiles::new(3);
	for name in ["/a", "/b", "/c", "/a", "/d"] {
		recent.add(RecentFile::new(name));
	}
	let paths: Vec<_> = recent.iter().map(|f| f.path.to_str().unwrap()).collect();
	assert_eq!(paths, vec!["/d", "/a", "/c"]);

	assert!(recent.remove(Path::new("/a")).is_some());
	assert!(!recent.contains(Path::new("/a")));
	assert_eq!(recent.len(), 2);
}
