//! Path normalization and comparison.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Makes `path` absolute against the current directory and removes `.`/`..` components lexically.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
	let joined = std::path::absolute(path)?;
	let mut out = PathBuf::new();
	for component in joined.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				out.pop();
			}
			other => out.push(other),
		}
	}
	Ok(out)
}

/// Compares two paths the way the host filesystem does.
///
/// Windows and macOS filesystems are case-insensitive by default.
pub fn same_name(a: &Path, b: &Path) -> bool {
	if cfg!(any(windows, target_os = "macos")) {
		let (a, b) = (a.to_string_lossy(), b.to_string_lossy());
		a.len() == b.len() && a.to_lowercase() == b.to_lowercase()
	} else {
		a == b
	}
}

/// Modification time of `path`, or `None` when it cannot be read.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
	std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn absolute_collapses_dot_components() {
		let base = std::env::current_dir().unwrap();
		let resolved = absolute(Path::new("a/./b/../c.txt")).unwrap();
		assert_eq!(resolved, base.join("a").join("c.txt"));
	}

	#[test]
	fn same_name_matches_identical_paths() {
		assert!(same_name(Path::new("/x/y.txt"), Path::new("/x/y.txt")));
		assert!(!same_name(Path::new("/x/y.txt"), Path::new("/x/z.txt")));
	}

	#[cfg(any(windows, target_os = "macos"))]
	#[test]
	fn same_name_ignores_case_on_case_insensitive_hosts() {
		assert!(same_name(Path::new("/X/Y.TXT"), Path::new("/x/y.txt")));
	}

	#[cfg(not(any(windows, target_os = "macos")))]
	#[test]
	fn same_name_respects_case_elsewhere() {
		assert!(!same_name(Path::new("/X/Y.TXT"), Path::new("/x/y.txt")));
	}
}
