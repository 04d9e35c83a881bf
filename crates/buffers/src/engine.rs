//! Document engine seam.
//!
//! The engine owns document text and reference-counts document handles. The
//! buffer subsystem only creates, references, releases, activates and fills
//! documents, and reads a byte snapshot when saving. All calls happen on the
//! main context.

use bytes::Bytes;
use rustc_hash::FxHashMap;

/// Opaque handle to an engine-owned document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentHandle(pub u64);

impl std::fmt::Display for DocumentHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "doc#{}", self.0)
	}
}

/// Operations consumed from the document engine.
pub trait DocumentEngine {
	/// Creates an empty document holding one reference.
	fn create_document(&mut self) -> DocumentHandle;

	/// Adds a reference to `doc`.
	fn add_ref(&mut self, doc: DocumentHandle);

	/// Drops a reference; the document is destroyed when none remain.
	fn release(&mut self, doc: DocumentHandle);

	/// Makes `doc` the document shown by the editing widget.
	fn set_active(&mut self, doc: DocumentHandle);

	/// Appends already-decoded text.
	fn append_decoded_text(&mut self, doc: DocumentHandle, bytes: &[u8]);

	/// Removes all text.
	fn clear(&mut self, doc: DocumentHandle);

	/// Copies the current document bytes.
	fn snapshot(&self, doc: DocumentHandle) -> Bytes;

	/// Document length in bytes.
	fn len(&self, doc: DocumentHandle) -> u64;
}

#[derive(Debug, Default)]
struct MemoryDocument {
	refs: usize,
	text: Vec<u8>,
}

/// In-memory [`DocumentEngine`].
#[derive(Debug, Default)]
pub struct MemoryEngine {
	documents: FxHashMap<DocumentHandle, MemoryDocument>,
	next_id: u64,
	active: Option<DocumentHandle>,
}

impl MemoryEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Current text of `doc`.
	pub fn text(&self, doc: DocumentHandle) -> Option<&[u8]> {
		self.documents.get(&doc).map(|d| d.text.as_slice())
	}

	/// Replaces the text of `doc`, standing in for an edit made through the widget.
	pub fn replace_text(&mut self, doc: DocumentHandle, text: &[u8]) {
		if let Some(d) = self.documents.get_mut(&doc) {
			d.text.clear();
			d.text.extend_from_slice(text);
		}
	}

	/// Reference count of `doc`, zero once destroyed.
	pub fn refs(&self, doc: DocumentHandle) -> usize {
		self.documents.get(&doc).map_or(0, |d| d.refs)
	}

	/// Number of live documents.
	pub fn live_documents(&self) -> usize {
		self.documents.len()
	}

	/// Document last passed to [`DocumentEngine::set_active`].
	pub fn active(&self) -> Option<DocumentHandle> {
		self.active
	}
}

impl DocumentEngine for MemoryEngine {
	fn create_document(&mut self) -> DocumentHandle {
		self.next_id += 1;
		let doc = DocumentHandle(self.next_id);
		self.documents.insert(doc, MemoryDocument { refs: 1, text: Vec::new() });
		doc
	}

	fn add_ref(&mut self, doc: DocumentHandle) {
		if let Some(d) = self.documents.get_mut(&doc) {
			d.refs += 1;
		}
	}

	fn release(&mut self, doc: DocumentHandle) {
		let Some(d) = self.documents.get_mut(&doc) else {
			tracing::warn!(%doc, "engine.release_unknown");
			return;
		};
		d.refs -= 1;
		if d.refs == 0 {
			self.documents.remove(&doc);
			if self.active == Some(doc) {
				self.active = None;
			}
		}
	}

	fn set_active(&mut self, doc: DocumentHandle) {
		self.active = Some(doc);
	}

	fn append_decoded_text(&mut self, doc: DocumentHandle, bytes: &[u8]) {
		if let Some(d) = self.documents.get_mut(&doc) {
			d.text.extend_from_slice(bytes);
		}
	}

	fn clear(&mut self, doc: DocumentHandle) {
		if let Some(d) = self.documents.get_mut(&doc) {
			d.text.clear();
		}
	}

	fn snapshot(&self, doc: DocumentHandle) -> Bytes {
		self.documents.get(&doc).map(|d| Bytes::copy_from_slice(&d.text)).unwrap_or_default()
	}

	fn len(&self, doc: DocumentHandle) -> u64 {
		self.documents.get(&doc).map_or(0, |d| d.text.len() as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn release_destroys_at_zero_refs() {
		let mut engine = MemoryEngine::new();
		let doc = engine.create_document();
		engine.add_ref(doc);
		engine.release(doc);
		assert_eq!(engine.refs(doc), 1);
		engine.release(doc);
		assert_eq!(engine.refs(doc), 0);
		assert_eq!(engine.live_documents(), 0);
	}

	#[test]
	fn snapshot_is_independent_of_later_edits() {
		let mut engine = MemoryEngine::new();
		let doc = engine.create_document();
		engine.append_decoded_text(doc, b"one");
		let snap = engine.snapshot(doc);
		engine.append_decoded_text(doc, b" two");
		assert_eq!(&snap[..], b"one");
		assert_eq!(engine.text(doc), Some(&b"one two"[..]));
	}
}
