//! Confirmation seam.
//!
//! Operations that need a yes/no(/cancel) answer from the user take a
//! [`Prompter`]. Front ends implement it with dialogs; tests and batch tools
//! use [`Always`] or [`Scripted`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// A question asked during an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
	/// Save changes to a dirty buffer before it goes away. `None` is untitled.
	SaveChanges { path: Option<PathBuf> },
	/// Open a file larger than the configured limit.
	OpenLargeFile { path: PathBuf, size: u64, limit: u64 },
	/// Save over a file that changed on disk since it was read.
	OverwriteModified { path: PathBuf },
	/// Reload a file that changed on disk. `dirty` means local edits would be lost.
	Reload { path: PathBuf, dirty: bool },
	/// Keep a buffer whose file vanished from disk.
	KeepMissing { path: PathBuf },
}

impl Prompt {
	/// Whether the question offers a cancel answer.
	pub fn is_cancellable(&self) -> bool {
		matches!(self, Self::SaveChanges { .. })
	}

	pub fn path(&self) -> Option<&Path> {
		match self {
			Self::SaveChanges { path } => path.as_deref(),
			Self::OpenLargeFile { path, .. }
			| Self::OverwriteModified { path }
			| Self::Reload { path, .. }
			| Self::KeepMissing { path } => Some(path),
		}
	}
}

/// Answer to a [`Prompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	Yes,
	No,
	Cancel,
}

pub trait Prompter {
	fn ask(&mut self, prompt: &Prompt) -> Decision;
}

impl<F: FnMut(&Prompt) -> Decision> Prompter for F {
	fn ask(&mut self, prompt: &Prompt) -> Decision {
		self(prompt)
	}
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct Always(pub Decision);

impl Prompter for Always {
	fn ask(&mut self, prompt: &Prompt) -> Decision {
		tracing::trace!(?prompt, decision = ?self.0, "prompt.auto");
		self.0
	}
}

/// Replays a fixed list of answers and records the questions asked.
///
/// Once the script runs out every further prompt is answered with `fallback`.
#[derive(Debug)]
pub struct Scripted {
	answers: VecDeque<Decision>,
	fallback: Decision,
	asked: Vec<Prompt>,
}

impl Scripted {
	pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
		Self {
			answers: answers.into_iter().collect(),
			fallback: Decision::No,
			asked: Vec::new(),
		}
	}

	pub fn with_fallback(mut self, fallback: Decision) -> Self {
		self.fallback = fallback;
		self
	}

	pub fn asked(&self) -> &[Prompt] {
		&self.asked
	}
}

impl Prompter for Scripted {
	fn ask(&mut self, prompt: &Prompt) -> Decision {
		self.asked.push(prompt.clone());
		self.answers.pop_front().unwrap_or(self.fallback)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scripted_replays_then_falls_back() {
		let mut prompter = Scripted::new([Decision::Yes]).with_fallback(Decision::Cancel);
		let prompt = Prompt::KeepMissing { path: PathBuf::from("/gone") };
		assert_eq!(prompter.ask(&prompt), Decision::Yes);
		assert_eq!(prompter.ask(&prompt), Decision::Cancel);
		assert_eq!(prompter.asked().len(), 2);
		assert_eq!(prompter.asked()[0].path(), Some(Path::new("/gone")));
	}

	#[test]
	fn closures_are_prompters() {
		let mut prompter = |p: &Prompt| if p.is_cancellable() { Decision::Cancel } else { Decision::No };
		assert_eq!(prompter.ask(&Prompt::SaveChanges { path: None }), Decision::Cancel);
	}
}
