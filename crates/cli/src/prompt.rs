use std::io::{self, BufRead, Write};

use tabula_buffers::{Decision, Prompt, Prompter};

/// Asks on the terminal, or answers yes to everything.
pub struct TerminalPrompter {
	assume_yes: bool,
}

impl TerminalPrompter {
	pub fn new(assume_yes: bool) -> Self {
		Self { assume_yes }
	}
}

impl Prompter for TerminalPrompter {
	fn ask(&mut self, prompt: &Prompt) -> Decision {
		if self.assume_yes {
			return Decision::Yes;
		}
		let choices = if prompt.is_cancellable() { "[y/n/c]" } else { "[y/n]" };
		let mut stderr = io::stderr().lock();
		let _ = write!(stderr, "{} {choices} ", question(prompt));
		let _ = stderr.flush();

		let mut line = String::new();
		if io::stdin().lock().read_line(&mut line).is_err() {
			return fallback(prompt);
		}
		match line.trim().to_ascii_lowercase().as_str() {
			"y" | "yes" => Decision::Yes,
			"n" | "no" => Decision::No,
			"c" | "cancel" if prompt.is_cancellable() => Decision::Cancel,
			_ => fallback(prompt),
		}
	}
}

fn fallback(prompt: &Prompt) -> Decision {
	if prompt.is_cancellable() { Decision::Cancel } else { Decision::No }
}

fn question(prompt: &Prompt) -> String {
	match prompt {
		Prompt::SaveChanges { path: Some(path) } => format!("Save changes to '{}'?", path.display()),
		Prompt::SaveChanges { path: None } => "Save changes to untitled buffer?".to_owned(),
		Prompt::OpenLargeFile { path, size, limit } => {
			format!("'{}' is {size} bytes, more than the {limit} byte limit. Open it anyway?", path.display())
		}
		Prompt::OverwriteModified { path } => format!("'{}' changed on disk. Overwrite it?", path.display()),
		Prompt::Reload { path, dirty: true } => format!("'{}' changed on disk. Reload and lose your changes?", path.display()),
		Prompt::Reload { path, dirty: false } => format!("'{}' changed on disk. Reload it?", path.display()),
		Prompt::KeepMissing { path } => format!("'{}' no longer exists. Keep the buffer?", path.display()),
	}
}
