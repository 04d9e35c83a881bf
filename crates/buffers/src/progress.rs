//! Aggregate background I/O progress for an external progress indicator.

use std::path::PathBuf;

/// Snapshot of all unfinished workers, recomputed by a full table scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackgroundActivities {
	pub loaders: usize,
	pub storers: usize,
	pub total_expected: u64,
	pub total_done: u64,
	/// Path of the last busy slot in tab order.
	pub last_path: Option<PathBuf>,
}

impl BackgroundActivities {
	pub fn is_idle(&self) -> bool {
		self.loaders + self.storers == 0
	}

	/// Completed fraction in `0.0..=1.0`.
	pub fn fraction(&self) -> f64 {
		if self.total_expected == 0 {
			return if self.is_idle() { 0.0 } else { 1.0 };
		}
		(self.total_done as f64 / self.total_expected as f64).min(1.0)
	}

	/// Status text: empty when idle, otherwise e.g. `Opening 'a.txt'` or `Opening 2 files Saving 1 files`.
	pub fn describe(&self) -> String {
		match self.loaders + self.storers {
			0 => String::new(),
			1 => {
				let name = self.last_path.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
				if self.loaders > 0 {
					format!("Opening '{name}'")
				} else {
					format!("Saving '{name}'")
				}
			}
			_ => {
				let mut text = String::new();
				if self.loaders > 0 {
					text.push_str(&format!("Opening {} files ", self.loaders));
				}
				if self.storers > 0 {
					text.push_str(&format!("Saving {} files ", self.storers));
				}
				text.trim_end().to_string()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn describe_single_and_multiple() {
		let mut bg = BackgroundActivities::default();
		assert_eq!(bg.describe(), "");

		bg.loaders = 1;
		bg.last_path = Some(PathBuf::from("/w/a.txt"));
		assert_eq!(bg.describe(), "Opening '/w/a.txt'");

		bg.storers = 2;
		assert_eq!(bg.describe(), "Opening 1 files Saving 2 files");
	}

	#[test]
	fn fraction_is_clamped() {
		let bg = BackgroundActivities {
			loaders: 1,
			total_expected: 10,
			total_done: 15,
			..Default::default()
		};
		assert_eq!(bg.fraction(), 1.0);
	}
}
