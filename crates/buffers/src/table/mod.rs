//! Fixed-capacity buffer table.
//!
//! Slots are kept in tab order. The first `visible_len` slots are shown as
//! tabs; the rest are *parked*: hidden records whose background store is
//! still running. Independently of tab order, `stack` lists slot positions
//! in most-recently-used order.
//!
//! ```text
//! records:  [ a | b | c | d | e ]      len = 5, capacity = 8
//!             └─ visible ─┘ └parked┘   visible_len = 3
//! stack:    [ 1, 0, 2, 4, 3 ]          stack[0] = most recent
//! ```
//!
//! Every structural mutation rewrites `current` and each stack entry so they
//! keep naming the same record. Callers that need identity across mutations
//! hold a [`SlotId`] and resolve it with [`BufferTable::position_of`].

use std::path::Path;

use crate::config::NewBufferPosition;
use crate::error::{BufferError, Result};
use crate::progress::BackgroundActivities;
use crate::record::{BufferRecord, DeferredActions, SlotId};
use crate::worker::{Direction, WorkerId};

/// Ordered, fixed-capacity collection of [`BufferRecord`]s.
#[derive(Debug)]
pub struct BufferTable {
	records: Vec<BufferRecord>,
	capacity: usize,
	visible: usize,
	current: usize,
	stack: Vec<usize>,
	stack_cursor: usize,
	next_slot: u64,
}

impl BufferTable {
	/// Creates a table with `capacity` slots (at least one) holding one empty record.
	pub fn allocate(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		let mut table = Self {
			records: Vec::with_capacity(capacity),
			capacity,
			visible: 1,
			current: 0,
			stack: Vec::with_capacity(capacity),
			stack_cursor: 0,
			next_slot: 0,
		};
		let first = table.fresh_record();
		table.records.push(first);
		table.stack.push(0);
		table
	}

	fn fresh_record(&mut self) -> BufferRecord {
		self.next_slot += 1;
		BufferRecord::new(SlotId(self.next_slot))
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Occupied slots, visible and parked.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Always false; a table holds at least one slot.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn visible_len(&self) -> usize {
		self.visible
	}

	pub fn is_full(&self) -> bool {
		self.records.len() >= self.capacity
	}

	pub fn is_visible(&self, index: usize) -> bool {
		index < self.visible
	}

	pub fn current(&self) -> usize {
		self.current
	}

	/// Makes `index` current without touching the MRU stack.
	pub fn set_current(&mut self, index: usize) {
		debug_assert!(index < self.records.len());
		self.current = index;
	}

	pub fn current_record(&self) -> &BufferRecord {
		&self.records[self.current]
	}

	pub fn current_record_mut(&mut self) -> &mut BufferRecord {
		&mut self.records[self.current]
	}

	pub fn get(&self, index: usize) -> Option<&BufferRecord> {
		self.records.get(index)
	}

	pub fn get_mut(&mut self, index: usize) -> Option<&mut BufferRecord> {
		self.records.get_mut(index)
	}

	/// All records in tab order, parked ones last.
	pub fn iter(&self) -> impl Iterator<Item = &BufferRecord> {
		self.records.iter()
	}

	pub fn visible_records(&self) -> impl Iterator<Item = &BufferRecord> {
		self.records[..self.visible].iter()
	}

	/// MRU order; `stack()[0]` is the most recently used position.
	pub fn stack(&self) -> &[usize] {
		&self.stack
	}

	pub fn stack_cursor(&self) -> usize {
		self.stack_cursor
	}

	/// Current position of the record with identity `id`.
	pub fn position_of(&self, id: SlotId) -> Option<usize> {
		self.records.iter().position(|r| r.id() == id)
	}

	/// Position of the record holding `path`, optionally skipping the current slot.
	pub fn find_by_path(&self, path: &Path, exclude_current: bool) -> Option<usize> {
		self.records
			.iter()
			.enumerate()
			.find(|(i, r)| (!exclude_current || *i != self.current) && r.same_name_as(path))
			.map(|(i, _)| i)
	}

	/// Position of the record owning worker `id`.
	pub fn find_by_worker(&self, id: WorkerId) -> Option<usize> {
		self.records.iter().position(|r| r.worker_id() == Some(id))
	}

	/// Adds an empty, visible slot placed according to `position` and makes it the MRU top.
	///
	/// Returns the new slot's position. The current slot is unchanged.
	pub fn add(&mut self, position: NewBufferPosition) -> Result<usize> {
		if self.is_full() {
			return Err(BufferError::SlotExhausted);
		}
		let record = self.fresh_record();
		self.records.push(record);
		let last = self.records.len() - 1;
		self.stack.push(last);
		self.move_to_stack_top(last);
		self.set_visible(last, true);

		let index = self.visible - 1;
		let index = match position {
			NewBufferPosition::Append => index,
			NewBufferPosition::AfterCurrent => {
				let target = (self.current + 1).min(index);
				self.shift_to(index, target);
				target
			}
			NewBufferPosition::Front => {
				self.shift_to(index, 0);
				0
			}
		};
		tracing::trace!(index, len = self.len(), visible = self.visible, "table.add");
		Ok(index)
	}

	/// Replaces the record at `index` with a fresh empty one, keeping its position.
	pub fn reset_slot(&mut self, index: usize) -> BufferRecord {
		let fresh = self.fresh_record();
		std::mem::replace(&mut self.records[index], fresh)
	}

	/// Removes the current slot, compacting the slots after it leftwards.
	///
	/// Removing the only slot re-initializes it instead. The new current slot
	/// is the nearest visible neighbour or, with `zorder`, the most recently
	/// used visible slot. Returns the removed record.
	pub fn remove_current(&mut self, zorder: bool) -> BufferRecord {
		let removed = self.current;
		if self.records.len() == 1 {
			self.stack_cursor = 0;
			self.visible = 1;
			return self.reset_slot(0);
		}

		self.commit_stack_selection();
		let record = self.records.remove(removed);
		self.pop_stack(removed);
		if removed < self.visible {
			self.visible -= 1;
		}

		let visible = self.visible;
		if zorder && let Some(top) = self.stack.iter().copied().find(|&i| i < visible) {
			self.current = top;
		} else if self.current >= visible {
			self.current = visible.saturating_sub(1);
		}
		self.move_to_stack_top(self.current);
		tracing::trace!(removed, current = self.current, len = self.len(), "table.remove_current");
		record
	}

	/// Removes a parked slot by swapping it with the last slot.
	///
	/// Returns `None` when `index` is visible or out of range.
	pub fn remove_invisible(&mut self, index: usize) -> Option<BufferRecord> {
		if self.is_visible(index) || index >= self.records.len() || self.records.len() == 1 {
			return None;
		}
		let last = self.records.len() - 1;
		if index < last {
			self.swap(index, last);
		}
		let record = self.records.pop()?;
		self.pop_stack(last);
		if self.current >= self.records.len() {
			self.current = self.records.len() - 1;
		}
		tracing::trace!(index, len = self.len(), "table.remove_invisible");
		Some(record)
	}

	/// Moves `index` across the visible/parked boundary by swapping it with the boundary slot.
	pub fn set_visible(&mut self, index: usize, visible: bool) {
		if visible == self.is_visible(index) || index >= self.records.len() {
			return;
		}
		if visible {
			if index > self.visible {
				self.swap(index, self.visible);
			}
			self.visible += 1;
			if self.current >= self.visible {
				self.current = self.visible - 1;
			}
		} else {
			let was_current = self.current == index;
			if index < self.visible - 1 {
				self.swap(index, self.visible - 1);
			}
			self.visible -= 1;
			if self.visible > 0 {
				if was_current {
					self.current = index.min(self.visible - 1);
				} else if self.current >= self.visible {
					self.current = self.visible - 1;
				}
			}
		}
	}

	/// Moves the slot at `from` to `to`, shifting the slots in between.
	///
	/// Both positions must lie on the same side of the visible boundary.
	/// Returns false when nothing moved.
	pub fn shift_to(&mut self, from: usize, to: usize) -> bool {
		let len = self.records.len();
		if from == to || from >= len || to >= len || self.is_visible(from) != self.is_visible(to) {
			return false;
		}
		let record = self.records.remove(from);
		self.records.insert(to, record);
		let remap = |i: usize| {
			if i == from {
				to
			} else if from < to && from < i && i <= to {
				i - 1
			} else if from > to && to <= i && i < from {
				i + 1
			} else {
				i
			}
		};
		self.remap(remap);
		true
	}

	/// Exchanges the slots at `a` and `b`.
	pub fn swap(&mut self, a: usize, b: usize) -> bool {
		let len = self.records.len();
		if a == b || a >= len || b >= len {
			return false;
		}
		self.records.swap(a, b);
		self.remap(|i| {
			if i == a {
				b
			} else if i == b {
				a
			} else {
				i
			}
		});
		true
	}

	fn remap(&mut self, f: impl Fn(usize) -> usize) {
		for entry in &mut self.stack {
			*entry = f(*entry);
		}
		self.current = f(self.current);
	}

	/// Makes `index` the most recently used slot.
	pub fn move_to_stack_top(&mut self, index: usize) {
		match self.stack.iter().position(|&i| i == index) {
			Some(pos) => {
				self.stack[..=pos].rotate_right(1);
			}
			None => debug_assert!(false, "position {index} missing from MRU stack"),
		}
	}

	/// Advances the transient MRU cursor towards older entries, wrapping.
	pub fn stack_next(&mut self) -> usize {
		self.stack_cursor = (self.stack_cursor + 1) % self.stack.len();
		self.stack[self.stack_cursor]
	}

	/// Moves the transient MRU cursor towards newer entries, wrapping.
	pub fn stack_prev(&mut self) -> usize {
		self.stack_cursor = if self.stack_cursor == 0 {
			self.stack.len() - 1
		} else {
			self.stack_cursor - 1
		};
		self.stack[self.stack_cursor]
	}

	/// Folds the transient cursor position into `stack[0]` and resets the cursor.
	pub fn commit_stack_selection(&mut self) {
		let selected = self.stack[self.stack_cursor];
		self.move_to_stack_top(selected);
		self.stack_cursor = 0;
	}

	/// Drops `removed` from the stack and renumbers the entries after it.
	pub fn pop_stack(&mut self, removed: usize) {
		self.stack.retain(|&i| i != removed);
		for entry in &mut self.stack {
			if *entry > removed {
				*entry -= 1;
			}
		}
		if self.stack_cursor >= self.stack.len() {
			self.stack_cursor = 0;
		}
	}

	/// Counts unfinished workers and sums their progress.
	pub fn count_background_activities(&self) -> BackgroundActivities {
		let mut bg = BackgroundActivities::default();
		for record in &self.records {
			let Some(worker) = record.worker().filter(|w| !w.finished()) else {
				continue;
			};
			match worker.direction() {
				Direction::Load => bg.loaders += 1,
				Direction::Store => bg.storers += 1,
			}
			bg.total_expected += worker.progress().expected();
			bg.total_done += worker.progress().done();
			bg.last_path = Some(record.path().unwrap_or(worker.path()).to_path_buf());
		}
		bg
	}

	/// Returns true while any store worker is unfinished.
	pub fn saving_in_background(&self) -> bool {
		self.records
			.iter()
			.filter_map(BufferRecord::worker)
			.any(|w| w.direction() == Direction::Store && !w.finished())
	}

	pub fn add_deferred(&mut self, index: usize, actions: DeferredActions) {
		if let Some(record) = self.records.get_mut(index) {
			record.add_deferred(actions);
		}
	}

	pub fn finish_deferred(&mut self, index: usize, actions: DeferredActions) {
		if let Some(record) = self.records.get_mut(index) {
			record.finish_deferred(actions);
		}
	}

	/// Verifies the structural invariants, describing the first violation.
	pub fn check_invariants(&self) -> std::result::Result<(), String> {
		let len = self.records.len();
		if len == 0 || len > self.capacity {
			return Err(format!("len {len} outside 1..={}", self.capacity));
		}
		if self.visible > len {
			return Err(format!("visible_len {} > len {len}", self.visible));
		}
		if self.current >= len {
			return Err(format!("current {} >= len {len}", self.current));
		}
		if self.visible > 0 && self.current >= self.visible {
			return Err(format!("current {} is parked (visible_len {})", self.current, self.visible));
		}
		if self.stack.len() != len {
			return Err(format!("stack length {} != len {len}", self.stack.len()));
		}
		let mut seen = vec![false; len];
		for &entry in &self.stack {
			if entry >= len || std::mem::replace(&mut seen[entry], true) {
				return Err(format!("stack {:?} is not a permutation of 0..{len}", self.stack));
			}
		}
		if self.stack_cursor >= len {
			return Err(format!("stack cursor {} >= len {len}", self.stack_cursor));
		}
		let mut ids: Vec<_> = self.records.iter().map(BufferRecord::id).collect();
		ids.sort_unstable();
		ids.dedup();
		if ids.len() != len {
			return Err("duplicate slot ids".to_string());
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests;
