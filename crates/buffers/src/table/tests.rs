use std::path::PathBuf;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn ids(table: &BufferTable) -> Vec<u64> {
	table.iter().map(|r| r.id().0).collect()
}

fn table_with(capacity: usize, extra: usize) -> BufferTable {
	let mut table = BufferTable::allocate(capacity);
	for _ in 0..extra {
		table.add(NewBufferPosition::Append).unwrap();
	}
	table
}

#[test]
fn allocate_starts_with_one_visible_slot() {
	let table = BufferTable::allocate(5);
	assert_eq!(table.len(), 1);
	assert_eq!(table.visible_len(), 1);
	assert_eq!(table.current(), 0);
	assert_eq!(table.stack(), &[0]);
	table.check_invariants().unwrap();
}

#[test]
fn capacity_four_with_three_appends() {
	let mut table = table_with(4, 3);
	assert_eq!(table.len(), 4);
	assert_eq!(table.visible_len(), 4);
	assert_eq!(ids(&table), vec![1, 2, 3, 4]);
	assert_eq!(table.stack(), &[3, 2, 1, 0]);

	let cycle: Vec<_> = (0..4).map(|_| table.stack_next()).collect();
	assert_eq!(cycle, vec![2, 1, 0, 3]);
	assert!(matches!(table.add(NewBufferPosition::Append), Err(BufferError::SlotExhausted)));
	table.check_invariants().unwrap();
}

#[test]
fn stack_prev_wraps_backwards() {
	let mut table = table_with(4, 3);
	assert_eq!(table.stack_prev(), 0);
	assert_eq!(table.stack_prev(), 1);
	assert_eq!(table.stack_cursor(), 2);
}

#[test]
fn commit_stack_selection_moves_cursor_entry_to_top() {
	let mut table = table_with(4, 3);
	table.stack_next();
	table.stack_next();
	table.commit_stack_selection();
	assert_eq!(table.stack(), &[1, 3, 2, 0]);
	assert_eq!(table.stack_cursor(), 0);
}

#[test]
fn add_after_current_inserts_next_to_it() {
	let mut table = table_with(5, 2);
	table.set_current(0);
	let index = table.add(NewBufferPosition::AfterCurrent).unwrap();
	assert_eq!(index, 1);
	assert_eq!(ids(&table), vec![1, 4, 2, 3]);
	assert_eq!(table.stack()[0], 1);
	assert_eq!(table.current(), 0);
	table.check_invariants().unwrap();
}

#[test]
fn add_front_shifts_everything_right() {
	let mut table = table_with(5, 2);
	table.set_current(2);
	let index = table.add(NewBufferPosition::Front).unwrap();
	assert_eq!(index, 0);
	assert_eq!(ids(&table), vec![4, 1, 2, 3]);
	assert_eq!(table.current(), 3);
	assert_eq!(table.get(table.current()).unwrap().id(), SlotId(3));
	table.check_invariants().unwrap();
}

#[test]
fn add_lands_before_parked_slots() {
	let mut table = table_with(5, 2);
	table.set_visible(1, false);
	assert_eq!(table.visible_len(), 2);
	let index = table.add(NewBufferPosition::Append).unwrap();
	assert_eq!(index, 2);
	assert!(table.is_visible(index));
	assert_eq!(table.visible_len(), 3);
	table.check_invariants().unwrap();
}

#[test]
fn remove_current_compacts_and_clamps() {
	let mut table = table_with(4, 3);
	table.set_current(3);
	let removed = table.remove_current(false);
	assert_eq!(removed.id(), SlotId(4));
	assert_eq!(table.len(), 3);
	assert_eq!(table.current(), 2);
	assert_eq!(table.stack()[0], 2);
	table.check_invariants().unwrap();
}

#[test]
fn remove_current_in_the_middle_keeps_position() {
	let mut table = table_with(4, 3);
	table.set_current(1);
	table.move_to_stack_top(1);
	let removed = table.remove_current(false);
	assert_eq!(removed.id(), SlotId(2));
	assert_eq!(ids(&table), vec![1, 3, 4]);
	assert_eq!(table.current(), 1);
	table.check_invariants().unwrap();
}

#[test]
fn remove_current_with_zorder_picks_most_recent() {
	let mut table = table_with(4, 3);
	table.move_to_stack_top(0);
	table.move_to_stack_top(2);
	table.set_current(2);
	table.remove_current(true);
	assert_eq!(table.current(), 0);
	assert_eq!(table.get(0).unwrap().id(), SlotId(1));
	table.check_invariants().unwrap();
}

#[test]
fn removing_the_only_slot_reinitializes_it() {
	let mut table = BufferTable::allocate(3);
	table.get_mut(0).unwrap().set_path(Some(PathBuf::from("/tmp/a.txt")));
	let removed = table.remove_current(false);
	assert!(removed.path().is_some());
	assert_eq!(table.len(), 1);
	assert!(table.current_record().is_untitled());
	assert_ne!(table.current_record().id(), removed.id());
	table.check_invariants().unwrap();
}

#[test]
fn set_visible_false_parks_behind_boundary() {
	let mut table = table_with(4, 2);
	table.set_current(0);
	table.set_visible(0, false);
	assert_eq!(table.visible_len(), 2);
	assert_eq!(ids(&table), vec![3, 2, 1]);
	assert_eq!(table.current(), 0);
	assert!(!table.is_visible(2));
	table.check_invariants().unwrap();

	table.set_visible(2, true);
	assert_eq!(table.visible_len(), 3);
	assert_eq!(table.len(), 3);
	table.check_invariants().unwrap();
}

#[test]
fn remove_invisible_only_removes_parked_slots() {
	let mut table = table_with(5, 3);
	assert!(table.remove_invisible(1).is_none());
	table.set_current(0);
	table.set_visible(1, false);
	table.set_visible(1, false);
	assert_eq!(table.visible_len(), 2);
	let parked = table.get(2).unwrap().id();
	let removed = table.remove_invisible(2).unwrap();
	assert_eq!(removed.id(), parked);
	assert_eq!(table.len(), 3);
	assert_eq!(table.visible_len(), 2);
	table.check_invariants().unwrap();
}

#[test]
fn shift_to_keeps_back_references() {
	let mut table = table_with(4, 3);
	table.set_current(0);
	let current_id = table.current_record().id();
	let top_id = table.get(table.stack()[0]).unwrap().id();
	assert!(table.shift_to(0, 3));
	assert_eq!(ids(&table), vec![2, 3, 4, 1]);
	assert_eq!(table.current_record().id(), current_id);
	assert_eq!(table.get(table.stack()[0]).unwrap().id(), top_id);
	table.check_invariants().unwrap();
}

#[test]
fn shift_to_refuses_to_cross_the_boundary() {
	let mut table = table_with(4, 2);
	table.set_visible(2, false);
	assert!(!table.shift_to(0, 2));
	assert!(!table.shift_to(1, 1));
}

#[test]
fn swap_follows_current_and_stack() {
	let mut table = table_with(4, 2);
	table.set_current(2);
	assert!(table.swap(0, 2));
	assert_eq!(table.current(), 0);
	assert_eq!(table.current_record().id(), SlotId(3));
	assert_eq!(table.stack()[0], 0);
	table.check_invariants().unwrap();
}

#[test]
fn pop_stack_renumbers_higher_entries() {
	let mut table = table_with(4, 3);
	table.pop_stack(1);
	assert_eq!(table.stack(), &[2, 1, 0]);
}

#[test]
fn find_by_path_can_skip_current() {
	let mut table = table_with(4, 1);
	let path = PathBuf::from("/tmp/same.txt");
	table.get_mut(0).unwrap().set_path(Some(path.clone()));
	table.get_mut(1).unwrap().set_path(Some(path.clone()));
	table.set_current(0);
	assert_eq!(table.find_by_path(&path, false), Some(0));
	assert_eq!(table.find_by_path(&path, true), Some(1));
	assert_eq!(table.find_by_path(&PathBuf::from("/tmp/other.txt"), false), None);
}

#[test]
fn position_of_tracks_identity() {
	let mut table = table_with(4, 3);
	let id = table.get(3).unwrap().id();
	table.shift_to(3, 0);
	assert_eq!(table.position_of(id), Some(0));
	table.set_current(0);
	table.remove_current(false);
	assert_eq!(table.position_of(id), None);
}

#[test]
fn deferred_actions_are_per_slot() {
	let mut table = table_with(3, 1);
	table.add_deferred(1, DeferredActions::FINISH_SAVE);
	assert!(table.get(1).unwrap().deferred().contains(DeferredActions::FINISH_SAVE));
	assert!(table.get(0).unwrap().deferred().is_empty());
	table.finish_deferred(1, DeferredActions::FINISH_SAVE);
	assert!(table.get(1).unwrap().deferred().is_empty());
}

#[test]
fn idle_table_has_no_background_activity() {
	let table = table_with(3, 2);
	assert!(table.count_background_activities().is_idle());
	assert!(!table.saving_in_background());
}

#[derive(Debug, Clone)]
enum Op {
	Add(u8),
	RemoveCurrent(bool),
	ShiftTo(usize, usize),
	Swap(usize, usize),
	SetVisible(usize, bool),
	RemoveInvisible(usize),
	SetCurrent(usize),
	StackNext,
	Commit,
}

fn arb_op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(0u8..3).prop_map(Op::Add),
		any::<bool>().prop_map(Op::RemoveCurrent),
		(0usize..8, 0usize..8).prop_map(|(a, b)| Op::ShiftTo(a, b)),
		(0usize..8, 0usize..8).prop_map(|(a, b)| Op::Swap(a, b)),
		(0usize..8, any::<bool>()).prop_map(|(i, v)| Op::SetVisible(i, v)),
		(0usize..8).prop_map(Op::RemoveInvisible),
		(0usize..8).prop_map(Op::SetCurrent),
		Just(Op::StackNext),
		Just(Op::Commit),
	]
}

proptest! {
	/// Structural mutations keep the stack a permutation and `current` addressing a visible slot.
	#[test]
	fn prop_mutations_preserve_invariants(ops in prop::collection::vec(arb_op(), 1..60)) {
		let mut table = BufferTable::allocate(6);
		for op in ops {
			let label = format!("{op:?}");
			match op {
				Op::Add(p) => {
					let position = match p {
						0 => NewBufferPosition::Append,
						1 => NewBufferPosition::AfterCurrent,
						_ => NewBufferPosition::Front,
					};
					let _ = table.add(position);
				}
				Op::RemoveCurrent(zorder) => {
					table.remove_current(zorder);
				}
				Op::ShiftTo(a, b) => {
					table.shift_to(a, b);
				}
				Op::Swap(a, b) => {
					// Swapping across the boundary could park the current slot.
					if table.is_visible(a) == table.is_visible(b) {
						table.swap(a, b);
					}
				}
				Op::SetVisible(i, v) => {
					// Never park the last visible slot.
					if v || table.visible_len() > 1 {
						table.set_visible(i, v);
					}
				}
				Op::RemoveInvisible(i) => {
					table.remove_invisible(i);
				}
				Op::SetCurrent(i) => {
					if i < table.visible_len() {
						table.set_current(i);
					}
				}
				Op::StackNext => {
					table.stack_next();
				}
				Op::Commit => table.commit_stack_selection(),
			}
			prop_assert_eq!(table.check_invariants(), Ok(()), "after {}", label);
		}
	}
}
