// Melody - the track's notes and their scheduled event snapshot
//
// Writers (console thread) mutate the note list and rebuild the sorted event list
// while still holding the note lock, then swap it in under the snapshot lock. The
// audio thread only ever takes the snapshot lock, for the duration of one block.

use std::sync::{LockResult, Mutex, MutexGuard, PoisonError};

use super::note::{Event, Note, NoteId};

#[derive(Debug, Default)]
struct NoteList {
    entries: Vec<(NoteId, Note)>,
    next_id: u64,
}

impl NoteList {
    fn push(&mut self, note: Note) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, note));
        id
    }

    /// Put a note back under an id handed out earlier, keeping id order.
    /// Returns false when the id is already present.
    fn restore(&mut self, id: NoteId, note: Note) -> bool {
        let index = self.entries.partition_point(|(entry_id, _)| *entry_id < id);
        if self.entries.get(index).is_some_and(|(entry_id, _)| *entry_id == id) {
            return false;
        }
        self.entries.insert(index, (id, note));
        self.next_id = self.next_id.max(id.0 + 1);
        true
    }

    fn sorted_events(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .entries
            .iter()
            .flat_map(|(_, note)| note.events())
            .collect();
        events.sort_by_key(Event::order_key);
        events
    }
}

#[derive(Debug, Default)]
pub struct Melody {
    notes: Mutex<NoteList>,
    events: Mutex<Vec<Event>>,
}

fn recover<T>(result: LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T> {
    result.unwrap_or_else(PoisonError::into_inner)
}

impl Melody {
    pub fn new() -> Self {
        Self::default()
    }

    fn edit<R>(&self, change: impl FnOnce(&mut NoteList) -> R) -> R {
        let mut notes = recover(self.notes.lock());
        let result = change(&mut notes);
        let rebuilt = notes.sorted_events();
        let previous = std::mem::replace(&mut *recover(self.events.lock()), rebuilt);
        drop(notes);
        drop(previous);
        result
    }

    pub fn add_note(&self, note: Note) -> NoteId {
        self.edit(|notes| notes.push(note))
    }

    pub fn remove_note(&self, id: NoteId) -> Option<Note> {
        self.edit(|notes| {
            let index = notes.entries.iter().position(|(entry_id, _)| *entry_id == id)?;
            Some(notes.entries.remove(index).1)
        })
    }

    /// Remove the first note equal to `note`
    pub fn remove_matching(&self, note: &Note) -> Option<NoteId> {
        self.edit(|notes| {
            let index = notes.entries.iter().position(|(_, entry)| entry == note)?;
            Some(notes.entries.remove(index).0)
        })
    }

    /// Swap the whole melody in a single snapshot update
    pub fn replace_notes(&self, new_notes: impl IntoIterator<Item = Note>) -> Vec<NoteId> {
        self.edit(|notes| {
            notes.entries.clear();
            new_notes.into_iter().map(|note| notes.push(note)).collect()
        })
    }

    /// Bring back a removed note under its original id
    pub fn restore(&self, id: NoteId, note: Note) -> bool {
        self.edit(|notes| notes.restore(id, note))
    }

    /// Swap the whole melody for entries taken from `notes()` earlier, ids included
    pub fn replace_entries(&self, entries: impl IntoIterator<Item = (NoteId, Note)>) {
        self.edit(|notes| {
            notes.entries.clear();
            for (id, note) in entries {
                notes.restore(id, note);
            }
        })
    }

    pub fn clear(&self) {
        self.edit(|notes| notes.entries.clear());
    }

    /// Copy of the notes in insertion order
    pub fn notes(&self) -> Vec<(NoteId, Note)> {
        recover(self.notes.lock()).entries.clone()
    }

    pub fn get(&self, id: NoteId) -> Option<Note> {
        recover(self.notes.lock())
            .entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, note)| *note)
    }

    pub fn len(&self) -> usize {
        recover(self.notes.lock()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn for_each_event(&self, mut function: impl FnMut(&Event)) {
        let events = recover(self.events.lock());
        for event in events.iter() {
            function(event);
        }
    }

    /// Read-only view of the sorted event snapshot, held locked for the closure
    pub fn with_events<R>(&self, function: impl FnOnce(&[Event]) -> R) -> R {
        let events = recover(self.events.lock());
        function(&events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(number: u8, start: u64, length: u64) -> Note {
        Note::new(number, 100, start, length).unwrap()
    }

    fn event_ticks(melody: &Melody) -> Vec<(u64, bool)> {
        let mut ticks = Vec::new();
        melody.for_each_event(|e| ticks.push((e.timestamp_ticks, e.is_note_on)));
        ticks
    }

    #[test]
    fn test_events_sorted_by_tick() {
        let melody = Melody::new();
        melody.add_note(note(67, 96, 24));
        melody.add_note(note(60, 0, 48));

        assert_eq!(
            event_ticks(&melody),
            vec![(0, true), (48, false), (96, true), (120, false)]
        );
    }

    #[test]
    fn test_note_off_before_note_on_at_same_tick() {
        let melody = Melody::new();
        melody.add_note(note(60, 24, 24));
        melody.add_note(note(60, 0, 24));

        let events = melody.with_events(|events| events.to_vec());
        assert_eq!(events[1].timestamp_ticks, 24);
        assert!(!events[1].is_note_on);
        assert!(events[2].is_note_on);
    }

    #[test]
    fn test_remove_note_by_id() {
        let melody = Melody::new();
        let a = melody.add_note(note(60, 0, 10));
        let b = melody.add_note(note(62, 10, 10));
        assert_ne!(a, b);

        assert_eq!(melody.remove_note(a), Some(note(60, 0, 10)));
        assert_eq!(melody.remove_note(a), None);
        assert_eq!(melody.len(), 1);
        assert_eq!(event_ticks(&melody), vec![(10, true), (20, false)]);
    }

    #[test]
    fn test_remove_matching_takes_first_equal_note() {
        let melody = Melody::new();
        let first = melody.add_note(note(60, 0, 10));
        melody.add_note(note(60, 0, 10));

        assert_eq!(melody.remove_matching(&note(60, 0, 10)), Some(first));
        assert_eq!(melody.len(), 1);
        assert_eq!(melody.remove_matching(&note(70, 0, 10)), None);
    }

    #[test]
    fn test_replace_and_clear() {
        let melody = Melody::new();
        melody.add_note(note(60, 0, 10));
        let ids = melody.replace_notes([note(61, 0, 5), note(62, 5, 5)]);
        assert_eq!(ids.len(), 2);
        assert_eq!(melody.get(ids[1]), Some(note(62, 5, 5)));
        assert_eq!(melody.with_events(|e| e.len()), 4);

        melody.clear();
        assert!(melody.is_empty());
        assert_eq!(melody.with_events(|e| e.len()), 0);
    }

    #[test]
    fn test_restore_keeps_id_and_order() {
        let melody = Melody::new();
        let a = melody.add_note(note(60, 0, 10));
        let b = melody.add_note(note(62, 10, 10));
        let c = melody.add_note(note(64, 20, 10));

        let removed = melody.remove_note(b).unwrap();
        assert!(melody.restore(b, removed));
        assert!(!melody.restore(b, removed));
        let ids: Vec<NoteId> = melody.notes().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![a, b, c]);
        assert_eq!(event_ticks(&melody).len(), 6);
    }

    #[test]
    fn test_replace_entries_brings_back_old_ids() {
        let melody = Melody::new();
        melody.add_note(note(60, 0, 10));
        let before = melody.notes();

        melody.replace_notes([note(61, 0, 5)]);
        melody.replace_entries(before.clone());
        assert_eq!(melody.notes(), before);

        // Fresh ids never collide with restored ones
        let next = melody.add_note(note(70, 0, 5));
        assert!(before.iter().all(|(id, _)| *id != next));
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let melody = Melody::new();
        let a = melody.add_note(note(60, 0, 10));
        melody.remove_note(a);
        let b = melody.add_note(note(60, 0, 10));
        assert_ne!(a, b);
    }
}
