// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Nested, time-shiftable groups of events.
//!
//! A [`Group`] holds events and child groups, each group carrying a beat
//! offset. Iterating a group walks it depth-first, yielding copies of its
//! events shifted by the sum of the offsets above them. The tree itself is
//! never modified by iteration, so a group can be walked any number of
//! times.

use super::event::Event;

/// A tree of events with per-group beat offsets
#[derive(Debug, Clone, PartialEq)]
pub struct Group<E> {
    offset: f64,
    events: Vec<E>,
    subgroups: Vec<Group<E>>,
    name: Option<String>,
}

impl<E> Default for Group<E> {
    fn default() -> Self {
        Self {
            offset: 0.0,
            events: Vec::new(),
            subgroups: Vec::new(),
            name: None,
        }
    }
}

impl<E: Event> Group<E> {
    /// Create an empty group at offset zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group containing `events`
    pub fn from_events(events: impl IntoIterator<Item = E>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Create a group whose children are `groups`
    pub fn from_groups(groups: impl IntoIterator<Item = Group<E>>) -> Self {
        Self {
            subgroups: groups.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Builder-style offset
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Builder-style name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn add_event(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn add_group(&mut self, group: Group<E>) {
        self.subgroups.push(group);
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Events held directly by this group, unshifted
    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [E] {
        &mut self.events
    }

    pub fn subgroups(&self) -> &[Group<E>] {
        &self.subgroups
    }

    pub fn subgroups_mut(&mut self) -> &mut [Group<E>] {
        &mut self.subgroups
    }

    /// Remove every child group called `name`, at any depth. Returns how
    /// many groups were removed.
    pub fn remove_group_by_name(&mut self, name: &str) -> usize {
        let before = self.subgroups.len();
        self.subgroups.retain(|g| g.name.as_deref() != Some(name));
        let mut removed = before - self.subgroups.len();
        for group in &mut self.subgroups {
            removed += group.remove_group_by_name(name);
        }
        removed
    }

    /// Walk every event with absolute timing
    pub fn iter(&self) -> Iter<'_, E> {
        self.iter_from(0.0)
    }

    /// Walk every event, shifting by an extra `base_offset` beats
    pub fn iter_from(&self, base_offset: f64) -> Iter<'_, E> {
        Iter {
            stack: vec![Frame {
                group: self,
                offset: base_offset + self.offset,
                next_event: 0,
                next_group: 0,
            }],
        }
    }

    /// Number of events in the whole tree
    pub fn length(&self) -> usize {
        self.events.len() + self.subgroups.iter().map(Group::length).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }
}

struct Frame<'a, E> {
    group: &'a Group<E>,
    offset: f64,
    next_event: usize,
    next_group: usize,
}

/// Depth-first iterator over a [`Group`].
///
/// A group's own events come first, then each child group in insertion
/// order. The tree must not be modified while an iterator is alive; the
/// borrow checker enforces this.
pub struct Iter<'a, E> {
    stack: Vec<Frame<'a, E>>,
}

impl<'a, E: Event> Iterator for Iter<'a, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        loop {
            let frame = self.stack.last_mut()?;
            let group = frame.group;

            if let Some(event) = group.events.get(frame.next_event) {
                frame.next_event += 1;
                return Some(event.shift(frame.offset));
            }

            if let Some(child) = group.subgroups.get(frame.next_group) {
                frame.next_group += 1;
                let offset = frame.offset + child.offset;
                self.stack.push(Frame {
                    group: child,
                    offset,
                    next_event: 0,
                    next_group: 0,
                });
                continue;
            }

            self.stack.pop();
        }
    }
}

impl<'a, E: Event> IntoIterator for &'a Group<E> {
    type Item = E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Iter<'a, E> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::event::FunctionEvent;

    fn event(beats: f64) -> FunctionEvent {
        FunctionEvent::call(|| {}, beats)
    }

    fn beats(group: &Group<FunctionEvent>) -> Vec<f64> {
        group.iter().map(|e| e.beats).collect()
    }

    #[test]
    fn test_group_basic() {
        let group = Group::from_events([event(1.0), event(2.0)]);
        assert_eq!(beats(&group), vec![1.0, 2.0]);
        assert_eq!(group.length(), 2);
    }

    #[test]
    fn test_group_nested_simple() {
        let subgroup = Group::from_events([event(1.0), event(2.0)]);
        let group = Group::from_groups([subgroup]);
        assert_eq!(beats(&group), vec![1.0, 2.0]);
    }

    #[test]
    fn test_group_nested_order() {
        let sub_subgroup = Group::from_events([event(1.0), event(2.0)]);
        let mut subgroup = Group::from_groups([sub_subgroup]);
        subgroup.add_event(event(3.0));
        subgroup.add_event(event(4.0));
        let mut group = Group::from_groups([subgroup]);
        group.add_event(event(5.0));

        // Direct events before subgroups at every level
        assert_eq!(beats(&group), vec![5.0, 3.0, 4.0, 1.0, 2.0]);
        assert_eq!(group.length(), 5);
    }

    #[test]
    fn test_group_nested_offsets() {
        let sub_sub1 = Group::from_events([event(0.0)]);
        let sub_sub2 = Group::from_events([event(0.0)]);
        let sub1 = Group::from_groups([sub_sub1]);
        let sub2 = Group::from_groups([sub_sub2]).with_offset(16.0);
        let top = Group::from_groups([sub1, sub2]);
        assert_eq!(beats(&top), vec![0.0, 16.0]);
    }

    #[test]
    fn test_offsets_accumulate() {
        let leaf = Group::from_events([event(1.0)]).with_offset(2.0);
        let middle = Group::from_groups([leaf]).with_offset(4.0);
        let top = Group::from_groups([middle]).with_offset(8.0);
        assert_eq!(beats(&top), vec![15.0]);
        assert_eq!(top.iter_from(100.0).map(|e| e.beats).collect::<Vec<_>>(), vec![115.0]);
    }

    #[test]
    fn test_iteration_is_restartable_and_pure() {
        let mut group = Group::from_events([event(1.0)]);
        group.set_offset(3.0);
        let first: Vec<f64> = beats(&group);
        let second: Vec<f64> = beats(&group);
        assert_eq!(first, second);
        assert_eq!(group.events()[0].beats, 1.0);
    }

    #[test]
    fn test_remove_group_by_name() {
        let arpeggio = Group::from_events([event(1.0)]).with_name("arpeggio");
        let nested_arpeggio = Group::from_events([event(2.0)]).with_name("arpeggio");
        let keep = Group::from_groups([nested_arpeggio]).with_name("melody");
        let mut top = Group::from_groups([arpeggio, keep]);
        top.add_event(event(0.0));

        assert_eq!(top.remove_group_by_name("arpeggio"), 2);
        assert_eq!(beats(&top), vec![0.0]);
        assert_eq!(top.subgroups().len(), 1);
        assert_eq!(top.subgroups()[0].name(), Some("melody"));
        assert_eq!(top.remove_group_by_name("arpeggio"), 0);
    }

    #[test]
    fn test_empty_group() {
        let group: Group<FunctionEvent> = Group::new();
        assert!(group.is_empty());
        assert_eq!(group.iter().count(), 0);
    }
}
