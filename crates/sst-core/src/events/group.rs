use std::collections::HashMap;

use crate::proto::Event;

#[derive(Debug, Clone, PartialEq)]
pub struct EventGroup<'a> {
    pub event_type: &'a str,
    pub events: Vec<&'a Event>,
}

/// Events partitioned by type. Groups are ordered by the first appearance of
/// their type; each group keeps the input order of its members.
#[derive(Debug, Clone, Default)]
pub struct EventGroups<'a> {
    groups: Vec<EventGroup<'a>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> EventGroups<'a> {
    pub fn get(&self, event_type: &str) -> Option<&EventGroup<'a>> {
        self.index.get(event_type).map(|&slot| &self.groups[slot])
    }

    pub fn types(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.groups.iter().map(|group| group.event_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventGroup<'a>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn push(&mut self, event: &'a Event) {
        let event_type = event.event_type.as_str();
        match self.index.get(event_type) {
            Some(&slot) => self.groups[slot].events.push(event),
            None => {
                self.index.insert(event_type, self.groups.len());
                self.groups.push(EventGroup {
                    event_type,
                    events: vec![event],
                });
            }
        }
    }
}

pub fn group_by_type(events: &[Event]) -> EventGroups<'_> {
    let mut groups = EventGroups::default();
    for event in events {
        groups.push(event);
    }
    groups
}
