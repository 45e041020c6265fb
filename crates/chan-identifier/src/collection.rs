//! Ordered identifier storage
//!
//! The collection is the single source of truth for a channel's identifiers.
//! Entries are keyed by (class, form, timeslot) and kept in insertion order so
//! a full replay is deterministic. Mutating operations return the
//! notifications they produce; the owning channel decides where each
//! notification is routed. Notifications received from elsewhere are applied
//! without producing new ones — collections never echo, which is what keeps
//! identifier exchange between channels loop-free.

use crate::identifier::{
    Identifier, IdentifierClass, IdentifierForm, IdentifierUpdateNotification,
};

#[derive(Debug, Clone)]
struct Entry {
    timeslot: usize,
    identifier: Identifier,
}

/// Ordered, keyed store of a channel's identifiers
#[derive(Debug, Clone)]
pub struct IdentifierCollection {
    /// Base timeslot for updates that don't specify one (0 = channel-wide)
    timeslot: usize,
    entries: Vec<Entry>,
}

impl IdentifierCollection {
    /// Create an empty collection associated with the given base timeslot
    pub fn new(timeslot: usize) -> Self {
        Self {
            timeslot,
            entries: Vec::new(),
        }
    }

    /// Base timeslot of this collection
    pub fn timeslot(&self) -> usize {
        self.timeslot
    }

    /// Merge-or-insert an identifier at the collection's base timeslot
    ///
    /// Replaces any existing entry with the same (class, form, timeslot) key
    /// in place, preserving its position in replay order. Returns the single
    /// notification this update produces.
    pub fn update(&mut self, identifier: Identifier) -> IdentifierUpdateNotification {
        self.update_for_timeslot(identifier, self.timeslot)
    }

    /// Merge-or-insert an identifier at an explicit timeslot
    pub fn update_for_timeslot(
        &mut self,
        identifier: Identifier,
        timeslot: usize,
    ) -> IdentifierUpdateNotification {
        self.apply(identifier.clone(), timeslot);
        IdentifierUpdateNotification::add(identifier, timeslot)
    }

    /// Apply an externally-originated notification
    ///
    /// Updates internal state only; no notification is produced in response.
    pub fn receive(&mut self, notification: &IdentifierUpdateNotification) {
        self.apply(notification.identifier.clone(), notification.timeslot);
    }

    /// Purge every entry of the given classification
    pub fn remove(&mut self, class: IdentifierClass) {
        self.entries
            .retain(|entry| entry.identifier.class() != class);
    }

    /// Replay the entire collection as one notification per entry, in stored
    /// order
    pub fn broadcast_identifiers(&self) -> Vec<IdentifierUpdateNotification> {
        self.entries
            .iter()
            .map(|entry| IdentifierUpdateNotification::add(entry.identifier.clone(), entry.timeslot))
            .collect()
    }

    /// Look up an identifier by class and form at the base timeslot
    pub fn get(&self, class: IdentifierClass, form: IdentifierForm) -> Option<&Identifier> {
        self.get_for_timeslot(class, form, self.timeslot)
    }

    /// Look up an identifier by class, form and timeslot
    pub fn get_for_timeslot(
        &self,
        class: IdentifierClass,
        form: IdentifierForm,
        timeslot: usize,
    ) -> Option<&Identifier> {
        self.entries
            .iter()
            .find(|entry| {
                entry.timeslot == timeslot
                    && entry.identifier.class() == class
                    && entry.identifier.form() == form
            })
            .map(|entry| &entry.identifier)
    }

    /// Iterate over all identifiers in stored order
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter().map(|entry| &entry.identifier)
    }

    /// Number of stored identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn apply(&mut self, identifier: Identifier, timeslot: usize) {
        let key = (identifier.class(), identifier.form());
        match self.entries.iter_mut().find(|entry| {
            entry.timeslot == timeslot
                && (entry.identifier.class(), entry.identifier.form()) == key
        }) {
            Some(entry) => entry.identifier = identifier,
            None => self.entries.push(Entry {
                timeslot,
                identifier,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::IdentifierOperation;

    #[test]
    fn test_update_replaces_in_place() {
        let mut collection = IdentifierCollection::new(0);
        collection.update(Identifier::channel_name("Dispatch"));
        collection.update(Identifier::talkgroup(100));
        collection.update(Identifier::channel_name("Dispatch North"));

        assert_eq!(collection.len(), 2);
        let names: Vec<_> = collection.identifiers().map(|id| id.form()).collect();
        // Replaced entry keeps its original position
        assert_eq!(
            names,
            vec![IdentifierForm::ChannelName, IdentifierForm::Talkgroup]
        );
    }

    #[test]
    fn test_update_returns_one_add_notification() {
        let mut collection = IdentifierCollection::new(0);
        let notification = collection.update(Identifier::frequency(154_250_000));

        assert_eq!(notification.operation, IdentifierOperation::Add);
        assert_eq!(notification.timeslot, 0);
        assert_eq!(notification.identifier, Identifier::frequency(154_250_000));
    }

    #[test]
    fn test_remove_purges_only_one_class() {
        let mut collection = IdentifierCollection::new(0);
        collection.update(Identifier::channel_name("Dispatch"));
        collection.update(Identifier::frequency(154_250_000));
        collection.update(Identifier::talkgroup(4571));
        collection.update(Identifier::radio_id(90210));

        collection.remove(IdentifierClass::User);

        assert_eq!(collection.len(), 2);
        assert!(collection
            .identifiers()
            .all(|id| id.class() == IdentifierClass::Configuration));
    }

    #[test]
    fn test_receive_applies_without_echo() {
        let mut collection = IdentifierCollection::new(0);
        collection.update(Identifier::frequency(154_250_000));

        let silent =
            IdentifierUpdateNotification::silent_add(Identifier::frequency(155_700_000), 0);
        collection.receive(&silent);

        let stored = collection
            .get(IdentifierClass::Configuration, IdentifierForm::ChannelFrequency)
            .unwrap();
        assert_eq!(stored, &Identifier::frequency(155_700_000));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_broadcast_replays_in_insertion_order() {
        let mut collection = IdentifierCollection::new(0);
        collection.update(Identifier::decoder_type("P25 Phase 1"));
        collection.update(Identifier::system("Metro"));
        collection.update(Identifier::site("North Sim"));

        let replay = collection.broadcast_identifiers();
        let forms: Vec<_> = replay
            .iter()
            .map(|notification| notification.identifier.form())
            .collect();

        assert_eq!(
            forms,
            vec![
                IdentifierForm::DecoderType,
                IdentifierForm::System,
                IdentifierForm::Site
            ]
        );
        assert!(replay.iter().all(|n| !n.is_silent()));
    }

    #[test]
    fn test_timeslot_scoped_entries_coexist() {
        let mut collection = IdentifierCollection::new(0);
        collection.update_for_timeslot(Identifier::talkgroup(100), 0);
        collection.update_for_timeslot(Identifier::talkgroup(200), 1);

        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection
                .get_for_timeslot(IdentifierClass::User, IdentifierForm::Talkgroup, 1)
                .unwrap(),
            &Identifier::talkgroup(200)
        );
    }
}
