//! Generation-tagged dataset storage.
//!
//! Fetches are not cancelled when filters change again mid-flight, so a
//! response can arrive for a query that is no longer wanted. Each dataset
//! lives in a [`Slot`] that hands out a [`Ticket`] per fetch and applies a
//! result only when its ticket is still the newest one issued. The dataset
//! therefore always reflects the last fetch issued, regardless of arrival
//! order.

/// A dataset guarded by a fetch generation counter.
#[derive(Debug)]
pub struct Slot<T> {
    value: Option<T>,
    issued: u64,
}

/// Proof of which fetch generation a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl<T> Slot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: None,
            issued: 0,
        }
    }

    /// Registers a new fetch, superseding every ticket issued before.
    pub const fn begin(&mut self) -> Ticket {
        self.issued += 1;
        Ticket {
            generation: self.issued,
        }
    }

    /// Applies `value` if `ticket` is still current.
    ///
    /// Returns whether the value was applied. A superseded ticket leaves
    /// the stored value untouched and the result is dropped.
    pub fn commit(&mut self, ticket: Ticket, value: T) -> bool {
        if ticket.generation == self.issued {
            self.value = Some(value);
            true
        } else {
            log::debug!(
                "discarding stale result: generation {} superseded by {}",
                ticket.generation,
                self.issued
            );
            false
        }
    }

    /// Returns the stored value, if any fetch has succeeded yet.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_applies_current_ticket() {
        let mut slot = Slot::new();
        assert_eq!(slot.value(), None);

        let ticket = slot.begin();
        assert!(slot.commit(ticket, vec!["a"]));
        assert_eq!(slot.value(), Some(&vec!["a"]));
    }

    #[test]
    fn later_issue_wins_regardless_of_arrival_order() {
        let mut slot = Slot::new();
        let first = slot.begin();
        let second = slot.begin();

        // The second fetch responds first, then the first one trickles in.
        assert!(slot.commit(second, "second"));
        assert!(!slot.commit(first, "first"));
        assert_eq!(slot.value(), Some(&"second"));
    }

    #[test]
    fn stale_commit_never_clears_a_value() {
        let mut slot = Slot::new();
        let first = slot.begin();
        assert!(slot.commit(first, 1));

        let _second = slot.begin();
        let third = slot.begin();
        assert!(!slot.commit(first, 99));
        assert_eq!(slot.value(), Some(&1));

        assert!(slot.commit(third, 3));
        assert_eq!(slot.value(), Some(&3));
    }

    #[test]
    fn each_begin_supersedes_the_previous_ticket() {
        let mut slot: Slot<u8> = Slot::new();
        let old = slot.begin();
        let new = slot.begin();
        assert_ne!(old, new);
        assert!(!slot.commit(old, 1));
        assert!(slot.commit(new, 2));
    }
}
