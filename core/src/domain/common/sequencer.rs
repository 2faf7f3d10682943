use std::sync::atomic::{AtomicU64, Ordering};

/// Issues increasing tickets so that only the most recent request may apply
/// its result.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.begin();
        assert!(sequencer.is_latest(first));

        let second = sequencer.begin();
        assert!(!sequencer.is_latest(first));
        assert!(sequencer.is_latest(second));
        assert!(second > first);
    }
}
