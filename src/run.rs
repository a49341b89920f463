use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Owner side of the at-most-one-run rule.
///
/// Every call to [`RunSlot::begin`] hands out a [`RunTicket`] and invalidates all
/// earlier tickets of the same slot. Samplers check their ticket between chunks and
/// stop as cancelled once it is superseded, so only the newest run may commit.
#[derive(Clone, Debug, Default)]
pub struct RunSlot {
    generation: Arc<AtomicU64>,
}

/// Token held by one run. Cheap to clone and safe to check from any thread.
#[derive(Clone, Debug)]
pub struct RunTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl RunSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new run, superseding any outstanding ticket.
    pub fn begin(&self) -> RunTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        RunTicket {
            generation,
            current: Arc::clone(&self.generation),
        }
    }

    /// Supersedes every outstanding ticket without starting a new run.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    pub fn is_superseded(&self) -> bool {
        !self.is_current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let slot = RunSlot::new();
        let first = slot.begin();
        assert!(first.is_current());

        let second = slot.begin();
        assert!(first.is_superseded());
        assert!(second.is_current());
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn test_cancel_all() {
        let slot = RunSlot::new();
        let ticket = slot.begin();
        slot.cancel_all();
        assert!(ticket.is_superseded());
        assert!(slot.begin().is_current());
    }

    #[test]
    fn test_ticket_observed_across_threads() {
        let slot = RunSlot::new();
        let ticket = slot.begin();
        let handle = std::thread::spawn(move || ticket.is_current());
        assert!(handle.join().unwrap());

        let ticket = slot.begin();
        let other = slot.clone();
        std::thread::spawn(move || {
            other.begin();
        })
        .join()
        .unwrap();
        assert!(ticket.is_superseded());
    }
}
