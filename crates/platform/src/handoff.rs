//! Write-once handoff slot between loader threads and the frame loop.

use std::sync::Arc;

use parking_lot::Mutex;

/// Shared nullable slot: background producers [`publish`](Handoff::publish)
/// (last writer wins), the frame loop [`take`](Handoff::take)s at most one
/// value. With a single producer per slot this is a write-once handoff,
/// which is what makes draining it every frame idempotent.
pub struct Handoff<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Handoff<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Store a value, replacing any unconsumed one.
    pub fn publish(&self, value: T) {
        *self.slot.lock() = Some(value);
    }

    /// Consume the value if one has arrived.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }
}

impl<T> Clone for Handoff<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Handoff<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_yields_nothing() {
        let slot: Handoff<u32> = Handoff::new();
        // Frame ticks before any load completes: nothing to consume.
        for _ in 0..10 {
            assert_eq!(slot.take(), None);
        }
    }

    #[test]
    fn published_value_is_taken_exactly_once() {
        let slot = Handoff::new();
        slot.publish(7u32);

        let mut uploads = 0;
        for _ in 0..100 {
            if slot.take().is_some() {
                uploads += 1;
            }
        }
        assert_eq!(uploads, 1);
    }

    #[test]
    fn last_writer_wins() {
        let slot = Handoff::new();
        slot.publish("first");
        slot.publish("second");
        assert_eq!(slot.take(), Some("second"));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn crosses_threads() {
        let slot = Handoff::new();
        let producer = slot.clone();
        let handle = std::thread::spawn(move || producer.publish(vec![1u8, 2, 3]));
        handle.join().expect("producer thread");
        assert_eq!(slot.take(), Some(vec![1, 2, 3]));
    }
}
