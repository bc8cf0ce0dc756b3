//! Reentrant, priority-ordered command queue underlying the Message phase's
//! wave processor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Ordering key messages may optionally provide; ties break on enqueue
/// order (FIFO).
pub trait Prioritized {
    /// Higher values drain first within one wave.
    fn priority(&self) -> i32;
}

struct Queued<Msg> {
    sequence: u64,
    payload: Msg,
}

/// A single queue of pending messages of one type, drained in discrete
/// batches ("waves") by [`crate::wave::WaveProcessor`].
///
/// # Reentrancy
/// `enqueue` may be called while a previous [`Self::drain_wave`] call's
/// returned batch is still being processed by a handler — handlers commonly
/// enqueue follow-up messages reactively. Because `drain_wave` swaps the
/// pending buffer out before returning it, anything enqueued during handler
/// execution lands in the *next* wave's buffer, never the one currently
/// being iterated.
///
/// # Pooling
/// Drained buffers are returned to an internal pool via [`Self::recycle`]
/// once a wave finishes processing them, so steady-state operation does not
/// allocate a fresh `Vec` per wave.
pub struct CommandQueue<Msg> {
    pending: Mutex<Vec<Queued<Msg>>>,
    pool: Mutex<Vec<Vec<Queued<Msg>>>>,
    next_sequence: AtomicU64,
}

impl<Msg> CommandQueue<Msg> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            pool: Mutex::new(Vec::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Enqueues `payload`, stamping it with the next monotonic sequence
    /// number for FIFO tie-breaking.
    pub fn enqueue(&self, payload: Msg) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.push(Queued { sequence, payload });
    }

    /// Whether any message is currently pending (not yet drained into a
    /// wave).
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner).is_empty()
    }

    /// Swaps out the current pending buffer, sorts it by descending
    /// priority with ascending-sequence tie-break, and returns the payloads
    /// in that order. Returns an empty `Vec` if nothing was pending.
    pub fn drain_wave(&self) -> Vec<Msg>
    where
        Msg: Prioritized,
    {
        let fresh = self.pool.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pop().unwrap_or_default();
        let mut batch = {
            let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            std::mem::replace(&mut *pending, fresh)
        };
        batch.sort_by(|a, b| {
            b.payload
                .priority()
                .cmp(&a.payload.priority())
                .then(a.sequence.cmp(&b.sequence))
        });
        let payloads = batch.drain(..).map(|q| q.payload).collect();
        self.recycle(batch);
        payloads
    }

    /// Returns a drained buffer's backing storage to the pool for reuse by
    /// a future [`Self::drain_wave`] call.
    fn recycle(&self, mut buf: Vec<Queued<Msg>>) {
        buf.clear();
        self.pool.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(buf);
    }
}

impl<Msg> Default for CommandQueue<Msg> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Clone, Copy)]
    struct Msg {
        tag: &'static str,
        priority: i32,
    }

    impl Prioritized for Msg {
        fn priority(&self) -> i32 {
            self.priority
        }
    }

    #[test]
    fn drains_by_priority_desc_then_fifo() {
        let queue = CommandQueue::new();
        queue.enqueue(Msg { tag: "low-a", priority: 0 });
        queue.enqueue(Msg { tag: "high", priority: 10 });
        queue.enqueue(Msg { tag: "low-b", priority: 0 });

        let drained = queue.drain_wave();
        let tags: Vec<_> = drained.iter().map(|m| m.tag).collect();
        assert_eq!(tags, vec!["high", "low-a", "low-b"]);
    }

    #[test]
    fn enqueue_during_drain_lands_in_next_wave() {
        let queue = CommandQueue::new();
        queue.enqueue(Msg { tag: "first", priority: 0 });
        let first_wave = queue.drain_wave();
        assert_eq!(first_wave.len(), 1);

        for msg in &first_wave {
            queue.enqueue(Msg {
                tag: "reactive",
                priority: msg.priority,
            });
        }
        assert!(queue.has_pending());
        let second_wave = queue.drain_wave();
        assert_eq!(second_wave.len(), 1);
        assert_eq!(second_wave[0].tag, "reactive");
    }

    #[test]
    fn empty_queue_drains_empty() {
        let queue: CommandQueue<Msg> = CommandQueue::new();
        assert!(queue.drain_wave().is_empty());
    }
}
