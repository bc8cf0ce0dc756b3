//! Message wave cascades: repeated full-queue drains until no queue has
//! anything left to process, or a depth bound is hit.

use std::sync::Arc;

use crate::command_queue::{CommandQueue, Prioritized};

/// Result of running [`WaveProcessor::process_all_waves`] to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveResult {
    /// Every registered queue drained empty within `wave_count` waves.
    Converged {
        /// Number of waves that processed at least one message, not
        /// counting the terminal all-empty pass that detected convergence.
        wave_count: u32,
    },
    /// The configured maximum wave depth was reached with at least one
    /// queue still producing messages. The cascade is treated as aborted
    /// for this tick rather than run unbounded; whatever was already
    /// dispatched stands.
    DepthExceeded,
}

/// One registered message type's drain-and-dispatch step, type-erased so a
/// [`WaveProcessor`] can hold queues of different message types in one
/// ordered list.
trait WaveQueue {
    /// Drains one wave's worth of pending messages and dispatches each to
    /// its handler. Returns whether anything was processed.
    fn process_wave(&self) -> bool;
}

struct HandledQueue<Msg, F> {
    queue: Arc<CommandQueue<Msg>>,
    handler: F,
}

impl<Msg, F> WaveQueue for HandledQueue<Msg, F>
where
    Msg: Prioritized,
    F: Fn(Msg) + Send + Sync,
{
    fn process_wave(&self) -> bool {
        let batch = self.queue.drain_wave();
        if batch.is_empty() {
            return false;
        }
        for msg in batch {
            (self.handler)(msg);
        }
        true
    }
}

/// Drives one or more [`CommandQueue`]s through repeated drain passes until
/// every queue produces nothing new in a pass, or `max_wave_depth` passes
/// have run.
///
/// Queues are processed each wave in the exact order they were registered
/// via [`Self::register`]; this ordering is load-bearing whenever two
/// queues' handlers can observe each other's side effects within the same
/// wave.
pub struct WaveProcessor {
    queues: Vec<Box<dyn WaveQueue + Send + Sync>>,
    max_wave_depth: u32,
}

impl WaveProcessor {
    /// Creates a processor bounding cascades to `max_wave_depth` passes.
    #[must_use]
    pub fn new(max_wave_depth: u32) -> Self {
        Self {
            queues: Vec::new(),
            max_wave_depth,
        }
    }

    /// Registers `queue` with `handler`, appended after any previously
    /// registered queue.
    pub fn register<Msg>(&mut self, queue: Arc<CommandQueue<Msg>>, handler: impl Fn(Msg) + Send + Sync + 'static)
    where
        Msg: Prioritized + Send + Sync + 'static,
    {
        self.queues.push(Box::new(HandledQueue { queue, handler }));
    }

    /// Runs drain passes across every registered queue, in registration
    /// order, until a pass drains every queue empty or `max_wave_depth` is
    /// reached.
    ///
    /// `wave_count` reports the number of waves that actually processed at
    /// least one message, not counting the terminal all-empty pass that
    /// detects convergence — an empty processor (or one that stops
    /// producing new messages after wave N) converges with `wave_count = N`,
    /// not `N + 1`.
    pub fn process_all_waves(&self) -> WaveResult {
        for wave in 1..=self.max_wave_depth {
            let mut any_processed = false;
            for queue in &self.queues {
                if queue.process_wave() {
                    any_processed = true;
                }
            }
            if !any_processed {
                return WaveResult::Converged { wave_count: wave - 1 };
            }
        }
        WaveResult::DepthExceeded
    }
}
