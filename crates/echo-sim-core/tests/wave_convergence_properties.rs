#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use echo_sim_core::command_queue::{CommandQueue, Prioritized};
use echo_sim_core::wave::{WaveProcessor, WaveResult};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
struct ChainMsg {
    depth: u32,
}

impl Prioritized for ChainMsg {
    fn priority(&self) -> i32 {
        0
    }
}

proptest! {
    // A single self-forwarding queue that stops enqueueing once it reaches
    // `stop_depth` must converge in exactly `stop_depth` waves (one wave per
    // message actually handled), never fewer, never more, as long as
    // `max_wave_depth` leaves enough headroom.
    #[test]
    fn converges_in_exactly_stop_depth_waves(stop_depth in 1u32..20) {
        let queue = Arc::new(CommandQueue::new());
        queue.enqueue(ChainMsg { depth: 0 });
        let handled = Arc::new(AtomicU32::new(0));
        let handled_cb = handled.clone();
        let enqueue_queue = queue.clone();

        let mut processor = WaveProcessor::new(stop_depth + 10);
        processor.register(queue, move |msg: ChainMsg| {
            handled_cb.fetch_add(1, Ordering::SeqCst);
            if msg.depth + 1 < stop_depth {
                enqueue_queue.enqueue(ChainMsg { depth: msg.depth + 1 });
            }
        });

        let result = processor.process_all_waves();
        prop_assert_eq!(handled.load(Ordering::SeqCst), stop_depth);
        prop_assert_eq!(result, WaveResult::Converged { wave_count: stop_depth });
    }

    // A cascade that never stops enqueueing always reports `DepthExceeded`
    // once it runs past `max_wave_depth`, regardless of how many queues are
    // registered alongside it.
    #[test]
    fn never_ending_cascade_always_exceeds_depth(max_wave_depth in 1u32..16, extra_queues in 0usize..4) {
        let queue = Arc::new(CommandQueue::new());
        queue.enqueue(ChainMsg { depth: 0 });
        let enqueue_queue = queue.clone();

        let mut processor = WaveProcessor::new(max_wave_depth);
        processor.register(queue, move |msg: ChainMsg| {
            enqueue_queue.enqueue(msg);
        });
        for _ in 0..extra_queues {
            let idle: Arc<CommandQueue<ChainMsg>> = Arc::new(CommandQueue::new());
            processor.register(idle, |_msg: ChainMsg| {});
        }

        prop_assert_eq!(processor.process_all_waves(), WaveResult::DepthExceeded);
    }

    // A processor with no registered queues at all converges at wave 0 no
    // matter how generous the depth bound is.
    #[test]
    fn idle_processor_always_converges_at_zero(max_wave_depth in 1u32..64) {
        let processor = WaveProcessor::new(max_wave_depth);
        prop_assert_eq!(processor.process_all_waves(), WaveResult::Converged { wave_count: 0 });
    }
}
