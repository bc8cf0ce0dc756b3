//! Structured phase/wave telemetry.
//!
//! [`crate::pipeline`] always emits `tracing` spans and events regardless of
//! build configuration — those are free. This module adds serde-serializable
//! event types, enabled only by the `telemetry` feature, for external
//! tooling that wants to ingest phase/wave transitions as structured JSON
//! rather than parse log lines.

#[cfg(feature = "telemetry")]
use serde::Serialize;

/// One phase's completion during a tick, emitted by [`crate::pipeline::SerialGroup`]
/// and [`crate::pipeline::ParallelGroup`] after every child `Phase::run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "telemetry", derive(Serialize))]
pub struct PhaseChanged {
    /// Tick this phase ran under.
    pub tick: u64,
    /// The phase's [`crate::pipeline::Phase::name`].
    pub phase: &'static str,
    /// Whether the phase returned an error (recorded, not fatal to the
    /// tick).
    pub errored: bool,
}

/// The Message phase's wave cascade outcome, reported alongside
/// [`crate::pipeline::TickReport::wave_result`] in serializable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "telemetry", derive(Serialize))]
pub struct MessagePhaseResult {
    /// Number of full drain passes performed this tick.
    pub wave_count: u32,
    /// Whether the cascade was aborted at `max_wave_depth`.
    pub max_depth_reached: bool,
}

impl From<crate::wave::WaveResult> for MessagePhaseResult {
    fn from(result: crate::wave::WaveResult) -> Self {
        match result {
            crate::wave::WaveResult::Converged { wave_count } => Self {
                wave_count,
                max_depth_reached: false,
            },
            crate::wave::WaveResult::DepthExceeded => Self {
                wave_count: 0,
                max_depth_reached: true,
            },
        }
    }
}

/// Records a phase completion: always as a `tracing` event; additionally as
/// a structured JSON line when the `telemetry` feature is enabled.
pub fn phase_changed(tick: u64, phase: &'static str, errored: bool) {
    let event = PhaseChanged { tick, phase, errored };
    tracing::trace!(tick = event.tick, phase = event.phase, errored = event.errored, "phase changed");
    emit_json(&event);
}

#[cfg(feature = "telemetry")]
fn emit_json(event: &PhaseChanged) {
    if let Ok(json) = serde_json::to_string(event) {
        tracing::info!(target: "echo_sim_core::telemetry", phase_changed = %json);
    }
}

#[cfg(not(feature = "telemetry"))]
fn emit_json(_event: &PhaseChanged) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wave::WaveResult;

    #[test]
    fn converged_maps_to_message_phase_result() {
        let result: MessagePhaseResult = WaveResult::Converged { wave_count: 3 }.into();
        assert_eq!(result, MessagePhaseResult { wave_count: 3, max_depth_reached: false });
    }

    #[test]
    fn depth_exceeded_maps_to_message_phase_result() {
        let result: MessagePhaseResult = WaveResult::DepthExceeded.into();
        assert!(result.max_depth_reached);
    }

    #[test]
    fn phase_changed_does_not_panic_without_telemetry_feature() {
        phase_changed(1, "collision", false);
    }
}
