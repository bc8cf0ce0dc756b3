//! Deterministic tick-driven game simulation runtime.
//!
//! This crate provides the composable substrate for action-game–style
//! entity logic, not a full engine: a generational handle arena, an entity
//! context registry, a priority-driven action selector, a per-category
//! action state machine, a cascading message wave processor, and a
//! fixed-order phase pipeline that stitches the rest together into one
//! deterministic tick.
//!
//! # Module map
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`ident`] / [`arena`] | Generational handles and the slot arena that validates them. |
//! | [`registry`] | Entity context storage, active/deletion-marked ordering. |
//! | [`category`] | Per-entity action category enumeration and exclusivity rules. |
//! | [`priority`] | Totally ordered [`priority::ActionPriority`]. |
//! | [`action`] | Immutable [`action::ActionDefinition`]s and live [`action::ExecutableAction`]s. |
//! | [`trigger`] | Stateful input triggers ([`trigger::Press`], [`trigger::Hold`], [`trigger::Charge`], ...). |
//! | [`judgment`] | Candidate-action descriptors the selector chooses among. |
//! | [`selector`] | Deterministic priority/exclusivity action selection. |
//! | [`state_machine`] | Per-category running-action advancement and lifecycle hooks. |
//! | [`command_queue`] / [`wave`] | Reentrant command queues and the wave cascade that drains them. |
//! | [`reconciliation`] | Dependency-ordered resolution and push-out accumulation. |
//! | [`query_cache`] | Per-tick memoization shared across phases. |
//! | [`pipeline`] | The six canonical phases composed into one [`pipeline::Pipeline::run_tick`]. |
//! | [`ports`] | Traits the embedding game implements to supply world state. |
//! | [`telemetry`] | Structured phase/wave events, serializable behind the `telemetry` feature. |
//!
//! None of these subsystems reach for global state: a [`pipeline::Pipeline`],
//! [`registry::EntityContextRegistry`], and every [`arena::HandleArena`] are
//! explicit values the embedding game constructs and owns.

pub mod action;
pub mod arena;
pub mod category;
pub mod command_queue;
pub mod ident;
pub mod judgment;
pub mod pipeline;
pub mod ports;
pub mod priority;
pub mod query_cache;
pub mod reconciliation;
pub mod registry;
pub mod selector;
pub mod state_machine;
pub mod telemetry;
pub mod trigger;
pub mod wave;

pub use action::{ActionDefinition, ExecutableAction, FrameWindow};
pub use category::{CategoryRules, CategorySet};
pub use ident::{AnyHandle, Generation, Handle};
pub use pipeline::{CancelToken, Phase, Pipeline, PipelineBuilder, SimConfig, SystemContext, TickReport};
pub use priority::ActionPriority;
pub use registry::{EntityContext, EntityContextRegistry};
pub use selector::{ActionSelector, SelectionOutcome, SelectionResult};
pub use state_machine::{ActionExecutorHooks, ActionStateMachine, StartOutcome};
pub use wave::WaveResult;
