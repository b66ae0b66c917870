#![forbid(unsafe_code)]

//! # hfsm-core
//!
//! Core types and traits for the hfsm-rs hierarchical state machine engine.
//! This crate provides the event, priority, error, and trace abstractions
//! shared by every other crate in the workspace.

pub mod events;
pub mod priorities;
pub mod trace;

pub use events::{Event, EventId};
pub use priorities::Priority;
pub use trace::{NoopTrace, Trace, TraceLevel, TraceRecord};

/// Result type used throughout the hfsm-rs engine.
pub type HfsmResult<T> = Result<T, Error>;

/// Error taxonomy for the engine's synchronous API surface.
///
/// Every variant corresponds to one of the error codes named in the
/// engine's external contract: configuration errors, lifecycle errors,
/// and resource-exhaustion errors are all distinguished so callers can
/// react appropriately instead of matching on a single catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A required argument was null/absent (e.g. an unset initial state).
    #[error("null argument")]
    NullArgument,
    /// A fixed-capacity resource (queue, ancestor-path buffer) is exhausted.
    #[error("allocation exhausted")]
    AllocationExhausted,
    /// A referenced state id does not exist in the graph.
    #[error("no such state")]
    NoSuchState,
    /// The event hub's queue rejected an event (full, or hub shut down).
    #[error("queue failure")]
    QueueFailure,
    /// A transition was registered with a (source, target) pair already in use.
    #[error("duplicate transition")]
    DuplicateTransition,
    /// A configuration call was made after the machine started running.
    #[error("machine already running")]
    MachineAlreadyRunning,
    /// A state's ancestor chain exceeds the maximum supported nesting depth.
    #[error("state nesting exceeds maximum depth")]
    StateSizeOverflow,
}
