//! # hfsm-graph
//!
//! The state tree: parent pointers, entry/exit/invoke callback storage,
//! and the ancestor-chain / least-common-ancestor algorithms the
//! transition engine builds on.

mod state;

pub use state::{EntryExitAction, InvokeAction, State, StateGraph, StateId, StateSpec};

/// Maximum supported nesting depth of the state hierarchy.
pub const MAX_STATE_DEPTH: usize = 8;
