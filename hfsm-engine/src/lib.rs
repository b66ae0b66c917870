//! # hfsm-engine
//!
//! The transition engine and run-to-completion dispatcher, assembled into
//! a `StateMachineBuilder` / `StateMachine` pair on top of `hfsm-graph`'s
//! state tree and `hfsm-hub`'s event queue.

mod dispatcher;
mod machine;
mod transition;

pub use dispatcher::Dispatcher;
pub use machine::{StateMachine, StateMachineBuilder};
pub use transition::{Transition, TransitionSpec, TransitionTable};

pub use hfsm_graph::{StateGraph, StateId, StateSpec};
