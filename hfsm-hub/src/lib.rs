//! # hfsm-hub
//!
//! The Event Hub: a bounded, three-lane priority queue coupled to a
//! single worker thread that calls back into a dispatcher for every
//! event it pops. Producers never block on dispatch, only briefly on the
//! queue's mutex; the worker blocks on a condition variable when idle.

mod queue;

pub use queue::{EventHub, DEFAULT_CAPACITY};
