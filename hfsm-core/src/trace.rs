//! The abstract trace sink.
//!
//! The core never commits to a logging facility: it emits diagnostic
//! records through this trait, and a host application wires up whatever
//! it likes (see `hfsm-trace` for a `log`-crate-backed implementation).

use std::fmt;

/// Severity of a trace record, mirroring `log::Level`'s five levels so a
/// `Trace` implementation can forward records to `log` without lossy
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// A single diagnostic record emitted by the engine.
pub struct TraceRecord<'a> {
    pub level: TraceLevel,
    /// The component that produced the record, e.g. `"hub"`, `"dispatcher"`.
    pub context: &'static str,
    pub message: fmt::Arguments<'a>,
}

/// Abstract diagnostic sink.
///
/// Implementations must not block the caller for long: `trace` is called
/// from hot paths (event send, dispatch, transition) with no lock held,
/// but a slow sink still serializes against whichever thread is
/// currently dispatching.
pub trait Trace: Send + Sync {
    fn trace(&self, record: TraceRecord<'_>);
}

/// A [`Trace`] implementation that discards every record. The engine's
/// default when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl Trace for NoopTrace {
    fn trace(&self, _record: TraceRecord<'_>) {}
}

/// Emit a trace record through a `&dyn Trace`, building the
/// `fmt::Arguments` in place. Mirrors the shape of `log::log!`.
#[macro_export]
macro_rules! trace {
    ($sink:expr, $level:expr, $ctx:expr, $($arg:tt)+) => {
        $sink.trace($crate::TraceRecord {
            level: $level,
            context: $ctx,
            message: format_args!($($arg)+),
        })
    };
}
