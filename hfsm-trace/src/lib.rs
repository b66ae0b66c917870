//! # hfsm-trace
//!
//! A [`Trace`] implementation that forwards engine diagnostics to the
//! `log` crate, so any `log`-compatible logger (`env_logger`, `tracing-log`,
//! etc.) picks them up without the core depending on a concrete backend.

use hfsm_core::{Trace, TraceLevel, TraceRecord};

fn to_log_level(level: TraceLevel) -> log::Level {
    match level {
        TraceLevel::Error => log::Level::Error,
        TraceLevel::Warn => log::Level::Warn,
        TraceLevel::Info => log::Level::Info,
        TraceLevel::Debug => log::Level::Debug,
        TraceLevel::Trace => log::Level::Trace,
    }
}

/// Routes [`TraceRecord`]s to `log::log!` under the record's own context
/// as the log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTrace;

impl Trace for LogTrace {
    fn trace(&self, record: TraceRecord<'_>) {
        log::log!(target: record.context, to_log_level(record.level), "{}", record.message);
    }
}
