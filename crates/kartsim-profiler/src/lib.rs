//! Timing instrumentation for the kartsim movement core.
//!
//! Physics entry points (ticks, moves, position checks, teleports and event
//! dispatch) open a timing scope that reports into a process-wide collector.
//!
//! # Feature Flags
//!
//! - `profiling`: Enable profiling instrumentation. When disabled, all profiling
//!   macros expand to no-ops for zero overhead.
//!
//! # Usage
//!
//! ```ignore
//! kartsim_profiler::init();
//!
//! fn tick() {
//!     kartsim_profiler::profile_scope!(kartsim_profiler::EventCategory::Tick);
//!     // ... per-object thinking
//! }
//!
//! kartsim_profiler::end_tick(gametic);
//! let snapshot = kartsim_profiler::snapshot();
//! ```

mod collector;
mod context;
mod events;
mod macros;

pub use collector::Collector;
pub use context::{
    end_tick, init, is_initialized, record, record_duration, report_world_counts, reset,
    shutdown, snapshot,
};
pub use events::{CategoryStats, EventCategory, ProfilerSnapshot, TimingEvent, WorldCounts};
pub use macros::ScopeGuard;
