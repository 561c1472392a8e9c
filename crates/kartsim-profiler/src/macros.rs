//! Profiling macros and scope guards.

use std::time::Instant;

use crate::events::EventCategory;

/// RAII guard that records timing on drop.
pub struct ScopeGuard {
    category: EventCategory,
    start: Instant,
}

impl ScopeGuard {
    #[inline]
    #[must_use]
    pub fn new(category: EventCategory) -> Self {
        Self {
            category,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopeGuard {
    #[inline]
    fn drop(&mut self) {
        let duration = u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        crate::context::record_duration(self.category, duration);
    }
}

/// Create a profiling scope that measures execution time until end of scope.
///
/// When the `profiling` feature is disabled, this macro expands to nothing.
///
/// ```ignore
/// use kartsim_profiler::{profile_scope, EventCategory};
///
/// fn check_position() {
///     profile_scope!(EventCategory::CheckPosition);
///     // ...
/// } // timing recorded here
/// ```
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! profile_scope {
    ($category:expr) => {
        let _guard = $crate::ScopeGuard::new($category);
    };
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_scope {
    ($category:expr) => {};
}

/// Report per-tick population counters.
///
/// When the `profiling` feature is disabled, this macro expands to nothing.
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! report_world {
    ($counts:expr) => {
        $crate::report_world_counts($counts);
    };
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! report_world {
    ($counts:expr) => {};
}
