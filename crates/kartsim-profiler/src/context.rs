//! Global profiler context singleton.

use parking_lot::Mutex;

use crate::collector::Collector;
use crate::events::{EventCategory, ProfilerSnapshot, TimingEvent, WorldCounts};

/// Global profiler context.
static PROFILER: Mutex<Option<Collector>> = Mutex::new(None);

/// Initialize the global profiler.
///
/// Call this once at application startup. Events recorded before `init`
/// are dropped.
pub fn init() {
    let mut guard = PROFILER.lock();
    if guard.is_none() {
        *guard = Some(Collector::new());
        tracing::debug!("profiler initialized");
    }
}

/// Shutdown the profiler, returning the final snapshot.
pub fn shutdown() -> Option<ProfilerSnapshot> {
    PROFILER.lock().take().map(|collector| collector.snapshot())
}

/// Record a timing event.
#[inline]
pub fn record(event: TimingEvent) {
    if let Some(collector) = PROFILER.lock().as_mut() {
        collector.record(event);
    }
}

/// Record a duration for a category.
#[inline]
pub fn record_duration(category: EventCategory, duration_ns: u64) {
    record(TimingEvent::new(category, duration_ns));
}

/// Report population counters for the current tick.
pub fn report_world_counts(world: WorldCounts) {
    if let Some(collector) = PROFILER.lock().as_mut() {
        collector.set_world_counts(world);
    }
}

/// Mark the end of a tick.
pub fn end_tick(gametic: u64) {
    if let Some(collector) = PROFILER.lock().as_mut() {
        collector.end_tick(gametic);
    }
}

/// Get a snapshot of current profiling data.
#[must_use]
pub fn snapshot() -> ProfilerSnapshot {
    PROFILER
        .lock()
        .as_ref()
        .map_or_else(ProfilerSnapshot::default, Collector::snapshot)
}

/// Reset all profiling statistics.
pub fn reset() {
    if let Some(collector) = PROFILER.lock().as_mut() {
        collector.reset();
    }
}

/// Check if the profiler is initialized.
#[must_use]
pub fn is_initialized() -> bool {
    PROFILER.lock().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The context is process-wide, so everything that touches it lives in
    // one test.
    #[test]
    fn lifecycle() {
        record_duration(EventCategory::Custom(7), 50);
        assert!(snapshot().categories.is_empty());

        init();
        assert!(is_initialized());
        record_duration(EventCategory::Custom(7), 50);
        record_duration(EventCategory::Custom(7), 150);
        report_world_counts(WorldCounts {
            objects: 3,
            pending_events: 0,
            checks: 12,
        });
        end_tick(9);

        let snap = snapshot();
        assert_eq!(snap.gametic, 9);
        assert_eq!(snap.world.objects, 3);
        assert_eq!(snap.category(EventCategory::Custom(7)).unwrap().count, 2);

        reset();
        assert!(snapshot().category(EventCategory::Custom(7)).is_none());

        assert!(shutdown().is_some());
        assert!(!is_initialized());
        assert!(shutdown().is_none());
    }
}
