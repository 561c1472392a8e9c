//! Profiler event types and statistics.

use serde::{Deserialize, Serialize};

/// Categories for profiling events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// One full world tick.
    #[default]
    Tick,
    /// A single `try_move`, including the slide retry.
    TryMove,
    /// One position check.
    CheckPosition,
    /// Teleport through `set_origin` or `move_origin`.
    SetOrigin,
    /// Draining the deferred interaction queue.
    Dispatch,
    /// Candidate gathering in the blockmap.
    BlockmapQuery,
    /// Custom event with ID.
    Custom(u32),
}

impl EventCategory {
    /// Get a display name for this category.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tick => "Tick",
            Self::TryMove => "Try Move",
            Self::CheckPosition => "Check Position",
            Self::SetOrigin => "Set Origin",
            Self::Dispatch => "Dispatch",
            Self::BlockmapQuery => "Blockmap Query",
            Self::Custom(_) => "Custom",
        }
    }

    /// Display order, outermost scopes first.
    pub(crate) const fn sort_key(&self) -> u64 {
        match self {
            Self::Tick => 0,
            Self::TryMove => 1,
            Self::SetOrigin => 2,
            Self::CheckPosition => 3,
            Self::BlockmapQuery => 4,
            Self::Dispatch => 5,
            Self::Custom(id) => 100 + *id as u64,
        }
    }
}

/// A single timing event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingEvent {
    pub category: EventCategory,
    /// Duration in nanoseconds.
    pub duration_ns: u64,
}

impl TimingEvent {
    #[must_use]
    pub const fn new(category: EventCategory, duration_ns: u64) -> Self {
        Self {
            category,
            duration_ns,
        }
    }
}

/// Aggregated statistics for a category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: EventCategory,
    /// Number of events.
    pub count: u64,
    /// Total duration in nanoseconds.
    pub total_ns: u64,
    pub min_ns: u64,
    pub max_ns: u64,
    /// Average duration in nanoseconds (computed from total/count).
    pub avg_ns: u64,
    /// 95th percentile duration over recent samples (approximate).
    pub p95_ns: u64,
}

impl CategoryStats {
    /// Create new empty stats for a category.
    #[must_use]
    pub const fn new(category: EventCategory) -> Self {
        Self {
            category,
            count: 0,
            total_ns: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            avg_ns: 0,
            p95_ns: 0,
        }
    }

    /// Record a new timing.
    pub fn record(&mut self, duration_ns: u64) {
        self.count += 1;
        self.total_ns = self.total_ns.saturating_add(duration_ns);
        self.min_ns = self.min_ns.min(duration_ns);
        self.max_ns = self.max_ns.max(duration_ns);
        self.avg_ns = self.total_ns / self.count;
    }

    #[must_use]
    pub fn avg_us(&self) -> f64 {
        self.avg_ns as f64 / 1_000.0
    }

    #[must_use]
    pub fn max_us(&self) -> f64 {
        self.max_ns as f64 / 1_000.0
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns as f64 / 1_000_000.0
    }
}

/// Population counters reported once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldCounts {
    /// Live objects.
    pub objects: u32,
    /// Events left in the queue after dispatch.
    pub pending_events: u32,
    /// Position checks run during the tick.
    pub checks: u64,
}

/// Complete profiler snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilerSnapshot {
    /// Last tick passed to [`end_tick`](crate::end_tick).
    pub gametic: u64,
    /// Per-category statistics, outermost scopes first.
    pub categories: Vec<CategoryStats>,
    pub world: WorldCounts,
}

impl ProfilerSnapshot {
    /// Stats for one category, if anything was recorded for it.
    #[must_use]
    pub fn category(&self, category: EventCategory) -> Option<&CategoryStats> {
        self.categories.iter().find(|s| s.category == category)
    }
}
