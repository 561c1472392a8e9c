//! Event collection and aggregation.

use std::collections::HashMap;

use crate::events::{CategoryStats, EventCategory, ProfilerSnapshot, TimingEvent, WorldCounts};

/// Number of recent samples to keep for percentile calculations.
const SAMPLE_HISTORY_SIZE: usize = 128;

/// Collects and aggregates profiling events.
#[derive(Default)]
pub struct Collector {
    stats: HashMap<EventCategory, CategoryStats>,
    /// Recent samples per category for percentile calculation.
    samples: HashMap<EventCategory, Vec<u64>>,
    world: WorldCounts,
    gametic: u64,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a timing event.
    pub fn record(&mut self, event: TimingEvent) {
        self.stats
            .entry(event.category)
            .or_insert_with(|| CategoryStats::new(event.category))
            .record(event.duration_ns);

        let samples = self
            .samples
            .entry(event.category)
            .or_insert_with(|| Vec::with_capacity(SAMPLE_HISTORY_SIZE));
        if samples.len() >= SAMPLE_HISTORY_SIZE {
            samples.remove(0);
        }
        samples.push(event.duration_ns);
    }

    /// Record a duration for a category.
    pub fn record_duration(&mut self, category: EventCategory, duration_ns: u64) {
        self.record(TimingEvent::new(category, duration_ns));
    }

    pub fn set_world_counts(&mut self, world: WorldCounts) {
        self.world = world;
    }

    /// Close out a tick: refresh percentile estimates.
    pub fn end_tick(&mut self, gametic: u64) {
        self.gametic = gametic;
        for (category, samples) in &self.samples {
            if samples.len() < 10 {
                continue;
            }
            let mut sorted = samples.clone();
            sorted.sort_unstable();
            if let Some(stats) = self.stats.get_mut(category) {
                stats.p95_ns = sorted[(sorted.len() * 95) / 100];
            }
        }
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        self.stats.clear();
        self.samples.clear();
        self.world = WorldCounts::default();
    }

    /// Get a snapshot of current profiling data.
    #[must_use]
    pub fn snapshot(&self) -> ProfilerSnapshot {
        let mut categories: Vec<CategoryStats> = self.stats.values().copied().collect();
        categories.sort_by_key(|s| s.category.sort_key());

        ProfilerSnapshot {
            gametic: self.gametic,
            categories,
            world: self.world,
        }
    }

    /// Get stats for a specific category.
    #[must_use]
    pub fn get_stats(&self, category: EventCategory) -> Option<&CategoryStats> {
        self.stats.get(&category)
    }
}
