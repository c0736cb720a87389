//! Frame time management
//!
//! The engine core never reads the clock itself; the external frame driver
//! owns a [`FrameTimer`], ticks it once per frame, and hands the resulting
//! delta to [`Scene::update`](crate::scene::Scene::update).

use std::time::Instant;

/// Per-frame timer for the external frame driver
pub struct FrameTimer {
    last_frame: Instant,
    delta_seconds: f32,
    total_seconds: f32,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer; the first tick measures from this instant
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_seconds: 0.0,
            total_seconds: 0.0,
            frame_count: 0,
        }
    }

    /// Advance to the next frame and return the raw delta in seconds
    ///
    /// Call exactly once per frame, before updating the scene. The returned
    /// delta is unclamped; frame pacing policy (spike clamping, fixed
    /// timestep) belongs to the caller.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta_seconds = now.duration_since(self.last_frame).as_secs_f32();
        self.total_seconds += self.delta_seconds;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta_seconds
    }

    /// Time between the two most recent ticks, in seconds
    pub fn delta_seconds(&self) -> f32 {
        self.delta_seconds
    }

    /// Total time accumulated across all ticks, in seconds
    pub fn total_seconds(&self) -> f32 {
        self.total_seconds
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average frames per second since creation
    pub fn average_fps(&self) -> f32 {
        if self.total_seconds > 0.0 {
            self.frame_count as f32 / self.total_seconds
        } else {
            0.0
        }
    }
}
