//! Progress math.
//!
//! A collection of `count` valid scenes maps the progress `p` of the scene at
//! `index` onto `index / count + p / count`. Computed as `(index + p) / count`
//! so the final step of the final scene lands on exactly `1.0`.

/// Remap a raw loader value onto `[0, 1]` given the loader's ceiling.
/// Non-finite input reads as 0; a non-positive ceiling reads as 1.
pub fn remap(raw: f32, ceiling: f32) -> f32 {
    let ceiling = if ceiling.is_finite() && ceiling > 0.0 {
        ceiling
    } else {
        1.0
    };
    let value = raw / ceiling;
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Collection-level progress of the scene at `index` out of `count`.
/// An empty collection is complete by definition.
pub fn collection_progress(index: usize, count: usize, scene_progress: f32) -> f32 {
    if count == 0 {
        return 1.0;
    }
    let scene_progress = if scene_progress.is_nan() {
        0.0
    } else {
        scene_progress.clamp(0.0, 1.0)
    };
    ((index as f32 + scene_progress) / count as f32).clamp(0.0, 1.0)
}

/// Keeps a progress sequence non-decreasing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicProgress {
    last: Option<f32>,
}

impl MonotonicProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a new value; returns the value to report.
    pub fn observe(&mut self, value: f32) -> f32 {
        let value = match self.last {
            Some(last) if value < last => last,
            _ => value,
        };
        self.last = Some(value);
        value
    }

    /// Last reported value, if any.
    pub fn last(&self) -> Option<f32> {
        self.last
    }

    /// Whether the sequence still has to report completion.
    pub fn needs_completion(&self) -> bool {
        self.last.is_none_or(|last| last < 1.0)
    }
}
