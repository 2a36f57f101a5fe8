use serde::{Deserialize, Serialize};

/// Controller tunables, usually loaded from a data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Abort a swap that runs longer than this many seconds of clock time.
    /// `None` lets a swap run for as long as it takes.
    pub swap_timeout_seconds: Option<f32>,
    /// Record the id of every committed collection in the selection store.
    pub persist_selection: bool,
    /// Capacity of the controller's event journal.
    pub journal_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            swap_timeout_seconds: None,
            persist_selection: true,
            journal_capacity: 256,
        }
    }
}

impl ControllerConfig {
    /// The timeout, if one is set and positive.
    pub fn swap_timeout(&self) -> Option<f32> {
        self.swap_timeout_seconds
            .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
    }
}
