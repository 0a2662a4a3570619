//! Execution configuration

use std::fmt;

/// Device an executor runs on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Place {
    /// Host CPU
    #[default]
    Cpu,
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Cpu => f.write_str("CPUPlace"),
        }
    }
}

/// Configuration for [`Executor`](crate::Executor)
#[derive(Clone, Debug)]
pub struct ExecConfig {
    /// Where programs run
    pub place: Place,
    /// Reject feeds whose shape contradicts the declared placeholder shape
    pub check_feed_shapes: bool,
    /// Log every executed op at `info` level instead of `debug`
    pub trace: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            place: Place::Cpu,
            check_feed_shapes: true,
            trace: false,
        }
    }
}

impl ExecConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the place
    pub fn with_place(mut self, place: Place) -> Self {
        self.place = place;
        self
    }

    /// Enable or disable feed shape checks
    pub fn with_check_feed_shapes(mut self, check: bool) -> Self {
        self.check_feed_shapes = check;
        self
    }

    /// Enable or disable per-op info logging
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
