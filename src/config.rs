use serde::{Deserialize, Serialize};

/// Settings for [`Service`](crate::service::Service).
///
/// Every field has a default, so a host can deserialize a partial JSON object
/// (or `{}`) and override only what it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Parsed expressions kept in the LRU memo. 0 disables memoization.
    pub cache_capacity: usize,
    /// `x` range for line plots when the request carries none.
    pub line_range: (f64, f64),
    /// Sample intervals for line plots when the request carries none.
    pub line_points: usize,
    /// `x` and `y` range for surface plots when the request carries none.
    pub surface_range: (f64, f64),
    /// Sample intervals per axis for surface plots when the request carries none.
    pub surface_resolution: usize,
    pub max_line_points: usize,
    pub max_surface_resolution: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            line_range: (-10.0, 10.0),
            line_points: 100,
            surface_range: (-5.0, 5.0),
            surface_resolution: 40,
            max_line_points: 10_000,
            max_surface_resolution: 200,
        }
    }
}
