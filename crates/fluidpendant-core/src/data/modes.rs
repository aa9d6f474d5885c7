//! Parser modal state
//!
//! Holds the active modal groups reported by `$G` as `[GC:...]`.

use serde::{Deserialize, Serialize};

/// Active g-code modal state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcodeModes {
    /// Motion mode (`G0`, `G1`, `G2`, `G3`, `G38.2`, `G80`, ...)
    pub motion: String,
    /// Work coordinate system (`G54`..`G59`)
    pub wcs: String,
    /// Plane selection (`G17`, `G18`, `G19`)
    pub plane: String,
    /// Units (`G20` inches, `G21` millimeters)
    pub units: String,
    /// Distance mode (`G90`, `G91`)
    pub distance: String,
    /// Feed rate mode (`G93`, `G94`)
    pub feed_mode: String,
    /// Spindle state (`M3`, `M4`, `M5`)
    pub spindle: String,
    /// Coolant words (`M7`, `M8`, both, or `M9`)
    pub coolant: String,
    /// Active tool number
    pub tool: u32,
    /// Programmed feed rate
    pub feed: f64,
    /// Programmed spindle speed
    pub speed: f64,
}

impl Default for GcodeModes {
    fn default() -> Self {
        Self {
            motion: "G0".to_string(),
            wcs: "G54".to_string(),
            plane: "G17".to_string(),
            units: "G21".to_string(),
            distance: "G90".to_string(),
            feed_mode: "G94".to_string(),
            spindle: "M5".to_string(),
            coolant: "M9".to_string(),
            tool: 0,
            feed: 0.0,
            speed: 0.0,
        }
    }
}

impl GcodeModes {
    /// Check if positions are reported in inches
    pub fn is_inches(&self) -> bool {
        self.units == "G20"
    }

    /// Check if the distance mode is incremental
    pub fn is_incremental(&self) -> bool {
        self.distance == "G91"
    }
}
