//! Convergence presets for common widget feedback
//!
//! Tuned for the value ranges each use case animates: unit-range scalars and
//! color channels need a small bias, pixel geometry a bias around one pixel.

use crate::config::ConvergeConfig;

/// Pre-built convergence configs for common patterns
pub struct ConvergePreset;

impl ConvergePreset {
    /// Hover highlight on buttons and list rows (opacity or color in 0..1)
    pub const fn hover() -> ConvergeConfig {
        ConvergeConfig::unchecked(0.25, 0.002)
    }

    /// Press feedback; snappier than hover
    pub const fn press() -> ConvergeConfig {
        ConvergeConfig::unchecked(0.5, 0.001)
    }

    /// Window and overlay fades
    pub const fn fade() -> ConvergeConfig {
        ConvergeConfig::unchecked(0.125, 0.002)
    }

    /// Popup and menu geometry, in pixels
    pub const fn popup() -> ConvergeConfig {
        ConvergeConfig::unchecked(0.25, 1.0)
    }

    /// Slider handle position, in pixels
    pub const fn slider() -> ConvergeConfig {
        ConvergeConfig::unchecked(0.35, 0.5)
    }

    /// Color transitions, per channel
    pub const fn color() -> ConvergeConfig {
        ConvergeConfig::unchecked(0.2, 0.001)
    }

    /// Every preset with its name
    pub fn all() -> [(&'static str, ConvergeConfig); 6] {
        [
            ("hover", Self::hover()),
            ("press", Self::press()),
            ("fade", Self::fade()),
            ("popup", Self::popup()),
            ("slider", Self::slider()),
            ("color", Self::color()),
        ]
    }
}
