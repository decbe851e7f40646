//! Distance bands and the quality/stride profile applied to each band.

use serde::{Deserialize, Serialize};

use crate::{LodError, MAX_IMPORTANCE};

/// Distance band an entity falls into, nearest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LodBand {
    /// Closer than the near threshold.
    Near,
    /// Between near and medium.
    Medium,
    /// Between medium and far.
    Far,
    /// Beyond the far threshold.
    Extreme,
}

/// Distance boundaries between bands.
///
/// A distance strictly below a threshold belongs to that band, so a distance
/// exactly on a boundary falls into the coarser band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodThresholds {
    /// Maximum distance of the near band.
    pub near: f32,
    /// Maximum distance of the medium band.
    pub medium: f32,
    /// Maximum distance of the far band. Everything beyond is extreme.
    pub far: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            near: 200.0,
            medium: 400.0,
            far: 800.0,
        }
    }
}

impl LodThresholds {
    /// Build validated thresholds.
    pub fn new(near: f32, medium: f32, far: f32) -> Result<Self, LodError> {
        let thresholds = Self { near, medium, far };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check that thresholds are positive, finite and strictly increasing.
    pub fn validate(&self) -> Result<(), LodError> {
        let ok = self.near > 0.0
            && self.medium > self.near
            && self.far > self.medium
            && self.far.is_finite();
        if ok {
            Ok(())
        } else {
            Err(LodError::InvalidThresholds {
                near: self.near,
                medium: self.medium,
                far: self.far,
            })
        }
    }

    /// Band for an entity `distance` away from the camera.
    pub fn select_band(&self, distance: f32) -> LodBand {
        debug_assert!(!(distance < 0.0), "distance must be non-negative");
        if distance < self.near {
            LodBand::Near
        } else if distance < self.medium {
            LodBand::Medium
        } else if distance < self.far {
            LodBand::Far
        } else {
            LodBand::Extreme
        }
    }
}

/// Base quality multiplier and update stride of a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSettings {
    /// Quality multiplier in `[0, 1]` before importance scaling.
    pub quality: f32,
    /// Run every `stride` frames.
    pub stride: u32,
}

impl BandSettings {
    /// Shorthand constructor.
    pub const fn new(quality: f32, stride: u32) -> Self {
        Self { quality, stride }
    }

    fn validate(&self) -> Result<(), LodError> {
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(LodError::InvalidQuality(self.quality));
        }
        if self.stride == 0 {
            return Err(LodError::InvalidStride);
        }
        Ok(())
    }
}

/// Complete set of per-band values the scheduler applies.
///
/// The scheduler holds a normal and an emergency profile and swaps between
/// them wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodProfile {
    /// Near band. Importance is ignored here.
    pub near: BandSettings,
    /// Medium band, scaled by `0.5 + importance_factor * 0.5`.
    pub medium: BandSettings,
    /// Far band, scaled by `importance_factor`.
    pub far: BandSettings,
    /// Extreme band, only kept for very important entities.
    pub extreme: BandSettings,
    /// Stride for anything outside the padded viewport.
    pub offscreen_stride: u32,
    /// Quality kept off-screen or in the extreme band by very important entities.
    pub offscreen_min_quality: f32,
    /// Far-band entities below this importance are culled.
    pub far_floor: u8,
    /// Importance at which extreme/off-screen entities keep a nonzero quality.
    pub vip_importance: u8,
}

/// Lowest `vip_importance` a profile accepts. Entities below it are always
/// culled off-screen.
pub const MIN_VIP_IMPORTANCE: u8 = 4;

impl Default for LodProfile {
    fn default() -> Self {
        Self::normal()
    }
}

impl LodProfile {
    /// Profile used under ordinary load.
    pub fn normal() -> Self {
        Self {
            near: BandSettings::new(1.0, 1),
            medium: BandSettings::new(0.7, 2),
            far: BandSettings::new(0.4, 3),
            extreme: BandSettings::new(0.2, 4),
            offscreen_stride: 6,
            offscreen_min_quality: 0.1,
            far_floor: 4,
            vip_importance: 9,
        }
    }

    /// Tightened profile swapped in while emergency mode is enabled.
    pub fn emergency() -> Self {
        Self {
            near: BandSettings::new(0.75, 2),
            medium: BandSettings::new(0.4, 3),
            far: BandSettings::new(0.2, 4),
            extreme: BandSettings::new(0.1, 6),
            offscreen_stride: 10,
            offscreen_min_quality: 0.05,
            far_floor: 6,
            vip_importance: 9,
        }
    }

    /// Check every quality, stride and importance gate.
    pub fn validate(&self) -> Result<(), LodError> {
        for band in [&self.near, &self.medium, &self.far, &self.extreme] {
            band.validate()?;
        }
        BandSettings::new(self.offscreen_min_quality, self.offscreen_stride).validate()?;
        check_gate("vip_importance", self.vip_importance, MIN_VIP_IMPORTANCE)?;
        check_gate("far_floor", self.far_floor, 0)
    }

    /// Settings for a band.
    pub fn band(&self, band: LodBand) -> BandSettings {
        match band {
            LodBand::Near => self.near,
            LodBand::Medium => self.medium,
            LodBand::Far => self.far,
            LodBand::Extreme => self.extreme,
        }
    }

    /// Largest stride the profile can produce.
    pub fn coarsest_stride(&self) -> u32 {
        [
            self.near.stride,
            self.medium.stride,
            self.far.stride,
            self.extreme.stride,
            self.offscreen_stride,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }
}

fn check_gate(gate: &'static str, value: u8, min: u8) -> Result<(), LodError> {
    if (min..=MAX_IMPORTANCE).contains(&value) {
        Ok(())
    } else {
        Err(LodError::InvalidImportanceGate { gate, min, value })
    }
}
