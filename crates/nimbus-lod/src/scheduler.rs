//! Per-entity quality and update-stride classification.

use nimbus_core::{Aabb, EntityType, Vec2};

use crate::{ImportanceTable, LodBand, LodError, LodProfile, LodThresholds};

/// Outcome of classifying one entity for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodRecord {
    /// Quality multiplier in `[0, 1]`. Zero means skip or hide.
    pub quality: f32,
    /// Update every `stride` frames.
    pub stride: u32,
    /// Inside the viewport plus margin.
    pub visible: bool,
    /// Distance band the entity fell into.
    pub band: LodBand,
}

impl LodRecord {
    /// Whether the entity should be hidden entirely.
    pub fn is_culled(&self) -> bool {
        self.quality <= 0.0
    }
}

/// Per-frame classification counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LodFrameStats {
    /// Classifications in the frame.
    pub classified: usize,
    /// Classifications that produced `quality == 0`.
    pub culled: usize,
    /// Classifications that produced `0 < quality < 1`.
    pub simplified: usize,
}

/// Settings for a [`LodScheduler`].
#[derive(Debug, Clone, PartialEq)]
pub struct LodSettings {
    /// Band boundaries measured from the camera center.
    pub thresholds: LodThresholds,
    /// Extra space around the viewport that still counts as on-screen.
    pub margin: f32,
    /// Values used under normal load.
    pub normal: LodProfile,
    /// Values used in emergency mode.
    pub emergency: LodProfile,
    /// Importance weights per entity type.
    pub importance: ImportanceTable,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            thresholds: LodThresholds::default(),
            margin: 100.0,
            normal: LodProfile::normal(),
            emergency: LodProfile::emergency(),
            importance: ImportanceTable::default(),
        }
    }
}

/// Classifies entities by camera distance and importance, and gates updates
/// on a global frame counter.
#[derive(Debug, Clone)]
pub struct LodScheduler {
    settings: LodSettings,
    viewport: Aabb,
    camera: Vec2,
    emergency: bool,
    frame: u64,
    current: LodFrameStats,
    previous: LodFrameStats,
}

impl LodScheduler {
    /// Build a scheduler after validating thresholds and both profiles.
    ///
    /// The camera starts at the viewport center.
    pub fn new(settings: LodSettings, viewport: Aabb) -> Result<Self, LodError> {
        settings.thresholds.validate()?;
        settings.normal.validate()?;
        settings.emergency.validate()?;
        Ok(Self {
            camera: viewport.center(),
            viewport,
            settings,
            emergency: false,
            frame: 0,
            current: LodFrameStats::default(),
            previous: LodFrameStats::default(),
        })
    }

    /// Update the viewport rectangle.
    pub fn set_viewport(&mut self, viewport: Aabb) {
        self.viewport = viewport;
    }

    /// Update the logical camera center distances are measured from.
    pub fn set_camera(&mut self, camera: Vec2) {
        self.camera = camera;
    }

    /// Current viewport.
    pub fn viewport(&self) -> Aabb {
        self.viewport
    }

    /// Current camera center.
    pub fn camera(&self) -> Vec2 {
        self.camera
    }

    /// Settings in use.
    pub fn settings(&self) -> &LodSettings {
        &self.settings
    }

    /// Profile currently applied.
    pub fn active_profile(&self) -> &LodProfile {
        if self.emergency {
            &self.settings.emergency
        } else {
            &self.settings.normal
        }
    }

    /// Swap in the emergency profile for every subsequent classification.
    pub fn enable_emergency_mode(&mut self) {
        if !self.emergency {
            self.emergency = true;
            tracing::info!("LOD emergency mode enabled at frame {}", self.frame);
        }
    }

    /// Restore the normal profile.
    pub fn disable_emergency_mode(&mut self) {
        if self.emergency {
            self.emergency = false;
            tracing::info!("LOD emergency mode disabled at frame {}", self.frame);
        }
    }

    /// Whether emergency mode is on.
    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    /// Compute the record for an entity at `point` without touching counters.
    pub fn evaluate(&self, point: Vec2, entity: EntityType) -> LodRecord {
        let profile = self.active_profile();
        let importance = self.settings.importance.get(entity);
        let factor = self.settings.importance.factor(entity);
        let vip = importance >= profile.vip_importance;

        let band = self.settings.thresholds.select_band(point.distance(self.camera));
        let visible = self
            .viewport
            .expanded(self.settings.margin)
            .contains_point(point);

        if !visible {
            let quality = if vip { profile.offscreen_min_quality } else { 0.0 };
            return LodRecord {
                quality,
                stride: profile.coarsest_stride(),
                visible,
                band,
            };
        }

        let settings = profile.band(band);
        let quality = match band {
            LodBand::Near => settings.quality,
            LodBand::Medium => settings.quality * (0.5 + factor * 0.5),
            LodBand::Far if importance < profile.far_floor => 0.0,
            LodBand::Far => settings.quality * factor,
            LodBand::Extreme if vip => settings.quality,
            LodBand::Extreme => 0.0,
        };

        LodRecord {
            quality: quality.clamp(0.0, 1.0),
            stride: settings.stride,
            visible,
            band,
        }
    }

    /// Classify an entity and count the result toward this frame's stats.
    pub fn classify(&mut self, point: Vec2, entity: EntityType) -> LodRecord {
        let record = self.evaluate(point, entity);
        self.current.classified += 1;
        if record.is_culled() {
            self.current.culled += 1;
        } else if record.quality < 1.0 {
            self.current.simplified += 1;
        }
        record
    }

    /// Whether an entity with this record should run its update this frame.
    #[inline]
    pub fn should_update(&self, record: &LodRecord) -> bool {
        self.frame % u64::from(record.stride.max(1)) == 0
    }

    /// Move to the next frame. Returns the counters of the frame just finished.
    pub fn advance_frame(&mut self) -> LodFrameStats {
        self.frame += 1;
        self.previous = std::mem::take(&mut self.current);
        self.previous
    }

    /// Global frame counter.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Counters for the frame in progress.
    pub fn frame_stats(&self) -> LodFrameStats {
        self.current
    }

    /// Counters for the last completed frame.
    pub fn previous_frame_stats(&self) -> LodFrameStats {
        self.previous
    }

    /// Reset frame counter, stats and emergency mode.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.current = LodFrameStats::default();
        self.previous = LodFrameStats::default();
        self.emergency = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Aabb = Aabb {
        x: 0.0,
        y: 0.0,
        width: 1920.0,
        height: 1080.0,
    };

    fn scheduler() -> LodScheduler {
        LodScheduler::new(LodSettings::default(), VIEW).unwrap()
    }

    fn at_distance(s: &LodScheduler, d: f32) -> Vec2 {
        s.camera() + Vec2::new(d, 0.0)
    }

    /// The near band always yields full quality every frame, whatever the importance.
    #[test]
    fn test_near_band_full_quality_for_all_types() {
        let s = scheduler();
        for ty in EntityType::ALL {
            let r = s.evaluate(at_distance(&s, 150.0), ty);
            assert_eq!(r.quality, 1.0, "{ty}");
            assert_eq!(r.stride, 1, "{ty}");
            assert!(r.visible);
        }
    }

    /// Distance 250 with importance 5 lands in the medium band below its cap.
    #[test]
    fn test_medium_band_scenario() {
        let s = scheduler();
        let r = s.evaluate(at_distance(&s, 250.0), EntityType::Npc);
        let cap = s.active_profile().medium.quality;
        assert_eq!(r.band, LodBand::Medium);
        assert!(r.quality > 0.0 && r.quality < cap, "quality {}", r.quality);
        assert!((r.quality - cap * 0.75).abs() < 1e-6);
        assert_eq!(r.stride, 2);
    }

    /// Off-screen entities with importance below 4 are always culled.
    #[test]
    fn test_offscreen_low_importance_culled() {
        let s = scheduler();
        let low = [EntityType::Particle, EntityType::Decoration, EntityType::DamageNumber];
        for point in [Vec2::new(-500.0, 540.0), Vec2::new(960.0, 3000.0), Vec2::new(5000.0, 5000.0)] {
            for ty in low {
                let r = s.evaluate(point, ty);
                assert!(!r.visible);
                assert_eq!(r.quality, 0.0);
                assert_eq!(r.stride, 6);
            }
        }
    }

    /// Very important entities keep a minimal quality even off-screen.
    #[test]
    fn test_offscreen_vip_keeps_minimum() {
        let s = scheduler();
        let r = s.evaluate(Vec2::new(-5000.0, 0.0), EntityType::Player);
        assert!(!r.visible);
        assert_eq!(r.quality, 0.1);
        assert_eq!(r.stride, 6);
    }

    /// The margin extends what counts as on-screen.
    #[test]
    fn test_margin_counts_as_visible() {
        let s = scheduler();
        assert!(s.evaluate(Vec2::new(-50.0, 540.0), EntityType::Enemy).visible);
        assert!(!s.evaluate(Vec2::new(-150.0, 540.0), EntityType::Enemy).visible);
    }

    #[test]
    fn test_far_band_floor() {
        let s = scheduler();
        let p = at_distance(&s, 600.0);
        assert_eq!(s.evaluate(p, EntityType::DamageNumber).quality, 0.0);
        let enemy = s.evaluate(p, EntityType::Enemy);
        assert_eq!(enemy.band, LodBand::Far);
        assert!((enemy.quality - 0.4 * 0.6).abs() < 1e-6);
        assert_eq!(enemy.stride, 3);
    }

    #[test]
    fn test_extreme_band_only_vip() {
        let s = scheduler();
        let p = at_distance(&s, 900.0);
        assert_eq!(s.evaluate(p, EntityType::Elite).quality, 0.0);
        let boss = s.evaluate(p, EntityType::Boss);
        assert_eq!(boss.band, LodBand::Extreme);
        assert_eq!(boss.quality, 0.2);
        assert_eq!(boss.stride, 4);
    }

    /// Emergency mode swaps the whole profile and restores it wholesale.
    #[test]
    fn test_emergency_mode_toggle() {
        let mut s = scheduler();
        let p = at_distance(&s, 150.0);
        let before = s.evaluate(p, EntityType::Enemy);

        s.enable_emergency_mode();
        assert!(s.is_emergency());
        let during = s.evaluate(p, EntityType::Enemy);
        assert!(during.quality < before.quality);
        assert!(during.stride > before.stride);

        s.disable_emergency_mode();
        assert_eq!(s.evaluate(p, EntityType::Enemy), before);
    }

    /// Entities advance only on frames divisible by their stride.
    #[test]
    fn test_stride_gating() {
        let mut s = scheduler();
        let record = s.evaluate(at_distance(&s, 300.0), EntityType::Enemy);
        assert_eq!(record.stride, 2);
        let mut updates = Vec::new();
        for _ in 0..6 {
            updates.push(s.should_update(&record));
            s.advance_frame();
        }
        assert_eq!(updates, vec![true, false, true, false, true, false]);
    }

    #[test]
    fn test_frame_counters() {
        let mut s = scheduler();
        let cam = s.camera();
        s.classify(cam, EntityType::Enemy);
        s.classify(cam + Vec2::new(300.0, 0.0), EntityType::Enemy);
        s.classify(Vec2::new(-9000.0, 0.0), EntityType::Particle);
        let stats = s.frame_stats();
        assert_eq!(stats.classified, 3);
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.simplified, 1);

        let finished = s.advance_frame();
        assert_eq!(finished, stats);
        assert_eq!(s.frame_stats(), LodFrameStats::default());
        assert_eq!(s.previous_frame_stats(), stats);
        assert_eq!(s.frame(), 1);
    }

    #[test]
    fn test_camera_follows_setter() {
        let mut s = scheduler();
        s.set_viewport(Aabb::new(10_000.0, 0.0, 1920.0, 1080.0));
        s.set_camera(Vec2::new(10_960.0, 540.0));
        let r = s.evaluate(Vec2::new(11_000.0, 540.0), EntityType::Particle);
        assert_eq!(r.band, LodBand::Near);
        assert_eq!(r.quality, 1.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = LodSettings::default();
        settings.thresholds.medium = 100.0;
        assert!(matches!(
            LodScheduler::new(settings, VIEW),
            Err(LodError::InvalidThresholds { .. })
        ));
    }

    /// A VIP gate of zero would let a particle survive off-screen, so it never builds.
    #[test]
    fn test_low_vip_gate_rejected() {
        let mut settings = LodSettings::default();
        settings.normal.vip_importance = 0;
        assert!(matches!(
            LodScheduler::new(settings, VIEW),
            Err(LodError::InvalidImportanceGate { gate: "vip_importance", .. })
        ));
        let mut settings = LodSettings::default();
        settings.emergency.vip_importance = 3;
        assert!(LodScheduler::new(settings, VIEW).is_err());
    }
}
