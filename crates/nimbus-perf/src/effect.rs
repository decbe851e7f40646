//! Pooled visual-effect instances.

use std::fmt;

use nimbus_core::Vec2;
use nimbus_pool::Poolable;

/// Kinds of transient visuals the layer pools, each with its own capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    /// Floating damage/heal numbers and short labels.
    FloatingText,
    /// Generic filled or outlined shapes.
    Shape,
    /// Multi-segment vector graphics.
    VectorGraphics,
    /// Single particles.
    Spark,
}

impl EffectKind {
    /// Every kind.
    pub const ALL: [EffectKind; 4] = [
        EffectKind::FloatingText,
        EffectKind::Shape,
        EffectKind::VectorGraphics,
        EffectKind::Spark,
    ];
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectKind::FloatingText => "floating_text",
            EffectKind::Shape => "shape",
            EffectKind::VectorGraphics => "vector_graphics",
            EffectKind::Spark => "spark",
        };
        f.write_str(name)
    }
}

/// Everything an acquired effect is initialised from.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParams {
    /// Text for floating numbers. Ignored by other kinds.
    pub content: String,
    /// World position.
    pub position: Vec2,
    /// RGBA tint.
    pub color: [f32; 4],
    /// Uniform scale.
    pub scale: f32,
    /// Start visible.
    pub visible: bool,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            content: String::new(),
            position: Vec2::ZERO,
            color: [1.0; 4],
            scale: 1.0,
            visible: true,
        }
    }
}

impl EffectParams {
    /// Visible effect at `position` with default style.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Builder: set the text content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Builder: set the tint.
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// A reusable visual-effect instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    kind: EffectKind,
    /// Text content.
    pub content: String,
    /// World position.
    pub position: Vec2,
    /// RGBA tint.
    pub color: [f32; 4],
    /// Uniform scale.
    pub scale: f32,
    /// Drawn this frame.
    pub visible: bool,
    uses: u32,
}

impl EffectInstance {
    /// Fresh hidden instance of `kind`. The default factory.
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            content: String::new(),
            position: Vec2::ZERO,
            color: [1.0; 4],
            scale: 1.0,
            visible: false,
            uses: 0,
        }
    }

    /// Kind this instance was built for.
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// How many times the instance has been handed out.
    pub fn uses(&self) -> u32 {
        self.uses
    }
}

impl Poolable for EffectInstance {
    type Params = EffectParams;

    fn reset(&mut self, params: &EffectParams) {
        self.content.clear();
        self.content.push_str(&params.content);
        self.position = params.position;
        self.color = params.color;
        self.scale = params.scale;
        self.visible = params.visible;
        self.uses += 1;
    }

    fn deactivate(&mut self) {
        self.visible = false;
        self.content.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reset overwrites every visual field left over from a previous use.
    #[test]
    fn test_reset_overwrites_previous_state() {
        let mut fx = EffectInstance::new(EffectKind::FloatingText);
        fx.reset(&EffectParams::at(Vec2::new(5.0, 5.0)).with_content("-120"));
        fx.scale = 3.0;
        fx.deactivate();
        assert!(!fx.visible);
        assert!(fx.content.is_empty());

        fx.reset(&EffectParams::at(Vec2::new(1.0, 2.0)).with_content("+8"));
        assert_eq!(fx.content, "+8");
        assert_eq!(fx.position, Vec2::new(1.0, 2.0));
        assert_eq!(fx.scale, 1.0);
        assert!(fx.visible);
        assert_eq!(fx.uses(), 2);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EffectKind::VectorGraphics.to_string(), "vector_graphics");
        assert_eq!(EffectKind::ALL.len(), 4);
    }
}
