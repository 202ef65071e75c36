// panorama.rs — panorama resource and view orientation

use glam::Vec2;

/// Vertical look limit in degrees. Stops the view from flipping over the poles.
pub const PITCH_LIMIT: f32 = 85.0;

/// Default drag sensitivity (degrees per pixel).
pub const DEFAULT_SENSITIVITY: f32 = 0.3;

/// Equirectangular image supplied by the embedding page. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanoramaResource {
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub title: String,
}

impl PanoramaResource {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            thumbnail_url: None,
            title: title.into(),
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }
}

/// Viewpoint on the sphere, in degrees.
///
/// `yaw` is unbounded: a full turn is meaningful and only wraps when drawn.
/// `pitch` always stays within `±PITCH_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Orientation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
        }
    }

    /// Rotates by a pointer drag. Yaw follows x; pitch moves against y.
    pub fn apply_drag(self, delta: Vec2, sensitivity: f32) -> Self {
        Self {
            yaw: self.yaw + delta.x * sensitivity,
            pitch: (self.pitch - delta.y * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT),
        }
    }

    /// Advances yaw only; used by auto-rotation.
    pub fn rotate_yaw(self, degrees: f32) -> Self {
        Self {
            yaw: self.yaw + degrees,
            ..self
        }
    }

    pub fn reset() -> Self {
        Self::default()
    }

    /// Yaw folded into `[0, 360)` for display.
    pub fn display_yaw(&self) -> f32 {
        self.yaw.rem_euclid(360.0)
    }
}
