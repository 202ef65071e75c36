// projector.rs: (yaw, pitch, fov) → backdrop position / scale
//
// This is a 2D illusion, not a spherical projection: the equirectangular image
// is slid and scaled like a CSS background. Good enough to look around; not
// geometrically correct near the poles.

use std::time::Duration;

use crate::config::ViewerConfig;
use crate::panorama::Orientation;
use crate::zoom::FOV_DEFAULT;

/// Backdrop placement, in CSS background percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub position_x: f32,
    pub position_y: f32,
    /// Backdrop width as a percentage of the viewport width.
    pub scale_percent: f32,
    /// `None` while dragging: the view follows the pointer directly.
    pub smoothing: Option<Duration>,
}

impl Projection {
    /// UV `(scale, offset)` that reproduces this placement for a 2:1 texture
    /// drawn over a viewport of the given aspect (width / height), such that
    /// `uv_tex = uv_screen * scale + offset`.
    ///
    /// Follows the CSS rule: the point at `position%` of the image sits at
    /// `position%` of the viewport.
    pub fn texture_mapping(&self, aspect: f32) -> ([f32; 2], [f32; 2]) {
        // image size in viewport units
        let sx = (self.scale_percent / 100.0).max(f32::EPSILON);
        let sy = (sx * aspect / 2.0).max(f32::EPSILON);
        let px = self.position_x / 100.0;
        let py = self.position_y / 100.0;

        let scale = [1.0 / sx, 1.0 / sy];
        let offset = [-(1.0 - sx) * px / sx, -(1.0 - sy) * py / sy];
        (scale, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub yaw_factor: f32,
    pub pitch_factor: f32,
    pub base_scale_percent: f32,
    pub transition: Option<Duration>,
}

impl Default for Projector {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl Projector {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            yaw_factor: config.yaw_factor,
            pitch_factor: config.pitch_factor,
            base_scale_percent: config.base_scale_percent,
            transition: config.transition(),
        }
    }

    pub fn project(&self, orientation: Orientation, fov: f32, dragging: bool) -> Projection {
        Projection {
            position_x: 50.0 + orientation.yaw * self.yaw_factor,
            position_y: 50.0 - orientation.pitch * self.pitch_factor,
            scale_percent: self.base_scale_percent * (FOV_DEFAULT / fov),
            smoothing: if dragging { None } else { self.transition },
        }
    }
}

/// Eases the displayed projection toward the latest target, frame by frame.
#[derive(Debug, Default)]
pub struct ProjectionSmoother {
    current: Option<Projection>,
}

impl ProjectionSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, target: Projection, dt: Duration) -> Projection {
        let next = match (self.current, target.smoothing) {
            (Some(current), Some(transition)) if !transition.is_zero() => {
                // time constant of a third of the transition: ~95% there when it ends
                let tau = transition.as_secs_f32() / 3.0;
                let t = 1.0 - (-dt.as_secs_f32() / tau).exp();
                Projection {
                    position_x: lerp(current.position_x, target.position_x, t),
                    position_y: lerp(current.position_y, target.position_y, t),
                    scale_percent: lerp(current.scale_percent, target.scale_percent, t),
                    smoothing: target.smoothing,
                }
            }
            _ => target,
        };
        self.current = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
