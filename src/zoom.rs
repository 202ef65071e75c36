// zoom.rs: field-of-view zoom

pub const FOV_MIN: f32 = 30.0;
pub const FOV_MAX: f32 = 120.0;
pub const FOV_DEFAULT: f32 = 75.0;

/// Increment used by the zoom buttons.
pub const ZOOM_STEP: f32 = 10.0;

/// Default wheel rate (degrees of FOV per wheel pixel).
pub const DEFAULT_WHEEL_RATE: f32 = 0.05;

/// Field of view in degrees. Smaller is more zoomed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    fov: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self { fov: FOV_DEFAULT }
    }
}

impl ZoomState {
    pub fn new(fov: f32) -> Self {
        Self {
            fov: fov.clamp(FOV_MIN, FOV_MAX),
        }
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Scrolling down (positive `delta_y`) widens the view.
    pub fn apply_wheel(&mut self, delta_y: f32, rate: f32) -> f32 {
        self.set(self.fov + delta_y * rate)
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set(self.fov - ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set(self.fov + ZOOM_STEP)
    }

    pub fn reset(&mut self) -> f32 {
        self.set(FOV_DEFAULT)
    }

    pub fn can_zoom_in(&self) -> bool {
        self.fov > FOV_MIN
    }

    pub fn can_zoom_out(&self) -> bool {
        self.fov < FOV_MAX
    }

    fn set(&mut self, fov: f32) -> f32 {
        // NaN from a misbehaving input device must not poison the state
        if fov.is_nan() {
            return self.fov;
        }
        self.fov = fov.clamp(FOV_MIN, FOV_MAX);
        self.fov
    }
}
