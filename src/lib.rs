// lib.rs: 360° panorama viewer interaction engine
//
// Pointer, touch and wheel input drive a yaw/pitch/fov state that is shown as
// a sliding, scaled equirectangular backdrop. The host (see main.rs) supplies
// the window, the image loader and the fullscreen capability.

pub mod autoplay;
pub mod clock;
pub mod config;
pub mod fullscreen;
pub mod gesture;
pub mod i18n;
pub mod loader;
pub mod panorama;
pub mod projector;
pub mod session;
pub mod zoom;

pub use config::{LaunchOptions, ViewerConfig};
pub use fullscreen::{FullscreenError, FullscreenPort, WindowFullscreen};
pub use gesture::{PointerInput, TouchPhase};
pub use loader::{ImageLoaderPort, LoadError, LoadState, ThreadImageLoader};
pub use panorama::{Orientation, PanoramaResource};
pub use projector::{Projection, ProjectionSmoother};
pub use session::{Message, SessionEvent, ViewerSession};
