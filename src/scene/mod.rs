pub mod camera;
pub mod highlight;
pub mod manager;
pub mod picking;

pub use camera::{PerspectiveCamera, Ray};
pub use highlight::{HighlightPulse, PulseFrame};
pub use manager::{SceneGeometry, SceneManager, TerrainState};
pub use picking::{pick_instance, PickHit, Tooltip, ViewportRect};
