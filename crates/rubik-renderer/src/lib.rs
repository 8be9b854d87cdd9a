pub mod camera;
pub mod lighting;
pub mod mesh;
pub mod picking;

pub use camera::{Camera, CameraConfig, CameraUniform, ViewReset};
pub use lighting::{LightUniform, LIGHT_COUNT};
pub use mesh::{Mesh, Vertex, INNER_COLOR, STICKER_COLORS};
pub use picking::{Ray, RayPicker, AABB};

// Re-export glam types for consistent version usage
pub use glam;
