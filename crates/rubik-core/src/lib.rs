pub mod config;
pub mod direction;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod registry;
pub mod rotation;
pub mod transform;

// Re-exports
pub use config::{CubeConfig, MIN_STEP_DEGREES};
pub use direction::{Decision, DirectionInference, Face, DRAG_TABLE};
pub use error::{ConfigError, RegistryError, RotationError};
pub use grid::{Axis, Orientation, QuarterTurn, Sign};
pub use hit_test::{HitTest, SurfaceHit};
pub use interaction::{Gesture, InteractionEngine, Phase, PointerResponse};
pub use registry::{Cubelet, CubeletId, CubeletRegistry, CubeletSnapshot, CUBELET_COUNT, SLICE_SIZE};
pub use rotation::{AnimationClock, RotationUnit, SliceRotationController, SliceTurn};
pub use transform::{ModelUniform, Transform};
