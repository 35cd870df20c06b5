pub mod angles;
pub mod articulation;
pub mod basis;
pub mod descriptor;
pub mod positions;

// Re-exports for convenience
pub use angles::{joint_angles, plane_angles};
pub use articulation::{Articulation, AxisOrder};
pub use basis::LocalFrame;
pub use descriptor::{build_descriptor, descriptor_matrix};
pub use positions::{BODY_FRAME_SCALE, body_frame_positions, detection_positions};
