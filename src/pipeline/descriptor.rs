use ndarray::Array2;

use super::{angles::joint_angles, articulation::Articulation, basis::LocalFrame};
use crate::types::{LandmarkFrame, PoseDescriptor, TrackedJoint};

/// Extracts the joint angles of the six tracked joints.
///
/// Never fails: a zeroed frame yields a descriptor of zero angles.
pub fn build_descriptor(frame: &LandmarkFrame) -> PoseDescriptor {
    let mut descriptor = PoseDescriptor::default();
    for joint in TrackedJoint::ALL {
        let articulation = Articulation::from(joint);
        let local = LocalFrame::for_articulation(frame, articulation);
        let angles = joint_angles(frame, articulation, &local);
        log::trace!("{}: {:?}", joint.label(), angles.as_row());
        *descriptor.get_mut(joint) = angles;
    }
    descriptor
}

/// 6x3 matrix with one row per tracked joint and columns x, y, z.
pub fn descriptor_matrix(descriptor: &PoseDescriptor) -> Array2<f64> {
    Array2::from_shape_fn((TrackedJoint::ALL.len(), 3), |(row, col)| {
        descriptor.get(TrackedJoint::ALL[row]).as_row()[col]
    })
}
