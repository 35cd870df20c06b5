use crate::types::TrackedJoint;

/// Order in which the two horizontal axes of a local frame are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisOrder {
    /// OZ from the reference offset first, OX closes the frame.
    Root,
    /// OX from the reference offset first, OZ closes the frame.
    Chain,
}

/// Joints with a local frame, identified by their landmark index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Articulation {
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Articulation {
    pub const ALL: [Articulation; 9] = [
        Articulation::RightShoulder,
        Articulation::LeftElbow,
        Articulation::RightElbow,
        Articulation::LeftHip,
        Articulation::RightHip,
        Articulation::LeftKnee,
        Articulation::RightKnee,
        Articulation::LeftAnkle,
        Articulation::RightAnkle,
    ];

    pub fn landmark(&self) -> usize {
        self.chain()[1]
    }

    pub fn from_landmark(index: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.landmark() == index)
    }

    /// (proximal, center, distal) landmarks the joint angles are measured on.
    pub fn chain(&self) -> [usize; 3] {
        match self {
            Articulation::RightShoulder => [24, 12, 11],
            Articulation::LeftElbow => [11, 13, 15],
            Articulation::RightElbow => [12, 14, 16],
            Articulation::LeftHip => [11, 23, 25],
            Articulation::RightHip => [12, 24, 26],
            Articulation::LeftKnee => [23, 25, 27],
            Articulation::RightKnee => [24, 26, 28],
            Articulation::LeftAnkle => [25, 27, 31],
            Articulation::RightAnkle => [26, 28, 32],
        }
    }

    /// Landmarks the local frame is built from. The hips take the opposite
    /// hip as reference instead of their own knee.
    pub fn frame_anchors(&self) -> [usize; 3] {
        match self {
            Articulation::LeftHip => [11, 23, 24],
            Articulation::RightHip => [12, 24, 23],
            other => other.chain(),
        }
    }

    pub fn axis_order(&self) -> AxisOrder {
        match self {
            Articulation::LeftHip | Articulation::RightHip => AxisOrder::Root,
            _ => AxisOrder::Chain,
        }
    }
}

impl From<TrackedJoint> for Articulation {
    fn from(joint: TrackedJoint) -> Self {
        match joint {
            TrackedJoint::RightHip => Articulation::RightHip,
            TrackedJoint::LeftHip => Articulation::LeftHip,
            TrackedJoint::RightKnee => Articulation::RightKnee,
            TrackedJoint::LeftKnee => Articulation::LeftKnee,
            TrackedJoint::RightAnkle => Articulation::RightAnkle,
            TrackedJoint::LeftAnkle => Articulation::LeftAnkle,
        }
    }
}
