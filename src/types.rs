use serde::{Deserialize, Serialize};

pub const NUM_LANDMARKS: usize = 33;

pub type Point3 = [f64; 3];

/// One frame of body landmarks in detector order.
///
/// Landmarks the detector could not resolve are all-zero.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    points: [Point3; NUM_LANDMARKS],
}

impl LandmarkFrame {
    pub fn new(points: [Point3; NUM_LANDMARKS]) -> Self {
        Self { points }
    }

    /// Frame substituted when detection fails.
    pub fn zeroed() -> Self {
        Self {
            points: [[0.0; 3]; NUM_LANDMARKS],
        }
    }

    /// Builds a frame from raw detector output, scaling each axis.
    ///
    /// Returns `None` unless exactly [`NUM_LANDMARKS`] points are given.
    pub fn from_detection(raw: &[[f32; 3]], scale: LandmarkScale) -> Option<Self> {
        if raw.len() != NUM_LANDMARKS {
            return None;
        }
        let mut points = [[0.0; 3]; NUM_LANDMARKS];
        for (dst, src) in points.iter_mut().zip(raw) {
            *dst = scale.apply(*src);
        }
        Some(Self { points })
    }

    pub fn point(&self, index: usize) -> Point3 {
        self.points[index]
    }

    pub fn points(&self) -> &[Point3; NUM_LANDMARKS] {
        &self.points
    }

    pub fn is_zeroed(&self) -> bool {
        self.points.iter().flatten().all(|v| *v == 0.0)
    }
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Per-axis conversion from normalized detector coordinates to frame units:
/// each component is multiplied, then divided, in that order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LandmarkScale {
    pub multiplier: [f64; 3],
    #[serde(default = "unit_divisor")]
    pub divisor: [f64; 3],
}

fn unit_divisor() -> [f64; 3] {
    [1.0; 3]
}

impl LandmarkScale {
    pub const fn new(multiplier: [f64; 3], divisor: [f64; 3]) -> Self {
        Self {
            multiplier,
            divisor,
        }
    }

    pub const fn uniform(multiplier: [f64; 3]) -> Self {
        Self::new(multiplier, [1.0; 3])
    }

    pub fn apply(&self, raw: [f32; 3]) -> Point3 {
        let mut out = [0.0; 3];
        for (axis, v) in out.iter_mut().enumerate() {
            *v = f64::from(raw[axis]) * self.multiplier[axis] / self.divisor[axis];
        }
        out
    }
}

/// Plane angles of one joint, in degrees.
///
/// `x` is measured in the YZ plane, `y` in the XZ plane and `z` in the XY
/// plane. Existing catalogs store the triple with this pairing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl JointAngles {
    pub fn as_row(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackedJoint {
    RightHip,
    LeftHip,
    RightKnee,
    LeftKnee,
    RightAnkle,
    LeftAnkle,
}

impl TrackedJoint {
    /// Descriptor row order.
    pub const ALL: [TrackedJoint; 6] = [
        TrackedJoint::RightHip,
        TrackedJoint::LeftHip,
        TrackedJoint::RightKnee,
        TrackedJoint::LeftKnee,
        TrackedJoint::RightAnkle,
        TrackedJoint::LeftAnkle,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TrackedJoint::RightHip => "RightHip",
            TrackedJoint::LeftHip => "LeftHip",
            TrackedJoint::RightKnee => "RightKnee",
            TrackedJoint::LeftKnee => "LeftKnee",
            TrackedJoint::RightAnkle => "RightAnkle",
            TrackedJoint::LeftAnkle => "LeftAnkle",
        }
    }
}

/// Joint angles of the six tracked leg joints for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PoseDescriptor {
    pub right_hip: JointAngles,
    pub left_hip: JointAngles,
    pub right_knee: JointAngles,
    pub left_knee: JointAngles,
    pub right_ankle: JointAngles,
    pub left_ankle: JointAngles,
}

impl PoseDescriptor {
    pub fn get(&self, joint: TrackedJoint) -> &JointAngles {
        match joint {
            TrackedJoint::RightHip => &self.right_hip,
            TrackedJoint::LeftHip => &self.left_hip,
            TrackedJoint::RightKnee => &self.right_knee,
            TrackedJoint::LeftKnee => &self.left_knee,
            TrackedJoint::RightAnkle => &self.right_ankle,
            TrackedJoint::LeftAnkle => &self.left_ankle,
        }
    }

    pub fn get_mut(&mut self, joint: TrackedJoint) -> &mut JointAngles {
        match joint {
            TrackedJoint::RightHip => &mut self.right_hip,
            TrackedJoint::LeftHip => &mut self.left_hip,
            TrackedJoint::RightKnee => &mut self.right_knee,
            TrackedJoint::LeftKnee => &mut self.left_knee,
            TrackedJoint::RightAnkle => &mut self.right_ankle,
            TrackedJoint::LeftAnkle => &mut self.left_ankle,
        }
    }

    pub fn is_finite(&self) -> bool {
        TrackedJoint::ALL.iter().all(|j| self.get(*j).is_finite())
    }
}
