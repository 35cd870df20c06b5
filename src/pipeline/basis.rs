use super::articulation::{Articulation, AxisOrder};
use crate::{
    geometry::{cross, mat_vec, normalize, sub},
    types::{LandmarkFrame, Point3},
};

/// Orthonormal frame anchored at a joint for a single landmark frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalFrame {
    pub origin: Point3,
    pub ox: Point3,
    pub oy: Point3,
    pub oz: Point3,
    /// Row `i` holds component `i` of `ox`, `oy` and `oz`.
    pub transform: [Point3; 3],
}

impl LocalFrame {
    pub fn for_articulation(frame: &LandmarkFrame, articulation: Articulation) -> Self {
        Self::build(
            frame,
            articulation.frame_anchors(),
            articulation.axis_order(),
        )
    }

    /// Builds the frame at `anchors[1]`, with `anchors[0]` giving OY and
    /// `anchors[2]` the reference used to derive the remaining axes.
    /// Zero-length vectors are left as zero.
    pub fn build(frame: &LandmarkFrame, anchors: [usize; 3], order: AxisOrder) -> Self {
        let [proximal, center, reference] = anchors;
        let origin = frame.point(center);
        let oy = normalize(sub(frame.point(proximal), origin));
        let temp = sub(origin, frame.point(reference));

        let (ox, oz) = match order {
            AxisOrder::Root => {
                let oz = normalize(cross(temp, oy));
                let ox = normalize(cross(oy, oz));
                (ox, oz)
            }
            AxisOrder::Chain => {
                let ox = normalize(cross(temp, oy));
                let oz = normalize(cross(ox, oy));
                (ox, oz)
            }
        };

        let transform = [
            [ox[0], oy[0], oz[0]],
            [ox[1], oy[1], oz[1]],
            [ox[2], oy[2], oz[2]],
        ];

        Self {
            origin,
            ox,
            oy,
            oz,
            transform,
        }
    }

    /// Applies the transform to the offset of `point` from the origin.
    pub fn project(&self, point: Point3) -> Point3 {
        mat_vec(&self.transform, sub(point, self.origin))
    }
}
