use super::{articulation::AxisOrder, basis::LocalFrame};
use crate::{
    geometry::{norm, scale, sub},
    landmarks::{Detection, landmarks_or_zeroed},
    types::{LandmarkFrame, LandmarkScale, NUM_LANDMARKS, Point3},
};

/// Right hip, right shoulder, left shoulder.
const BODY_ANCHORS: [usize; 3] = [24, 12, 11];

/// Detector coordinates times 10 on every axis. Unlike classification, depth
/// is not divided down here.
pub const BODY_FRAME_SCALE: LandmarkScale = LandmarkScale::uniform([10.0, 10.0, 10.0]);

/// Landmarks expressed in a frame anchored at the right shoulder, in units
/// of the shoulder-to-hip length. Used when authoring catalog poses.
pub fn body_frame_positions(frame: &LandmarkFrame) -> [Point3; NUM_LANDMARKS] {
    let local = LocalFrame::build(frame, BODY_ANCHORS, AxisOrder::Root);
    let torso = norm(sub(frame.point(BODY_ANCHORS[0]), local.origin));

    let mut out = [[0.0; 3]; NUM_LANDMARKS];
    for (dst, src) in out.iter_mut().zip(frame.points()) {
        let projected = local.project(*src);
        *dst = if torso != 0.0 {
            scale(projected, 1.0 / torso)
        } else {
            projected
        };
    }
    out
}

/// Body-frame positions for one recorded detection, scaled with
/// [`BODY_FRAME_SCALE`]. Failed detections give all-zero positions.
pub fn detection_positions(index: usize, detection: Option<Detection>) -> [Point3; NUM_LANDMARKS] {
    body_frame_positions(&landmarks_or_zeroed(index, Ok(detection), BODY_FRAME_SCALE))
}
