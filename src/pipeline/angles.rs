use super::{articulation::Articulation, basis::LocalFrame};
use crate::{
    geometry::{normalize, sub},
    types::{JointAngles, LandmarkFrame, Point3},
};

/// Measures the joint angles of `articulation` inside its local frame.
pub fn joint_angles(
    frame: &LandmarkFrame,
    articulation: Articulation,
    local: &LocalFrame,
) -> JointAngles {
    let [a, b, c] = articulation.chain().map(|idx| frame.point(idx));

    let new_a = local.project(a);
    let new_b = local.project(b);
    let new_c = local.project(c);

    let ab = normalize(sub(new_a, new_b));
    let bc = normalize(sub(new_b, new_c));

    plane_angles(ab, bc)
}

/// Signed rotation from `ab` to `bc` in each coordinate plane.
pub fn plane_angles(ab: Point3, bc: Point3) -> JointAngles {
    let xy = heading(bc[1], bc[0]) - heading(ab[1], ab[0]);
    let xz = heading(bc[2], bc[0]) - heading(ab[2], ab[0]);
    let yz = heading(bc[2], bc[1]) - heading(ab[2], ab[1]);

    JointAngles {
        x: wrap_degrees(yz.to_degrees()),
        y: wrap_degrees(xz.to_degrees()),
        z: wrap_degrees(xy.to_degrees()),
    }
}

/// `atan2`, except a (0, 0) direction has heading 0 whatever the zero signs.
fn heading(y: f64, x: f64) -> f64 {
    if y == 0.0 && x == 0.0 {
        0.0
    } else {
        y.atan2(x)
    }
}

/// Folds a difference of two headings into [-180, 180).
pub fn wrap_degrees(mut angle: f64) -> f64 {
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle >= 180.0 {
        angle -= 360.0;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NUM_LANDMARKS;

    #[test]
    fn quarter_turn_in_xy_plane() {
        let angles = plane_angles([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!((angles.z - 90.0).abs() < 0.5);
        assert!(angles.y.abs() < 0.5);
        assert!(angles.x.abs() < 0.5);
    }

    #[test]
    fn triple_keeps_plane_pairing() {
        // YZ lands in `x`, XZ in `y`, XY in `z`.
        let angles = plane_angles([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
        assert!((angles.x - 90.0).abs() < 1e-9);
        assert!((angles.y - 90.0).abs() < 1e-9);
        assert!((angles.z + 90.0).abs() < 1e-9);
    }

    #[test]
    fn wrap_matches_reference_folding() {
        assert_eq!(wrap_degrees(-90.0), -90.0);
        assert_eq!(wrap_degrees(270.0), -90.0);
        assert_eq!(wrap_degrees(180.0), -180.0);
        assert_eq!(wrap_degrees(-180.0), -180.0);
        assert_eq!(wrap_degrees(179.0), 179.0);
        assert_eq!(wrap_degrees(-359.0), 1.0);
    }

    #[test]
    fn zero_vectors_have_zero_angles() {
        let angles = plane_angles([0.0, 0.0, 0.0], [-0.0, -0.0, -0.0]);
        assert_eq!(angles, JointAngles::default());
    }

    #[test]
    fn angles_stay_in_range_for_many_frames() {
        let mut seed = 0x2545_f491_4f6c_dd1du64;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % 10_000) as f64 / 1_000.0
        };

        for _ in 0..200 {
            let mut points = [[0.0; 3]; NUM_LANDMARKS];
            for p in points.iter_mut() {
                *p = [next(), next(), next()];
            }
            let frame = LandmarkFrame::new(points);
            for articulation in Articulation::ALL {
                let local = LocalFrame::for_articulation(&frame, articulation);
                let angles = joint_angles(&frame, articulation, &local);
                for v in angles.as_row() {
                    assert!(v.is_finite());
                    assert!((-180.0..180.0).contains(&v), "{v} out of range");
                }
            }
        }
    }
}
