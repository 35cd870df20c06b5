//! Positional encoding of pose sequences.
//!
//! Each pose is written as seven decimal digits, one per field, in the order
//! direction, height, name, rotation angle, slider, leg, lean. Poses follow
//! each other with no separator.

use thiserror::Error;

use crate::pose::{Category, ClassifiedPose};

pub const FIELDS_PER_POSE: usize = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceDecodeError {
    #[error("sequence length {0} is not a multiple of {FIELDS_PER_POSE}")]
    TrailingFragment(usize),
    #[error("byte {position} is not a digit")]
    NotADigit { position: usize },
    #[error("index {index} at byte {position} is out of range for {field}")]
    OutOfRange {
        position: usize,
        field: &'static str,
        index: usize,
    },
}

/// Field indices in serialization order.
pub fn pose_indices(pose: &ClassifiedPose) -> [usize; FIELDS_PER_POSE] {
    [
        pose.direction().index(),
        pose.height().index(),
        pose.name().index(),
        pose.angle().index(),
        pose.slider().index(),
        pose.leg().index(),
        pose.lean().index(),
    ]
}

pub fn encode_pose(pose: &ClassifiedPose, out: &mut String) {
    for index in pose_indices(pose) {
        out.push_str(&index.to_string());
    }
}

pub fn encode_sequence<'a, I>(poses: I) -> String
where
    I: IntoIterator<Item = &'a ClassifiedPose>,
{
    let mut out = String::new();
    for pose in poses {
        encode_pose(pose, &mut out);
    }
    out
}

pub fn decode_sequence(encoded: &str) -> Result<Vec<ClassifiedPose>, SequenceDecodeError> {
    let bytes = encoded.as_bytes();
    if bytes.len() % FIELDS_PER_POSE != 0 {
        return Err(SequenceDecodeError::TrailingFragment(bytes.len()));
    }

    bytes
        .chunks_exact(FIELDS_PER_POSE)
        .enumerate()
        .map(|(n, chunk)| {
            let base = n * FIELDS_PER_POSE;
            let mut digits = [0usize; FIELDS_PER_POSE];
            for (i, byte) in chunk.iter().enumerate() {
                if !byte.is_ascii_digit() {
                    return Err(SequenceDecodeError::NotADigit { position: base + i });
                }
                digits[i] = (byte - b'0') as usize;
            }
            // Arguments follow `ClassifiedPose::new`, slots follow the wire order.
            Ok(ClassifiedPose::new(
                field_at(&digits, 2, base)?,
                field_at(&digits, 1, base)?,
                field_at(&digits, 5, base)?,
                field_at(&digits, 0, base)?,
                field_at(&digits, 3, base)?,
                field_at(&digits, 4, base)?,
                field_at(&digits, 6, base)?,
            ))
        })
        .collect()
}

fn field_at<T: Category>(
    digits: &[usize; FIELDS_PER_POSE],
    slot: usize,
    base: usize,
) -> Result<T, SequenceDecodeError> {
    T::from_index(digits[slot]).ok_or(SequenceDecodeError::OutOfRange {
        position: base + slot,
        field: T::FIELD,
        index: digits[slot],
    })
}
