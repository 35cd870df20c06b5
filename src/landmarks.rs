use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result, anyhow};

use crate::types::{LandmarkFrame, LandmarkScale, NUM_LANDMARKS};

/// Raw detector output for one frame: normalized landmark coordinates.
pub type Detection = Vec<[f32; 3]>;

/// Scale applied to normalized detector coordinates before classification:
/// x and y times 10, z times 10 then divided by 3. Catalogs were recorded with
/// this scaling so it has to match at classification time.
pub const DEFAULT_LANDMARK_SCALE: LandmarkScale =
    LandmarkScale::new([10.0, 10.0, 10.0], [1.0, 1.0, 3.0]);

/// Body landmark detector.
///
/// `Ok(None)` means no body was found in the frame.
pub trait LandmarkProvider: Send + 'static {
    type Frame: Send + 'static;

    fn detect(&mut self, frame: &Self::Frame) -> anyhow::Result<Option<Detection>>;
}

/// Converts a detector result into a landmark frame, substituting an
/// all-zero frame whenever detection failed.
pub fn landmarks_or_zeroed(
    index: usize,
    result: anyhow::Result<Option<Detection>>,
    scale: LandmarkScale,
) -> LandmarkFrame {
    match result {
        Ok(Some(raw)) => LandmarkFrame::from_detection(&raw, scale).unwrap_or_else(|| {
            log::warn!(
                "frame {index}: detector returned {} landmarks, expected {NUM_LANDMARKS}",
                raw.len()
            );
            LandmarkFrame::zeroed()
        }),
        Ok(None) => {
            log::debug!("frame {index}: no body detected");
            LandmarkFrame::zeroed()
        }
        Err(err) => {
            log::warn!("frame {index}: landmark detection failed: {err:?}");
            LandmarkFrame::zeroed()
        }
    }
}

/// Replays detector output captured earlier. Each frame already carries its
/// detection, so `detect` just hands it back.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordedDetections;

impl LandmarkProvider for RecordedDetections {
    type Frame = Option<Detection>;

    fn detect(&mut self, frame: &Self::Frame) -> anyhow::Result<Option<Detection>> {
        Ok(frame.clone())
    }
}

/// Reads a JSON-lines recording: one line per video frame, holding either
/// `null` or an array of `[x, y, z]` landmarks. Blank lines are ignored.
pub fn read_recording(path: &Path) -> Result<Vec<Option<Detection>>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_recording(BufReader::new(file))
        .with_context(|| format!("failed to read landmark recording {}", path.display()))
}

pub fn parse_recording<R: BufRead>(reader: R) -> Result<Vec<Option<Detection>>> {
    let mut frames = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("failed while reading recording")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let detection: Option<Detection> = serde_json::from_str(trimmed)
            .map_err(|err| anyhow!("line {}: {err}", line_no + 1))?;
        frames.push(detection);
    }
    Ok(frames)
}
