use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Serialize;

use crate::{
    landmarks::Detection,
    types::{NUM_LANDMARKS, Point3, PoseDescriptor},
};

/// `save.txt` + `42` -> `save_42.txt`.
pub fn unique_filename(filename: &str, id: &str) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}_{id}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{id}"),
    }
}

/// Local timestamp down to the microsecond, `YYYYMMDDHHMMSSffffff`.
pub fn generate_identifier() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S%6f").to_string()
}

/// Writes `contents` to `dest` through a temporary sibling file so readers
/// never observe a partial artifact.
pub fn write_artifact(dest: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    let tmp_path = dest.with_extension("partial");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    file.write_all(contents.as_bytes())
        .context("failed while writing artifact")?;
    file.sync_all()
        .context("failed to flush artifact to disk")?;
    fs::rename(&tmp_path, dest).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            tmp_path.display(),
            dest.display()
        )
    })?;

    log::info!("wrote {} bytes to {}", contents.len(), dest.display());
    Ok(())
}

/// Location of the classification artifact for run `id`.
pub fn classification_path(output_dir: &Path, id: &str) -> PathBuf {
    output_dir.join(unique_filename("save.txt", id))
}

/// One animation frame: `x,1-y,z,` for every landmark, unscaled. Failed
/// detections render as zeroed landmarks.
pub fn animation_line(detection: Option<&Detection>) -> String {
    let mut line = String::new();
    match detection.filter(|d| d.len() == NUM_LANDMARKS) {
        Some(points) => {
            for [x, y, z] in points {
                line.push_str(&format!("{x},{},{z},", 1.0 - y));
            }
        }
        None => {
            for _ in 0..NUM_LANDMARKS {
                line.push_str("0,1,0,");
            }
        }
    }
    line
}

pub fn animation_document(detections: &[Option<Detection>]) -> String {
    let mut out = String::new();
    for detection in detections {
        out.push_str(&animation_line(detection.as_ref()));
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct FrameAngles<'a> {
    frame: usize,
    angles: &'a PoseDescriptor,
}

/// Per-frame descriptors as a JSON array in frame order.
pub fn angles_document(descriptors: &[PoseDescriptor]) -> anyhow::Result<String> {
    let frames: Vec<FrameAngles<'_>> = descriptors
        .iter()
        .enumerate()
        .map(|(frame, angles)| FrameAngles { frame, angles })
        .collect();
    serde_json::to_string_pretty(&frames).context("failed to serialize joint angles")
}

#[derive(Serialize)]
struct FramePositions<'a> {
    frame: usize,
    positions: &'a [Point3],
}

pub fn positions_document(positions: &[[Point3; NUM_LANDMARKS]]) -> anyhow::Result<String> {
    let frames: Vec<FramePositions<'_>> = positions
        .iter()
        .enumerate()
        .map(|(frame, p)| FramePositions {
            frame,
            positions: p.as_slice(),
        })
        .collect();
    serde_json::to_string_pretty(&frames).context("failed to serialize body-frame positions")
}
