//! Dance pose classification from body landmarks.
//!
//! Each frame's landmarks are turned into joint angles measured in per-joint
//! local frames, then matched against a fixed catalog of reference poses.
//! Matched poses serialize to a flat digit string, seven digits per frame.

pub mod catalog;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod export;
pub mod geometry;
pub mod landmarks;
pub mod pipeline;
pub mod pose;
pub mod types;
pub mod worker;

pub use catalog::{CatalogError, PoseCatalog, PoseCatalogEntry};
pub use encoding::{decode_sequence, encode_sequence};
pub use engine::{CancelFlag, ClassifyError, ClassifyEvent, PoseEngine, VideoClassification};
pub use landmarks::{LandmarkProvider, RecordedDetections};
pub use pipeline::build_descriptor;
pub use pose::{ClassifiedPose, PoseKeyError};
pub use types::{JointAngles, LandmarkFrame, LandmarkScale, PoseDescriptor, TrackedJoint};
pub use worker::{WorkerOptions, run_video};
