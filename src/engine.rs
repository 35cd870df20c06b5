use std::{
    borrow::Borrow,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use rayon::prelude::*;
use thiserror::Error;

use crate::{
    catalog::PoseCatalog,
    encoding::encode_sequence,
    pipeline,
    pose::{ClassifiedPose, PoseKeyError},
    types::{LandmarkFrame, PoseDescriptor},
};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification cancelled after {frames} frames")]
    Cancelled { frames: usize },
    #[error("landmark detection worker panicked")]
    WorkerPanicked,
}

/// Shared cancellation signal, checked once per frame.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a flag owned elsewhere, e.g. one set from a signal handler.
    pub fn from_shared(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }

    pub fn shared(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub enum ClassifyEvent {
    Classified {
        index: usize,
        pose: ClassifiedPose,
        distance: f64,
    },
    Skipped {
        index: usize,
        reason: PoseKeyError,
    },
    Finished {
        classified: usize,
        skipped: usize,
    },
}

/// Poses of one video in frame order. Frames whose nearest catalog key does
/// not decode are left out and listed in `skipped`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoClassification {
    pub poses: Vec<ClassifiedPose>,
    pub skipped: Vec<usize>,
}

impl VideoClassification {
    pub fn encode(&self) -> String {
        encode_sequence(&self.poses)
    }
}

/// Classifies landmark frames against a shared, read-only pose catalog.
#[derive(Clone, Debug)]
pub struct PoseEngine {
    catalog: Arc<PoseCatalog>,
}

impl PoseEngine {
    pub fn new(catalog: PoseCatalog) -> Self {
        Self::from_shared(Arc::new(catalog))
    }

    pub fn from_shared(catalog: Arc<PoseCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PoseCatalog {
        &self.catalog
    }

    pub fn build_descriptor(&self, frame: &LandmarkFrame) -> PoseDescriptor {
        pipeline::build_descriptor(frame)
    }

    /// Nearest catalog pose for one frame, with its distance.
    pub fn classify_frame(
        &self,
        frame: &LandmarkFrame,
    ) -> Result<(ClassifiedPose, f64), PoseKeyError> {
        let descriptor = pipeline::build_descriptor(frame);
        let best = self.catalog.nearest(&descriptor);
        best.entry.pose().map(|pose| (pose, best.distance))
    }

    pub fn classify_video<I>(&self, frames: I) -> VideoClassification
    where
        I: IntoIterator,
        I::Item: Borrow<LandmarkFrame>,
    {
        let mut out = VideoClassification::default();
        for (index, frame) in frames.into_iter().enumerate() {
            self.push_frame(index, frame.borrow(), &mut out, &mut |_| {});
        }
        out
    }

    /// Like [`PoseEngine::classify_video`], stopping at the next frame
    /// boundary once `cancel` is set and reporting progress to `on_event`.
    pub fn classify_video_with<I, F>(
        &self,
        frames: I,
        cancel: &CancelFlag,
        mut on_event: F,
    ) -> Result<VideoClassification, ClassifyError>
    where
        I: IntoIterator,
        I::Item: Borrow<LandmarkFrame>,
        F: FnMut(ClassifyEvent),
    {
        let mut out = VideoClassification::default();
        let mut processed = 0;
        for (index, frame) in frames.into_iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("classification cancelled at frame {index}");
                return Err(ClassifyError::Cancelled { frames: index });
            }
            self.push_frame(index, frame.borrow(), &mut out, &mut on_event);
            processed = index + 1;
        }
        // A producer that saw the flag first may have ended the stream early.
        if cancel.is_cancelled() {
            log::info!("classification cancelled after {processed} frames");
            return Err(ClassifyError::Cancelled { frames: processed });
        }
        on_event(ClassifyEvent::Finished {
            classified: out.poses.len(),
            skipped: out.skipped.len(),
        });
        Ok(out)
    }

    /// Classifies independent videos in parallel. Results keep input order.
    pub fn classify_videos(&self, videos: &[Vec<LandmarkFrame>]) -> Vec<VideoClassification> {
        videos
            .par_iter()
            .map(|frames| self.classify_video(frames))
            .collect()
    }

    fn push_frame(
        &self,
        index: usize,
        frame: &LandmarkFrame,
        out: &mut VideoClassification,
        on_event: &mut dyn FnMut(ClassifyEvent),
    ) {
        match self.classify_frame(frame) {
            Ok((pose, distance)) => {
                log::debug!("frame {index}: {pose} at distance {distance:.3}");
                out.poses.push(pose);
                on_event(ClassifyEvent::Classified {
                    index,
                    pose,
                    distance,
                });
            }
            Err(reason) => {
                log::warn!(
                    "frame {index}: skipping, nearest catalog key does not decode: {reason}"
                );
                out.skipped.push(index);
                on_event(ClassifyEvent::Skipped { index, reason });
            }
        }
    }
}
