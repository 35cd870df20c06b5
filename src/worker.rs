use std::thread;

use crossbeam_channel::{Sender, bounded};

use crate::{
    engine::{CancelFlag, ClassifyError, ClassifyEvent, PoseEngine, VideoClassification},
    landmarks::{LandmarkProvider, landmarks_or_zeroed},
    types::{LandmarkFrame, LandmarkScale},
};

/// Settings for the detection thread.
#[derive(Clone, Copy, Debug)]
pub struct WorkerOptions {
    pub scale: LandmarkScale,
    pub queue_depth: usize,
}

/// Runs `provider` over `frames` on its own thread, sending one landmark
/// frame per input frame, in input order. Stops when the frames run out,
/// the receiver goes away, or `cancel` is set.
pub fn start_detection_worker<P, I>(
    mut provider: P,
    frames: I,
    scale: LandmarkScale,
    cancel: CancelFlag,
    landmark_tx: Sender<LandmarkFrame>,
) -> thread::JoinHandle<()>
where
    P: LandmarkProvider,
    I: IntoIterator<Item = P::Frame> + Send + 'static,
{
    thread::spawn(move || {
        for (index, frame) in frames.into_iter().enumerate() {
            if cancel.is_cancelled() {
                log::debug!("detection worker cancelled at frame {index}");
                break;
            }
            let landmarks = landmarks_or_zeroed(index, provider.detect(&frame), scale);
            if landmark_tx.send(landmarks).is_err() {
                log::debug!("landmark receiver dropped, stopping detection at frame {index}");
                break;
            }
        }
    })
}

/// Full pipeline for one video: detection on a worker thread, classification
/// on the calling thread as landmark frames arrive.
pub fn run_video<P, I, F>(
    engine: &PoseEngine,
    provider: P,
    frames: I,
    options: WorkerOptions,
    cancel: &CancelFlag,
    on_event: F,
) -> Result<VideoClassification, ClassifyError>
where
    P: LandmarkProvider,
    I: IntoIterator<Item = P::Frame> + Send + 'static,
    F: FnMut(ClassifyEvent),
{
    let (landmark_tx, landmark_rx) = bounded(options.queue_depth.max(1));
    let handle = start_detection_worker(
        provider,
        frames,
        options.scale,
        cancel.clone(),
        landmark_tx,
    );

    let result = engine.classify_video_with(landmark_rx.iter(), cancel, on_event);

    // Unblock a worker waiting on a full queue before joining it.
    drop(landmark_rx);
    if handle.join().is_err() {
        log::error!("landmark detection worker panicked");
        return Err(ClassifyError::WorkerPanicked);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{PoseCatalog, PoseCatalogEntry},
        landmarks::{DEFAULT_LANDMARK_SCALE, Detection, RecordedDetections},
        pipeline,
        types::NUM_LANDMARKS,
    };

    const FORWARD: &str = r#"name="Forward", height="straight", leg="right", direction="north", slider=0, angle=0, lean="straight""#;
    const BACKWARD: &str = r#"name="Backward", height="bent", leg="left", direction="northwest", slider=2, angle=60, lean="forward""#;

    fn detection(shift: f32) -> Detection {
        (0..NUM_LANDMARKS)
            .map(|i| {
                let t = i as f32;
                [
                    0.5 + 0.3 * (t * 0.37 + shift).sin(),
                    t / NUM_LANDMARKS as f32,
                    0.1 * (t * 0.11).cos(),
                ]
            })
            .collect()
    }

    fn engine() -> PoseEngine {
        let scale = DEFAULT_LANDMARK_SCALE;
        let forward = LandmarkFrame::from_detection(&detection(0.0), scale).unwrap();
        let backward = LandmarkFrame::from_detection(&detection(2.0), scale).unwrap();
        PoseEngine::new(
            PoseCatalog::new(vec![
                PoseCatalogEntry::new(FORWARD, pipeline::build_descriptor(&forward)),
                PoseCatalogEntry::new(BACKWARD, pipeline::build_descriptor(&backward)),
            ])
            .unwrap(),
        )
    }

    struct Flaky;

    impl LandmarkProvider for Flaky {
        type Frame = usize;

        fn detect(&mut self, frame: &usize) -> anyhow::Result<Option<Detection>> {
            match frame % 3 {
                0 => Ok(Some(detection(0.0))),
                1 => Ok(Some(detection(2.0))),
                _ => Err(anyhow::anyhow!("decoder glitch")),
            }
        }
    }

    #[test]
    fn frames_are_classified_in_order() {
        let options = WorkerOptions {
            scale: DEFAULT_LANDMARK_SCALE,
            queue_depth: 2,
        };
        let frames = vec![Some(detection(0.0)), Some(detection(2.0)), Some(detection(0.0))];
        let result = run_video(
            &engine(),
            RecordedDetections,
            frames,
            options,
            &CancelFlag::new(),
            |_| {},
        )
        .unwrap();
        assert_eq!(result.encode(), "002000011322110020000");
    }

    #[test]
    fn failed_detections_still_produce_frames() {
        let options = WorkerOptions {
            scale: DEFAULT_LANDMARK_SCALE,
            queue_depth: 1,
        };
        let mut classified = Vec::new();
        let result = run_video(&engine(), Flaky, 0..6usize, options, &CancelFlag::new(), |e| {
            if let ClassifyEvent::Classified { index, .. } = e {
                classified.push(index);
            }
        })
        .unwrap();
        assert_eq!(classified, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(result.poses.len(), 6);
    }

    #[test]
    fn externally_set_flag_stops_the_run() {
        use std::sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        };

        let options = WorkerOptions {
            scale: DEFAULT_LANDMARK_SCALE,
            queue_depth: 1,
        };

        let raised = Arc::new(AtomicBool::new(true));
        let result = run_video(
            &engine(),
            Flaky,
            0..100usize,
            options,
            &CancelFlag::from_shared(Arc::clone(&raised)),
            |_| {},
        );
        assert!(matches!(result, Err(ClassifyError::Cancelled { frames: 0 })));

        let signal = Arc::new(AtomicBool::new(false));
        let cancel = CancelFlag::from_shared(Arc::clone(&signal));
        let result = run_video(&engine(), Flaky, 0..10_000usize, options, &cancel, |e| {
            if let ClassifyEvent::Classified { index: 2, .. } = e {
                signal.store(true, Ordering::SeqCst);
            }
        });
        assert!(matches!(result, Err(ClassifyError::Cancelled { frames: 3 })));
    }

    #[test]
    fn cancelling_stops_worker_and_classifier() {
        let options = WorkerOptions {
            scale: DEFAULT_LANDMARK_SCALE,
            queue_depth: 1,
        };
        let cancel = CancelFlag::new();
        let result = run_video(&engine(), Flaky, 0..10_000usize, options, &cancel, |e| {
            if let ClassifyEvent::Classified { index: 3, .. } = e {
                cancel.cancel();
            }
        });
        assert!(matches!(result, Err(ClassifyError::Cancelled { frames: 4 })));
    }
}
