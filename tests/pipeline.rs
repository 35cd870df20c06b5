use std::{fs, path::PathBuf, sync::Arc, thread};

use tango_pose::{
    CancelFlag, ClassifyEvent, LandmarkFrame, PoseCatalog, PoseCatalogEntry, PoseEngine,
    RecordedDetections, WorkerOptions, build_descriptor, decode_sequence, export,
    landmarks::{self, DEFAULT_LANDMARK_SCALE, Detection},
    run_video,
    types::NUM_LANDMARKS,
};

const FORWARD: &str = r#"Pose(name="Forward", height="straight", leg="right", direction="north", slider=0, angle=0, lean="straight")"#;
const SLIDE: &str = r#"Pose(name="Slide outside", height="tiptoe", leg="left", direction="northeast", slider=5, angle=180, lean="backward")"#;

fn detection(shift: f32) -> Detection {
    (0..NUM_LANDMARKS)
        .map(|i| {
            let t = i as f32;
            [
                0.5 + 0.25 * (t * 0.41 + shift).sin(),
                0.1 + t / 40.0,
                0.05 * (t * 0.23 + shift).cos(),
            ]
        })
        .collect()
}

fn frame(shift: f32) -> LandmarkFrame {
    LandmarkFrame::from_detection(&detection(shift), DEFAULT_LANDMARK_SCALE).unwrap()
}

fn engine() -> PoseEngine {
    PoseEngine::new(
        PoseCatalog::new(vec![
            PoseCatalogEntry::new(FORWARD, build_descriptor(&frame(0.0))),
            PoseCatalogEntry::new(SLIDE, build_descriptor(&frame(2.5))),
        ])
        .unwrap(),
    )
}

#[test]
fn bundled_catalog_loads_and_decodes() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/pose_catalog.json");
    let catalog = PoseCatalog::load(&path).unwrap();
    assert_eq!(catalog.len(), 5);
    for entry in catalog.entries() {
        assert!(entry.pose().is_ok(), "key does not decode: {}", entry.key());
    }
    let canonical = FORWARD.trim_start_matches("Pose(").trim_end_matches(')');
    assert_eq!(catalog.entries()[0].pose().unwrap().key(), canonical);
}

#[test]
fn reference_frame_classifies_as_its_own_pose() {
    let engine = engine();
    let (pose, distance) = engine.classify_frame(&frame(0.0)).unwrap();
    assert!(distance < 1e-9);
    let result = engine.classify_video([frame(0.0)]);
    assert_eq!(result.encode(), "0020000");
    assert_eq!(decode_sequence(&result.encode()).unwrap(), vec![pose]);
}

#[test]
fn translating_the_body_does_not_change_the_match() {
    let engine = engine();
    for shift in [0.0f32, 2.5] {
        let original = frame(shift);
        let mut moved = *original.points();
        for p in moved.iter_mut() {
            p[0] += 3.0;
            p[1] -= 1.5;
            p[2] += 0.25;
        }
        let a = engine.classify_frame(&original).unwrap().0;
        let b = engine.classify_frame(&LandmarkFrame::new(moved)).unwrap().0;
        assert_eq!(a, b);
    }
}

#[test]
fn recording_on_disk_produces_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let recording = dir.path().join("video.jsonl");
    let lines: Vec<String> = [Some(detection(0.0)), None, Some(detection(2.5))]
        .iter()
        .map(|d| serde_json::to_string(d).unwrap())
        .collect();
    fs::write(&recording, lines.join("\n")).unwrap();

    let frames = landmarks::read_recording(&recording).unwrap();
    assert_eq!(frames.len(), 3);

    let mut events = Vec::new();
    let result = run_video(
        &engine(),
        RecordedDetections,
        frames,
        WorkerOptions {
            scale: DEFAULT_LANDMARK_SCALE,
            queue_depth: 1,
        },
        &CancelFlag::new(),
        |event| events.push(event),
    )
    .unwrap();

    // The missing detection still yields a frame, classified from zeroed landmarks.
    assert_eq!(result.poses.len(), 3);
    assert!(matches!(
        events.last(),
        Some(ClassifyEvent::Finished {
            classified: 3,
            skipped: 0
        })
    ));
    let encoded = result.encode();
    assert!(encoded.starts_with("0020000"));
    assert!(encoded.ends_with("2266512"));

    let dest = export::classification_path(dir.path(), "run1");
    export::write_artifact(&dest, &encoded).unwrap();
    assert_eq!(fs::read_to_string(dest).unwrap(), encoded);
}

#[test]
fn concurrent_videos_share_one_catalog() {
    let engine = Arc::new(engine());
    let video: Vec<LandmarkFrame> = (0..20).map(|i| frame(i as f32 * 0.2)).collect();
    let expected = engine.classify_video(&video).encode();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let video = video.clone();
            thread::spawn(move || engine.classify_video(&video).encode())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }

    for result in engine.classify_videos(&vec![video; 3]) {
        assert_eq!(result.encode(), expected);
    }
}
