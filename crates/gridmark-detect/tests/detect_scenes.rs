use gridmark_core::{GrayImage, Homography};
use gridmark_detect::render::{MarkerSpec, Scene};
use gridmark_detect::{
    detect, BitGrid, DetectError, Detection, Detector, DetectorParams, RejectReason,
};
use nalgebra::{Matrix3, Point2};

const CELL_PX: usize = 20;
const OFFSET: usize = 100;

fn payload() -> BitGrid {
    BitGrid::from_rows(&[[0u8, 1, 1, 1], [1, 1, 0, 1], [1, 0, 1, 1], [1, 1, 1, 1]])
        .expect("square payload")
}

fn other_payload() -> BitGrid {
    BitGrid::from_rows(&[[0u8, 1, 1, 1], [1, 0, 0, 1], [1, 1, 1, 1], [1, 0, 1, 1]])
        .expect("square payload")
}

// 320x320 white frame with the marker turned counter-clockwise `turns` times.
fn rotated_scene(turns: usize) -> GrayImage {
    let marker = MarkerSpec::new(payload(), CELL_PX).render();
    let mut scene = Scene::new(320, 320, 255);
    scene.place_rotated(&marker, OFFSET, OFFSET, turns);
    scene.into_image()
}

fn detector() -> Detector {
    Detector::new(DetectorParams::default()).expect("default params")
}

fn assert_near(p: Point2<f32>, expected: (f32, f32), tol: f32) {
    assert!(
        (p.x - expected.0).abs() <= tol && (p.y - expected.1).abs() <= tol,
        "corner {p:?} not within {tol} px of {expected:?}"
    );
}

fn assert_all_decode(dets: &[Detection], expected: &BitGrid) {
    assert!(!dets.is_empty(), "no marker found");
    for d in dets {
        assert_eq!(&d.marker.payload, expected);
    }
}

#[test]
fn upright_marker_is_found_with_its_payload() {
    let frame = rotated_scene(0);
    let dets = detector().detect(&frame.view()).expect("frame");
    assert_all_decode(&dets, &payload());
    for d in &dets {
        assert_near(d.corners[0], (100.0, 100.0), 6.0);
        assert_near(d.corners[2], (220.0, 220.0), 6.0);
    }
}

#[test]
fn quarter_turns_are_undone() {
    let side = (6 * CELL_PX) as f32;
    let o = OFFSET as f32;
    // where the canonical top-left corner ends up after each turn
    let key_corner = [(o, o), (o, o + side), (o + side, o + side), (o + side, o)];

    for (turns, expected) in key_corner.into_iter().enumerate() {
        let frame = rotated_scene(turns);
        let dets = detector().detect(&frame.view()).expect("frame");
        assert_all_decode(&dets, &payload());
        for d in &dets {
            assert_near(d.corners[0], expected, 6.0);
        }
    }
}

#[test]
fn oriented_homography_maps_canvas_origin_to_key_corner() {
    let frame = rotated_scene(1);
    let params = DetectorParams::default();
    let s = params.canvas_size as f32;
    for d in detector().detect(&frame.view()).expect("frame") {
        let origin = d.h_img_from_canvas.apply(Point2::new(0.0, 0.0));
        assert_near(origin, (d.corners[0].x, d.corners[0].y), 1e-2);
        let far = d.h_img_from_canvas.apply(Point2::new(s, s));
        assert_near(far, (d.corners[2].x, d.corners[2].y), 1e-2);
    }
}

#[test]
fn tilted_marker_under_perspective_is_found() {
    let cell = 24;
    let marker = MarkerSpec::new(payload(), cell).render();
    let half = (marker.width / 2) as f64;

    let (s, c) = 30f64.to_radians().sin_cos();
    let to_centre = Matrix3::new(1.0, 0.0, -half, 0.0, 1.0, -half, 0.0, 0.0, 1.0);
    let rotate = Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);
    let tilt = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0004, 0.0002, 1.0);
    let place = Matrix3::new(1.0, 0.0, 160.0, 0.0, 1.0, 160.0, 0.0, 0.0, 1.0);
    let h = Homography::new(place * tilt * rotate * to_centre);

    let mut scene = Scene::new(320, 320, 255);
    scene.place_warped(&marker, &h);
    let frame = scene.into_image();

    let dets = detector().detect(&frame.view()).expect("frame");
    assert_all_decode(&dets, &payload());
    let key = h.apply(Point2::new(0.0, 0.0));
    for d in &dets {
        assert_near(d.corners[0], (key.x, key.y), 8.0);
    }
}

#[test]
fn two_markers_are_told_apart() {
    let a = MarkerSpec::new(payload(), CELL_PX).render();
    let b = MarkerSpec::new(other_payload(), CELL_PX).render();
    let mut scene = Scene::new(420, 240, 255);
    scene.place(&a, 40, 60).place_rotated(&b, 260, 60, 2);
    let frame = scene.into_image();

    let dets = detector().detect(&frame.view()).expect("frame");
    let (left, right): (Vec<_>, Vec<_>) = dets.into_iter().partition(|d| d.center().x < 210.0);
    assert_all_decode(&left, &payload());
    assert_all_decode(&right, &other_payload());
    // the second marker was turned twice, so its key corner is bottom-right
    for d in &right {
        assert_near(d.corners[0], (380.0, 180.0), 6.0);
    }
}

#[test]
fn marker_without_orientation_key_is_rejected() {
    let all_white = BitGrid::from_rows(&[[1u8; 4]; 4]).expect("square payload");
    let marker = MarkerSpec::new(all_white, CELL_PX).render();
    let mut scene = Scene::new(320, 320, 255);
    scene.place(&marker, OFFSET, OFFSET);
    let frame = scene.into_image();

    let run = detector().run(&frame.view()).expect("frame");
    assert!(run.detections.is_empty());
    assert!(run.num_quads > 0);
    assert!(run.rejections.iter().any(|r| r.reason
        == RejectReason::InvalidOrientation {
            corners: [1, 1, 1, 1]
        }));
}

#[test]
fn blank_frames_produce_nothing() {
    for value in [0u8, 128, 255] {
        let frame = GrayImage::filled(200, 150, value);
        let run = detector().run(&frame.view()).expect("frame");
        assert!(run.detections.is_empty());
        assert_eq!(run.num_quads, 0);
    }
}

#[test]
fn detection_is_deterministic_and_bounded_by_quads() {
    let frame = rotated_scene(3);
    let d = detector();
    let first = d.run(&frame.view()).expect("frame");
    let second = d.run(&frame.view()).expect("frame");
    assert_eq!(first, second);
    assert!(first.detections.len() <= first.num_quads);
    assert_eq!(
        first.detections.len() + first.rejections.len(),
        first.num_quads
    );
}

#[test]
fn kept_patches_are_in_canonical_pose() {
    let params = DetectorParams {
        keep_patches: true,
        ..DetectorParams::default()
    };
    let frame = rotated_scene(2);
    let dets = Detector::new(params).expect("params").detect(&frame.view()).expect("frame");
    assert!(!dets.is_empty());
    for d in &dets {
        let patch = d.patch.as_ref().expect("patch kept");
        assert_eq!((patch.width, patch.height), (120, 120));
        // key cell (grid 1,1) black, its right neighbour white
        assert_eq!(patch.get(30, 30), 0);
        assert_eq!(patch.get(50, 30), 255);
        // border
        assert_eq!(patch.get(10, 60), 0);
    }
}

#[test]
fn invalid_aperture_is_an_input_error() {
    let frame = rotated_scene(0);
    let params = DetectorParams {
        aperture_size: 8,
        ..DetectorParams::default()
    };
    assert_eq!(
        detect(&frame.view(), &params).unwrap_err(),
        DetectError::InvalidAperture(8)
    );
}

#[test]
fn raw_buffers_are_checked_before_detection() {
    let buf = vec![255u8; 100];
    let err = gridmark_core::GrayImageView::from_raw(&buf, 10, 11).unwrap_err();
    let err: DetectError = err.into();
    assert!(matches!(err, DetectError::Image(_)));
}
