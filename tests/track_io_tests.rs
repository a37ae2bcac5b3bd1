//! Keyframe tree persistence tests
//!
//! Tests for:
//! - Bit-exact write/read round-trips of the binary tree blob
//! - Hard errors on truncated or corrupt input
//! - Asset path resolution and missing-file mapping

use glam::Vec4;

use lumen::animation::{
    read_animation, resolve_animation_path, write_animation, Interpolation, Keyframe, KeyframeTree,
};
use lumen::LumenError;

fn sample_tree() -> KeyframeTree {
    let mut keys = vec![
        Keyframe::new(0.0, Interpolation::LinearVec3, Vec4::new(0.0, 1.0, 2.0, 0.0), 0.0, 0.5),
        Keyframe::new(250.0, Interpolation::LinearVec3, Vec4::new(3.0, 4.0, 5.0, 0.0), -0.5, 0.0),
        Keyframe::new(1000.0, Interpolation::LinearVec3, Vec4::new(6.0, 7.0, 8.0, 0.0), 1.0, 0.0),
        Keyframe::new(1300.0, Interpolation::LinearVec3, Vec4::new(9.0, 9.5, 9.75, 0.0), 0.0, 0.0),
    ];
    Keyframe::prepare(&mut keys);
    KeyframeTree::build(&keys)
}

// ============================================================================
// Round-trips
// ============================================================================

#[test]
fn tree_round_trips_through_a_buffer() {
    let tree = sample_tree();
    let mut blob = Vec::new();
    tree.write_to(&mut blob).unwrap();

    let restored = KeyframeTree::read_from(&mut blob.as_slice()).unwrap();
    assert_eq!(tree, restored);

    // Re-serializing produces the identical byte stream.
    let mut blob2 = Vec::new();
    restored.write_to(&mut blob2).unwrap();
    assert_eq!(blob, blob2);
}

#[test]
fn single_leaf_round_trips() {
    let mut keys = vec![Keyframe::new(
        0.0,
        Interpolation::None,
        Vec4::splat(7.0),
        0.0,
        0.0,
    )];
    Keyframe::prepare(&mut keys);
    let tree = KeyframeTree::build(&keys);
    assert!(matches!(tree, KeyframeTree::Leaf(_)));

    let mut blob = Vec::new();
    tree.write_to(&mut blob).unwrap();
    let restored = KeyframeTree::read_from(&mut blob.as_slice()).unwrap();
    assert_eq!(tree, restored);
}

#[test]
fn restored_tree_samples_identically() {
    let tree = sample_tree();
    let mut blob = Vec::new();
    tree.write_to(&mut blob).unwrap();
    let restored = KeyframeTree::read_from(&mut blob.as_slice()).unwrap();

    for time in [0.0, 100.0, 250.0, 600.0, 1299.0, 2000.0] {
        let mut base_a = 0.0;
        let mut base_b = 0.0;
        assert_eq!(
            tree.sample(time, &mut base_a, false),
            restored.sample(time, &mut base_b, false),
            "diverged at t = {time}"
        );
    }
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn truncated_blob_is_an_error() {
    let tree = sample_tree();
    let mut blob = Vec::new();
    tree.write_to(&mut blob).unwrap();

    for len in [0, 3, 5, blob.len() / 2, blob.len() - 1] {
        assert!(
            KeyframeTree::read_from(&mut &blob[..len]).is_err(),
            "truncation to {len} bytes must fail"
        );
    }
}

#[test]
fn invalid_node_flag_is_an_error() {
    // f32 divider followed by an unknown node flag.
    let blob: [u8; 5] = [0, 0, 0, 0, 7];
    let err = KeyframeTree::read_from(&mut blob.as_slice()).unwrap_err();
    assert!(matches!(err, LumenError::MalformedAnimation(_)));
}

#[test]
fn invalid_interpolation_tag_is_an_error() {
    let mut blob = Vec::new();
    // Leaf header, then an interpolation tag past the known range.
    blob.extend_from_slice(&0.0_f32.to_le_bytes());
    blob.push(1);
    blob.extend_from_slice(&99_u32.to_le_bytes());
    blob.extend_from_slice(&[0; 13 * 4]);
    let err = KeyframeTree::read_from(&mut blob.as_slice()).unwrap_err();
    assert!(matches!(err, LumenError::MalformedAnimation(_)));
}

// ============================================================================
// Asset paths
// ============================================================================

#[test]
fn animation_paths_are_prefixed_once() {
    assert_eq!(
        resolve_animation_path("walk.anim".as_ref()),
        std::path::Path::new("animations/walk.anim")
    );
    assert_eq!(
        resolve_animation_path("animations/walk.anim".as_ref()),
        std::path::Path::new("animations/walk.anim")
    );
}

#[test]
fn missing_animation_maps_to_not_found() {
    let dir = tempfile::tempdir().unwrap();
    // Absolute path, so resolution leaves it alone and no cwd is touched.
    let err = read_animation(dir.path().join("nope.anim")).unwrap_err();
    assert!(matches!(err, LumenError::AnimationNotFound(_)));
}

#[test]
fn write_then_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assets").join("spin.anim");

    let tree = sample_tree();
    write_animation(&path, &tree).unwrap();
    let restored = read_animation(&path).unwrap();
    assert_eq!(tree, restored);
}
