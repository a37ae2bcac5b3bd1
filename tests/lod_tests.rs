//! Mesh simplification and `.lod` cache tests
//!
//! Tests for:
//! - Quadric-error decimation on a flat grid fixture
//! - Boundary (margin) vertex preservation
//! - Input validation
//! - `.lod` cache round-trips, corruption handling and the generate path

use glam::Vec3;

use lumen::lod::{
    generate_lod, lod_cache_path, read_lod_cache, write_lod_cache, LodConfig, Simplifier,
};
use lumen::LumenError;

/// Flat 4x4 vertex grid in the XY plane: 16 vertices, 18 triangles. Interior
/// vertices (5, 6, 9, 10) are collapsible, the rim is margin.
fn grid() -> (Vec<u16>, Vec<Vec3>) {
    let mut positions = Vec::new();
    for row in 0..4 {
        for col in 0..4 {
            positions.push(Vec3::new(col as f32, row as f32, 0.0));
        }
    }
    let mut indices = Vec::new();
    for row in 0..3u16 {
        for col in 0..3u16 {
            let i = row * 4 + col;
            indices.extend_from_slice(&[i, i + 1, i + 4]);
            indices.extend_from_slice(&[i + 1, i + 5, i + 4]);
        }
    }
    (indices, positions)
}

// ============================================================================
// Decimation
// ============================================================================

#[test]
fn grid_fixture_is_sound() {
    let (indices, positions) = grid();
    assert_eq!(positions.len(), 16);
    assert_eq!(indices.len(), 18 * 3);
    let simplifier = Simplifier::new(&indices, &positions).unwrap();
    assert_eq!(simplifier.triangle_count(), 18);
}

#[test]
fn zero_threshold_changes_nothing() {
    let (indices, positions) = grid();
    let mut simplifier = Simplifier::new(&indices, &positions).unwrap();
    simplifier.decimate(0.0);
    assert_eq!(simplifier.triangle_count(), 18);
    assert_eq!(simplifier.index_buffer(), indices);
}

#[test]
fn flat_interior_collapses_below_threshold() {
    // Every interior collapse on a flat grid is free, so even a tiny
    // threshold removes triangles.
    let (indices, positions) = grid();
    let mut simplifier = Simplifier::new(&indices, &positions).unwrap();
    simplifier.decimate(0.1);
    assert!(
        simplifier.triangle_count() < 18,
        "flat interior should collapse, still {} triangles",
        simplifier.triangle_count()
    );

    let reduced = simplifier.index_buffer();
    assert_eq!(reduced.len() % 3, 0);
    assert_eq!(reduced.len() / 3, simplifier.triangle_count());
}

#[test]
fn higher_thresholds_never_keep_more_triangles() {
    let (indices, positions) = grid();
    let mut previous = usize::MAX;
    for threshold in [0.0, 1e-3, 0.5, 5.0, 1e6] {
        let mut simplifier = Simplifier::new(&indices, &positions).unwrap();
        simplifier.decimate(threshold);
        let count = simplifier.triangle_count();
        assert!(
            count <= previous,
            "threshold {threshold} kept {count} > {previous} triangles"
        );
        previous = count;
    }
}

#[test]
fn margin_vertices_survive_unbounded_decimation() {
    let (indices, positions) = grid();
    let mut simplifier = Simplifier::new(&indices, &positions).unwrap();
    simplifier.decimate(1e9);

    assert!(simplifier.triangle_count() > 0, "the rim must remain meshed");
    let reduced = simplifier.index_buffer();
    for corner in [0u16, 3, 12, 15] {
        assert!(
            reduced.contains(&corner),
            "corner vertex {corner} vanished from the index buffer"
        );
    }
}

#[test]
fn margin_classification() {
    let (indices, positions) = grid();
    let simplifier = Simplifier::new(&indices, &positions).unwrap();
    for rim in [0, 1, 2, 3, 4, 7, 8, 11, 12, 13, 14, 15] {
        assert!(simplifier.is_margin(rim), "vertex {rim} is on the rim");
    }
    for interior in [5, 6, 9, 10] {
        assert!(!simplifier.is_margin(interior), "vertex {interior} is interior");
    }
}

#[test]
fn decimate_steps_run_until_the_queue_drains() {
    let (indices, positions) = grid();
    let mut simplifier = Simplifier::new(&indices, &positions).unwrap();
    let mut steps = 0;
    while simplifier.decimate_step() {
        steps += 1;
        assert!(steps <= indices.len(), "collapse loop did not terminate");
    }
    assert!(steps > 0);
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn ragged_index_buffer_is_rejected() {
    let (_, positions) = grid();
    let err = Simplifier::new(&[0, 1, 4, 2], &positions).unwrap_err();
    assert!(matches!(err, LumenError::InvalidMesh(_)));
}

#[test]
fn empty_mesh_is_rejected() {
    assert!(Simplifier::new(&[], &[]).is_err());
}

#[test]
fn out_of_range_index_is_rejected() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    let err = Simplifier::new(&[0, 1, 9], &positions).unwrap_err();
    assert!(matches!(err, LumenError::InvalidMesh(_)));
}

// ============================================================================
// Cache files
// ============================================================================

#[test]
fn cache_path_is_a_sibling() {
    assert_eq!(
        lod_cache_path("meshes/tree.mesh".as_ref()),
        std::path::Path::new("meshes/tree.lod")
    );
}

#[test]
fn cache_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.lod");
    let indices: Vec<u16> = vec![0, 1, 2, 2, 1, 3];
    write_lod_cache(&path, &indices).unwrap();
    assert_eq!(read_lod_cache(&path).unwrap(), indices);
}

#[test]
fn truncated_cache_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.lod");
    write_lod_cache(&path, &[0, 1, 2, 2, 1, 3]).unwrap();
    let blob = std::fs::read(&path).unwrap();
    std::fs::write(&path, &blob[..blob.len() - 3]).unwrap();

    let err = read_lod_cache(&path).unwrap_err();
    assert!(matches!(err, LumenError::MalformedLodCache { .. }));
}

#[test]
fn non_triangle_count_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.lod");
    let mut blob = 4u32.to_le_bytes().to_vec();
    blob.extend_from_slice(&[0; 8]);
    std::fs::write(&path, blob).unwrap();

    let err = read_lod_cache(&path).unwrap_err();
    assert!(matches!(err, LumenError::MalformedLodCache { .. }));
}

// ============================================================================
// generate_lod
// ============================================================================

#[test]
fn generate_writes_then_hits_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = dir.path().join("terrain.mesh");
    let (indices, positions) = grid();

    let config = LodConfig::default();
    let first = generate_lod(&mesh, &indices, &positions, &config).unwrap();
    assert!(lod_cache_path(&mesh).exists());

    // Second call must read the file, not re-decimate.
    let second = generate_lod(&mesh, &indices, &positions, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn generate_prefers_an_existing_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = dir.path().join("terrain.mesh");
    let canned: Vec<u16> = vec![0, 1, 4];
    write_lod_cache(&lod_cache_path(&mesh), &canned).unwrap();

    let (indices, positions) = grid();
    let result = generate_lod(&mesh, &indices, &positions, &LodConfig::default()).unwrap();
    assert_eq!(result, canned);
}

#[test]
fn disabled_simplification_returns_the_original() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let mesh = dir.path().join("terrain.mesh");
    let (indices, positions) = grid();

    let config = LodConfig {
        enabled: false,
        threshold: 0.5,
    };
    let result = generate_lod(&mesh, &indices, &positions, &config).unwrap();
    assert_eq!(result, indices);
    assert!(!lod_cache_path(&mesh).exists(), "disabled path must not cache");
}
