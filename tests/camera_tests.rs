//! Camera, frustum and billboard tests
//!
//! Tests for:
//! - Frustum plane extraction and AABB culling in both clip-space conventions
//! - View-matrix adoption and the origin-pinned sky matrix
//! - Fullscreen billboard corners, rays and tile subdivision
//! - Mirror reflection updates and orientation correction

use glam::{Mat4, Vec3, Vec4};

use lumen::scene::{orientation_correction, Aabb, Camera, ClipSpace};

const EPSILON: f32 = 1e-4;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn mat4_approx(a: Mat4, b: Mat4) -> bool {
    (0..4).all(|c| (a.col(c) - b.col(c)).abs().max_element() < EPSILON)
}

/// Camera at the origin looking down -Z, 60 degree fov, square aspect.
fn reference_camera(clip_space: ClipSpace) -> Camera {
    let mut cam = Camera::new(clip_space);
    cam.set_perspective(60.0, 512.0, 512.0, 0.1, 100.0);
    cam.look_at(Vec3::ZERO, -Vec3::Z, Vec3::Y);
    cam
}

// ============================================================================
// Frustum culling
// ============================================================================

#[test]
fn box_ahead_is_visible_behind_is_not() {
    for clip_space in [ClipSpace::ZeroToOne, ClipSpace::NegOneToOne] {
        let cam = reference_camera(clip_space);

        let ahead = Aabb::from_center_half_extent(Vec3::new(0.0, 0.0, -50.0), Vec3::ONE);
        assert!(cam.is_visible(&ahead), "{clip_space:?}: box in front culled");

        let behind = Aabb::from_center_half_extent(Vec3::new(0.0, 0.0, 50.0), Vec3::ONE);
        assert!(!cam.is_visible(&behind), "{clip_space:?}: box behind visible");
    }
}

#[test]
fn far_plane_culls() {
    let cam = reference_camera(ClipSpace::ZeroToOne);
    let past_far = Aabb::from_center_half_extent(Vec3::new(0.0, 0.0, -150.0), Vec3::ONE);
    assert!(!cam.is_visible(&past_far));
}

#[test]
fn side_planes_cull() {
    let cam = reference_camera(ClipSpace::ZeroToOne);
    // At z = -10 with a 60 degree square frustum the half-width is ~5.77.
    let inside = Aabb::from_center_half_extent(Vec3::new(5.0, 0.0, -10.0), Vec3::splat(0.1));
    let outside = Aabb::from_center_half_extent(Vec3::new(9.0, 0.0, -10.0), Vec3::splat(0.1));
    assert!(cam.is_visible(&inside));
    assert!(!cam.is_visible(&outside));
}

#[test]
fn straddling_box_is_visible() {
    let cam = reference_camera(ClipSpace::ZeroToOne);
    // Spans the left plane; the positive vertex keeps it visible.
    let straddling = Aabb::new(Vec3::new(-20.0, -1.0, -11.0), Vec3::new(0.0, 1.0, -9.0));
    assert!(cam.is_visible(&straddling));
}

#[test]
fn planes_are_normalized() {
    for clip_space in [ClipSpace::ZeroToOne, ClipSpace::NegOneToOne] {
        let cam = reference_camera(clip_space);
        for (i, plane) in cam.planes().iter().enumerate() {
            let len = plane.truncate().length();
            assert!(
                (len - 1.0).abs() < EPSILON,
                "{clip_space:?}: plane {i} normal length {len}"
            );
        }
    }
}

// ============================================================================
// View state
// ============================================================================

#[test]
fn set_view_matrix_recovers_the_eye() {
    let mut cam = reference_camera(ClipSpace::ZeroToOne);
    let eye = Vec3::new(3.0, 4.0, 5.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    cam.set_view_matrix(view);

    assert!(vec3_approx(cam.eye, eye));
    assert!(vec3_approx((cam.center - cam.eye).normalize(), -eye.normalize()));
}

#[test]
fn origo_matrix_ignores_camera_position() {
    let mut at_origin = reference_camera(ClipSpace::ZeroToOne);
    at_origin.look_at(Vec3::ZERO, -Vec3::Z, Vec3::Y);

    let mut translated = reference_camera(ClipSpace::ZeroToOne);
    translated.look_at(
        Vec3::new(100.0, 20.0, -7.0),
        Vec3::new(100.0, 20.0, -8.0),
        Vec3::Y,
    );

    assert!(mat4_approx(
        at_origin.view_projection_origo(),
        translated.view_projection_origo()
    ));
    assert!(!mat4_approx(
        at_origin.view_projection(),
        translated.view_projection()
    ));
}

// ============================================================================
// Billboards
// ============================================================================

#[test]
fn fullscreen_billboard_corners() {
    let mut cam = Camera::new(ClipSpace::ZeroToOne);
    cam.set_perspective(90.0, 512.0, 512.0, 0.1, 100.0);
    cam.look_at(Vec3::ZERO, -Vec3::Z, Vec3::Y);

    // tan(45) = 1, so the cross-section at depth 10 is 20 x 20.
    let [bl, br, tr, tl] = cam.fullscreen_billboard(10.0);
    assert!(vec3_approx(bl, Vec3::new(-10.0, -10.0, -10.0)));
    assert!(vec3_approx(br, Vec3::new(10.0, -10.0, -10.0)));
    assert!(vec3_approx(tr, Vec3::new(10.0, 10.0, -10.0)));
    assert!(vec3_approx(tl, Vec3::new(-10.0, 10.0, -10.0)));
}

#[test]
fn billboard_rays_are_unit_length() {
    let cam = reference_camera(ClipSpace::ZeroToOne);
    for ray in cam.rays_to_fullscreen_billboard() {
        assert!((ray.length() - 1.0).abs() < EPSILON);
        assert!(ray.z < 0.0, "rays must point into the scene");
    }
}

#[test]
fn billboard_tiles_cover_the_cross_section() {
    let mut cam = Camera::new(ClipSpace::ZeroToOne);
    cam.set_perspective(90.0, 512.0, 512.0, 0.1, 100.0);
    cam.look_at(Vec3::ZERO, -Vec3::Z, Vec3::Y);

    let tiles = cam.fullscreen_billboard_tiles(2, 2, 10.0);
    assert_eq!(tiles.len(), 4);
    // Row-major from the bottom-left.
    assert!(vec3_approx(tiles[0][0], Vec3::new(-10.0, -10.0, -10.0)));
    assert!(vec3_approx(tiles[1][1], Vec3::new(10.0, -10.0, -10.0)));
    assert!(vec3_approx(tiles[3][2], Vec3::new(10.0, 10.0, -10.0)));
    // Tile corners are shared with the neighbor.
    assert!(vec3_approx(tiles[0][1], tiles[1][0]));
}

#[test]
fn billboard_transform_faces_the_camera() {
    let mut cam = reference_camera(ClipSpace::ZeroToOne);
    cam.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);

    let transform = cam.billboard_transform(Vec3::new(1.0, 2.0, 3.0));
    assert!(vec3_approx(transform.translation.into(), Vec3::new(1.0, 2.0, 3.0)));
    // The billboard's +Z points back at the camera.
    assert!(vec3_approx(transform.matrix3.z_axis.into(), Vec3::Z));
}

// ============================================================================
// Mirrors and orientation
// ============================================================================

#[test]
fn mirror_update_is_reversible() {
    let mut cam = reference_camera(ClipSpace::ZeroToOne);
    cam.look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
    let plain_vp = cam.view_projection();
    let plain_planes = *cam.planes();

    // Mirror across the ground plane y = 0.
    cam.update(Some(Vec4::new(0.0, 1.0, 0.0, 0.0)));
    assert!(!mat4_approx(cam.view_projection(), plain_vp));
    assert_ne!(*cam.planes(), plain_planes);

    cam.update(None);
    assert!(mat4_approx(cam.view_projection(), plain_vp));
}

#[test]
fn mirrored_camera_sees_the_reflection() {
    let mut cam = Camera::new(ClipSpace::ZeroToOne);
    cam.set_perspective(60.0, 512.0, 512.0, 0.1, 100.0);
    // Looking down at the ground from above.
    cam.look_at(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO, Vec3::Y);
    cam.update(Some(Vec4::new(0.0, 1.0, 0.0, 0.0)));

    // The mirrored pass renders the real scene; the oblique clip keeps the
    // half-space in front of the mirror and drops everything behind it.
    let above = Aabb::from_center_half_extent(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE);
    let behind = Aabb::from_center_half_extent(Vec3::new(0.0, -3.0, 0.0), Vec3::ONE);
    assert!(cam.is_visible(&above));
    assert!(!cam.is_visible(&behind));
}

#[test]
fn landscape_needs_no_correction() {
    assert!(mat4_approx(orientation_correction(800.0, 480.0), Mat4::IDENTITY));
}

#[test]
fn portrait_correction_rotates_clockwise() {
    let correction = orientation_correction(480.0, 800.0);
    let rotated = correction.transform_vector3(Vec3::X);
    assert!(vec3_approx(rotated, -Vec3::Y));
}
