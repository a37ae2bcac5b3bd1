//! Camera, frustum and billboard math.
//!
//! The camera owns its view / projection state and re-derives the six cull
//! planes inside [`Camera::update`]. Every state-changing call funnels
//! through it, so the planes are never stale relative to the matrices.
//!
//! Platform orientation handling deliberately stays out of the camera: when a
//! portrait framebuffer is presented as rotated landscape, the call site
//! applies [`orientation_correction`] to the final matrix instead of the
//! camera branching internally.

use glam::{Affine3A, Mat4, Vec3, Vec4};

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }
}

/// Clip-space depth convention of the target API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipSpace {
    /// OpenGL style, NDC z in [-1, 1].
    NegOneToOne,
    /// Metal / D3D / Vulkan style, NDC z in [0, 1].
    ZeroToOne,
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub clip_space: ClipSpace,

    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    /// View-projection with the view translation removed; sky rendering uses
    /// it to dodge precision loss far from the origin.
    view_projection_origo: Mat4,
    /// Left, right, bottom, top, near, far. Normalized.
    planes: [Vec4; 6],
}

impl Camera {
    #[must_use]
    pub fn new(clip_space: ClipSpace) -> Self {
        let mut cam = Self {
            eye: Vec3::ZERO,
            center: -Vec3::Z,
            up: Vec3::Y,
            fov: 60_f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            clip_space,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            view_projection_origo: Mat4::IDENTITY,
            planes: [Vec4::ZERO; 6],
        };
        cam.view = Mat4::look_at_rh(cam.eye, cam.center, cam.up);
        cam.rebuild_projection();
        cam.update(None);
        cam
    }

    /// Sets a perspective projection from a field of view (degrees) and a
    /// framebuffer size.
    pub fn set_perspective(&mut self, fov_deg: f32, width: f32, height: f32, near: f32, far: f32) {
        self.fov = fov_deg.to_radians();
        self.aspect = width / height;
        self.near = near;
        self.far = far;
        self.rebuild_projection();
        self.update(None);
    }

    pub fn look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.eye = eye;
        self.center = center;
        self.up = up;
        self.view = Mat4::look_at_rh(eye, center, up);
        self.update(None);
    }

    /// Adopts an externally supplied view matrix, recovering eye / up /
    /// forward from its inverse.
    pub fn set_view_matrix(&mut self, view: Mat4) {
        let inv = view.inverse();
        self.eye = inv.w_axis.truncate();
        self.up = inv.y_axis.truncate().normalize();
        let forward = -inv.z_axis.truncate().normalize();
        self.center = self.eye + forward;
        self.view = view;
        self.update(None);
    }

    fn rebuild_projection(&mut self) {
        self.projection = match self.clip_space {
            ClipSpace::ZeroToOne => Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far),
            ClipSpace::NegOneToOne => {
                Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
            }
        };
    }

    /// Recomputes the composed matrices and cull planes.
    ///
    /// With `mirror` set to a normalized world-space plane, the view is
    /// reflected across it for planar-mirror rendering: eye / center / up are
    /// reflected, one view-space axis is flipped to restore winding, and the
    /// near plane is replaced by the mirror plane via an oblique clip
    /// adjustment.
    pub fn update(&mut self, mirror: Option<Vec4>) {
        let (view, projection) = match mirror {
            None => (self.view, self.projection),
            Some(plane) => {
                let eye = reflect_point(self.eye, plane);
                let center = reflect_point(self.center, plane);
                let up = reflect_vector(self.up, plane);
                let view = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))
                    * Mat4::look_at_rh(eye, center, up);
                // Mirror plane in view space, oriented away from the camera.
                let view_plane = view.inverse().transpose() * plane;
                let projection = oblique_clip(self.projection, view_plane, self.clip_space);
                (view, projection)
            }
        };

        self.view_projection = projection * view;
        let mut origo_view = view;
        origo_view.w_axis = Vec4::W;
        self.view_projection_origo = projection * origo_view;
        self.planes = extract_planes(self.view_projection, self.clip_space);
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    #[inline]
    #[must_use]
    pub fn view_projection_origo(&self) -> Mat4 {
        self.view_projection_origo
    }

    #[inline]
    #[must_use]
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Positive-vertex frustum test: the box is culled only when some plane
    /// fully excludes it.
    #[must_use]
    pub fn is_visible(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let positive = Vec3::new(
                if plane.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.truncate().dot(positive) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }

    // ========================================================================
    // Billboard / frustum-corner queries
    // ========================================================================

    fn view_basis(&self) -> (Vec3, Vec3, Vec3) {
        let inv = self.view.inverse();
        let right = inv.x_axis.truncate().normalize();
        let up = inv.y_axis.truncate().normalize();
        let forward = -inv.z_axis.truncate().normalize();
        (right, up, forward)
    }

    /// World-space corners of the view frustum's cross-section at `depth`,
    /// ordered bottom-left, bottom-right, top-right, top-left.
    #[must_use]
    pub fn fullscreen_billboard(&self, depth: f32) -> [Vec3; 4] {
        let (right, up, forward) = self.view_basis();
        let half_h = (self.fov * 0.5).tan() * depth;
        let half_w = half_h * self.aspect;
        let center = self.eye + forward * depth;
        [
            center - right * half_w - up * half_h,
            center + right * half_w - up * half_h,
            center + right * half_w + up * half_h,
            center - right * half_w + up * half_h,
        ]
    }

    /// Unit rays from the eye through the four frustum corners, same order
    /// as [`Camera::fullscreen_billboard`].
    #[must_use]
    pub fn rays_to_fullscreen_billboard(&self) -> [Vec3; 4] {
        self.fullscreen_billboard(1.0)
            .map(|corner| (corner - self.eye).normalize())
    }

    /// Camera-facing basis at `position` (billboard orientation).
    #[must_use]
    pub fn billboard_transform(&self, position: Vec3) -> Affine3A {
        let (right, up, forward) = self.view_basis();
        Affine3A::from_cols(right.into(), up.into(), (-forward).into(), position.into())
    }

    /// Tile-subdivided variant of [`Camera::fullscreen_billboard`]: `cols` x
    /// `rows` quads covering the cross-section at `depth`, row-major from the
    /// bottom-left.
    #[must_use]
    pub fn fullscreen_billboard_tiles(&self, cols: u32, rows: u32, depth: f32) -> Vec<[Vec3; 4]> {
        assert!(cols > 0 && rows > 0);
        let [bl, br, _, tl] = self.fullscreen_billboard(depth);
        let step_x = (br - bl) / cols as f32;
        let step_y = (tl - bl) / rows as f32;
        let mut tiles = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let origin = bl + step_x * col as f32 + step_y * row as f32;
                tiles.push([
                    origin,
                    origin + step_x,
                    origin + step_x + step_y,
                    origin + step_y,
                ]);
            }
        }
        tiles
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(ClipSpace::ZeroToOne)
    }
}

/// Rotation applied by the call site when a portrait framebuffer is rendered
/// as rotated landscape; identity whenever the framebuffer is already
/// landscape.
#[must_use]
pub fn orientation_correction(width: f32, height: f32) -> Mat4 {
    if width < height {
        Mat4::from_rotation_z(-std::f32::consts::FRAC_PI_2)
    } else {
        Mat4::IDENTITY
    }
}

/// Gribb-Hartmann plane extraction from a composed view-projection matrix.
/// The near plane row depends on the clip-space depth convention.
fn extract_planes(vp: Mat4, clip_space: ClipSpace) -> [Vec4; 6] {
    let r0 = vp.row(0);
    let r1 = vp.row(1);
    let r2 = vp.row(2);
    let r3 = vp.row(3);

    let near = match clip_space {
        ClipSpace::ZeroToOne => r2,
        ClipSpace::NegOneToOne => r3 + r2,
    };
    let mut planes = [
        r3 + r0, // left
        r3 - r0, // right
        r3 + r1, // bottom
        r3 - r1, // top
        near,
        r3 - r2, // far
    ];
    for plane in &mut planes {
        let len = plane.truncate().length();
        if len > 0.0 {
            *plane /= len;
        }
    }
    planes
}

/// Reflects a point across a normalized plane `n.x + d = 0`.
fn reflect_point(point: Vec3, plane: Vec4) -> Vec3 {
    let normal = plane.truncate();
    point - normal * (2.0 * (normal.dot(point) + plane.w))
}

/// Reflects a direction across a normalized plane.
fn reflect_vector(vector: Vec3, plane: Vec4) -> Vec3 {
    let normal = plane.truncate();
    vector - normal * (2.0 * normal.dot(vector))
}

/// Replaces the projection's near plane with an arbitrary view-space clip
/// plane (Lengyel's oblique clipping), keeping the far plane as tight as the
/// construction allows.
fn oblique_clip(projection: Mat4, view_plane: Vec4, clip_space: ClipSpace) -> Mat4 {
    let r0 = projection.row(0);
    let r1 = projection.row(1);
    let r3 = projection.row(3);

    let q = projection.inverse()
        * Vec4::new(view_plane.x.signum(), view_plane.y.signum(), 1.0, 1.0);
    let r2 = match clip_space {
        ClipSpace::NegOneToOne => {
            let c = view_plane * (2.0 / view_plane.dot(q));
            c - r3
        }
        ClipSpace::ZeroToOne => view_plane * (1.0 / view_plane.dot(q)),
    };

    Mat4::from_cols(r0, r1, r2, r3).transpose()
}
