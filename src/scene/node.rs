//! Scene node data.
//!
//! A node owns its animation channels and local transform state; hierarchy
//! bookkeeping (parent/child links) lives in the [`Scene`](crate::scene::Scene)
//! arena. World matrices are filled in by the animation pass each frame, a
//! current and a previous one so the renderer can build motion-blur vectors.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::{Rc, Weak};

use glam::{Affine3A, Mat4, Quat, Vec3};
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_64;

use crate::animation::keyframe_tree::read_animation;
use crate::animation::{AnimationTrack, FlickerRng, KeyframeSequence, KeyframeTree, TrackProperty};
use crate::scene::NodeKey;

/// Capability interface for objects that keep a registry of the scene nodes
/// belonging to them (actors, rooms). The scene calls `register_node` when an
/// owned node is inserted and `deregister_node` when it is destroyed.
pub trait Registrable {
    fn register_node(&mut self, node: NodeKey);
    fn deregister_node(&mut self, node: NodeKey);
}

/// Weak handle from a node back to its owner's registry.
///
/// The node never keeps its owner alive; once the owner is dropped both
/// registry calls become no-ops.
#[derive(Clone)]
pub struct OwnerRef(Weak<RefCell<dyn Registrable>>);

impl OwnerRef {
    #[must_use]
    pub fn new(owner: &Rc<RefCell<dyn Registrable>>) -> Self {
        Self(Rc::downgrade(owner))
    }

    pub(crate) fn register(&self, node: NodeKey) {
        if let Some(owner) = self.0.upgrade() {
            owner.borrow_mut().register_node(node);
        }
    }

    pub(crate) fn deregister(&self, node: NodeKey) {
        if let Some(owner) = self.0.upgrade() {
            owner.borrow_mut().deregister_node(node);
        }
    }
}

impl fmt::Debug for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnerRef")
    }
}

/// Procedural secondary-animation ("jiggle") parameters.
///
/// Derived from a hash of the node's name so the motion is reproducible per
/// asset without storing anything.
#[derive(Debug, Clone, Copy)]
pub struct JiggleParams {
    /// Scales the parent's control value into a sway radius.
    pub radius_factor: f32,
    /// Hard cap on the sway radius.
    pub radius_limit: f32,
    /// Angular speed of the sway, radians per second.
    pub rotation_factor: f32,
    /// Unit axis of the sway rotation.
    pub rotation_axis: Vec3,
}

impl JiggleParams {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut state = xxh3_64(name.as_bytes());
        let mut draw = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 40) & 0x00FF_FFFF) as f32 / 16_777_216.0
        };
        let radius_factor = 0.02 + draw() * 0.08;
        let rotation_factor = 0.5 + draw() * 1.5;
        let axis = Vec3::new(
            draw() * 2.0 - 1.0,
            draw() * 2.0 - 1.0,
            draw() * 2.0 - 1.0,
        );
        let rotation_axis = if axis.length_squared() < 1e-6 {
            Vec3::Z
        } else {
            axis.normalize()
        };
        Self {
            radius_factor,
            radius_limit: 0.35,
            rotation_factor,
            rotation_axis,
        }
    }
}

/// One node of the scene hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub uuid: Uuid,
    /// Bookkeeping owner (actor / room) this node registers with.
    pub owner: Option<OwnerRef>,

    // === Hierarchy (kept in sync by Scene) ===
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,

    // === Static local TRS, the fallback for every unbound channel ===
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    // === Matrices written by the animation pass ===
    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,
    pub(crate) prev_world_matrix: Affine3A,

    // === Frame state ===
    pub visible: bool,
    pub alpha: f32,
    /// Flickering light: visibility randomly drops 25% of evaluations.
    pub flickering: bool,

    // === Animation channels, all optional ===
    pub translation_track: Option<AnimationTrack>,
    pub orientation_track: Option<AnimationTrack>,
    pub scale_track: Option<AnimationTrack>,
    pub visibility_tree: Option<KeyframeTree>,
    pub alpha_tree: Option<KeyframeTree>,
    pub control_tree: Option<KeyframeTree>,

    // Per-channel playback origins, reset by the Finished/repeat sentinel.
    pub(crate) visibility_base: f32,
    pub(crate) alpha_base: f32,
    pub(crate) control_base: f32,

    /// Time (seconds) at which the control track first goes positive,
    /// precomputed when the tree is set.
    pub(crate) control_begin: f32,
    /// Control value sampled this frame; children read it as their parents'
    /// jiggle drive.
    pub(crate) control_value: f32,

    // === Secondary animation ===
    pub jiggle_enabled: bool,
    pub jiggle: JiggleParams,
}

impl SceneNode {
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut node = Self {
            name: name.to_string(),
            uuid: Uuid::new_v4(),
            owner: None,
            parent: None,
            children: Vec::new(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,
            prev_world_matrix: Affine3A::IDENTITY,
            visible: true,
            alpha: 1.0,
            flickering: false,
            translation_track: None,
            orientation_track: None,
            scale_track: None,
            visibility_tree: None,
            alpha_tree: None,
            control_tree: None,
            visibility_base: 0.0,
            alpha_base: 0.0,
            control_base: 0.0,
            control_begin: 0.0,
            control_value: 0.0,
            jiggle_enabled: false,
            jiggle: JiggleParams::from_name(name),
        };
        node.refresh_local_matrix();
        node
    }

    /// Points this node at its owning actor / room. The actual registry
    /// calls happen when the node enters or leaves a scene.
    pub fn set_owner(&mut self, owner: Rc<RefCell<dyn Registrable>>) {
        self.owner = Some(OwnerRef::new(&owner));
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Rebuilds the local matrix from the static TRS fields. The animation
    /// pass overwrites this every frame; the static form matters for
    /// bind-pose queries before the first pass.
    pub fn refresh_local_matrix(&mut self) {
        self.local_matrix =
            Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation);
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn prev_world_matrix(&self) -> &Affine3A {
        &self.prev_world_matrix
    }

    /// World matrix in the 4x4 form the renderer uploads.
    #[inline]
    #[must_use]
    pub fn world_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.world_matrix)
    }

    /// Control value sampled by the most recent animation pass.
    #[inline]
    #[must_use]
    pub fn control_value(&self) -> f32 {
        self.control_value
    }

    // ========================================================================
    // Channel wiring
    // ========================================================================

    pub fn set_visibility_tree(&mut self, tree: KeyframeTree) {
        self.visibility_tree = Some(tree);
        self.visibility_base = 0.0;
    }

    pub fn set_alpha_tree(&mut self, tree: KeyframeTree) {
        self.alpha_tree = Some(tree);
        self.alpha_base = 0.0;
    }

    /// Installs the secondary-animation control track and precomputes the
    /// time of its first positive sample.
    pub fn set_control_tree(&mut self, tree: KeyframeTree) {
        self.control_begin = tree
            .leaves()
            .iter()
            .find(|key| key.value.x > 0.0)
            .map_or(0.0, |key| key.time / 1000.0);
        self.control_tree = Some(tree);
        self.control_base = 0.0;
    }

    /// Loads a visibility track from disk. Missing assets are non-fatal: the
    /// node keeps inheriting visibility and `false` is returned.
    pub fn load_visibility_tree(&mut self, path: impl AsRef<Path>) -> bool {
        match read_animation(&path) {
            Ok(tree) => {
                self.set_visibility_tree(tree);
                true
            }
            Err(err) => {
                log::warn!("node '{}': visibility track unavailable: {err}", self.name);
                false
            }
        }
    }

    /// Loads an alpha track from disk; missing assets are non-fatal.
    pub fn load_alpha_tree(&mut self, path: impl AsRef<Path>) -> bool {
        match read_animation(&path) {
            Ok(tree) => {
                self.set_alpha_tree(tree);
                true
            }
            Err(err) => {
                log::warn!("node '{}': alpha track unavailable: {err}", self.name);
                false
            }
        }
    }

    /// Loads a secondary-control track from disk; missing assets are
    /// non-fatal.
    pub fn load_control_tree(&mut self, path: impl AsRef<Path>) -> bool {
        match read_animation(&path) {
            Ok(tree) => {
                self.set_control_tree(tree);
                true
            }
            Err(err) => {
                log::warn!("node '{}': control track unavailable: {err}", self.name);
                false
            }
        }
    }

    /// Synthesizes a heat-shimmer style scale track: small random
    /// perturbations around the identity scale, one keyframe per `step_ms`.
    pub fn create_flickering_animation(
        &mut self,
        duration_ms: i32,
        step_ms: i32,
        rng: &mut FlickerRng,
    ) {
        assert!(step_ms > 0 && duration_ms >= step_ms);
        let mut times = Vec::new();
        let mut components = Vec::new();
        let mut t = 0;
        while t <= duration_ms {
            times.push(t);
            for _ in 0..3 {
                components.push(1.0 + (rng.next_f32() - 0.5) * 0.1);
            }
            t += step_ms;
        }
        let sequence = KeyframeSequence::new(times, components, 3);
        self.scale_track = Some(AnimationTrack::new(TrackProperty::Scale, sequence));
    }
}
