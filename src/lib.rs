//! Lumen core: the scene-graph animation, camera and mesh-LOD heart of a
//! real-time 3D benchmark engine.
//!
//! Rendering, shader management, windowing and result upload are external
//! collaborators: they feed time and asset buffers in, and consume world
//! matrices, cull planes and reduced index buffers out.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_lines)]

pub mod animation;
pub mod errors;
pub mod lod;
pub mod scene;

pub use animation::{
    AnimationTrack, FlickerRng, Interpolation, Keyframe, KeyframeSequence, KeyframeTree,
    TrackProperty, TrackRange, read_animation, write_animation,
};
pub use errors::{LumenError, Result};
pub use lod::{IndexedHeap, LodConfig, Simplifier, generate_lod};
pub use scene::{
    Aabb, Camera, ClipSpace, JiggleParams, NodeKey, OwnerRef, Phase, Registrable, Scene,
    SceneNode, orientation_correction,
};
