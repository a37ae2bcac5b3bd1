//! Keyframe animation storage and sampling.
//!
//! Two keyframe representations live here:
//! - [`KeyframeTree`]: balanced binary interval tree, O(log n) sampling,
//!   binary persistence. Drives visibility / alpha / secondary-control
//!   channels.
//! - [`KeyframeSequence`]: flat array with a cursor-biased linear search.
//!   Drives the TRS channels through [`AnimationTrack`].

pub mod flicker;
pub mod keyframe_tree;
pub mod sequence;
pub mod track;

pub use flicker::FlickerRng;
pub use keyframe_tree::{
    Interpolation, Keyframe, KeyframeTree, read_animation, resolve_animation_path,
    write_animation,
};
pub use sequence::{KeyframeSequence, TrackRange};
pub use track::{AnimationTrack, TrackProperty};
