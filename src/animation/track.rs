//! Property-bound animation track.
//!
//! An [`AnimationTrack`] binds one [`KeyframeSequence`] to a named scene
//! property and converts sampled raw floats into typed results. The typed
//! accessors no-op (identity / default) when the track's property does not
//! match the requested type, so a node can probe all of its channels without
//! caring which ones are actually bound.

use glam::{Quat, Vec3};

use crate::animation::sequence::{KeyframeSequence, TrackRange};

/// The scene property a track drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackProperty {
    Translation,
    Orientation,
    Scale,
    Visibility,
    Alpha,
}

/// A keyframe sequence plus its target property and playback parameters.
///
/// Owned exclusively by one scene node.
#[derive(Debug, Clone)]
pub struct AnimationTrack {
    pub property: TrackProperty,
    sequence: KeyframeSequence,
    /// Playback speed multiplier.
    pub speed: f32,
    /// Active interval start in local milliseconds; defaults to the first
    /// keyframe and can be tightened by the caller.
    pub start: f32,
    /// Active interval end in local milliseconds; defaults to the last
    /// keyframe.
    pub end: f32,
    /// Reference time offset subtracted before sampling.
    pub offset: f32,
}

impl AnimationTrack {
    #[must_use]
    pub fn new(property: TrackProperty, sequence: KeyframeSequence) -> Self {
        let start = sequence.time(0);
        let end = sequence.time(sequence.len() - 1);
        Self {
            property,
            sequence,
            speed: 1.0,
            start,
            end,
            offset: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn sequence(&self) -> &KeyframeSequence {
        &self.sequence
    }

    #[inline]
    fn local_time(&self, time: f32) -> f32 {
        (time - self.offset) * self.speed
    }

    /// Where `time` falls relative to the track's active `[start, end]`
    /// interval.
    #[must_use]
    pub fn range(&self, time: f32) -> TrackRange {
        let t = self.local_time(time);
        if t < self.start {
            TrackRange::Before
        } else if t > self.end {
            TrackRange::After
        } else {
            TrackRange::Inside
        }
    }

    /// Sampled rotation, or identity when this is not an orientation track.
    pub fn rotation_at(&mut self, time: f32) -> Quat {
        if self.property != TrackProperty::Orientation || self.sequence.stride() != 4 {
            return Quat::IDENTITY;
        }
        let (a, b, t) = self.sequence.keyframe_pair(self.local_time(time));
        let qa = quat_at(&self.sequence, a);
        let qb = quat_at(&self.sequence, b);
        qa.slerp(qb, t)
    }

    /// Sampled translation, or zero when this is not a translation track.
    pub fn translation_at(&mut self, time: f32) -> Vec3 {
        if self.property != TrackProperty::Translation || self.sequence.stride() != 3 {
            return Vec3::ZERO;
        }
        self.vec3_at(time)
    }

    /// Sampled scale, or one when this is not a scale track.
    pub fn scale_at(&mut self, time: f32) -> Vec3 {
        if self.property != TrackProperty::Scale || self.sequence.stride() != 3 {
            return Vec3::ONE;
        }
        self.vec3_at(time)
    }

    /// Sampled visibility flag, or `true` when this is not a visibility track.
    pub fn visibility_at(&mut self, time: f32) -> bool {
        if self.property != TrackProperty::Visibility {
            return true;
        }
        self.scalar_at(time) > 0.5
    }

    /// Sampled alpha, or fully opaque when this is not an alpha track.
    pub fn alpha_at(&mut self, time: f32) -> f32 {
        if self.property != TrackProperty::Alpha {
            return 1.0;
        }
        self.scalar_at(time)
    }

    fn vec3_at(&mut self, time: f32) -> Vec3 {
        let (a, b, t) = self.sequence.keyframe_pair(self.local_time(time));
        let va = vec3_at(&self.sequence, a);
        let vb = vec3_at(&self.sequence, b);
        va.lerp(vb, t)
    }

    fn scalar_at(&mut self, time: f32) -> f32 {
        let (a, b, t) = self.sequence.keyframe_pair(self.local_time(time));
        let sa = self.sequence.component(a, 0);
        let sb = self.sequence.component(b, 0);
        sa + (sb - sa) * t
    }
}

fn vec3_at(sequence: &KeyframeSequence, key: usize) -> Vec3 {
    Vec3::new(
        sequence.component(key, 0),
        sequence.component(key, 1),
        sequence.component(key, 2),
    )
}

fn quat_at(sequence: &KeyframeSequence, key: usize) -> Quat {
    Quat::from_xyzw(
        sequence.component(key, 0),
        sequence.component(key, 1),
        sequence.component(key, 2),
        sequence.component(key, 3),
    )
    .normalize()
}
