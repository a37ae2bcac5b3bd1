//! Binary interval-tree keyframe store.
//!
//! A [`KeyframeTree`] is built once from a time-sorted keyframe list and is
//! immutable afterwards. Sampling descends the tree by comparing the query
//! time against branch dividers, so a track with `n` keyframes is sampled in
//! O(log n) regardless of playback direction.
//!
//! Trees can be persisted as a little-endian binary blob and loaded back
//! with [`read_animation`]. There is no header or version tag, so any
//! structural change is a breaking change to existing assets.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec4;

use crate::errors::{LumenError, Result};

/// Quaternion operands closer than this are blended linearly instead of
/// spherically; the slerp denominator is no longer trustworthy there.
const SLERP_PARALLEL_EPSILON: f32 = 0.0015;

/// How the span between a keyframe and its successor is interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Hold the stored value.
    None,
    /// Last keyframe of a track. Holds the stored value; with repeat enabled
    /// the sampler resets its time base here.
    Finished,
    /// Componentwise linear blend of a scalar channel.
    LinearScalar,
    /// Componentwise linear blend of a vector channel.
    LinearVec3,
    /// Shortest-path spherical blend of a quaternion channel.
    SlerpQuat,
    /// Cubic Bezier scalar channel. Tangent data is carried through the file
    /// format, but playback reduces to the endpoint blend (see `sample`).
    CubicBezierScalar,
}

impl Interpolation {
    fn to_tag(self) -> u32 {
        match self {
            Interpolation::None => 0,
            Interpolation::Finished => 1,
            Interpolation::LinearScalar => 2,
            Interpolation::LinearVec3 => 3,
            Interpolation::SlerpQuat => 4,
            Interpolation::CubicBezierScalar => 5,
        }
    }

    fn from_tag(tag: u32) -> Result<Self> {
        Ok(match tag {
            0 => Interpolation::None,
            1 => Interpolation::Finished,
            2 => Interpolation::LinearScalar,
            3 => Interpolation::LinearVec3,
            4 => Interpolation::SlerpQuat,
            5 => Interpolation::CubicBezierScalar,
            other => {
                return Err(LumenError::MalformedAnimation(format!(
                    "unknown interpolation tag {other}"
                )));
            }
        })
    }
}

/// One keyframe, including the successor data cached by [`Keyframe::prepare`].
///
/// These are exactly the eight fields the binary format stores, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub interpolation: Interpolation,
    /// Start time of this keyframe's span, in milliseconds.
    pub time: f32,
    /// Length of the span to the next keyframe (0 for the last one).
    pub time_length: f32,
    /// Reciprocal of `time_length`, precomputed (0 for the last keyframe).
    pub inv_time_length: f32,
    pub value: Vec4,
    /// Value of the next keyframe, cached by `prepare`.
    pub next_value: Vec4,
    pub out_tangent: f32,
    /// In-tangent of the next keyframe, cached by `prepare`. Before
    /// preparation this slot holds the keyframe's *own* in-tangent as
    /// authored; `prepare` shifts everything one slot to the left.
    pub next_in_tangent: f32,
}

impl Keyframe {
    #[must_use]
    pub fn new(
        time: f32,
        interpolation: Interpolation,
        value: Vec4,
        in_tangent: f32,
        out_tangent: f32,
    ) -> Self {
        Self {
            interpolation,
            time,
            time_length: 0.0,
            inv_time_length: 0.0,
            value,
            next_value: value,
            out_tangent,
            next_in_tangent: in_tangent,
        }
    }

    /// Pre-pass over a time-sorted keyframe list: caches span lengths, their
    /// reciprocals and the successor's value/in-tangent into each keyframe,
    /// and marks the final keyframe [`Interpolation::Finished`].
    pub fn prepare(keys: &mut [Keyframe]) {
        assert!(!keys.is_empty(), "keyframe list is empty");
        for i in 0..keys.len() - 1 {
            // `next_in_tangent` of keys[i + 1] still holds its authored
            // in-tangent; this loop runs front to back.
            let next = keys[i + 1];
            let key = &mut keys[i];
            key.time_length = next.time - key.time;
            key.inv_time_length = if key.time_length > 0.0 {
                1.0 / key.time_length
            } else {
                0.0
            };
            key.next_value = next.value;
            key.next_in_tangent = next.next_in_tangent;
        }
        let last = keys.last_mut().expect("non-empty");
        last.interpolation = Interpolation::Finished;
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.interpolation.to_tag())?;
        writer.write_f32::<LittleEndian>(self.time)?;
        writer.write_f32::<LittleEndian>(self.time_length)?;
        writer.write_f32::<LittleEndian>(self.inv_time_length)?;
        for lane in self.value.to_array() {
            writer.write_f32::<LittleEndian>(lane)?;
        }
        for lane in self.next_value.to_array() {
            writer.write_f32::<LittleEndian>(lane)?;
        }
        writer.write_f32::<LittleEndian>(self.out_tangent)?;
        writer.write_f32::<LittleEndian>(self.next_in_tangent)?;
        Ok(())
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let interpolation = Interpolation::from_tag(reader.read_u32::<LittleEndian>()?)?;
        let time = reader.read_f32::<LittleEndian>()?;
        let time_length = reader.read_f32::<LittleEndian>()?;
        let inv_time_length = reader.read_f32::<LittleEndian>()?;
        let mut value = [0.0; 4];
        for lane in &mut value {
            *lane = reader.read_f32::<LittleEndian>()?;
        }
        let mut next_value = [0.0; 4];
        for lane in &mut next_value {
            *lane = reader.read_f32::<LittleEndian>()?;
        }
        let out_tangent = reader.read_f32::<LittleEndian>()?;
        let next_in_tangent = reader.read_f32::<LittleEndian>()?;
        Ok(Self {
            interpolation,
            time,
            time_length,
            inv_time_length,
            value: Vec4::from_array(value),
            next_value: Vec4::from_array(next_value),
            out_tangent,
            next_in_tangent,
        })
    }
}

/// Balanced binary tree over a sorted keyframe list.
///
/// Every node is either a branch with exactly two children or a leaf holding
/// one keyframe; leaves partition the track's full time range in order.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyframeTree {
    Branch {
        /// Split time: queries at or after this descend right.
        divider: f32,
        left: Box<KeyframeTree>,
        right: Box<KeyframeTree>,
    },
    Leaf(Keyframe),
}

impl KeyframeTree {
    /// Builds a tree from a prepared, time-sorted keyframe list by recursive
    /// midpoint split.
    #[must_use]
    pub fn build(keys: &[Keyframe]) -> Self {
        assert!(!keys.is_empty(), "keyframe list is empty");
        if keys.len() == 1 {
            return KeyframeTree::Leaf(keys[0]);
        }
        let mid = keys.len() / 2;
        KeyframeTree::Branch {
            divider: keys[mid].time,
            left: Box::new(Self::build(&keys[..mid])),
            right: Box::new(Self::build(&keys[mid..])),
        }
    }

    /// Samples the track at `current_time`.
    ///
    /// `time_base` is the caller-owned playback origin; the effective query
    /// time is `current_time - time_base`. When the query lands on the final
    /// keyframe and `repeat` is set, `time_base` is reset to `current_time`
    /// and the returned interpolator is the `-1.0` sentinel ("no further
    /// movement this call"); the stored value is returned unchanged.
    ///
    /// Returns `(value, raw interpolator)`.
    pub fn sample(&self, current_time: f32, time_base: &mut f32, repeat: bool) -> (Vec4, f32) {
        let t = current_time - *time_base;
        let mut node = self;
        loop {
            match node {
                KeyframeTree::Branch { divider, left, right } => {
                    node = if t >= *divider { right } else { left };
                }
                KeyframeTree::Leaf(key) => {
                    return Self::sample_leaf(key, t, current_time, time_base, repeat);
                }
            }
        }
    }

    fn sample_leaf(
        key: &Keyframe,
        t: f32,
        current_time: f32,
        time_base: &mut f32,
        repeat: bool,
    ) -> (Vec4, f32) {
        // Queries before the track start clamp to the first keyframe.
        let t = t.max(key.time);
        let mut s = (t - key.time) * key.inv_time_length;

        match key.interpolation {
            Interpolation::Finished => {
                if repeat {
                    *time_base = current_time;
                    s = -1.0;
                }
                (key.value, s)
            }
            Interpolation::None => (key.value, s),
            Interpolation::LinearScalar
            | Interpolation::LinearVec3
            // Tangents survive in the format; playback uses the endpoint blend.
            | Interpolation::CubicBezierScalar => (key.value.lerp(key.next_value, s), s),
            Interpolation::SlerpQuat => (slerp_vec4(key.value, key.next_value, s), s),
        }
    }

    /// In-order leaf traversal. Leaf start times are strictly increasing and
    /// match the build input exactly.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Keyframe> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Keyframe>) {
        match self {
            KeyframeTree::Branch { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
            KeyframeTree::Leaf(key) => out.push(key),
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Recursively serializes the tree, little-endian, no header.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            KeyframeTree::Branch { divider, left, right } => {
                writer.write_f32::<LittleEndian>(*divider)?;
                writer.write_u8(0)?;
                left.write_to(writer)?;
                right.write_to(writer)
            }
            KeyframeTree::Leaf(key) => {
                // The divider slot of a leaf mirrors its start time.
                writer.write_f32::<LittleEndian>(key.time)?;
                writer.write_u8(1)?;
                key.write_to(writer)
            }
        }
    }

    /// Recursively deserializes a tree written by [`KeyframeTree::write_to`].
    /// A short read or unknown tag is a hard error; a partially decoded tree
    /// is never returned.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let divider = reader.read_f32::<LittleEndian>()?;
        let is_leaf = reader.read_u8()?;
        match is_leaf {
            0 => Ok(KeyframeTree::Branch {
                divider,
                left: Box::new(Self::read_from(reader)?),
                right: Box::new(Self::read_from(reader)?),
            }),
            1 => Ok(KeyframeTree::Leaf(Keyframe::read_from(reader)?)),
            other => Err(LumenError::MalformedAnimation(format!(
                "invalid node flag {other}"
            ))),
        }
    }
}

/// Shortest-path spherical interpolation of two quaternions stored as `Vec4`.
fn slerp_vec4(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    let mut a = a;
    let mut dot = a.dot(b);
    if dot < 0.0 {
        a = -a;
        dot = -dot;
    }
    if 1.0 - dot <= SLERP_PARALLEL_EPSILON {
        return a.lerp(b, t);
    }
    let theta = dot.clamp(-1.0, 1.0).acos();
    let inv_sin = 1.0 / theta.sin();
    a * (((1.0 - t) * theta).sin() * inv_sin) + b * ((t * theta).sin() * inv_sin)
}

// ============================================================================
// Asset loading
// ============================================================================

/// Resolves a track asset path: animation blobs live under `animations/`
/// unless the caller already says so.
#[must_use]
pub fn resolve_animation_path(path: &Path) -> PathBuf {
    if path.starts_with("animations") {
        path.to_path_buf()
    } else {
        Path::new("animations").join(path)
    }
}

/// Loads a serialized keyframe tree. A missing file maps to
/// [`LumenError::AnimationNotFound`] so callers can degrade to the static
/// transform with a warning.
pub fn read_animation(path: impl AsRef<Path>) -> Result<KeyframeTree> {
    let path = resolve_animation_path(path.as_ref());
    let file = File::open(&path).map_err(|_| LumenError::AnimationNotFound(path.clone()))?;
    let mut reader = BufReader::new(file);
    KeyframeTree::read_from(&mut reader)
}

/// Writes a keyframe tree to its asset location (tooling / cache side).
pub fn write_animation(path: impl AsRef<Path>, tree: &KeyframeTree) -> Result<()> {
    let path = resolve_animation_path(path.as_ref());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(&path)?);
    tree.write_to(&mut writer)
}
