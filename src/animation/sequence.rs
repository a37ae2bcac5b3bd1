//! Flat array keyframe store.
//!
//! The simpler sibling of the keyframe tree: an ordered `(time, components)`
//! array sampled with a cursor-biased linear search. Sequential playback is
//! O(1) amortized; seeking backwards resets the cursor and degrades to O(n).

/// Where a query time falls relative to the sequence's keyframe range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRange {
    /// Before the first keyframe.
    Before,
    /// Inside the animated interval.
    Inside,
    /// After the last keyframe.
    After,
}

/// Ordered keyframe array with a fixed component count per key.
///
/// `stride` matches the arity of the animated property: 1 for scalars and
/// visibility, 3 for vectors, 4 for quaternions.
#[derive(Debug, Clone)]
pub struct KeyframeSequence {
    times: Vec<i32>,
    components: Vec<f32>,
    stride: usize,
    /// Last accessed keyframe index, biases the next search.
    cursor: usize,
}

impl KeyframeSequence {
    /// Times must be strictly increasing; `components` holds `stride` lanes
    /// per keyframe.
    #[must_use]
    pub fn new(times: Vec<i32>, components: Vec<f32>, stride: usize) -> Self {
        assert!(!times.is_empty(), "sequence has no keyframes");
        assert!(stride > 0, "component stride must be positive");
        assert_eq!(
            components.len(),
            times.len() * stride,
            "component count does not match keyframe count"
        );
        debug_assert!(
            times.windows(2).all(|pair| pair[0] < pair[1]),
            "keyframe times must be strictly increasing"
        );
        Self {
            times,
            components,
            stride,
            cursor: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    #[must_use]
    pub fn time(&self, key: usize) -> f32 {
        self.times[key] as f32
    }

    /// One component lane of one keyframe.
    #[inline]
    #[must_use]
    pub fn component(&self, key: usize, lane: usize) -> f32 {
        debug_assert!(lane < self.stride);
        self.components[key * self.stride + lane]
    }

    #[must_use]
    pub fn range(&self, time: f32) -> TrackRange {
        if time < self.times[0] as f32 {
            TrackRange::Before
        } else if time > *self.times.last().expect("non-empty") as f32 {
            TrackRange::After
        } else {
            TrackRange::Inside
        }
    }

    /// Finds the keyframe pair bracketing `time` and the blend factor between
    /// them. Outside the animated interval the boundary keyframe is returned
    /// twice, with `t` pinned to 0 (before) or 1 (after).
    ///
    /// The search starts from the cached cursor; it resets to the front first
    /// when time moved backwards.
    pub fn keyframe_pair(&mut self, time: f32) -> (usize, usize, f32) {
        match self.range(time) {
            TrackRange::Before => (0, 0, 0.0),
            TrackRange::After => {
                let last = self.times.len() - 1;
                (last, last, 1.0)
            }
            TrackRange::Inside => {
                if self.times.len() == 1 {
                    return (0, 0, 0.0);
                }
                if time <= self.times[self.cursor] as f32 {
                    self.cursor = 0;
                }
                let mut i = self.cursor;
                while i + 1 < self.times.len() && (self.times[i + 1] as f32) < time {
                    i += 1;
                }
                self.cursor = i;
                let t0 = self.times[i] as f32;
                let t1 = self.times[i + 1] as f32;
                (i, i + 1, (time - t0) / (t1 - t0))
            }
        }
    }
}
