//! Per-frame animation pass.
//!
//! Walks the hierarchy top-down once per phase, sampling every node's bound
//! channels and composing world matrices. The pass runs twice per rendered
//! frame: the `Previous` phase fills `prev_world_matrix` (motion blur), the
//! `Current` phase fills `world_matrix` and is the one whose results children
//! see. Context is passed down by value and restored implicitly on return,
//! so a child never mutates its ancestors' propagated state.

use glam::{Affine3A, Quat, Vec3};
use slotmap::SlotMap;

use crate::animation::{FlickerRng, TrackRange};
use crate::scene::node::SceneNode;
use crate::scene::scene::Scene;
use crate::scene::NodeKey;

/// Which of the two per-frame matrix slots this pass fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fill `prev_world_matrix`.
    Previous,
    /// Fill `world_matrix`; this phase's results propagate to children.
    Current,
}

/// Context propagated parent-to-child during the pass.
#[derive(Debug, Clone, Copy)]
struct Propagated {
    parent_world: Affine3A,
    visible: bool,
    /// Parent's sampled control value; drives child jiggle.
    control: f32,
}

impl Propagated {
    const ROOT: Self = Self {
        parent_world: Affine3A::IDENTITY,
        visible: true,
        control: 0.0,
    };
}

impl Scene {
    /// Runs one animation phase over the whole scene at `time_ms`.
    pub fn animate(&mut self, time_ms: f32, phase: Phase, flicker: &mut FlickerRng) {
        let roots = self.roots.clone();
        for root in roots {
            animate_recursive(&mut self.nodes, root, time_ms, phase, Propagated::ROOT, flicker);
        }
    }

    /// Convenience for a full frame: previous phase at last frame's time,
    /// current phase at this frame's time.
    pub fn advance(&mut self, prev_time_ms: f32, time_ms: f32, flicker: &mut FlickerRng) {
        self.animate(prev_time_ms, Phase::Previous, flicker);
        self.animate(time_ms, Phase::Current, flicker);
    }
}

fn animate_recursive(
    nodes: &mut SlotMap<NodeKey, SceneNode>,
    key: NodeKey,
    time_ms: f32,
    phase: Phase,
    ctx: Propagated,
    flicker: &mut FlickerRng,
) {
    let Some(node) = nodes.get_mut(key) else {
        return;
    };
    let time_s = time_ms / 1000.0;

    // 1. Scale: sampled unless the track has not started yet.
    let scale = match node.scale_track.as_mut() {
        Some(track) if track.range(time_ms) != TrackRange::Before => track.scale_at(time_ms),
        _ => node.scale,
    };

    // 2. Visibility: own track wins; otherwise inherit, with the flicker
    //    dropout for flagged light nodes.
    let mut visible = if let Some(tree) = &node.visibility_tree {
        let (value, _) = tree.sample(time_ms, &mut node.visibility_base, true);
        value.x > 0.9
    } else if node.flickering {
        ctx.visible && flicker.flicker_visible()
    } else {
        ctx.visible
    };

    // 3. Alpha and the secondary-animation control scalar.
    let alpha = if let Some(tree) = &node.alpha_tree {
        let (value, _) = tree.sample(time_ms, &mut node.alpha_base, true);
        value.x
    } else {
        node.alpha
    };
    let control = if let Some(tree) = &node.control_tree {
        let (value, _) = tree.sample(time_ms, &mut node.control_base, true);
        value.x * (time_s - node.control_begin)
    } else {
        0.0
    };

    // 4. Translation / rotation: sampled and static channels mix freely; a
    //    node with only a translation track keeps its static rotation.
    let translation = match node.translation_track.as_mut() {
        Some(track) => track.translation_at(time_ms),
        None => node.translation,
    };
    let rotation = match node.orientation_track.as_mut() {
        Some(track) => track.rotation_at(time_ms),
        None => node.rotation,
    };
    let mut local = Affine3A::from_scale_rotation_translation(scale, rotation, translation);

    // 5. Jiggle, driven by the parent's control value.
    if node.jiggle_enabled && ctx.control > 0.0 {
        let radius = (node.jiggle.radius_factor * ctx.control).min(node.jiggle.radius_limit);
        let angle = time_s * node.jiggle.rotation_factor;
        let wobble = Quat::from_axis_angle(node.jiggle.rotation_axis, angle.sin() * radius);
        let offset = Vec3::new(angle.cos(), (angle * 1.3).sin(), angle.sin()) * radius;
        let sway = Affine3A::from_rotation_translation(wobble, offset);
        // Applied in node-local space, about the node's own pivot.
        local = local * sway;
    }

    // 6. Propagated invisibility always wins.
    if !ctx.visible {
        visible = false;
    }

    // 7. Commit this node's frame state.
    node.visible = visible;
    node.alpha = alpha;
    node.control_value = control;
    node.local_matrix = local;
    let world = ctx.parent_world * local;
    match phase {
        Phase::Previous => node.prev_world_matrix = world,
        Phase::Current => node.world_matrix = world,
    }

    // 8. Recurse with the updated context.
    let child_ctx = Propagated {
        parent_world: world,
        visible,
        control,
    };
    let children = node.children.clone();
    for child in children {
        animate_recursive(nodes, child, time_ms, phase, child_ctx, flicker);
    }
}
