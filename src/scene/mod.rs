//! Scene graph: hierarchy, per-frame animation pass and camera.
//!
//! - [`SceneNode`]: transform state plus optional animation channels
//! - [`Scene`]: generational arena container and hierarchy bookkeeping
//! - animate pass: two-phase world-matrix propagation (`animate` module)
//! - [`Camera`]: view / projection, cull planes, billboard queries

pub mod animate;
pub mod camera;
pub mod node;
pub mod scene;

pub use animate::Phase;
pub use camera::{Aabb, Camera, ClipSpace, orientation_correction};
pub use node::{JiggleParams, OwnerRef, Registrable, SceneNode};
pub use scene::Scene;

use slotmap::new_key_type;

new_key_type! {
    /// Generational key of a node in the scene arena.
    pub struct NodeKey;
}
