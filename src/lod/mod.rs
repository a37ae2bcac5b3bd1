//! Mesh level-of-detail generation.
//!
//! Offline / first-load quadric-error decimation producing a reduced index
//! buffer, cached on disk as a `.lod` file so the work runs once per mesh.
//! The renderer's distance-based LOD selection consumes the output; it never
//! feeds back into this module.

pub mod cache;
pub mod heap;
pub mod simplifier;

pub use cache::{LodConfig, generate_lod, lod_cache_path, read_lod_cache, write_lod_cache};
pub use heap::IndexedHeap;
pub use simplifier::Simplifier;
