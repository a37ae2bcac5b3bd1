//! `.lod` cache files.
//!
//! A simplified index buffer is persisted next to its source mesh as
//! `<mesh>.lod`: a little-endian `u32` index count followed by that many
//! `u16` indices, interpreted as a flat triangle list. No header, no magic,
//! no version, and no invalidation against source-mesh edits: deleting the
//! file is the only way to force a rebuild.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;

use crate::errors::{LumenError, Result};
use crate::lod::simplifier::Simplifier;

/// Platform / quality configuration for LOD generation.
#[derive(Debug, Clone)]
pub struct LodConfig {
    /// Some platform configurations ship without the simplifier; they reuse
    /// the full-resolution buffer with a logged warning.
    pub enabled: bool,
    /// Quadric-error collapse threshold.
    pub threshold: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 0.5,
        }
    }
}

/// Sibling cache path for a mesh asset.
#[must_use]
pub fn lod_cache_path(mesh_path: &Path) -> PathBuf {
    mesh_path.with_extension("lod")
}

/// Reads a `.lod` cache file. The index count must describe whole triangles.
pub fn read_lod_cache(path: &Path) -> Result<Vec<u16>> {
    let mut reader = BufReader::new(File::open(path)?);
    let count = reader.read_u32::<LittleEndian>()?;
    if count % 3 != 0 {
        return Err(LumenError::MalformedLodCache {
            path: path.to_path_buf(),
            reason: format!("index count {count} is not a multiple of 3"),
        });
    }
    let mut indices = Vec::with_capacity(count as usize);
    for _ in 0..count {
        indices.push(reader.read_u16::<LittleEndian>().map_err(|_| {
            LumenError::MalformedLodCache {
                path: path.to_path_buf(),
                reason: "truncated index data".into(),
            }
        })?);
    }
    Ok(indices)
}

pub fn write_lod_cache(path: &Path, indices: &[u16]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_u32::<LittleEndian>(indices.len() as u32)?;
    for &index in indices {
        writer.write_u16::<LittleEndian>(index)?;
    }
    Ok(())
}

/// Returns the reduced index buffer for a mesh, from cache when possible.
///
/// Cache hit: load `<mesh>.lod`. Cache miss with simplification enabled: run
/// the full decimation and persist the result. Cache miss with
/// simplification disabled: warn and hand back the original buffer
/// unmodified.
pub fn generate_lod(
    mesh_path: &Path,
    indices: &[u16],
    positions: &[Vec3],
    config: &LodConfig,
) -> Result<Vec<u16>> {
    let cache = lod_cache_path(mesh_path);
    if cache.exists() {
        log::debug!("LOD cache hit: {}", cache.display());
        return read_lod_cache(&cache);
    }
    if !config.enabled {
        log::warn!(
            "mesh simplification disabled, using full-resolution indices for {}",
            mesh_path.display()
        );
        return Ok(indices.to_vec());
    }

    let mut simplifier = Simplifier::new(indices, positions)?;
    simplifier.decimate(config.threshold);
    let reduced = simplifier.index_buffer();
    write_lod_cache(&cache, &reduced)?;
    log::debug!(
        "LOD generated for {}: {} -> {} triangles",
        mesh_path.display(),
        indices.len() / 3,
        reduced.len() / 3
    );
    Ok(reduced)
}
