//! Greedy quadric-error-metric mesh decimation.
//!
//! Classic edge-collapse simplification: every vertex accumulates the plane
//! quadrics of its triangles, every edge is priced by the quadric error of
//! collapsing one endpoint into the other, and the cheapest edges collapse
//! first until the next collapse would exceed the caller's error threshold.
//! Boundary ("margin") vertices are pinned: an open edge's endpoints may
//! absorb interior vertices but never each other, so the silhouette of an
//! open mesh survives any threshold.

use std::collections::HashMap;

use glam::{Mat4, Vec3, Vec4};

use crate::errors::{LumenError, Result};
use crate::lod::heap::IndexedHeap;

/// Quadric errors below this are numerical noise and snap to exactly zero.
const ERROR_FLOOR: f32 = 5e-2;
/// Side length of the normalization cube the mesh is scaled into before any
/// quadric math; keeps the error magnitudes comparable across meshes.
const NORMALIZE_SIZE: f32 = 100.0;

#[derive(Debug, Clone)]
struct Vertex {
    position: Vec3,
    quadric: Mat4,
    /// Touches an open (count-1) edge; must never merge with another margin.
    margin: bool,
    deleted: bool,
    /// Incident edge ids.
    edges: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    ends: [u32; 2],
    /// Number of triangles sharing this edge; 1 marks an open boundary.
    count: u32,
    /// Endpoint that a collapse removes.
    removed: u32,
    /// Endpoint that survives the collapse.
    kept: u32,
    cost: f32,
    deleted: bool,
}

#[derive(Debug)]
pub struct Simplifier {
    /// Working triangle list; collapse rewrites indices in place.
    indices: Vec<u32>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    triangle_deleted: Vec<bool>,
    heap: IndexedHeap,
}

impl Simplifier {
    /// Builds the collapse state for a triangle list.
    ///
    /// The caller keeps ownership of the real buffers; the simplifier works
    /// on normalized copies and only ever emits a new index list.
    pub fn new(indices: &[u16], positions: &[Vec3]) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(LumenError::InvalidMesh(
                "index count is not a multiple of 3".into(),
            ));
        }
        if positions.is_empty() {
            return Err(LumenError::InvalidMesh("empty vertex buffer".into()));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(LumenError::InvalidMesh(format!(
                "index {bad} out of range for {} vertices",
                positions.len()
            )));
        }

        let mut vertices: Vec<Vertex> = normalize_positions(positions)
            .into_iter()
            .map(|position| Vertex {
                position,
                quadric: Mat4::ZERO,
                margin: false,
                deleted: false,
                edges: Vec::new(),
            })
            .collect();

        let indices: Vec<u32> = indices.iter().map(|&i| u32::from(i)).collect();
        let triangle_count = indices.len() / 3;

        // Accumulate plane quadrics. Degenerate triangles contribute nothing.
        for tri in indices.chunks_exact(3) {
            let a = vertices[tri[0] as usize].position;
            let b = vertices[tri[1] as usize].position;
            let c = vertices[tri[2] as usize].position;
            let normal = (b - a).cross(c - a);
            if normal.length_squared() < 1e-12 {
                continue;
            }
            let normal = normal.normalize();
            let plane = normal.extend(-normal.dot(a));
            let quadric = outer_product(plane);
            for &slot in tri {
                vertices[slot as usize].quadric += quadric;
            }
        }

        // Deduplicated edge list: edges shared by adjacent triangles bump a
        // count instead of duplicating.
        let mut edges: Vec<Edge> = Vec::new();
        let mut lookup: HashMap<(u32, u32), usize> = HashMap::new();
        for tri in indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                if a == b {
                    continue;
                }
                let pair = (a.min(b), a.max(b));
                match lookup.get(&pair) {
                    Some(&id) => edges[id].count += 1,
                    None => {
                        let id = edges.len();
                        lookup.insert(pair, id);
                        edges.push(Edge {
                            ends: [pair.0, pair.1],
                            count: 1,
                            removed: pair.0,
                            kept: pair.1,
                            cost: 0.0,
                            deleted: false,
                        });
                        vertices[pair.0 as usize].edges.push(id);
                        vertices[pair.1 as usize].edges.push(id);
                    }
                }
            }
        }

        for edge in &edges {
            if edge.count == 1 {
                vertices[edge.ends[0] as usize].margin = true;
                vertices[edge.ends[1] as usize].margin = true;
            }
        }

        let mut simplifier = Self {
            indices,
            vertices,
            edges,
            triangle_deleted: vec![false; triangle_count],
            heap: IndexedHeap::with_capacity(0),
        };
        simplifier.heap = IndexedHeap::with_capacity(simplifier.edges.len());
        for id in 0..simplifier.edges.len() {
            simplifier.weigh_edge(id);
            let edge = simplifier.edges[id];
            if !edge.deleted {
                simplifier.heap.push(id, edge.cost);
            }
        }
        Ok(simplifier)
    }

    /// Whether a vertex sits on an open boundary.
    #[must_use]
    pub fn is_margin(&self, vertex: usize) -> bool {
        self.vertices[vertex].margin
    }

    /// Triangles still alive.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_deleted.iter().filter(|&&d| !d).count()
    }

    /// Prices an edge and picks its collapse direction.
    fn weigh_edge(&mut self, id: usize) {
        let edge = self.edges[id];
        let a = edge.ends[0];
        let b = edge.ends[1];
        let margin_a = self.vertices[a as usize].margin;
        let margin_b = self.vertices[b as usize].margin;

        // Two boundary vertices must never merge.
        if margin_a && margin_b {
            self.edges[id].deleted = true;
            return;
        }

        let combined = self.vertices[a as usize].quadric + self.vertices[b as usize].quadric;
        let error_at = |target: u32| -> f32 {
            let p = self.vertices[target as usize].position.extend(1.0);
            p.dot(combined * p)
        };

        let (removed, kept, cost) = if margin_a {
            (b, a, error_at(a))
        } else if margin_b {
            (a, b, error_at(b))
        } else {
            // Keep the cheaper survivor.
            let cost_keep_a = error_at(a);
            let cost_keep_b = error_at(b);
            if cost_keep_a <= cost_keep_b {
                (b, a, cost_keep_a)
            } else {
                (a, b, cost_keep_b)
            }
        };

        let edge = &mut self.edges[id];
        edge.removed = removed;
        edge.kept = kept;
        edge.cost = if cost < ERROR_FLOOR { 0.0 } else { cost };
    }

    /// Collapses the cheapest remaining edge. Returns `false` once the heap
    /// is exhausted.
    pub fn decimate_step(&mut self) -> bool {
        let Some((_, id)) = self.heap.pop() else {
            return false;
        };
        self.edges[id].deleted = true;
        let Edge { removed, kept, .. } = self.edges[id];

        // Degenerate or pinned: consume the edge without collapsing.
        if removed == kept {
            return true;
        }
        if self.vertices[removed as usize].margin && self.vertices[kept as usize].margin {
            return true;
        }

        let removed_quadric = self.vertices[removed as usize].quadric;
        self.vertices[kept as usize].quadric += removed_quadric;
        self.vertices[removed as usize].deleted = true;

        // Every reference to the removed vertex now points at the survivor.
        for slot in &mut self.indices {
            if *slot == removed {
                *slot = kept;
            }
        }

        // Fold the removed vertex's incident edges into the survivor's list.
        let orphaned = std::mem::take(&mut self.vertices[removed as usize].edges);
        for edge_id in orphaned {
            if self.edges[edge_id].deleted {
                continue;
            }
            for end in &mut self.edges[edge_id].ends {
                if *end == removed {
                    *end = kept;
                }
            }
            let ends = self.edges[edge_id].ends;
            if ends[0] == ends[1] {
                self.edges[edge_id].deleted = true;
                self.heap.remove(edge_id);
                continue;
            }
            let duplicate = self.vertices[kept as usize].edges.iter().any(|&other| {
                let o = self.edges[other].ends;
                !self.edges[other].deleted
                    && (o == ends || (o[0] == ends[1] && o[1] == ends[0]))
            });
            if duplicate {
                self.edges[edge_id].deleted = true;
                self.heap.remove(edge_id);
            } else {
                self.vertices[kept as usize].edges.push(edge_id);
            }
        }

        // Reprice everything now incident to the survivor.
        let incident = self.vertices[kept as usize].edges.clone();
        for edge_id in incident {
            if self.edges[edge_id].deleted {
                self.heap.remove(edge_id);
                continue;
            }
            self.weigh_edge(edge_id);
            if self.edges[edge_id].deleted {
                self.heap.remove(edge_id);
            } else {
                self.heap.update(edge_id, self.edges[edge_id].cost);
            }
        }
        true
    }

    /// Applies every collapse cheaper than `threshold`, then sweeps out the
    /// triangles the collapses degenerated.
    pub fn decimate(&mut self, threshold: f32) {
        while let Some((cost, _)) = self.heap.peek() {
            if cost >= threshold {
                break;
            }
            self.decimate_step();
        }
        for (tri, deleted) in self
            .indices
            .chunks_exact(3)
            .zip(self.triangle_deleted.iter_mut())
        {
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[2] == tri[0] {
                *deleted = true;
            }
        }
    }

    /// Surviving triangles' (possibly rewritten) indices, in original
    /// triangle order.
    #[must_use]
    pub fn index_buffer(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.triangle_count() * 3);
        for (tri, &deleted) in self.indices.chunks_exact(3).zip(&self.triangle_deleted) {
            if !deleted {
                out.extend(tri.iter().map(|&slot| slot as u16));
            }
        }
        out
    }
}

/// Scales vertex positions into a [`NORMALIZE_SIZE`] cube around the mesh
/// centroid, for numeric stability of the quadric accumulation.
fn normalize_positions(positions: &[Vec3]) -> Vec<Vec3> {
    let centroid = positions.iter().copied().sum::<Vec3>() / positions.len() as f32;
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for &p in positions {
        min = min.min(p);
        max = max.max(p);
    }
    let extent = (max - min).max_element();
    let scale = if extent > 0.0 {
        NORMALIZE_SIZE / extent
    } else {
        1.0
    };
    positions.iter().map(|&p| (p - centroid) * scale).collect()
}

/// `p pᵀ` for a plane `p = (a, b, c, d)`.
fn outer_product(p: Vec4) -> Mat4 {
    Mat4::from_cols(p * p.x, p * p.y, p * p.z, p * p.w)
}
