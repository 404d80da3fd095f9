//! # Chunk Geometry
//!
//! A chunk is a window of consecutive rings plus the representations built
//! from it. Neighbouring chunks share their boundary ring so the surfaces
//! meet without seams.
//!
//! ## Mesh Layout
//!
//! For `R` rings of `S` sides the first `R * S` vertices are the rings in
//! order, side-major within each ring. Each quad between ring `p` and the
//! next ring `c` is two triangles `[p+s, c+s, c+n]` and `[p+s, c+n, p+n]`
//! where `n = (s + 1) % S`.
//!
//! | caps     | vertices      | indices           |
//! |----------|---------------|-------------------|
//! | `none`   | `R*S`         | `(R-1)*S*6`       |
//! | `fan`    | `R*S + 2`     | `(R-1)*S*6 + 6*S` |
//! | `sleeve` | `R*S + 2*S`   | `(R+1)*S*6`       |
//!
//! Fan centres sit at `R*S` (first ring) and `R*S + 1` (last ring). Sleeve
//! rings start at `R*S` (behind the first ring) and `R*S + S` (past the
//! last ring).

use std::f64::consts::TAU;
use std::fmt;
use std::ops::Range;

use tunnelcave_shared::Vector3;

use crate::config::{EndCapStyle, TunnelParams};
use crate::sdf::SignedDistanceField;
use crate::terrain::RingSample;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vector3,
    /// Maximum corner.
    pub max: Vector3,
}

impl Aabb {
    /// Box around every ring's ±right/±up extent at its largest radius.
    #[must_use]
    pub fn from_rings(rings: &[RingSample]) -> Self {
        let mut min = Vector3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Vector3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for ring in rings {
            let reach = ring.max_radius();
            let frame = ring.frame();
            for axis in [frame.right(), frame.up()] {
                for sign in [-1.0, 1.0] {
                    let p = ring.center() + axis * (reach * sign);
                    min = Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
                    max = Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
                }
            }
        }
        Self { min, max }
    }

    /// Whether `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: Vector3) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }

    /// Edge lengths.
    #[must_use]
    pub fn extent(&self) -> Vector3 {
        self.max - self.min
    }
}

/// Triangle mesh of one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshChunk {
    vertices: Vec<Vector3>,
    indices: Vec<u32>,
}

impl MeshChunk {
    /// Sweeps the rings into a tube and adds the requested caps.
    #[must_use]
    pub fn build(rings: &[RingSample], end_caps: EndCapStyle, ring_step: f64) -> Self {
        let Some(sides) = rings.first().map(RingSample::sides) else {
            return Self::default();
        };
        let mut mesh = Self {
            vertices: Vec::with_capacity(rings.len() * sides + 2 * sides),
            indices: Vec::with_capacity((rings.len() + 1) * sides * 6),
        };
        for ring in rings {
            mesh.vertices.extend(ring_vertices(ring, Vector3::ZERO));
        }
        for r in 1..rings.len() {
            mesh.connect(((r - 1) * sides) as u32, (r * sides) as u32, sides as u32);
        }

        let ring_count = rings.len();
        let tail = (ring_count * sides) as u32;
        let last_base = ((ring_count - 1) * sides) as u32;
        let s = sides as u32;
        match end_caps {
            EndCapStyle::None => {}
            EndCapStyle::Fan => {
                let first = &rings[0];
                let last = &rings[ring_count - 1];
                mesh.vertices.push(first.center());
                mesh.vertices.push(last.center());
                let (start_center, end_center) = (tail, tail + 1);
                for side in 0..s {
                    let next = (side + 1) % s;
                    mesh.indices.extend([start_center, next, side]);
                }
                for side in 0..s {
                    let next = (side + 1) % s;
                    mesh.indices.extend([end_center, last_base + side, last_base + next]);
                }
            }
            EndCapStyle::Sleeve => {
                let sleeve = (ring_step * 0.5).max(1e-6);
                let first = &rings[0];
                let last = &rings[ring_count - 1];
                mesh.vertices.extend(ring_vertices(first, first.forward() * -sleeve));
                mesh.vertices.extend(ring_vertices(last, last.forward() * sleeve));
                mesh.connect(tail, 0, s);
                mesh.connect(last_base, tail + s, s);
            }
        }
        mesh
    }

    fn connect(&mut self, prev: u32, curr: u32, sides: u32) {
        for side in 0..sides {
            let next = (side + 1) % sides;
            self.indices.extend([
                prev + side,
                curr + side,
                curr + next,
                prev + side,
                curr + next,
                prev + next,
            ]);
        }
    }

    /// Vertex positions.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    /// Triangle list indices.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices.
    #[inline]
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer as raw bytes (`3 x f64` per vertex).
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Single-precision positions for GPU upload.
    #[must_use]
    pub fn positions_f32(&self) -> Vec<[f32; 3]> {
        self.vertices
            .iter()
            .map(|v| [v.x as f32, v.y as f32, v.z as f32])
            .collect()
    }
}

fn ring_vertices(ring: &RingSample, offset: Vector3) -> impl Iterator<Item = Vector3> + '_ {
    let sides = ring.sides();
    let center = ring.center() + offset;
    ring.roughness_profile()
        .iter()
        .enumerate()
        .map(move |(side, &radius)| {
            let angle = side as f64 / sides as f64 * TAU;
            center + ring.frame().radial(angle) * radius
        })
}

/// Compact signed-distance descriptor of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct SdfChunk {
    ring_indexes: Range<usize>,
    radii: Vec<f64>,
}

impl SdfChunk {
    /// Descriptor for rings starting at global index `ring_start`.
    #[must_use]
    pub fn build(ring_start: usize, rings: &[RingSample]) -> Self {
        Self {
            ring_indexes: ring_start..ring_start + rings.len(),
            radii: rings.iter().map(RingSample::max_radius).collect(),
        }
    }

    /// Global ring indexes covered.
    #[must_use]
    pub fn ring_indexes(&self) -> Range<usize> {
        self.ring_indexes.clone()
    }

    /// Largest radius of each covered ring.
    #[must_use]
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }
}

/// Rings of one chunk and the representations derived from them.
#[derive(Clone, Debug)]
pub struct ChunkGeometry {
    index: usize,
    ring_start: usize,
    rings: Vec<RingSample>,
    mesh: Option<MeshChunk>,
    sdf: Option<SdfChunk>,
    aabb: Aabb,
    min_radius: f64,
    max_radius: f64,
    widest_ring_index: usize,
}

impl ChunkGeometry {
    /// Builds the chunk representations selected by `params.mode`.
    #[must_use]
    pub fn build(index: usize, ring_start: usize, rings: &[RingSample], params: &TunnelParams) -> Self {
        let min_radius = rings
            .iter()
            .map(RingSample::min_radius)
            .fold(f64::INFINITY, f64::min);
        let (widest_ring_index, max_radius) = rings
            .iter()
            .map(RingSample::max_radius)
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, r)| if r > best.1 { (i, r) } else { best });

        Self {
            index,
            ring_start,
            rings: rings.to_vec(),
            mesh: params
                .mode
                .wants_mesh()
                .then(|| MeshChunk::build(rings, params.end_caps, params.ring_step)),
            sdf: params.mode.wants_sdf().then(|| SdfChunk::build(ring_start, rings)),
            aabb: Aabb::from_rings(rings),
            min_radius,
            max_radius,
            widest_ring_index,
        }
    }

    /// Chunk index.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Global index of the first ring.
    #[inline]
    #[must_use]
    pub const fn ring_start(&self) -> usize {
        self.ring_start
    }

    /// Rings of the window.
    #[inline]
    #[must_use]
    pub fn rings(&self) -> &[RingSample] {
        &self.rings
    }

    /// Triangle mesh, when the output mode includes one.
    #[inline]
    #[must_use]
    pub const fn mesh(&self) -> Option<&MeshChunk> {
        self.mesh.as_ref()
    }

    /// SDF descriptor, when the output mode includes one.
    #[inline]
    #[must_use]
    pub const fn sdf(&self) -> Option<&SdfChunk> {
        self.sdf.as_ref()
    }

    /// Bounding box of the wall extents.
    #[inline]
    #[must_use]
    pub const fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Smallest wall radius in the chunk.
    #[inline]
    #[must_use]
    pub const fn min_radius(&self) -> f64 {
        self.min_radius
    }

    /// Largest wall radius in the chunk.
    #[inline]
    #[must_use]
    pub const fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Chunk-local index of the ring with the largest radius.
    #[inline]
    #[must_use]
    pub const fn widest_ring_index(&self) -> usize {
        self.widest_ring_index
    }

    /// Coarse signed distance from `point` to the chunk's wall.
    #[must_use]
    pub fn signed_distance(&self, point: Vector3) -> f64 {
        SignedDistanceField::new(&self.rings).evaluate(point)
    }

    /// One-line description for logs and debug overlays.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChunkGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chunk {}: rings={}, radius range=({:.2}, {:.2}), widest ring={}",
            self.index,
            self.rings.len(),
            self.min_radius,
            self.max_radius,
            self.widest_ring_index
        )
    }
}
