use crate::bounds::BoundingBox;
use crate::geometry::{add_scaled, cross, dot, normalize, sub};
use crate::mesh::Mesh;

/// Maximum number of triangles stored in a leaf.
const LEAF_SIZE: usize = 4;

#[derive(Clone, Copy, Debug)]
struct BvhNode {
    bounds: BoundingBox,
    left: u32, // u32::MAX if leaf
    right: u32,
    // Leaf data: indices[start..end]
    start: u32,
    end: u32,
}

#[derive(Clone, Copy, Debug)]
struct Triangle {
    vertices: [[f64; 3]; 3],
    normal: [f64; 3],
    degenerate: bool,
}

impl Triangle {
    fn new(vertices: [[f64; 3]; 3]) -> Self {
        let [a, b, c] = &vertices;
        match normalize(&cross(&sub(b, a), &sub(c, a))) {
            Some(normal) => Self { vertices, normal, degenerate: false },
            None => Self { vertices, normal: [0.0; 3], degenerate: true },
        }
    }

    fn centroid(&self) -> [f64; 3] {
        let [a, b, c] = &self.vertices;
        [
            (a[0] + b[0] + c[0]) / 3.0,
            (a[1] + b[1] + c[1]) / 3.0,
            (a[2] + b[2] + c[2]) / 3.0,
        ]
    }

    /// Möller–Trumbore intersection with a unit-direction ray. Edges count as inside,
    /// so a ray through an edge shared by two triangles hits at least one of them.
    fn intersect(&self, origin: &[f64; 3], dir: &[f64; 3]) -> Option<f64> {
        if self.degenerate {
            return None;
        }
        let [a, b, c] = &self.vertices;
        let e1 = sub(b, a);
        let e2 = sub(c, a);
        let p = cross(dir, &e2);
        let det = dot(&e1, &p);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = sub(origin, a);
        let u = dot(&s, &p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = cross(&s, &e1);
        let v = dot(dir, &q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = dot(&e2, &q) * inv_det;
        if t > 0.0 { Some(t) } else { None }
    }
}

/// Closest intersection of a ray with the indexed triangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: [f64; 3],
    /// Unit normal from the triangle's winding (not interpolated).
    pub normal: [f64; 3],
    /// Index of the triangle in the order it was given to [`Bvh::build`].
    pub triangle: usize,
    /// Euclidean distance from the ray origin, always > 0.
    pub distance: f64,
}

/// Bounding-volume hierarchy over a snapshot of triangles, answering nearest-hit ray queries.
///
/// The hierarchy never observes changes to the source mesh; rebuild it after edits.
#[derive(Debug)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<usize>,
    triangles: Vec<Triangle>,
}

impl Bvh {
    /// Builds the hierarchy by recursive median splits along the longest axis of the
    /// triangle centroids. An empty input gives an index that never reports a hit.
    pub fn build(triangles: &[[[f64; 3]; 3]]) -> Self {
        let triangles: Vec<Triangle> = triangles.iter().map(|t| Triangle::new(*t)).collect();
        let count = triangles.len();
        let mut bvh = Bvh {
            nodes: Vec::with_capacity(count.div_ceil(LEAF_SIZE) * 2),
            indices: (0..count).collect(),
            triangles,
        };
        if count > 0 {
            let centroids: Vec<[f64; 3]> = bvh.triangles.iter().map(Triangle::centroid).collect();
            bvh.build_recursive(0, count, &centroids);
        }
        bvh
    }

    /// Builds the hierarchy over the fan triangulation of `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self::build(&mesh.triangles())
    }

    fn build_recursive(&mut self, start: usize, end: usize, centroids: &[[f64; 3]]) -> u32 {
        let count = end - start;

        let mut bounds = BoundingBox::empty();
        let mut centroid_bounds = BoundingBox::empty();
        for &idx in &self.indices[start..end] {
            for v in &self.triangles[idx].vertices {
                bounds.extend(v);
            }
            centroid_bounds.extend(&centroids[idx]);
        }

        if count <= LEAF_SIZE {
            let node_idx = self.nodes.len() as u32;
            self.nodes.push(BvhNode {
                bounds,
                left: u32::MAX,
                right: u32::MAX,
                start: start as u32,
                end: end as u32,
            });
            return node_idx;
        }

        let axis = centroid_bounds.longest_axis();
        let mid = start + count / 2;
        self.indices[start..end].select_nth_unstable_by(count / 2, |&a, &b| {
            centroids[a][axis].total_cmp(&centroids[b][axis])
        });

        let left = self.build_recursive(start, mid, centroids);
        let right = self.build_recursive(mid, end, centroids);

        let node_idx = self.nodes.len() as u32;
        self.nodes.push(BvhNode {
            bounds,
            left,
            right,
            start: 0,
            end: 0,
        });
        node_idx
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounds of all indexed triangles.
    pub fn bounds(&self) -> BoundingBox {
        self.nodes.last().map_or_else(BoundingBox::empty, |root| root.bounds)
    }

    /// Closest hit at distance > 0 along the ray, or `None`. `direction` need not be unit length.
    pub fn raycast(&self, origin: [f64; 3], direction: [f64; 3]) -> Option<RayHit> {
        let dir = normalize(&direction)?;
        if self.nodes.is_empty() {
            return None;
        }
        let inv_dir = [1.0 / dir[0], 1.0 / dir[1], 1.0 / dir[2]];
        let mut best: Option<(usize, f64)> = None;
        // Root is the last node pushed in our recursive build
        let root_idx = (self.nodes.len() - 1) as u32;
        self.raycast_recursive(root_idx, &origin, &dir, &inv_dir, &mut best);

        best.map(|(triangle, distance)| RayHit {
            point: add_scaled(&origin, &dir, distance),
            normal: self.triangles[triangle].normal,
            triangle,
            distance,
        })
    }

    fn raycast_recursive(
        &self,
        node_idx: u32,
        origin: &[f64; 3],
        dir: &[f64; 3],
        inv_dir: &[f64; 3],
        best: &mut Option<(usize, f64)>,
    ) {
        let node = &self.nodes[node_idx as usize];

        // Leaf
        if node.left == u32::MAX {
            for &idx in &self.indices[node.start as usize..node.end as usize] {
                if let Some(t) = self.triangles[idx].intersect(origin, dir) {
                    if best.is_none_or(|(_, d)| t < d) {
                        *best = Some((idx, t));
                    }
                }
            }
            return;
        }

        // Internal: visit the child the ray enters first
        let max_t = best.map_or(f64::INFINITY, |(_, d)| d);
        let left = self.nodes[node.left as usize].bounds.ray_entry(origin, inv_dir, max_t);
        let right = self.nodes[node.right as usize].bounds.ray_entry(origin, inv_dir, max_t);

        let order = match (left, right) {
            (Some(l), Some(r)) if r < l => [Some((node.right, r)), Some((node.left, l))],
            (l, r) => [l.map(|t| (node.left, t)), r.map(|t| (node.right, t))],
        };
        for (child, entry) in order.into_iter().flatten() {
            // The nearer child may have found a hit closer than this child's box.
            if best.is_some_and(|(_, d)| entry > d) {
                continue;
            }
            self.raycast_recursive(child, origin, dir, inv_dir, best);
        }
    }
}
