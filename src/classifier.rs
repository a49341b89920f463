use crate::bvh::Bvh;
use crate::geometry::{add_scaled, dot, normalize, sub};

/// Distance a ray origin is pushed past a surface before casting again.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Upper bound on raycasts per classification. Reaching it means the ray kept
/// re-hitting geometry within epsilon steps, and the point is reported as outside.
pub const DEFAULT_MAX_STEPS: usize = 4096;

/// Where a ray from an interior point leaves the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceCrossing {
    pub point: [f64; 3],
    pub normal: [f64; 3],
}

/// Trait deciding whether a point lies inside the closed surface indexed by a [`Bvh`].
/// Must be Send + Sync so a sampler holding one can move between threads.
pub trait Containment: Send + Sync + std::fmt::Debug {
    /// Returns the exit crossing when `point` is inside, `None` otherwise.
    fn classify(&self, bvh: &Bvh, point: [f64; 3]) -> Option<SurfaceCrossing>;

    fn contains(&self, bvh: &Bvh, point: [f64; 3]) -> bool {
        self.classify(bvh, point).is_some()
    }
}

fn ray_direction(reference: &[f64; 3], point: &[f64; 3]) -> [f64; 3] {
    normalize(&sub(point, reference)).unwrap_or([0.0, 0.0, 1.0])
}

/// Signed ray-parity test.
///
/// A ray is cast from the point away from `reference` and walked through every
/// surface it crosses. Faces whose normal agrees with the ray count +1 (leaving),
/// the others -1 (entering). The point is inside when the total is positive, and
/// the first leaving crossing is reported as its exit point.
#[derive(Clone, Copy, Debug)]
pub struct RayParity {
    pub reference: [f64; 3],
    pub epsilon: f64,
    pub max_steps: usize,
}

impl RayParity {
    pub fn new(reference: [f64; 3]) -> Self {
        Self {
            reference,
            epsilon: DEFAULT_EPSILON,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl Default for RayParity {
    fn default() -> Self {
        Self::new([0.0; 3])
    }
}

impl Containment for RayParity {
    fn classify(&self, bvh: &Bvh, point: [f64; 3]) -> Option<SurfaceCrossing> {
        let dir = ray_direction(&self.reference, &point);
        let mut origin = point;
        let mut crossings: i64 = 0;
        let mut exit = None;
        let mut previous = None;

        for _ in 0..self.max_steps {
            let Some(hit) = bvh.raycast(origin, dir) else {
                return if crossings > 0 { exit } else { None };
            };

            if previous == Some(hit.triangle) {
                // Rounding landed us back on the surface we just left.
                origin = add_scaled(&origin, &dir, self.epsilon);
                continue;
            }

            if dot(&dir, &hit.normal) >= 0.0 {
                crossings += 1;
                exit.get_or_insert(SurfaceCrossing { point: hit.point, normal: hit.normal });
            } else {
                crossings -= 1;
            }
            previous = Some(hit.triangle);
            origin = add_scaled(&hit.point, &dir, self.epsilon);
        }

        tracing::warn!(?point, steps = self.max_steps, "ray parity did not escape the mesh");
        None
    }
}

/// Single-raycast test: inside when the nearest hit faces away from the point.
///
/// Cheaper than [`RayParity`] but misclassifies points whose ray grazes an edge
/// or crosses a non-manifold region.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleRay {
    pub reference: [f64; 3],
}

impl SingleRay {
    pub fn new(reference: [f64; 3]) -> Self {
        Self { reference }
    }
}

impl Containment for SingleRay {
    fn classify(&self, bvh: &Bvh, point: [f64; 3]) -> Option<SurfaceCrossing> {
        let dir = ray_direction(&self.reference, &point);
        let hit = bvh.raycast(point, dir)?;
        (dot(&dir, &hit.normal) >= 0.0).then_some(SurfaceCrossing {
            point: hit.point,
            normal: hit.normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    #[test]
    fn test_cube_inside_and_outside() {
        let bvh = Bvh::from_mesh(&Mesh::cube([0.0; 3], 1.0));
        let parity = RayParity::default();

        let crossing = parity.classify(&bvh, [0.5, 0.1, 0.2]).expect("point is inside");
        assert!((crossing.point[0] - 1.0).abs() < 1e-9);
        assert_eq!(crossing.normal, [1.0, 0.0, 0.0]);

        assert!(parity.classify(&bvh, [1.5, 0.0, 0.0]).is_none());
        assert!(parity.classify(&bvh, [0.3, -1.2, 0.9]).is_none());
    }

    #[test]
    fn test_ray_through_mesh_counts_both_crossings() {
        // Reference beyond the cube so the ray from an outside point passes through it.
        let bvh = Bvh::from_mesh(&Mesh::cube([0.0; 3], 1.0));
        let parity = RayParity::new([-10.0, 0.1, 0.2]);
        assert!(parity.classify(&bvh, [-3.0, 0.1, 0.2]).is_none());
        assert!(parity.classify(&bvh, [0.0, 0.1, 0.2]).is_some());

        let single = SingleRay::new([-10.0, 0.1, 0.2]);
        assert!(single.classify(&bvh, [-3.0, 0.1, 0.2]).is_none());
        assert!(single.contains(&bvh, [0.0, 0.1, 0.2]));
    }

    #[test]
    fn test_cavity_is_outside() {
        // An outer cube with an inner cube wound inside-out: a hollow shell.
        let outer = Mesh::cube([0.0; 3], 2.0);
        let mut triangles = outer.triangles();
        for [a, b, c] in Mesh::cube([0.0; 3], 1.0).triangles() {
            triangles.push([a, c, b]);
        }
        let bvh = Bvh::build(&triangles);
        let parity = RayParity::default();

        assert!(parity.contains(&bvh, [1.5, 0.2, 0.1]), "shell point should be inside");
        assert!(!parity.contains(&bvh, [0.5, 0.2, 0.1]), "cavity point should be outside");
        assert!(!parity.contains(&bvh, [2.5, 0.2, 0.1]));
    }

    #[test]
    fn test_points_on_vertex_planes_are_inside() {
        let bvh = Bvh::from_mesh(&Mesh::octahedron([0.0; 3], 1.0));
        for p in [[0.0, 0.0, 0.5], [0.3, 0.0, 0.0], [0.0, -0.4, 0.0], [0.0, 0.0, -0.7]] {
            assert!(RayParity::default().contains(&bvh, p), "{:?} should be inside", p);
            assert!(SingleRay::default().contains(&bvh, p), "{:?} should be inside", p);
        }
        assert!(!RayParity::default().contains(&bvh, [0.0, 0.0, 1.5]));
    }

    #[test]
    fn test_empty_index_is_outside() {
        let bvh = Bvh::build(&[]);
        assert!(!RayParity::default().contains(&bvh, [0.0; 3]));
        assert!(!SingleRay::default().contains(&bvh, [0.0; 3]));
    }
}
