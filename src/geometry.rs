//! Geometry utilities: bounding sizes, vector helpers and the random point
//! generators used by the samplers.
//!
//! All generators take the random number generator by `&mut` so a sampler can
//! share one seeded stream across every draw, which is what makes runs
//! reproducible from a seed.

use crate::bounds::BoundingBox;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::f64::consts::TAU;

pub(crate) fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn add_scaled(a: &[f64; 3], d: &[f64; 3], s: f64) -> [f64; 3] {
    [a[0] + d[0] * s, a[1] + d[1] * s, a[2] + d[2] * s]
}

pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn length(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Unit vector along `a`, or `None` for a zero-length input.
pub(crate) fn normalize(a: &[f64; 3]) -> Option<[f64; 3]> {
    let len = length(a);
    if len == 0.0 || !len.is_finite() {
        return None;
    }
    Some([a[0] / len, a[1] / len, a[2] / len])
}

/// Area of the triangle `abc`.
pub fn triangle_area(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> f64 {
    0.5 * length(&cross(&sub(b, a), &sub(c, a)))
}

/// Largest distance from the origin to any corner of `bounds`.
pub fn bounding_radius(bounds: &BoundingBox) -> f64 {
    bounds
        .corners()
        .iter()
        .map(length)
        .fold(0.0, f64::max)
}

/// Largest absolute coordinate among the corners of `bounds`.
///
/// The cube `[-h, h]^3` for the returned `h` encloses the box.
pub fn bounding_halfwidth(bounds: &BoundingBox) -> f64 {
    bounds
        .corners()
        .iter()
        .flat_map(|c| c.iter().map(|v| v.abs()))
        .fold(0.0, f64::max)
}

/// Uniformly distributed point on the sphere of `radius` around the origin.
///
/// Uses the inverse CDF of the polar angle so the points have uniform area density.
pub fn random_point_on_sphere<R: Rng + ?Sized>(radius: f64, rng: &mut R) -> [f64; 3] {
    let u: f64 = rng.r#gen();
    let v: f64 = rng.r#gen();
    let theta = TAU * u;
    let phi = (2.0 * v - 1.0).clamp(-1.0, 1.0).acos();
    [
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    ]
}

/// Uniformly distributed point in the cube `[-halfwidth, halfwidth]^3`.
pub fn random_point_in_cube<R: Rng + ?Sized>(halfwidth: f64, rng: &mut R) -> [f64; 3] {
    let mut p = [0.0; 3];
    for v in p.iter_mut() {
        let u: f64 = rng.r#gen();
        *v = (2.0 * u - 1.0) * halfwidth;
    }
    p
}

/// Uniformly distributed point on the triangle `abc`.
pub fn random_point_on_triangle<R: Rng + ?Sized>(
    a: &[f64; 3],
    b: &[f64; 3],
    c: &[f64; 3],
    rng: &mut R,
) -> [f64; 3] {
    let r1: f64 = rng.r#gen();
    let r2: f64 = rng.r#gen();
    let s = r1.sqrt();
    let wa = 1.0 - s;
    let wb = s * (1.0 - r2);
    let wc = s * r2;
    [
        wa * a[0] + wb * b[0] + wc * c[0],
        wa * a[1] + wb * b[1] + wc * c[1],
        wa * a[2] + wb * b[2] + wc * c[2],
    ]
}

/// Uniformly distributed point on a planar polygon.
///
/// The polygon is fan-triangulated from its first vertex and a triangle is picked
/// with probability proportional to its area. Polygons with fewer than three
/// vertices or no area yield `None`; zero-area fan triangles are never picked.
pub fn random_point_on_polygon<R: Rng + ?Sized>(vertices: &[[f64; 3]], rng: &mut R) -> Option<[f64; 3]> {
    if vertices.len() < 3 {
        return None;
    }
    let origin = &vertices[0];
    let areas: Vec<f64> = vertices[1..]
        .windows(2)
        .map(|w| triangle_area(origin, &w[0], &w[1]))
        .collect();
    let total: f64 = areas.iter().sum();
    if !(total > 0.0) {
        return None;
    }

    let target = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut chosen = None;
    for (i, &area) in areas.iter().enumerate() {
        if area <= 0.0 {
            continue;
        }
        chosen = Some(i);
        cumulative += area;
        if target < cumulative {
            break;
        }
    }

    // `chosen` is the last positive-area triangle when rounding left the target past the end.
    let i = chosen?;
    Some(random_point_on_triangle(origin, &vertices[i + 1], &vertices[i + 2], rng))
}

/// Infinite stream of uniform points on a sphere. Reseeding restarts the sequence.
pub struct SpherePoints {
    radius: f64,
    rng: StdRng,
}

impl SpherePoints {
    pub fn new(radius: f64, seed: u64) -> Self {
        Self { radius, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

impl Iterator for SpherePoints {
    type Item = [f64; 3];

    fn next(&mut self) -> Option<Self::Item> {
        Some(random_point_on_sphere(self.radius, &mut self.rng))
    }
}

/// Infinite stream of uniform points in a cube. Reseeding restarts the sequence.
pub struct CubePoints {
    halfwidth: f64,
    rng: StdRng,
}

impl CubePoints {
    pub fn new(halfwidth: f64, seed: u64) -> Self {
        Self { halfwidth, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

impl Iterator for CubePoints {
    type Item = [f64; 3];

    fn next(&mut self) -> Option<Self::Item> {
        Some(random_point_in_cube(self.halfwidth, &mut self.rng))
    }
}
