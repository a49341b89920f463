use meshcloud::geometry::{random_point_in_cube, random_point_on_sphere};
use meshcloud::{Bvh, Mesh};
use rand::prelude::*;
use rand::rngs::StdRng;

/// Nearest hit by testing every triangle on its own.
fn brute_force(triangles: &[[[f64; 3]; 3]], origin: [f64; 3], dir: [f64; 3]) -> Option<f64> {
    triangles
        .iter()
        .filter_map(|t| Bvh::build(&[*t]).raycast(origin, dir))
        .map(|hit| hit.distance)
        .min_by(f64::total_cmp)
}

fn random_soup(count: usize, rng: &mut StdRng) -> Vec<[[f64; 3]; 3]> {
    (0..count)
        .map(|_| {
            let anchor = random_point_in_cube(5.0, rng);
            let mut tri = [anchor; 3];
            for v in tri.iter_mut().skip(1) {
                let offset = random_point_in_cube(0.8, rng);
                *v = [anchor[0] + offset[0], anchor[1] + offset[1], anchor[2] + offset[2]];
            }
            tri
        })
        .collect()
}

fn compare(triangles: &[[[f64; 3]; 3]], rays: usize, seed: u64) {
    let bvh = Bvh::build(triangles);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hits = 0;
    for _ in 0..rays {
        let origin = random_point_in_cube(6.0, &mut rng);
        let dir = random_point_on_sphere(1.0, &mut rng);
        let expected = brute_force(triangles, origin, dir);
        let got = bvh.raycast(origin, dir).map(|hit| hit.distance);
        match (expected, got) {
            (Some(e), Some(g)) => {
                hits += 1;
                assert!((e - g).abs() < 1e-9, "distance {} vs brute force {}", g, e);
            }
            (None, None) => {}
            (e, g) => panic!("bvh {:?} disagrees with brute force {:?}", g, e),
        }
    }
    assert!(hits > 0, "no ray hit anything; the comparison is vacuous");
}

#[test]
fn test_bvh_matches_brute_force_on_soup() {
    let mut rng = StdRng::seed_from_u64(21);
    let soup = random_soup(500, &mut rng);
    compare(&soup, 2000, 1);
}

#[test]
fn test_bvh_matches_brute_force_on_closed_meshes() {
    for mesh in [
        Mesh::cube([0.5, -1.0, 2.0], 2.0),
        Mesh::tetrahedron([0.0, 0.0, 0.0], 4.0),
        Mesh::octahedron([-1.0, 1.0, 0.0], 3.0),
    ] {
        compare(&mesh.triangles(), 1000, 2);
    }
}

#[test]
fn test_hit_reports_source_triangle() {
    let mesh = Mesh::octahedron([0.0, 0.0, 0.0], 1.0);
    let triangles = mesh.triangles();
    let bvh = Bvh::build(&triangles);
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..200 {
        let dir = random_point_on_sphere(1.0, &mut rng);
        let hit = bvh.raycast([0.0; 3], dir).expect("ray from the center must hit");
        let single = Bvh::build(&[triangles[hit.triangle]])
            .raycast([0.0; 3], dir)
            .expect("reported triangle must be hit");
        assert!((single.distance - hit.distance).abs() < 1e-12);
    }
}

#[test]
fn test_axis_aligned_rays_on_vertex_planes() {
    let dirs = [
        [1.0, 0.0, 0.0], [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0], [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0], [0.0, 0.0, -1.0],
    ];
    let mut rng = StdRng::seed_from_u64(8);
    for mesh in [
        Mesh::cube([0.5, -1.0, 2.0], 2.0),
        Mesh::tetrahedron([0.0, 0.0, 0.0], 4.0),
        Mesh::octahedron([-1.0, 1.0, 0.0], 3.0),
    ] {
        let triangles = mesh.triangles();
        let bvh = Bvh::build(&triangles);
        let center = bvh.bounds().center();
        let mut hits = 0;
        for _ in 0..200 {
            // Pin one or two coordinates to a vertex so the ray runs along node box planes.
            let vertex = triangles[rng.gen_range(0..triangles.len())][rng.gen_range(0..3)];
            let jitter = random_point_in_cube(1.0, &mut rng);
            let mut origin = [center[0] + jitter[0], center[1] + jitter[1], center[2] + jitter[2]];
            for axis in 0..3 {
                if rng.gen_bool(0.6) {
                    origin[axis] = vertex[axis];
                }
            }
            for dir in dirs {
                let expected = brute_force(&triangles, origin, dir);
                let got = bvh.raycast(origin, dir).map(|hit| hit.distance);
                hits += usize::from(expected.is_some());
                assert_eq!(got, expected, "origin {:?} dir {:?}", origin, dir);
            }
        }
        assert!(hits > 0);
    }
}
