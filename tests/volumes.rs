use meshcloud::{Bvh, Containment, Mesh, RayParity, Sampler, SamplingConfig, SingleRay, Strategy, VOLUME_PADDING};

const SAMPLES: usize = 4000;

macro_rules! test_volume {
    ($test_name:ident, $mesh:expr, $tolerance:expr) => {
        #[test]
        fn $test_name() {
            let mesh: Mesh = $mesh;
            let mut sampler = Sampler::new(&mesh, SamplingConfig::new(SAMPLES, 7, Strategy::Volume)).unwrap();
            let data = sampler.run_to_end().unwrap();
            assert_eq!(data.len(), SAMPLES);

            // Acceptance rate times the candidate cube volume estimates the enclosed volume.
            let side = 2.0 * mesh.bounding_halfwidth() * VOLUME_PADDING;
            let estimate = side.powi(3) * SAMPLES as f64 / sampler.attempts() as f64;
            let expected = mesh.volume();

            let error = (estimate - expected).abs() / expected;
            println!("{} Volume: Got {:.4}, Expected {:.4}, Error {:.4}%", stringify!($test_name), estimate, expected, error * 100.0);
            assert!(error < $tolerance, "Volume error too high: {:.4}%", error * 100.0);
        }
    };
}

test_volume!(test_cube_volume, Mesh::cube([0.0, 0.0, 0.0], 1.0), 0.05);
test_volume!(test_offset_cube_volume, Mesh::cube([0.5, 0.5, 0.5], 0.5), 0.06);
test_volume!(test_tetrahedron_volume, Mesh::tetrahedron([0.0, 0.0, 0.0], 1.0), 0.06);
test_volume!(test_octahedron_volume, Mesh::octahedron([0.0, 0.0, 0.0], 1.0), 0.06);

fn assert_agrees(mesh: &Mesh, containment: &dyn Containment, points: &[[f64; 3]], inside: bool) {
    let bvh = Bvh::from_mesh(mesh);
    for p in points {
        assert_eq!(containment.contains(&bvh, *p), inside, "{:?} at {:?}", containment, p);
    }
}

#[test]
fn test_classifiers_agree_on_convex_mesh() {
    let mesh = Mesh::octahedron([0.0, 0.0, 0.0], 1.0);
    let inside = [[0.1, 0.1, 0.1], [0.02, 0.05, 0.9], [-0.3, 0.2, -0.2], [0.45, -0.45, 0.05]];
    let outside = [[0.5, 0.5, 0.5], [1.2, 0.0, 0.0], [-0.4, -0.4, -0.4]];

    let parity = RayParity::default();
    let single = SingleRay::default();
    assert_agrees(&mesh, &parity, &inside, true);
    assert_agrees(&mesh, &parity, &outside, false);
    assert_agrees(&mesh, &single, &inside, true);
    assert_agrees(&mesh, &single, &outside, false);
}

#[test]
fn test_exit_normals_face_away_from_point() {
    let mesh = Mesh::tetrahedron([1.0, 1.0, 1.0], 1.0);
    let bvh = Bvh::from_mesh(&mesh);
    let parity = RayParity::new([1.0, 1.0, 1.0]);
    for p in [[1.1, 1.0, 0.9], [0.9, 1.05, 1.0], [1.0, 0.8, 1.1]] {
        let crossing = parity.classify(&bvh, p).expect("point is inside");
        let to_exit = [crossing.point[0] - p[0], crossing.point[1] - p[1], crossing.point[2] - p[2]];
        let along = to_exit[0] * crossing.normal[0] + to_exit[1] * crossing.normal[1] + to_exit[2] * crossing.normal[2];
        assert!(along > 0.0);
    }
}

#[test]
fn test_offset_mesh_volume_points_stay_inside() {
    let mesh = Mesh::cube([5.0, 0.0, 0.0], 1.0);
    let data = meshcloud::sample(&mesh, SamplingConfig::new(50, 3, Strategy::Volume)).unwrap();
    for p in data.positions.chunks_exact(3) {
        assert!((4.0..=6.0).contains(&p[0]), "{:?}", p);
        assert!((-1.0..=1.0).contains(&p[1]) && (-1.0..=1.0).contains(&p[2]), "{:?}", p);
    }
}
