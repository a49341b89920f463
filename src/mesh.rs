use crate::bounds::BoundingBox;
use crate::error::{Result, SamplingError};
use crate::geometry::{bounding_halfwidth, bounding_radius, cross, dot, normalize, sub, triangle_area};

/// A read-only polygon mesh: vertex positions plus faces given as vertex index lists.
///
/// Faces are expected to be planar with a counter-clockwise winding seen from outside,
/// and the mesh is expected to be watertight for volume sampling. Neither is validated.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    vertices: Vec<[f64; 3]>,
    faces: Vec<Vec<usize>>,
}

impl Mesh {
    /// Creates a mesh, checking that every face has at least three in-range indices.
    pub fn new(vertices: Vec<[f64; 3]>, faces: Vec<Vec<usize>>) -> Result<Self> {
        for (i, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(SamplingError::InvalidMesh(format!(
                    "face {} has {} vertices",
                    i,
                    face.len()
                )));
            }
            if let Some(&bad) = face.iter().find(|&&v| v >= vertices.len()) {
                return Err(SamplingError::InvalidMesh(format!(
                    "face {} references vertex {} of {}",
                    i,
                    bad,
                    vertices.len()
                )));
            }
        }
        Ok(Self { vertices, faces })
    }

    /// Creates a mesh from flat host arrays.
    ///
    /// # Arguments
    ///
    /// * `positions` - Vertex coordinates [x1, y1, z1, x2, y2, z2, ...].
    /// * `face_sizes` - Number of vertices of each face.
    /// * `indices` - Concatenated vertex indices of all faces.
    pub fn from_flat(positions: &[f64], face_sizes: &[u32], indices: &[u32]) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(SamplingError::InvalidMesh(format!(
                "{} coordinates is not a multiple of 3",
                positions.len()
            )));
        }
        let vertices = positions
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let expected: usize = face_sizes.iter().map(|&n| n as usize).sum();
        if expected != indices.len() {
            return Err(SamplingError::InvalidMesh(format!(
                "face sizes account for {} indices, got {}",
                expected,
                indices.len()
            )));
        }
        let mut faces = Vec::with_capacity(face_sizes.len());
        let mut offset = 0;
        for &n in face_sizes {
            let n = n as usize;
            faces.push(indices[offset..offset + n].iter().map(|&i| i as usize).collect());
            offset += n;
        }
        Self::new(vertices, faces)
    }

    /// Axis-aligned cube with quad faces.
    pub fn cube(center: [f64; 3], halfwidth: f64) -> Self {
        let vertices = (0..8)
            .map(|i| {
                let mut v = center;
                for (axis, c) in v.iter_mut().enumerate() {
                    *c += if i & (1 << axis) == 0 { -halfwidth } else { halfwidth };
                }
                v
            })
            .collect();
        let faces = vec![
            vec![0, 4, 6, 2], // -x
            vec![1, 3, 7, 5], // +x
            vec![0, 1, 5, 4], // -y
            vec![2, 6, 7, 3], // +y
            vec![0, 2, 3, 1], // -z
            vec![4, 5, 7, 6], // +z
        ];
        Self { vertices, faces }
    }

    /// Regular tetrahedron with the given circumradius.
    pub fn tetrahedron(center: [f64; 3], radius: f64) -> Self {
        let s = radius / 3.0f64.sqrt();
        let vertices = [[1.0, 1.0, 1.0], [1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, 1.0]]
            .iter()
            .map(|d| [center[0] + d[0] * s, center[1] + d[1] * s, center[2] + d[2] * s])
            .collect();
        let faces = vec![vec![1, 2, 3], vec![0, 2, 3], vec![0, 1, 3], vec![0, 1, 2]];
        let mut mesh = Self { vertices, faces };
        mesh.orient_outward(&center);
        mesh
    }

    /// Regular octahedron with the given circumradius.
    pub fn octahedron(center: [f64; 3], radius: f64) -> Self {
        let mut vertices = Vec::with_capacity(6);
        for axis in 0..3 {
            for sign in [1.0, -1.0] {
                let mut v = center;
                v[axis] += sign * radius;
                vertices.push(v);
            }
        }
        let mut faces = Vec::with_capacity(8);
        for x in [0, 1] {
            for y in [2, 3] {
                for z in [4, 5] {
                    faces.push(vec![x, y, z]);
                }
            }
        }
        let mut mesh = Self { vertices, faces };
        mesh.orient_outward(&center);
        mesh
    }

    /// Flips faces of a star-shaped mesh so their normals point away from `center`.
    fn orient_outward(&mut self, center: &[f64; 3]) {
        for i in 0..self.faces.len() {
            let outward = sub(&self.face_center(i), center);
            if dot(&self.face_area_vector(i), &outward) < 0.0 {
                self.faces[i].reverse();
            }
        }
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions of face `index`, in winding order.
    pub fn face_vertices(&self, index: usize) -> Vec<[f64; 3]> {
        self.faces[index].iter().map(|&v| self.vertices[v]).collect()
    }

    /// Sum of the fan triangles' cross products; its length is twice the face area.
    fn face_area_vector(&self, index: usize) -> [f64; 3] {
        let face = &self.faces[index];
        let origin = &self.vertices[face[0]];
        let mut n = [0.0; 3];
        for w in face[1..].windows(2) {
            let c = cross(&sub(&self.vertices[w[0]], origin), &sub(&self.vertices[w[1]], origin));
            n[0] += c[0];
            n[1] += c[1];
            n[2] += c[2];
        }
        n
    }

    /// Area of face `index`, summed over its fan triangulation.
    pub fn face_area(&self, index: usize) -> f64 {
        let face = &self.faces[index];
        let origin = &self.vertices[face[0]];
        face[1..]
            .windows(2)
            .map(|w| triangle_area(origin, &self.vertices[w[0]], &self.vertices[w[1]]))
            .sum()
    }

    /// Unit normal of face `index` from its winding, or zero for a degenerate face.
    pub fn face_normal(&self, index: usize) -> [f64; 3] {
        normalize(&self.face_area_vector(index)).unwrap_or([0.0; 3])
    }

    /// Mean of the face's vertex positions.
    pub fn face_center(&self, index: usize) -> [f64; 3] {
        let face = &self.faces[index];
        let mut c = [0.0; 3];
        for &v in face {
            for axis in 0..3 {
                c[axis] += self.vertices[v][axis];
            }
        }
        let n = face.len() as f64;
        [c[0] / n, c[1] / n, c[2] / n]
    }

    pub fn total_area(&self) -> f64 {
        (0..self.faces.len()).map(|i| self.face_area(i)).sum()
    }

    /// Enclosed volume by the divergence theorem. Only meaningful for closed, consistently wound meshes.
    pub fn volume(&self) -> f64 {
        self.triangles()
            .iter()
            .map(|[a, b, c]| dot(a, &cross(b, c)) / 6.0)
            .sum()
    }

    /// Fan triangulation of every face, in face order.
    pub fn triangles(&self) -> Vec<[[f64; 3]; 3]> {
        let mut triangles = Vec::with_capacity(self.faces.len() * 2);
        for face in &self.faces {
            let origin = self.vertices[face[0]];
            for w in face[1..].windows(2) {
                triangles.push([origin, self.vertices[w[0]], self.vertices[w[1]]]);
            }
        }
        triangles
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter())
    }

    pub fn bounding_radius(&self) -> f64 {
        bounding_radius(&self.bounding_box())
    }

    pub fn bounding_halfwidth(&self) -> f64 {
        bounding_halfwidth(&self.bounding_box())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_metrics() {
        let cube = Mesh::cube([0.0, 0.0, 0.0], 1.0);
        assert_eq!(cube.face_count(), 6);
        assert!((cube.total_area() - 24.0).abs() < 1e-12);
        assert!((cube.volume() - 8.0).abs() < 1e-12);
        assert_eq!(cube.bounding_halfwidth(), 1.0);

        let expected = [
            [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0], [0.0, 1.0, 0.0],
            [0.0, 0.0, -1.0], [0.0, 0.0, 1.0],
        ];
        for (i, n) in expected.iter().enumerate() {
            assert_eq!(&cube.face_normal(i), n, "face {} normal", i);
        }
    }

    #[test]
    fn test_platonic_volumes() {
        // Tetrahedron with circumradius R has edge a = R * sqrt(8/3) and volume a^3 / (6 sqrt 2).
        let tet = Mesh::tetrahedron([1.0, 2.0, 3.0], 2.0);
        let a = 2.0 * (8.0f64 / 3.0).sqrt();
        let expected = a.powi(3) / (6.0 * 2.0f64.sqrt());
        assert!((tet.volume() - expected).abs() < 1e-9, "tetrahedron volume {}", tet.volume());

        let oct = Mesh::octahedron([0.0, 0.0, 0.0], 1.5);
        let expected = 4.0 / 3.0 * 1.5f64.powi(3);
        assert!((oct.volume() - expected).abs() < 1e-9, "octahedron volume {}", oct.volume());
    }

    #[test]
    fn test_from_flat() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let mesh = Mesh::from_flat(&positions, &[3, 3], &[0, 1, 2, 0, 2, 3]).expect("valid mesh");
        assert_eq!(mesh.face_count(), 2);
        assert!((mesh.total_area() - 1.0).abs() < 1e-12);
        assert_eq!(mesh.face_normal(0), [0.0, 0.0, 1.0]);

        assert!(Mesh::from_flat(&positions, &[3], &[0, 1, 4]).is_err());
        assert!(Mesh::from_flat(&positions, &[2], &[0, 1]).is_err());
        assert!(Mesh::from_flat(&positions, &[3, 3], &[0, 1, 2]).is_err());
        assert!(Mesh::from_flat(&positions[..4], &[], &[]).is_err());
    }

    #[test]
    fn test_degenerate_face_has_no_area_or_normal() {
        let mesh = Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![vec![0, 1, 2]],
        )
        .expect("indices are valid");
        assert_eq!(mesh.face_area(0), 0.0);
        assert_eq!(mesh.face_normal(0), [0.0, 0.0, 0.0]);
        assert_eq!(mesh.face_center(0), [1.0, 0.0, 0.0]);
    }
}
