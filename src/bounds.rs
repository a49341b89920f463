/// Axis-aligned bounding box in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// An inverted box that any point will extend.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Smallest box enclosing all `points`. Returns [`BoundingBox::empty`] for no points.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a [f64; 3]>,
    {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(p);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn extend(&mut self, p: &[f64; 3]) {
        for i in 0..3 {
            if p[i] < self.min[i] { self.min[i] = p[i]; }
            if p[i] > self.max[i] { self.max[i] = p[i]; }
        }
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        self.extend(&other.min);
        self.extend(&other.max);
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Index of the longest axis.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e[0] >= e[1] && e[0] >= e[2] {
            0
        } else if e[1] >= e[2] {
            1
        } else {
            2
        }
    }

    /// The eight corners, ordered by the bits of the index (bit 0 = x, bit 1 = y, bit 2 = z).
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let mut corners = [[0.0; 3]; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            for axis in 0..3 {
                corner[axis] = if i & (1 << axis) == 0 { self.min[axis] } else { self.max[axis] };
            }
        }
        corners
    }

    /// Slab test against a ray. Returns the entry distance if the ray hits the box
    /// no further than `max_t`.
    pub(crate) fn ray_entry(&self, origin: &[f64; 3], inv_dir: &[f64; 3], max_t: f64) -> Option<f64> {
        let mut t_min: f64 = 0.0;
        let mut t_max = max_t;
        for i in 0..3 {
            // Parallel to this slab: inside it for every t, or never.
            if inv_dir[i].is_infinite() {
                if origin[i] < self.min[i] || origin[i] > self.max[i] {
                    return None;
                }
                continue;
            }
            let t0 = (self.min[i] - origin[i]) * inv_dir[i];
            let t1 = (self.max[i] - origin[i]) * inv_dir[i];
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            if near > t_min { t_min = near; }
            if far < t_max { t_max = far; }
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_and_center() {
        let b = BoundingBox::new([-1.0, -2.0, -3.0], [1.0, 2.0, 3.0]);
        let corners = b.corners();
        assert_eq!(corners[0], [-1.0, -2.0, -3.0]);
        assert_eq!(corners[7], [1.0, 2.0, 3.0]);
        assert_eq!(corners[1], [1.0, -2.0, -3.0]);
        assert_eq!(b.center(), [0.0, 0.0, 0.0]);
        assert_eq!(b.longest_axis(), 2);
    }

    #[test]
    fn test_from_points() {
        let pts = [[0.0, 1.0, 2.0], [-1.0, 5.0, 0.5]];
        let b = BoundingBox::from_points(pts.iter());
        assert_eq!(b.min, [-1.0, 1.0, 0.5]);
        assert_eq!(b.max, [0.0, 5.0, 2.0]);
        assert!(BoundingBox::from_points(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_ray_entry() {
        let b = BoundingBox::new([-1.0; 3], [1.0; 3]);
        let inv = [1.0 / 1.0, 1.0 / 0.0, 1.0 / 0.0];
        let t = b.ray_entry(&[-5.0, 0.0, 0.0], &inv, f64::INFINITY).expect("ray should hit");
        assert!((t - 4.0).abs() < 1e-12);
        assert!(b.ray_entry(&[-5.0, 3.0, 0.0], &inv, f64::INFINITY).is_none());
        assert!(b.ray_entry(&[-5.0, 0.0, 0.0], &inv, 2.0).is_none());
    }

    #[test]
    fn test_ray_entry_along_box_face() {
        let b = BoundingBox::new([-1.0; 3], [1.0; 3]);
        let inv = [1.0 / 0.0, 1.0 / 0.0, 1.0 / 1.0];
        // Origins on the min and max planes of both parallel axes.
        for origin in [[-1.0, 0.0, -5.0], [1.0, 1.0, -5.0], [0.0, -1.0, 0.5]] {
            assert!(b.ray_entry(&origin, &inv, f64::INFINITY).is_some(), "{:?} should hit", origin);
        }
        let t = b.ray_entry(&[1.0, -1.0, -5.0], &inv, f64::INFINITY).expect("edge ray should hit");
        assert!((t - 4.0).abs() < 1e-12);
        let neg = [-1.0 / 0.0, 1.0 / 0.0, 1.0];
        assert!(b.ray_entry(&[-1.0, 1.0, -5.0], &neg, f64::INFINITY).is_some());
        assert!(b.ray_entry(&[1.0 + 1e-9, 0.0, -5.0], &inv, f64::INFINITY).is_none());
    }
}
