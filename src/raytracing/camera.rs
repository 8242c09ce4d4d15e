use super::math::{Ray, Vec3};

pub const DEFAULT_VIEW_DISTANCE: f64 = 400.0;

/// Orthonormal frame derived from the camera parameters.
#[derive(Debug, Clone, Copy)]
struct Basis {
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

/// Pinhole camera. The view distance is expressed in pixels, so together with the
/// image size it defines the field of view.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    focal_point: Vec3,
    view_distance: f64,
    up: Vec3,
    basis: Basis,
}

impl Camera {
    /// The eye must differ from the focal point and `up` must not be parallel
    /// to the viewing direction.
    pub fn new(eye: Vec3, focal_point: Vec3, view_distance: f64, up: Vec3) -> Self {
        let mut camera = Self {
            eye,
            focal_point,
            view_distance,
            up,
            basis: Basis {
                u: Vec3::zero(),
                v: Vec3::zero(),
                w: Vec3::zero(),
            },
        };
        camera.calc_basis();
        camera
    }

    /// Creates a camera that looks at a specific point from a specific position,
    /// with the default view distance and +y as up.
    pub fn look_at(eye: Vec3, focal_point: Vec3) -> Self {
        Self::new(eye, focal_point, DEFAULT_VIEW_DISTANCE, Vec3::y_axis())
    }

    /// Recomputes the cached basis, right-handed with `w` pointing back toward the viewer.
    pub fn calc_basis(&mut self) {
        let w = (self.eye - self.focal_point).normalize();
        let u = self.up.cross(w).normalize();
        // already unit length, u and w are orthonormal
        let v = w.cross(u);
        self.basis = Basis { u, v, w };
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.calc_basis();
    }

    pub fn set_view_distance(&mut self, view_distance: f64) {
        self.view_distance = view_distance;
    }

    /// Create a ray from the eye through the image plane offset `(sx, sy)`,
    /// measured in pixels from the image center.
    pub fn spawn_ray(&self, sx: f64, sy: f64) -> Ray {
        let Basis { u, v, w } = self.basis;
        let direction = u * sx + v * sy - w * self.view_distance;
        Ray::new(self.eye, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn basis_is_orthonormal() {
        let camera = Camera::new(
            Vec3::new(1.0, 2.0, -7.0),
            Vec3::new(-0.5, 0.25, 3.0),
            120.0,
            Vec3::y_axis(),
        );
        let Basis { u, v, w } = camera.basis;
        for axis in [u, v, w] {
            assert!((axis.len() - 1.0).abs() < TOLERANCE);
        }
        assert!(u.dot(v).abs() < TOLERANCE);
        assert!(u.dot(w).abs() < TOLERANCE);
        assert!(v.dot(w).abs() < TOLERANCE);
    }

    #[test]
    fn center_ray_points_at_focal_point() {
        let camera = Camera::new(
            Vec3::new(0.0, 0.0, -20.0),
            Vec3::zero(),
            400.0,
            Vec3::y_axis(),
        );
        let ray = camera.spawn_ray(0.0, 0.0);
        assert!((ray.origin - Vec3::new(0.0, 0.0, -20.0)).len() < TOLERANCE);
        assert!((ray.direction - Vec3::z_axis()).len() < TOLERANCE);
    }

    #[test]
    fn offsets_tilt_the_ray() {
        let camera = Camera::look_at(Vec3::zero(), Vec3::z_axis());
        let ray = camera.spawn_ray(0.0, 400.0);
        // 45 degrees along the v axis
        assert!((ray.direction.z - 0.5_f64.sqrt()).abs() < TOLERANCE);
        assert!((ray.direction.len() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn changing_up_refreshes_the_basis() {
        let mut camera = Camera::look_at(Vec3::zero(), Vec3::z_axis());
        camera.set_up(Vec3::new(1.0, 0.0, 0.0));
        camera.set_view_distance(1.0);
        let ray = camera.spawn_ray(0.0, 1.0);
        // v now follows the x axis
        assert!((ray.direction - Vec3::new(1.0, 0.0, 1.0).normalize()).len() < TOLERANCE);
    }
}
