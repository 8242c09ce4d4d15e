use std::ops;

/// Three components used both as a point/direction and as a linear RGB color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Colors share the vector representation, components are expected in `[0, inf)`.
pub type Color = Vec3;

impl From<[f64; 3]> for Vec3 {
    #[inline(always)]
    fn from(value: [f64; 3]) -> Self {
        Vec3::new(value[0], value[1], value[2])
    }
}

impl ops::Add<Vec3> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl ops::AddAssign<Vec3> for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl ops::Sub<Vec3> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl ops::Neg for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Vec3 {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl ops::Mul<f64> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: f64) -> Self::Output {
        Vec3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

/// Componentwise product, used to filter a color through an albedo.
impl ops::Mul<Vec3> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x * rhs.x,
            y: self.y * rhs.y,
            z: self.z * rhs.z,
        }
    }
}

impl ops::Div<f64> for Vec3 {
    type Output = Self;

    #[inline(always)]
    fn div(self, rhs: f64) -> Self::Output {
        Vec3 {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}

impl std::iter::Sum for Vec3 {
    fn sum<I: Iterator<Item = Vec3>>(iter: I) -> Self {
        iter.fold(Vec3::zero(), |acc, v| acc + v)
    }
}

impl Vec3 {
    #[inline(always)]
    pub fn zero() -> Vec3 {
        Vec3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    #[inline(always)]
    pub fn one() -> Vec3 {
        Vec3 {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }

    #[inline(always)]
    pub fn y_axis() -> Vec3 {
        Vec3 {
            x: 0.0,
            y: 1.0,
            z: 0.0,
        }
    }

    #[inline(always)]
    pub fn z_axis() -> Vec3 {
        Vec3 {
            x: 0.0,
            y: 0.0,
            z: 1.0,
        }
    }

    #[inline(always)]
    pub fn new(x: f64, y: f64, z: f64) -> Vec3 {
        Vec3 { x, y, z }
    }

    #[inline(always)]
    pub fn dot(self: &Self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline(always)]
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline(always)]
    pub fn squared_len(self) -> f64 {
        self.dot(self)
    }

    #[inline(always)]
    pub fn len(self) -> f64 {
        let squared_len = self.squared_len();
        squared_len.sqrt()
    }

    /// Divides by the magnitude. The caller guarantees a non zero length,
    /// a degenerate vector yields NaN components.
    #[inline(always)]
    pub fn normalize(self: &Self) -> Vec3 {
        *self / self.len()
    }

    /// Mirror `self` around `normal`: `-self + 2 (n . self) n`.
    /// Both vectors point away from the surface.
    #[inline(always)]
    pub fn reflect(self, normal: Vec3) -> Vec3 {
        -self + normal * 2.0 * normal.dot(self)
    }

    /// Mean of the three components, a cheap brightness measure for colors.
    #[inline(always)]
    pub fn average(self) -> f64 {
        (self.x + self.y + self.z) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(
            (a - b).len() < TOLERANCE,
            "expected {:?} to be close to {:?}",
            a,
            b
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let directions = [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-0.3, 0.0, 7.5),
            Vec3::new(1e-3, -4e-3, 2e-3),
            Vec3::new(-120.0, 55.0, -0.25),
        ];
        for direction in directions {
            let unit = direction.normalize();
            assert!((unit.len() - 1.0).abs() < TOLERANCE);
            assert_close(unit.normalize(), unit);
        }
    }

    #[test]
    fn cross_product_follows_right_hand_rule() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        assert_close(x.cross(Vec3::y_axis()), Vec3::z_axis());
        assert_close(Vec3::y_axis().cross(x), -Vec3::z_axis());
    }

    #[test]
    fn componentwise_and_scalar_products() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(0.5, 0.0, -1.0);
        assert_close(a * b, Vec3::new(0.5, 0.0, -3.0));
        assert_close(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.dot(b), -2.5);
    }

    #[test]
    fn reflect_keeps_angle_with_normal() {
        let normal = Vec3::y_axis();
        let wo = Vec3::new(1.0, 1.0, 0.0).normalize();
        let wi = wo.reflect(normal);
        assert_close(wi, Vec3::new(-1.0, 1.0, 0.0).normalize());
        assert!((wi.dot(normal) - wo.dot(normal)).abs() < TOLERANCE);
    }

    #[test]
    fn sum_of_colors() {
        let total: Vec3 = vec![Vec3::one(), Vec3::new(1.0, 0.0, 2.0)].into_iter().sum();
        assert_close(total, Vec3::new(2.0, 1.0, 3.0));
        assert_eq!(total.average(), 2.0);
    }
}
