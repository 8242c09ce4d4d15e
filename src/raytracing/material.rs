use std::f64::consts::{FRAC_1_PI, TAU};

use rand::Rng;

use super::math::{Color, Vec3};

/// Helper axis used to build a tangent frame around a normal, slightly off the
/// y axis so it is never exactly parallel to an axis aligned normal.
const JITTERED_UP: Vec3 = Vec3 {
    x: 0.00319,
    y: 1.0,
    z: 0.0078,
};

/// Exponent of the cosine lobe used for diffuse sampling, 0 gives a pure cosine distribution.
const DIFFUSE_EXPONENT: f64 = 0.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    /// Lambertian reflector.
    Diffuse { albedo: Color },
    /// Perfect mirror.
    Specular { albedo: Color },
    /// Diffuse surface that also emits `radiance`, which doubles as its albedo.
    Emissive { radiance: Color },
}

/// A sampled incoming direction together with its probability density.
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub wi: Vec3,
    pub pdf: f64,
}

impl Material {
    /// BRDF value for the pair of directions, both pointing away from the surface.
    pub fn f(&self, _wi: Vec3, _wo: Vec3, _normal: Vec3) -> Color {
        match *self {
            Material::Diffuse { albedo } => albedo * FRAC_1_PI,
            Material::Emissive { radiance } => radiance * FRAC_1_PI,
            Material::Specular { albedo } => albedo,
        }
    }

    /// Importance samples an incoming direction. `normal` must already be
    /// oriented on the side of `wo`.
    pub fn sample_f<R: Rng>(&self, normal: Vec3, wo: Vec3, rng: &mut R) -> Sample {
        match self {
            Material::Diffuse { .. } | Material::Emissive { .. } => {
                let wi = oriented_hemisphere_dir(rng.gen(), rng.gen(), normal, DIFFUSE_EXPONENT);
                let pdf = normal.dot(wi).max(0.0) * FRAC_1_PI;
                Sample { wi, pdf }
            }
            Material::Specular { .. } => {
                let wi = wo.reflect(normal).normalize();
                // a mirror is a delta distribution, the cosine stands in for it
                let pdf = normal.dot(wi);
                Sample { wi, pdf }
            }
        }
    }

    pub fn emission(&self) -> Color {
        match *self {
            Material::Emissive { radiance } => radiance,
            _ => Color::zero(),
        }
    }
}

/// Flips `normal` so it lies in the same hemisphere as `wo`.
pub fn orient_normal(normal: Vec3, wo: Vec3) -> Vec3 {
    if normal.dot(wo) < 0.0 {
        -normal
    } else {
        normal
    }
}

/// Point on the +z unit hemisphere distributed as `cos(theta)^exp`.
fn sample_hemisphere(u1: f64, u2: f64, exp: f64) -> Vec3 {
    let z = (1.0 - u1).powf(1.0 / (exp + 1.0));
    let phi = TAU * u2;
    let sin_theta = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), z)
}

/// Samples the hemisphere and maps it into a frame whose z axis is `normal`.
fn oriented_hemisphere_dir(u1: f64, u2: f64, normal: Vec3, exp: f64) -> Vec3 {
    let p = sample_hemisphere(u1, u2, exp);
    let w = normal;
    let v = JITTERED_UP.cross(w).normalize();
    let u = v.cross(w).normalize();
    (u * p.x + v * p.y + w * p.z).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn diffuse_samples_stay_in_the_hemisphere() {
        let mut rng = StdRng::seed_from_u64(7);
        let material = Material::Diffuse {
            albedo: Color::one(),
        };
        let normals = [
            Vec3::y_axis(),
            -Vec3::y_axis(),
            Vec3::new(0.3, -0.2, 0.9).normalize(),
        ];
        for normal in normals {
            for _ in 0..10_000 {
                let wo = Vec3::new(rng.gen(), rng.gen(), rng.gen()) + normal;
                let wo = wo.normalize();
                let normal = orient_normal(normal, wo);
                let Sample { wi, pdf } = material.sample_f(normal, wo, &mut rng);
                assert!(normal.dot(wi) >= 0.0, "{:?} below {:?}", wi, normal);
                assert!((wi.len() - 1.0).abs() < TOLERANCE);
                assert!(pdf >= 0.0);
            }
        }
    }

    #[test]
    fn diffuse_pdf_matches_cosine() {
        let mut rng = StdRng::seed_from_u64(11);
        let normal = Vec3::z_axis();
        let material = Material::Emissive {
            radiance: Color::one(),
        };
        for _ in 0..100 {
            let sample = material.sample_f(normal, normal, &mut rng);
            assert!((sample.pdf - sample.wi.dot(normal) * FRAC_1_PI).abs() < TOLERANCE);
        }
    }

    #[test]
    fn specular_sample_is_a_pure_reflection() {
        let mut rng = StdRng::seed_from_u64(3);
        let material = Material::Specular {
            albedo: Color::one(),
        };
        for _ in 0..1000 {
            let normal = Vec3::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5, 1.0).normalize();
            let wo = Vec3::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5, 0.5).normalize();
            let normal = orient_normal(normal, wo);
            let Sample { wi, pdf } = material.sample_f(normal, wo, &mut rng);
            assert!((wi.dot(normal) - wo.dot(normal)).abs() < TOLERANCE);
            assert!((pdf - wi.dot(normal)).abs() < TOLERANCE);
            // the tangential part flips
            let tangent_wo = wo - normal * wo.dot(normal);
            let tangent_wi = wi - normal * wi.dot(normal);
            assert!((tangent_wo + tangent_wi).len() < TOLERANCE);
        }
    }

    #[test]
    fn lambertian_brdf_is_constant() {
        let albedo = Color::new(0.2, 0.4, 0.8);
        let material = Material::Diffuse { albedo };
        let value = material.f(Vec3::z_axis(), Vec3::y_axis(), Vec3::z_axis());
        assert!((value - albedo * FRAC_1_PI).len() < TOLERANCE);
        assert_eq!(material.emission(), Color::zero());
    }

    #[test]
    fn emissive_reports_its_radiance() {
        let radiance = Color::new(0.8, 0.72, 0.56);
        let material = Material::Emissive { radiance };
        assert_eq!(material.emission(), radiance);
        let value = material.f(Vec3::z_axis(), Vec3::z_axis(), Vec3::z_axis());
        assert!((value - radiance * FRAC_1_PI).len() < TOLERANCE);
    }

    #[test]
    fn orient_normal_faces_outgoing_direction() {
        let normal = Vec3::z_axis();
        assert_eq!(orient_normal(normal, Vec3::new(0.0, 0.3, 1.0)), normal);
        assert_eq!(orient_normal(normal, Vec3::new(0.0, 0.3, -1.0)), -normal);
    }

    #[test]
    fn hemisphere_sample_endpoints() {
        let top = sample_hemisphere(0.0, 0.25, DIFFUSE_EXPONENT);
        assert!((top - Vec3::z_axis()).len() < TOLERANCE);
        let horizon = sample_hemisphere(1.0 - 1e-12, 0.0, DIFFUSE_EXPONENT);
        assert!(horizon.z < 1e-5);
        assert!((horizon.len() - 1.0).abs() < TOLERANCE);
    }
}
