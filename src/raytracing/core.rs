use super::material::Material;
use super::math::{Color, Ray, Vec3};

/// Minimum accepted hit distance, rays spawned on a surface must not hit it again.
pub const EPSILON: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
    pub material: Material,
}

#[derive(Clone, Copy, Debug)]
pub struct HitResult {
    pub t: f64,
    pub normal: Vec3,
}

pub struct RaycastResult<'a> {
    pub hitted_object: &'a Sphere,
    pub hit_point: Vec3,
    pub normal: Vec3,
}

/// Read only collection of spheres, queried with a linear scan.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<Sphere>,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64, material: Material) -> Self {
        Sphere {
            center,
            radius,
            material,
        }
    }

    /// Geometric ray/sphere test. Returns the closest root farther than `EPSILON`,
    /// so a ray starting inside the sphere reports the far side.
    pub fn intersect(&self, ray: &Ray) -> Option<HitResult> {
        let op = self.center - ray.origin;
        let b = op.dot(ray.direction);
        let discriminant = b * b - op.dot(op) + self.radius * self.radius;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        [b - root, b + root]
            .into_iter()
            .find(|t| *t > EPSILON)
            .map(|t| HitResult {
                t,
                normal: self.normal_at(ray.at(t)),
            })
    }

    fn normal_at(&self, point: Vec3) -> Vec3 {
        ((point - self.center) / self.radius).normalize()
    }
}

impl Scene {
    pub fn new(objects: Vec<Sphere>) -> Self {
        Scene { objects }
    }

    /// Finds the closest sphere along the ray. On an exact tie the first sphere
    /// in the list wins.
    pub fn intersect_nearest<'a>(&'a self, ray: &Ray) -> Option<RaycastResult<'a>> {
        let mut closest: Option<(&Sphere, HitResult)> = None;
        for object in &self.objects {
            if let Some(result) = object.intersect(ray) {
                let closer = match closest {
                    Some((_, best)) => result.t < best.t,
                    None => true,
                };
                if closer {
                    closest = Some((object, result));
                }
            }
        }

        closest.map(|(object, result)| RaycastResult {
            hitted_object: object,
            hit_point: ray.at(result.t),
            normal: result.normal,
        })
    }

    /// A closed box built out of six huge spheres, lit from the top, holding a
    /// blue diffuse ball and a mirror ball.
    pub fn cornell_box() -> Self {
        const DISPLACEMENT: f64 = 520.0;
        const WALL_RADIUS: f64 = 500.0;
        let white = Color::one();
        let wall = |center: Vec3, material: Material| Sphere::new(center, WALL_RADIUS, material);
        let diffuse = |albedo: Color| Material::Diffuse { albedo };

        Scene::new(vec![
            // top
            wall(
                Vec3::new(0.0, -DISPLACEMENT, 0.0),
                Material::Emissive {
                    radiance: Color::new(1.0, 0.9, 0.7) * 0.8,
                },
            ),
            // front
            wall(Vec3::new(0.0, 0.0, DISPLACEMENT), diffuse(white)),
            // back
            wall(Vec3::new(0.0, 0.0, -DISPLACEMENT), diffuse(white)),
            // bottom
            wall(Vec3::new(0.0, DISPLACEMENT, 0.0), diffuse(white)),
            // left
            wall(
                Vec3::new(-DISPLACEMENT, 0.0, 0.0),
                diffuse(Color::new(0.0, 1.0, 0.0)),
            ),
            // right
            wall(
                Vec3::new(DISPLACEMENT, 0.0, 0.0),
                diffuse(Color::new(1.0, 0.0, 0.0)),
            ),
            Sphere::new(
                Vec3::new(-6.0, 0.0, 20.0),
                6.0,
                diffuse(Color::new(0.0, 0.0, 1.0)),
            ),
            Sphere::new(
                Vec3::new(8.0, 0.0, 20.0),
                8.0,
                Material::Specular { albedo: white },
            ),
        ])
    }
}
