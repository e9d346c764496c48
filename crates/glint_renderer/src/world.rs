//! Scene container: primitive arena plus optional BVH.

use crate::{Bvh, HitRecord, Material, Primitive, Sphere};
use glint_math::{random_vec3, Color, Interval, Point3, Ray, Vec3};
use rand::{Rng, RngCore};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from id-based scene edits.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("No object with id {0}")]
    UnknownObject(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Every primitive in the scene, stored in insertion order.
///
/// A world is either flat (queries scan the list) or accelerated (queries go
/// through a [`Bvh`]). Primitives keep their arena index for life, so ids map
/// straight to slots.
#[derive(Debug, Clone, Default)]
pub struct World {
    primitives: Vec<Primitive>,
    bvh: Option<Bvh>,
    index: HashMap<String, usize>,
}

impl World {
    /// Empty flat world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat world over the given primitives.
    pub fn flat(primitives: Vec<Primitive>) -> Self {
        let index = Self::index_of(&primitives);
        Self {
            primitives,
            bvh: None,
            index,
        }
    }

    /// BVH-accelerated world over the given primitives.
    pub fn with_bvh(primitives: Vec<Primitive>, rng: &mut dyn RngCore) -> Self {
        let bvh = Bvh::build(&primitives, rng);
        let index = Self::index_of(&primitives);
        Self {
            primitives,
            bvh: Some(bvh),
            index,
        }
    }

    fn index_of(primitives: &[Primitive]) -> HashMap<String, usize> {
        primitives
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id().to_string(), i))
            .collect()
    }

    /// Add an object and return its id.
    ///
    /// Accelerated worlds join it to the tree under a new root; call
    /// [`World::rebuild`] after many insertions to rebalance.
    pub fn add(&mut self, object: impl Into<Primitive>) -> String {
        let object = object.into();
        let id = object.id().to_string();
        let slot = self.primitives.len();

        self.index.insert(id.clone(), slot);
        self.primitives.push(object);
        if let Some(bvh) = &mut self.bvh {
            bvh.insert(&self.primitives, slot);
        }
        id
    }

    /// Rebuild (or create) the BVH from scratch.
    pub fn rebuild(&mut self, rng: &mut dyn RngCore) {
        self.bvh = Some(Bvh::build(&self.primitives, rng));
    }

    /// Nearest hit with `t` in `[t_min, t_max]`.
    pub fn hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        match &self.bvh {
            Some(bvh) => bvh.hit(&self.primitives, ray, Interval::new(t_min, t_max)),
            None => self.hit_linear(ray, t_min, t_max),
        }
    }

    /// Nearest hit by scanning every primitive, ignoring the BVH.
    pub fn hit_linear(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<HitRecord<'_>> {
        let mut closest_so_far = t_max;
        let mut result = None;

        for object in &self.primitives {
            if let Some(rec) = object.hit(ray, Interval::new(t_min, closest_so_far)) {
                closest_so_far = rec.t;
                result = Some(rec);
            }
        }
        result
    }

    /// Move the object with the given id by `offset`.
    ///
    /// BVH boxes are refitted so later queries see the new position.
    pub fn translate_by_id(&mut self, id: &str, offset: Vec3) -> SceneResult<()> {
        let slot = *self
            .index
            .get(id)
            .ok_or_else(|| SceneError::UnknownObject(id.to_string()))?;

        self.primitives[slot].translate(offset);
        if let Some(bvh) = &mut self.bvh {
            bvh.refit(&self.primitives);
        }
        log::debug!("Translated {} by {:?}", id, offset);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Primitive> {
        self.index.get(id).map(|&slot| &self.primitives[slot])
    }

    /// All ids, depth-first through the BVH (or in list order when flat).
    pub fn list_ids(&self) -> Vec<String> {
        match &self.bvh {
            Some(bvh) => bvh
                .primitive_order()
                .into_iter()
                .map(|i| self.primitives[i].id().to_string())
                .collect(),
            None => self.primitives.iter().map(|p| p.id().to_string()).collect(),
        }
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn is_accelerated(&self) -> bool {
        self.bvh.is_some()
    }

    /// Ground plane, a field of small random spheres and three large ones.
    pub fn random_scene(rng: &mut dyn RngCore) -> Self {
        let mut objects: Vec<Primitive> = Vec::new();

        // Ground
        objects.push(
            Sphere::new(
                Point3::new(0.0, -1000.0, 0.0),
                1000.0,
                Arc::new(Material::diffuse(Color::new(0.5, 0.5, 0.5))),
            )
            .into(),
        );

        for a in -11..11 {
            for b in -11..11 {
                let choose_mat: f64 = rng.gen();
                let center = Point3::new(
                    a as f64 + 0.9 * rng.gen::<f64>(),
                    0.2,
                    b as f64 + 0.9 * rng.gen::<f64>(),
                );

                if (center - Point3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                    continue;
                }

                let material = if choose_mat < 0.8 {
                    // Diffuse
                    let albedo = random_vec3(rng, 0.0, 1.0) * random_vec3(rng, 0.0, 1.0);
                    Material::diffuse(albedo)
                } else if choose_mat < 0.95 {
                    // Metal
                    let albedo = random_vec3(rng, 0.5, 1.0);
                    Material::metallic(albedo, rng.gen_range(0.0..0.5))
                } else {
                    // Glass
                    Material::dielectric(1.5)
                };
                objects.push(Sphere::new(center, 0.2, Arc::new(material)).into());
            }
        }

        objects.push(
            Sphere::new(Point3::new(0.0, 1.0, 0.0), 1.0, Arc::new(Material::dielectric(1.5))).into(),
        );
        objects.push(
            Sphere::new(
                Point3::new(-4.0, 1.0, 0.0),
                1.0,
                Arc::new(Material::diffuse(Color::new(0.4, 0.2, 0.1))),
            )
            .into(),
        );
        objects.push(
            Sphere::new(
                Point3::new(4.0, 1.0, 0.0),
                1.0,
                Arc::new(Material::metallic(Color::new(0.7, 0.6, 0.5), 0.05)),
            )
            .into(),
        );

        log::info!("Built random scene with {} objects", objects.len());
        Self::with_bvh(objects, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Triangle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grey() -> Arc<Material> {
        Arc::new(Material::diffuse(Color::splat(0.5)))
    }

    fn row_of_spheres() -> Vec<Primitive> {
        (0..5)
            .map(|i| Sphere::new(Point3::new(i as f64 * 3.0, 0.0, -5.0), 1.0, grey()).into())
            .collect()
    }

    #[test]
    fn test_flat_and_bvh_agree() {
        let mut rng = StdRng::seed_from_u64(9);
        let flat = World::flat(row_of_spheres());
        let accelerated = World::with_bvh(row_of_spheres(), &mut rng);
        assert!(!flat.is_accelerated());
        assert!(accelerated.is_accelerated());

        for x in [-3.0, 0.0, 1.5, 3.0, 6.2, 12.0, 20.0] {
            let ray = Ray::new(Point3::new(x, 0.0, 0.0), -Vec3::Z);
            let a = flat.hit(&ray, 0.001, f64::INFINITY).map(|r| r.t);
            let b = accelerated.hit(&ray, 0.001, f64::INFINITY).map(|r| r.t);
            assert_eq!(a, b, "x = {x}");
        }
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut world = World::new();
        world.add(Sphere::new(Point3::new(0.0, 0.0, -10.0), 1.0, grey()));
        world.add(Sphere::new(Point3::new(0.0, 0.0, -4.0), 1.0, grey()));

        let ray = Ray::new(Point3::ZERO, -Vec3::Z);
        let rec = world.hit(&ray, 0.001, f64::INFINITY).expect("both spheres are on the ray");
        assert!((rec.t - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_to_accelerated_world() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut world = World::with_bvh(row_of_spheres(), &mut rng);
        let id = world.add(Triangle::new(
            Point3::new(-1.0, 10.0, -6.0),
            Point3::new(1.0, 10.0, -6.0),
            Point3::new(0.0, 12.0, -6.0),
            grey(),
        ));

        assert_eq!(world.len(), 6);
        assert!(world.list_ids().contains(&id));
        let ray = Ray::new(Point3::new(0.0, 10.5, 0.0), -Vec3::Z);
        let rec = world.hit(&ray, 0.001, f64::INFINITY).expect("triangle was added");
        assert!((rec.t - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_translate_by_id() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut world = World::with_bvh(row_of_spheres(), &mut rng);
        let id = world.primitives()[2].id().to_string();

        // Sphere 2 sits at x = 6; move it far up
        world
            .translate_by_id(&id, Vec3::new(0.0, 50.0, 0.0))
            .expect("id exists");

        let old_spot = Ray::new(Point3::new(6.0, 0.0, 0.0), -Vec3::Z);
        assert!(world.hit(&old_spot, 0.001, f64::INFINITY).is_none());

        let new_spot = Ray::new(Point3::new(6.0, 50.0, 0.0), -Vec3::Z);
        assert!(world.hit(&new_spot, 0.001, f64::INFINITY).is_some());
        assert_eq!(world.get(&id).map(|p| p.id()), Some(id.as_str()));
    }

    #[test]
    fn test_translate_unknown_id() {
        let mut world = World::flat(row_of_spheres());
        assert_eq!(
            world.translate_by_id("Sphere[nope]", Vec3::X),
            Err(SceneError::UnknownObject("Sphere[nope]".to_string()))
        );
    }

    #[test]
    fn test_list_ids_covers_every_object_once() {
        let mut rng = StdRng::seed_from_u64(8);
        let world = World::with_bvh(row_of_spheres(), &mut rng);

        let mut listed = world.list_ids();
        let mut expected: Vec<String> = world.primitives().iter().map(|p| p.id().to_string()).collect();
        listed.sort();
        expected.sort();
        assert_eq!(listed, expected);
    }

    #[test]
    fn test_random_scene() {
        let mut rng = StdRng::seed_from_u64(1);
        let world = World::random_scene(&mut rng);

        assert!(world.is_accelerated());
        // Ground plus three feature spheres plus most of the 22x22 field
        assert!(world.len() > 400);
        assert!(world.len() <= 1 + 22 * 22 + 3);

        // Straight down outside the sphere field lands on the ground sphere
        let ray = Ray::new(Point3::new(30.0, 5.0, 30.0), -Vec3::Y);
        let rec = world.hit(&ray, 0.001, f64::INFINITY).expect("ground is everywhere");
        let ground_y = -1000.0 + (1000.0f64 * 1000.0 - 30.0 * 30.0 * 2.0).sqrt();
        assert!((rec.p.y - ground_y).abs() < 1e-6);
    }
}
