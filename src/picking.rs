use crate::bodies::BodyId;
use cgmath::{InnerSpace, Point3, Vector3};
use std::time::{Duration, Instant};

#[derive(Copy, Clone, Debug)]
pub struct Ray {
  pub origin: Point3<f32>,
  /// Always unit length.
  pub direction: Vector3<f32>,
}

impl Ray {
  pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
    Self {
      origin,
      direction: direction.normalize(),
    }
  }

  /// Distance along the ray to the first surface hit of a sphere, if any.
  pub fn intersect_sphere(&self, center: Point3<f32>, radius: f32) -> Option<f32> {
    let oc = self.origin - center;
    let b = oc.dot(self.direction);
    let c = oc.magnitude2() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
      return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    let far = -b + root;
    if near >= 0.0 {
      Some(near)
    } else if far >= 0.0 {
      Some(far)
    } else {
      None
    }
  }
}

/// A sphere that can be hovered.
#[derive(Copy, Clone, Debug)]
pub struct Pickable {
  pub id: BodyId,
  pub center: Point3<f32>,
  pub radius: f32,
}

/// Nearest pickable along the ray.
pub fn pick(ray: &Ray, targets: &[Pickable]) -> Option<BodyId> {
  targets
    .iter()
    .filter_map(|t| ray.intersect_sphere(t.center, t.radius).map(|d| (d, t.id)))
    .min_by(|a, b| a.0.total_cmp(&b.0))
    .map(|(_, id)| id)
}

/// Allows at most one pick per interval.
pub struct HoverThrottle {
  interval: Duration,
  last: Option<Instant>,
}

impl HoverThrottle {
  pub fn new(interval: Duration) -> Self {
    Self {
      interval,
      last: None,
    }
  }

  pub fn try_acquire(&mut self, now: Instant) -> bool {
    match self.last {
      Some(last) if now.saturating_duration_since(last) < self.interval => false,
      _ => {
        self.last = Some(now);
        true
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bodies::{PLANETS, SUN};
  use crate::camera::{to_ndc, Camera};
  use crate::CameraParams;
  use cgmath::EuclideanSpace;

  fn scene() -> Vec<Pickable> {
    let mut targets = vec![Pickable {
      id: BodyId::Sun,
      center: Point3::origin(),
      radius: SUN.radius,
    }];
    targets.extend(PLANETS.iter().enumerate().map(|(i, p)| Pickable {
      id: BodyId::Planet(i),
      center: Point3::new(p.orbit_radius, 0.0, 0.0),
      radius: p.radius,
    }));
    targets
  }

  #[test]
  fn ray_through_sun_screen_position_hits_sun() {
    let camera = Camera::new(&CameraParams::default(), 800.0 / 600.0);
    let (x, y) = to_ndc(400.0, 300.0, 800.0, 600.0);
    let ray = camera.ray_through(x, y);
    assert_eq!(pick(&ray, &scene()), Some(BodyId::Sun));
  }

  #[test]
  fn ray_into_empty_space_misses() {
    let camera = Camera::new(&CameraParams::default(), 800.0 / 600.0);
    let ray = camera.ray_through(-0.95, 0.95);
    assert_eq!(pick(&ray, &scene()), None);
  }

  #[test]
  fn nearest_hit_wins() {
    let ray = Ray::new(Point3::new(100.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
    assert_eq!(pick(&ray, &scene()), Some(BodyId::Planet(7)));
  }

  #[test]
  fn sphere_behind_ray_is_ignored() {
    let ray = Ray::new(Point3::new(10.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
    assert_eq!(ray.intersect_sphere(Point3::origin(), 3.0), None);
    let inside = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(inside.intersect_sphere(Point3::origin(), 3.0), Some(3.0));
  }

  #[test]
  fn throttle_allows_one_pick_per_interval() {
    let mut throttle = HoverThrottle::new(Duration::from_millis(100));
    let t0 = Instant::now();
    assert!(throttle.try_acquire(t0));
    assert!(!throttle.try_acquire(t0 + Duration::from_millis(40)));
    assert!(!throttle.try_acquire(t0 + Duration::from_millis(99)));
    assert!(throttle.try_acquire(t0 + Duration::from_millis(100)));
    assert!(!throttle.try_acquire(t0 + Duration::from_millis(150)));
  }
}
