use crate::bodies::{PlanetDescriptor, PLANETS};
use crate::{hex_to_linear, Config, LightingParams, StarLayerParams};
use cgmath::{InnerSpace, Vector3};
use log::info;
use rand::Rng;
use std::f32::consts::PI;

pub const SPHERE_SEGMENTS: u32 = 32;
pub const ORBIT_SEGMENTS: u32 = 64;
const ORBIT_COLOR: u32 = 0x333333;
const ORBIT_OPACITY: f32 = 0.3;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
  pub position: [f32; 3],
  pub normal: [f32; 3],
}

/// Unit sphere shared by the sun and every planet.
pub struct SphereMesh {
  pub vertices: Vec<MeshVertex>,
  pub indices: Vec<u16>,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
  pub position: [f32; 3],
  pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Star {
  pub position: [f32; 3],
  pub color: [f32; 3],
}

pub struct StarLayer {
  pub stars: Vec<Star>,
  pub size: f32,
  pub opacity: f32,
}

pub struct Lights {
  /// Ambient color already multiplied by its intensity.
  pub ambient: [f32; 3],
  pub point_position: [f32; 3],
  pub point_color: [f32; 3],
  pub point_range: f32,
  pub shadows: bool,
}

impl Lights {
  fn from_params(params: &LightingParams) -> Self {
    let ambient = hex_to_linear(params.ambient_color).map(|c| c * params.ambient_intensity);
    let point_color = hex_to_linear(params.light_color).map(|c| c * params.light_intensity);
    Self {
      ambient,
      point_position: [0.0; 3],
      point_color,
      point_range: params.light_range,
      shadows: params.shadows,
    }
  }
}

/// Static scene geometry, built once before the first frame.
pub struct Scene {
  pub sphere: SphereMesh,
  pub orbits: Vec<LineVertex>,
  pub star_layers: Vec<StarLayer>,
  pub lights: Lights,
}

#[must_use]
pub fn build_scene<R: Rng>(rng: &mut R, config: &Config) -> Scene {
  let star_layers: Vec<StarLayer> = config
    .stars
    .layers
    .iter()
    .map(|layer| create_star_layer(rng, layer, &config.stars.palette, config.stars.opacity))
    .collect();
  let scene = Scene {
    sphere: uv_sphere(SPHERE_SEGMENTS, SPHERE_SEGMENTS),
    orbits: orbit_lines(&PLANETS),
    star_layers,
    lights: Lights::from_params(&config.lighting),
  };
  info!(
    "scene built: {} planets, {} stars in {} layers",
    PLANETS.len(),
    scene.star_layers.iter().map(|l| l.stars.len()).sum::<usize>(),
    scene.star_layers.len()
  );
  scene
}

#[must_use]
pub fn uv_sphere(width_segments: u32, height_segments: u32) -> SphereMesh {
  let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
  for iy in 0..=height_segments {
    let v = iy as f32 / height_segments as f32;
    for ix in 0..=width_segments {
      let u = ix as f32 / width_segments as f32;
      let p = [
        -(u * 2.0 * PI).cos() * (v * PI).sin(),
        (v * PI).cos(),
        (u * 2.0 * PI).sin() * (v * PI).sin(),
      ];
      vertices.push(MeshVertex {
        position: p,
        normal: p,
      });
    }
  }

  let row = width_segments + 1;
  let mut indices = Vec::new();
  for iy in 0..height_segments {
    for ix in 0..width_segments {
      let a = (iy * row + ix + 1) as u16;
      let b = (iy * row + ix) as u16;
      let c = ((iy + 1) * row + ix) as u16;
      let d = ((iy + 1) * row + ix + 1) as u16;
      // the pole rows collapse to a single triangle
      if iy != 0 {
        indices.extend_from_slice(&[a, b, d]);
      }
      if iy != height_segments - 1 {
        indices.extend_from_slice(&[b, c, d]);
      }
    }
  }
  SphereMesh { vertices, indices }
}

/// Closed circle in the XZ plane; the last point repeats the first.
#[must_use]
pub fn orbit_path(radius: f32, segments: u32) -> Vec<[f32; 3]> {
  (0..=segments)
    .map(|i| {
      let theta = (i as f32 / segments as f32) * 2.0 * PI;
      [theta.cos() * radius, 0.0, theta.sin() * radius]
    })
    .collect()
}

/// Line-list vertices for every planet's orbit guide.
#[must_use]
pub fn orbit_lines(planets: &[PlanetDescriptor]) -> Vec<LineVertex> {
  let [r, g, b] = hex_to_linear(ORBIT_COLOR);
  let color = [r, g, b, ORBIT_OPACITY];
  let mut vertices = Vec::with_capacity(planets.len() * ORBIT_SEGMENTS as usize * 2);
  for planet in planets {
    let path = orbit_path(planet.orbit_radius, ORBIT_SEGMENTS);
    for pair in path.windows(2) {
      vertices.push(LineVertex {
        position: pair[0],
        color,
      });
      vertices.push(LineVertex {
        position: pair[1],
        color,
      });
    }
  }
  vertices
}

#[must_use]
pub fn create_star_layer<R: Rng>(
  rng: &mut R,
  layer: &StarLayerParams,
  palette: &[u32],
  opacity: f32,
) -> StarLayer {
  let palette: Vec<[f32; 3]> = palette.iter().map(|&hex| hex_to_linear(hex)).collect();
  let mut stars = Vec::with_capacity(layer.count as usize);
  for _ in 0..layer.count {
    let direction = loop {
      let v = Vector3::new(
        (rng.gen::<f32>() - 0.5) * 2.0,
        (rng.gen::<f32>() - 0.5) * 2.0,
        (rng.gen::<f32>() - 0.5) * 2.0,
      );
      if v.magnitude2() > f32::EPSILON {
        break v.normalize();
      }
    };
    let pos = direction * layer.distance;
    let color = palette[rng.gen_range(0..palette.len())];
    stars.push(Star {
      position: [pos.x, pos.y, pos.z],
      color,
    });
  }
  StarLayer {
    stars,
    size: layer.size,
    opacity,
  }
}
