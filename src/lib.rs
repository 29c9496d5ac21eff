pub mod bodies;
pub mod camera;
pub mod initialize;
pub mod picking;
pub mod render;
pub mod simulation;
pub mod state;
pub mod tooltip;
pub mod ui;

use std::time::Duration;

pub const STAR_LAYERS: usize = 3;

pub struct SimParams {
  /// Converts a descriptor's base speed into radians per second.
  pub scale_factor: f32,
  pub sun_spin_rate: f32,
  pub planet_spin_rate: f32,
  pub star_base_rate: f32,
  /// Layer `i` rotates at `star_base_rate * (i + star_parallax_offset)`.
  pub star_parallax_offset: f32,
  pub min_speed: f32,
  pub max_speed: f32,
  pub speed_step: f32,
  pub default_speed: f32,
}

impl Default for SimParams {
  fn default() -> Self {
    Self {
      scale_factor: 0.1,
      sun_spin_rate: 0.5,
      planet_spin_rate: 2.0,
      star_base_rate: 0.005,
      star_parallax_offset: 1.0,
      min_speed: 0.0,
      max_speed: 3.0,
      speed_step: 0.1,
      default_speed: 1.0,
    }
  }
}

pub struct CameraParams {
  pub drag_sensitivity: f32,
  pub zoom_sensitivity: f32,
  pub min_distance: f32,
  pub max_distance: f32,
  /// Keeps the polar angle inside `[margin, PI - margin]`.
  pub polar_margin: f32,
  /// Pixels reported per wheel notch when the platform only gives line deltas.
  pub wheel_line_px: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
  pub eye: [f32; 3],
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      drag_sensitivity: 0.01,
      zoom_sensitivity: 0.01,
      min_distance: 15.0,
      max_distance: 100.0,
      polar_margin: 0.1,
      wheel_line_px: 100.0,
      fovy: 75.0,
      znear: 0.1,
      zfar: 1000.0,
      eye: [30.0, 30.0, 30.0],
    }
  }
}

#[derive(Copy, Clone, Debug)]
pub struct StarLayerParams {
  pub count: u32,
  pub size: f32,
  pub distance: f32,
}

pub struct StarfieldParams {
  /// Ordered farthest first; the order sets the parallax rate.
  pub layers: [StarLayerParams; STAR_LAYERS],
  pub palette: [u32; 3],
  pub opacity: f32,
}

impl Default for StarfieldParams {
  fn default() -> Self {
    Self {
      layers: [
        StarLayerParams {
          count: 5000,
          size: 0.5,
          distance: 400.0,
        },
        StarLayerParams {
          count: 3000,
          size: 0.8,
          distance: 300.0,
        },
        StarLayerParams {
          count: 1000,
          size: 1.2,
          distance: 200.0,
        },
      ],
      palette: [0xffffff, 0xfff0c1, 0xcad8ff],
      opacity: 0.8,
    }
  }
}

pub struct HoverParams {
  pub throttle: Duration,
}

impl Default for HoverParams {
  fn default() -> Self {
    Self {
      throttle: Duration::from_millis(100),
    }
  }
}

pub struct LightingParams {
  pub ambient_color: u32,
  pub ambient_intensity: f32,
  pub light_color: u32,
  pub light_intensity: f32,
  pub light_range: f32,
  pub shadows: bool,
}

impl Default for LightingParams {
  fn default() -> Self {
    Self {
      ambient_color: 0x404040,
      ambient_intensity: 0.3,
      light_color: 0xffffff,
      light_intensity: 1.0,
      light_range: 100.0,
      shadows: true,
    }
  }
}

/// Everything the app reads at startup.
#[derive(Default)]
pub struct Config {
  pub sim: SimParams,
  pub camera: CameraParams,
  pub stars: StarfieldParams,
  pub hover: HoverParams,
  pub lighting: LightingParams,
  pub seed: Option<u64>,
  pub light_theme: bool,
}

/// Converts a `0xRRGGBB` sRGB color into linear components.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
  let channel = |shift: u32| {
    let c = ((hex >> shift) & 0xff) as f32 / 255.0;
    if c <= 0.04045 {
      c / 12.92
    } else {
      ((c + 0.055) / 1.055).powf(2.4)
    }
  };
  [channel(16), channel(8), channel(0)]
}
