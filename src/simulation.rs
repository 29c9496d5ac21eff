use crate::bodies::{BodyId, PlanetDescriptor, PLANETS, SUN};
use crate::picking::Pickable;
use crate::{SimParams, STAR_LAYERS};
use cgmath::{EuclideanSpace, Point3};
use log::{debug, warn};
use rand::Rng;
use std::f32::consts::PI;
use std::time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
  Running,
  Paused,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Theme {
  Dark,
  Light,
}

impl Theme {
  pub fn toggled(self) -> Self {
    match self {
      Theme::Dark => Theme::Light,
      Theme::Light => Theme::Dark,
    }
  }

  pub fn background(self) -> u32 {
    match self {
      Theme::Dark => 0x000000,
      Theme::Light => 0x001122,
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      Theme::Dark => "🌙",
      Theme::Light => "☀",
    }
  }
}

/// Requests coming from the UI and keyboard, applied in one place.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
  SetPlanetSpeed { planet: usize, multiplier: f32 },
  TogglePause,
  Reset,
  ToggleTheme,
}

#[derive(Clone, Debug)]
pub struct PlanetState {
  pub index: usize,
  /// Orbital phase in radians; never wrapped.
  pub angle: f32,
  pub speed: f32,
  pub spin: f32,
}

impl PlanetState {
  pub fn descriptor(&self) -> &'static PlanetDescriptor {
    &PLANETS[self.index]
  }

  pub fn position(&self) -> Point3<f32> {
    let r = self.descriptor().orbit_radius;
    Point3::new(self.angle.cos() * r, 0.0, self.angle.sin() * r)
  }
}

pub struct SimulationState {
  pub run_state: RunState,
  pub theme: Theme,
  pub sun_spin: f32,
  pub star_rotations: [f32; STAR_LAYERS],
  pub planets: Vec<PlanetState>,
}

fn random_phase<R: Rng>(rng: &mut R) -> f32 {
  rng.gen_range(0.0..2.0 * PI)
}

impl SimulationState {
  #[must_use]
  pub fn new<R: Rng>(rng: &mut R, params: &SimParams) -> Self {
    let planets = (0..PLANETS.len())
      .map(|index| PlanetState {
        index,
        angle: random_phase(rng),
        speed: params.default_speed,
        spin: 0.0,
      })
      .collect();
    Self {
      run_state: RunState::Running,
      theme: Theme::Dark,
      sun_spin: 0.0,
      star_rotations: [0.0; STAR_LAYERS],
      planets,
    }
  }

  pub fn is_paused(&self) -> bool {
    self.run_state == RunState::Paused
  }

  /// Advances every animated quantity by `delta` seconds. No-op while paused.
  pub fn tick(&mut self, delta: f32, params: &SimParams) {
    if self.is_paused() {
      return;
    }
    self.sun_spin += delta * params.sun_spin_rate;
    for (i, rotation) in self.star_rotations.iter_mut().enumerate() {
      *rotation += delta * params.star_base_rate * (i as f32 + params.star_parallax_offset);
    }
    for planet in &mut self.planets {
      let base_speed = planet.descriptor().base_speed;
      planet.angle += delta * base_speed * planet.speed * params.scale_factor;
      planet.spin += delta * params.planet_spin_rate;
    }
  }

  /// Current spheres of the sun and every planet, sun first.
  pub fn pickables(&self) -> Vec<Pickable> {
    let sun = Pickable {
      id: BodyId::Sun,
      center: Point3::origin(),
      radius: SUN.radius,
    };
    std::iter::once(sun)
      .chain(self.planets.iter().map(|p| Pickable {
        id: BodyId::Planet(p.index),
        center: p.position(),
        radius: p.descriptor().radius,
      }))
      .collect()
  }

  pub fn apply<R: Rng>(&mut self, command: Command, rng: &mut R, params: &SimParams) {
    match command {
      Command::SetPlanetSpeed { planet, multiplier } => {
        let Some(state) = self.planets.get_mut(planet) else {
          warn!("ignoring speed change for unknown planet index {planet}");
          return;
        };
        state.speed = multiplier.clamp(params.min_speed, params.max_speed);
        debug!("{} speed set to x{:.1}", state.descriptor().name, state.speed);
      }
      Command::TogglePause => {
        self.run_state = match self.run_state {
          RunState::Running => RunState::Paused,
          RunState::Paused => RunState::Running,
        };
        debug!("simulation {:?}", self.run_state);
      }
      Command::Reset => {
        for planet in &mut self.planets {
          planet.speed = params.default_speed;
          planet.angle = random_phase(rng);
        }
        self.run_state = RunState::Running;
        debug!("simulation reset");
      }
      Command::ToggleTheme => {
        self.theme = self.theme.toggled();
        debug!("theme {:?}", self.theme);
      }
    }
  }
}

/// Measures wall-clock time between frames.
pub struct FrameClock {
  last: Instant,
}

impl FrameClock {
  pub fn new() -> Self {
    Self {
      last: Instant::now(),
    }
  }

  pub fn delta(&mut self) -> f32 {
    let now = Instant::now();
    let delta = now.duration_since(self.last).as_secs_f32();
    self.last = now;
    delta
  }
}

impl Default for FrameClock {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::SmallRng, SeedableRng};

  const EPS: f32 = 1e-5;

  fn state() -> (SimulationState, SmallRng, SimParams) {
    let params = SimParams::default();
    let mut rng = SmallRng::seed_from_u64(7);
    let sim = SimulationState::new(&mut rng, &params);
    (sim, rng, params)
  }

  #[test]
  fn starts_running_dark_at_default_speed() {
    let (sim, _, _) = state();
    assert_eq!(sim.run_state, RunState::Running);
    assert_eq!(sim.theme, Theme::Dark);
    assert_eq!(sim.planets.len(), PLANETS.len());
    for planet in &sim.planets {
      assert_eq!(planet.speed, 1.0);
      assert!((0.0..2.0 * PI).contains(&planet.angle));
    }
  }

  #[test]
  fn earth_advances_by_scaled_base_speed() {
    let (mut sim, _, params) = state();
    sim.planets[2].angle = 0.0;
    sim.tick(1.0, &params);
    let earth = &sim.planets[2];
    assert!((earth.angle - 0.298).abs() < EPS);
    let pos = earth.position();
    assert!((pos.x - 0.298f32.cos() * 16.0).abs() < 1e-4);
    assert_eq!(pos.y, 0.0);
    assert!((pos.z - 0.298f32.sin() * 16.0).abs() < 1e-4);
    assert!((earth.spin - 2.0).abs() < EPS);
    assert!((sim.sun_spin - 0.5).abs() < EPS);
  }

  #[test]
  fn star_layers_rotate_faster_when_nearer() {
    let (mut sim, _, params) = state();
    sim.tick(2.0, &params);
    assert!((sim.star_rotations[0] - 0.01).abs() < EPS);
    assert!((sim.star_rotations[1] - 0.02).abs() < EPS);
    assert!((sim.star_rotations[2] - 0.03).abs() < EPS);
  }

  #[test]
  fn phase_is_monotonic_while_running_and_frozen_while_paused() {
    let (mut sim, mut rng, params) = state();
    let deltas = [0.016, 0.5, 0.001, 1.2, 0.033];
    let mut last: Vec<f32> = sim.planets.iter().map(|p| p.angle).collect();
    for d in deltas {
      sim.tick(d, &params);
      for (p, prev) in sim.planets.iter().zip(&last) {
        assert!(p.angle >= *prev);
      }
      last = sim.planets.iter().map(|p| p.angle).collect();
    }

    sim.apply(Command::TogglePause, &mut rng, &params);
    let frozen: Vec<f32> = sim.planets.iter().map(|p| p.angle).collect();
    let sun = sim.sun_spin;
    for d in deltas {
      sim.tick(d, &params);
    }
    let after: Vec<f32> = sim.planets.iter().map(|p| p.angle).collect();
    assert_eq!(frozen, after);
    assert_eq!(sim.sun_spin, sun);
  }

  #[test]
  fn zero_speed_holds_a_planet_still() {
    let (mut sim, mut rng, params) = state();
    sim.apply(
      Command::SetPlanetSpeed {
        planet: 0,
        multiplier: 0.0,
      },
      &mut rng,
      &params,
    );
    let before = sim.planets[0].angle;
    sim.tick(5.0, &params);
    assert_eq!(sim.planets[0].angle, before);
  }

  #[test]
  fn speed_commands_stay_in_range() {
    let (mut sim, mut rng, params) = state();
    for (planet, multiplier) in [(1, 7.5), (3, -2.0), (4, 2.3)] {
      sim.apply(Command::SetPlanetSpeed { planet, multiplier }, &mut rng, &params);
    }
    assert_eq!(sim.planets[1].speed, 3.0);
    assert_eq!(sim.planets[3].speed, 0.0);
    assert!((sim.planets[4].speed - 2.3).abs() < EPS);
    for planet in &sim.planets {
      assert!((0.0..=3.0).contains(&planet.speed));
    }
  }

  #[test]
  fn unknown_planet_is_ignored() {
    let (mut sim, mut rng, params) = state();
    sim.apply(
      Command::SetPlanetSpeed {
        planet: 99,
        multiplier: 2.0,
      },
      &mut rng,
      &params,
    );
    assert!(sim.planets.iter().all(|p| p.speed == 1.0));
  }

  #[test]
  fn pause_then_reset_runs_at_default_speed() {
    let (mut sim, mut rng, params) = state();
    sim.apply(
      Command::SetPlanetSpeed {
        planet: 5,
        multiplier: 2.5,
      },
      &mut rng,
      &params,
    );
    sim.apply(Command::TogglePause, &mut rng, &params);
    assert!(sim.is_paused());
    sim.apply(Command::Reset, &mut rng, &params);
    assert_eq!(sim.run_state, RunState::Running);
    assert!(sim.planets.iter().all(|p| p.speed == 1.0));
  }

  #[test]
  fn reset_rerolls_phase_but_not_speed() {
    let (mut sim, mut rng, params) = state();
    let before: Vec<f32> = sim.planets.iter().map(|p| p.angle).collect();
    sim.apply(Command::Reset, &mut rng, &params);
    sim.apply(Command::Reset, &mut rng, &params);
    let after: Vec<f32> = sim.planets.iter().map(|p| p.angle).collect();
    assert_ne!(before, after);
    for planet in &sim.planets {
      assert_eq!(planet.speed, 1.0);
      assert!((0.0..2.0 * PI).contains(&planet.angle));
    }
  }

  #[test]
  fn pickables_follow_planet_phase() {
    let (mut sim, _, _) = state();
    sim.planets[3].angle = PI / 2.0;
    let targets = sim.pickables();
    assert_eq!(targets.len(), PLANETS.len() + 1);
    assert_eq!(targets[0].id, BodyId::Sun);
    let mars = &targets[4];
    assert_eq!(mars.id, BodyId::Planet(3));
    assert!(mars.center.x.abs() < 1e-4);
    assert!((mars.center.z - 20.0).abs() < 1e-4);
  }

  #[test]
  fn theme_toggle_twice_is_identity() {
    let (mut sim, mut rng, params) = state();
    sim.apply(Command::ToggleTheme, &mut rng, &params);
    assert_eq!(sim.theme, Theme::Light);
    assert_eq!(sim.theme.background(), 0x001122);
    sim.apply(Command::ToggleTheme, &mut rng, &params);
    assert_eq!(sim.theme, Theme::Dark);
    assert_eq!(sim.theme.background(), 0x000000);
  }
}
