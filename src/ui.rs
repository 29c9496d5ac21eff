use crate::simulation::{Command, RunState, SimulationState};
use crate::tooltip::Tooltip;
use crate::SimParams;
use egui::{Color32, RichText};

const TITLE_COLOR: Color32 = Color32::from_rgb(0x4f, 0xc3, 0xf7);
const TOOLTIP_OFFSET: f32 = 12.0;

/// Slider state for one planet.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeedControl {
  pub planet: usize,
  pub name: &'static str,
  pub orbital_speed: &'static str,
  pub value: f32,
}

impl SpeedControl {
  pub fn label(&self) -> String {
    format!("x{:.1}", self.value)
  }
}

pub struct ControlPanel {
  controls: Vec<SpeedControl>,
  min: f32,
  max: f32,
  step: f32,
}

impl ControlPanel {
  pub fn new(sim: &SimulationState, params: &SimParams) -> Self {
    let controls = sim
      .planets
      .iter()
      .map(|p| SpeedControl {
        planet: p.index,
        name: p.descriptor().name,
        orbital_speed: p.descriptor().orbital_speed,
        value: p.speed,
      })
      .collect();
    Self {
      controls,
      min: params.min_speed,
      max: params.max_speed,
      step: params.speed_step,
    }
  }

  pub fn controls(&self) -> &[SpeedControl] {
    &self.controls
  }

  /// Copies live speeds back into the sliders, e.g. after a reset.
  pub fn sync(&mut self, sim: &SimulationState) {
    for control in &mut self.controls {
      if let Some(planet) = sim.planets.get(control.planet) {
        control.value = planet.speed;
      }
    }
  }

  /// Records a slider move and returns the command that carries it.
  pub fn set_value(&mut self, planet: usize, value: f32) -> Option<Command> {
    let control = self.controls.iter_mut().find(|c| c.planet == planet)?;
    let snapped = ((value / self.step).round() * self.step).clamp(self.min, self.max);
    control.value = snapped;
    Some(Command::SetPlanetSpeed {
      planet,
      multiplier: snapped,
    })
  }

  pub fn show(&mut self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
    let mut moved = Vec::new();
    for control in &self.controls {
      ui.horizontal(|ui| {
        ui.label(RichText::new(control.name).strong());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
          ui.label(RichText::new(control.orbital_speed).weak());
        });
      });
      ui.horizontal(|ui| {
        let mut value = control.value;
        let slider = egui::Slider::new(&mut value, self.min..=self.max)
          .step_by(f64::from(self.step))
          .show_value(false);
        if ui.add(slider).changed() {
          moved.push((control.planet, value));
        }
        ui.label(control.label());
      });
      ui.add_space(4.0);
    }
    for (planet, value) in moved {
      commands.extend(self.set_value(planet, value));
    }
  }
}

pub fn pause_label(run_state: RunState) -> &'static str {
  match run_state {
    RunState::Running => "⏸ Pause",
    RunState::Paused => "▶ Resume",
  }
}

fn session_controls(ui: &mut egui::Ui, sim: &SimulationState, commands: &mut Vec<Command>) {
  ui.horizontal(|ui| {
    let pause = egui::Button::new(pause_label(sim.run_state)).selected(sim.is_paused());
    if ui.add(pause).clicked() {
      commands.push(Command::TogglePause);
    }
    if ui.button("⟲ Reset").clicked() {
      commands.push(Command::Reset);
    }
    if ui.button(sim.theme.icon()).clicked() {
      commands.push(Command::ToggleTheme);
    }
  });
}

/// Space, R and T mirror the session buttons. Skipped while any widget holds focus.
pub fn shortcut_commands(ctx: &egui::Context) -> Vec<Command> {
  if ctx.wants_keyboard_input() || ctx.memory(|m| m.focused().is_some()) {
    return Vec::new();
  }
  ctx.input(|i| {
    let mut commands = Vec::new();
    if i.key_pressed(egui::Key::Space) {
      commands.push(Command::TogglePause);
    }
    if i.key_pressed(egui::Key::R) {
      commands.push(Command::Reset);
    }
    if i.key_pressed(egui::Key::T) {
      commands.push(Command::ToggleTheme);
    }
    commands
  })
}

fn show_tooltip(ctx: &egui::Context, tooltip: &Tooltip) {
  let Some((content, at)) = tooltip.current() else {
    return;
  };
  egui::Area::new(egui::Id::new("planet-tooltip"))
    .order(egui::Order::Tooltip)
    .fixed_pos(egui::pos2(at[0] + TOOLTIP_OFFSET, at[1] + TOOLTIP_OFFSET))
    .interactable(false)
    .show(ctx, |ui| {
      egui::Frame::popup(ui.style()).show(ui, |ui| {
        ui.set_max_width(280.0);
        ui.label(
          RichText::new(content.title)
            .strong()
            .size(14.0)
            .color(TITLE_COLOR),
        );
        if let Some(facts) = &content.facts {
          ui.label(RichText::new(format!("Diameter: {}", facts.diameter)).size(11.0));
          ui.label(RichText::new(format!("Orbital Speed: {}", facts.orbital_speed)).size(11.0));
          ui.separator();
        }
        ui.label(RichText::new(content.info).size(11.0));
      });
    });
}

/// Lays out the whole overlay and returns what the user asked for this frame.
pub fn draw(
  ctx: &egui::Context,
  panel: &mut ControlPanel,
  sim: &SimulationState,
  tooltip: &Tooltip,
) -> Vec<Command> {
  let mut commands = shortcut_commands(ctx);
  egui::SidePanel::right("planet-controls")
    .resizable(false)
    .show(ctx, |ui| {
      ui.heading("Solar System");
      session_controls(ui, sim, &mut commands);
      ui.separator();
      egui::ScrollArea::vertical().show(ui, |ui| {
        panel.show(ui, &mut commands);
      });
    });
  show_tooltip(ctx, tooltip);
  commands
}

/// Text shown when the graphics stack could not start.
pub fn error_banner(message: &str) -> String {
  format!("Error\n{message}")
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::SmallRng, SeedableRng};

  fn setup() -> (SimulationState, ControlPanel, SimParams, SmallRng) {
    let params = SimParams::default();
    let mut rng = SmallRng::seed_from_u64(3);
    let sim = SimulationState::new(&mut rng, &params);
    let panel = ControlPanel::new(&sim, &params);
    (sim, panel, params, rng)
  }

  #[test]
  fn one_control_per_planet_at_default_speed() {
    let (_, panel, _, _) = setup();
    let names: Vec<&str> = panel.controls().iter().map(|c| c.name).collect();
    assert_eq!(
      names,
      ["Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune"]
    );
    assert!(panel.controls().iter().all(|c| c.label() == "x1.0"));
    assert_eq!(panel.controls()[2].orbital_speed, "29.8 km/s");
  }

  #[test]
  fn slider_move_updates_label_and_dispatches() {
    let (mut sim, mut panel, params, mut rng) = setup();
    let command = panel.set_value(3, 2.04).unwrap();
    assert_eq!(panel.controls()[3].label(), "x2.0");
    sim.apply(command, &mut rng, &params);
    assert!((sim.planets[3].speed - 2.0).abs() < 1e-5);
  }

  #[test]
  fn slider_values_snap_into_range() {
    let (_, mut panel, _, _) = setup();
    match panel.set_value(0, 4.2) {
      Some(Command::SetPlanetSpeed { multiplier, .. }) => assert_eq!(multiplier, 3.0),
      other => panic!("unexpected {other:?}"),
    }
    assert_eq!(panel.set_value(99, 1.0), None);
  }

  #[test]
  fn reset_brings_sliders_back() {
    let (mut sim, mut panel, params, mut rng) = setup();
    for planet in 0..8 {
      let command = panel.set_value(planet, 2.7).unwrap();
      sim.apply(command, &mut rng, &params);
    }
    sim.apply(Command::Reset, &mut rng, &params);
    panel.sync(&sim);
    assert!(panel.controls().iter().all(|c| c.value == 1.0));
    assert!(panel.controls().iter().all(|c| c.label() == "x1.0"));
  }

  #[test]
  fn pause_label_tracks_run_state() {
    assert_eq!(pause_label(RunState::Running), "⏸ Pause");
    assert_eq!(pause_label(RunState::Paused), "▶ Resume");
  }

  #[test]
  fn overlay_emits_nothing_without_input() {
    let (sim, mut panel, _, _) = setup();
    let ctx = egui::Context::default();
    let mut tooltip = Tooltip::default();
    tooltip.show(crate::bodies::BodyId::Sun, [10.0, 10.0]);
    let mut commands = Vec::new();
    let _ = ctx.run(egui::RawInput::default(), |ctx| {
      commands = draw(ctx, &mut panel, &sim, &tooltip);
    });
    assert!(commands.is_empty());
  }

  fn space_pressed() -> egui::RawInput {
    egui::RawInput {
      events: vec![egui::Event::Key {
        key: egui::Key::Space,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers: egui::Modifiers::default(),
      }],
      ..Default::default()
    }
  }

  #[test]
  fn space_toggles_pause_without_focus() {
    let ctx = egui::Context::default();
    let mut commands = Vec::new();
    let _ = ctx.run(space_pressed(), |ctx| {
      commands = shortcut_commands(ctx);
    });
    assert_eq!(commands, vec![Command::TogglePause]);
  }

  #[test]
  fn focused_button_keeps_space() {
    let ctx = egui::Context::default();
    let mut commands = Vec::new();
    let _ = ctx.run(space_pressed(), |ctx| {
      egui::CentralPanel::default().show(ctx, |ui| {
        ui.button(pause_label(RunState::Running)).request_focus();
      });
      commands = shortcut_commands(ctx);
    });
    assert!(commands.is_empty());
  }

  #[test]
  fn error_banner_has_title() {
    assert!(error_banner("no adapter").starts_with("Error\n"));
  }
}
