use crate::bodies::{BodyId, PLANETS, SUN};

#[derive(Clone, Debug, PartialEq)]
pub struct PlanetFacts {
  pub diameter: &'static str,
  pub orbital_speed: &'static str,
}

/// What the info card says about one body.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipContent {
  pub title: &'static str,
  pub facts: Option<PlanetFacts>,
  pub info: &'static str,
}

impl TooltipContent {
  pub fn for_body(id: BodyId) -> Option<Self> {
    match id {
      BodyId::Sun => Some(Self {
        title: SUN.name,
        facts: None,
        info: SUN.info,
      }),
      BodyId::Planet(i) => PLANETS.get(i).map(|p| Self {
        title: p.name,
        facts: Some(PlanetFacts {
          diameter: p.diameter,
          orbital_speed: p.orbital_speed,
        }),
        info: p.info,
      }),
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tooltip {
  visible: Option<(TooltipContent, [f32; 2])>,
}

impl Tooltip {
  /// Shows the card for `id` anchored at a screen position in logical points.
  pub fn show(&mut self, id: BodyId, at: [f32; 2]) {
    self.visible = TooltipContent::for_body(id).map(|content| (content, at));
  }

  pub fn hide(&mut self) {
    self.visible = None;
  }

  pub fn current(&self) -> Option<(&TooltipContent, [f32; 2])> {
    self.visible.as_ref().map(|(c, at)| (c, *at))
  }

  pub fn is_visible(&self) -> bool {
    self.visible.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sun_card_has_only_the_description() {
    let content = TooltipContent::for_body(BodyId::Sun).unwrap();
    assert_eq!(content.title, "Sun");
    assert!(content.facts.is_none());
    assert!(content.info.starts_with("The Sun is a yellow dwarf"));
  }

  #[test]
  fn planet_card_lists_diameter_and_speed() {
    let content = TooltipContent::for_body(BodyId::Planet(2)).unwrap();
    assert_eq!(content.title, "Earth");
    let facts = content.facts.unwrap();
    assert_eq!(facts.diameter, "12,742 km");
    assert_eq!(facts.orbital_speed, "29.8 km/s");
  }

  #[test]
  fn show_then_hide() {
    let mut tooltip = Tooltip::default();
    tooltip.show(BodyId::Planet(4), [120.0, 80.0]);
    let (content, at) = tooltip.current().unwrap();
    assert_eq!(content.title, "Jupiter");
    assert_eq!(at, [120.0, 80.0]);
    tooltip.hide();
    assert!(!tooltip.is_visible());
  }

  #[test]
  fn hiding_twice_is_a_no_op() {
    let mut tooltip = Tooltip::default();
    tooltip.hide();
    let once = tooltip.clone();
    tooltip.hide();
    assert_eq!(tooltip, once);
    assert_eq!(tooltip, Tooltip::default());
  }

  #[test]
  fn unknown_planet_shows_nothing() {
    let mut tooltip = Tooltip::default();
    tooltip.show(BodyId::Planet(42), [0.0, 0.0]);
    assert!(!tooltip.is_visible());
  }
}
