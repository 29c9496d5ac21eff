/// Static fact sheet for one planet.
#[derive(Debug)]
pub struct PlanetDescriptor {
  pub name: &'static str,
  pub radius: f32,
  pub diameter: &'static str,
  pub orbit_radius: f32,
  pub base_speed: f32,
  pub orbital_speed: &'static str,
  pub color: u32,
  pub info: &'static str,
}

#[derive(Debug)]
pub struct SunDescriptor {
  pub name: &'static str,
  pub radius: f32,
  pub color: u32,
  pub info: &'static str,
}

/// Tag carried by every pickable object in the scene.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BodyId {
  Sun,
  Planet(usize),
}

impl BodyId {
  pub fn name(self) -> &'static str {
    match self {
      BodyId::Sun => SUN.name,
      BodyId::Planet(i) => PLANETS.get(i).map_or("", |p| p.name),
    }
  }
}

pub const SUN: SunDescriptor = SunDescriptor {
  name: "Sun",
  radius: 3.0,
  color: 0xffff00,
  info: "The Sun is a yellow dwarf star at the center of our Solar System. It is a nearly \
         perfect sphere of hot plasma, with its gravity holding the system together. It \
         accounts for 99.86% of the Solar System's mass and has a diameter of about 1.39 \
         million km.",
};

pub const PLANET_COUNT: usize = 8;

pub const PLANETS: [PlanetDescriptor; PLANET_COUNT] = [
  PlanetDescriptor {
    name: "Mercury",
    radius: 0.38,
    diameter: "4,880 km",
    orbit_radius: 8.0,
    base_speed: 4.74,
    orbital_speed: "47.4 km/s",
    color: 0x8c7853,
    info: "The smallest and fastest planet, Mercury zips around the Sun in just 88 Earth days.",
  },
  PlanetDescriptor {
    name: "Venus",
    radius: 0.95,
    diameter: "12,104 km",
    orbit_radius: 12.0,
    base_speed: 3.50,
    orbital_speed: "35.0 km/s",
    color: 0xffc649,
    info: "Venus is the hottest planet in our solar system due to a thick, toxic atmosphere.",
  },
  PlanetDescriptor {
    name: "Earth",
    radius: 1.0,
    diameter: "12,742 km",
    orbit_radius: 16.0,
    base_speed: 2.98,
    orbital_speed: "29.8 km/s",
    color: 0x6b93d6,
    info: "Our home is the only place in the universe known to harbor life.",
  },
  PlanetDescriptor {
    name: "Mars",
    radius: 0.53,
    diameter: "6,779 km",
    orbit_radius: 20.0,
    base_speed: 2.41,
    orbital_speed: "24.1 km/s",
    color: 0xc1440e,
    info: "The \"Red Planet\" is home to the largest volcano in the solar system, Olympus Mons.",
  },
  PlanetDescriptor {
    name: "Jupiter",
    radius: 2.5,
    diameter: "139,820 km",
    orbit_radius: 28.0,
    base_speed: 1.31,
    orbital_speed: "13.1 km/s",
    color: 0xd8ca9d,
    info: "The largest planet, Jupiter is a gas giant with a massive storm, the Great Red Spot.",
  },
  PlanetDescriptor {
    name: "Saturn",
    radius: 2.1,
    diameter: "116,460 km",
    orbit_radius: 36.0,
    base_speed: 0.97,
    orbital_speed: "9.7 km/s",
    color: 0xfad5a5,
    info: "Saturn is famous for its stunning and complex system of icy rings.",
  },
  PlanetDescriptor {
    name: "Uranus",
    radius: 1.6,
    diameter: "50,724 km",
    orbit_radius: 44.0,
    base_speed: 0.68,
    orbital_speed: "6.8 km/s",
    color: 0x4fd0e7,
    info: "An ice giant that is tilted on its side, causing it to orbit like a rolling ball.",
  },
  PlanetDescriptor {
    name: "Neptune",
    radius: 1.5,
    diameter: "49,244 km",
    orbit_radius: 52.0,
    base_speed: 0.54,
    orbital_speed: "5.4 km/s",
    color: 0x4b70dd,
    info: "The most distant planet, Neptune is a dark, cold, and incredibly windy ice giant.",
  },
];

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn names_are_unique() {
    let mut names: HashSet<&str> = PLANETS.iter().map(|p| p.name).collect();
    assert_eq!(names.len(), PLANET_COUNT);
    assert!(names.insert(SUN.name));
  }

  #[test]
  fn orbits_grow_outward() {
    for pair in PLANETS.windows(2) {
      assert!(pair[0].orbit_radius < pair[1].orbit_radius);
    }
    assert!(SUN.radius < PLANETS[0].orbit_radius);
  }

  #[test]
  fn body_id_resolves_names() {
    assert_eq!(BodyId::Sun.name(), "Sun");
    assert_eq!(BodyId::Planet(2).name(), "Earth");
  }
}
