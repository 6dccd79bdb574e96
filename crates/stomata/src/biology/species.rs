use std::fmt;
use std::str::FromStr;

use super::calibration::Calibration;

/// Leaf morphology; selects the maximum pore area model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Morphology {
    /// Grass-type stomata with elongated, dumbbell-shaped guard cells.
    Monocot,
    /// Kidney-shaped guard cells.
    Dicot,
}

/// Species with a trained model and a reference microscope setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PlantSpecies {
    Arabidopsis,
    Barley,
}

impl PlantSpecies {
    pub const ALL: [PlantSpecies; 2] = [PlantSpecies::Arabidopsis, PlantSpecies::Barley];

    pub fn name(self) -> &'static str {
        match self {
            Self::Arabidopsis => "Arabidopsis",
            Self::Barley => "Barley",
        }
    }

    pub fn morphology(self) -> Morphology {
        match self {
            Self::Arabidopsis => Morphology::Dicot,
            Self::Barley => Morphology::Monocot,
        }
    }

    /// Reference camera calibration (px/µm).
    pub fn calibration(self) -> Calibration {
        match self {
            Self::Arabidopsis => Calibration::new(10.25131),
            Self::Barley => Calibration::new(4.2736),
        }
    }

    /// Field of view of the reference images (mm²).
    pub fn example_image_area_mm2(self) -> f64 {
        match self {
            Self::Arabidopsis => 0.04794822,
            Self::Barley => 0.3229496,
        }
    }
}

impl fmt::Display for PlantSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlantSpecies {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|species| species.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown species '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_table() {
        assert_eq!(PlantSpecies::Barley.morphology(), Morphology::Monocot);
        assert_eq!(PlantSpecies::Arabidopsis.morphology(), Morphology::Dicot);
        assert_eq!(PlantSpecies::Barley.calibration().px_per_um(), 4.2736);
        assert_eq!("barley".parse::<PlantSpecies>(), Ok(PlantSpecies::Barley));
        assert!("maize".parse::<PlantSpecies>().is_err());
    }
}
