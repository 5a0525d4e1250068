// Atom assembly from parsed nuclear-data records.
//
// The on-disk formats (native containers, ACE tables) are parsed by
// external tooling; this module receives the result as plain vectors plus
// scalar metadata and assembles the shared-grid reaction core from it. All
// construction-time validation surfaces here as `DataError`.

use crate::atom::Atom;
use crate::atom_core::{ReactionCore, ReactionMap};
use crate::distribution::{
    AdjointEnergyGainDistribution, AdjointKleinNishina, EnergyGainTable, ScatteringDistribution,
    TabularPdf,
};
use crate::error::DataError;
use crate::grid::HashGridSearcher;
use crate::interpolation::Interpolation;
use crate::reaction::{Reaction, ReactionType, Subshell};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Standard atomic weights (g/mol) for elements that commonly appear in
/// shielding and detector problems. Used when a record omits the weight.
pub static ATOMIC_WEIGHTS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("H", 1.00794),
        ("He", 4.002602),
        ("Li", 6.941),
        ("Be", 9.012182),
        ("B", 10.811),
        ("C", 12.0107),
        ("N", 14.0067),
        ("O", 15.9994),
        ("Na", 22.98977),
        ("Al", 26.981538),
        ("Si", 28.0855),
        ("Ar", 39.948),
        ("Ca", 40.078),
        ("Fe", 55.845),
        ("Ni", 58.6934),
        ("Cu", 63.546),
        ("Ge", 72.64),
        ("Mo", 95.94),
        ("Sn", 118.71),
        ("W", 183.84),
        ("Au", 196.96655),
        ("Pb", 207.2),
        ("U", 238.02891),
    ])
});

/// Whether a channel participates as scattering or absorption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReactionCategory {
    Scattering,
    Absorption,
}

/// Final-state law description carried by a reaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DistributionRecord {
    Elastic {
        atomic_weight_ratio: f64,
    },
    Tabular {
        incoming: Vec<f64>,
        outgoing: Vec<Vec<f64>>,
        density: Vec<Vec<f64>>,
    },
    AdjointKleinNishina {
        max_energy: f64,
    },
    AdjointEnergyGain {
        #[serde(default)]
        subshell: Option<Subshell>,
        #[serde(default)]
        binding_energy: f64,
        min_energy: f64,
        max_energy: f64,
        incoming: Vec<f64>,
        outgoing: Vec<Vec<f64>>,
        density: Vec<Vec<f64>>,
    },
}

impl DistributionRecord {
    /// Resolve the record into a concrete distribution. Adjoint variants
    /// receive the atom's shared critical-line-energy list.
    fn build(
        self,
        critical_line_energies: &Arc<Vec<f64>>,
    ) -> Result<ScatteringDistribution, DataError> {
        match self {
            DistributionRecord::Elastic {
                atomic_weight_ratio,
            } => Ok(ScatteringDistribution::Elastic {
                atomic_weight_ratio,
            }),
            DistributionRecord::Tabular {
                incoming,
                outgoing,
                density,
            } => Ok(ScatteringDistribution::Tabular(build_gain_table(
                incoming, outgoing, density,
            )?)),
            DistributionRecord::AdjointKleinNishina { max_energy } => {
                Ok(ScatteringDistribution::AdjointKleinNishina(
                    AdjointKleinNishina::new(max_energy, critical_line_energies.clone())?,
                ))
            }
            DistributionRecord::AdjointEnergyGain {
                subshell,
                binding_energy,
                min_energy,
                max_energy,
                incoming,
                outgoing,
                density,
            } => {
                let table = build_gain_table(incoming, outgoing, density)?;
                Ok(ScatteringDistribution::AdjointEnergyGain(
                    AdjointEnergyGainDistribution::new(
                        subshell,
                        binding_energy,
                        min_energy,
                        max_energy,
                        critical_line_energies.clone(),
                        table,
                    )?,
                ))
            }
        }
    }
}

fn build_gain_table(
    incoming: Vec<f64>,
    outgoing: Vec<Vec<f64>>,
    density: Vec<Vec<f64>>,
) -> Result<EnergyGainTable, DataError> {
    if outgoing.len() != density.len() {
        return Err(DataError::DistributionLengthMismatch {
            values: outgoing.len(),
            densities: density.len(),
        });
    }
    let rows = outgoing
        .into_iter()
        .zip(density)
        .map(|(values, densities)| TabularPdf::new(values, densities))
        .collect::<Result<Vec<_>, _>>()?;
    EnergyGainTable::new(incoming, rows)
}

/// One interaction channel as parsed from the data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub reaction_type: ReactionType,
    /// Scattering/absorption split; defaults from the reaction type.
    #[serde(default)]
    pub category: Option<ReactionCategory>,
    /// When present, the channel is registered as a line-energy reaction at
    /// this exact energy instead of in the continuous maps.
    #[serde(default)]
    pub line_energy: Option<f64>,
    #[serde(default)]
    pub threshold_index: usize,
    pub cross_sections: Vec<f64>,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub distribution: Option<DistributionRecord>,
}

/// Everything needed to assemble one atom, as parsed from the data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomRecord {
    pub name: String,
    pub atomic_number: u32,
    /// Atomic weight in g/mol; looked up in the built-in table when absent.
    #[serde(default)]
    pub atomic_weight: Option<f64>,
    /// Union energy grid shared by every channel of this atom.
    pub energy_grid: Vec<f64>,
    #[serde(default)]
    pub critical_line_energies: Vec<f64>,
    /// Total cross section of the forward physical model.
    pub total_forward: ReactionRecord,
    pub reactions: Vec<ReactionRecord>,
}

impl AtomRecord {
    /// Parse a record from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Assemble the atom: build the shared grid and searcher once, align
    /// every channel to it, and validate the core invariants.
    pub fn build(self) -> Result<Atom, DataError> {
        let atomic_weight = match self.atomic_weight {
            Some(weight) => weight,
            None => *ATOMIC_WEIGHTS
                .get(self.name.as_str())
                .ok_or_else(|| DataError::UnknownAtomicWeight(self.name.clone()))?,
        };

        let grid = Arc::new(self.energy_grid);
        let searcher = Arc::new(HashGridSearcher::new(grid)?);
        let critical_line_energies = Arc::new(self.critical_line_energies);

        let build_reaction = |record: ReactionRecord| -> Result<Arc<Reaction>, DataError> {
            let distribution = match record.distribution {
                Some(dist_record) => Some(Arc::new(dist_record.build(&critical_line_energies)?)),
                None => None,
            };
            Ok(Arc::new(Reaction::new(
                record.reaction_type,
                searcher.clone(),
                record.cross_sections,
                record.threshold_index,
                record.interpolation,
                distribution,
            )?))
        };

        let total_forward = build_reaction(self.total_forward)?;

        let mut scattering = ReactionMap::new();
        let mut absorption = ReactionMap::new();
        let mut line_energy: Vec<(f64, ReactionMap)> = Vec::new();

        for record in self.reactions {
            let category = record.category.unwrap_or_else(|| {
                if record.reaction_type.is_absorption() {
                    ReactionCategory::Absorption
                } else {
                    ReactionCategory::Scattering
                }
            });
            let line = record.line_energy;
            let reaction = build_reaction(record)?;

            match line {
                Some(energy) => {
                    let slot = line_energy.iter().position(|(e, _)| *e == energy);
                    let map = match slot {
                        Some(index) => &mut line_energy[index].1,
                        None => {
                            line_energy.push((energy, ReactionMap::new()));
                            &mut line_energy.last_mut().unwrap().1
                        }
                    };
                    map.insert(reaction.reaction_type(), reaction);
                }
                None => {
                    let map = match category {
                        ReactionCategory::Scattering => &mut scattering,
                        ReactionCategory::Absorption => &mut absorption,
                    };
                    map.insert(reaction.reaction_type(), reaction);
                }
            }
        }

        let core = ReactionCore::new(
            total_forward,
            scattering,
            absorption,
            line_energy,
            critical_line_energies,
        )?;

        log::debug!(
            "assembled atom {} (Z = {}): {} scattering, {} absorption, {} line-energy channels",
            self.name,
            self.atomic_number,
            core.scattering_reactions().len(),
            core.absorption_reactions().len(),
            core.line_energy_reactions().len()
        );

        Atom::new(self.name, self.atomic_number, atomic_weight, core)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_record() -> AtomRecord {
        AtomRecord {
            name: "Si".to_string(),
            atomic_number: 14,
            atomic_weight: None,
            energy_grid: vec![1e-5, 1.0, 20.0],
            critical_line_energies: vec![0.511],
            total_forward: ReactionRecord {
                reaction_type: ReactionType::TotalForward,
                category: None,
                line_energy: None,
                threshold_index: 0,
                cross_sections: vec![4.0, 4.0, 4.0],
                interpolation: Interpolation::LinLin,
                distribution: None,
            },
            reactions: vec![
                ReactionRecord {
                    reaction_type: ReactionType::IncoherentScattering,
                    category: None,
                    line_energy: None,
                    threshold_index: 0,
                    cross_sections: vec![2.0, 2.0, 2.0],
                    interpolation: Interpolation::LinLin,
                    distribution: Some(DistributionRecord::AdjointKleinNishina {
                        max_energy: 20.0,
                    }),
                },
                ReactionRecord {
                    reaction_type: ReactionType::PhotoelectricAbsorption,
                    category: None,
                    line_energy: None,
                    threshold_index: 0,
                    cross_sections: vec![0.5, 0.5, 0.5],
                    interpolation: Interpolation::LinLin,
                    distribution: None,
                },
                ReactionRecord {
                    reaction_type: ReactionType::PairProduction,
                    category: None,
                    line_energy: Some(0.511),
                    threshold_index: 0,
                    cross_sections: vec![3.0, 3.0, 3.0],
                    interpolation: Interpolation::LinLin,
                    distribution: Some(DistributionRecord::AdjointKleinNishina {
                        max_energy: 20.0,
                    }),
                },
            ],
        }
    }

    #[test]
    fn test_build_atom_from_record() {
        let atom = simple_record().build().unwrap();
        assert_eq!(atom.name(), "Si");
        assert_eq!(atom.atomic_number(), 14);
        // Weight came from the built-in table
        assert!((atom.atomic_weight() - 28.0855).abs() < 1e-12);
        assert_eq!(atom.total_cross_section(1.0), 2.5);
        assert_eq!(atom.total_forward_cross_section(1.0), 4.0);
        assert!(atom.has_line_energy_reaction(0.511));
        assert_eq!(atom.core().scattering_reactions().len(), 1);
        assert_eq!(atom.core().absorption_reactions().len(), 1);
    }

    #[test]
    fn test_unknown_atomic_weight_rejected() {
        let mut record = simple_record();
        record.name = "Unobtainium".to_string();
        assert!(matches!(
            record.build(),
            Err(DataError::UnknownAtomicWeight(_))
        ));
    }

    #[test]
    fn test_bad_grid_rejected() {
        let mut record = simple_record();
        record.energy_grid = vec![1.0, 1.0, 20.0];
        assert!(matches!(
            record.build(),
            Err(DataError::NonMonotonicGrid { .. })
        ));
    }

    #[test]
    fn test_line_energy_must_be_declared_critical() {
        let mut record = simple_record();
        record.critical_line_energies = vec![];
        assert!(matches!(
            record.build(),
            Err(DataError::UnknownLineEnergy(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let text = serde_json::to_string(&simple_record()).unwrap();
        let atom = AtomRecord::from_json_str(&text).unwrap().build().unwrap();
        assert_eq!(atom.name(), "Si");
        assert_eq!(atom.total_cross_section(1.0), 2.5);
    }

    #[test]
    fn test_explicit_category_overrides_default() {
        let mut record = simple_record();
        // Force the photoelectric channel into the scattering map
        record.reactions[1].category = Some(ReactionCategory::Scattering);
        let atom = record.build().unwrap();
        assert_eq!(atom.core().scattering_reactions().len(), 2);
        assert_eq!(atom.core().absorption_reactions().len(), 0);
    }
}
