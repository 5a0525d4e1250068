use crate::error::DataError;
use crate::grid::HashGridSearcher;
use crate::reaction::{Reaction, ReactionType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reaction channels keyed by type.
///
/// An ordered map so that cumulative-sum sampling scans the channels in a
/// deterministic order, which keeps fixed-seed histories reproducible.
pub type ReactionMap = BTreeMap<ReactionType, Arc<Reaction>>;

/// Immutable, shared bundle of every reaction of one atomic species.
///
/// Owns (by shared reference) the total forward reaction the adjoint weight
/// factor is defined against, the scattering and absorption channel maps,
/// and the line-energy channel maps keyed by critical line energy. All
/// reactions reference the identical energy grid allocation and hash
/// searcher; this is verified at construction, never re-checked on the hot
/// path.
///
/// Cloning a core is cheap: the maps clone `Arc` handles, not reaction
/// data, so an `Atom` can hold a core by value while worker threads share
/// the underlying tables.
#[derive(Debug, Clone)]
pub struct ReactionCore {
    total_forward: Arc<Reaction>,
    scattering: ReactionMap,
    absorption: ReactionMap,
    line_energy: Vec<(f64, ReactionMap)>,
    critical_line_energies: Arc<Vec<f64>>,
    grid_searcher: Arc<HashGridSearcher>,
}

impl ReactionCore {
    pub fn new(
        total_forward: Arc<Reaction>,
        scattering: ReactionMap,
        absorption: ReactionMap,
        mut line_energy: Vec<(f64, ReactionMap)>,
        critical_line_energies: Arc<Vec<f64>>,
    ) -> Result<Self, DataError> {
        if scattering.is_empty() && absorption.is_empty() {
            return Err(DataError::NoReactions);
        }
        if critical_line_energies.windows(2).any(|w| w[1] < w[0]) {
            return Err(DataError::UnsortedLineEnergies);
        }

        // Every line-energy key must be one of the declared critical line
        // energies (bit-exact: probes are spawned at these exact values).
        for (energy, reactions) in &line_energy {
            if !critical_line_energies.iter().any(|&line| line == *energy) {
                return Err(DataError::UnknownLineEnergy(*energy));
            }
            if reactions.is_empty() {
                return Err(DataError::EmptyLineEnergyMap(*energy));
            }
        }
        line_energy.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        let core = ReactionCore {
            grid_searcher: total_forward.grid_searcher().clone(),
            total_forward,
            scattering,
            absorption,
            line_energy,
            critical_line_energies,
        };

        // Shared-grid postcondition: structural identity with the total
        // forward reaction's grid, for every registered channel.
        if let Some(reaction) = core.find_unshared_reaction() {
            return Err(DataError::UnsharedEnergyGrid {
                reaction: reaction.to_string(),
            });
        }

        Ok(core)
    }

    fn find_unshared_reaction(&self) -> Option<ReactionType> {
        let all = self
            .scattering
            .values()
            .chain(self.absorption.values())
            .chain(self.line_energy.iter().flat_map(|(_, map)| map.values()));

        for reaction in all {
            if !reaction.shares_energy_grid(&self.total_forward) {
                return Some(reaction.reaction_type());
            }
        }
        None
    }

    /// Whether every registered reaction references the same energy grid
    /// allocation as the total forward reaction.
    pub fn has_shared_energy_grid(&self) -> bool {
        self.find_unshared_reaction().is_none()
    }

    pub fn total_forward_reaction(&self) -> &Arc<Reaction> {
        &self.total_forward
    }

    pub fn scattering_reactions(&self) -> &ReactionMap {
        &self.scattering
    }

    pub fn absorption_reactions(&self) -> &ReactionMap {
        &self.absorption
    }

    /// Line-energy reaction maps, sorted by energy.
    pub fn line_energy_reactions(&self) -> &[(f64, ReactionMap)] {
        &self.line_energy
    }

    /// The reactions registered at exactly `energy`, if any.
    pub fn line_energy_reactions_at(&self, energy: f64) -> Option<&ReactionMap> {
        self.line_energy
            .iter()
            .find(|(line, _)| *line == energy)
            .map(|(_, map)| map)
    }

    pub fn critical_line_energies(&self) -> &Arc<Vec<f64>> {
        &self.critical_line_energies
    }

    pub fn grid_searcher(&self) -> &Arc<HashGridSearcher> {
        &self.grid_searcher
    }
}
