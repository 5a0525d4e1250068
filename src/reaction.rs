use crate::bank::ParticleBank;
use crate::distribution::ScatteringDistribution;
use crate::error::DataError;
use crate::grid::HashGridSearcher;
use crate::interpolation::Interpolation;
use crate::particle::Particle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Atomic subshell of an ionization interaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Subshell {
    K,
    L1,
    L2,
    L3,
    M1,
    M2,
    M3,
    M4,
    M5,
}

impl fmt::Display for Subshell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Physical interaction channel identifier.
///
/// One tag per tabulated reaction kind; per-subshell ionization carries its
/// subshell so each subshell is an independent channel with its own
/// threshold and cross-section table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReactionType {
    /// The total cross section of the forward (non-adjoint) physical model;
    /// the reference the adjoint weight factor is defined against.
    TotalForward,
    // photon interactions
    IncoherentScattering,
    CoherentScattering,
    PhotoelectricAbsorption,
    PairProduction,
    TripletProduction,
    // electron / positron interactions
    Bremsstrahlung,
    AtomicExcitation,
    CutoffElasticScattering,
    ScreenedRutherfordElasticScattering,
    MomentPreservingElasticScattering,
    CoupledElasticScattering,
    HybridElasticScattering,
    TotalElectroionization,
    ElectroionizationSubshell(Subshell),
    PositronAnnihilation,
    // neutron interactions
    NeutronElasticScattering,
    NeutronInelasticScattering,
    RadiativeCapture,
    Fission,
}

impl ReactionType {
    /// Whether this channel removes the particle from the problem in the
    /// forward sense (used as the default scattering/absorption split when
    /// assembling a core from records).
    pub fn is_absorption(self) -> bool {
        matches!(
            self,
            ReactionType::PhotoelectricAbsorption
                | ReactionType::RadiativeCapture
                | ReactionType::Fission
                | ReactionType::PositronAnnihilation
        )
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionType::ElectroionizationSubshell(shell) => {
                write!(f, "electroionization ({} subshell)", shell)
            }
            other => write!(f, "{:?}", other),
        }
    }
}

/// One interaction channel of an atom: a cross-section table aligned to the
/// shared energy grid plus an optional final-state distribution.
///
/// The cross-section values start at `threshold_index` into the shared grid
/// (channels with thresholds tabulate nothing below them). The reaction
/// never owns its grid; it references the grid through the core's shared
/// hash searcher, which is what makes material-level aggregation loops able
/// to resolve a bin once and reuse it across every channel.
#[derive(Debug, Clone)]
pub struct Reaction {
    reaction_type: ReactionType,
    grid_searcher: Arc<HashGridSearcher>,
    cross_sections: Vec<f64>,
    threshold_index: usize,
    interpolation: Interpolation,
    distribution: Option<Arc<ScatteringDistribution>>,
}

impl Reaction {
    pub fn new(
        reaction_type: ReactionType,
        grid_searcher: Arc<HashGridSearcher>,
        cross_sections: Vec<f64>,
        threshold_index: usize,
        interpolation: Interpolation,
        distribution: Option<Arc<ScatteringDistribution>>,
    ) -> Result<Self, DataError> {
        let grid_len = grid_searcher.grid().len();
        if threshold_index + cross_sections.len() != grid_len {
            return Err(DataError::CrossSectionLengthMismatch {
                cross_sections: cross_sections.len(),
                threshold: threshold_index,
                grid: grid_len,
            });
        }
        for (index, &value) in cross_sections.iter().enumerate() {
            if value < 0.0 || !value.is_finite() {
                return Err(DataError::NegativeCrossSection { index, value });
            }
        }

        Ok(Reaction {
            reaction_type,
            grid_searcher,
            cross_sections,
            threshold_index,
            interpolation,
            distribution,
        })
    }

    pub fn reaction_type(&self) -> ReactionType {
        self.reaction_type
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn threshold_index(&self) -> usize {
        self.threshold_index
    }

    /// Lowest energy with a tabulated cross section.
    pub fn threshold_energy(&self) -> f64 {
        self.grid_searcher.grid()[self.threshold_index]
    }

    pub fn grid_searcher(&self) -> &Arc<HashGridSearcher> {
        &self.grid_searcher
    }

    /// The shared energy grid (by reference; never copied per reaction).
    pub fn energy_grid(&self) -> &Arc<Vec<f64>> {
        self.grid_searcher.grid()
    }

    /// Whether this reaction's grid is the same allocation as `other`'s.
    ///
    /// Grid sharing is structural identity, not numeric equality: two
    /// numerically equal grids in different allocations do not count.
    pub fn shares_energy_grid(&self, other: &Reaction) -> bool {
        Arc::ptr_eq(self.energy_grid(), other.energy_grid())
    }

    pub fn is_energy_within_grid(&self, energy: f64) -> bool {
        self.grid_searcher.contains_energy(energy)
    }

    pub fn distribution(&self) -> Option<&Arc<ScatteringDistribution>> {
        self.distribution.as_ref()
    }

    /// Cross section at `energy` in barns.
    ///
    /// Zero below the reaction threshold and above the last grid point.
    pub fn cross_section(&self, energy: f64) -> f64 {
        let grid = self.grid_searcher.grid();
        if energy < grid[self.threshold_index] || energy > grid[grid.len() - 1] {
            return 0.0;
        }
        let bin = self.grid_searcher.lower_bin_index(energy);
        self.cross_section_in_bin(energy, bin)
    }

    /// Cross section at `energy` when the caller has already resolved the
    /// grid bin (the aggregation fast path).
    pub fn cross_section_in_bin(&self, energy: f64, bin: usize) -> f64 {
        let grid = self.grid_searcher.grid();
        debug_assert!(bin + 1 < grid.len(), "bin {} out of range", bin);
        debug_assert!(
            energy >= grid[bin] && energy <= grid[bin + 1],
            "energy {} not inside bin {}",
            energy,
            bin
        );

        if bin < self.threshold_index {
            return 0.0;
        }

        let i = bin - self.threshold_index;
        let value = self.interpolation.interpolate(
            grid[bin],
            grid[bin + 1],
            self.cross_sections[i],
            self.cross_sections[i + 1],
            energy,
        );

        debug_assert!(value >= 0.0, "negative interpolated cross section {}", value);
        value
    }

    /// Sample a final state for `particle`, appending secondaries (and, for
    /// adjoint channels, probe particles) to `bank`.
    ///
    /// Returns the subshell of the interaction for ionization channels.
    /// The particle energy must lie within the shared grid (checked
    /// precondition; the collision kernel bounds energies upstream).
    pub fn react<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        debug_assert!(
            self.is_energy_within_grid(particle.energy()),
            "react() called with energy {} outside the grid",
            particle.energy()
        );

        if let Some(distribution) = &self.distribution {
            distribution.scatter(particle, bank, rng);
        }

        match self.reaction_type {
            ReactionType::ElectroionizationSubshell(shell) => Some(shell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn searcher(points: Vec<f64>) -> Arc<HashGridSearcher> {
        Arc::new(HashGridSearcher::new(Arc::new(points)).unwrap())
    }

    fn flat_reaction(
        searcher: &Arc<HashGridSearcher>,
        reaction_type: ReactionType,
        values: Vec<f64>,
        threshold_index: usize,
    ) -> Reaction {
        Reaction::new(
            reaction_type,
            searcher.clone(),
            values,
            threshold_index,
            Interpolation::LinLin,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_length_validation() {
        let s = searcher(vec![1.0, 2.0, 4.0, 8.0]);
        let result = Reaction::new(
            ReactionType::Bremsstrahlung,
            s.clone(),
            vec![1.0, 2.0],
            0,
            Interpolation::LinLin,
            None,
        );
        assert!(matches!(
            result,
            Err(DataError::CrossSectionLengthMismatch { .. })
        ));

        // Threshold-offset tables must still cover the rest of the grid
        assert!(Reaction::new(
            ReactionType::Bremsstrahlung,
            s,
            vec![1.0, 2.0],
            2,
            Interpolation::LinLin,
            None,
        )
        .is_ok());
    }

    #[test]
    fn test_negative_cross_section_rejected() {
        let s = searcher(vec![1.0, 2.0]);
        let result = Reaction::new(
            ReactionType::Bremsstrahlung,
            s,
            vec![1.0, -2.0],
            0,
            Interpolation::LinLin,
            None,
        );
        assert!(matches!(result, Err(DataError::NegativeCrossSection { .. })));
    }

    #[test]
    fn test_cross_section_lookup() {
        let s = searcher(vec![1.0, 2.0, 4.0, 8.0]);
        let reaction = flat_reaction(&s, ReactionType::IncoherentScattering, vec![10.0, 20.0, 30.0, 40.0], 0);

        // Grid points are exact
        assert_eq!(reaction.cross_section(1.0), 10.0);
        assert_eq!(reaction.cross_section(8.0), 40.0);
        // Interior values interpolate
        assert_eq!(reaction.cross_section(1.5), 15.0);
        assert_eq!(reaction.cross_section(3.0), 25.0);
        // Outside the grid the cross section vanishes
        assert_eq!(reaction.cross_section(0.5), 0.0);
        assert_eq!(reaction.cross_section(9.0), 0.0);
    }

    #[test]
    fn test_threshold_behavior() {
        let s = searcher(vec![1.0, 2.0, 4.0, 8.0]);
        let reaction = flat_reaction(&s, ReactionType::PairProduction, vec![0.0, 5.0], 2);

        assert_eq!(reaction.threshold_energy(), 4.0);
        // Below threshold: zero, even though the energy is on the grid
        assert_eq!(reaction.cross_section(1.5), 0.0);
        assert_eq!(reaction.cross_section(3.999), 0.0);
        // At and above threshold: interpolated table
        assert_eq!(reaction.cross_section(4.0), 0.0);
        assert_eq!(reaction.cross_section(6.0), 2.5);
        assert_eq!(reaction.cross_section(8.0), 5.0);
    }

    #[test]
    fn test_bin_fast_path_matches_search_path() {
        let s = searcher(vec![1.0, 2.0, 4.0, 8.0, 16.0]);
        let reaction = flat_reaction(
            &s,
            ReactionType::IncoherentScattering,
            vec![1.0, 4.0, 9.0, 16.0, 25.0],
            0,
        );

        for &e in &[1.0, 1.7, 2.0, 3.3, 7.9, 10.0, 16.0] {
            let bin = s.lower_bin_index(e);
            assert_eq!(
                reaction.cross_section(e),
                reaction.cross_section_in_bin(e, bin),
                "paths disagree at {}",
                e
            );
        }
    }

    #[test]
    fn test_grid_sharing_is_structural() {
        let s = searcher(vec![1.0, 2.0, 4.0]);
        let a = flat_reaction(&s, ReactionType::IncoherentScattering, vec![1.0, 1.0, 1.0], 0);
        let b = flat_reaction(&s, ReactionType::CoherentScattering, vec![2.0, 2.0, 2.0], 0);
        assert!(a.shares_energy_grid(&b));

        // Numerically identical grid, different allocation: not shared
        let s2 = searcher(vec![1.0, 2.0, 4.0]);
        let c = flat_reaction(&s2, ReactionType::CoherentScattering, vec![2.0, 2.0, 2.0], 0);
        assert!(!a.shares_energy_grid(&c));
    }

    #[test]
    fn test_react_without_distribution_leaves_state() {
        use crate::particle::ParticleType;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let s = searcher(vec![0.5, 2.0]);
        let reaction = flat_reaction(&s, ReactionType::PhotoelectricAbsorption, vec![1.0, 1.0], 0);

        let mut particle = Particle::new(
            1,
            ParticleType::Photon,
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            1.0,
        );
        let mut bank = ParticleBank::new();
        let mut rng = StdRng::seed_from_u64(5);

        let shell = reaction.react(&mut particle, &mut bank, &mut rng);
        assert!(shell.is_none());
        assert_eq!(particle.energy(), 1.0);
        assert!(bank.is_empty());
    }

    #[test]
    fn test_subshell_reported() {
        use crate::particle::ParticleType;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let s = searcher(vec![0.5, 2.0]);
        let reaction = flat_reaction(
            &s,
            ReactionType::ElectroionizationSubshell(Subshell::L2),
            vec![1.0, 1.0],
            0,
        );

        let mut particle = Particle::new(
            1,
            ParticleType::AdjointElectron,
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            1.0,
        );
        let mut bank = ParticleBank::new();
        let mut rng = StdRng::seed_from_u64(5);

        let shell = reaction.react(&mut particle, &mut bank, &mut rng);
        assert_eq!(shell, Some(Subshell::L2));
    }

    #[test]
    fn test_absorption_classification() {
        assert!(ReactionType::PhotoelectricAbsorption.is_absorption());
        assert!(ReactionType::RadiativeCapture.is_absorption());
        assert!(!ReactionType::IncoherentScattering.is_absorption());
        assert!(!ReactionType::Bremsstrahlung.is_absorption());
        assert!(!ReactionType::ElectroionizationSubshell(Subshell::K).is_absorption());
    }
}
