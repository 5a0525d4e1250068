use crate::atom_core::{ReactionCore, ReactionMap};
use crate::bank::ParticleBank;
use crate::particle::Particle;
use crate::reaction::{ReactionType, Subshell};
use rand::Rng;

/// One atomic species: identity plus its reaction core and the per-atom
/// collision algorithms.
///
/// The core is held by value but its internals are shared handles, so
/// copying an `Atom` is cheap and every copy reads the same immutable
/// tables. Atoms are constructed once at setup time and shared read-only
/// (via `Arc`) across all materials and worker threads that reference the
/// same species.
#[derive(Debug, Clone)]
pub struct Atom {
    name: String,
    atomic_number: u32,
    atomic_weight: f64,
    core: ReactionCore,
}

impl Atom {
    pub fn new(
        name: impl Into<String>,
        atomic_number: u32,
        atomic_weight: f64,
        core: ReactionCore,
    ) -> Result<Self, crate::error::DataError> {
        if !(atomic_weight > 0.0) {
            return Err(crate::error::DataError::InvalidAtomicWeight(atomic_weight));
        }
        Ok(Atom {
            name: name.into(),
            atomic_number,
            atomic_weight,
            core,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub fn atomic_weight(&self) -> f64 {
        self.atomic_weight
    }

    pub fn core(&self) -> &ReactionCore {
        &self.core
    }

    /// Sum of the scattering channel cross sections at a resolved bin.
    pub fn scattering_cross_section_in_bin(&self, energy: f64, bin: usize) -> f64 {
        self.core
            .scattering_reactions()
            .values()
            .map(|r| r.cross_section_in_bin(energy, bin))
            .sum()
    }

    /// Sum of the absorption channel cross sections at a resolved bin.
    pub fn absorption_cross_section_in_bin(&self, energy: f64, bin: usize) -> f64 {
        self.core
            .absorption_reactions()
            .values()
            .map(|r| r.cross_section_in_bin(energy, bin))
            .sum()
    }

    /// Total (scattering + absorption) cross section in barns. Zero outside
    /// the tabulated grid.
    pub fn total_cross_section(&self, energy: f64) -> f64 {
        if !self.core.grid_searcher().contains_energy(energy) {
            return 0.0;
        }
        let bin = self.core.grid_searcher().lower_bin_index(energy);
        self.scattering_cross_section_in_bin(energy, bin)
            + self.absorption_cross_section_in_bin(energy, bin)
    }

    /// Total absorption cross section in barns.
    pub fn absorption_cross_section(&self, energy: f64) -> f64 {
        if !self.core.grid_searcher().contains_energy(energy) {
            return 0.0;
        }
        let bin = self.core.grid_searcher().lower_bin_index(energy);
        self.absorption_cross_section_in_bin(energy, bin)
    }

    /// Total scattering cross section in barns.
    pub fn scattering_cross_section(&self, energy: f64) -> f64 {
        if !self.core.grid_searcher().contains_energy(energy) {
            return 0.0;
        }
        let bin = self.core.grid_searcher().lower_bin_index(energy);
        self.scattering_cross_section_in_bin(energy, bin)
    }

    /// Total cross section of the forward (non-adjoint) physical model.
    pub fn total_forward_cross_section(&self, energy: f64) -> f64 {
        self.core.total_forward_reaction().cross_section(energy)
    }

    /// Summed cross section of the reactions registered at exactly
    /// `energy`, or zero when no line-energy reactions exist there.
    pub fn total_line_energy_cross_section(&self, energy: f64) -> f64 {
        match self.core.line_energy_reactions_at(energy) {
            Some(reactions) => reactions.values().map(|r| r.cross_section(energy)).sum(),
            None => 0.0,
        }
    }

    /// Whether `energy` exactly matches a registered line-energy reaction.
    pub fn has_line_energy_reaction(&self, energy: f64) -> bool {
        self.core.line_energy_reactions_at(energy).is_some()
    }

    /// Adjoint-to-forward total cross-section ratio.
    ///
    /// Defined as 1.0 when the forward cross section vanishes (no forward
    /// interaction means no correction is meaningful). Strictly positive
    /// whenever applied; a non-positive ratio indicates defective data.
    pub fn adjoint_weight_factor(&self, energy: f64) -> f64 {
        let forward = self.total_forward_cross_section(energy);
        let weight_factor = if forward > 0.0 {
            self.total_cross_section(energy) / forward
        } else {
            1.0
        };
        debug_assert!(weight_factor >= 0.0);
        weight_factor
    }

    /// Line-energy analogue of [`Atom::adjoint_weight_factor`]: line total
    /// over forward total. Zero when no line reactions exist at `energy`.
    pub fn adjoint_line_energy_weight_factor(&self, energy: f64) -> f64 {
        let forward = self.total_forward_cross_section(energy);
        let weight_factor = if forward > 0.0 {
            self.total_line_energy_cross_section(energy) / forward
        } else {
            1.0
        };
        debug_assert!(weight_factor >= 0.0);
        weight_factor
    }

    /// Probability that a collision at `energy` scatters rather than
    /// absorbs: 1 - sigma_a/sigma_t, or 1.0 when the total vanishes.
    pub fn survival_probability(&self, energy: f64) -> f64 {
        let total = self.total_cross_section(energy);
        let survival_prob = if total > 0.0 {
            1.0 - self.absorption_cross_section(energy) / total
        } else {
            1.0
        };
        debug_assert!((0.0..=1.0 + 1e-12).contains(&survival_prob));
        survival_prob.clamp(0.0, 1.0)
    }

    /// Cross section of one specific reaction channel (tally query).
    ///
    /// `TotalForward` resolves to the stored total forward reaction;
    /// unknown channels yield zero.
    pub fn reaction_cross_section(&self, energy: f64, reaction_type: ReactionType) -> f64 {
        if reaction_type == ReactionType::TotalForward {
            return self.total_forward_cross_section(energy);
        }
        if let Some(reaction) = self.core.scattering_reactions().get(&reaction_type) {
            return reaction.cross_section(energy);
        }
        if let Some(reaction) = self.core.absorption_reactions().get(&reaction_type) {
            return reaction.cross_section(energy);
        }
        0.0
    }

    /// Analogue collision: sample scattering vs absorption in proportion to
    /// the channel cross sections. Absorption is terminal regardless of any
    /// secondaries the absorbing reaction emitted first.
    pub fn collide_analogue<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        debug_assert!(
            self.core.grid_searcher().contains_energy(particle.energy()),
            "collision at energy {} outside the grid",
            particle.energy()
        );

        let energy = particle.energy();
        let bin = self.core.grid_searcher().lower_bin_index(energy);
        let scattering = self.scattering_cross_section_in_bin(energy, bin);
        let absorption = self.absorption_cross_section_in_bin(energy, bin);

        let scaled_random_number = rng.gen::<f64>() * (scattering + absorption);

        if scaled_random_number < absorption {
            let shell = self.sample_reaction_from_map(
                self.core.absorption_reactions(),
                scaled_random_number,
                bin,
                particle,
                bank,
                rng,
            );
            // Absorption is terminal in analogue mode
            particle.set_gone();
            shell
        } else {
            self.sample_reaction_from_map(
                self.core.scattering_reactions(),
                scaled_random_number - absorption,
                bin,
                particle,
                bank,
                rng,
            )
        }
    }

    /// Survival-biased collision: split the history into a scattered
    /// continuation (weight * p_survive) and an absorbed copy
    /// (weight * (1 - p_survive)) that may emit secondaries before being
    /// dropped. Guarantees termination by energy cutoff instead of
    /// probabilistic absorption.
    pub fn collide_survival_bias<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        debug_assert!(
            self.core.grid_searcher().contains_energy(particle.energy()),
            "collision at energy {} outside the grid",
            particle.energy()
        );

        let energy = particle.energy();
        let bin = self.core.grid_searcher().lower_bin_index(energy);
        let scattering = self.scattering_cross_section_in_bin(energy, bin);
        let absorption = self.absorption_cross_section_in_bin(energy, bin);

        let total = scattering + absorption;
        let survival_prob = if total > 0.0 { scattering / total } else { 1.0 };

        if survival_prob > 0.0 {
            // The absorbed continuation reacts with the complementary
            // weight, then is dropped; its secondaries stay in the bank.
            let mut absorbed_copy = particle.clone();

            particle.multiply_weight(survival_prob);
            let shell = self.sample_reaction_from_map(
                self.core.scattering_reactions(),
                rng.gen::<f64>() * scattering,
                bin,
                particle,
                bank,
                rng,
            );

            absorbed_copy.multiply_weight(1.0 - survival_prob);
            if absorption > 0.0 {
                self.sample_reaction_from_map(
                    self.core.absorption_reactions(),
                    rng.gen::<f64>() * absorption,
                    bin,
                    &mut absorbed_copy,
                    bank,
                    rng,
                );
            }
            shell
        } else {
            let shell = self.sample_reaction_from_map(
                self.core.absorption_reactions(),
                rng.gen::<f64>() * absorption,
                bin,
                particle,
                bank,
                rng,
            );
            particle.set_gone();
            shell
        }
    }

    /// Line-energy collision: sample among the reactions registered at the
    /// probe's exact energy. No absorption concept applies here; every
    /// line-energy reaction is scattering-like by construction.
    pub fn collide_at_line_energy<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        debug_assert!(particle.is_probe(), "line-energy collisions require a probe");
        let energy = particle.energy();
        let Some(reactions) = self.core.line_energy_reactions_at(energy) else {
            debug_assert!(false, "no line-energy reactions at energy {}", energy);
            return None;
        };

        let scaled_random_number =
            rng.gen::<f64>() * self.total_line_energy_cross_section(energy);

        let mut partial_cross_section = 0.0;
        let mut selected = None;
        for reaction in reactions.values() {
            partial_cross_section += reaction.cross_section(energy);
            if scaled_random_number < partial_cross_section {
                selected = Some(reaction);
                break;
            }
        }
        // Cumulative rounding shortfall selects the final channel
        let reaction = selected.unwrap_or_else(|| reactions.values().next_back().unwrap());

        reaction.react(particle, bank, rng)
    }

    /// Cumulative-sum channel selection over one reaction map. When the
    /// partial sums never exceed the scaled draw (floating-point
    /// shortfall), the final channel is selected rather than failing.
    fn sample_reaction_from_map<R: Rng + ?Sized>(
        &self,
        reactions: &ReactionMap,
        scaled_random_number: f64,
        bin: usize,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        debug_assert!(!reactions.is_empty(), "sampling from an empty reaction map");

        let energy = particle.energy();
        let mut partial_cross_section = 0.0;
        let mut selected = None;
        for reaction in reactions.values() {
            partial_cross_section += reaction.cross_section_in_bin(energy, bin);
            if scaled_random_number < partial_cross_section {
                selected = Some(reaction);
                break;
            }
        }
        let reaction = selected.unwrap_or_else(|| reactions.values().next_back().unwrap());

        reaction.react(particle, bank, rng)
    }
}
