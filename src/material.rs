use crate::atom::Atom;
use crate::bank::ParticleBank;
use crate::constants::{AVOGADRO, BARNS_TO_CM2};
use crate::error::DataError;
use crate::particle::Particle;
use crate::reaction::{ReactionType, Subshell};
use rand::Rng;
use std::sync::Arc;

/// A homogeneous mixture of atoms with number-density-weighted fractions.
///
/// Constructed once from signed density/fraction conventions and stored in
/// a single canonical form: positive atom fractions summing to one plus a
/// bulk number density in atoms/b-cm. Macroscopic cross sections follow the
/// linear mixture rule, exact for non-interacting constituents.
///
/// Immutable after construction; shared read-only across threads.
#[derive(Debug, Clone)]
pub struct Material {
    id: u32,
    number_density: f64,
    atoms: Vec<(f64, Arc<Atom>)>,
}

impl Material {
    /// Build a material from constituent atoms.
    ///
    /// Sign conventions (both resolved here, never stored):
    /// * `fractions` all positive: atom fractions (normalized to sum 1);
    ///   all negative: weight fractions, converted through the atomic
    ///   weights. Mixed signs are rejected.
    /// * `density` positive: atoms/b-cm; negative: mass density in g/cm3,
    ///   converted with the mixture's average molar mass.
    pub fn new(
        id: u32,
        atoms: Vec<Arc<Atom>>,
        fractions: &[f64],
        density: f64,
    ) -> Result<Self, DataError> {
        if atoms.is_empty() {
            return Err(DataError::EmptyMaterial { id });
        }
        if atoms.len() != fractions.len() {
            return Err(DataError::FractionCountMismatch {
                id,
                fractions: fractions.len(),
                atoms: atoms.len(),
            });
        }
        if density == 0.0 || !density.is_finite() {
            return Err(DataError::ZeroDensity { id });
        }

        let all_positive = fractions.iter().all(|&f| f > 0.0);
        let all_negative = fractions.iter().all(|&f| f < 0.0);
        if !all_positive && !all_negative {
            return Err(DataError::MixedFractionSigns { id });
        }

        // Weight fractions convert to atom fractions through the atomic
        // weights; afterwards everything is one positive convention.
        let mut atom_fractions: Vec<f64> = if all_negative {
            fractions
                .iter()
                .zip(&atoms)
                .map(|(&w, atom)| -w / atom.atomic_weight())
                .collect()
        } else {
            fractions.to_vec()
        };

        let total: f64 = atom_fractions.iter().sum();
        for fraction in &mut atom_fractions {
            *fraction /= total;
        }

        let number_density = if density > 0.0 {
            density
        } else {
            // Mass density in g/cm3 -> atoms/b-cm via the average molar mass
            let average_molar_mass: f64 = atom_fractions
                .iter()
                .zip(&atoms)
                .map(|(&f, atom)| f * atom.atomic_weight())
                .sum();
            -density * AVOGADRO / average_molar_mass * BARNS_TO_CM2
        };

        log::debug!(
            "material {}: {} constituents, number density {:.6e} atoms/b-cm",
            id,
            atoms.len(),
            number_density
        );

        Ok(Material {
            id,
            number_density,
            atoms: atom_fractions.into_iter().zip(atoms).collect(),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Bulk number density in atoms/b-cm.
    pub fn number_density(&self) -> f64 {
        self.number_density
    }

    /// Constituents as (atom fraction, atom) pairs; fractions sum to one.
    pub fn atoms(&self) -> &[(f64, Arc<Atom>)] {
        &self.atoms
    }

    fn macroscopic<F: Fn(&Atom) -> f64>(&self, microscopic: F) -> f64 {
        self.number_density
            * self
                .atoms
                .iter()
                .map(|(fraction, atom)| fraction * microscopic(atom))
                .sum::<f64>()
    }

    /// Macroscopic total cross section in 1/cm.
    pub fn macroscopic_total_cross_section(&self, energy: f64) -> f64 {
        self.macroscopic(|atom| atom.total_cross_section(energy))
    }

    /// Macroscopic absorption cross section in 1/cm.
    pub fn macroscopic_absorption_cross_section(&self, energy: f64) -> f64 {
        self.macroscopic(|atom| atom.absorption_cross_section(energy))
    }

    /// Macroscopic total cross section of the forward physical model.
    pub fn macroscopic_total_forward_cross_section(&self, energy: f64) -> f64 {
        self.macroscopic(|atom| atom.total_forward_cross_section(energy))
    }

    /// Macroscopic summed line-energy cross section at exactly `energy`.
    pub fn macroscopic_total_line_energy_cross_section(&self, energy: f64) -> f64 {
        self.macroscopic(|atom| atom.total_line_energy_cross_section(energy))
    }

    /// Macroscopic cross section of one reaction channel (tally query).
    pub fn macroscopic_reaction_cross_section(
        &self,
        energy: f64,
        reaction_type: ReactionType,
    ) -> f64 {
        self.macroscopic(|atom| atom.reaction_cross_section(energy, reaction_type))
    }

    /// Probability that a collision in this material scatters.
    pub fn survival_probability(&self, energy: f64) -> f64 {
        let total = self.macroscopic_total_cross_section(energy);
        if total > 0.0 {
            (1.0 - self.macroscopic_absorption_cross_section(energy) / total).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Adjoint-to-forward macroscopic total cross-section ratio, the weight
    /// correction applied before adjoint collisions. 1.0 when the forward
    /// cross section vanishes.
    pub fn adjoint_weight_factor(&self, energy: f64) -> f64 {
        let forward = self.macroscopic_total_forward_cross_section(energy);
        if forward > 0.0 {
            self.macroscopic_total_cross_section(energy) / forward
        } else {
            1.0
        }
    }

    /// Line-energy analogue of [`Material::adjoint_weight_factor`]; zero
    /// when no constituent registers a line reaction at `energy`.
    pub fn adjoint_line_energy_weight_factor(&self, energy: f64) -> f64 {
        let forward = self.macroscopic_total_forward_cross_section(energy);
        if forward > 0.0 {
            self.macroscopic_total_line_energy_cross_section(energy) / forward
        } else {
            1.0
        }
    }

    /// Whether any constituent has a line-energy reaction at `energy`.
    pub fn has_line_energy_reaction(&self, energy: f64) -> bool {
        self.atoms
            .iter()
            .any(|(_, atom)| atom.has_line_energy_reaction(energy))
    }

    /// Sample which atom is struck at `energy`, weighting each by
    /// fraction * total cross section.
    ///
    /// When cumulative rounding leaves every partial sum below the scaled
    /// draw, the final atom is selected; sampling never fails on a material
    /// with a positive total cross section.
    pub fn sample_collision_atom<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> usize {
        self.sample_atom_index(rng, |atom| atom.total_cross_section(energy))
    }

    /// Sample which atom is struck at a line energy, weighting by
    /// fraction * line-energy cross section.
    pub fn sample_collision_atom_at_line_energy<R: Rng + ?Sized>(
        &self,
        energy: f64,
        rng: &mut R,
    ) -> usize {
        self.sample_atom_index(rng, |atom| atom.total_line_energy_cross_section(energy))
    }

    fn sample_atom_index<R: Rng + ?Sized, F: Fn(&Atom) -> f64>(
        &self,
        rng: &mut R,
        cross_section: F,
    ) -> usize {
        let weights: Vec<f64> = self
            .atoms
            .iter()
            .map(|(fraction, atom)| fraction * cross_section(atom))
            .collect();
        let total: f64 = weights.iter().sum();

        let scaled_random_number = rng.gen::<f64>() * total;
        let mut partial = 0.0;
        for (index, weight) in weights.iter().enumerate() {
            partial += weight;
            if scaled_random_number < partial {
                return index;
            }
        }
        // Fall through to the final atom on floating-point shortfall
        self.atoms.len() - 1
    }

    /// Sample the struck atom, then collide analogue with it.
    pub fn collide_analogue<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        let index = self.sample_collision_atom(particle.energy(), rng);
        self.atoms[index].1.collide_analogue(particle, bank, rng)
    }

    /// Sample the struck atom, then collide with survival biasing.
    pub fn collide_survival_bias<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        let index = self.sample_collision_atom(particle.energy(), rng);
        self.atoms[index].1.collide_survival_bias(particle, bank, rng)
    }

    /// Sample the struck atom among line-energy cross sections, then
    /// collide at the probe's line energy.
    pub fn collide_at_line_energy<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) -> Option<Subshell> {
        let index = self.sample_collision_atom_at_line_energy(particle.energy(), rng);
        self.atoms[index].1.collide_at_line_energy(particle, bank, rng)
    }
}
