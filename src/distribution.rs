// Final-state scattering distributions.
//
// The interpolation-law x grid-policy x distribution-mode combinatorics of
// the source data are resolved once at data-load time into one variant of
// the closed `ScatteringDistribution` enum; collisions dispatch on the tag
// at runtime. Every distribution is immutable after construction and safe
// to share across worker threads.

use crate::bank::ParticleBank;
use crate::constants::{CLASSICAL_ELECTRON_RADIUS, CM2_TO_BARNS, ELECTRON_REST_MASS_ENERGY};
use crate::error::DataError;
use crate::kinematics::{
    adjoint_compton_angle_cosine, electron_scattering_angle_cosine, min_inverse_energy_gain_ratio,
    min_scattering_angle_cosine, sample_azimuthal_angle, sample_isotropic_direction,
};
use crate::particle::Particle;
use crate::reaction::Subshell;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tabulated probability density over outgoing energy, normalized at
/// construction. Sampling inverts the piecewise-linear CDF exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularPdf {
    values: Vec<f64>,
    density: Vec<f64>,
    #[serde(skip)]
    cdf: Vec<f64>,
}

impl TabularPdf {
    pub fn new(values: Vec<f64>, density: Vec<f64>) -> Result<Self, DataError> {
        if values.len() < 2 {
            return Err(DataError::DistributionTableTooSmall);
        }
        if values.len() != density.len() {
            return Err(DataError::DistributionLengthMismatch {
                values: values.len(),
                densities: density.len(),
            });
        }
        for w in values.windows(2) {
            if w[1] <= w[0] {
                return Err(DataError::DegenerateDistribution);
            }
        }
        if density.iter().any(|&p| p < 0.0 || !p.is_finite()) {
            return Err(DataError::DegenerateDistribution);
        }

        // Trapezoid-rule CDF, then normalize both density and CDF
        let mut cdf = Vec::with_capacity(values.len());
        cdf.push(0.0);
        for i in 1..values.len() {
            let area = 0.5 * (density[i] + density[i - 1]) * (values[i] - values[i - 1]);
            cdf.push(cdf[i - 1] + area);
        }
        let total = *cdf.last().unwrap();
        if !(total > 0.0) {
            return Err(DataError::DegenerateDistribution);
        }

        let density: Vec<f64> = density.iter().map(|p| p / total).collect();
        let cdf: Vec<f64> = cdf.iter().map(|c| c / total).collect();

        Ok(TabularPdf {
            values,
            density,
            cdf,
        })
    }

    /// Rebuild the CDF after deserialization (serde skips it).
    pub fn normalized(self) -> Result<Self, DataError> {
        TabularPdf::new(self.values, self.density)
    }

    pub fn lower_bound(&self) -> f64 {
        self.values[0]
    }

    pub fn upper_bound(&self) -> f64 {
        *self.values.last().unwrap()
    }

    /// Density at `x` (zero outside the tabulated range).
    pub fn density_at(&self, x: f64) -> f64 {
        if x < self.lower_bound() || x > self.upper_bound() {
            return 0.0;
        }
        let i = crate::interpolation::lower_bin_index(&self.values, x);
        let t = (x - self.values[i]) / (self.values[i + 1] - self.values[i]);
        self.density[i] + t * (self.density[i + 1] - self.density[i])
    }

    /// Sample a value by exact inversion of the piecewise-linear CDF.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let xi: f64 = rng.gen();
        let i = crate::interpolation::lower_bin_index(&self.cdf, xi.min(self.cdf[self.cdf.len() - 1]));

        let x0 = self.values[i];
        let p0 = self.density[i];
        let dx = self.values[i + 1] - x0;
        let slope = (self.density[i + 1] - p0) / dx;
        let excess = xi - self.cdf[i];

        if slope.abs() < 1e-30 {
            if p0 > 0.0 {
                x0 + excess / p0
            } else {
                x0
            }
        } else {
            x0 + ((p0 * p0 + 2.0 * slope * excess).max(0.0).sqrt() - p0) / slope
        }
    }
}

/// Bivariate outgoing-energy law: a grid of incoming energies, each with a
/// tabulated density over outgoing energy. Rows are selected by statistical
/// interpolation between the bracketing incoming energies.
#[derive(Debug, Clone)]
pub struct EnergyGainTable {
    incoming: Vec<f64>,
    rows: Vec<TabularPdf>,
}

impl EnergyGainTable {
    pub fn new(incoming: Vec<f64>, rows: Vec<TabularPdf>) -> Result<Self, DataError> {
        if incoming.len() < 2 {
            return Err(DataError::DistributionTableTooSmall);
        }
        if incoming.len() != rows.len() {
            return Err(DataError::DistributionLengthMismatch {
                values: incoming.len(),
                densities: rows.len(),
            });
        }
        for w in incoming.windows(2) {
            if w[1] <= w[0] {
                return Err(DataError::DegenerateDistribution);
            }
        }
        Ok(EnergyGainTable { incoming, rows })
    }

    fn bracket(&self, energy: f64) -> (usize, f64) {
        if energy <= self.incoming[0] {
            return (0, 0.0);
        }
        if energy >= self.incoming[self.incoming.len() - 1] {
            return (self.incoming.len() - 2, 1.0);
        }
        let i = crate::interpolation::lower_bin_index(&self.incoming, energy);
        let f = (energy - self.incoming[i]) / (self.incoming[i + 1] - self.incoming[i]);
        (i, f)
    }

    /// Sample an outgoing energy for `incoming_energy`.
    pub fn sample<R: Rng + ?Sized>(&self, incoming_energy: f64, rng: &mut R) -> f64 {
        let (i, f) = self.bracket(incoming_energy);
        // Statistical interpolation between the bracketing rows
        let row = if rng.gen::<f64>() < f { i + 1 } else { i };
        self.rows[row].sample(rng)
    }

    /// Interpolated outgoing-energy density at (incoming, outgoing).
    pub fn density(&self, incoming_energy: f64, outgoing_energy: f64) -> f64 {
        let (i, f) = self.bracket(incoming_energy);
        (1.0 - f) * self.rows[i].density_at(outgoing_energy)
            + f * self.rows[i + 1].density_at(outgoing_energy)
    }
}

/// Adjoint incoherent (Klein-Nishina) photon scattering.
///
/// Samples the inverse energy-gain ratio x = E/E' over [x_min, 1] by
/// two-branch rejection, which reproduces the adjoint Klein-Nishina
/// differential cross section without tabulated data. Spawns probe
/// particles at every critical line energy inside the scattering window.
#[derive(Debug, Clone)]
pub struct AdjointKleinNishina {
    max_energy: f64,
    critical_line_energies: Arc<Vec<f64>>,
}

impl AdjointKleinNishina {
    pub fn new(
        max_energy: f64,
        critical_line_energies: Arc<Vec<f64>>,
    ) -> Result<Self, DataError> {
        if !(max_energy > 0.0) {
            return Err(DataError::InvalidEnergyWindow {
                min: 0.0,
                max: max_energy,
            });
        }
        if critical_line_energies.windows(2).any(|w| w[1] < w[0]) {
            return Err(DataError::UnsortedLineEnergies);
        }
        Ok(AdjointKleinNishina {
            max_energy,
            critical_line_energies,
        })
    }

    pub fn max_energy(&self) -> f64 {
        self.max_energy
    }

    pub fn critical_line_energies(&self) -> &Arc<Vec<f64>> {
        &self.critical_line_energies
    }

    /// Differential cross section in the scattering angle cosine (barns).
    pub fn evaluate(&self, incoming_energy: f64, mu: f64) -> f64 {
        let mu_min = min_scattering_angle_cosine(incoming_energy, self.max_energy);
        if mu < mu_min || mu > 1.0 {
            return 0.0;
        }
        let alpha = incoming_energy / ELECTRON_REST_MASS_ENERGY;
        let x = 1.0 - alpha * (1.0 - mu); // inverse energy-gain ratio
        if x <= 0.0 {
            return 0.0;
        }
        let mult = std::f64::consts::PI
            * CLASSICAL_ELECTRON_RADIUS
            * CLASSICAL_ELECTRON_RADIUS
            * CM2_TO_BARNS;
        mult * (1.0 / x + x - 1.0 + mu * mu)
    }

    /// Integrated cross section over the allowed angular range (barns).
    ///
    /// Closed form of the integral of [`AdjointKleinNishina::evaluate`]
    /// over mu in [mu_min, 1] via the substitution x = 1 - alpha*(1 - mu).
    pub fn integrated_cross_section(&self, incoming_energy: f64) -> f64 {
        let alpha = incoming_energy / ELECTRON_REST_MASS_ENERGY;
        let x_min = min_inverse_energy_gain_ratio(incoming_energy, self.max_energy);
        if x_min >= 1.0 {
            return 0.0;
        }
        let mult = std::f64::consts::PI
            * CLASSICAL_ELECTRON_RADIUS
            * CLASSICAL_ELECTRON_RADIUS
            * CM2_TO_BARNS;
        let a = x_min - 1.0 + alpha;
        let integral = -x_min.ln() + 0.5 * (1.0 - x_min * x_min) - (1.0 - x_min)
            + (alpha * alpha * alpha - a * a * a) / (3.0 * alpha * alpha);
        mult * integral / alpha
    }

    /// Normalized angular density at (incoming, mu).
    pub fn density(&self, incoming_energy: f64, mu: f64) -> f64 {
        let norm = self.integrated_cross_section(incoming_energy);
        if norm > 0.0 {
            self.evaluate(incoming_energy, mu) / norm
        } else {
            0.0
        }
    }

    /// Sample (outgoing energy, scattering angle cosine) with two-branch
    /// rejection on the inverse energy-gain ratio.
    pub fn sample<R: Rng + ?Sized>(&self, incoming_energy: f64, rng: &mut R) -> (f64, f64) {
        debug_assert!(incoming_energy > 0.0 && incoming_energy <= self.max_energy);

        let alpha = incoming_energy / ELECTRON_REST_MASS_ENERGY;
        let x_min = min_inverse_energy_gain_ratio(incoming_energy, self.max_energy);

        if x_min >= 1.0 {
            // Degenerate window: no energy gain is possible
            return (incoming_energy, 1.0);
        }

        let branch_value = (1.0 - x_min) / (1.0 + x_min);
        let mut x;

        loop {
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();
            let r3: f64 = rng.gen();

            x = x_min + r2 * (1.0 - x_min);

            if r1 <= branch_value {
                let rejection = x_min / (1.0 - x_min) * (1.0 / x - 1.0);
                if r3 <= rejection {
                    break;
                }
            } else {
                let mu = 1.0 - (1.0 - x) / alpha;
                let rejection = 0.5 * (mu * mu + x);
                if r3 <= rejection {
                    break;
                }
            }
        }

        let outgoing_energy = incoming_energy / x;
        let mu_min = min_scattering_angle_cosine(incoming_energy, self.max_energy);
        let mu = (1.0 - (1.0 - x) / alpha).clamp(mu_min, 1.0);

        debug_assert!(outgoing_energy >= incoming_energy);
        (outgoing_energy, mu)
    }

    /// Whether `energy_of_interest` cannot be reached because the particle
    /// already exceeds it (adjoint particles only gain energy).
    pub fn is_energy_above_scattering_window(
        &self,
        energy_of_interest: f64,
        initial_energy: f64,
    ) -> bool {
        initial_energy > energy_of_interest
    }

    /// Whether `energy_of_interest` cannot be reached in one scatter from
    /// `initial_energy` (the single-scatter gain is kinematically capped).
    pub fn is_energy_below_scattering_window(
        &self,
        energy_of_interest: f64,
        initial_energy: f64,
    ) -> bool {
        let lower = energy_of_interest
            / (1.0 + 2.0 * energy_of_interest / ELECTRON_REST_MASS_ENERGY);
        initial_energy < lower
    }

    pub fn is_energy_in_scattering_window(
        &self,
        energy_of_interest: f64,
        initial_energy: f64,
    ) -> bool {
        energy_of_interest <= self.max_energy
            && !self.is_energy_above_scattering_window(energy_of_interest, initial_energy)
            && !self.is_energy_below_scattering_window(energy_of_interest, initial_energy)
    }

    fn create_probes<R: Rng + ?Sized>(
        &self,
        particle: &Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        let incoming = particle.energy();
        for &line in self.critical_line_energies.iter() {
            if !self.is_energy_in_scattering_window(line, incoming) {
                continue;
            }

            let mu = if line == self.max_energy {
                min_scattering_angle_cosine(incoming, self.max_energy)
            } else {
                adjoint_compton_angle_cosine(incoming, line)
            };

            // d(sigma)/dE = d(sigma)/dmu * dmu/dE with dmu/dE = m/E'^2
            let density_conversion = ELECTRON_REST_MASS_ENERGY / (line * line);
            let weight_mult = self.density(incoming, mu) * density_conversion;
            if !(weight_mult > 0.0) {
                continue;
            }

            let mut probe = particle.spawn_probe();
            probe.set_energy(line);
            probe.rotate_direction(mu, sample_azimuthal_angle(rng));
            probe.multiply_weight(weight_mult);
            probe.activate_probe();
            bank.push(probe);
        }
    }
}

/// Adjoint tabulated energy-gain scattering with a binding-energy-bounded
/// scattering window (per-subshell electro-ionization; bremsstrahlung and
/// atomic excitation use a zero binding energy).
///
/// An adjoint secondary that up-scatters from E_in is only meaningful if
/// the corresponding forward transition from the candidate final energy
/// back down to E_in is kinematically reachable given the binding energy.
#[derive(Debug, Clone)]
pub struct AdjointEnergyGainDistribution {
    subshell: Option<Subshell>,
    binding_energy: f64,
    min_energy: f64,
    max_energy: f64,
    critical_line_energies: Arc<Vec<f64>>,
    gain_table: EnergyGainTable,
}

impl AdjointEnergyGainDistribution {
    pub fn new(
        subshell: Option<Subshell>,
        binding_energy: f64,
        min_energy: f64,
        max_energy: f64,
        critical_line_energies: Arc<Vec<f64>>,
        gain_table: EnergyGainTable,
    ) -> Result<Self, DataError> {
        if !(min_energy > 0.0) || !(max_energy > min_energy) {
            return Err(DataError::InvalidEnergyWindow {
                min: min_energy,
                max: max_energy,
            });
        }
        if binding_energy < 0.0 {
            return Err(DataError::InvalidEnergyWindow {
                min: binding_energy,
                max: max_energy,
            });
        }
        if critical_line_energies.windows(2).any(|w| w[1] < w[0]) {
            return Err(DataError::UnsortedLineEnergies);
        }
        Ok(AdjointEnergyGainDistribution {
            subshell,
            binding_energy,
            min_energy,
            max_energy,
            critical_line_energies,
            gain_table,
        })
    }

    pub fn subshell(&self) -> Option<Subshell> {
        self.subshell
    }

    pub fn binding_energy(&self) -> f64 {
        self.binding_energy
    }

    pub fn critical_line_energies(&self) -> &Arc<Vec<f64>> {
        &self.critical_line_energies
    }

    /// True when the forward transition from `energy_of_interest` down to
    /// `initial_energy` would require a non-positive energy loss beyond the
    /// binding energy, which is unphysical.
    pub fn is_energy_above_scattering_window(
        &self,
        energy_of_interest: f64,
        initial_energy: f64,
    ) -> bool {
        initial_energy >= energy_of_interest - self.binding_energy
    }

    /// True when `initial_energy` lies in [min_energy, energy_of_interest -
    /// binding_energy), strictly excluding the upper boundary.
    pub fn is_energy_in_scattering_window(
        &self,
        energy_of_interest: f64,
        initial_energy: f64,
    ) -> bool {
        energy_of_interest <= self.max_energy
            && initial_energy >= self.min_energy
            && !self.is_energy_above_scattering_window(energy_of_interest, initial_energy)
    }

    /// Sample (outgoing energy, scattering angle cosine).
    pub fn sample<R: Rng + ?Sized>(&self, incoming_energy: f64, rng: &mut R) -> (f64, f64) {
        let outgoing = self
            .gain_table
            .sample(incoming_energy, rng)
            .max(incoming_energy);
        let mu = electron_scattering_angle_cosine(incoming_energy, outgoing);
        (outgoing, mu)
    }

    fn create_probes<R: Rng + ?Sized>(
        &self,
        particle: &Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        let incoming = particle.energy();
        for &line in self.critical_line_energies.iter() {
            if !self.is_energy_in_scattering_window(line, incoming) {
                continue;
            }

            let weight_mult = self.gain_table.density(incoming, line);
            if !(weight_mult > 0.0) {
                continue;
            }

            let mu = electron_scattering_angle_cosine(incoming, line);

            let mut probe = particle.spawn_probe();
            probe.set_energy(line);
            probe.rotate_direction(mu, sample_azimuthal_angle(rng));
            probe.multiply_weight(weight_mult);
            probe.activate_probe();
            bank.push(probe);
        }
    }
}

/// Closed set of final-state laws attachable to a reaction.
#[derive(Debug, Clone)]
pub enum ScatteringDistribution {
    /// Forward elastic scattering off a target with the given atomic weight
    /// ratio, isotropic in the center-of-mass frame (target at rest).
    Elastic { atomic_weight_ratio: f64 },
    /// Forward uncorrelated tabulated outgoing energy with isotropic
    /// emission.
    Tabular(EnergyGainTable),
    /// Adjoint incoherent photon scattering (analytic Klein-Nishina).
    AdjointKleinNishina(AdjointKleinNishina),
    /// Adjoint tabulated energy gain with a binding-energy scattering
    /// window (subshell ionization, bremsstrahlung, excitation).
    AdjointEnergyGain(AdjointEnergyGainDistribution),
}

impl ScatteringDistribution {
    /// Sample a final state and mutate `particle` in place, emitting any
    /// probe particles into `bank` first.
    ///
    /// Probe emission is suppressed when `particle` is itself a probe, so
    /// probes never cascade.
    pub fn scatter<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        match self {
            ScatteringDistribution::Elastic {
                atomic_weight_ratio,
            } => {
                let a = *atomic_weight_ratio;
                let mu_cm = 2.0 * rng.gen::<f64>() - 1.0;
                let mu_lab = (1.0 + a * mu_cm) / (a * a + 2.0 * a * mu_cm + 1.0).sqrt();
                let e_out = particle.energy() * (a * a + 1.0 + 2.0 * a * mu_cm)
                    / ((a + 1.0) * (a + 1.0));
                particle.set_energy(e_out);
                particle.rotate_direction(mu_lab, sample_azimuthal_angle(rng));
            }
            ScatteringDistribution::Tabular(table) => {
                let e_out = table.sample(particle.energy(), rng);
                particle.set_energy(e_out);
                particle.direction = sample_isotropic_direction(rng);
            }
            ScatteringDistribution::AdjointKleinNishina(dist) => {
                if !particle.is_probe() {
                    dist.create_probes(particle, bank, rng);
                }
                let (e_out, mu) = dist.sample(particle.energy(), rng);
                particle.set_energy(e_out);
                particle.rotate_direction(mu, sample_azimuthal_angle(rng));
            }
            ScatteringDistribution::AdjointEnergyGain(dist) => {
                if !particle.is_probe() {
                    dist.create_probes(particle, bank, rng);
                }
                let (e_out, mu) = dist.sample(particle.energy(), rng);
                particle.set_energy(e_out);
                particle.rotate_direction(mu, sample_azimuthal_angle(rng));
            }
        }
    }

    /// Critical line energies this distribution spawns probes at, if any.
    pub fn critical_line_energies(&self) -> Option<&Arc<Vec<f64>>> {
        match self {
            ScatteringDistribution::AdjointKleinNishina(d) => Some(d.critical_line_energies()),
            ScatteringDistribution::AdjointEnergyGain(d) => Some(d.critical_line_energies()),
            _ => None,
        }
    }
}
