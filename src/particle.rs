use crate::kinematics::rotate_direction;

/// The closed set of transported particle types.
///
/// Adjoint types are the importance-weighted duals of the corresponding
/// forward particles; their collisions receive a weight correction before
/// reaction sampling (see the collision kernel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticleType {
    Neutron,
    Photon,
    Electron,
    Positron,
    AdjointPhoton,
    AdjointElectron,
}

impl ParticleType {
    /// Whether this type transports adjoint (reverse, importance-weighted)
    /// particles.
    pub fn is_adjoint(self) -> bool {
        matches!(self, ParticleType::AdjointPhoton | ParticleType::AdjointElectron)
    }

    /// All transported types, in dispatch order.
    pub const ALL: [ParticleType; 6] = [
        ParticleType::Neutron,
        ParticleType::Photon,
        ParticleType::Electron,
        ParticleType::Positron,
        ParticleType::AdjointPhoton,
        ParticleType::AdjointElectron,
    ];
}

/// Mutable state of one particle history.
///
/// Energy, weight and liveness are private so that probe death-on-retune
/// cannot be bypassed: an activated probe is killed the instant a reaction
/// changes its energy. Everything else follows the usual transport state
/// (position/direction in cm / unit vector, energy in MeV).
#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u64,
    pub particle_type: ParticleType,
    pub position: [f64; 3],
    pub direction: [f64; 3],
    pub cell: Option<u32>,
    energy: f64,
    weight: f64,
    alive: bool,
    probe: bool,
    probe_active: bool,
}

impl Particle {
    pub fn new(
        id: u64,
        particle_type: ParticleType,
        position: [f64; 3],
        direction: [f64; 3],
        energy: f64,
    ) -> Self {
        Particle {
            id,
            particle_type,
            position,
            direction,
            cell: None,
            energy,
            weight: 1.0,
            alive: true,
            probe: false,
            probe_active: false,
        }
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Set the particle energy.
    ///
    /// An activated probe dies the instant its energy changes: probes exist
    /// to sample the adjoint flux at one fixed line energy and contribute
    /// nothing beyond their single energy-setting event.
    pub fn set_energy(&mut self, energy: f64) {
        debug_assert!(energy > 0.0, "particle energy must be positive");
        let changed = energy != self.energy;
        self.energy = energy;
        if self.probe && self.probe_active && changed {
            self.alive = false;
        }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn multiply_weight(&mut self, factor: f64) {
        self.weight *= factor;
    }

    pub fn is_gone(&self) -> bool {
        !self.alive
    }

    /// Terminate this history (absorption, zero-probability event, cutoff).
    pub fn set_gone(&mut self) {
        self.alive = false;
    }

    pub fn is_probe(&self) -> bool {
        self.probe
    }

    /// Whether this probe has been armed (dies on its next energy change).
    pub fn is_probe_active(&self) -> bool {
        self.probe_active
    }

    /// Create a dormant probe copy of this particle.
    ///
    /// The copy keeps position, direction, type, weight and cell; the caller
    /// assigns the line energy and direction while the probe is dormant and
    /// then arms it with [`Particle::activate_probe`].
    pub fn spawn_probe(&self) -> Particle {
        let mut probe = self.clone();
        probe.probe = true;
        probe.probe_active = false;
        probe.alive = true;
        probe
    }

    /// Arm a dormant probe. Subsequent energy changes kill it.
    pub fn activate_probe(&mut self) {
        debug_assert!(self.probe, "only probes can be activated");
        self.probe_active = true;
    }

    /// Rotate the flight direction by polar cosine `mu` about the current
    /// direction with azimuthal angle `phi`.
    pub fn rotate_direction(&mut self, mu: f64, phi: f64) {
        self.direction = rotate_direction(&self.direction, mu, phi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_particle(particle_type: ParticleType) -> Particle {
        Particle::new(1, particle_type, [0.0, 0.0, 0.0], [0.0, 0.0, 1.0], 1.0)
    }

    #[test]
    fn test_particle_construction() {
        let p = test_particle(ParticleType::AdjointPhoton);
        assert_eq!(p.energy(), 1.0);
        assert_eq!(p.weight(), 1.0);
        assert!(!p.is_gone());
        assert!(!p.is_probe());
    }

    #[test]
    fn test_adjoint_classification() {
        assert!(ParticleType::AdjointPhoton.is_adjoint());
        assert!(ParticleType::AdjointElectron.is_adjoint());
        assert!(!ParticleType::Photon.is_adjoint());
        assert!(!ParticleType::Neutron.is_adjoint());
    }

    #[test]
    fn test_weight_manipulation() {
        let mut p = test_particle(ParticleType::Photon);
        p.multiply_weight(0.25);
        assert_eq!(p.weight(), 0.25);
        p.set_weight(2.0);
        assert_eq!(p.weight(), 2.0);
    }

    #[test]
    fn test_dormant_probe_survives_energy_assignment() {
        let parent = test_particle(ParticleType::AdjointPhoton);
        let mut probe = parent.spawn_probe();
        assert!(probe.is_probe());
        assert!(!probe.is_probe_active());

        // Dormant probes can be tuned freely
        probe.set_energy(0.511);
        assert!(!probe.is_gone());

        probe.activate_probe();
        assert!(!probe.is_gone());
    }

    #[test]
    fn test_active_probe_dies_on_energy_change() {
        let parent = test_particle(ParticleType::AdjointPhoton);
        let mut probe = parent.spawn_probe();
        probe.set_energy(0.511);
        probe.activate_probe();

        // Re-setting the same energy is not a change
        probe.set_energy(0.511);
        assert!(!probe.is_gone());

        probe.set_energy(0.6);
        assert!(probe.is_gone());
    }

    #[test]
    fn test_rotate_direction_preserves_unit_norm() {
        let mut p = test_particle(ParticleType::Electron);
        p.rotate_direction(0.3, 1.2);
        let norm = (p.direction[0].powi(2) + p.direction[1].powi(2) + p.direction[2].powi(2)).sqrt();
        assert!((norm - 1.0).abs() < 1e-12, "norm = {}", norm);
    }
}
