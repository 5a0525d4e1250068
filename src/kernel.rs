use crate::bank::ParticleBank;
use crate::config::{CollisionMode, TransportSettings};
use crate::geometry::FilledGeometry;
use crate::material::Material;
use crate::particle::{Particle, ParticleType};
use rand::Rng;
use std::sync::Arc;

/// Handler for one particle type: a closed tagged set instead of an
/// inheritance hierarchy, so dispatch is an explicit match on the tag.
#[derive(Debug, Clone, Copy)]
enum ParticleTypeKernel {
    /// Forward transport: delegate straight to the cell material.
    Forward(ParticleType),
    /// Adjoint transport: apply the adjoint weight correction (or the
    /// line-energy variant for probes) before delegating.
    Adjoint(ParticleType),
}

impl ParticleTypeKernel {
    fn for_type(particle_type: ParticleType) -> Self {
        if particle_type.is_adjoint() {
            ParticleTypeKernel::Adjoint(particle_type)
        } else {
            ParticleTypeKernel::Forward(particle_type)
        }
    }
}

/// The collision orchestration layer.
///
/// Resolves the particle's cell to a material through the filled geometry
/// model and delegates to that material's collision method, applying the
/// adjoint weight correction first where relevant. One handler per particle
/// type is fixed at construction, as is the collision mode; nothing is
/// re-decided per call.
#[derive(Debug)]
pub struct CollisionKernel {
    model: Arc<FilledGeometry>,
    mode: CollisionMode,
    min_energy: f64,
    max_energy: f64,
    handlers: [ParticleTypeKernel; 6],
}

impl CollisionKernel {
    pub fn new(model: Arc<FilledGeometry>, settings: &TransportSettings) -> Self {
        let handlers = ParticleType::ALL.map(ParticleTypeKernel::for_type);
        CollisionKernel {
            model,
            mode: settings.mode,
            min_energy: settings.min_energy,
            max_energy: settings.max_energy,
            handlers,
        }
    }

    pub fn mode(&self) -> CollisionMode {
        self.mode
    }

    /// Whether this kernel was built from `model` (the same model object,
    /// not a look-alike).
    pub fn is_defined_on_model(&self, model: &Arc<FilledGeometry>) -> bool {
        Arc::ptr_eq(&self.model, model)
    }

    fn handler_index(particle_type: ParticleType) -> usize {
        ParticleType::ALL
            .iter()
            .position(|&t| t == particle_type)
            .unwrap()
    }

    /// Collide `particle` with the material of its current cell.
    ///
    /// The single entry point exposed to the transport loop. The caller is
    /// responsible for bounding the particle energy to the configured
    /// transport limits and for never colliding in a void cell (both are
    /// checked preconditions).
    pub fn collide_with_cell_material<R: Rng + ?Sized>(
        &self,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        debug_assert!(!particle.is_gone(), "colliding a terminated particle");
        debug_assert!(
            particle.energy() >= self.min_energy && particle.energy() <= self.max_energy,
            "collision energy {} outside transport bounds [{}, {}]",
            particle.energy(),
            self.min_energy,
            self.max_energy
        );

        let Some(cell) = particle.cell else {
            debug_assert!(false, "particle is not embedded in the model");
            return;
        };

        let particle_type = particle.particle_type;
        let Some(material) = self.model.material(cell, particle_type) else {
            debug_assert!(false, "collision requested in void cell {}", cell);
            return;
        };

        match self.handlers[Self::handler_index(particle_type)] {
            ParticleTypeKernel::Forward(handled_type) => {
                debug_assert_eq!(handled_type, particle_type);
                self.forward_collision(material, particle, bank, rng)
            }
            ParticleTypeKernel::Adjoint(handled_type) => {
                debug_assert_eq!(handled_type, particle_type);
                self.adjoint_collision(material, particle, bank, rng)
            }
        }
    }

    fn forward_collision<R: Rng + ?Sized>(
        &self,
        material: &Arc<Material>,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        match self.mode {
            CollisionMode::Analogue => material.collide_analogue(particle, bank, rng),
            CollisionMode::SurvivalBias => material.collide_survival_bias(particle, bank, rng),
        };
    }

    /// Adjoint collision: correct the particle weight by the ratio of
    /// adjoint-to-forward total cross sections so that expectation values
    /// against the forward flux are recovered, then delegate.
    ///
    /// A zero weight factor is a zero-probability event, not an error: the
    /// particle is marked gone rather than continuing with no contribution.
    fn adjoint_collision<R: Rng + ?Sized>(
        &self,
        material: &Arc<Material>,
        particle: &mut Particle,
        bank: &mut ParticleBank,
        rng: &mut R,
    ) {
        let energy = particle.energy();

        if particle.is_probe() && material.has_line_energy_reaction(energy) {
            let weight_factor = material.adjoint_line_energy_weight_factor(energy);
            if weight_factor > 0.0 {
                particle.multiply_weight(weight_factor);
                material.collide_at_line_energy(particle, bank, rng);
            } else {
                log::trace!(
                    "probe {} killed: zero line-energy weight factor at {} MeV",
                    particle.id,
                    energy
                );
                particle.set_gone();
            }
            return;
        }

        let weight_factor = material.adjoint_weight_factor(energy);
        if weight_factor > 0.0 {
            particle.multiply_weight(weight_factor);
            match self.mode {
                CollisionMode::Analogue => material.collide_analogue(particle, bank, rng),
                CollisionMode::SurvivalBias => {
                    material.collide_survival_bias(particle, bank, rng)
                }
            };
        } else {
            log::trace!(
                "particle {} killed: zero adjoint weight factor at {} MeV",
                particle.id,
                energy
            );
            particle.set_gone();
        }
    }
}
