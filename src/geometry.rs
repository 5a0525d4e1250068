use crate::error::DataError;
use crate::material::Material;
use crate::particle::{Particle, ParticleType};
use std::collections::HashMap;
use std::sync::Arc;

/// A geometry model with its cells filled by materials.
///
/// Maps each cell to the material occupying it for every transported
/// particle type; a cell with no material registered for a type is void for
/// that type. The model is an explicitly constructed, explicitly passed
/// context object owned by the simulation driver: it is populated during
/// single-threaded setup and then shared read-only by every collision
/// kernel, so there is no process-wide mutable geometry state.
///
/// Ray tracing and solid modeling live outside this crate; the collision
/// layer only consumes the cell -> material resolution defined here (the
/// cell index travels on the particle).
#[derive(Debug, Default)]
pub struct FilledGeometry {
    cells: HashMap<u32, HashMap<ParticleType, Arc<Material>>>,
}

impl FilledGeometry {
    pub fn new() -> Self {
        FilledGeometry {
            cells: HashMap::new(),
        }
    }

    /// Convenience model with a single cell filled with the given
    /// materials: the whole problem is one infinite medium.
    pub fn infinite_medium(
        cell_id: u32,
        fills: Vec<(ParticleType, Arc<Material>)>,
    ) -> Result<Self, DataError> {
        let mut model = FilledGeometry::new();
        model.add_void_cell(cell_id);
        for (particle_type, material) in fills {
            model.fill_cell(cell_id, particle_type, material)?;
        }
        Ok(model)
    }

    /// Register `cell_id` with no materials (void for every particle type).
    /// Registering an existing cell is a no-op.
    pub fn add_void_cell(&mut self, cell_id: u32) {
        self.cells.entry(cell_id).or_default();
    }

    /// Fill `cell_id` with `material` for `particle_type`.
    ///
    /// A cell can hold one material per particle type; filling the same
    /// slot twice is a construction error.
    pub fn fill_cell(
        &mut self,
        cell_id: u32,
        particle_type: ParticleType,
        material: Arc<Material>,
    ) -> Result<(), DataError> {
        let fills = self.cells.entry(cell_id).or_default();
        if fills.contains_key(&particle_type) {
            return Err(DataError::DuplicateCellFill {
                cell: cell_id,
                particle_type: format!("{:?}", particle_type),
            });
        }
        fills.insert(particle_type, material);
        Ok(())
    }

    pub fn contains_cell(&self, cell_id: u32) -> bool {
        self.cells.contains_key(&cell_id)
    }

    /// Sorted cell ids of the model.
    pub fn cell_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.cells.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Whether `cell_id` is void for `particle_type` (no material, or an
    /// unknown cell).
    pub fn is_cell_void(&self, cell_id: u32, particle_type: ParticleType) -> bool {
        self.material(cell_id, particle_type).is_none()
    }

    /// The material filling `cell_id` for `particle_type`, if any.
    pub fn material(&self, cell_id: u32, particle_type: ParticleType) -> Option<&Arc<Material>> {
        self.cells
            .get(&cell_id)
            .and_then(|fills| fills.get(&particle_type))
    }

    /// Adjoint weight factor of the material in `cell_id` at `energy`
    /// (1.0 for void cells: no interaction means no correction).
    pub fn adjoint_weight_factor(
        &self,
        cell_id: u32,
        particle_type: ParticleType,
        energy: f64,
    ) -> f64 {
        match self.material(cell_id, particle_type) {
            Some(material) => material.adjoint_weight_factor(energy),
            None => 1.0,
        }
    }

    /// Adjoint line-energy weight factor of the material in `cell_id`.
    pub fn adjoint_line_energy_weight_factor(
        &self,
        cell_id: u32,
        particle_type: ParticleType,
        energy: f64,
    ) -> f64 {
        match self.material(cell_id, particle_type) {
            Some(material) => material.adjoint_line_energy_weight_factor(energy),
            None => 0.0,
        }
    }

    /// Embed a particle in this model: a particle with no cell assigned is
    /// placed in the model's only cell (single-cell models only).
    pub fn embed(&self, particle: &mut Particle) {
        if particle.cell.is_none() && self.cells.len() == 1 {
            particle.cell = self.cells.keys().next().copied();
        }
    }
}
