use thiserror::Error;

/// Construction-time data validation errors.
///
/// Every variant corresponds to malformed nuclear data or an inconsistent
/// assembly request detected while building grids, reactions, cores, atoms
/// or materials. Construction fails loudly with one of these; a partially
/// valid object is never returned. Collision-time contract violations are
/// not represented here (they are debug-checked preconditions, not
/// recoverable states).
#[derive(Debug, Error)]
pub enum DataError {
    #[error("energy grid must have at least 2 points (got {0})")]
    GridTooSmall(usize),

    #[error("energy grid must be strictly increasing (grid[{index}] = {value} does not exceed its predecessor)")]
    NonMonotonicGrid { index: usize, value: f64 },

    #[error("energy grid values must be positive (grid[{index}] = {value})")]
    NonPositiveGridPoint { index: usize, value: f64 },

    #[error("cross section table length {cross_sections} + threshold index {threshold} does not match energy grid length {grid}")]
    CrossSectionLengthMismatch {
        cross_sections: usize,
        threshold: usize,
        grid: usize,
    },

    #[error("negative cross section value {value} at table index {index}")]
    NegativeCrossSection { index: usize, value: f64 },

    #[error("reaction {reaction} does not share the core energy grid")]
    UnsharedEnergyGrid { reaction: String },

    #[error("a reaction core requires at least one scattering or absorption reaction")]
    NoReactions,

    #[error("line energy {0} is not one of the declared critical line energies")]
    UnknownLineEnergy(f64),

    #[error("line energy {0} has no registered reactions")]
    EmptyLineEnergyMap(f64),

    #[error("critical line energies must be sorted ascending")]
    UnsortedLineEnergies,

    #[error("atomic weight must be positive (got {0})")]
    InvalidAtomicWeight(f64),

    #[error("atomic weight for '{0}' is not in the built-in table and none was provided")]
    UnknownAtomicWeight(String),

    #[error("cell {cell} already has a material for particle type {particle_type}")]
    DuplicateCellFill { cell: u32, particle_type: String },

    #[error("material {id} has no constituent atoms")]
    EmptyMaterial { id: u32 },

    #[error("material {id} fraction count {fractions} does not match atom count {atoms}")]
    FractionCountMismatch {
        id: u32,
        fractions: usize,
        atoms: usize,
    },

    #[error("material {id} fractions must all carry the same sign and be nonzero")]
    MixedFractionSigns { id: u32 },

    #[error("material {id} density must be nonzero")]
    ZeroDensity { id: u32 },

    #[error("distribution outgoing energy table needs at least 2 points")]
    DistributionTableTooSmall,

    #[error("distribution table values and densities have different lengths ({values} vs {densities})")]
    DistributionLengthMismatch { values: usize, densities: usize },

    #[error("distribution density must be non-negative and integrate to a positive value")]
    DegenerateDistribution,

    #[error("scattering window bounds are invalid (min {min}, max {max})")]
    InvalidEnergyWindow { min: f64, max: f64 },

    #[error("unknown reaction type name '{0}'")]
    UnknownReactionType(String),

    #[error("failed to parse atom record: {0}")]
    Parse(#[from] serde_json::Error),
}
