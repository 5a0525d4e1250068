// Physical constants used throughout the transport engine.
//
// Energies are in MeV, lengths in cm, microscopic cross sections in barns
// and macroscopic cross sections in 1/cm (number densities in atoms/b-cm).

/// Electron rest mass energy in MeV (CODATA).
pub const ELECTRON_REST_MASS_ENERGY: f64 = 0.51099891013;

/// Classical electron radius in cm.
pub const CLASSICAL_ELECTRON_RADIUS: f64 = 2.8179403262e-13;

/// Avogadro's number in 1/mol.
pub const AVOGADRO: f64 = 6.02214076e23;

/// Conversion from cm^2 to barns.
pub const CM2_TO_BARNS: f64 = 1.0e24;

/// Conversion from barns*atoms/cm^3 to 1/cm (barn -> cm^2).
pub const BARNS_TO_CM2: f64 = 1.0e-24;
