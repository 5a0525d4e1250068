use serde::{Deserialize, Serialize};

/// How collisions terminate histories.
///
/// Selected once per simulation, not per call: every collision kernel built
/// from the same settings applies the same mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionMode {
    /// Sample absorption in analogue proportion; absorption terminates the
    /// history.
    Analogue,
    /// Split each collision into a scattered and an absorbed continuation
    /// (survival biasing); histories terminate by energy cutoff.
    SurvivalBias,
}

/// Simulation-wide transport parameters consumed by the collision kernel.
///
/// The energy bounds define the domain the transport loop must keep
/// particle energies within before invoking collisions; they normally match
/// the union grid bounds of the loaded data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
    pub mode: CollisionMode,
    /// Lower transport energy bound in MeV.
    pub min_energy: f64,
    /// Upper transport energy bound in MeV.
    pub max_energy: f64,
    /// Master seed for per-history random streams.
    pub seed: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            mode: CollisionMode::Analogue,
            min_energy: 1e-5,
            max_energy: 20.0,
            seed: 1,
        }
    }
}

impl TransportSettings {
    pub fn with_mode(mode: CollisionMode) -> Self {
        TransportSettings {
            mode,
            ..TransportSettings::default()
        }
    }
}
