// Direction and energy kinematics shared by the scattering distributions.

use crate::constants::ELECTRON_REST_MASS_ENERGY;
use nalgebra::Vector3;
use rand::Rng;
use std::f64::consts::PI;

/// Rotate a unit direction by polar cosine `mu` about itself with azimuthal
/// angle `phi`, returning the new unit direction.
pub fn rotate_direction(direction: &[f64; 3], mu: f64, phi: f64) -> [f64; 3] {
    let u_old = Vector3::from_row_slice(direction);
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    // Find a perpendicular vector to u_old
    let perp = if u_old.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(&u_old).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(&u_old).normalize()
    };
    let ortho = u_old.cross(&perp);

    let u_new = mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho;
    [u_new.x, u_new.y, u_new.z]
}

/// Sample an azimuthal angle uniformly on [0, 2*pi).
#[inline]
pub fn sample_azimuthal_angle<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    2.0 * PI * rng.gen::<f64>()
}

/// Sample an isotropic unit direction.
pub fn sample_isotropic_direction<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
    use rand_distr::{Distribution, UnitSphere};
    UnitSphere.sample(rng)
}

/// Outgoing energy of an adjoint Compton scatter at angle cosine `mu`.
///
/// The adjoint line is the inverse of the forward Compton shift: the dual
/// particle gains energy, E' = E / (1 - (E/m)(1 - mu)), and the caller must
/// keep `mu` above the minimum angle cosine so the denominator stays
/// positive.
#[inline]
pub fn adjoint_compton_line_energy(incoming_energy: f64, mu: f64) -> f64 {
    debug_assert!(incoming_energy > 0.0);
    let alpha = incoming_energy / ELECTRON_REST_MASS_ENERGY;
    let denom = 1.0 - alpha * (1.0 - mu);
    debug_assert!(denom > 0.0, "scattering angle below the adjoint kinematic limit");
    incoming_energy / denom
}

/// Angle cosine of the adjoint Compton transition from `incoming_energy` up
/// to `outgoing_energy` (>= incoming).
#[inline]
pub fn adjoint_compton_angle_cosine(incoming_energy: f64, outgoing_energy: f64) -> f64 {
    debug_assert!(outgoing_energy >= incoming_energy);
    let mu =
        1.0 - ELECTRON_REST_MASS_ENERGY * (1.0 / incoming_energy - 1.0 / outgoing_energy);
    mu.clamp(-1.0, 1.0)
}

/// Minimum scattering angle cosine that keeps an adjoint Compton scatter at
/// `incoming_energy` below `max_energy`.
#[inline]
pub fn min_scattering_angle_cosine(incoming_energy: f64, max_energy: f64) -> f64 {
    debug_assert!(incoming_energy <= max_energy);
    let mu = 1.0
        - ELECTRON_REST_MASS_ENERGY * (1.0 / incoming_energy - 1.0 / max_energy);
    mu.max(-1.0)
}

/// Minimum of the inverse energy-gain ratio x = E/E' for an adjoint Compton
/// scatter: bounded below by the max-energy cutoff and by backscatter.
#[inline]
pub fn min_inverse_energy_gain_ratio(incoming_energy: f64, max_energy: f64) -> f64 {
    let alpha = incoming_energy / ELECTRON_REST_MASS_ENERGY;
    (incoming_energy / max_energy).max(1.0 - 2.0 * alpha)
}

/// Angle cosine of an adjoint ionization transition that takes an electron
/// from kinetic energy `incoming_energy` up to `outgoing_energy`
/// (relativistic two-body kinematics; up-scatter keeps the cosine in (0, 1]).
#[inline]
pub fn electron_scattering_angle_cosine(incoming_energy: f64, outgoing_energy: f64) -> f64 {
    debug_assert!(incoming_energy > 0.0 && outgoing_energy > 0.0);
    let m2 = 2.0 * ELECTRON_REST_MASS_ENERGY;
    let mu_sq =
        incoming_energy * (outgoing_energy + m2) / (outgoing_energy * (incoming_energy + m2));
    mu_sq.sqrt().min(1.0)
}
