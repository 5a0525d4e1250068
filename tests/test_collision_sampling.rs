// Statistical properties of collision sampling: probability conservation
// of channel selection, absorption frequencies, and per-channel selection
// frequencies observed through the reported interaction subshell.

use adjmc::{
    AtomRecord, DistributionRecord, Interpolation, Material, Particle, ParticleBank, ParticleType,
    ReactionCategory, ReactionRecord, ReactionType, Subshell,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

const N_TRIALS: usize = 100_000;

fn reaction_record(
    reaction_type: ReactionType,
    cross_sections: Vec<f64>,
    category: Option<ReactionCategory>,
    distribution: Option<DistributionRecord>,
) -> ReactionRecord {
    ReactionRecord {
        reaction_type,
        category,
        line_energy: None,
        threshold_index: 0,
        cross_sections,
        interpolation: Interpolation::LinLin,
        distribution,
    }
}

fn adjoint_photon(energy: f64) -> Particle {
    Particle::new(
        1,
        ParticleType::AdjointPhoton,
        [0.0; 3],
        [0.0, 0.0, 1.0],
        energy,
    )
}

/// 3-sigma binomial tolerance for a frequency estimate.
fn binomial_tolerance(p: f64, n: usize) -> f64 {
    3.0 * (p * (1.0 - p) / n as f64).sqrt()
}

#[test]
fn test_absorption_frequency_matches_cross_section_ratio() {
    // Scattering 2.0 b, absorption 0.5 b: absorption probability 0.2
    let record = AtomRecord {
        name: "Si".to_string(),
        atomic_number: 14,
        atomic_weight: None,
        energy_grid: vec![1e-5, 1.0, 20.0],
        critical_line_energies: vec![],
        total_forward: reaction_record(ReactionType::TotalForward, vec![2.5, 2.5, 2.5], None, None),
        reactions: vec![
            reaction_record(
                ReactionType::IncoherentScattering,
                vec![2.0, 2.0, 2.0],
                None,
                Some(DistributionRecord::AdjointKleinNishina { max_energy: 20.0 }),
            ),
            reaction_record(
                ReactionType::PhotoelectricAbsorption,
                vec![0.5, 0.5, 0.5],
                None,
                None,
            ),
        ],
    };
    let atom = Arc::new(record.build().unwrap());
    let material = Arc::new(Material::new(1, vec![atom], &[1.0], -1.0).unwrap());

    let mut rng = StdRng::seed_from_u64(2024);
    let mut absorbed = 0usize;
    for _ in 0..N_TRIALS {
        let mut p = adjoint_photon(1.0);
        let mut bank = ParticleBank::new();
        material.collide_analogue(&mut p, &mut bank, &mut rng);
        if p.is_gone() {
            absorbed += 1;
        }
    }

    let expected = 0.5 / 2.5;
    let observed = absorbed as f64 / N_TRIALS as f64;
    let tolerance = binomial_tolerance(expected, N_TRIALS);
    assert!(
        (observed - expected).abs() < tolerance,
        "absorption frequency {} outside {} +/- {}",
        observed,
        expected,
        tolerance
    );
}

#[test]
fn test_channel_selection_frequency_within_absorption_map() {
    // Two distinguishable absorption channels (reported via the interaction
    // subshell): K at 0.3 b and L1 at 0.1 b. Conditional on absorbing,
    // K must be selected 75% of the time.
    let record = AtomRecord {
        name: "Si".to_string(),
        atomic_number: 14,
        atomic_weight: None,
        energy_grid: vec![1e-5, 1.0, 20.0],
        critical_line_energies: vec![],
        total_forward: reaction_record(ReactionType::TotalForward, vec![0.4, 0.4, 0.4], None, None),
        reactions: vec![
            reaction_record(
                ReactionType::ElectroionizationSubshell(Subshell::K),
                vec![0.3, 0.3, 0.3],
                Some(ReactionCategory::Absorption),
                None,
            ),
            reaction_record(
                ReactionType::ElectroionizationSubshell(Subshell::L1),
                vec![0.1, 0.1, 0.1],
                Some(ReactionCategory::Absorption),
                None,
            ),
        ],
    };
    let atom = Arc::new(record.build().unwrap());

    let mut rng = StdRng::seed_from_u64(77);
    let mut k_shell = 0usize;
    let mut l1_shell = 0usize;
    for _ in 0..N_TRIALS {
        let mut p = adjoint_photon(1.0);
        let mut bank = ParticleBank::new();
        match atom.collide_analogue(&mut p, &mut bank, &mut rng) {
            Some(Subshell::K) => k_shell += 1,
            Some(Subshell::L1) => l1_shell += 1,
            other => panic!("unexpected interaction shell {:?}", other),
        }
        assert!(p.is_gone(), "both channels are absorption");
    }
    assert_eq!(k_shell + l1_shell, N_TRIALS, "exactly one channel per collision");

    let expected = 0.3 / 0.4;
    let observed = k_shell as f64 / N_TRIALS as f64;
    let tolerance = binomial_tolerance(expected, N_TRIALS);
    assert!(
        (observed - expected).abs() < tolerance,
        "K-shell frequency {} outside {} +/- {}",
        observed,
        expected,
        tolerance
    );
}

#[test]
fn test_collision_atom_sampling_frequency() {
    // Material of two atoms with equal fractions but 1:3 total cross
    // sections: the heavier absorber is struck 75% of the time.
    let atom = |name: &str, xs: f64| -> Arc<adjmc::Atom> {
        let record = AtomRecord {
            name: name.to_string(),
            atomic_number: 1,
            atomic_weight: Some(1.0),
            energy_grid: vec![1e-5, 1.0, 20.0],
            critical_line_energies: vec![],
            total_forward: reaction_record(
                ReactionType::TotalForward,
                vec![xs, xs, xs],
                None,
                None,
            ),
            reactions: vec![reaction_record(
                ReactionType::IncoherentScattering,
                vec![xs, xs, xs],
                None,
                Some(DistributionRecord::AdjointKleinNishina { max_energy: 20.0 }),
            )],
        };
        Arc::new(record.build().unwrap())
    };

    let material = Arc::new(
        Material::new(1, vec![atom("A", 1.0), atom("B", 3.0)], &[0.5, 0.5], 1.0).unwrap(),
    );

    let mut rng = StdRng::seed_from_u64(99);
    let mut second = 0usize;
    for _ in 0..N_TRIALS {
        if material.sample_collision_atom(1.0, &mut rng) == 1 {
            second += 1;
        }
    }

    let expected = 0.75;
    let observed = second as f64 / N_TRIALS as f64;
    let tolerance = binomial_tolerance(expected, N_TRIALS);
    assert!(
        (observed - expected).abs() < tolerance,
        "atom selection frequency {} outside {} +/- {}",
        observed,
        expected,
        tolerance
    );
}

#[test]
fn test_sampling_always_selects_an_atom() {
    // Even with wildly uneven weights the sampler returns a valid index for
    // every draw (the final atom absorbs any cumulative rounding shortfall).
    let atom = |name: &str, xs: f64| -> Arc<adjmc::Atom> {
        let record = AtomRecord {
            name: name.to_string(),
            atomic_number: 1,
            atomic_weight: Some(1.0),
            energy_grid: vec![1e-5, 1.0, 20.0],
            critical_line_energies: vec![],
            total_forward: reaction_record(
                ReactionType::TotalForward,
                vec![xs, xs, xs],
                None,
                None,
            ),
            reactions: vec![reaction_record(
                ReactionType::IncoherentScattering,
                vec![xs, xs, xs],
                None,
                Some(DistributionRecord::AdjointKleinNishina { max_energy: 20.0 }),
            )],
        };
        Arc::new(record.build().unwrap())
    };

    let material = Arc::new(
        Material::new(
            1,
            vec![atom("A", 1e-12), atom("B", 0.3), atom("C", 1e3)],
            &[0.1, 0.7, 0.2],
            1.0,
        )
        .unwrap(),
    );

    let mut rng = StdRng::seed_from_u64(31337);
    for _ in 0..10_000 {
        let index = material.sample_collision_atom(1.0, &mut rng);
        assert!(index < 3);
    }
}
