//! Analytical validation tests for modal analysis
//!
//! Validates computed natural frequencies and mode shapes of grid
//! cantilevers against closed-form solutions and against each other.
//!
//! Test cases:
//! 1. Slender strip - Validates the fundamental bending frequency
//! 2. Square plate - Validates ordering, mode labels and clamping
//! 3. Single-layer laminate - Validates agreement with the plate model
//! 4. Void design - Validates empty results

use mfem_solver::sparse_assembly::is_symmetric;
use mfem_solver::{
    Cantilever, CantileverFem, FemError, LaminateLayer, LaminateMaterial, ModeIdentification,
    ModeKind, PlateMaterial, Topology, modal_readouts,
};

/// Test 1: Slender Strip Modal Analysis
///
/// A 2 × 40 strip of 10 µm cells is a 20 µm wide, 400 µm long beam. With
/// ν = 0 the plate reduces to Euler-Bernoulli bending:
/// f₁ = (λ₁²/2πL²) * √(EI/ρA), λ₁ = 1.8751
///
/// Expected: FEA within 2% of analytical
#[test]
fn test_slender_strip_fundamental_frequency() {
    let h: f64 = 10e-6;
    let rho: f64 = 2330.0;
    let e: f64 = 130e9;
    let length: f64 = 400e-6;

    let material = PlateMaterial::new(h, rho, e, 0.0).unwrap();
    let cantilever = Cantilever::new(Topology::filled(2, 40), 5.0, 5.0, 10.0, 395.0).unwrap();
    let fem = CantileverFem::new(cantilever, material);
    let results = fem.modal_analysis(1).unwrap();

    // I/A = h²/12 for a rectangular section
    let lambda1: f64 = 1.8751;
    let analytical = lambda1.powi(2) / (2.0 * std::f64::consts::PI * length.powi(2))
        * (e * h * h / (12.0 * rho)).sqrt();
    let computed = results.frequencies_hz[0];
    let error = (computed - analytical).abs() / analytical;

    println!(
        "Slender strip: FEA = {computed:.1} Hz, analytical = {analytical:.1} Hz, error = {:.3}%",
        error * 100.0
    );
    assert!(error < 0.02, "fundamental frequency error {:.3}% exceeds 2%", error * 100.0);
}

/// Test 2: Square-Cell Plate
///
/// A 100 × 50 µm SOI plate clamped along its long edge.
#[test]
fn test_plate_modes_are_ordered_and_clamped() {
    let cantilever = Cantilever::new(Topology::filled(10, 5), 5.0, 5.0, 50.0, 45.0).unwrap();
    let fem = CantileverFem::new(cantilever, PlateMaterial::soi_mumps());
    let results = fem.modal_analysis(3).unwrap();

    assert_eq!(results.num_modes, 3);
    assert!(results.frequencies_hz[0] > 0.0);
    for pair in results.frequencies_hz.windows(2) {
        assert!(pair[0] < pair[1], "frequencies not increasing: {pair:?}");
    }

    // Mode shapes vanish on the clamped edge
    for i in 0..results.num_modes {
        let mode = results.mode_shape(i).unwrap();
        assert!(fem.dof().fixed_dofs().iter().all(|&d| mode[d] == 0.0));
    }

    // The fundamental mode bends the whole tip the same way
    let identification = ModeIdentification::from_fem(&fem).unwrap();
    let first = results.mode_shape(0).unwrap();
    assert_eq!(identification.identify(&first), ModeKind::Flexural);
}

#[test]
fn test_plate_readouts() {
    let cantilever = Cantilever::new(Topology::filled(10, 5), 5.0, 5.0, 50.0, 45.0).unwrap();
    let fem = CantileverFem::new(cantilever, PlateMaterial::soi_mumps());
    let results = fem.modal_analysis(2).unwrap();
    let summaries = modal_readouts(&fem, &results).unwrap();

    assert_eq!(summaries.len(), 2);
    for (i, s) in summaries.iter().enumerate() {
        assert_eq!(s.mode, i + 1);
        assert!(s.tip_displacement.abs() > 0.0);
        let stiffness = s.modal_stiffness.unwrap();
        assert!(stiffness > 0.0);
        assert!(s.charge.is_none());
        // Mass-normalized modes: φᵀKφ = λ
        let expected = s.eigenvalue / (s.tip_displacement * s.tip_displacement);
        assert!((stiffness - expected).abs() < 1e-6 * expected);
    }
}

/// Test 3: Single-Layer Laminate
///
/// A symmetric single-layer laminate has the same fundamental bending mode
/// as a plate with the same material.
#[test]
fn test_single_layer_laminate_matches_plate() {
    let (h, rho, e, nu) = (10e-6, 2330.0, 130e9, 0.29);
    let topology = Topology::filled(4, 8);
    let plate = CantileverFem::new(
        Cantilever::new(topology.clone(), 5.0, 5.0, 20.0, 75.0).unwrap(),
        PlateMaterial::new(h, rho, e, nu).unwrap(),
    );
    let laminate = CantileverFem::new(
        Cantilever::new(topology, 5.0, 5.0, 20.0, 75.0).unwrap(),
        LaminateMaterial::new(vec![LaminateLayer::elastic(h, rho, e, nu)], 0).unwrap(),
    );

    let p = plate.modal_analysis(1).unwrap().frequencies_hz[0];
    let l = laminate.modal_analysis(1).unwrap().frequencies_hz[0];
    assert!((p - l).abs() < 1e-6 * p, "plate {p} Hz vs laminate {l} Hz");
}

#[test]
fn test_piezo_laminate_produces_charge() {
    let cantilever = Cantilever::new(Topology::filled(6, 10), 5.0, 5.0, 30.0, 95.0).unwrap();
    let fem = CantileverFem::new(cantilever, LaminateMaterial::piezo_mumps());
    let results = fem.modal_analysis(1).unwrap();
    let summaries = modal_readouts(&fem, &results).unwrap();

    let charge = summaries[0].charge.unwrap();
    assert!(charge.is_finite());
    assert!(charge != 0.0);
    assert!(fem.capacitance_matrix().is_some());
}

/// Test 4: Void Design
#[test]
fn test_void_design_has_no_modes() {
    let cantilever = Cantilever::new(Topology::empty(4, 4), 5.0, 5.0, 5.0, 5.0).unwrap();
    let fem = CantileverFem::new(cantilever, PlateMaterial::soi_mumps());
    assert!(fem.mesh().is_empty());
    let results = fem.modal_analysis(3).unwrap();
    assert!(results.is_empty());
    assert!(modal_readouts(&fem, &results).unwrap().is_empty());
}

#[test]
fn test_tip_on_void_is_rejected() {
    let topology = Topology::from_rows(&[vec![1, 1, 1], vec![1, 1, 0]]).unwrap();
    let cantilever = Cantilever::new(topology, 5.0, 5.0, 15.0, 25.0).unwrap();
    let fem = CantileverFem::new(cantilever, PlateMaterial::soi_mumps());
    let results = fem.modal_analysis(1).unwrap();
    let err = modal_readouts(&fem, &results).unwrap_err();
    assert!(matches!(err, FemError::PointOutsideDomain { .. }));
}

#[test]
fn test_assembled_matrices_are_symmetric() {
    let topology = Topology::from_rows(&[
        vec![1, 1, 1, 1],
        vec![1, 0, 0, 1],
        vec![1, 1, 1, 1],
    ])
    .unwrap();
    let plate = CantileverFem::new(
        Cantilever::new(topology.clone(), 5.0, 5.0, 5.0, 35.0).unwrap(),
        PlateMaterial::soi_mumps(),
    );
    let laminate = CantileverFem::new(
        Cantilever::new(topology, 5.0, 5.0, 5.0, 35.0).unwrap(),
        LaminateMaterial::piezo_mumps(),
    );
    for fem in [&plate, &laminate] {
        assert!(is_symmetric(fem.stiffness_matrix()));
        assert!(is_symmetric(fem.mass_matrix()));
        assert!(is_symmetric(&fem.free_stiffness_matrix()));
    }
}
