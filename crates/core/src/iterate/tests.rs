use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};

use super::*;

/// Two states and three controls sampled on a non-uniform grid.
fn non_uniform() -> Iterate {
    Iterate::from_parts(
        DVector::from_vec(vec![0.0, 1.0, 2.0, 3.0, 5.0]),
        DMatrix::from_row_slice(
            2,
            5,
            &[
                0.0, 1.0, 4.0, 9.0, 81.0, //
                5.0, 4.0, 3.0, 2.0, 1.0,
            ],
        ),
        DMatrix::from_row_slice(
            3,
            5,
            &[
                -1.0, 0.0, -1.0, 0.0, -1.0, //
                0.0, 3.0, -3.0, 1.0, 1.0, //
                5.0, 3.0, 3.0, 3.0, 3.0,
            ],
        ),
        ["a", "b"],
        ["x", "y", "z"],
    )
}

fn assert_row(actual: &RowDVector<f64>, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-12);
    }
}

#[test]
fn setting_a_guess_requires_time() {
    let mut it = Iterate::new(["x"], ["u"]);
    let err = it.set_state_guess("x", &[1.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(err.to_string().contains("time is empty"));

    let err = it.set_control_guess("u", &[1.0]).unwrap_err();
    assert!(err.to_string().contains("time is empty"));
}

#[test]
fn guess_length_must_match_time() {
    let mut it = Iterate::new(["x"], ["u"]);
    it.set_time(linspace(0.0, 1.0, 15));
    let err = it.set_state_guess("x", &[0.0, 1.0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
    assert!(err.to_string().contains("Expected value to have 15 elements"));
}

#[test]
fn unknown_channels_are_rejected() {
    let mut it = Iterate::new(["x"], ["u"]);
    it.set_time(linspace(0.0, 1.0, 3));

    let err = it.set_state_guess("H", &[0.0; 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownChannel);
    assert_eq!(err.to_string(), "State H does not exist.");

    let err = it.set_control_guess("H", &[0.0; 3]).unwrap_err();
    assert_eq!(err.to_string(), "Control H does not exist.");

    // A state name is not a control name.
    assert!(it.set_control_guess("x", &[0.0; 3]).is_err());
}

#[test]
fn guesses_read_back_exactly() {
    let mut it = Iterate::new(["x", "v"], ["F"]);
    it.set_time([0.0, 0.3, 0.7, 1.0]);
    let x = [0.1, -2.0 / 3.0, 1e-300, 4.5];
    it.set_state_guess("x", &x).unwrap();
    it.set_control_guess("F", &[1.0, 2.0, 3.0, 4.0]).unwrap();

    assert_eq!(it.state("x").unwrap().as_slice(), x);
    assert_eq!(it.state("v").unwrap().as_slice(), [0.0; 4]);
    assert_eq!(it.states().shape(), (2, 4));
    assert_eq!(it.controls().shape(), (1, 4));
    assert!(it.state("F").is_none());
    assert!(it.validate(2, 1).is_ok());
}

#[test]
fn stale_tables_are_reported_after_time_changes() {
    let mut it = Iterate::new(["x"], ["u"]);
    it.set_time(linspace(0.0, 1.0, 5));
    it.set_state_guess("x", &[0.0; 5]).unwrap();

    it.set_time(linspace(0.0, 1.0, 6));
    let err = it.set_state_guess("x", &[0.0; 6]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected states to have 1 rows and 6 columns, but it has 1 rows and 5 columns."
    );

    // The untouched controls table follows the new grid.
    assert!(it.set_control_guess("u", &[0.0; 6]).is_ok());
}

#[test]
fn validation_reports_column_counts() {
    let cases = [(5, 15, 15), (15, 16, 15), (15, 15, 12)];
    for (nt, ns, nc) in cases {
        let it = Iterate::from_parts(
            DVector::zeros(nt),
            DMatrix::zeros(2, ns),
            DMatrix::zeros(1, nc),
            ["x", "v"],
            ["F"],
        );
        let err = it.validate(2, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Expected time, states, and controls to have the same number of columns \
                 (they have {nt}, {ns}, {nc} columns, respectively)."
            )
        );
    }
}

#[test]
fn validation_reports_row_counts() {
    let it = Iterate::from_parts(
        DVector::zeros(5),
        DMatrix::zeros(6, 5),
        DMatrix::zeros(1, 5),
        ["a", "b", "c", "d", "e", "f"],
        ["u"],
    );
    let err = it.validate(2, 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected states to have 2 rows, but it has 6 rows."
    );

    let it = Iterate::from_parts(
        DVector::zeros(5),
        DMatrix::zeros(2, 5),
        DMatrix::zeros(4, 5),
        ["x", "v"],
        ["a", "b", "c", "d"],
    );
    let err = it.validate(2, 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected controls to have 1 rows, but it has 4 rows."
    );
}

#[test]
fn same_length_interpolation_is_identity() {
    let it = non_uniform();
    assert_eq!(it.interpolate(5).unwrap(), it);
    assert_eq!(it.interpolate_with(5, Interpolation::Linear).unwrap(), it);
}

#[test]
fn linear_upsampling_of_a_non_uniform_grid() {
    let it = non_uniform().interpolate_with(9, Interpolation::Linear).unwrap();

    assert_eq!(
        it.time().as_slice(),
        [0.0, 0.625, 1.25, 1.875, 2.5, 3.125, 3.75, 4.375, 5.0]
    );
    assert_row(
        &it.state("a").unwrap(),
        &[0.0, 0.625, 1.75, 3.625, 6.5, 13.5, 36.0, 58.5, 81.0],
    );
    assert_row(
        &it.state("b").unwrap(),
        &[5.0, 4.375, 3.75, 3.125, 2.5, 1.9375, 1.625, 1.3125, 1.0],
    );
    assert_row(
        &it.control("x").unwrap(),
        &[-1.0, -0.375, -0.25, -0.875, -0.5, -0.0625, -0.375, -0.6875, -1.0],
    );
    assert_row(
        &it.control("y").unwrap(),
        &[0.0, 1.875, 1.5, -2.25, -1.0, 1.0, 1.0, 1.0, 1.0],
    );
    assert_row(
        &it.control("z").unwrap(),
        &[5.0, 3.75, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0],
    );
}

#[test]
fn spline_upsampling_is_smooth() {
    let it = non_uniform().interpolate(9).unwrap();

    assert_eq!(it.num_times(), 9);
    assert_row(
        &it.state("a").unwrap(),
        &[
            0.0,
            0.337_141_170_058_139_54,
            1.741_824_127_906_976_8,
            3.741_846_838_662_790_6,
            4.882_267_441_860_465,
            11.076_364_916_424_415,
            27.869_095_203_488_37,
            52.480_003_179_505_815,
            81.0,
        ],
    );
    assert_row(
        &it.state("b").unwrap(),
        &[
            5.0,
            4.372_785_701_308_139,
            3.753_542_877_906_977,
            3.129_053_869_912_790_6,
            2.476_017_441_860_465_2,
            1.897_898_119_549_418_7,
            1.492_142_078_488_372,
            1.214_134_038_880_814,
            1.0,
        ],
    );
}

#[test]
fn uniform_round_trip_recovers_the_original() {
    let original = Iterate::from_parts(
        DVector::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0]),
        DMatrix::from_row_slice(1, 5, &[0.0, 1.0, 4.0, 9.0, 16.0]),
        DMatrix::from_row_slice(1, 5, &[2.0, -1.0, 0.5, 3.0, 0.0]),
        ["x"],
        ["u"],
    );
    let up = original.interpolate(9).unwrap();
    assert_eq!(up.time().as_slice(), linspace(0.0, 4.0, 9));
    assert_relative_eq!(up.states()[(0, 1)], 0.339_285_714_285_714_25, epsilon = 1e-12);

    let down = up.interpolate(5).unwrap();
    assert_eq!(down, original);
}

#[test]
fn decreasing_time_is_rejected() {
    let it = Iterate::from_parts(
        DVector::from_vec(vec![0.0, 1.0, 2.0, 1.5, 3.0]),
        DMatrix::zeros(1, 5),
        DMatrix::zeros(1, 5),
        ["x"],
        ["u"],
    );
    let err = it.interpolate(5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Order);
    assert!(err.to_string().contains("Expected time to be non-decreasing"));
    assert!(matches!(err, IterateError::Order { index: 3, .. }));
}

#[test]
fn repeated_times_keep_the_last_sample() {
    let it = Iterate::from_parts(
        DVector::from_vec(vec![0.0, 1.0, 1.0, 2.0]),
        DMatrix::from_row_slice(1, 4, &[0.0, 5.0, 1.0, 2.0]),
        DMatrix::zeros(0, 4),
        ["x"],
        Vec::<String>::new(),
    );
    let out = it.interpolate_with(3, Interpolation::Linear).unwrap();
    assert_row(&out.state("x").unwrap(), &[0.0, 1.0, 2.0]);
    assert_eq!(out.controls().shape(), (0, 3));
}

#[test]
fn a_single_time_is_broadcast() {
    let it = Iterate::from_parts(
        DVector::from_vec(vec![2.0, 2.0]),
        DMatrix::from_row_slice(1, 2, &[3.0, 4.0]),
        DMatrix::zeros(0, 2),
        ["x"],
        Vec::<String>::new(),
    );
    let out = it.interpolate(3).unwrap();
    assert_eq!(out.time().as_slice(), [2.0, 2.0, 2.0]);
    assert_eq!(out.state("x").unwrap().as_slice(), [4.0, 4.0, 4.0]);
}

#[test]
fn interpolation_needs_points() {
    let err = non_uniform().interpolate(1).unwrap_err();
    assert!(matches!(err, IterateError::TooFewPoints { requested: 1 }));

    let empty = Iterate::new(["x"], ["u"]);
    assert_eq!(empty.interpolate(0).unwrap(), empty);
    let err = empty.interpolate(4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn files_round_trip_through_disk() {
    let mut it = Iterate::new(["a", "b", "c"], ["x", "y"]);
    let n = 15;
    it.set_time(linspace(0.0, 2.0, n));
    for (k, name) in ["a", "b", "c"].into_iter().enumerate() {
        let values: Vec<f64> = (0..n).map(|i| (1.3 * i as f64 + k as f64).sin() * 1e3).collect();
        it.set_state_guess(name, &values).unwrap();
    }
    for (k, name) in ["x", "y"].into_iter().enumerate() {
        let values: Vec<f64> = (0..n).map(|i| (0.7 * i as f64 - k as f64).cos() / 7.0).collect();
        it.set_control_guess(name, &values).unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guess.csv");
    it.write(&path).unwrap();
    let restored = Iterate::read(&path).unwrap();

    assert_eq!(restored.state_names(), it.state_names());
    assert_eq!(restored.control_names(), it.control_names());
    assert_eq!(restored.time().len(), n);
    for (a, b) in restored.states().iter().zip(it.states().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-5);
    }
    for (a, b) in restored.controls().iter().zip(it.controls().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-5);
    }
}

#[test]
fn empty_tables_report_their_own_column_count() {
    let it = Iterate::from_parts(
        DVector::zeros(5),
        DMatrix::zeros(0, 7),
        DMatrix::zeros(1, 5),
        Vec::<String>::new(),
        ["u"],
    );
    let err = it.validate(0, 1).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected time, states, and controls to have the same number of columns \
         (they have 5, 7, 5 columns, respectively)."
    );
}

fn point_mass_layout() -> Layout {
    Layout::new(0.0, 1.0)
        .state("x", [-1.5, 1.5], None, None)
        .state("v", [-10.0, 10.0], None, None)
        .control("F", [-50.0, 50.0])
}

#[test]
fn names_must_follow_the_layout() {
    let layout = point_mass_layout();

    let mut swapped = Iterate::new(["v", "x"], ["torque"]);
    swapped.set_time([0.0, 0.5, 1.0]);
    swapped.set_state_guess("x", &[0.0, 0.5, 1.0]).unwrap();
    swapped.set_control_guess("torque", &[1.0; 3]).unwrap();

    // Counts alone agree.
    assert!(swapped.validate(2, 1).is_ok());

    let err = swapped.validate_against(&layout).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownChannel);
    assert_eq!(
        err.to_string(),
        r#"Expected state names ["x", "v"], but the iterate has ["v", "x"] (first difference at position 0)."#
    );

    let mut renamed = Iterate::new(["x", "v"], ["torque"]);
    renamed.set_time([0.0, 0.5, 1.0]);
    renamed.set_state_guess("x", &[0.0, 0.5, 1.0]).unwrap();
    renamed.set_control_guess("torque", &[1.0; 3]).unwrap();
    let err = renamed.validate_against(&layout).unwrap_err();
    assert!(matches!(
        err,
        IterateError::ChannelNames {
            kind: "control",
            index: 0,
            ..
        }
    ));

    let mut matching = Iterate::new(["x", "v"], ["F"]);
    matching.set_time([0.0, 0.5, 1.0]);
    matching.set_state_guess("x", &[0.0, 0.5, 1.0]).unwrap();
    matching.set_control_guess("F", &[1.0; 3]).unwrap();
    assert!(matching.validate_against(&layout).is_ok());
}

#[test]
fn repeated_names_resolve_to_the_first_row() {
    let mut it = Iterate::new(["x", "x"], ["F"]);
    it.set_time([0.0, 1.0]);
    it.set_state_guess("x", &[1.0, 2.0]).unwrap();
    it.set_control_guess("F", &[0.0, 0.0]).unwrap();

    assert_eq!(it.state("x").unwrap().as_slice(), [1.0, 2.0]);
    assert_eq!(it.states().row(1).iter().copied().collect::<Vec<_>>(), [0.0, 0.0]);

    let err = it.validate_against(&point_mass_layout()).unwrap_err();
    assert!(matches!(
        err,
        IterateError::ChannelNames {
            kind: "state",
            index: 1,
            ..
        }
    ));
}
