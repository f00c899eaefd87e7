use approx::assert_relative_eq;
use physicslab::experiment::van_der_pauw::process;
use physicslab::prelude::*;

fn row(label: &str, voltage: f64, current: f64) -> MeasurementRow {
    MeasurementRow::new(label.parse().expect("known geometry"), voltage, current)
}

#[test]
fn grouped_means_and_prefilled_equivalence() {
    // 1234 and 2143 share the vertical axis, 2341 and 4123 the horizontal one.
    let rows = vec![
        row("1234", 1.0, 0.001),
        row("2143", 1.0, 0.001),
        row("2341", 0.4, 0.001),
        row("4123", 0.6, 0.001),
    ];
    let missing = MeasurementTable::new(rows.clone());
    let filled = missing.clone().with_computed_resistances().expect("finite currents");
    let (rh, rv) = filled.group_and_average().expect("both axes");
    assert_relative_eq!(rh, 500.0, max_relative = 1.0e-12);
    assert_relative_eq!(rv, 1000.0, max_relative = 1.0e-12);

    let prefilled: MeasurementTable = rows
        .into_iter()
        .map(|r| r.with_resistance(r.voltage / r.current))
        .collect();
    assert_eq!(
        process(&missing, Some(5.0e-7)).expect("valid"),
        process(&prefilled, Some(5.0e-7)).expect("valid")
    );
}

#[test]
fn sheet_resistance_satisfies_van_der_pauw_relation() {
    let table: MeasurementTable = Geometry::PERMUTATIONS
        .into_iter()
        .map(|g| {
            let resistance = if g.is_horizontal() { 250.0 } else { 1750.0 };
            MeasurementRow::new(g, resistance * 1.0e-3, 1.0e-3)
        })
        .collect();
    let results = process(&table, None).expect("valid");
    assert!(implicit_formula(results.sheet_resistance, 250.0, 1750.0).abs() < 1.0e-9);
    assert_relative_eq!(results.ratio_resistance, 7.0, max_relative = 1.0e-12);
    assert!(results.resistivity.is_none());
}

#[test]
fn csv_round_trip_through_process() {
    let csv = "Geometry,Voltage,Current\nvertical,1.0,0.001\nhorizontal,1.0,0.001\n";
    let table = MeasurementTable::from_csv_reader(csv.as_bytes()).expect("valid csv");
    let results = process(&table, None).expect("valid");
    let expected = 1000.0 * van_der_pauw_constant();
    assert_relative_eq!(results.sheet_resistance, expected, max_relative = 1.0e-9);
}

#[test]
fn error_taxonomy() {
    assert!(Geometry::parse("9999").is_err());

    let one_axis =
        MeasurementTable::new(vec![row("1234", 1.0, 0.001), row("4321", 1.0, 0.001)]);
    let err = process(&one_axis, None).expect_err("no horizontal rows");
    assert!(matches!(err, VanDerPauwError::EmptyGroup { axis: Axis::Horizontal }));

    let zero_current =
        MeasurementTable::new(vec![row("1234", 1.0, 0.001), row("2341", 1.0, 0.0)]);
    let err = process(&zero_current, None).expect_err("zero current");
    assert!(matches!(err, VanDerPauwError::DivisionByZero { row: 1 }));

    let wrapped: PhysicsLabError = err.into();
    assert!(wrapped.to_string().contains("row 1"));
}
