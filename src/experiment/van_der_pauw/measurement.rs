//! Tabulated Van der Pauw readings and their reduction to two axis resistances.

use std::io::Read;

use tracing::{debug, warn};

use super::geometry::{Axis, Geometry};
use super::VanDerPauwError;
use crate::electricity::resistance_from_ohms_law;
use crate::math::{mean, Scalar};

/// Column headers recognised by [`MeasurementTable::from_csv_reader`].
pub mod columns {
    /// Contact configuration.
    pub const GEOMETRY: &str = "Geometry";
    /// Measured voltage in volts.
    pub const VOLTAGE: &str = "Voltage";
    /// Applied current in amperes.
    pub const CURRENT: &str = "Current";
    /// Optional four-point resistance in ohms.
    pub const RESISTANCE: &str = "Resistance";
}

/// One observation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRow {
    /// Contact configuration the reading was taken in.
    pub geometry: Geometry,
    /// Voltage in volts.
    pub voltage: Scalar,
    /// Current in amperes.
    pub current: Scalar,
    /// Resistance in ohms, if already known.
    pub resistance: Option<Scalar>,
}

impl MeasurementRow {
    /// Creates a row without resistance.
    #[must_use]
    pub const fn new(geometry: Geometry, voltage: Scalar, current: Scalar) -> Self {
        Self {
            geometry,
            voltage,
            current,
            resistance: None,
        }
    }

    /// Creates a row with a precomputed resistance.
    #[must_use]
    pub const fn with_resistance(mut self, resistance: Scalar) -> Self {
        self.resistance = Some(resistance);
        self
    }

    /// Axis the row contributes to.
    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.geometry.axis()
    }

    /// The resistance, if present and finite. `NaN` and infinite cells count as missing.
    #[must_use]
    pub fn known_resistance(&self) -> Option<Scalar> {
        self.resistance.filter(|r| r.is_finite())
    }
}

/// Ordered Van der Pauw readings.
///
/// Rows are never reordered or removed; only the resistance column is filled in.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    rows: Vec<MeasurementRow>,
}

impl MeasurementTable {
    /// Wraps already typed rows.
    #[must_use]
    pub const fn new(rows: Vec<MeasurementRow>) -> Self {
        Self { rows }
    }

    /// Builds a table from parallel columns.
    ///
    /// All columns, including `resistance` when given, must have the same length.
    pub fn from_columns(
        geometry: Vec<Geometry>,
        voltage: Vec<Scalar>,
        current: Vec<Scalar>,
        resistance: Option<Vec<Option<Scalar>>>,
    ) -> Result<Self, VanDerPauwError> {
        let len = geometry.len();
        let mismatch = |name: &str, got: usize| {
            VanDerPauwError::Schema(format!(
                "column {name} has {got} rows, expected {len} to match {}",
                columns::GEOMETRY
            ))
        };
        if voltage.len() != len {
            return Err(mismatch(columns::VOLTAGE, voltage.len()));
        }
        if current.len() != len {
            return Err(mismatch(columns::CURRENT, current.len()));
        }
        let resistance = match resistance {
            Some(values) if values.len() != len => {
                return Err(mismatch(columns::RESISTANCE, values.len()))
            }
            Some(values) => values,
            None => vec![None; len],
        };

        let rows = geometry
            .into_iter()
            .zip(voltage)
            .zip(current)
            .zip(resistance)
            .map(|(((geometry, voltage), current), resistance)| MeasurementRow {
                geometry,
                voltage,
                current,
                resistance,
            })
            .collect();
        Ok(Self { rows })
    }

    /// Reads a CSV table with `Geometry`, `Voltage` and `Current` columns and an optional
    /// `Resistance` column. Column order is free and unknown columns are ignored; an
    /// empty `Resistance` cell is a missing value, and a `NaN` cell is treated as one.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, VanDerPauwError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                VanDerPauwError::Schema(format!("missing mandatory column {name:?}"))
            })
        };
        let geometry_idx = require(columns::GEOMETRY)?;
        let voltage_idx = require(columns::VOLTAGE)?;
        let current_idx = require(columns::CURRENT)?;
        let resistance_idx = find(columns::RESISTANCE);

        let mut rows = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let cell = |idx: usize| record.get(idx).unwrap_or("");
            let number = |idx: usize, name: &str| {
                cell(idx).parse::<Scalar>().map_err(|_| {
                    VanDerPauwError::Schema(format!(
                        "row {row}: column {name} holds {:?}, not a number",
                        cell(idx)
                    ))
                })
            };

            let geometry = Geometry::parse(cell(geometry_idx))
                .map_err(|source| VanDerPauwError::InvalidGeometry { row, source })?;
            let voltage = number(voltage_idx, columns::VOLTAGE)?;
            let current = number(current_idx, columns::CURRENT)?;
            let resistance = match resistance_idx {
                Some(idx) if !cell(idx).is_empty() => Some(number(idx, columns::RESISTANCE)?),
                _ => None,
            };
            rows.push(MeasurementRow {
                geometry,
                voltage,
                current,
                resistance,
            });
        }
        Ok(Self { rows })
    }

    /// Appends a reading.
    pub fn push(&mut self, row: MeasurementRow) {
        self.rows.push(row);
    }

    /// Rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True if any row lacks a finite resistance value.
    #[must_use]
    pub fn resistance_missing(&self) -> bool {
        self.rows.iter().any(|r| r.known_resistance().is_none())
    }

    /// Overwrites every row's resistance with `V / I`.
    ///
    /// Fails on the first row with zero current or a non-finite result. The table is
    /// left untouched on failure.
    pub fn compute_resistances(&mut self) -> Result<(), VanDerPauwError> {
        let present = self
            .rows
            .iter()
            .filter(|r| r.known_resistance().is_some())
            .count();
        if present > 0 && present < self.rows.len() {
            warn!(
                present,
                rows = self.rows.len(),
                "partial resistance column discarded, recomputing from Ohm's law"
            );
        }

        let resistances = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, entry)| {
                if entry.current == 0.0 {
                    return Err(VanDerPauwError::DivisionByZero { row });
                }
                let resistance = resistance_from_ohms_law(entry.voltage, entry.current);
                if resistance.is_finite() {
                    Ok(resistance)
                } else {
                    Err(VanDerPauwError::NonFiniteResistance { row })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (entry, resistance) in self.rows.iter_mut().zip(resistances) {
            entry.resistance = Some(resistance);
        }
        Ok(())
    }

    /// Consuming form of [`compute_resistances`](Self::compute_resistances).
    pub fn with_computed_resistances(mut self) -> Result<Self, VanDerPauwError> {
        self.compute_resistances()?;
        Ok(self)
    }

    /// Axis and resistance of every row, in order.
    pub fn classified(&self) -> impl Iterator<Item = (Axis, Option<Scalar>)> + '_ {
        self.rows.iter().map(|r| (r.axis(), r.resistance))
    }

    /// Mean resistance of the horizontal and vertical groups, `(R_h, R_v)`.
    pub fn group_and_average(&self) -> Result<(Scalar, Scalar), VanDerPauwError> {
        let mut horizontal = Vec::new();
        let mut vertical = Vec::new();
        for (row, entry) in self.rows.iter().enumerate() {
            let resistance = entry
                .known_resistance()
                .ok_or(VanDerPauwError::MissingResistance { row })?;
            match entry.axis() {
                Axis::Horizontal => horizontal.push(resistance),
                Axis::Vertical => vertical.push(resistance),
            }
        }
        debug!(
            horizontal = horizontal.len(),
            vertical = vertical.len(),
            "grouped van der pauw rows"
        );

        let rh = mean(horizontal).ok_or(VanDerPauwError::EmptyGroup {
            axis: Axis::Horizontal,
        })?;
        let rv = mean(vertical).ok_or(VanDerPauwError::EmptyGroup {
            axis: Axis::Vertical,
        })?;
        Ok((rh, rv))
    }
}

impl FromIterator<MeasurementRow> for MeasurementTable {
    fn from_iter<I: IntoIterator<Item = MeasurementRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn sample_rows() -> Vec<MeasurementRow> {
        vec![
            MeasurementRow::new(Geometry::R1234, 1.0, 1.0e-3),
            MeasurementRow::new(Geometry::R2143, 1.0, 1.0e-3),
            MeasurementRow::new(Geometry::R2341, 0.5, 1.0e-3),
            MeasurementRow::new(Geometry::R4123, 0.3, 1.0e-3),
        ]
    }

    #[test]
    fn group_means_follow_classification() {
        let table = MeasurementTable::new(sample_rows())
            .with_computed_resistances()
            .expect("finite currents");
        let (rh, rv) = table.group_and_average().expect("both groups present");
        // 1234 and 2143 are even permutations, so they average into R_v.
        assert_relative_eq!(rv, 1000.0, max_relative = 1.0e-12);
        assert_relative_eq!(rh, 400.0, max_relative = 1.0e-12);
    }

    #[test]
    fn computed_and_prefilled_resistances_agree() {
        let computed = MeasurementTable::new(sample_rows())
            .with_computed_resistances()
            .expect("finite currents");
        let prefilled: MeasurementTable = sample_rows()
            .into_iter()
            .map(|r| r.with_resistance(r.voltage / r.current))
            .collect();
        assert!(!prefilled.resistance_missing());
        assert_eq!(
            computed.group_and_average().expect("groups"),
            prefilled.group_and_average().expect("groups")
        );
    }

    #[test]
    fn resistance_missing_detects_partial_columns() {
        let mut rows = sample_rows();
        assert!(MeasurementTable::new(rows.clone()).resistance_missing());
        for r in &mut rows {
            r.resistance = Some(1.0);
        }
        rows[2].resistance = None;
        let mut table = MeasurementTable::new(rows);
        assert!(table.resistance_missing());

        table.compute_resistances().expect("finite currents");
        assert!(!table.resistance_missing());
        // Prefilled values are overwritten, not kept.
        let first = table.rows()[0].resistance.expect("computed");
        assert_relative_eq!(first, 1000.0, max_relative = 1.0e-12);
    }

    #[test]
    fn single_group_is_an_error() {
        let table = MeasurementTable::new(vec![
            MeasurementRow::new(Geometry::R1234, 1.0, 1.0e-3),
            MeasurementRow::new(Geometry::R3412, 1.0, 1.0e-3),
        ])
        .with_computed_resistances()
        .expect("finite currents");
        assert!(matches!(
            table.group_and_average(),
            Err(VanDerPauwError::EmptyGroup { axis: Axis::Horizontal })
        ));
        assert!(matches!(
            MeasurementTable::default().group_and_average(),
            Err(VanDerPauwError::EmptyGroup { .. })
        ));
    }

    #[test]
    fn zero_current_names_the_row() {
        let mut rows = sample_rows();
        rows[3].current = 0.0;
        let err = MeasurementTable::new(rows)
            .with_computed_resistances()
            .expect_err("zero current");
        assert!(matches!(err, VanDerPauwError::DivisionByZero { row: 3 }));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn failed_computation_leaves_the_table_untouched() {
        let rows = vec![
            MeasurementRow::new(Geometry::R1234, 1.0, 1.0e-3).with_resistance(5.0),
            MeasurementRow::new(Geometry::R2341, 1.0, 0.0).with_resistance(5.0),
        ];
        let mut table = MeasurementTable::new(rows.clone());
        assert!(matches!(
            table.compute_resistances(),
            Err(VanDerPauwError::DivisionByZero { row: 1 })
        ));
        assert_eq!(table.rows(), rows.as_slice());
    }

    #[test]
    fn non_finite_voltage_names_the_row() {
        for voltage in [Scalar::NAN, Scalar::INFINITY] {
            let mut rows = sample_rows();
            rows[2].voltage = voltage;
            let mut table = MeasurementTable::new(rows.clone());
            let err = table.compute_resistances().expect_err("non-finite V / I");
            assert!(matches!(err, VanDerPauwError::NonFiniteResistance { row: 2 }));
            assert!(err.to_string().contains("row 2"), "{err}");
            assert_eq!(table.rows(), rows.as_slice());
        }
    }

    #[test]
    fn non_finite_resistance_cells_count_as_missing() {
        let data = "Geometry,Voltage,Current,Resistance
1234,1.0,0.001,NaN
2341,1.0,0.001,1000
";
        let table = MeasurementTable::from_csv_reader(data.as_bytes()).expect("valid csv");
        assert!(table.rows()[0].resistance.is_some_and(Scalar::is_nan));
        assert_eq!(table.rows()[0].known_resistance(), None);
        assert!(table.resistance_missing());
        assert!(matches!(
            table.group_and_average(),
            Err(VanDerPauwError::MissingResistance { row: 0 })
        ));

        let (rh, rv) = table
            .with_computed_resistances()
            .expect("finite currents")
            .group_and_average()
            .expect("both groups");
        assert_relative_eq!(rh, 1000.0, max_relative = 1.0e-12);
        assert_relative_eq!(rv, 1000.0, max_relative = 1.0e-12);

        let infinite = MeasurementTable::new(vec![
            MeasurementRow::new(Geometry::R1234, 1.0, 1.0e-3).with_resistance(Scalar::INFINITY),
        ]);
        assert!(infinite.resistance_missing());
    }

    #[test]
    fn averaging_requires_resistances() {
        let table = MeasurementTable::new(sample_rows());
        assert!(matches!(
            table.group_and_average(),
            Err(VanDerPauwError::MissingResistance { row: 0 })
        ));
    }

    #[test]
    fn from_columns_checks_lengths() {
        let err = MeasurementTable::from_columns(
            vec![Geometry::R1234, Geometry::R2341],
            vec![1.0, 2.0],
            vec![1.0],
            None,
        )
        .expect_err("length mismatch");
        assert!(matches!(err, VanDerPauwError::Schema(_)));

        let table = MeasurementTable::from_columns(
            vec![Geometry::R1234, Geometry::R2341],
            vec![1.0, 2.0],
            vec![1.0, 1.0],
            Some(vec![Some(1.0), None]),
        )
        .expect("consistent columns");
        assert_eq!(table.len(), 2);
        assert!(table.resistance_missing());
    }

    #[test]
    fn csv_with_optional_resistance_column() {
        let data = "\
Current,Geometry,Voltage,Resistance,Note
0.001,1234,1.0,,a
0.001,2341,0.5,500,b
";
        let table = MeasurementTable::from_csv_reader(data.as_bytes()).expect("valid csv");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].geometry, Geometry::R1234);
        assert_eq!(table.rows()[0].resistance, None);
        assert_eq!(table.rows()[1].resistance, Some(500.0));
        let axes: Vec<Axis> = table.classified().map(|(axis, _)| axis).collect();
        assert_eq!(axes, vec![Axis::Vertical, Axis::Horizontal]);
    }

    #[test]
    fn csv_schema_errors() {
        let missing = "Geometry,Voltage\n1234,1.0\n";
        let err = MeasurementTable::from_csv_reader(missing.as_bytes()).expect_err("no current");
        assert!(matches!(err, VanDerPauwError::Schema(ref msg) if msg.contains("Current")));

        let bad_geometry = "Geometry,Voltage,Current\n1234,1.0,0.001\n9999,1.0,0.001\n";
        let err = MeasurementTable::from_csv_reader(bad_geometry.as_bytes()).expect_err("9999");
        match err {
            VanDerPauwError::InvalidGeometry { row, source } => {
                assert_eq!(row, 1);
                assert_eq!(source.label, "9999");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let bad_number = "Geometry,Voltage,Current\n1234,one,0.001\n";
        let err = MeasurementTable::from_csv_reader(bad_number.as_bytes())
            .expect_err("not a number");
        assert!(matches!(err, VanDerPauwError::Schema(ref msg) if msg.contains("Voltage")));
    }
}
