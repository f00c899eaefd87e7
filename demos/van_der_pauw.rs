use physicslab::curves::HysteresisLoop;
use physicslab::experiment::hall::{self, HallMeasurement};
use physicslab::experiment::magnetization::{self, MagnetizationMeasurement, MagnetizationRow};
use physicslab::experiment::van_der_pauw::{MeasurementTable, ProcessOptions, VanDerPauw};
use physicslab::experiment::{process_all, Sample};
use tracing_subscriber::EnvFilter;

const SAMPLE_A: &str = "\
Geometry,Voltage,Current
1234,1.02,0.001
3412,1.01,0.001
2143,-1.02,-0.001
4321,-1.01,-0.001
2341,0.48,0.001
4123,0.47,0.001
3214,-0.48,-0.001
1432,-0.47,-0.001
";

// Mislabelled: every reading is on the vertical axis.
const SAMPLE_B: &str = "\
Geometry,Voltage,Current
1234,0.9,0.001
2143,0.9,0.001
";

const HALL_SWEEP: &str = "\
B,VH,I
-0.5,1.04e-3,1.0e-3
-0.25,0.52e-3,1.0e-3
0.0,0.0,1.0e-3
0.25,-0.52e-3,1.0e-3
0.5,-1.04e-3,1.0e-3
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let samples = vec![
        Sample::new("A", MeasurementTable::from_csv_reader(SAMPLE_A.as_bytes())?),
        Sample::new("B", MeasurementTable::from_csv_reader(SAMPLE_B.as_bytes())?),
    ];
    let experiment = VanDerPauw::new(ProcessOptions::new().with_thickness(200.0e-9));

    println!("sample, Rs(ohm/sq), ratio, rho(ohm m)");
    let mut sheet_resistance_a = None;
    for outcome in process_all(&experiment, &samples) {
        match outcome.result {
            Ok(r) => {
                println!(
                    "{}, {:.6e}, {:.3}, {:.6e}",
                    outcome.name,
                    r.sheet_resistance,
                    r.ratio_resistance,
                    r.resistivity.unwrap_or(f64::NAN)
                );
                if outcome.name == "A" {
                    sheet_resistance_a = Some(r.sheet_resistance);
                }
            }
            Err(err) => eprintln!("{err}"),
        }
    }

    let sweep = HallMeasurement::from_csv_reader(HALL_SWEEP.as_bytes())?;
    let results = hall::process(&sweep, Some(200.0e-9), sheet_resistance_a)?;
    println!(
        "hall: n_s = {:.4e} m^-2 ({}-type), mobility = {:.4e} m^2/(V s)",
        results.sheet_density,
        results.conductivity_type,
        results.mobility.unwrap_or(f64::NAN)
    );

    // Field swept 2000 -> -2000 -> 2000 over a soft ferromagnet on a diamagnetic substrate.
    let film = HysteresisLoop::new(3.0e-3, 1.2e-3, 150.0);
    let field: Vec<f64> = (0..=80)
        .map(|i| 2000.0 - 50.0 * f64::from(i))
        .chain((1..=80).map(|i| -2000.0 + 50.0 * f64::from(i)))
        .collect();
    let rows = film
        .sweep(&field)
        .into_iter()
        .zip(&field)
        .map(|(m, &b)| MagnetizationRow {
            magnetic_field: b,
            magnetization: m + 1.0e-5 - 2.0e-7 * b,
        })
        .collect();
    let m = magnetization::process(&MagnetizationMeasurement::new(rows))?;
    println!(
        "magnetization: chi = {:.3e}, Ms = {:.3e}, Mr = {:.3e}, Hc = {:.1}, DM/FM = {:.3}",
        m.magnetic_susceptibility, m.saturation, m.remanence, m.coercivity, m.ratio_dm_fm
    );
    Ok(())
}
