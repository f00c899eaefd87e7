//! Experiment-specific analyses and a driver for processing many samples.

/// Hall effect: sheet carrier density, conductivity type, mobility.
pub mod hall;
/// Magnetization: linear background and ferromagnetic hysteresis loop.
pub mod magnetization;
/// Van der Pauw: sheet resistance from four-point measurements.
pub mod van_der_pauw;

use crate::errors::PhysicsLabError;

/// An analysis turning one tabulated measurement into derived quantities.
pub trait Experiment {
    /// Measurement consumed by the analysis.
    type Input;
    /// Derived quantities.
    type Output;
    /// Analysis failure.
    type Error: Into<PhysicsLabError>;

    /// Analyses one measurement.
    fn process(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// A measurement labelled with the name of the sample it was taken on.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    /// Sample identifier used in results and error messages.
    pub name: String,
    /// Measurement data.
    pub data: T,
}

impl<T> Sample<T> {
    /// Labels `data` with `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, data: T) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Result of processing one [`Sample`].
#[derive(Debug)]
pub struct SampleOutcome<T> {
    /// Name of the processed sample.
    pub name: String,
    /// Derived quantities or the failure, tagged with the sample name.
    pub result: Result<T, PhysicsLabError>,
}

fn process_one<E: Experiment>(
    experiment: &E,
    sample: &Sample<E::Input>,
) -> SampleOutcome<E::Output> {
    let result = experiment
        .process(&sample.data)
        .map_err(|err| PhysicsLabError::Sample {
            name: sample.name.clone(),
            source: Box::new(err.into()),
        });
    if let Err(err) = &result {
        tracing::debug!(sample = %sample.name, error = %err, "sample failed");
    }
    SampleOutcome {
        name: sample.name.clone(),
        result,
    }
}

/// Processes every sample, returning outcomes in input order.
///
/// Samples are independent; with the `parallel` feature they are distributed over the
/// rayon thread pool, each touched by exactly one worker.
#[cfg(feature = "parallel")]
pub fn process_all<E>(experiment: &E, samples: &[Sample<E::Input>]) -> Vec<SampleOutcome<E::Output>>
where
    E: Experiment + Sync,
    E::Input: Sync,
    E::Output: Send,
{
    use rayon::prelude::*;

    samples
        .par_iter()
        .map(|sample| process_one(experiment, sample))
        .collect()
}

/// Processes every sample, returning outcomes in input order.
#[cfg(not(feature = "parallel"))]
pub fn process_all<E: Experiment>(
    experiment: &E,
    samples: &[Sample<E::Input>],
) -> Vec<SampleOutcome<E::Output>> {
    samples
        .iter()
        .map(|sample| process_one(experiment, sample))
        .collect()
}
