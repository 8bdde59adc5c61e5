use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::debug;

use super::control::RunControl;
use super::step::{timed, UnitError};

/// Outcome of one unit run through the pool.
#[derive(Debug)]
pub struct UnitResult<U, T> {
    pub unit: U,
    pub outcome: Result<T, UnitError>,
    pub elapsed: Duration,
}

/// Runs `work` over every unit with at most `concurrency` units in flight.
///
/// With a concurrency of 1 (or a single unit) everything runs on the calling
/// thread. Units picked up after `control` is cancelled fail with
/// `UnitError::Cancelled` without calling `work`. The returned vector is in
/// the same order as `units`.
pub fn run_units<U, T, F>(
    units: Vec<U>,
    concurrency: usize,
    control: &RunControl,
    work: F,
) -> Vec<UnitResult<U, T>>
where
    U: Send,
    T: Send,
    F: Fn(&U) -> Result<T, UnitError> + Sync,
{
    let worker_count = concurrency.max(1).min(units.len());
    if worker_count <= 1 {
        return units
            .into_iter()
            .map(|unit| run_unit(unit, control, &work))
            .collect();
    }

    let total = units.len();
    let (job_sender, job_receiver) = bounded::<(usize, U)>(worker_count * 2);
    let (result_sender, result_receiver) = unbounded::<(usize, UnitResult<U, T>)>();

    thread::scope(|scope| {
        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let work = &work;
            scope.spawn(move || run_worker(worker_id, job_rx, result_tx, control, work));
        }
        // Workers hold their own clones; dropping ours lets the result
        // channel disconnect once every worker has exited.
        drop(job_receiver);
        drop(result_sender);

        for job in units.into_iter().enumerate() {
            if job_sender.send(job).is_err() {
                break;
            }
        }
        drop(job_sender);
    });

    let mut collected: Vec<(usize, UnitResult<U, T>)> = result_receiver.iter().collect();
    collected.sort_by_key(|(idx, _)| *idx);
    debug!("Pool finished {} of {} units", collected.len(), total);
    collected.into_iter().map(|(_, result)| result).collect()
}

fn run_worker<U, T, F>(
    worker_id: usize,
    job_receiver: Receiver<(usize, U)>,
    result_sender: Sender<(usize, UnitResult<U, T>)>,
    control: &RunControl,
    work: &F,
) where
    F: Fn(&U) -> Result<T, UnitError>,
{
    debug!("Unit worker {} started", worker_id);
    for (idx, unit) in job_receiver.iter() {
        let result = run_unit(unit, control, work);
        if result_sender.send((idx, result)).is_err() {
            debug!("Unit worker {} result channel closed", worker_id);
            break;
        }
    }
    debug!("Unit worker {} stopped", worker_id);
}

fn run_unit<U, T, F>(unit: U, control: &RunControl, work: &F) -> UnitResult<U, T>
where
    F: Fn(&U) -> Result<T, UnitError>,
{
    if control.is_cancelled() {
        return UnitResult {
            unit,
            outcome: Err(UnitError::Cancelled),
            elapsed: Duration::ZERO,
        };
    }
    let (outcome, elapsed) = timed(|| work(&unit));
    UnitResult {
        unit,
        outcome,
        elapsed,
    }
}
