use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step panicked instead of logging its failure. Later steps were not run.
    #[error("Step '{step}' aborted the {pipeline} run: {reason}")]
    StepAborted {
        pipeline: &'static str,
        step: &'static str,
        reason: String,
    },

    #[error("{pipeline} run is incomplete, missing steps: {}", .missing.join(", "))]
    IncompleteRun {
        pipeline: &'static str,
        missing: Vec<String>,
    },
}
