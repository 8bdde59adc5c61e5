use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, info_span};

use super::error::PipelineError;
use super::step::{RunContext, RunScope, Step};

/// Runs a fixed, ordered list of steps against one context.
///
/// Every step runs exactly once, in declaration order, whatever earlier steps
/// logged. The director records nothing in the context itself.
pub struct Director<C> {
    name: &'static str,
    steps: Vec<Box<dyn Step<C>>>,
}

impl<C: RunContext> Director<C> {
    pub fn builder(name: &'static str) -> DirectorBuilder<C> {
        DirectorBuilder {
            name,
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Names under which the steps of this director log, in run order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Executes every step against `ctx`.
    ///
    /// A step that panics has broken its contract: the run stops there and
    /// `PipelineError::StepAborted` is returned. Steps after it never run.
    pub fn start_work(&self, ctx: &mut C, scope: &RunScope<'_>) -> Result<(), PipelineError> {
        let _run = info_span!("pipeline", kind = self.name, run_id = %ctx.run_id()).entered();
        info!("Starting {} with {} steps", self.name, self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let _step = info_span!("step", name = step.name()).entered();
            debug!(
                "Executing step {}/{}: {}",
                index + 1,
                self.steps.len(),
                step.name()
            );

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| step.execute(ctx, scope)));
            if let Err(payload) = outcome {
                let reason = panic_message(payload.as_ref());
                error!("Step '{}' aborted the run: {}", step.name(), reason);
                return Err(PipelineError::StepAborted {
                    pipeline: self.name,
                    step: step.name(),
                    reason,
                });
            }
        }

        info!(
            "Finished {} ({} logs recorded)",
            self.name,
            ctx.logs().total_logs()
        );
        Ok(())
    }
}

pub struct DirectorBuilder<C> {
    name: &'static str,
    steps: Vec<Box<dyn Step<C>>>,
}

impl<C: RunContext> DirectorBuilder<C> {
    pub fn step(mut self, step: impl Step<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn build(self) -> Director<C> {
        Director {
            name: self.name,
            steps: self.steps,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
