//! Per-run state, one context type per pipeline kind.
//!
//! Input fields are private and fixed when the context is built; steps read
//! them through getters. Accumulation fields only ever grow: a step may read
//! what earlier steps wrote but never removes it.

macro_rules! impl_run_context {
    ($ty:ty, $kind:literal) => {
        impl $crate::pipeline::RunContext for $ty {
            fn kind(&self) -> &'static str {
                $kind
            }

            fn run_id(&self) -> &str {
                &self.run_id
            }

            fn logs(&self) -> &$crate::pipeline::StepLogs {
                &self.logs
            }

            fn logs_mut(&mut self) -> &mut $crate::pipeline::StepLogs {
                &mut self.logs
            }
        }
    };
}

mod analytics;
mod match_details;
mod matches;
mod players;

pub use analytics::BuildChampionAnalyticsContext;
pub use match_details::FetchMatchDetailsContext;
pub use matches::FetchMatchesContext;
pub use players::FetchPlayersContext;

fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
