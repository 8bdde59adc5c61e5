//! Steps of the four pipelines.
//!
//! Every step opens its log key first, so a step with nothing to do still
//! shows up in the summary with a count of zero.

mod analytics;
mod match_details;
mod matches;
mod players;

use serde::Serialize;
use serde_json::Value;

use crate::client::DocumentStore;
use crate::domain::DocumentKind;
use crate::pipeline::{timed, RunScope, StepLog, StepLogs};

pub use analytics::{AggregateChampionStatsStep, LoadMatchDetailsStep, PersistChampionAnalyticsStep};
pub use match_details::{
    LoadPlayerMatchesStep, PersistMatchDetailsStep, PullMatchDetailsStep, ValidateMatchDetailsStep,
};
pub use matches::{LoadPlayersStep, PersistPlayerMatchesStep, PullMatchesFromRiotStep};
pub use players::{
    FilterExistingPlayersStep, PersistPlayersStep, PullLeagueEntriesStep, ResolvePlayerAccountsStep,
};

/// Writes `entities` to the database for `kind`, one bulk write per chunk of
/// `chunk_size`, recording one log per chunk.
pub(crate) fn persist_chunked<'e, T, I>(
    step_name: &'static str,
    store: &dyn DocumentStore,
    kind: DocumentKind,
    entities: I,
    chunk_size: usize,
    logs: &mut StepLogs,
    scope: &RunScope<'_>,
) where
    T: Serialize + 'e,
    I: IntoIterator<Item = &'e T>,
{
    let (encoded, elapsed) = timed(|| {
        entities
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
    });
    let documents = match encoded {
        Ok(documents) => documents,
        Err(e) => {
            let message = format!("Could not encode {} documents: {}", kind.database(), e);
            scope.record(logs, StepLog::failed(step_name, message, elapsed));
            return;
        }
    };

    if documents.is_empty() {
        return;
    }

    let chunks: Vec<Vec<Value>> = documents
        .chunks(chunk_size.max(1))
        .map(<[Value]>::to_vec)
        .collect();
    let db = kind.database();

    let results = scope.run_units(chunks, |chunk| {
        store
            .bulk_put(db, chunk, scope.control())
            .into_store_body()
            .map(|_| chunk.len())
    });

    for result in results {
        let log = match result.outcome {
            Ok(written) => StepLog::successful(
                step_name,
                format!("Persisted {} documents to {}", written, db),
                result.elapsed,
            ),
            Err(e) => StepLog::failed(
                step_name,
                format!("Failed to persist {} documents to {} - {}", result.unit.len(), db, e),
                result.elapsed,
            ),
        };
        scope.record(logs, log);
    }
}
