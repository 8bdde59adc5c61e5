//! Read side: persisted champion analytics.

use crate::client::{read_all_docs, DocumentStore};
use crate::domain::{ChampionAnalytics, DocumentKind};
use crate::error::ClientError;
use crate::pipeline::RunControl;

/// Every persisted champion analytics document, in store order.
///
/// Documents that no longer match the current shape are skipped with a
/// warning instead of failing the whole read.
pub fn all_champion_details(store: &dyn DocumentStore) -> Result<Vec<ChampionAnalytics>, ClientError> {
    let all = read_all_docs::<ChampionAnalytics>(store, DocumentKind::ChampionDetails, None, &RunControl::new())
        .map_err(|e| ClientError::Read {
            path: DocumentKind::ChampionDetails.all_docs_path(None),
            reason: e.to_string(),
        })?;

    if all.skipped > 0 {
        tracing::warn!("Skipped {} unreadable champion documents", all.skipped);
    }
    Ok(all.docs)
}
