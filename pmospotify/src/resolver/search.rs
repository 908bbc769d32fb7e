use super::Resolver;
use crate::error::Result;
use crate::models::{LoadedItem, PlaylistResult};
use tracing::debug;

impl Resolver {
    /// Recherche libre ; aucun résultat donne `LoadedItem::NoTrack`
    pub(crate) async fn search(&self, query: &str) -> Result<LoadedItem> {
        let results = self.session.search(query).await?;
        let hits = results.track_hits();
        debug!("Search '{}' returned {} tracks", query, hits.len());

        if hits.is_empty() {
            return Ok(LoadedItem::NoTrack);
        }

        let tracks = hits
            .iter()
            .map(|hit| hit.to_descriptor())
            .collect::<Result<Vec<_>>>()?;

        Ok(LoadedItem::Playlist(PlaylistResult::search_result(
            format!("Search result for: {}", query),
            tracks,
        )))
    }
}
