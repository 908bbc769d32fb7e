//! Endpoints API REST pour Spotify
//!
//! Deux routes en lecture, toujours en HTTP 200 :
//! - `GET /lyrics?title=...`
//! - `GET /loadspotifyrecommendations?url=...`

use crate::lookup::{self, LyricsPayload, RecommendationsPayload};
use crate::source::SpotifySource;
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

/// État partagé de l'application
#[derive(Clone)]
pub struct SpotifyState {
    pub source: SpotifySource,
}

/// Paramètres optionnels : un paramètre absent donne le payload vide, pas un 400
#[derive(Debug, Deserialize)]
pub struct LyricsParams {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsParams {
    #[serde(default)]
    pub url: Option<String>,
}

/// Crée le router Axum avec les endpoints Spotify
pub fn create_router(state: SpotifyState) -> Router {
    Router::new()
        .route("/lyrics", get(get_lyrics))
        .route("/loadspotifyrecommendations", get(get_recommendations))
        .with_state(state)
}

async fn get_lyrics(
    State(state): State<SpotifyState>,
    Query(params): Query<LyricsParams>,
) -> Json<LyricsPayload> {
    match params.title.filter(|t| !t.trim().is_empty()) {
        Some(title) => Json(lookup::lyrics(&state.source, &title).await),
        None => Json(LyricsPayload::default()),
    }
}

async fn get_recommendations(
    State(state): State<SpotifyState>,
    Query(params): Query<RecommendationsParams>,
) -> Json<RecommendationsPayload> {
    let url = params.url.unwrap_or_default();
    Json(lookup::recommendations(&state.source, &url).await)
}
