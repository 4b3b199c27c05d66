use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::room::CollectionSnapshot, state::SharedState};

/// List the song collections available for lobby selection.
pub async fn list_collections(State(state): State<SharedState>) -> Json<Vec<CollectionSnapshot>> {
    let collections = state
        .quiz()
        .list_collections()
        .await
        .into_iter()
        .map(CollectionSnapshot::from)
        .collect();
    Json(collections)
}

/// Configure the collections routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/collections", get(list_collections))
}
