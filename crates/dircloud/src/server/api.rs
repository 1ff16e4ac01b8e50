use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::pathkey::PathKey;
use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::tree::Child;

#[derive(Debug, Deserialize)]
pub struct ChildrenQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChildrenResponse {
    pub path: String,
    pub size: u64,
    pub children: Vec<Child>,
}

/// Children of one branch as JSON. Unknown paths list no children.
pub async fn children(
    State(state): State<AppState>,
    Query(query): Query<ChildrenQuery>,
) -> Result<Json<ChildrenResponse>, AppError> {
    let store = Arc::clone(&state.store);
    let snapshot = tokio::task::spawn_blocking(move || store.current()).await??;

    let path = PathKey::new(query.path.as_deref().unwrap_or("/"));
    let tree = &snapshot.tree;
    Ok(Json(ChildrenResponse {
        size: tree.branch_size(path.as_str()),
        children: tree.children(path.as_str()).to_vec(),
        path: path.as_str().to_string(),
    }))
}
