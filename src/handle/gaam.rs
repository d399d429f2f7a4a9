use axum::{extract::State, Json};
use gaam_shared::gaam::GaamInfo;

use crate::Global;

pub async fn list(State(global): State<Global>) -> Json<Vec<GaamInfo>> {
    Json(crate::gaam::list(&global))
}
