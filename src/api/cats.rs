use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;
use super::extract::{Json, Path};
use crate::error::Result;
use crate::model::{Cat, CatId, CatPatch, NewCat};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Cat>>> {
    Ok(Json(state.cats.list()?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewCat>,
) -> Result<(StatusCode, Json<Cat>)> {
    let cat = state.cats.create(input).await?;
    Ok((StatusCode::CREATED, Json(cat)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<CatId>) -> Result<Json<Cat>> {
    Ok(Json(state.cats.get(id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CatId>,
    Json(patch): Json<CatPatch>,
) -> Result<Json<Cat>> {
    Ok(Json(state.cats.update(id, patch).await?))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<CatId>) -> Result<StatusCode> {
    state.cats.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
