use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::AppState;
use super::extract::{Json, Path};
use crate::error::Result;
use crate::model::{
    AssignCat, MissionId, MissionPatch, MissionView, NewMission, NotesUpdate, Target, TargetId,
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<MissionView>>> {
    Ok(Json(state.missions.list()?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewMission>,
) -> Result<(StatusCode, Json<MissionView>)> {
    let mission = state.missions.create(input)?;
    Ok((StatusCode::CREATED, Json(mission)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<MissionId>,
) -> Result<Json<MissionView>> {
    Ok(Json(state.missions.get(id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<MissionId>,
    Json(patch): Json<MissionPatch>,
) -> Result<Json<MissionView>> {
    Ok(Json(state.missions.update(id, patch)?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<MissionId>,
) -> Result<StatusCode> {
    state.missions.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_cat(
    State(state): State<AppState>,
    Path(id): Path<MissionId>,
    Json(body): Json<AssignCat>,
) -> Result<Json<MissionView>> {
    Ok(Json(state.missions.assign_cat(id, body.cat_id)?))
}

/// Named so a malformed segment is reported by name.
#[derive(Deserialize)]
pub struct TargetPath {
    mission_id: MissionId,
    target_id: TargetId,
}

pub async fn update_notes(
    State(state): State<AppState>,
    Path(path): Path<TargetPath>,
    Json(body): Json<NotesUpdate>,
) -> Result<Json<Target>> {
    Ok(Json(state.missions.update_target_notes(
        path.mission_id,
        path.target_id,
        body.notes,
    )?))
}
