//! The mission rule engine.
//!
//! Every public operation is one unit of work on the store: it validates
//! and writes inside a single transaction, so a refused request leaves no
//! trace.

pub mod cats;
pub mod reconcile;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    CatId, Mission, MissionId, MissionPatch, MissionView, NewMission, Target, TargetId,
};
use crate::store::{Repository, Store, StoreExt};

use reconcile::ReconcilePlan;

/// Creates, updates, and deletes missions and their targets.
pub struct MissionEngine {
    store: Arc<dyn Store>,
}

impl MissionEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a mission with its initial targets.
    pub fn create(&self, input: NewMission) -> Result<MissionView> {
        reconcile::check_new_targets(&input.targets)?;
        let completed = input.completed.unwrap_or(false);
        if completed && input.targets.iter().any(|t| !t.complete.unwrap_or(false)) {
            return Err(incomplete_targets());
        }

        let now = Utc::now();
        let view = self.store.atomic(|repo| {
            if let Some(cat_id) = input.cat {
                require_cat(repo, cat_id)?;
                if repo.find_mission_by_cat(cat_id)?.is_some() {
                    return Err(Error::conflict("cat", "cat already assigned"));
                }
            }

            let mut mission = repo.insert_mission(input.cat, completed, now)?;
            for target in &input.targets {
                repo.insert_target(mission.id, target, now)?;
            }
            complete_if_done(repo, &mut mission)?;
            materialize(repo, mission)
        })?;

        info!(
            mission = view.id,
            cat = ?view.cat,
            targets = view.targets.len(),
            completed = view.completed,
            "mission created"
        );
        Ok(view)
    }

    /// Apply a partial update: assign cat, reconcile targets, apply the
    /// completed flag, then auto-complete, in that order.
    pub fn update(&self, id: MissionId, patch: MissionPatch) -> Result<MissionView> {
        let now = Utc::now();
        let view = self.store.atomic(|repo| {
            let mut mission = require_mission(repo, id)?;

            if let Some(cat_id) = patch.cat {
                link_cat(repo, &mut mission, cat_id)?;
            }

            if let Some(targets) = patch.targets {
                let existing = repo.list_targets(mission.id)?;
                let plan = reconcile::plan(&existing, targets, mission.completed)?;
                apply_plan(repo, mission.id, plan, now)?;
            }

            if let Some(flag) = patch.completed {
                set_completed(repo, &mut mission, flag)?;
            }

            complete_if_done(repo, &mut mission)?;
            materialize(repo, mission)
        })?;

        info!(mission = id, completed = view.completed, "mission updated");
        Ok(view)
    }

    /// Assign a cat to a mission that has none.
    pub fn assign_cat(&self, id: MissionId, cat_id: CatId) -> Result<MissionView> {
        let view = self.store.atomic(|repo| {
            let mut mission = require_mission(repo, id)?;
            if mission.cat.is_some() {
                return Err(Error::conflict("cat", "mission already has a cat"));
            }
            link_cat(repo, &mut mission, cat_id)?;
            materialize(repo, mission)
        })?;

        info!(mission = id, cat = cat_id, "cat assigned");
        Ok(view)
    }

    /// Overwrite a target's notes while both target and mission are active.
    pub fn update_target_notes(
        &self,
        id: MissionId,
        target_id: TargetId,
        notes: String,
    ) -> Result<Target> {
        let now = Utc::now();
        let target = self.store.atomic(|repo| {
            let mission = require_mission(repo, id)?;
            let mut target = repo
                .get_target(target_id)?
                .filter(|t| t.mission_id == mission.id)
                .ok_or_else(|| Error::not_found("target", target_id))?;

            if mission.completed || target.complete {
                return Err(Error::validation(
                    "notes",
                    "notes cannot be updated for completed targets or missions",
                ));
            }

            target.notes = notes;
            target.updated_at = now;
            repo.update_target(&target)?;
            Ok(target)
        })?;

        debug!(mission = id, target = target_id, "target notes updated");
        Ok(target)
    }

    /// Delete a mission and its targets. Refused while a cat is assigned.
    pub fn delete(&self, id: MissionId) -> Result<()> {
        self.store.atomic(|repo| {
            let mission = require_mission(repo, id)?;
            if mission.cat.is_some() {
                return Err(Error::state(
                    "cat",
                    "cannot delete a mission assigned to a cat",
                ));
            }
            for target in repo.list_targets(mission.id)? {
                repo.delete_target(target.id)?;
            }
            repo.delete_mission(mission.id)?;
            Ok(())
        })?;

        info!(mission = id, "mission deleted");
        Ok(())
    }

    pub fn get(&self, id: MissionId) -> Result<MissionView> {
        self.store.read(|repo| {
            let mission = require_mission(repo, id)?;
            materialize(repo, mission)
        })
    }

    /// All missions, newest first.
    pub fn list(&self) -> Result<Vec<MissionView>> {
        self.store.read(|repo| {
            repo.list_missions()?
                .into_iter()
                .map(|mission| materialize(repo, mission))
                .collect()
        })
    }
}

fn incomplete_targets() -> Error {
    Error::state(
        "completed",
        "cannot complete mission while some targets are incomplete",
    )
}

fn require_mission(repo: &dyn Repository, id: MissionId) -> Result<Mission> {
    repo.get_mission(id)?
        .ok_or_else(|| Error::not_found("mission", id))
}

fn require_cat(repo: &dyn Repository, id: CatId) -> Result<()> {
    match repo.get_cat(id)? {
        Some(_) => Ok(()),
        None => Err(Error::not_found("cat", id)),
    }
}

/// Link `cat_id` to `mission`. Re-linking the same cat is a no-op; a cat
/// already on another mission, or a mission already holding a different
/// cat, is a conflict.
fn link_cat(repo: &dyn Repository, mission: &mut Mission, cat_id: CatId) -> Result<()> {
    require_cat(repo, cat_id)?;
    if mission.cat == Some(cat_id) {
        return Ok(());
    }
    if mission.cat.is_some() {
        return Err(Error::conflict("cat", "mission already has a cat"));
    }
    if let Some(other) = repo.find_mission_by_cat(cat_id)?
        && other.id != mission.id
    {
        debug!(cat = cat_id, mission = other.id, "cat already on another mission");
        return Err(Error::conflict("cat", "this cat is already on another mission"));
    }

    mission.cat = Some(cat_id);
    repo.update_mission(mission)?;
    Ok(())
}

fn apply_plan(
    repo: &dyn Repository,
    mission_id: MissionId,
    plan: ReconcilePlan,
    now: DateTime<Utc>,
) -> Result<()> {
    debug!(
        mission = mission_id,
        deleted = plan.deletions.len(),
        updated = plan.updates.len(),
        created = plan.creations.len(),
        "reconciling targets"
    );

    for id in &plan.deletions {
        repo.delete_target(*id)?;
    }
    for mut target in plan.updates {
        target.updated_at = now;
        repo.update_target(&target)?;
    }
    for input in &plan.creations {
        repo.insert_target(mission_id, input, now)?;
    }
    Ok(())
}

/// Explicit completed flag. Becoming true needs every target complete;
/// becoming false is always allowed.
fn set_completed(repo: &dyn Repository, mission: &mut Mission, flag: bool) -> Result<()> {
    if flag && repo.list_targets(mission.id)?.iter().any(|t| !t.complete) {
        return Err(incomplete_targets());
    }
    if mission.completed != flag {
        mission.completed = flag;
        repo.update_mission(mission)?;
    }
    Ok(())
}

/// Mark the mission completed once it has targets and all are complete.
fn complete_if_done(repo: &dyn Repository, mission: &mut Mission) -> Result<()> {
    let targets = repo.list_targets(mission.id)?;
    if !targets.is_empty() && targets.iter().all(|t| t.complete) && !mission.completed {
        mission.completed = true;
        repo.update_mission(mission)?;
        info!(mission = mission.id, "all targets complete, mission completed");
    }
    Ok(())
}

fn materialize(repo: &dyn Repository, mission: Mission) -> Result<MissionView> {
    let targets = repo.list_targets(mission.id)?;
    Ok(MissionView::new(mission, targets))
}
