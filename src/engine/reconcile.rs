//! Full-replacement reconciliation of a mission's target list.
//!
//! [`plan`] is pure: given the stored targets and the list the client sent,
//! it decides what to delete, overwrite, and create, or refuses the whole
//! change. Applying the plan is the engine's job.

use std::collections::{HashMap, HashSet};

use crate::consts::{MAX_COUNTRY_LEN, MAX_TARGET_NAME_LEN, MAX_TARGETS, MIN_TARGETS};
use crate::error::{Error, Result};
use crate::model::{Target, TargetId, TargetInput};

/// What to do to bring the stored targets in line with the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Stored targets absent from the input.
    pub deletions: Vec<TargetId>,
    /// Stored targets with the input merged in. Timestamps are untouched.
    pub updates: Vec<Target>,
    /// Input items that match no stored target.
    pub creations: Vec<TargetInput>,
}

pub fn check_target_count(count: usize) -> Result<()> {
    if !(MIN_TARGETS..=MAX_TARGETS).contains(&count) {
        return Err(Error::validation(
            "targets",
            format!("a mission must have {MIN_TARGETS}-{MAX_TARGETS} targets, got {count}"),
        ));
    }
    Ok(())
}

/// Field rules for a single target item.
pub fn check_target_fields(input: &TargetInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("name", "target name must not be empty"));
    }
    if input.name.chars().count() > MAX_TARGET_NAME_LEN {
        return Err(Error::validation(
            "name",
            format!("target name must be at most {MAX_TARGET_NAME_LEN} characters"),
        ));
    }
    if input.country.trim().is_empty() {
        return Err(Error::validation("country", "country must not be empty"));
    }
    if input.country.chars().count() > MAX_COUNTRY_LEN {
        return Err(Error::validation(
            "country",
            format!("country must be at most {MAX_COUNTRY_LEN} characters"),
        ));
    }
    Ok(())
}

fn check_unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::validation(
                "targets",
                format!("target name '{name}' is used more than once in this mission"),
            ));
        }
    }
    Ok(())
}

/// Validate the initial target list of a new mission.
pub fn check_new_targets(inputs: &[TargetInput]) -> Result<()> {
    check_target_count(inputs.len())?;
    for input in inputs {
        check_target_fields(input)?;
    }
    check_unique_names(inputs.iter().map(|t| t.name.as_str()))
}

/// Plan a full replacement of `existing` by `incoming`.
///
/// `mission_completed` is the mission's state before the change; together
/// with each target's own `complete` flag it locks that target's notes.
/// Items are processed in input order, after deletions, so the count check
/// sees the mission as already shrunk.
pub fn plan(
    existing: &[Target],
    incoming: Vec<TargetInput>,
    mission_completed: bool,
) -> Result<ReconcilePlan> {
    check_target_count(incoming.len())?;
    for input in &incoming {
        check_target_fields(input)?;
    }

    let by_id: HashMap<TargetId, &Target> = existing.iter().map(|t| (t.id, t)).collect();

    let mut kept = HashSet::new();
    for id in incoming.iter().filter_map(|t| t.id) {
        if by_id.contains_key(&id) && !kept.insert(id) {
            return Err(Error::validation(
                "targets",
                format!("target {id} appears more than once"),
            ));
        }
    }

    let mut plan = ReconcilePlan {
        deletions: existing
            .iter()
            .filter(|t| !kept.contains(&t.id))
            .map(|t| t.id)
            .collect(),
        ..ReconcilePlan::default()
    };

    let mut count = existing.len() - plan.deletions.len();
    for input in incoming {
        match input.id.and_then(|id| by_id.get(&id).copied()) {
            Some(current) => plan.updates.push(merge(current, input, mission_completed)?),
            None => {
                if count >= MAX_TARGETS {
                    return Err(Error::validation(
                        "targets",
                        format!("cannot have more than {MAX_TARGETS} targets"),
                    ));
                }
                count += 1;
                plan.creations.push(input);
            }
        }
    }

    check_unique_names(
        plan.updates
            .iter()
            .map(|t| t.name.as_str())
            .chain(plan.creations.iter().map(|t| t.name.as_str())),
    )?;

    Ok(plan)
}

/// Overwrite `current` with `input`.
///
/// Only `notes` is locked once the target or its mission is complete; name,
/// country, and the complete flag still change.
fn merge(current: &Target, input: TargetInput, mission_completed: bool) -> Result<Target> {
    let locked = mission_completed || current.complete;
    if locked
        && let Some(notes) = &input.notes
        && *notes != current.notes
    {
        return Err(Error::validation(
            "notes",
            "cannot update notes for a completed target or mission",
        ));
    }

    Ok(Target {
        name: input.name,
        country: input.country,
        notes: input.notes.unwrap_or_else(|| current.notes.clone()),
        complete: input.complete.unwrap_or(current.complete),
        ..current.clone()
    })
}
