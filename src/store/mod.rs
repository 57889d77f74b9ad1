pub mod sqlite;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};

use crate::error;
use crate::model::{Cat, CatId, Mission, MissionId, NewCat, Target, TargetId, TargetInput};

/// Row-level access to cats, missions, and targets.
///
/// Implementations do no validation and never stamp rows themselves: the
/// services pass `now` in. Lookups return `None` for missing ids, deletes
/// report whether a row existed. All calls made through one instance belong
/// to the same transaction.
pub trait Repository {
    // --- Cats ---

    fn get_cat(&self, id: CatId) -> Result<Option<Cat>>;
    /// Newest first.
    fn list_cats(&self) -> Result<Vec<Cat>>;
    fn insert_cat(&self, cat: &NewCat, now: DateTime<Utc>) -> Result<Cat>;
    fn update_cat(&self, cat: &Cat) -> Result<()>;
    fn delete_cat(&self, id: CatId) -> Result<bool>;

    // --- Missions ---

    fn get_mission(&self, id: MissionId) -> Result<Option<Mission>>;
    /// Newest first.
    fn list_missions(&self) -> Result<Vec<Mission>>;
    /// The mission a cat is currently linked to, if any.
    fn find_mission_by_cat(&self, cat_id: CatId) -> Result<Option<Mission>>;
    fn insert_mission(
        &self,
        cat: Option<CatId>,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Mission>;
    fn update_mission(&self, mission: &Mission) -> Result<()>;
    fn delete_mission(&self, id: MissionId) -> Result<bool>;

    // --- Targets ---

    /// In creation order.
    fn list_targets(&self, mission_id: MissionId) -> Result<Vec<Target>>;
    fn get_target(&self, id: TargetId) -> Result<Option<Target>>;
    fn insert_target(
        &self,
        mission_id: MissionId,
        target: &TargetInput,
        now: DateTime<Utc>,
    ) -> Result<Target>;
    fn update_target(&self, target: &Target) -> Result<()>;
    fn delete_target(&self, id: TargetId) -> Result<bool>;
}

/// How a unit of work touches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Lookups only. Never blocks other readers.
    Read,
    /// Takes the write lock up front, so check-then-write sequences cannot
    /// race.
    Write,
}

/// A closure run against one transaction's [`Repository`].
pub type UnitOfWork<'a> = Box<dyn FnOnce(&dyn Repository) -> error::Result<()> + 'a>;

/// Transactional entry point the services work through.
///
/// `run` commits when the work returns `Ok` and rolls back otherwise.
/// Units of work never interleave.
pub trait Store: Send + Sync {
    fn run(&self, access: Access, work: UnitOfWork<'_>) -> error::Result<()>;
}

/// Typed wrappers over [`Store::run`].
pub trait StoreExt: Store {
    /// Run `f` as one read-write transaction.
    fn atomic<T>(&self, f: impl FnOnce(&dyn Repository) -> error::Result<T>) -> error::Result<T> {
        scoped(self, Access::Write, f)
    }

    /// Run `f` as one read-only transaction.
    fn read<T>(&self, f: impl FnOnce(&dyn Repository) -> error::Result<T>) -> error::Result<T> {
        scoped(self, Access::Read, f)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

fn scoped<S, T, F>(store: &S, access: Access, f: F) -> error::Result<T>
where
    S: Store + ?Sized,
    F: FnOnce(&dyn Repository) -> error::Result<T>,
{
    let mut out = None;
    store.run(
        access,
        Box::new(|repo: &dyn Repository| {
            out = Some(f(repo)?);
            Ok(())
        }),
    )?;
    out.ok_or_else(|| anyhow!("unit of work was not run").into())
}
