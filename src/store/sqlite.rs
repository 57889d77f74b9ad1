use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

use super::{Access, Repository, Store, UnitOfWork};
use crate::error;
use crate::model::{
    Cat, CatId, Mission, MissionId, NewCat, Salary, Target, TargetId, TargetInput,
};

/// SQLite-backed store for cats, missions, and targets.
///
/// Shares a database with [`Config`](crate::config::Config). Every unit of
/// work runs through [`Store::run`], which holds the connection for
/// the whole read-validate-write sequence.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the schema in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open store database")?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS cats (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                name             TEXT NOT NULL,
                years_experience INTEGER NOT NULL DEFAULT 0 CHECK (years_experience >= 0),
                breed            TEXT NOT NULL,
                salary_cents     INTEGER NOT NULL CHECK (salary_cents >= 0),
                created_at       TEXT NOT NULL,
                updated_at       TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS missions (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                cat_id     INTEGER UNIQUE REFERENCES cats(id),
                completed  INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS targets (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                mission_id INTEGER NOT NULL REFERENCES missions(id),
                name       TEXT NOT NULL,
                country    TEXT NOT NULL,
                notes      TEXT NOT NULL DEFAULT '',
                complete   INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS targets_by_mission ON targets (mission_id);",
        )
        .context("failed to create store schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }
}

impl Store for SqliteStore {
    /// Writes open with `BEGIN IMMEDIATE`, reads with a deferred
    /// transaction. Callers are serialized on the connection either way.
    fn run(&self, access: Access, work: UnitOfWork<'_>) -> error::Result<()> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("store connection lock poisoned"))?;
        let behavior = match access {
            Access::Read => TransactionBehavior::Deferred,
            Access::Write => TransactionBehavior::Immediate,
        };
        let tx = conn
            .transaction_with_behavior(behavior)
            .context("failed to begin transaction")?;
        work(&SqliteRepo { conn: &tx })?;
        match access {
            Access::Read => tx.rollback().context("failed to end read transaction")?,
            Access::Write => tx.commit().context("failed to commit transaction")?,
        }
        Ok(())
    }
}

/// [`Repository`] over one open transaction.
struct SqliteRepo<'a> {
    conn: &'a Connection,
}

fn cat_from_row(row: &Row<'_>) -> rusqlite::Result<Cat> {
    Ok(Cat {
        id: row.get(0)?,
        name: row.get(1)?,
        years_experience: row.get(2)?,
        breed: row.get(3)?,
        salary: Salary::from_cents(row.get(4)?),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn mission_from_row(row: &Row<'_>) -> rusqlite::Result<Mission> {
    Ok(Mission {
        id: row.get(0)?,
        cat: row.get(1)?,
        completed: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn target_from_row(row: &Row<'_>) -> rusqlite::Result<Target> {
    Ok(Target {
        id: row.get(0)?,
        mission_id: row.get(1)?,
        name: row.get(2)?,
        country: row.get(3)?,
        notes: row.get(4)?,
        complete: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Repository for SqliteRepo<'_> {
    // --- Cats ---

    fn get_cat(&self, id: CatId) -> Result<Option<Cat>> {
        let cat = self
            .conn
            .query_row(
                "SELECT id, name, years_experience, breed, salary_cents, created_at, updated_at
                 FROM cats WHERE id = ?1",
                [id],
                cat_from_row,
            )
            .optional()
            .context("failed to load cat")?;
        Ok(cat)
    }

    fn list_cats(&self) -> Result<Vec<Cat>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, years_experience, breed, salary_cents, created_at, updated_at
             FROM cats ORDER BY id DESC",
        )?;
        let cats = stmt
            .query_map([], cat_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to list cats")?;
        Ok(cats)
    }

    fn insert_cat(&self, cat: &NewCat, now: DateTime<Utc>) -> Result<Cat> {
        self.conn
            .execute(
                "INSERT INTO cats (name, years_experience, breed, salary_cents, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    cat.name,
                    cat.years_experience,
                    cat.breed,
                    cat.salary.cents(),
                    now
                ],
            )
            .context("failed to insert cat")?;
        Ok(Cat {
            id: self.conn.last_insert_rowid(),
            name: cat.name.clone(),
            years_experience: cat.years_experience,
            breed: cat.breed.clone(),
            salary: cat.salary,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_cat(&self, cat: &Cat) -> Result<()> {
        self.conn
            .execute(
                "UPDATE cats SET name = ?2, years_experience = ?3, breed = ?4,
                 salary_cents = ?5, updated_at = ?6 WHERE id = ?1",
                params![
                    cat.id,
                    cat.name,
                    cat.years_experience,
                    cat.breed,
                    cat.salary.cents(),
                    cat.updated_at
                ],
            )
            .context("failed to update cat")?;
        Ok(())
    }

    fn delete_cat(&self, id: CatId) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM cats WHERE id = ?1", [id])
            .context("failed to delete cat")?;
        Ok(n > 0)
    }

    // --- Missions ---

    fn get_mission(&self, id: MissionId) -> Result<Option<Mission>> {
        let mission = self
            .conn
            .query_row(
                "SELECT id, cat_id, completed, created_at FROM missions WHERE id = ?1",
                [id],
                mission_from_row,
            )
            .optional()
            .context("failed to load mission")?;
        Ok(mission)
    }

    fn list_missions(&self) -> Result<Vec<Mission>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, cat_id, completed, created_at FROM missions ORDER BY id DESC")?;
        let missions = stmt
            .query_map([], mission_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to list missions")?;
        Ok(missions)
    }

    fn find_mission_by_cat(&self, cat_id: CatId) -> Result<Option<Mission>> {
        let mission = self
            .conn
            .query_row(
                "SELECT id, cat_id, completed, created_at FROM missions WHERE cat_id = ?1",
                [cat_id],
                mission_from_row,
            )
            .optional()
            .context("failed to look up mission by cat")?;
        Ok(mission)
    }

    fn insert_mission(
        &self,
        cat: Option<CatId>,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Mission> {
        self.conn
            .execute(
                "INSERT INTO missions (cat_id, completed, created_at) VALUES (?1, ?2, ?3)",
                params![cat, completed, now],
            )
            .context("failed to insert mission")?;
        Ok(Mission {
            id: self.conn.last_insert_rowid(),
            cat,
            completed,
            created_at: now,
        })
    }

    fn update_mission(&self, mission: &Mission) -> Result<()> {
        self.conn
            .execute(
                "UPDATE missions SET cat_id = ?2, completed = ?3 WHERE id = ?1",
                params![mission.id, mission.cat, mission.completed],
            )
            .context("failed to update mission")?;
        Ok(())
    }

    fn delete_mission(&self, id: MissionId) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM missions WHERE id = ?1", [id])
            .context("failed to delete mission")?;
        Ok(n > 0)
    }

    // --- Targets ---

    fn list_targets(&self, mission_id: MissionId) -> Result<Vec<Target>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mission_id, name, country, notes, complete, created_at, updated_at
             FROM targets WHERE mission_id = ?1 ORDER BY id ASC",
        )?;
        let targets = stmt
            .query_map([mission_id], target_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to list targets")?;
        Ok(targets)
    }

    fn get_target(&self, id: TargetId) -> Result<Option<Target>> {
        let target = self
            .conn
            .query_row(
                "SELECT id, mission_id, name, country, notes, complete, created_at, updated_at
                 FROM targets WHERE id = ?1",
                [id],
                target_from_row,
            )
            .optional()
            .context("failed to load target")?;
        Ok(target)
    }

    fn insert_target(
        &self,
        mission_id: MissionId,
        target: &TargetInput,
        now: DateTime<Utc>,
    ) -> Result<Target> {
        let notes = target.notes.clone().unwrap_or_default();
        let complete = target.complete.unwrap_or(false);
        self.conn
            .execute(
                "INSERT INTO targets (mission_id, name, country, notes, complete, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![mission_id, target.name, target.country, notes, complete, now],
            )
            .context("failed to insert target")?;
        Ok(Target {
            id: self.conn.last_insert_rowid(),
            mission_id,
            name: target.name.clone(),
            country: target.country.clone(),
            notes,
            complete,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_target(&self, target: &Target) -> Result<()> {
        self.conn
            .execute(
                "UPDATE targets SET name = ?2, country = ?3, notes = ?4, complete = ?5,
                 updated_at = ?6 WHERE id = ?1",
                params![
                    target.id,
                    target.name,
                    target.country,
                    target.notes,
                    target.complete,
                    target.updated_at
                ],
            )
            .context("failed to update target")?;
        Ok(())
    }

    fn delete_target(&self, id: TargetId) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM targets WHERE id = ?1", [id])
            .context("failed to delete target")?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreExt;

    fn new_cat(name: &str) -> NewCat {
        NewCat {
            name: name.to_string(),
            years_experience: 2,
            breed: "Siamese".to_string(),
            salary: Salary::from_cents(100_000),
        }
    }

    #[test]
    fn rollback_on_error_discards_writes() {
        let store = SqliteStore::in_memory().unwrap();
        let result: error::Result<()> = store.atomic(|repo| {
            repo.insert_mission(None, false, Utc::now())?;
            Err(error::Error::validation("targets", "nope"))
        });
        assert!(result.is_err());

        let missions = store.atomic(|repo| Ok(repo.list_missions()?)).unwrap();
        assert!(missions.is_empty());
    }

    #[test]
    fn read_access_never_commits() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .read(|repo| Ok(repo.insert_mission(None, false, Utc::now())?))
            .unwrap();

        let missions = store.read(|repo| Ok(repo.list_missions()?)).unwrap();
        assert!(missions.is_empty());
    }

    #[test]
    fn one_mission_per_cat_is_enforced_by_schema() {
        let store = SqliteStore::in_memory().unwrap();
        let cat = store
            .atomic(|repo| Ok(repo.insert_cat(&new_cat("Tom"), Utc::now())?))
            .unwrap();

        store
            .atomic(|repo| Ok(repo.insert_mission(Some(cat.id), false, Utc::now())?))
            .unwrap();
        let second =
            store.atomic(|repo| Ok(repo.insert_mission(Some(cat.id), false, Utc::now())?));
        assert!(matches!(second, Err(error::Error::Store(_))));
    }

    #[test]
    fn targets_list_in_creation_order() {
        let store = SqliteStore::in_memory().unwrap();
        let targets = store
            .atomic(|repo| {
                let mission = repo.insert_mission(None, false, Utc::now())?;
                repo.insert_target(mission.id, &TargetInput::new("B", "Y"), Utc::now())?;
                repo.insert_target(mission.id, &TargetInput::new("A", "X"), Utc::now())?;
                Ok(repo.list_targets(mission.id)?)
            })
            .unwrap();
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
    }
}
