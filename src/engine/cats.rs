use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::breeds::BreedRegistry;
use crate::consts::{MAX_BREED_LEN, MAX_CAT_NAME_LEN};
use crate::error::{Error, Result};
use crate::model::{Cat, CatId, CatPatch, NewCat};
use crate::store::{Store, StoreExt};

/// Cat CRUD with breed validation against the registry.
///
/// Breed lookups happen before the transaction opens, so a slow catalog
/// never holds the store.
pub struct CatService {
    store: Arc<dyn Store>,
    breeds: Arc<dyn BreedRegistry>,
}

impl CatService {
    pub fn new(store: Arc<dyn Store>, breeds: Arc<dyn BreedRegistry>) -> Self {
        Self { store, breeds }
    }

    pub async fn create(&self, input: NewCat) -> Result<Cat> {
        check_name(&input.name)?;
        check_breed_field(&input.breed)?;
        self.check_breed(&input.breed).await?;

        let now = Utc::now();
        let cat = self
            .store
            .atomic(|repo| Ok(repo.insert_cat(&input, now)?))?;

        info!(cat = cat.id, breed = %cat.breed, "cat created");
        Ok(cat)
    }

    /// All cats, newest first.
    pub fn list(&self) -> Result<Vec<Cat>> {
        self.store.read(|repo| Ok(repo.list_cats()?))
    }

    pub fn get(&self, id: CatId) -> Result<Cat> {
        self.store
            .read(|repo| repo.get_cat(id)?.ok_or_else(|| Error::not_found("cat", id)))
    }

    /// Partial update. A provided breed is checked against the registry.
    pub async fn update(&self, id: CatId, patch: CatPatch) -> Result<Cat> {
        if let Some(name) = &patch.name {
            check_name(name)?;
        }
        if let Some(breed) = &patch.breed {
            check_breed_field(breed)?;
            self.check_breed(breed).await?;
        }

        let now = Utc::now();
        let cat = self.store.atomic(|repo| {
            let mut cat = repo
                .get_cat(id)?
                .ok_or_else(|| Error::not_found("cat", id))?;
            if let Some(name) = patch.name {
                cat.name = name;
            }
            if let Some(years) = patch.years_experience {
                cat.years_experience = years;
            }
            if let Some(breed) = patch.breed {
                cat.breed = breed;
            }
            if let Some(salary) = patch.salary {
                cat.salary = salary;
            }
            cat.updated_at = now;
            repo.update_cat(&cat)?;
            Ok(cat)
        })?;

        info!(cat = id, "cat updated");
        Ok(cat)
    }

    /// Delete a cat, unlinking it from its mission first. The mission stays.
    pub fn delete(&self, id: CatId) -> Result<()> {
        self.store.atomic(|repo| {
            if repo.get_cat(id)?.is_none() {
                return Err(Error::not_found("cat", id));
            }
            if let Some(mut mission) = repo.find_mission_by_cat(id)? {
                mission.cat = None;
                repo.update_mission(&mission)?;
                info!(cat = id, mission = mission.id, "cat unlinked from mission");
            }
            repo.delete_cat(id)?;
            Ok(())
        })?;

        info!(cat = id, "cat deleted");
        Ok(())
    }

    /// Ask the registry. Anything but a confirmed match is a validation
    /// failure on `breed`, including an unreachable registry.
    async fn check_breed(&self, breed: &str) -> Result<()> {
        match self.breeds.breed_exists(breed).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::validation(
                "breed",
                format!("breed '{breed}' not recognized"),
            )),
            Err(e) => {
                warn!(breed, error = %e, "breed lookup failed");
                Err(Error::validation(
                    "breed",
                    format!("could not validate breed: {e}"),
                ))
            }
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "name must not be empty"));
    }
    if name.chars().count() > MAX_CAT_NAME_LEN {
        return Err(Error::validation(
            "name",
            format!("name must be at most {MAX_CAT_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

fn check_breed_field(breed: &str) -> Result<()> {
    if breed.trim().is_empty() {
        return Err(Error::validation("breed", "breed must not be empty"));
    }
    if breed.chars().count() > MAX_BREED_LEN {
        return Err(Error::validation(
            "breed",
            format!("breed must be at most {MAX_BREED_LEN} characters"),
        ));
    }
    Ok(())
}
