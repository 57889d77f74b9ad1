use anyhow::{Result, bail};
use async_trait::async_trait;

use super::{BreedRegistry, same_breed};

/// A registry backed by a fixed list, for tests and offline runs.
pub struct FixedBreeds {
    names: Option<Vec<String>>,
}

impl FixedBreeds {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// A registry that never answers, like a catalog that is down.
    pub fn unavailable() -> Self {
        Self { names: None }
    }
}

#[async_trait]
impl BreedRegistry for FixedBreeds {
    async fn breed_exists(&self, name: &str) -> Result<bool> {
        match &self.names {
            Some(names) => Ok(names.iter().any(|known| same_breed(known, name))),
            None => bail!("breed registry unavailable"),
        }
    }
}
