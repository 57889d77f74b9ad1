pub mod catapi;
pub mod fixed;

use anyhow::Result;
use async_trait::async_trait;

/// Where breed names are checked. Could be TheCatAPI, a fixed list, etc.
#[async_trait]
pub trait BreedRegistry: Send + Sync {
    /// `Ok(false)` means the registry answered and does not know the breed.
    /// `Err` means it could not answer at all.
    async fn breed_exists(&self, name: &str) -> Result<bool>;
}

/// Registry names match trimmed and case-insensitively.
pub fn same_breed(known: &str, candidate: &str) -> bool {
    known.trim().to_lowercase() == candidate.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_breed_ignores_case_and_padding() {
        assert!(same_breed("Abyssinian", "  abyssinian "));
        assert!(same_breed("Maine Coon", "MAINE COON"));
    }

    #[test]
    fn same_breed_requires_whole_name() {
        assert!(!same_breed("Maine Coon", "Maine"));
        assert!(!same_breed("Siamese", "Siamese Cat"));
    }
}
