//! Repository Implementation - Concrete Adapter for the Repository Port
//!
//! Wraps `BookStore` (atomic JSON snapshots) and `SettlementJournal`
//! (JSONL append-only files) into a single struct implementing the
//! `Repository` trait from `crate::ports::repository`.

use anyhow::Result;
use async_trait::async_trait;

use super::settlements::SettlementJournal;
use super::state::BookStore;
use crate::domain::offer::Settlement;
use crate::ports::repository::{BookSnapshot, Repository};

/// File-backed repository combining book snapshots and the settlement journal.
pub struct RepositoryImpl {
    book_store: BookStore,
    journal: SettlementJournal,
}

impl RepositoryImpl {
    pub fn new(book_store: BookStore, journal: SettlementJournal) -> Self {
        Self {
            book_store,
            journal,
        }
    }

    /// Create a repository rooted at `data_dir`, creating directories as needed.
    pub async fn from_data_dir(data_dir: &str) -> Result<Self> {
        let book_store = BookStore::new(data_dir).await?;
        let journal = SettlementJournal::new(data_dir).await?;
        Ok(Self::new(book_store, journal))
    }
}

#[async_trait]
impl Repository for RepositoryImpl {
    async fn save_book(&self, snapshot: &BookSnapshot) -> Result<()> {
        self.book_store.save(snapshot).await
    }

    async fn load_book(&self) -> Result<Option<BookSnapshot>> {
        self.book_store.load().await
    }

    async fn append_settlement(&self, settlement: &Settlement) -> Result<()> {
        self.journal.append(settlement).await
    }

    async fn load_settlements(&self) -> Result<Vec<Settlement>> {
        self.journal.load_all().await
    }

    async fn is_healthy(&self) -> bool {
        self.journal.is_healthy().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::offer::Offer;
    use alloy::primitives::{Address, U256};

    fn scratch_dir() -> String {
        std::env::temp_dir()
            .join(format!("otc-registry-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_book_round_trip() {
        let dir = scratch_dir();
        let repo = RepositoryImpl::from_data_dir(&dir).await.unwrap();
        assert!(repo.load_book().await.unwrap().is_none());

        let offers = vec![
            Offer::new(
                Address::repeat_byte(1),
                Address::repeat_byte(0x70),
                U256::from(1337u64),
                U256::from(1337u64),
            ),
            Offer::new(
                Address::repeat_byte(2),
                Address::repeat_byte(0x70),
                U256::MAX,
                U256::ZERO,
            ),
        ];
        repo.save_book(&BookSnapshot::new(offers.clone())).await.unwrap();

        let loaded = repo.load_book().await.unwrap().unwrap();
        assert_eq!(loaded.offers, offers);
        assert_eq!(loaded.version, BookSnapshot::VERSION);
        assert!(repo.is_healthy().await);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_settlements_append_and_load() {
        let dir = scratch_dir();
        let repo = RepositoryImpl::from_data_dir(&dir).await.unwrap();
        let offer = Offer::new(
            Address::repeat_byte(1),
            Address::repeat_byte(0x70),
            U256::from(5u64),
            U256::from(6u64),
        );
        let first = Settlement::from_offer(&offer, Address::repeat_byte(2));
        let second = Settlement::from_offer(&offer, Address::repeat_byte(3));

        repo.append_settlement(&first).await.unwrap();
        repo.append_settlement(&second).await.unwrap();

        let loaded = repo.load_settlements().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(&first));
        assert!(loaded.contains(&second));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
