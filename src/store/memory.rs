//! In-memory [`InvestmentRepository`] for development and tests.
//!
//! All tables live behind one [`tokio::sync::RwLock`], so every operation is
//! atomic with respect to the others, including the conditional status
//! update.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{InvestmentFilter, InvestmentRepository, StatusUpdate, StoreError};
use crate::domain::{
    FileId, Investment, InvestmentEvent, InvestmentFile, InvestmentId, Offer, OfferId, UserId,
    UserProfile,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, UserProfile>,
    offers: HashMap<OfferId, Offer>,
    investments: HashMap<InvestmentId, Investment>,
    files: HashMap<FileId, InvestmentFile>,
    events: Vec<InvestmentEvent>,
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user profile.
    pub async fn insert_user(&self, user: UserProfile) {
        self.tables.write().await.users.insert(user.id, user);
    }

    /// Inserts or replaces an offer.
    pub async fn insert_offer(&self, offer: Offer) {
        self.tables.write().await.offers.insert(offer.id, offer);
    }

    /// Inserts or replaces an investment.
    pub async fn insert_investment(&self, investment: Investment) {
        self.tables
            .write()
            .await
            .investments
            .insert(investment.id, investment);
    }

    /// Returns a copy of the event log.
    pub async fn events(&self) -> Vec<InvestmentEvent> {
        self.tables.read().await.events.clone()
    }
}

#[async_trait]
impl InvestmentRepository for MemoryStore {
    async fn find_investment(&self, id: InvestmentId) -> Result<Option<Investment>, StoreError> {
        Ok(self.tables.read().await.investments.get(&id).cloned())
    }

    async fn list_investments(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<(Vec<Investment>, u64), StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Investment> = tables
            .investments
            .values()
            .filter(|inv| inv.is_live())
            .filter(|inv| filter.owner.is_none_or(|owner| inv.user_id == owner))
            .filter(|inv| filter.status.is_none_or(|status| inv.status == status))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn find_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        Ok(self.tables.read().await.offers.get(&id).cloned())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<Option<Investment>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(investment) = tables.investments.get_mut(&update.investment_id) else {
            return Ok(None);
        };
        if investment.status != update.expected || !investment.is_live() {
            return Ok(None);
        }
        investment.status = update.next;
        if let Some(reason) = &update.reason {
            investment.reason = Some(reason.clone());
        }
        if let Some(completed_at) = update.completed_at() {
            investment.completed_at = Some(completed_at);
        }
        investment.updated_at = update.at;
        Ok(Some(investment.clone()))
    }

    async fn list_files(
        &self,
        investment_id: InvestmentId,
    ) -> Result<Vec<InvestmentFile>, StoreError> {
        let tables = self.tables.read().await;
        let mut files: Vec<InvestmentFile> = tables
            .files
            .values()
            .filter(|f| f.investment_id == investment_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(files)
    }

    async fn find_file(
        &self,
        investment_id: InvestmentId,
        file_id: FileId,
    ) -> Result<Option<InvestmentFile>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .files
            .get(&file_id)
            .filter(|f| f.investment_id == investment_id)
            .cloned())
    }

    async fn insert_file(&self, file: &InvestmentFile) -> Result<(), StoreError> {
        self.tables.write().await.files.insert(file.id, file.clone());
        Ok(())
    }

    async fn delete_file(
        &self,
        investment_id: InvestmentId,
        file_id: FileId,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let belongs = tables
            .files
            .get(&file_id)
            .is_some_and(|f| f.investment_id == investment_id);
        if belongs {
            tables.files.remove(&file_id);
        }
        Ok(belongs)
    }

    async fn append_event(&self, event: &InvestmentEvent) -> Result<(), StoreError> {
        self.tables.write().await.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::InvestmentStatus;
    use chrono::Utc;

    fn update(id: InvestmentId, expected: InvestmentStatus, next: InvestmentStatus) -> StatusUpdate {
        StatusUpdate {
            investment_id: id,
            expected,
            next,
            reason: None,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn update_applies_when_status_matches() {
        let store = MemoryStore::new();
        let inv = Investment::new(UserId::new(), OfferId::new(), 500);
        let id = inv.id;
        store.insert_investment(inv).await;

        let result = store
            .update_status(&update(id, InvestmentStatus::Pending, InvestmentStatus::Accepted))
            .await;
        let Ok(Some(updated)) = result else {
            panic!("update should apply");
        };
        assert_eq!(updated.status, InvestmentStatus::Accepted);
    }

    #[tokio::test]
    async fn update_is_skipped_on_stale_status() {
        let store = MemoryStore::new();
        let mut inv = Investment::new(UserId::new(), OfferId::new(), 500);
        inv.status = InvestmentStatus::Cancelled;
        let id = inv.id;
        store.insert_investment(inv).await;

        let result = store
            .update_status(&update(id, InvestmentStatus::Pending, InvestmentStatus::Accepted))
            .await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn completion_sets_timestamp() {
        let store = MemoryStore::new();
        let mut inv = Investment::new(UserId::new(), OfferId::new(), 500);
        inv.status = InvestmentStatus::Accepted;
        let id = inv.id;
        store.insert_investment(inv).await;

        let result = store
            .update_status(&update(id, InvestmentStatus::Accepted, InvestmentStatus::Completed))
            .await;
        let Ok(Some(updated)) = result else {
            panic!("update should apply");
        };
        assert!(updated.completed_at.is_some());
    }

    #[tokio::test]
    async fn list_filters_owner_and_hides_deleted() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        store
            .insert_investment(Investment::new(owner, OfferId::new(), 1))
            .await;
        store
            .insert_investment(Investment::new(UserId::new(), OfferId::new(), 2))
            .await;
        let mut deleted = Investment::new(owner, OfferId::new(), 3);
        deleted.deleted_at = Some(Utc::now());
        store.insert_investment(deleted).await;

        let filter = InvestmentFilter {
            owner: Some(owner),
            limit: 10,
            ..InvestmentFilter::default()
        };
        let Ok((page, total)) = store.list_investments(&filter).await else {
            panic!("list failed");
        };
        assert_eq!(total, 1);
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn delete_file_requires_matching_investment() {
        let store = MemoryStore::new();
        let file = InvestmentFile {
            id: FileId::new(),
            investment_id: InvestmentId::new(),
            file_name: "a.pdf".to_string(),
            file_size: 1,
            mime_type: "application/pdf".to_string(),
            storage_path: "k".to_string(),
            created_at: Utc::now(),
            uploaded_by: UserId::new(),
        };
        let _ = store.insert_file(&file).await;

        assert!(matches!(
            store.delete_file(InvestmentId::new(), file.id).await,
            Ok(false)
        ));
        assert!(matches!(
            store.delete_file(file.investment_id, file.id).await,
            Ok(true)
        ));
    }
}
