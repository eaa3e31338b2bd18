//! In-process content store.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::info;

use super::{ContentStore, GeneratedContent};
use crate::core::{OrchestrationResult, TopicRequest};
use crate::errors::PersistenceError;

/// Keeps users and generated content in memory.
///
/// Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct InMemoryContentStore {
    users: DashSet<String>,
    records: DashMap<i64, GeneratedContent>,
    next_id: AtomicI64,
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashSet::new(),
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Registers a user so content can be saved for them.
    pub fn register_user(&self, email: impl Into<String>) {
        self.users.insert(email.into());
    }

    /// Returns true if the user is registered.
    #[must_use]
    pub fn has_user(&self, email: &str) -> bool {
        self.users.contains(email)
    }

    fn require_user(&self, email: &str) -> Result<(), PersistenceError> {
        if self.has_user(email) {
            Ok(())
        } else {
            Err(PersistenceError::user_not_found(email))
        }
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn save(
        &self,
        user_email: &str,
        request: &TopicRequest,
        result: &OrchestrationResult,
    ) -> Result<i64, PersistenceError> {
        self.require_user(user_email)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records
            .insert(id, GeneratedContent::from_result(id, user_email, request, result));
        info!(id, user = user_email, "Saved generated content");
        Ok(id)
    }

    async fn find_by_id(&self, id: i64, email: &str) -> Result<GeneratedContent, PersistenceError> {
        self.require_user(email)?;
        self.records
            .get(&id)
            .filter(|record| record.owner_email == email)
            .map(|record| record.value().clone())
            .ok_or(PersistenceError::ContentNotFound { id })
    }

    async fn list_for_user(&self, email: &str) -> Result<Vec<GeneratedContent>, PersistenceError> {
        self.require_user(email)?;
        let mut records: Vec<GeneratedContent> = self
            .records
            .iter()
            .filter(|entry| entry.owner_email == email)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn delete(&self, id: i64, email: &str) -> Result<(), PersistenceError> {
        self.require_user(email)?;
        if self
            .records
            .remove_if(&id, |_, record| record.owner_email == email)
            .is_none()
        {
            return Err(PersistenceError::ContentNotFound { id });
        }
        info!(id, user = email, "Deleted generated content");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Platform, ResearchPoints, Tone};
    use pretty_assertions::assert_eq;

    fn request() -> TopicRequest {
        TopicRequest::new("Rust", Platform::Blog, Tone::Authoritative).with_image_count(2)
    }

    fn result() -> OrchestrationResult {
        let mut result = OrchestrationResult::empty("Rust");
        result.research = ResearchPoints::new(vec!["Memory safe".into()]);
        result.content.headline = "Why Rust".to_string();
        result
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let store = InMemoryContentStore::new();
        store.register_user("a@example.com");

        let first = store.save("a@example.com", &request(), &result()).await.unwrap();
        let second = store.save("a@example.com", &request(), &result()).await.unwrap();

        assert_eq!((first, second), (1, 2));
        let record = store.find_by_id(first, "a@example.com").await.unwrap();
        assert_eq!(record.platform, "blog");
        assert_eq!(record.image_count, 2);
        assert_eq!(record.headline, "Why Rust");
        assert_eq!(record.research_points, vec!["Memory safe".to_string()]);
    }

    #[tokio::test]
    async fn test_save_for_unknown_user_fails() {
        let store = InMemoryContentStore::new();

        let err = store.save("ghost@example.com", &request(), &result()).await.unwrap_err();

        assert_eq!(err, PersistenceError::user_not_found("ghost@example.com"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_records_are_scoped_to_owner() {
        let store = InMemoryContentStore::new();
        store.register_user("a@example.com");
        store.register_user("b@example.com");
        let id = store.save("a@example.com", &request(), &result()).await.unwrap();

        assert_eq!(
            store.find_by_id(id, "b@example.com").await,
            Err(PersistenceError::ContentNotFound { id })
        );
        assert!(store.delete(id, "b@example.com").await.is_err());
        assert!(store.list_for_user("b@example.com").await.unwrap().is_empty());
        assert!(store.delete(id, "a@example.com").await.is_ok());
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = InMemoryContentStore::new();
        store.register_user("a@example.com");
        for _ in 0..3 {
            tokio_test::block_on(store.save("a@example.com", &request(), &result())).unwrap();
        }

        let ids: Vec<i64> = tokio_test::block_on(store.list_for_user("a@example.com"))
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();

        assert_eq!(ids, vec![3, 2, 1]);
    }
}
