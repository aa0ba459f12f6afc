//! List entry repository.
//!
//! Every query that can touch another user's rows takes the acting user's ID
//! and filters on it.

use std::sync::Arc;

use crate::{
    entities::{
        ListEntry,
        list_entry::{self, ListKind},
    },
    map_write_err,
};
use chrono::Utc;
use humap_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

/// List entry repository for database operations.
#[derive(Clone)]
pub struct ListEntryRepository {
    db: Arc<DatabaseConnection>,
}

impl ListEntryRepository {
    /// Create a new list entry repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a list entry by ID, regardless of owner.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<list_entry::Model>> {
        ListEntry::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the entry matching an exact membership key.
    ///
    /// `activity_id = None` matches a bare custom list row.
    pub async fn find_membership(
        &self,
        user_id: &str,
        kind: ListKind,
        list_name: &str,
        activity_id: Option<&str>,
    ) -> AppResult<Option<list_entry::Model>> {
        let query = ListEntry::find()
            .filter(list_entry::Column::UserId.eq(user_id))
            .filter(list_entry::Column::Kind.eq(kind))
            .filter(list_entry::Column::ListName.eq(list_name));

        let query = match activity_id {
            Some(id) => query.filter(list_entry::Column::ActivityId.eq(id)),
            None => query.filter(list_entry::Column::ActivityId.is_null()),
        };

        query
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the liked entry of a user for an activity.
    pub async fn find_liked(
        &self,
        user_id: &str,
        activity_id: &str,
    ) -> AppResult<Option<list_entry::Model>> {
        self.find_membership(user_id, ListKind::Liked, "", Some(activity_id))
            .await
    }

    /// Find any entry of a named custom list, with or without an activity.
    pub async fn find_any_in_custom_list(
        &self,
        user_id: &str,
        list_name: &str,
    ) -> AppResult<Option<list_entry::Model>> {
        ListEntry::find()
            .filter(list_entry::Column::UserId.eq(user_id))
            .filter(list_entry::Column::Kind.eq(ListKind::Custom))
            .filter(list_entry::Column::ListName.eq(list_name))
            .order_by_asc(list_entry::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get every entry owned by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<list_entry::Model>> {
        ListEntry::find()
            .filter(list_entry::Column::UserId.eq(user_id))
            .order_by_desc(list_entry::Column::CreatedAt)
            .order_by_desc(list_entry::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn list_query(user_id: &str, kind: ListKind, list_name: &str) -> Select<ListEntry> {
        ListEntry::find()
            .filter(list_entry::Column::UserId.eq(user_id))
            .filter(list_entry::Column::Kind.eq(kind))
            .filter(list_entry::Column::ListName.eq(list_name))
    }

    /// Get one page of a user's list, newest first.
    pub async fn find_list_page(
        &self,
        user_id: &str,
        kind: ListKind,
        list_name: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<list_entry::Model>> {
        Self::list_query(user_id, kind, list_name)
            .order_by_desc(list_entry::Column::CreatedAt)
            .order_by_desc(list_entry::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's list entries, orphans included.
    pub async fn count_list(
        &self,
        user_id: &str,
        kind: ListKind,
        list_name: &str,
    ) -> AppResult<u64> {
        Self::list_query(user_id, kind, list_name)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new list entry.
    ///
    /// A duplicate membership surfaces as [`AppError::Conflict`].
    pub async fn create(&self, model: list_entry::ActiveModel) -> AppResult<list_entry::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Change the list name of a custom entry.
    pub async fn rename(
        &self,
        entry: list_entry::Model,
        list_name: &str,
    ) -> AppResult<list_entry::Model> {
        let mut active = entry.into_active_model();
        active.list_name = Set(list_name.to_string());
        active.updated_at = Set(Some(Utc::now().into()));
        active.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Hard-delete an entry by ID.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<()> {
        ListEntry::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete the entry matching ID, owner and activity in one statement.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_owned_membership(
        &self,
        id: &str,
        user_id: &str,
        activity_id: &str,
    ) -> AppResult<bool> {
        let result = ListEntry::delete_many()
            .filter(list_entry::Column::Id.eq(id))
            .filter(list_entry::Column::UserId.eq(user_id))
            .filter(list_entry::Column::ActivityId.eq(activity_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_entry(
        id: &str,
        user_id: &str,
        kind: ListKind,
        list_name: &str,
        activity_id: Option<&str>,
    ) -> list_entry::Model {
        list_entry::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            kind,
            activity_id: activity_id.map(ToString::to_string),
            list_name: list_name.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_liked() {
        let entry = create_test_entry("e1", "alice", ListKind::Liked, "", Some("a1"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[entry.clone()]])
                .into_connection(),
        );

        let repo = ListEntryRepository::new(db);
        let result = repo.find_liked("alice", "a1").await.unwrap();

        let found = result.unwrap();
        assert_eq!(found.kind, ListKind::Liked);
        assert_eq!(found.activity_id.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_find_membership_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<list_entry::Model>::new()])
                .into_connection(),
        );

        let repo = ListEntryRepository::new(db);
        let result = repo
            .find_membership("alice", ListKind::Custom, "Weekend", Some("a1"))
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_count_list() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = ListEntryRepository::new(db);
        let result = repo
            .count_list("alice", ListKind::History, "")
            .await
            .unwrap();

        assert_eq!(result, 4);
    }

    #[tokio::test]
    async fn test_delete_owned_membership_no_match() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ListEntryRepository::new(db);
        let deleted = repo
            .delete_owned_membership("e1", "mallory", "a1")
            .await
            .unwrap();

        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_delete_owned_membership_match() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ListEntryRepository::new(db);
        let deleted = repo
            .delete_owned_membership("e1", "alice", "a1")
            .await
            .unwrap();

        assert!(deleted);
    }
}
