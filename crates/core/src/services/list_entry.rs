//! List entry service.
//!
//! A user's lists (history, liked and named custom lists) share one table.
//! [`ListMembership`] is the validated shape of an entry; raw kind/activity/name
//! triples never travel past [`ListMembership::new`].

use std::collections::HashMap;

use crate::services::pagination::{Page, Pagination};
use chrono::{DateTime, FixedOffset, Utc};
use humap_common::{AppError, AppResult, IdGenerator};
use humap_db::{
    entities::list_entry::{self, ListKind},
    repositories::{ActivityRepository, ListEntryRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// Longest accepted custom list name.
pub const MAX_LIST_NAME_LEN: usize = 128;

/// Which list an entry belongs to, and what it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ListMembership {
    History {
        activity_id: String,
    },
    Liked {
        activity_id: String,
    },
    Custom {
        #[serde(rename = "customName")]
        name: String,
        /// `None` for a bare list created before any activity was added.
        activity_id: Option<String>,
    },
}

impl ListMembership {
    /// Validate raw input into a membership.
    ///
    /// History and liked entries need an activity. Custom entries need a
    /// non-blank name and may omit the activity.
    pub fn new(
        kind: ListKind,
        activity_id: Option<String>,
        custom_name: Option<String>,
    ) -> AppResult<Self> {
        let activity_id = activity_id.filter(|id| !id.trim().is_empty());

        match kind {
            ListKind::History | ListKind::Liked => {
                let activity_id = activity_id.ok_or_else(|| {
                    AppError::BadRequest("activity_id is required for this list".to_string())
                })?;
                Ok(if kind == ListKind::History {
                    Self::History { activity_id }
                } else {
                    Self::Liked { activity_id }
                })
            }
            ListKind::Custom => {
                let name = validate_list_name(custom_name.as_deref().unwrap_or_default())?;
                Ok(Self::Custom { name, activity_id })
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ListKind {
        match self {
            Self::History { .. } => ListKind::History,
            Self::Liked { .. } => ListKind::Liked,
            Self::Custom { .. } => ListKind::Custom,
        }
    }

    #[must_use]
    pub fn activity_id(&self) -> Option<&str> {
        match self {
            Self::History { activity_id } | Self::Liked { activity_id } => Some(activity_id),
            Self::Custom { activity_id, .. } => activity_id.as_deref(),
        }
    }

    /// Stored list name: the custom name, or empty for history and liked.
    #[must_use]
    pub fn list_name(&self) -> &str {
        match self {
            Self::Custom { name, .. } => name,
            Self::History { .. } | Self::Liked { .. } => "",
        }
    }
}

/// Trim and check a custom list name.
pub fn validate_list_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "customName is required for custom lists".to_string(),
        ));
    }
    if name.chars().count() > MAX_LIST_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "customName must be at most {MAX_LIST_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// A stored list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub membership: ListMembership,
    pub created_at: DateTime<FixedOffset>,
}

impl TryFrom<list_entry::Model> for ListEntry {
    type Error = AppError;

    fn try_from(model: list_entry::Model) -> Result<Self, Self::Error> {
        let custom_name = (model.kind == ListKind::Custom).then_some(model.list_name);
        let membership = ListMembership::new(model.kind, model.activity_id, custom_name)
            .map_err(|e| AppError::Internal(format!("Corrupt list entry {}: {e}", model.id)))?;

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            membership,
            created_at: model.created_at,
        })
    }
}

/// Result of a create-or-return-existing write.
#[derive(Debug, Clone)]
pub struct ListEntryWrite {
    pub entry: ListEntry,
    /// `false` when an identical entry already existed and was returned.
    pub created: bool,
}

/// The activity fields shown next to a list item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub id: String,
    pub title: String,
    pub location: String,
}

/// A list entry with its activity resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    #[serde(flatten)]
    pub entry: ListEntry,
    pub activity: ActivitySummary,
}

/// One page of a user's list.
///
/// `total` counts stored entries; `items` omits entries whose activity is
/// gone, so it can be shorter than `total` suggests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(flatten)]
    pub page: Page<ListItem>,
}

/// List entry service for business logic.
#[derive(Clone)]
pub struct ListEntryService {
    list_repo: ListEntryRepository,
    activity_repo: ActivityRepository,
    id_gen: IdGenerator,
}

impl ListEntryService {
    /// Create a new list entry service.
    #[must_use]
    pub const fn new(list_repo: ListEntryRepository, activity_repo: ActivityRepository) -> Self {
        Self {
            list_repo,
            activity_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an entry, or return the identical one that already exists.
    ///
    /// A bare custom list (no activity) is deduplicated on name alone: if the
    /// list already has any entry, that entry is returned.
    pub async fn create_entry(
        &self,
        user_id: &str,
        membership: ListMembership,
    ) -> AppResult<ListEntryWrite> {
        let existing = match &membership {
            ListMembership::Custom {
                name,
                activity_id: None,
            } => self.list_repo.find_any_in_custom_list(user_id, name).await?,
            _ => self.find_existing(user_id, &membership).await?,
        };

        if let Some(model) = existing {
            return Ok(ListEntryWrite {
                entry: model.try_into()?,
                created: false,
            });
        }

        let model = list_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            kind: Set(membership.kind()),
            activity_id: Set(membership.activity_id().map(ToString::to_string)),
            list_name: Set(membership.list_name().to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        match self.list_repo.create(model).await {
            Ok(created) => {
                tracing::debug!(
                    user_id,
                    entry_id = %created.id,
                    kind = ?created.kind,
                    "Created list entry"
                );
                Ok(ListEntryWrite {
                    entry: created.try_into()?,
                    created: true,
                })
            }
            // Lost a race against an identical insert: return the winner.
            Err(AppError::Conflict(detail)) => {
                let winner = self
                    .find_existing(user_id, &membership)
                    .await?
                    .ok_or(AppError::Conflict(detail))?;
                Ok(ListEntryWrite {
                    entry: winner.try_into()?,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Add an activity to the custom list that `list_id` belongs to.
    pub async fn attach_activity(
        &self,
        user_id: &str,
        list_id: &str,
        activity_id: &str,
    ) -> AppResult<ListEntryWrite> {
        let list = self.get_owned(user_id, list_id).await?;
        if list.kind != ListKind::Custom {
            return Err(AppError::BadRequest(
                "Only custom lists accept activities".to_string(),
            ));
        }

        if activity_id.trim().is_empty() {
            return Err(AppError::BadRequest("activity_id is required".to_string()));
        }

        let membership = ListMembership::new(
            ListKind::Custom,
            Some(activity_id.to_string()),
            Some(list.list_name),
        )?;
        self.create_entry(user_id, membership).await
    }

    /// Rename a custom list entry.
    ///
    /// Renaming onto a list that already holds the same activity is rejected
    /// rather than merging the two entries.
    pub async fn rename_custom_list(
        &self,
        user_id: &str,
        list_id: &str,
        new_name: &str,
    ) -> AppResult<ListEntry> {
        let list = self.get_owned(user_id, list_id).await?;
        if list.kind != ListKind::Custom {
            return Err(AppError::BadRequest(
                "Only custom lists can be renamed".to_string(),
            ));
        }

        let name = validate_list_name(new_name)?;
        match self.list_repo.rename(list, &name).await {
            Ok(renamed) => renamed.try_into(),
            Err(AppError::Conflict(_)) => Err(AppError::BadRequest(format!(
                "List {name} already contains this activity"
            ))),
            Err(e) => Err(e),
        }
    }

    /// Get one of the caller's entries.
    pub async fn get_entry(&self, user_id: &str, list_id: &str) -> AppResult<ListEntry> {
        self.get_owned(user_id, list_id).await?.try_into()
    }

    /// Get every entry the caller owns, newest first.
    pub async fn list_all(&self, user_id: &str) -> AppResult<Vec<ListEntry>> {
        self.list_repo
            .find_by_user(user_id)
            .await?
            .into_iter()
            .map(ListEntry::try_from)
            .collect()
    }

    /// Hard-delete one of the caller's entries.
    pub async fn delete_entry(&self, user_id: &str, list_id: &str) -> AppResult<()> {
        let list = self.get_owned(user_id, list_id).await?;
        self.list_repo.delete_by_id(&list.id).await?;
        tracing::debug!(user_id, entry_id = %list.id, "Deleted list entry");
        Ok(())
    }

    /// Remove an activity from a list.
    ///
    /// Matches on entry, activity and owner at once, so another user's list
    /// is indistinguishable from a missing one.
    pub async fn remove_activity(
        &self,
        user_id: &str,
        list_id: &str,
        activity_id: &str,
    ) -> AppResult<()> {
        if self
            .list_repo
            .delete_owned_membership(list_id, user_id, activity_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Activity {activity_id} in list {list_id}"
            )))
        }
    }

    /// Get one page of the caller's history, liked or named custom list.
    pub async fn query_list(
        &self,
        user_id: &str,
        kind: ListKind,
        custom_name: Option<&str>,
        pagination: Pagination,
    ) -> AppResult<ListPage> {
        let list_name = match kind {
            ListKind::Custom => Some(validate_list_name(custom_name.unwrap_or_default())?),
            ListKind::History | ListKind::Liked => None,
        };
        let name = list_name.as_deref().unwrap_or_default();

        let total = self.list_repo.count_list(user_id, kind, name).await?;
        let models = self
            .list_repo
            .find_list_page(user_id, kind, name, pagination.offset(), pagination.limit())
            .await?;

        let activity_ids: Vec<String> = models
            .iter()
            .filter_map(|m| m.activity_id.clone())
            .collect();
        let activities: HashMap<String, ActivitySummary> = self
            .activity_repo
            .find_by_ids(&activity_ids)
            .await?
            .into_iter()
            .map(|a| {
                (
                    a.id.clone(),
                    ActivitySummary {
                        id: a.id,
                        title: a.title,
                        location: a.location,
                    },
                )
            })
            .collect();

        let mut items = Vec::with_capacity(models.len());
        for model in models {
            let Some(activity) = model
                .activity_id
                .as_ref()
                .and_then(|id| activities.get(id))
                .cloned()
            else {
                continue;
            };
            items.push(ListItem {
                entry: model.try_into()?,
                activity,
            });
        }

        Ok(ListPage {
            list_name,
            page: Page::new(pagination, total, items),
        })
    }

    async fn find_existing(
        &self,
        user_id: &str,
        membership: &ListMembership,
    ) -> AppResult<Option<list_entry::Model>> {
        self.list_repo
            .find_membership(
                user_id,
                membership.kind(),
                membership.list_name(),
                membership.activity_id(),
            )
            .await
    }

    async fn get_owned(&self, user_id: &str, list_id: &str) -> AppResult<list_entry::Model> {
        let entry = self
            .list_repo
            .find_by_id(list_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("List: {list_id}")))?;

        if entry.user_id != user_id {
            return Err(AppError::access_denied());
        }
        Ok(entry)
    }
}
