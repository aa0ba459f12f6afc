//! Shared fixture for service tests: every service wired to one in-memory
//! database and a recording publisher.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use crate::services::{
    ActivityService, LikeService, ListEntryService, ReviewService, UserService,
    event_publisher::{EventPublisherService, testing::RecordingPublisher},
};
use chrono::Utc;
use humap_db::{
    entities::{
        activity,
        user::{self, Role},
    },
    repositories::{ActivityRepository, ListEntryRepository, ReviewRepository, UserRepository},
    test_utils::TestDatabase,
};
use sea_orm::Set;

pub struct Fixture {
    _db: TestDatabase,
    pub user_repo: UserRepository,
    pub activity_repo: ActivityRepository,
    pub recorder: Arc<RecordingPublisher>,
    pub users: UserService,
    pub activities: ActivityService,
    pub reviews: ReviewService,
    pub lists: ListEntryService,
    pub likes: LikeService,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = TestDatabase::in_memory().await.unwrap();
        let user_repo = UserRepository::new(db.connection());
        let activity_repo = ActivityRepository::new(db.connection());
        let review_repo = ReviewRepository::new(db.connection());
        let list_repo = ListEntryRepository::new(db.connection());

        let recorder = Arc::new(RecordingPublisher::default());
        let publisher: EventPublisherService = recorder.clone();

        let mut activities = ActivityService::new(activity_repo.clone());
        activities.set_event_publisher(publisher.clone());
        let mut reviews =
            ReviewService::new(review_repo, activity_repo.clone(), user_repo.clone());
        reviews.set_event_publisher(publisher.clone());
        let mut likes =
            LikeService::new(list_repo.clone(), activity_repo.clone(), user_repo.clone());
        likes.set_event_publisher(publisher);

        Self {
            _db: db,
            users: UserService::new(user_repo.clone()),
            lists: ListEntryService::new(list_repo, activity_repo.clone()),
            user_repo,
            activity_repo,
            recorder,
            activities,
            reviews,
            likes,
        }
    }
}

async fn insert_user(f: &Fixture, id: &str, role: Role) -> user::Model {
    f.user_repo
        .create(user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(id.to_string()),
            email: Set(format!("{id}@example.com")),
            password_hash: Set("unused".to_string()),
            token: Set(format!("token-{id}")),
            avatar: Set(None),
            gender: Set(None),
            role: Set(role),
            nb_reviews: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap()
}

/// Insert a regular user whose username equals `id`, or return the existing one.
pub async fn seed_user(f: &Fixture, id: &str) -> user::Model {
    match f.user_repo.find_by_id(id).await.unwrap() {
        Some(user) => user,
        None => insert_user(f, id, Role::User).await,
    }
}

pub async fn seed_admin(f: &Fixture, id: &str) -> user::Model {
    insert_user(f, id, Role::Admin).await
}

/// Insert an activity titled `"Activity {id}"`, creating its owner if needed.
pub async fn seed_activity(f: &Fixture, id: &str, owner: Option<&str>) -> activity::Model {
    if let Some(owner) = owner {
        seed_user(f, owner).await;
    }

    f.activity_repo
        .create(activity::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(owner.map(ToString::to_string)),
            title: Set(format!("Activity {id}")),
            description: Set(None),
            location: Set("Nantes".to_string()),
            longitude: Set(None),
            latitude: Set(None),
            mood: Set(None),
            nb_people: Set(None),
            price_range: Set(None),
            age_range: Set(None),
            day: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap()
}
