use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User, UserChanges, DEFAULT_PROFILE_PICTURE},
};

/// Process-local user store used when no database is configured.
///
/// The uniqueness scan and the write happen under the same write lock.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// First unique column of `candidate` already held by another record.
fn conflicting_field(users: &HashMap<Uuid, User>, candidate: &User) -> Option<&'static str> {
    users
        .values()
        .filter(|u| u.id != candidate.id)
        .find_map(|u| {
            if u.username == candidate.username {
                Some("username")
            } else if u.email == candidate.email {
                Some("email")
            } else if u.mobile.is_some() && u.mobile == candidate.mobile {
                Some("mobile")
            } else {
                None
            }
        })
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let now = OffsetDateTime::now_utc();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            mobile: user.mobile,
            is_admin: user.is_admin,
            profile_picture: user
                .profile_picture
                .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
            created_at: now,
            updated_at: now,
        };

        let mut users = self.users.write().await;
        if let Some(field) = conflicting_field(&users, &record) {
            return Err(StoreError::Duplicate { field });
        }
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let mut updated = users.get(&id).cloned().ok_or(StoreError::NotFound)?;

        if let Some(v) = changes.username {
            updated.username = v;
        }
        if let Some(v) = changes.first_name {
            updated.first_name = v;
        }
        if let Some(v) = changes.last_name {
            updated.last_name = v;
        }
        if let Some(v) = changes.email {
            updated.email = v;
        }
        if let Some(v) = changes.mobile {
            updated.mobile = Some(v);
        }
        if let Some(v) = changes.password_hash {
            updated.password_hash = v;
        }
        if let Some(v) = changes.profile_picture {
            updated.profile_picture = v;
        }
        updated.updated_at = OffsetDateTime::now_utc();

        if let Some(field) = conflicting_field(&users, &updated) {
            return Err(StoreError::Duplicate { field });
        }
        users.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn new_user(username: &str, email: &str, mobile: Option<&str>) -> NewUser {
        NewUser {
            username: username.into(),
            first_name: "Dilshan".into(),
            last_name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            mobile: mobile.map(Into::into),
            profile_picture: None,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_defaults() {
        let store = MemoryUserStore::new();
        let user = store
            .create(new_user("dilu1234", "dilu@example.com", Some("0711234567")))
            .await
            .unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.profile_picture, DEFAULT_PROFILE_PICTURE);
        assert_eq!(user.created_at, user.updated_at);

        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "dilu@example.com");
        let by_email = store.find_by_email("dilu@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn duplicates_are_rejected_per_field() {
        let store = MemoryUserStore::new();
        store
            .create(new_user("dilu1234", "dilu@example.com", Some("0711234567")))
            .await
            .unwrap();

        let err = store
            .create(new_user("dilu1234", "other@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "username" }));

        let err = store
            .create(new_user("someone1", "dilu@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email" }));

        let err = store
            .create(new_user("someone1", "other@example.com", Some("0711234567")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "mobile" }));
    }

    #[tokio::test]
    async fn missing_mobiles_do_not_collide() {
        let store = MemoryUserStore::new();
        store.create(new_user("first123", "a@example.com", None)).await.unwrap();
        store.create(new_user("second12", "b@example.com", None)).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_creates_have_one_winner() {
        let store = Arc::new(MemoryUserStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(new_user("racer123", &format!("r{i}@example.com"), None))
                    .await
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn update_applies_changes_and_checks_uniqueness() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("alice123", "a@example.com", None)).await.unwrap();
        store.create(new_user("bobby123", "b@example.com", None)).await.unwrap();

        let updated = store
            .update(
                a.id,
                UserChanges {
                    first_name: Some("Alice".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Alice");
        assert_eq!(updated.username, "alice123");

        let err = store
            .update(
                a.id,
                UserChanges {
                    email: Some("b@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email" }));

        // unchanged after the failed write
        let current = store.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(current.email, "a@example.com");
    }

    #[tokio::test]
    async fn update_and_delete_unknown_ids() {
        let store = MemoryUserStore::new();
        let err = store
            .update(Uuid::new_v4(), UserChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert!(matches!(
            store.delete(Uuid::new_v4()).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = MemoryUserStore::new();
        let u = store.create(new_user("deleteme", "d@example.com", None)).await.unwrap();
        store.delete(u.id).await.unwrap();
        assert!(store.find_by_id(u.id).await.unwrap().is_none());
    }
}
