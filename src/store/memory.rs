use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AccountStore, ItemKind, ItemSnapshot, NewUser, ProfileUpdate, SaveOutcome, SavedItem,
    SessionRecord, User,
};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    sessions: HashMap<Uuid, SessionRecord>,
    items: Vec<SavedItem>, // insertion order
}

/// Process-local store. Each call holds the lock for its whole mutation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a user and their saved items but leaves sessions behind, which
    /// models an account vanishing underneath a live session.
    pub async fn purge_user(&self, id: Uuid) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.remove(&id) else {
            return false;
        };
        inner.emails.remove(&user.email);
        inner.items.retain(|i| i.user_id != id);
        true
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.lock().await;
        if inner.emails.contains_key(&new.email) {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            phone: String::new(),
            country: String::new(),
            date_of_birth: String::new(),
            current_education: String::new(),
            target_degree: String::new(),
            target_countries: Vec::new(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        inner.emails.insert(user.email.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()> {
        if let Some(user) = self.inner.lock().await.users.get_mut(&id) {
            user.last_login_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        update.apply_to(user);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<SessionRecord> {
        let mut inner = self.inner.lock().await;
        anyhow::ensure!(
            inner.users.contains_key(&user_id),
            "session for unknown user {user_id}"
        );
        let session = SessionRecord {
            id: Uuid::new_v4(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
            expires_at,
        };
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> anyhow::Result<Option<SessionRecord>> {
        Ok(self.inner.lock().await.sessions.get(&id).cloned())
    }

    async fn extend_session(&self, id: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<bool> {
        match self.inner.lock().await.sessions.get_mut(&id) {
            Some(session) => {
                session.expires_at = expires_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_session(&self, id: Uuid) -> anyhow::Result<()> {
        self.inner.lock().await.sessions.remove(&id);
        Ok(())
    }

    async fn delete_expired_sessions(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|_, s| !(s.user_id == user_id && s.is_expired(now)));
        Ok((before - inner.sessions.len()) as u64)
    }

    async fn save_item(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        snapshot: &ItemSnapshot,
    ) -> anyhow::Result<SaveOutcome> {
        let mut inner = self.inner.lock().await;
        anyhow::ensure!(
            inner.users.contains_key(&user_id),
            "saved item for unknown user {user_id}"
        );
        if let Some(existing) = inner
            .items
            .iter()
            .find(|i| i.user_id == user_id && i.kind == kind && i.name == snapshot.name)
        {
            return Ok(SaveOutcome {
                item: existing.clone(),
                created: false,
            });
        }
        let item = SavedItem {
            id: Uuid::new_v4(),
            user_id,
            kind,
            name: snapshot.name.clone(),
            country: snapshot.country.clone(),
            ranking: snapshot.ranking,
            tuition: snapshot.tuition.clone(),
            program: snapshot.program.clone(),
            amount: snapshot.amount.clone(),
            deadline: snapshot.deadline.clone(),
            notes: snapshot.notes.clone(),
            saved_at: OffsetDateTime::now_utc(),
        };
        inner.items.push(item.clone());
        Ok(SaveOutcome {
            item,
            created: true,
        })
    }

    async fn remove_item(&self, user_id: Uuid, kind: ItemKind, name: &str) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.items.len();
        inner
            .items
            .retain(|i| !(i.user_id == user_id && i.kind == kind && i.name == name));
        Ok(inner.items.len() != before)
    }

    async fn remove_item_by_id(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        item_id: Uuid,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().await;
        let before = inner.items.len();
        inner
            .items
            .retain(|i| !(i.id == item_id && i.user_id == user_id && i.kind == kind));
        Ok(inner.items.len() != before)
    }

    async fn find_item(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        name: &str,
    ) -> anyhow::Result<Option<SavedItem>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .items
            .iter()
            .find(|i| i.user_id == user_id && i.kind == kind && i.name == name)
            .cloned())
    }

    async fn list_items(&self, user_id: Uuid, kind: ItemKind) -> anyhow::Result<Vec<SavedItem>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .items
            .iter()
            .filter(|i| i.user_id == user_id && i.kind == kind)
            .cloned()
            .collect())
    }
}
