use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record. The hash stays server-side.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String, // lower-cased, unique
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub name: String,
    pub phone: String,
    pub country: String,
    pub date_of_birth: String,
    pub current_education: String,
    pub target_degree: String,
    pub target_countries: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
}

/// Insert payload for a fresh account; every profile field starts empty.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Partial profile update. `None` keeps the stored value, `Some("")` clears it.
///
/// Unknown keys in the JSON body (`email`, `id`, ...) are dropped by serde,
/// so identity fields can't be reached through this type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub date_of_birth: Option<String>,
    pub current_education: Option<String>,
    pub target_degree: Option<String>,
    pub target_countries: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.country.is_none()
            && self.date_of_birth.is_none()
            && self.current_education.is_none()
            && self.target_degree.is_none()
            && self.target_countries.is_none()
    }

    /// Merge the present keys into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.name {
            user.name = v.clone();
        }
        if let Some(v) = &self.phone {
            user.phone = v.clone();
        }
        if let Some(v) = &self.country {
            user.country = v.clone();
        }
        if let Some(v) = &self.date_of_birth {
            user.date_of_birth = v.clone();
        }
        if let Some(v) = &self.current_education {
            user.current_education = v.clone();
        }
        if let Some(v) = &self.target_degree {
            user.target_degree = v.clone();
        }
        if let Some(v) = &self.target_countries {
            user.target_countries = v.clone();
        }
    }
}

/// Server-side session row; tokens carry its id as `sid`.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime, // pushed forward on every refresh
}

impl SessionRecord {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Which catalog a saved item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "saved_item_kind", rename_all = "lowercase")]
pub enum ItemKind {
    University,
    Scholarship,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::University => "university",
            ItemKind::Scholarship => "scholarship",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog data copied at save time. Universities use ranking/tuition/program,
/// scholarships use amount/deadline; nothing here links back to a catalog row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub ranking: Option<i32>,
    pub tuition: Option<String>,
    pub program: Option<String>,
    pub amount: Option<String>, // free text, e.g. "€850 - €1,200/month"
    pub deadline: Option<String>,
    pub notes: Option<String>,
}

impl ItemSnapshot {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ItemKind,
    pub name: String,
    pub country: String,
    pub ranking: Option<i32>,
    pub tuition: Option<String>,
    pub program: Option<String>,
    pub amount: Option<String>,
    pub deadline: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

/// Result of an idempotent save: `created` is false when the item was already there.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub item: SavedItem,
    pub created: bool,
}
