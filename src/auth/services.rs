use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::password;
use crate::error::AccountError;
use crate::store::{AccountStore, NewUser, User};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails compare case-insensitively; storage only ever sees this form.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_name(name: &str) -> Result<(), AccountError> {
    if name.trim().chars().count() < MIN_NAME_LEN {
        return Err(AccountError::Validation(
            "Please enter your full name".into(),
        ));
    }
    Ok(())
}

pub async fn register(
    store: &dyn AccountStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AccountError> {
    let email = normalize_email(email);
    let name = name.trim();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AccountError::Validation("Please fill in all fields".into()));
    }
    validate_name(name)?;
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AccountError::Validation(
            "Please enter a valid email address".into(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AccountError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    // Skips the hash for the common case; the insert below is what enforces uniqueness.
    if store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AccountError::DuplicateEmail);
    }

    let password_hash = password::hash_in_background(password.to_owned()).await?;
    let created = store
        .create_user(NewUser {
            email: email.clone(),
            password_hash,
            name: name.to_owned(),
        })
        .await?;

    match created {
        Some(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        None => {
            warn!(email = %email, "email registered concurrently");
            Err(AccountError::DuplicateEmail)
        }
    }
}

/// Unknown email and wrong password fail identically.
pub async fn authenticate(
    store: &dyn AccountStore,
    email: &str,
    password: &str,
) -> Result<User, AccountError> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AccountError::Validation("Please fill in all fields".into()));
    }

    let Some(user) = store.find_user_by_email(&email).await? else {
        password::verify_decoy(password.to_owned()).await;
        warn!(email = %email, "login unknown email");
        return Err(AccountError::InvalidCredentials);
    };

    let ok = password::verify_in_background(password.to_owned(), user.password_hash.clone()).await?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AccountError::InvalidCredentials);
    }

    store.touch_last_login(user.id).await?;
    let user = store.find_user_by_id(user.id).await?.unwrap_or(user);
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(user)
}
