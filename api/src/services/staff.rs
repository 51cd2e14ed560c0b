//! Staff accounts. Passwords are kept as Argon2 hashes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};
use crate::models::normalize_string;
use crate::models::user::{SignupRequest, User};
use crate::repository::RepoError;
use crate::state::AppState;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(user: &User, candidate: &str) -> bool {
    PasswordHash::new(&user.password)
        .map(|hash| {
            Argon2::default()
                .verify_password(candidate.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}

pub async fn list_users(state: &AppState) -> AppResult<Vec<User>> {
    Ok(state.users.find_all().await?)
}

pub async fn get_user(state: &AppState, username: &str) -> AppResult<User> {
    let username = normalize_string(username);
    state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
}

pub async fn signup(state: &AppState, request: SignupRequest) -> AppResult<User> {
    let username = normalize_string(request.username.as_deref().unwrap_or_default());
    if username.is_empty() {
        return Err(AppError::Validation("Missing username".into()));
    }
    let password = request.password.unwrap_or_default();
    if password.is_empty() {
        return Err(AppError::Validation("Missing password".into()));
    }
    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(format!("User {} already exists", username)));
    }

    let user = User {
        id: ObjectId::new(),
        username,
        password: hash_password(&password)?,
        first_name: request.first_name.unwrap_or_default(),
        last_name: request.last_name.unwrap_or_default(),
        sex: request.sex.unwrap_or_default(),
        birthday: request.birthday.unwrap_or_default(),
        img_url: request.img_url.unwrap_or_default(),
        role: request.role.unwrap_or_default(),
        email: request.email.unwrap_or_default(),
        sdt: request.sdt.unwrap_or_default(),
        status: 1,
    };

    match state.users.insert(&user).await {
        Ok(()) => {
            tracing::info!(user = %user.id, username = %user.username, "user signed up");
            Ok(user)
        }
        Err(RepoError::Duplicate(_)) => Err(AppError::Conflict(format!(
            "User {} already exists",
            user.username
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_user(state: &AppState, id: ObjectId) -> AppResult<User> {
    state
        .users
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}
