use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::{IssuedToken, TokenIssuer},
        password::{hash_password, verify_dummy, verify_password, PasswordError},
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User},
    },
    error::AppError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 is CPU-bound; run it on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(AppError::internal)
}

/// Hash the password and insert the user. Returns the stored row.
pub async fn register_user(users: &dyn UserStore, req: RegisterRequest) -> Result<User, AppError> {
    let RegisterRequest {
        email,
        password,
        first_name,
        last_name,
        bio,
    } = req;

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email"));
    }
    if password.is_empty() {
        warn!(email = %email, "empty password");
        return Err(AppError::BadRequest("Password is required"));
    }

    let hash = run_blocking(move || hash_password(&password))
        .await?
        .map_err(AppError::internal)?;

    let new_user = NewUser {
        email: &email,
        password_hash: &hash,
        first_name: first_name.as_deref().unwrap_or_default(),
        last_name: last_name.as_deref().unwrap_or_default(),
        bio: bio.as_deref().unwrap_or_default(),
    };
    let user = match users.create_user(new_user).await {
        Ok(u) => u,
        Err(StoreError::ConstraintViolation) => {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict);
        }
        Err(e) => return Err(AppError::internal(e)),
    };

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Check credentials and mint a session token.
///
/// Unknown email and wrong password both yield `Unauthorized` after the same
/// amount of hashing work, so callers cannot tell which accounts exist.
pub async fn login_user(
    users: &dyn UserStore,
    tokens: &TokenIssuer,
    req: LoginRequest,
) -> Result<(User, IssuedToken), AppError> {
    let LoginRequest { email, password } = req;
    let email = normalize_email(&email);

    let user = match users.find_by_email(&email).await {
        Ok(u) => u,
        Err(StoreError::NotFound) => {
            let _ = run_blocking(move || verify_dummy(&password)).await?;
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(AppError::internal(e)),
    };

    let stored = user.password_hash.clone();
    match run_blocking(move || verify_password(&password, &stored)).await? {
        Ok(()) => {}
        Err(PasswordError::Mismatch) => {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(AppError::internal(e)),
    }

    let issued = tokens.issue(user.id).map_err(AppError::internal)?;

    info!(user_id = user.id, "user logged in");
    Ok((user, issued))
}
