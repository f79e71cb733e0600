use sqlx::FromRow;
use time::PrimitiveDateTime;

/// User record as stored in the `users` table.
///
/// Not `Serialize`; responses go through `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,        // Argon2 PHC string
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
}

/// Fields supplied by the caller when inserting a user.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub bio: &'a str,
}
