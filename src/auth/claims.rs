use serde::{Deserialize, Serialize};

/// JWT payload issued on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub iat: i64,       // issued at (unix timestamp)
    pub exp: i64,       // expires at (unix timestamp)
}
