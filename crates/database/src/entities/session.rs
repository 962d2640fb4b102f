//! Session entity definitions

use serde::{Deserialize, Serialize};

/// An issued bearer session. Issuance itself belongs to the auth
/// collaborator; this layer only validates tokens against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub expires_at: String,
    pub created_at: String,
}
