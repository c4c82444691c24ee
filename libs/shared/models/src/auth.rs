use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the caller's identity. Authentication happens upstream; this layer only
/// trusts the identifier it is handed.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The identity a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: Uuid,
}

impl ActingUser {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}
