//! User domain entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered account as stored in the user collection.
///
/// Element names follow the stored documents: PascalCase, with the id kept in
/// `_id` as a hyphenated UUID string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    /// Assigned by the store on creation
    pub customer_number: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<i16>,
    pub city: Option<String>,
    /// Login lookup key (not unique)
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
    /// Hashed credential at rest; plaintext only on the way into `create`
    pub password: Option<String>,
}

impl User {
    /// Generate a fresh user id.
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}
