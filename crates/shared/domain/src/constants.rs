//! Domain-level constants.
//!
//! These constants define business rules and the persisted document shape.

// =============================================================================
// Password hashing
// =============================================================================

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derived key length in bytes (256 bits)
pub const PASSWORD_HASH_LENGTH: usize = 32;

/// Salt length in bytes
pub const PASSWORD_SALT_LENGTH: usize = 16;

/// Salt shared by every stored credential.
///
/// Changing this value invalidates all existing hashes.
pub const DEFAULT_PASSWORD_SALT: [u8; PASSWORD_SALT_LENGTH] = [
    0x5c, 0x1e, 0x8a, 0x93, 0xf4, 0xb0, 0x2d, 0x7e, 0x61, 0xa9, 0xc3, 0xf0, 0x8b, 0x4d, 0x27, 0xe5,
];

// =============================================================================
// Customer numbers
// =============================================================================

/// Customer number given to the first user of an empty collection
pub const FIRST_CUSTOMER_NUMBER: i32 = 1;

/// Attempts made to insert a user before giving up on customer number conflicts
pub const MAX_CUSTOMER_NUMBER_ATTEMPTS: u32 = 5;

// =============================================================================
// Document fields
// =============================================================================

/// Primary key field
pub const FIELD_ID: &str = "_id";

/// Sequential customer number field
pub const FIELD_CUSTOMER_NUMBER: &str = "CustomerNumber";

/// Login lookup field
pub const FIELD_EMAIL_ADDRESS: &str = "EmailAddress";
