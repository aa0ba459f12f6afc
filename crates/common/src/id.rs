//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities and access tokens.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs sort by creation time, which keeps `ORDER BY id` consistent with
    /// `ORDER BY created_at` as a tie-breaker.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque bearer token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component in tokens
        Uuid::new_v4().simple().to_string()
    }
}
