//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mitienda_core::{Email, UserId};

/// A store customer or staff member (domain type).
///
/// The password hash never leaves the repository layer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Optional display name.
    pub full_name: Option<String>,
    /// Inactive users cannot authenticate.
    pub is_active: bool,
    /// Staff users can reach the admin surface.
    pub is_staff: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
