use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum customer name length in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum email length, per RFC 5321.
pub const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trimmed name if it is non-empty and within [`MAX_NAME_LEN`].
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    let len = name.chars().count();
    (len > 0 && len <= MAX_NAME_LEN).then(|| name.to_owned())
}

/// Trimmed, lowercased email if it looks like `local@domain.tld`.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return None;
    }
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    valid.then_some(email)
}
