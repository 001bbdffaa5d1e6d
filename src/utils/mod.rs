pub mod email_cache;
pub mod email_filter;

/// Emails compare case-insensitively and ignore surrounding spaces.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
