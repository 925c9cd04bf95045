pub mod base64_bytes;

/// Trims an email address and discards it if nothing is left.
pub fn normalize_email(email: Option<&str>) -> Option<String> {
    email.map(str::trim).filter(|e| !e.is_empty()).map(String::from)
}
