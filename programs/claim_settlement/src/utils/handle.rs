/// Canonical form of a social-media handle: one leading `@` stripped, lower-cased
pub fn normalize_handle(handle: &str) -> String {
    let trimmed = handle.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).to_lowercase()
}

/// Case-insensitive handle comparison, ignoring a leading `@` on either side
pub fn handles_match(expected: &str, actual: &str) -> bool {
    normalize_handle(expected) == normalize_handle(actual)
}
