//! Handle derivation.
//!
//! A handle is the stable slug that identifies a local source. When a source
//! does not declare one it is derived from the human title.

/// Convert a human title into a handle.
///
/// Lowercases, drops everything except ASCII alphanumerics, `_`, `-` and
/// whitespace, then collapses runs of whitespace, `_` and `-` into a single
/// `-` and trims dashes from both ends.
///
/// ```
/// use extsync_core::slugify;
///
/// assert_eq!(slugify("EXTENSION A 2"), "extension-a-2");
/// assert_eq!(slugify("Payments Extension!"), "payments-extension");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_dash = true;
        }
    }

    slug
}

/// Returns true when `handle` is already in slug form.
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty() && slugify(handle) == handle
}
