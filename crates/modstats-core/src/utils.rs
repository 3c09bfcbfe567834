//! Utility functions for the moderator dashboard

/// Longest accepted action-type identifier
pub const MAX_ACTION_KEY_LEN: usize = 64;

/// Validate an action-type identifier (`[a-z0-9_]{1,64}`)
#[must_use]
pub fn is_valid_action_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_ACTION_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Normalize free-form input such as `"Warnings Issued"` into an action key
///
/// Returns `None` when nothing usable remains.
#[must_use]
pub fn normalize_action_key(raw: &str) -> Option<String> {
    let key = raw
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string();

    is_valid_action_key(&key).then_some(key)
}

/// Parse a `type=count` pair, as given on the admin command line
///
/// # Errors
///
/// Returns [`crate::Error::MalformedInput`] if the pair has no `=`, the key
/// cannot be normalized, or the count is not a non-negative integer.
pub fn parse_action_pair(pair: &str) -> crate::Result<(String, u64)> {
    let (raw_key, raw_count) = pair
        .split_once('=')
        .ok_or_else(|| crate::Error::malformed("action", format!("'{pair}' is not type=count")))?;

    let key = normalize_action_key(raw_key).ok_or_else(|| {
        crate::Error::malformed("action", format!("'{raw_key}' is not a usable action type"))
    })?;
    let count = raw_count.trim().parse::<u64>().map_err(|_| {
        crate::Error::malformed("action", format!("'{raw_count}' is not a non-negative count"))
    })?;

    Ok((key, count))
}

/// Turn an action key into a column heading, `warnings_issued` -> `Warnings Issued`
#[must_use]
pub fn humanize_action_key(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
