//! Flat-file credential store
//!
//! Persists key/value pairs in a dotenv-style file (`KEY="value"`, one per
//! line). This is where the login flow parks the bearer token and the
//! registered client id so later runs can pick them up without repeating
//! the browser flow.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Key under which the bearer token is stored.
pub const ACCESS_TOKEN_KEY: &str = "ACCESS_TOKEN";
/// Key under which a dynamically registered client id is stored.
pub const CLIENT_ID_KEY: &str = "CLIENT_ID";

/// Writes or replaces one key in the store file, creating it if needed.
///
/// Existing entries for other keys, comments, and blank lines are kept
/// as-is; only the matching line is rewritten.
///
/// # Errors
///
/// Returns an error when the file cannot be read or written.
pub fn set_key(path: &Path, key: &str, value: &str) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let rendered = format!("{}=\"{}\"", key, value);
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;
    for line in existing.lines() {
        if parse_line(line).is_some_and(|(k, _)| k == key) {
            if !replaced {
                lines.push(rendered.clone());
                replaced = true;
            }
            // duplicate entries for the key collapse into one
        } else {
            lines.push(line.to_string());
        }
    }
    if !replaced {
        lines.push(rendered);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    fs::write(path, out)?;
    tracing::debug!(key, path = %path.display(), "stored credential");
    Ok(())
}

/// Loads every key/value pair from the store file.
///
/// Comments and blank lines are skipped; surrounding single or double
/// quotes on values are stripped; the last occurrence of a repeated key
/// wins. A missing file yields an empty map.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read.
pub fn load_keys(path: &Path) -> Result<HashMap<String, String>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };

    let mut map = HashMap::new();
    for line in text.lines() {
        if let Some((key, value)) = parse_line(line) {
            map.insert(key.to_string(), value.to_string());
        }
    }
    Ok(map)
}

/// Convenience lookup of a single key.
pub fn get_key(path: &Path, key: &str) -> Result<Option<String>> {
    Ok(load_keys(path)?.remove(key))
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, strip_quotes(value.trim())))
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\''))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_key_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");

        set_key(&path, "ACCESS_TOKEN", "abc123").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "ACCESS_TOKEN=\"abc123\"\n");
    }

    #[test]
    fn test_set_key_replaces_existing_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "# credentials\nACCESS_TOKEN=\"old\"\nCLIENT_ID=\"c1\"\n").unwrap();

        set_key(&path, "ACCESS_TOKEN", "new").unwrap();

        let map = load_keys(&path).unwrap();
        assert_eq!(map.get("ACCESS_TOKEN").map(String::as_str), Some("new"));
        assert_eq!(map.get("CLIENT_ID").map(String::as_str), Some("c1"));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# credentials\n"));
    }

    #[test]
    fn test_load_keys_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let map = load_keys(&dir.path().join("nope.env")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_load_keys_skips_comments_and_strips_quotes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# header\n\nA=\"quoted\"\nB='single'\nC=bare\nnot a pair\n",
        )
        .unwrap();

        let map = load_keys(&path).unwrap();
        assert_eq!(map.get("A").map(String::as_str), Some("quoted"));
        assert_eq!(map.get("B").map(String::as_str), Some("single"));
        assert_eq!(map.get("C").map(String::as_str), Some("bare"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_load_keys_last_occurrence_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "A=\"first\"\nA=\"second\"\n").unwrap();

        let map = load_keys(&path).unwrap();
        assert_eq!(map.get("A").map(String::as_str), Some("second"));
    }

    #[test]
    fn test_get_key_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        set_key(&path, CLIENT_ID_KEY, "client-42").unwrap();

        assert_eq!(
            get_key(&path, CLIENT_ID_KEY).unwrap().as_deref(),
            Some("client-42")
        );
        assert_eq!(get_key(&path, "MISSING").unwrap(), None);
    }
}
