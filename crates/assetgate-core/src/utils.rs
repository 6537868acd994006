//! Shared helpers: identifiers, nonces, filenames and storage paths.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use assetgate_model::types::{AssetId, UserId};

/// Name used when sanitizing leaves nothing behind.
pub const FALLBACK_FILENAME: &str = "file";

/// Longest filename kept after sanitizing, in characters.
pub const MAX_FILENAME_LEN: usize = 255;

/// Generate a fresh asset id.
#[must_use]
pub fn generate_asset_id() -> AssetId {
    AssetId::new(Uuid::new_v4().to_string())
}

/// Generate a random ticket nonce: 12 random bytes, hex encoded.
///
/// # Examples
///
/// ```
/// use assetgate_core::utils::generate_nonce;
///
/// let nonce = generate_nonce();
/// assert_eq!(nonce.len(), 24);
/// assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn generate_nonce() -> String {
    hex::encode(rand::random::<[u8; 12]>())
}

/// Make a client-supplied filename safe to embed in a storage path.
///
/// Runs of two or more dots are removed, every character other than
/// ASCII letters, digits, `_`, `.`, space and `-` becomes `_`, and
/// surrounding whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use assetgate_core::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd"), "__etc_passwd");
/// assert_eq!(sanitize_filename("  my report (v2).pdf "), "my report _v2_.pdf");
/// ```
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let mut without_dot_runs = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '.' && chars.peek() == Some(&'.') {
            while chars.peek() == Some(&'.') {
                chars.next();
            }
            continue;
        }
        without_dot_runs.push(c);
    }

    let replaced: String = without_dot_runs
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ' ' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect();

    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Build the storage path `private/<owner>/<YYYY>/<MM>/<id>-<filename>`.
///
/// `filename` must already be sanitized. The owner id is reduced to a single
/// path segment, see [`owner_segment`].
#[must_use]
pub fn build_storage_path(
    owner: &UserId,
    id: &AssetId,
    filename: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        "private/{}/{:04}/{:02}/{id}-{filename}",
        owner_segment(owner.as_str()),
        now.year(),
        now.month()
    )
}

/// Turn a user id into exactly one storage path segment.
///
/// Characters other than ASCII letters, digits, `-`, `_` and `.` become `_`.
/// A segment made only of dots (or nothing) is replaced by underscores.
///
/// # Examples
///
/// ```
/// use assetgate_core::utils::owner_segment;
///
/// assert_eq!(owner_segment("3f2a-b1"), "3f2a-b1");
/// assert_eq!(owner_segment("../admin"), ".._admin");
/// assert_eq!(owner_segment(".."), "__");
/// ```
#[must_use]
pub fn owner_segment(owner: &str) -> String {
    let segment: String = owner
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if segment.chars().all(|c| c == '.') {
        "_".repeat(segment.len().max(1))
    } else {
        segment
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_should_strip_traversal_sequences() {
        assert_eq!(sanitize_filename("a..b"), "ab");
        assert_eq!(sanitize_filename("...hidden"), "hidden");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_should_keep_single_dots_and_replace_non_ascii_letters() {
        assert_eq!(sanitize_filename("résumé.final.pdf"), "r_sum_.final.pdf");
    }

    #[test]
    fn test_should_fall_back_when_nothing_survives() {
        assert_eq!(sanitize_filename("  ..  "), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(""), FALLBACK_FILENAME);
    }

    #[test]
    fn test_should_cap_filename_length() {
        let long = "a".repeat(1000);
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_should_build_dated_storage_path() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let path = build_storage_path(&UserId::new("u1"), &AssetId::new("id1"), "test.txt", now);
        assert_eq!(path, "private/u1/2026/03/id1-test.txt");
    }

    #[test]
    fn test_should_keep_hostile_owner_ids_in_one_segment() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let id = AssetId::new("id1");
        for owner in ["../../etc", "a/b", "..", "", "x\\y"] {
            let path = build_storage_path(&UserId::new(owner), &id, "f.txt", now);
            let segments: Vec<&str> = path.split('/').collect();
            assert_eq!(segments.len(), 5, "{path}");
            assert_eq!(segments[0], "private");
            assert!(!matches!(segments[1], "" | "." | ".."), "{path}");
            assert_eq!(segments[2..], ["2026", "03", "id1-f.txt"]);
        }
    }

    #[test]
    fn test_should_generate_distinct_ids_and_nonces() {
        assert_ne!(generate_asset_id(), generate_asset_id());
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
