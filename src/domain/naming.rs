// file naming rules shared by the local and remote stores

const BACKUP_MARKER: &str = ".bak.";
const DEFAULT_UPLOAD_STEM: &str = "upload";

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Replaces every character outside `[A-Za-z0-9_-]` with an underscore.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect()
}

/// Builds a collision-avoiding name for an uploaded asset.
///
/// `my photo!.PNG` with token `1700000000000` becomes
/// `my_photo_-1700000000000.PNG`.
pub fn upload_file_name(original: &str, token: i64) -> String {
    // only the final component of whatever path the client sent
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, extension) = split_extension(base);

    let stem = if stem.is_empty() {
        DEFAULT_UPLOAD_STEM.to_string()
    } else {
        sanitize_component(stem)
    };

    match extension {
        Some(ext) => format!("{}-{}.{}", stem, token, sanitize_component(ext)),
        None => format!("{}-{}", stem, token),
    }
}

// a leading dot is part of the stem (".env" has no extension)
fn split_extension(base: &str) -> (&str, Option<&str>) {
    match base.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < base.len() => (&base[..idx], Some(&base[idx + 1..])),
        Some(idx) if idx > 0 => (&base[..idx], None),
        _ => (base, None),
    }
}

pub fn backup_file_name(document_name: &str, token: i64) -> String {
    format!("{}{}{}", document_name, BACKUP_MARKER, token)
}

/// Recovers the token from a backup name, or `None` if the name is not a
/// backup of `document_name`.
pub fn parse_backup_token(document_name: &str, candidate: &str) -> Option<i64> {
    candidate
        .strip_prefix(document_name)?
        .strip_prefix(BACKUP_MARKER)?
        .parse::<i64>()
        .ok()
}
