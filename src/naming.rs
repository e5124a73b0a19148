use camino::{Utf8Path, Utf8PathBuf};
use url::Url;

use crate::mime;

/// Derive a filename for a downloaded image.
///
/// The last segment of the URL path wins when it already carries an
/// extension; otherwise a timestamped name is synthesized and the extension
/// comes from the effective content type, defaulting to `.jpg`.
pub fn derive_filename(url: &Url, content_type: &str) -> String {
    let base = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .trim();
    if !base.is_empty() && base.contains('.') {
        return base.to_string();
    }

    let stamp = chrono::Utc::now().timestamp();
    let extension = mime::extension_for(content_type).unwrap_or(".jpg");
    format!("image_{stamp}{extension}")
}

/// Find a path under `dir` that does not exist yet, appending `_1`, `_2`, …
/// before the extension. Targets filesystem existence only; content-level
/// duplicates are handled by the hash registry.
pub fn resolve_collision(dir: &Utf8Path, filename: &str) -> Utf8PathBuf {
    let candidate = dir.join(filename);
    if !candidate.as_std_path().exists() {
        return candidate;
    }

    let (stem, extension) = split_extension(filename);
    for counter in 1u32.. {
        let candidate = dir.join(format!("{stem}_{counter}{extension}"));
        if !candidate.as_std_path().exists() {
            return candidate;
        }
    }
    unreachable!("collision counter exhausted")
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(index) if index > 0 => filename.split_at(index),
        _ => (filename, ""),
    }
}
