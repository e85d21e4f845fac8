//! Output path helpers.
//!
//! The remote service expects output paths relative to the bucket root,
//! without a leading slash.

/// Normalize a configured output base path: no leading `/`, exactly one
/// trailing `/`. An empty or root-only base stays empty.
pub fn normalize_base_path(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Join path segments with single `/` separators, dropping empty segments
/// and any leading or trailing slashes on each segment.
pub fn join_output_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
