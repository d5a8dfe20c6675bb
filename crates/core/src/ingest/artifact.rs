use serde::Deserialize;

/// One entry of the GitHub contents listing. `download_url` is null for
/// subdirectories, so it stays optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,

    #[serde(default)]
    pub download_url: Option<String>,
}

/// Picks the newest export by name: filter on prefix/suffix, then take the
/// lexicographically greatest. Export stamps are fixed-width and
/// zero-padded, so lexicographic order is chronological order; that is a
/// precondition of the naming convention, not checked here.
///
/// `None` means nothing matched and there is nothing to analyze.
pub fn select_latest<'a>(
    entries: &'a [ArtifactEntry],
    prefix: &str,
    suffix: &str,
) -> Option<&'a ArtifactEntry> {
    entries
        .iter()
        .filter(|e| e.name.starts_with(prefix) && e.name.ends_with(suffix))
        .max_by(|a, b| a.name.cmp(&b.name))
}
