use std::path::Path;

/// Display label for a repository: the last path segment of its `origin` URL
/// without a trailing `.git`, or the directory basename when there is no usable
/// origin.
pub fn repo_label(origin_url: Option<&str>, repo_path: &Path) -> String {
    origin_url
        .and_then(label_from_url)
        .unwrap_or_else(|| dir_label(repo_path))
}

// Handles the URL shapes a remote can take:
// - https://github.com/owner/repo.git
// - git@github.com:owner/repo.git
// - git@host:repo.git
// - /srv/git/repo.git
pub fn label_from_url(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    let segment = url.rsplit('/').next()?;

    // scp-like URLs without a slash in the path
    let segment = match segment.rsplit_once(':') {
        Some((_, rest)) if !url.contains("://") => rest,
        _ => segment,
    };

    let name = segment.strip_suffix(".git").unwrap_or(segment);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn dir_label(repo_path: &Path) -> String {
    repo_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| repo_path.display().to_string())
}
