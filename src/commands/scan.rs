use crate::label::repo_label;
use crate::report::{self, Mode, Row};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Directory names that are never descended into, whatever the command line says.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[".terraform"];

const GIT_DIR: &str = ".git";

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub branches: bool,
    pub truncate: bool,
    /// Exact match against the commit author's display name.
    pub author: Option<String>,
    pub skip_dirs: Vec<String>,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ScanOptions {
            root: root.into(),
            branches: false,
            truncate: false,
            author: None,
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|dir| dir.to_string()).collect(),
        }
    }

    /// Appends the comma separated directory names in `csv` to the skip list.
    pub fn skip_dirs_csv(mut self, csv: &str) -> Self {
        self.skip_dirs.extend(
            csv.split(',')
                .map(str::trim)
                .filter(|dir| !dir.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn mode(&self) -> Mode {
        if self.branches {
            Mode::Branches
        } else {
            Mode::Head
        }
    }

    fn accepts_author(&self, author: &str) -> bool {
        self.author.as_deref().is_none_or(|wanted| wanted == author)
    }
}

#[derive(Debug, Clone)]
struct CommitInfo {
    author: String,
    authored: DateTime<FixedOffset>,
}

/// Shared by every row of one repository.
struct RepoContext<'a> {
    path: &'a Path,
    label: String,
    remotes: String,
}

pub fn execute(options: &ScanOptions) -> Result<()> {
    let now = Utc::now();
    let rows = scan(options, now)?;
    println!("{}", report::render(&rows, options.mode()));
    Ok(())
}

/// Walks `options.root` and returns the unsorted rows for every repository found,
/// with ages measured against `now`.
pub fn scan(options: &ScanOptions, now: DateTime<Utc>) -> Result<Vec<Row>> {
    let root = fs::canonicalize(&options.root)
        .with_context(|| format!("Failed to resolve {}", options.root.display()))?;

    let repos = find_git_repositories(&root, &options.skip_dirs)?;
    info!(root = %root.display(), count = repos.len(), "found repositories");

    let mut rows = Vec::new();
    for path in &repos {
        rows.extend(inspect_repository(path, options, now)?);
    }

    Ok(rows)
}

/// Returns the working tree of every `.git` directory under `root`, in walk order.
pub fn find_git_repositories(root: &Path, skip_dirs: &[String]) -> Result<Vec<PathBuf>> {
    let mut repos = Vec::new();

    let mut it = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && skip_dirs.iter().any(|dir| entry.file_name() == dir.as_str()))
        });

    while let Some(entry) = it.next() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;

        if !entry.file_type().is_dir() || entry.file_name() != GIT_DIR {
            continue;
        }

        // Don't recurse into git metadata
        it.skip_current_dir();

        if let Some(work_dir) = entry.path().parent() {
            debug!(path = %work_dir.display(), "discovered repository");
            repos.push(work_dir.to_path_buf());
        }
    }

    Ok(repos)
}

/// Sum of the sizes of everything under `path` except directories. Symlinks count
/// their own size and are not followed.
pub fn dir_size(path: &Path) -> Result<u64> {
    let mut size = 0;

    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to measure {}", path.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        size += metadata.len();
    }

    Ok(size)
}

fn inspect_repository(path: &Path, options: &ScanOptions, now: DateTime<Utc>) -> Result<Vec<Row>> {
    debug!(path = %path.display(), "inspecting repository");

    let repo = gix::open(path)
        .with_context(|| format!("Failed to open repository at {}", path.display()))?;

    let remote_names: Vec<String> = repo
        .remote_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let origin_url = if remote_names.iter().any(|name| name == "origin") {
        let remote = repo
            .find_remote("origin")
            .with_context(|| format!("Failed to read remote 'origin' of {}", path.display()))?;
        remote
            .url(gix::remote::Direction::Fetch)
            .map(|url| url.to_bstring().to_string())
    } else {
        None
    };

    let context = RepoContext {
        path,
        label: repo_label(origin_url.as_deref(), path),
        remotes: remote_names.join(", "),
    };

    match options.mode() {
        Mode::Head => Ok(head_row(&repo, &context, options, now)?.into_iter().collect()),
        Mode::Branches => branch_rows(&repo, &context, options, now),
    }
}

fn head_row(
    repo: &gix::Repository,
    context: &RepoContext<'_>,
    options: &ScanOptions,
    now: DateTime<Utc>,
) -> Result<Option<Row>> {
    let path = context.path;

    // None means HEAD is detached
    let Ok(Some(head_name)) = repo.head_name() else {
        debug!(path = %path.display(), "skipping repository without a branch checked out");
        return Ok(None);
    };

    let Ok(commit) = repo.head_commit() else {
        debug!(path = %path.display(), "skipping repository without commits");
        return Ok(None);
    };

    let Ok(info) = read_commit(&commit) else {
        debug!(path = %path.display(), "skipping repository with an unreadable HEAD commit");
        return Ok(None);
    };

    if !options.accepts_author(&info.author) {
        debug!(path = %path.display(), author = %info.author, "author does not match");
        return Ok(None);
    }

    let size = dir_size(path)?;

    Ok(Some(Row {
        repository: context.label.clone(),
        size: Some(report::format_size(size)),
        branch: report::truncate_branch(&head_name.shorten().to_string(), options.truncate),
        committed: info.authored,
        age: report::format_age(now, info.authored),
        author: info.author,
        remotes: context.remotes.clone(),
    }))
}

fn branch_rows(
    repo: &gix::Repository,
    context: &RepoContext<'_>,
    options: &ScanOptions,
    now: DateTime<Utc>,
) -> Result<Vec<Row>> {
    let path = context.path;
    let mut rows = Vec::new();

    let references = repo
        .references()
        .with_context(|| format!("Failed to read references of {}", path.display()))?;
    let local_branches = references
        .local_branches()
        .with_context(|| format!("Failed to list branches of {}", path.display()))?;

    for branch_ref in local_branches {
        let branch_ref = branch_ref
            .map_err(|err| anyhow!("Failed to read a branch of {}: {}", path.display(), err))?;

        let name = branch_ref.name();
        if name.as_bstr() == "HEAD" {
            continue;
        }
        let branch_name = name.shorten().to_string();

        let Some(id) = branch_ref.try_id() else {
            continue;
        };
        let Ok(commit) = repo.find_commit(id.detach()) else {
            debug!(path = %path.display(), branch = %branch_name, "skipping branch with an unreadable commit");
            continue;
        };
        let Ok(info) = read_commit(&commit) else {
            debug!(path = %path.display(), branch = %branch_name, "skipping branch with an unreadable commit");
            continue;
        };

        if !options.accepts_author(&info.author) {
            continue;
        }

        rows.push(Row {
            repository: context.label.clone(),
            size: None,
            branch: report::truncate_branch(&branch_name, options.truncate),
            committed: info.authored,
            age: report::format_age(now, info.authored),
            author: info.author,
            remotes: context.remotes.clone(),
        });
    }

    Ok(rows)
}

fn read_commit(commit: &gix::Commit<'_>) -> Result<CommitInfo> {
    let author = commit.author()?;
    let time = author.time()?;
    let authored = to_datetime(time.seconds, time.offset)
        .ok_or_else(|| anyhow!("Commit {} has an out of range author time", commit.id))?;

    Ok(CommitInfo {
        author: author.name.to_string(),
        authored,
    })
}

fn to_datetime(seconds: i64, offset: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset)?;
    Some(DateTime::from_timestamp(seconds, 0)?.with_timezone(&offset))
}
