use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use comfy_table::{Cell, CellAlignment, Table};

pub const MAX_BRANCH_NAME_LENGTH: usize = 25;
const TRUNCATED_BRANCH_NAME_LENGTH: usize = 20;

// Light single-line borders, a light header separator and no lines between rows.
const STYLE_LIGHT: &str = "││──├─┼┤│    ┬┴┌┐└┘";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One row per repository, describing the checked-out branch.
    Head,
    /// One row per local branch.
    Branches,
}

impl Mode {
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Mode::Head => &[
                "repository",
                "size",
                "branch",
                "last commit",
                "age",
                "author",
                "remotes",
            ],
            Mode::Branches => &[
                "repository",
                "branch",
                "last commit",
                "age",
                "author",
                "remotes",
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub repository: String,
    /// Only computed in [`Mode::Head`].
    pub size: Option<String>,
    pub branch: String,
    pub committed: DateTime<FixedOffset>,
    pub age: String,
    pub author: String,
    pub remotes: String,
}

impl Row {
    fn cells(&self, mode: Mode) -> Vec<String> {
        let mut cells = Vec::with_capacity(mode.header().len());
        cells.push(self.repository.clone());
        if mode == Mode::Head {
            cells.push(self.size.clone().unwrap_or_default());
        }
        cells.push(self.branch.clone());
        cells.push(self.committed.to_rfc3339_opts(SecondsFormat::Secs, true));
        cells.push(self.age.clone());
        cells.push(self.author.clone());
        cells.push(self.remotes.clone());
        cells
    }
}

/// Formats the time elapsed between `authored` and `now` as `"{days}d {hours}h {minutes}m"`.
pub fn format_age(now: DateTime<Utc>, authored: DateTime<FixedOffset>) -> String {
    let elapsed = now.signed_duration_since(authored);
    format!(
        "{}d {}h {}m",
        elapsed.num_days(),
        elapsed.num_hours() % 24,
        elapsed.num_minutes() % 60
    )
}

pub fn truncate_branch(name: &str, truncate: bool) -> String {
    if truncate && name.chars().count() > MAX_BRANCH_NAME_LENGTH {
        let prefix: String = name.chars().take(TRUNCATED_BRANCH_NAME_LENGTH).collect();
        format!("{}...", prefix)
    } else {
        name.to_string()
    }
}

pub fn format_size(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Newest commit first. Rows with equal timestamps keep their discovery order.
pub fn sort_rows(rows: &mut [Row]) {
    rows.sort_by(|a, b| b.committed.cmp(&a.committed));
}

pub fn render(rows: &[Row], mode: Mode) -> Table {
    let mut table = Table::new();
    table.load_preset(STYLE_LIGHT);
    table.set_header(
        mode.header()
            .iter()
            .map(|title| Cell::new(title).set_alignment(CellAlignment::Center)),
    );

    let mut sorted = rows.to_vec();
    sort_rows(&mut sorted);
    for row in &sorted {
        table.add_row(row.cells(mode));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn row(repository: &str, committed: DateTime<FixedOffset>) -> Row {
        Row {
            repository: repository.to_string(),
            size: Some(format_size(0)),
            branch: "main".to_string(),
            committed,
            age: format_age(fixed_now(), committed),
            author: "Jane Doe".to_string(),
            remotes: "origin".to_string(),
        }
    }

    #[test]
    fn test_format_age_drops_seconds() {
        let now = fixed_now();
        let authored = (now - Duration::seconds(90061)).fixed_offset();
        assert_eq!(format_age(now, authored), "1d 1h 1m");
    }

    #[test]
    fn test_format_age_ignores_commit_offset() {
        let now = fixed_now();
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let authored = (now - Duration::minutes(42)).with_timezone(&offset);
        assert_eq!(format_age(now, authored), "0d 0h 42m");
    }

    #[test]
    fn test_format_age_many_days() {
        let now = fixed_now();
        let authored = (now - Duration::days(400) - Duration::hours(23)).fixed_offset();
        assert_eq!(format_age(now, authored), "400d 23h 0m");
    }

    #[test]
    fn test_truncate_long_branch() {
        let name = "feature/abcdefghijklmnopqrstuv";
        assert_eq!(name.len(), 30);
        assert_eq!(truncate_branch(name, true), "feature/abcdefghijkl...");
    }

    #[test]
    fn test_truncate_keeps_short_branch() {
        let name = "feature/abcdefghijkl";
        assert_eq!(name.len(), 20);
        assert_eq!(truncate_branch(name, true), name);
        assert_eq!(truncate_branch("exactly-twenty-five-chars", true).len(), 25);
    }

    #[test]
    fn test_truncate_disabled() {
        let name = "feature/abcdefghijklmnopqrstuv";
        assert_eq!(truncate_branch(name, false), name);
    }

    #[test]
    fn test_truncate_counts_characters() {
        let name = "ветка-для-очень-длинного-имени";
        let truncated = truncate_branch(name, true);
        assert_eq!(truncated.chars().count(), 23);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00MB");
        assert_eq!(format_size(1024 * 1024), "1.00MB");
        assert_eq!(format_size(1536 * 1024), "1.50MB");
    }

    #[test]
    fn test_sort_rows_newest_first() {
        let now = fixed_now();
        let mut rows = vec![
            row("one-hour", (now - Duration::hours(1)).fixed_offset()),
            row("three-hours", (now - Duration::hours(3)).fixed_offset()),
            row("half-hour", (now - Duration::minutes(30)).fixed_offset()),
        ];
        sort_rows(&mut rows);
        let order: Vec<_> = rows.iter().map(|r| r.repository.as_str()).collect();
        assert_eq!(order, ["half-hour", "one-hour", "three-hours"]);
    }

    #[test]
    fn test_sort_rows_is_stable() {
        let committed = fixed_now().fixed_offset();
        let mut rows = vec![row("first", committed), row("second", committed)];
        sort_rows(&mut rows);
        assert_eq!(rows[0].repository, "first");
        assert_eq!(rows[1].repository, "second");
    }

    #[test]
    fn test_render_orders_rows() {
        let now = fixed_now();
        let rows = vec![
            row("older", (now - Duration::hours(3)).fixed_offset()),
            row("newer", (now - Duration::minutes(30)).fixed_offset()),
        ];
        let rendered = render(&rows, Mode::Head).to_string();
        let newer = rendered.find("newer").unwrap();
        let older = rendered.find("older").unwrap();
        assert!(newer < older);
        assert!(rendered.contains("0d 0h 30m"));
        assert!(rendered.contains('┌'));
    }

    #[test]
    fn test_render_header_per_mode() {
        let head = render(&[], Mode::Head).to_string();
        assert!(head.contains("size"));
        assert!(head.contains("author"));

        let branches = render(&[], Mode::Branches).to_string();
        assert!(!branches.contains("size"));
        assert!(branches.contains("last commit"));
    }

    #[test]
    fn test_branch_rows_have_no_size_cell() {
        let r = row("repo", fixed_now().fixed_offset());
        assert_eq!(r.cells(Mode::Head).len(), Mode::Head.header().len());
        assert_eq!(r.cells(Mode::Branches).len(), Mode::Branches.header().len());
    }
}
