use crate::api::{MetricsBundle, RecentCommit, RepositoryInfo};
use log::warn;
use serde::Deserialize;
use std::collections::HashSet;

/// Upper bound on the duplicate keys reported back to the caller.
pub const MAX_DUPLICATE_WARNINGS: usize = 10;

/// One row of the raw roster input, before seeding.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceStudent {
    pub name: String,
    #[serde(default)]
    pub admission_no: Option<String>,
    #[serde(default)]
    pub roll_no: Option<String>,
    #[serde(default)]
    pub github_repo: Option<String>,
}

/// A seeded roster row with its metrics overlay.
///
/// `runtime_id` is assigned once at seeding time and never changes; it is the
/// primary matching key for all subsequent merges.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub runtime_id: String,
    pub name: String,
    pub admission_no: Option<String>,
    pub roll_no: Option<String>,
    pub github_repo: Option<String>,
    pub total_commits: u32,
    pub recent_commit: Option<RecentCommit>,
    pub repository_info: Option<RepositoryInfo>,
    pub total_lines_of_code: Option<u64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl StudentRecord {
    fn seeded(source: SourceStudent, runtime_id: String) -> Self {
        let loading = non_empty(source.github_repo.as_deref()).is_some();
        StudentRecord {
            runtime_id,
            name: source.name,
            admission_no: source.admission_no,
            roll_no: source.roll_no,
            github_repo: source.github_repo,
            total_commits: 0,
            recent_commit: None,
            repository_info: None,
            total_lines_of_code: None,
            loading,
            error: None,
        }
    }

    pub fn repository_reference(&self) -> Option<&str> {
        non_empty(self.github_repo.as_deref())
    }

    pub fn has_repository(&self) -> bool {
        self.repository_reference().is_some()
    }

    /// Applies a fetched metrics bundle to the row's overlay.
    pub fn with_bundle(mut self, bundle: MetricsBundle) -> Self {
        self.total_commits = bundle.total_commits;
        self.recent_commit = bundle.recent_commit;
        self.repository_info = bundle.repository_info;
        self.total_lines_of_code = bundle.total_lines_of_code;
        self.loading = false;
        self.error = bundle.error;
        self
    }

    /// Marks the row failed; the message is data, not a propagated error.
    pub fn with_error<STR: Into<String>>(self, message: STR) -> Self {
        self.with_bundle(MetricsBundle::from_error(message))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeededRoster {
    pub students: Vec<StudentRecord>,
    /// Keys of dropped duplicate rows, capped at [`MAX_DUPLICATE_WARNINGS`].
    pub duplicate_warnings: Vec<String>,
}

/// Seeds raw roster rows into uniquely-identified records.
///
/// Each row gets a `runtime_id` (admission number, then roll number, then a
/// positional fallback derived from `roster_id`). Rows are then deduplicated
/// twice: by exact `runtime_id` collision and by a softer key (admission
/// number, roll number, repository reference or name, first non-empty).
/// The first occurrence of a duplicate key wins; later ones are dropped and
/// their keys collected for a user-facing warning.
pub fn seed_roster(rows: Vec<SourceStudent>, roster_id: &str) -> SeededRoster {
    let mut runtime_ids = HashSet::new();
    let mut soft_keys = HashSet::new();
    let mut students = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let runtime_id = non_empty(row.admission_no.as_deref())
            .or_else(|| non_empty(row.roll_no.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}", roster_id, index));
        if !runtime_ids.insert(runtime_id.clone()) {
            dropped.push(runtime_id);
            continue;
        }
        let soft_key = non_empty(row.admission_no.as_deref())
            .or_else(|| non_empty(row.roll_no.as_deref()))
            .or_else(|| non_empty(row.github_repo.as_deref()))
            .or_else(|| non_empty(Some(row.name.as_str())))
            .map(str::to_string);
        if let Some(key) = soft_key {
            if !soft_keys.insert(key.clone()) {
                dropped.push(key);
                continue;
            }
        }
        students.push(StudentRecord::seeded(row, runtime_id));
    }

    if !dropped.is_empty() {
        warn!("Dropped {} duplicate roster rows: {:?}", dropped.len(), dropped);
    }
    dropped.truncate(MAX_DUPLICATE_WARNINGS);
    SeededRoster {
        students,
        duplicate_warnings: dropped,
    }
}

/// Tests

#[cfg(test)]
fn source(name: &str, admission: Option<&str>, roll: Option<&str>, repo: Option<&str>) -> SourceStudent {
    SourceStudent {
        name: name.to_string(),
        admission_no: admission.map(str::to_string),
        roll_no: roll.map(str::to_string),
        github_repo: repo.map(str::to_string),
    }
}

#[test]
fn seed_assigns_runtime_ids_test() {
    let rows = vec![
        source("Ada", Some("A100"), None, Some("org/ada")),
        source("Brian", None, Some("R7"), None),
        source("Cleo", None, None, None),
    ];
    let seeded = seed_roster(rows, "cs-2a");
    let ids: Vec<&str> = seeded.students.iter().map(|s| s.runtime_id.as_str()).collect();
    assert_eq!(ids, vec!["A100", "R7", "cs-2a-2"]);
    assert!(seeded.duplicate_warnings.is_empty());
}

#[test]
fn seed_duplicate_admission_drops_later_row_test() {
    let rows = vec![
        source("Ada", Some("A100"), None, None),
        source("Imposter", Some("A100"), None, None),
    ];
    let seeded = seed_roster(rows, "cs-2a");
    assert_eq!(seeded.students.len(), 1);
    assert_eq!(seeded.students[0].name, "Ada");
    assert_eq!(seeded.duplicate_warnings, vec!["A100".to_string()]);
}

#[test]
fn seed_soft_key_catches_repo_duplicates_test() {
    // Same repository reference, no natural identity fields: the second row
    // gets a distinct positional runtime id but is still a source duplicate.
    let rows = vec![
        source("Ada", None, None, Some("org/shared")),
        source("Ada Again", None, None, Some("org/shared")),
    ];
    let seeded = seed_roster(rows, "cs-2a");
    assert_eq!(seeded.students.len(), 1);
    assert_eq!(seeded.duplicate_warnings, vec!["org/shared".to_string()]);
}

#[test]
fn seed_caps_duplicate_warnings_test() {
    let mut rows = vec![source("Ada", Some("A0"), None, None)];
    for index in 0..(MAX_DUPLICATE_WARNINGS + 5) {
        rows.push(source(&format!("Dup {}", index), Some("A0"), None, None));
    }
    let seeded = seed_roster(rows, "cs-2a");
    assert_eq!(seeded.students.len(), 1);
    assert_eq!(seeded.duplicate_warnings.len(), MAX_DUPLICATE_WARNINGS);
}

#[test]
fn seed_marks_rows_with_repository_loading_test() {
    let rows = vec![
        source("Ada", Some("A1"), None, Some("org/ada")),
        source("Brian", Some("A2"), None, Some("   ")),
    ];
    let seeded = seed_roster(rows, "cs-2a");
    assert!(seeded.students[0].loading);
    assert!(!seeded.students[1].loading);
    assert!(!seeded.students[1].has_repository());
}

#[test]
fn source_student_camel_case_test() {
    let row: SourceStudent = serde_json::from_str(
        r#"{ "name": "Ada", "admissionNo": "A100", "githubRepo": "org/ada" }"#,
    )
    .unwrap();
    assert_eq!(row.admission_no.as_deref(), Some("A100"));
    assert_eq!(row.github_repo.as_deref(), Some("org/ada"));
    assert_eq!(row.roll_no, None);
}
