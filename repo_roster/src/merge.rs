use crate::roster::StudentRecord;

/// Reconciles partial results against the canonical roster.
///
/// The roster's shape and order are authoritative: the output has the same
/// length and the same `runtime_id` set as the input, regardless of what the
/// results contain. For each roster row the match strategies are tried in
/// order of reliability — runtime id, admission number, roll number, exact
/// repository reference — and the first strategy yielding exactly one
/// candidate wins. Raw repository references rank last because students may
/// coincidentally share an account.
///
/// Unmatched rows are returned unchanged except `loading` is recomputed:
/// a row with a repository reference is still waiting for its batch.
pub fn merge_results(roster: &[StudentRecord], results: &[StudentRecord]) -> Vec<StudentRecord> {
    roster
        .iter()
        .map(|row| match find_result(row, results) {
            Some(found) => {
                let mut merged = found.clone();
                merged.runtime_id = row.runtime_id.clone();
                merged
            }
            None => {
                let mut pending = row.clone();
                pending.loading = pending.has_repository();
                pending
            }
        })
        .collect()
}

type MatchStrategy = fn(&StudentRecord, &StudentRecord) -> bool;

const STRATEGIES: [MatchStrategy; 4] = [by_runtime_id, by_admission_no, by_roll_no, by_repository];

fn find_result<'a>(row: &StudentRecord, results: &'a [StudentRecord]) -> Option<&'a StudentRecord> {
    for strategy in STRATEGIES {
        let mut candidates = results.iter().filter(|result| strategy(row, result));
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => return Some(only),
            _ => continue,
        }
    }
    None
}

fn by_runtime_id(row: &StudentRecord, result: &StudentRecord) -> bool {
    row.runtime_id == result.runtime_id
}

fn by_admission_no(row: &StudentRecord, result: &StudentRecord) -> bool {
    both_non_empty(row.admission_no.as_deref(), result.admission_no.as_deref())
}

fn by_roll_no(row: &StudentRecord, result: &StudentRecord) -> bool {
    both_non_empty(row.roll_no.as_deref(), result.roll_no.as_deref())
}

fn by_repository(row: &StudentRecord, result: &StudentRecord) -> bool {
    both_non_empty(row.github_repo.as_deref(), result.github_repo.as_deref())
}

fn both_non_empty(row: Option<&str>, result: Option<&str>) -> bool {
    match (row, result) {
        (Some(row), Some(result)) => !row.is_empty() && row == result,
        _ => false,
    }
}

/// Tests
