//! Due-date helpers.
//!
//! A due date names a calendar day; the task counts as overdue from the
//! start of that day. All functions take `today` explicitly so callers
//! decide which clock and timezone apply.

use chrono::NaiveDate;

use crate::model::Task;

/// Whether a task with the given due date is overdue on `today`.
#[must_use]
pub fn is_overdue(due_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_date.is_some_and(|due| today >= due)
}

/// Whole days elapsed since the due date (0 on the due day itself).
#[must_use]
pub fn days_overdue(due_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - due_date).num_days()
}

/// Short description of how long ago a task expired.
#[must_use]
pub fn overdue_label(due_date: NaiveDate, today: NaiveDate) -> String {
    match days_overdue(due_date, today) {
        0 => "expired today".to_string(),
        1 => "expired 1 day ago".to_string(),
        n => format!("expired {n} days ago"),
    }
}

/// Number of tasks that are overdue on `today`.
#[must_use]
pub fn count_overdue<'a>(tasks: impl IntoIterator<Item = &'a Task>, today: NaiveDate) -> usize {
    tasks
        .into_iter()
        .filter(|t| is_overdue(t.due_date, today))
        .count()
}
