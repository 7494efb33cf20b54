//! Caller-supplied transforms applied to fetched items

use keyloader_errors::AppResult;

/// Turns one fetched item into zero or more domain values.
///
/// Returning an empty `Vec` is a valid outcome. Returning an error marks the
/// whole item as failed.
pub trait ItemMapper<I, R>: Send + Sync {
    fn map(&self, name: &str, input: I) -> AppResult<Vec<R>>;
}

impl<I, R, F> ItemMapper<I, R> for F
where
    F: Fn(&str, I) -> AppResult<Vec<R>> + Send + Sync,
{
    fn map(&self, name: &str, input: I) -> AppResult<Vec<R>> {
        self(name, input)
    }
}

/// Maps a secret value line by line.
///
/// Lines are trimmed and blank lines are skipped, so an empty secret yields no
/// values. One malformed line fails the whole item.
#[derive(Debug, Clone)]
pub struct LineMapper<F> {
    entry: F,
}

/// Build a [`LineMapper`] from a per-line transform
pub fn lines<R, F>(entry: F) -> LineMapper<F>
where
    F: Fn(&str, &str) -> AppResult<R> + Send + Sync,
{
    LineMapper { entry }
}

impl<R, F> ItemMapper<String, R> for LineMapper<F>
where
    F: Fn(&str, &str) -> AppResult<R> + Send + Sync,
{
    fn map(&self, name: &str, input: String) -> AppResult<Vec<R>> {
        input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| (self.entry)(name, line))
            .collect()
    }
}
