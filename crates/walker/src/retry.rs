//! Bounded retry with a deterministic fallback.
//!
//! Used by detour completion: try an operation a fixed number of times and,
//! if none of the attempts produce a value, take the fallback instead of
//! looping forever in a sparse corner of the graph.

/// Result of a [`BoundedRetry::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// An attempt succeeded; `attempts` counts it
    Success { value: T, attempts: usize },
    /// Every attempt failed and the fallback was used
    Fallback(T),
}

impl<T> RetryOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            RetryOutcome::Success { value, .. } | RetryOutcome::Fallback(value) => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RetryOutcome::Fallback(_))
    }
}

/// Attempt an operation up to `max_attempts` times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRetry {
    max_attempts: usize,
}

impl BoundedRetry {
    pub const fn new(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run `attempt` until it yields `Some`, at most `max_attempts` times
    ///
    /// `attempt` receives the 1-based attempt number. An `Err` from an attempt
    /// aborts immediately; it is not counted as a miss. `fallback` runs only
    /// after every attempt returned `None`.
    pub fn run<T, E>(
        &self,
        mut attempt: impl FnMut(usize) -> Result<Option<T>, E>,
        fallback: impl FnOnce() -> T,
    ) -> Result<RetryOutcome<T>, E> {
        for n in 1..=self.max_attempts {
            if let Some(value) = attempt(n)? {
                return Ok(RetryOutcome::Success { value, attempts: n });
            }
        }
        Ok(RetryOutcome::Fallback(fallback()))
    }
}
