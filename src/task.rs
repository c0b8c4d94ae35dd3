//! Lifecycle of one async request, tracked explicitly in state.

#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus<T, E> {
    /// Nothing requested yet
    Idle,
    InProgress,
    Finished(Result<T, E>),
}

impl<T, E> Default for TaskStatus<T, E> {
    fn default() -> Self {
        TaskStatus::Idle
    }
}

impl<T, E> TaskStatus<T, E> {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, TaskStatus::InProgress)
    }

    /// Successful result, if finished with one.
    pub fn ok(&self) -> Option<&T> {
        match self {
            TaskStatus::Finished(Ok(value)) => Some(value),
            _ => None,
        }
    }

    pub fn err(&self) -> Option<&E> {
        match self {
            TaskStatus::Finished(Err(e)) => Some(e),
            _ => None,
        }
    }
}
