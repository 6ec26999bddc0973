//! Run status enum mapping to the SMALLINT status column.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Scheduled run execution status.
///
/// A run is created as `Pending` before execution begins and always
/// transitions to exactly one terminal state.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending = 1,
    Completed = 2,
    Failed = 3,
}

impl RunStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl From<RunStatus> for StatusId {
    fn from(value: RunStatus) -> Self {
        value as StatusId
    }
}
