//! The error taxonomy of the ledger surface.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by ledger operations.
///
/// Read failures on aggregate operations do not appear here: they degrade to
/// zero/empty results plus a recorded warning, because partial report data
/// beats no data. Write failures always propagate.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested month has no configured sheet tab.
    #[error("no sheet tab is configured for month {0}")]
    InvalidMonth(u32),

    /// The requested year has no configured spreadsheet.
    #[error("no spreadsheet is configured for year {0}")]
    InvalidYear(i32),

    /// A read against the backing spreadsheet failed while it was gating a
    /// write.
    #[error("failed to read from the spreadsheet")]
    RemoteRead(#[source] anyhow::Error),

    /// A write against the backing spreadsheet failed.
    #[error("failed to write to the spreadsheet")]
    RemoteWrite(#[source] anyhow::Error),

    /// Edit or delete was attempted with an expense that was never saved.
    #[error("a saved row reference is required to edit or delete an expense")]
    MissingRowRef,

    /// Add was attempted with an expense that already carries a row
    /// reference.
    #[error("a new expense must not carry a row reference; use edit instead")]
    RowRefForbidden,

    /// `set_pension` found no pension label row in the month tab.
    #[error("no pension cell was found in sheet tab '{0}'")]
    PensionCellNotFound(String),

    /// Anything outside the ledger contract: configuration, local I/O,
    /// authentication.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
