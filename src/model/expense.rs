//! The `Expense` entity and its row reference.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Where an expense lives relative to the backing sheet.
///
/// `add_expense` requires `Unsaved` and `edit`/`delete` require `Row`, so the
/// handle-presence contracts are enforced at the type level instead of by a
/// nullable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowRef {
    /// Built by the caller, not yet written to the sheet.
    #[default]
    Unsaved,
    /// Persisted at this 1-based row of its month tab.
    Row(u32),
}

impl RowRef {
    /// The 1-based row, or `None` for an unsaved expense.
    pub fn row_number(&self) -> Option<u32> {
        match self {
            RowRef::Unsaved => None,
            RowRef::Row(n) => Some(*n),
        }
    }

    pub fn is_unsaved(&self) -> bool {
        matches!(self, RowRef::Unsaved)
    }
}

// Serialized as `null` or a bare number so cached expenses stay plain JSON.
impl Serialize for RowRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.row_number().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RowRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let row = Option::<u32>::deserialize(deserializer)?;
        Ok(match row {
            Some(n) => RowRef::Row(n),
            None => RowRef::Unsaved,
        })
    }
}

/// A single transaction from a month tab.
///
/// The repository never retains expenses across calls; callers own them, and
/// values read back from the cache are fresh copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Position of the expense in its tab, once persisted and read back.
    pub row: RowRef,
    /// Day of the transaction, in whatever textual form the sheet holds.
    pub date: String,
    /// Free-text label.
    pub description: String,
    /// Non-negative amount.
    pub amount: Decimal,
}

impl Expense {
    /// A new, not-yet-persisted expense.
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            row: RowRef::Unsaved,
            date: date.into(),
            description: description.into(),
            amount,
        }
    }

    /// An expense read back from the sheet at the given 1-based row.
    pub fn persisted(
        row: u32,
        date: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            row: RowRef::Row(row),
            date: date.into(),
            description: description.into(),
            amount,
        }
    }
}
