//! Price modifier persistence port trait.

use crate::domain::error::AnalyticsError;
use crate::domain::modifier_table::ModifierRow;

pub trait ModifierSource {
    /// Full snapshot of the modifier table.
    fn fetch_modifiers(&self) -> Result<Vec<ModifierRow>, AnalyticsError>;
}
