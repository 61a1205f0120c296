//! Storage backend trait
//!
//! Backends work on whole rows of a worksheet tab, columns A..C. Row indexes
//! are 1-based, as in the spreadsheet UI.

use crate::error::SheetsResult;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Titles of every tab in the spreadsheet
    async fn tab_titles(&self) -> SheetsResult<Vec<String>>;

    /// Create a new, empty tab
    async fn add_tab(&self, title: &str) -> SheetsResult<()>;

    /// All rows of a tab, header included
    async fn read_rows(&self, tab: &str) -> SheetsResult<Vec<Vec<Value>>>;

    /// Overwrite one row
    async fn write_row(&self, tab: &str, row_index: u32, row: Vec<Value>) -> SheetsResult<()>;

    /// Append rows after the last non-empty row
    async fn append_rows(&self, tab: &str, rows: Vec<Vec<Value>>) -> SheetsResult<()>;
}
