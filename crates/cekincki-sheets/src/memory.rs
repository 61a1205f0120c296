//! In-memory sheet backend for development and testing

use crate::backend::SheetBackend;
use crate::error::{SheetsError, SheetsResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory spreadsheet
#[derive(Debug, Default)]
pub struct InMemorySheet {
    tabs: RwLock<BTreeMap<String, Vec<Vec<Value>>>>,
    add_tab_calls: AtomicUsize,
    append_calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spreadsheet with one pre-filled tab
    pub fn with_rows(tab: &str, rows: Vec<Vec<Value>>) -> Self {
        let mut tabs = BTreeMap::new();
        tabs.insert(tab.to_string(), rows);
        Self {
            tabs: RwLock::new(tabs),
            ..Default::default()
        }
    }

    pub async fn rows(&self, tab: &str) -> Vec<Vec<Value>> {
        self.tabs.read().await.get(tab).cloned().unwrap_or_default()
    }

    pub async fn tab_titles_now(&self) -> Vec<String> {
        self.tabs.read().await.keys().cloned().collect()
    }

    /// Edit the value cell of the first row with `nickname`, as a person would
    pub async fn set_value(&self, tab: &str, nickname: &str, value: i64) -> bool {
        let mut tabs = self.tabs.write().await;
        let Some(rows) = tabs.get_mut(tab) else {
            return false;
        };
        for row in rows.iter_mut().skip(1) {
            if row.first().and_then(Value::as_str) == Some(nickname) {
                row.resize(3, json!(""));
                row[2] = json!(value.to_string());
                return true;
            }
        }
        false
    }

    /// Make every subsequent call fail with a 503
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn add_tab_calls(&self) -> usize {
        self.add_tab_calls.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> SheetsResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SheetsError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SheetBackend for InMemorySheet {
    async fn tab_titles(&self) -> SheetsResult<Vec<String>> {
        self.check()?;
        Ok(self.tab_titles_now().await)
    }

    async fn add_tab(&self, title: &str) -> SheetsResult<()> {
        self.check()?;
        self.add_tab_calls.fetch_add(1, Ordering::SeqCst);
        self.tabs
            .write()
            .await
            .entry(title.to_string())
            .or_default();
        Ok(())
    }

    async fn read_rows(&self, tab: &str) -> SheetsResult<Vec<Vec<Value>>> {
        self.check()?;
        let rows = self.rows(tab).await;
        // The values API drops trailing empty rows
        let last = rows.iter().rposition(|r| !r.is_empty()).map_or(0, |i| i + 1);
        Ok(rows.into_iter().take(last).collect())
    }

    async fn write_row(&self, tab: &str, row_index: u32, row: Vec<Value>) -> SheetsResult<()> {
        self.check()?;
        if row_index == 0 {
            return Err(SheetsError::Api {
                status: 400,
                message: "row index is 1-based".to_string(),
            });
        }
        let mut tabs = self.tabs.write().await;
        let rows = tabs.entry(tab.to_string()).or_default();
        let idx = (row_index - 1) as usize;
        if rows.len() <= idx {
            rows.resize(idx + 1, Vec::new());
        }
        rows[idx] = row;
        Ok(())
    }

    async fn append_rows(&self, tab: &str, new_rows: Vec<Vec<Value>>) -> SheetsResult<()> {
        self.check()?;
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        let mut tabs = self.tabs.write().await;
        let rows = tabs.entry(tab.to_string()).or_default();
        let last = rows.iter().rposition(|r| !r.is_empty()).map_or(0, |i| i + 1);
        rows.truncate(last);
        rows.extend(new_rows);
        Ok(())
    }
}
