//! Roster operations over a sheet backend

use crate::backend::SheetBackend;
use crate::error::SheetsResult;
use cekincki_types::{GuildMember, RosterSnapshot, SHEET_HEADER};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of adding missing members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkSyncOutcome {
    pub inserted: usize,
    pub total_members: usize,
}

/// Result of writing one member's row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum UpsertOutcome {
    Updated { row_index: u32 },
    Inserted,
}

/// The roster tab of a spreadsheet
#[derive(Clone)]
pub struct RosterSheet {
    backend: Arc<dyn SheetBackend>,
    tab: String,
}

impl std::fmt::Debug for RosterSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterSheet").field("tab", &self.tab).finish()
    }
}

fn member_row(member: &GuildMember, value: i64) -> Vec<Value> {
    vec![
        json!(member.display_name()),
        json!(member.tag()),
        json!(value),
    ]
}

impl RosterSheet {
    pub fn new(backend: Arc<dyn SheetBackend>, tab: impl Into<String>) -> Self {
        Self {
            backend,
            tab: tab.into(),
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    /// Create the tab when the spreadsheet does not have it
    pub async fn ensure_tab(&self) -> SheetsResult<()> {
        let titles = self.backend.tab_titles().await?;
        if !titles.iter().any(|t| t == &self.tab) {
            self.backend.add_tab(&self.tab).await?;
            tracing::info!(tab = %self.tab, "Created missing sheet tab");
        }
        Ok(())
    }

    /// Ensure the tab and overwrite row 1 with the enforced header
    pub async fn ensure_header(&self) -> SheetsResult<()> {
        self.ensure_tab().await?;
        let header = SHEET_HEADER.iter().map(|h| json!(h)).collect();
        self.backend.write_row(&self.tab, 1, header).await?;
        tracing::debug!(
            tab = %self.tab,
            header = %SHEET_HEADER.join(", "),
            "Enforced sheet header"
        );
        Ok(())
    }

    pub async fn read_all(&self) -> SheetsResult<RosterSnapshot> {
        self.ensure_tab().await?;
        let rows = self.backend.read_rows(&self.tab).await?;
        Ok(RosterSnapshot::from_rows(rows))
    }

    /// Append a zero-valued row for every member whose display name has no row
    pub async fn bulk_sync_members(
        &self,
        members: &[GuildMember],
    ) -> SheetsResult<BulkSyncOutcome> {
        self.ensure_header().await?;
        let snapshot = self.read_all().await?;

        let mut seen: HashSet<&str> = snapshot.nicknames().collect();
        let mut to_append = Vec::new();
        for member in members {
            let nick = member.display_name();
            if nick.is_empty() || !seen.insert(nick) {
                continue;
            }
            to_append.push(member_row(member, 0));
        }

        let inserted = to_append.len();
        if inserted > 0 {
            self.backend.append_rows(&self.tab, to_append).await?;
        }

        Ok(BulkSyncOutcome {
            inserted,
            total_members: members.len(),
        })
    }

    /// Overwrite the member's row, or append one
    pub async fn upsert_member_record(
        &self,
        member: &GuildMember,
        value: i64,
    ) -> SheetsResult<UpsertOutcome> {
        self.ensure_header().await?;
        let snapshot = self.read_all().await?;
        let row = member_row(member, value);

        match snapshot.get(member.display_name()) {
            Some(existing) => {
                let row_index = existing.row_index;
                self.backend.write_row(&self.tab, row_index, row).await?;
                Ok(UpsertOutcome::Updated { row_index })
            }
            None => {
                self.backend.append_rows(&self.tab, vec![row]).await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySheet;

    fn roster(sheet: &Arc<InMemorySheet>) -> RosterSheet {
        RosterSheet::new(sheet.clone(), "cekincki")
    }

    #[tokio::test]
    async fn test_ensure_tab_creates_once() {
        let sheet = Arc::new(InMemorySheet::new());
        let roster = roster(&sheet);

        roster.ensure_tab().await.unwrap();
        roster.ensure_tab().await.unwrap();

        assert_eq!(sheet.tab_titles_now().await, vec!["cekincki".to_string()]);
        assert_eq!(sheet.add_tab_calls(), 1);
    }

    #[tokio::test]
    async fn test_ensure_header_overwrites_row_one() {
        let sheet = Arc::new(InMemorySheet::with_rows(
            "cekincki",
            vec![vec![json!("name"), json!("user"), json!("points")]],
        ));
        roster(&sheet).ensure_header().await.unwrap();

        let rows = sheet.rows("cekincki").await;
        assert_eq!(rows[0], vec![json!("nickname"), json!("username"), json!("cekincki")]);
    }

    #[tokio::test]
    async fn test_bulk_sync_appends_only_missing() {
        let sheet = Arc::new(InMemorySheet::new());
        let roster = roster(&sheet);
        roster
            .upsert_member_record(&GuildMember::new("1", "ana").with_nick("Ana"), 7)
            .await
            .unwrap();

        let members = vec![
            GuildMember::new("1", "ana").with_nick("Ana"),
            GuildMember::new("2", "bor"),
            GuildMember::new("3", "cene").with_nick("bor"),
        ];
        let outcome = roster.bulk_sync_members(&members).await.unwrap();

        assert_eq!(
            outcome,
            BulkSyncOutcome {
                inserted: 1,
                total_members: 3
            }
        );
        let snapshot = roster.read_all().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("Ana").unwrap().value, 7);
        let bor = snapshot.get("bor").unwrap();
        assert_eq!(bor.value, 0);
        assert_eq!(bor.username, "bor");
    }

    #[tokio::test]
    async fn test_bulk_sync_without_missing_skips_append() {
        let sheet = Arc::new(InMemorySheet::new());
        let roster = roster(&sheet);
        let outcome = roster.bulk_sync_members(&[]).await.unwrap();

        assert_eq!(outcome.inserted, 0);
        assert_eq!(sheet.append_calls(), 0);
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_row_in_place() {
        let sheet = Arc::new(InMemorySheet::new());
        let roster = roster(&sheet);
        let ana = GuildMember::new("1", "ana").with_nick("Ana");

        assert_eq!(
            roster.upsert_member_record(&ana, 3).await.unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            roster.upsert_member_record(&ana, 9).await.unwrap(),
            UpsertOutcome::Updated { row_index: 2 }
        );

        let snapshot = roster.read_all().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("Ana").unwrap().value, 9);
    }
}
