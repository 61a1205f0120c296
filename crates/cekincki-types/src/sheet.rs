//! Sheet schema: header, rows and the nickname-keyed snapshot
//!
//! The sheet has a single enforced layout. Column A holds the member's display
//! name, column B the account tag and column C the points value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Enforced header row (columns A..C)
pub const SHEET_HEADER: [&str; 3] = ["nickname", "username", "cekincki"];

/// Worksheet tab used when none is configured
pub const DEFAULT_SHEET_NAME: &str = "cekincki";

/// One data row of the sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    pub nickname: String,
    pub username: String,
    pub value: i64,

    /// 1-based sheet row number (the header is row 1)
    pub row_index: u32,
}

/// All rows of the sheet, keyed by nickname
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    by_nickname: HashMap<String, SheetRow>,
}

impl RosterSnapshot {
    /// Build a snapshot from raw cell values as returned by the values API.
    ///
    /// The first row is treated as the header. A repeated nickname resolves to
    /// the later row.
    pub fn from_rows(raw: Vec<Vec<Value>>) -> Self {
        let mut by_nickname = HashMap::new();
        for (i, row) in raw.iter().enumerate().skip(1) {
            let nickname = row.first().map(cell_text).unwrap_or_default();
            if nickname.is_empty() {
                continue;
            }
            let username = row.get(1).map(cell_text).unwrap_or_default();
            let value = row.get(2).map(|v| parse_points(&cell_text(v))).unwrap_or(0);
            by_nickname.insert(
                nickname.clone(),
                SheetRow {
                    nickname,
                    username,
                    value,
                    row_index: (i + 1) as u32,
                },
            );
        }

        Self { by_nickname }
    }

    pub fn get(&self, nickname: &str) -> Option<&SheetRow> {
        self.by_nickname.get(nickname)
    }

    pub fn contains(&self, nickname: &str) -> bool {
        self.by_nickname.contains_key(nickname)
    }

    pub fn nicknames(&self) -> impl Iterator<Item = &str> {
        self.by_nickname.keys().map(String::as_str)
    }

    /// Number of distinct nicknames
    pub fn len(&self) -> usize {
        self.by_nickname.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_nickname.is_empty()
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Parse the leading integer of a cell.
///
/// Leading whitespace and a sign are accepted; parsing stops at the first
/// non-digit. Anything without digits, or out of range, is 0.
pub fn parse_points(cell: &str) -> i64 {
    let trimmed = cell.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return 0;
    }

    let digits = &rest[..digits_len];
    let parsed = if negative {
        format!("-{}", digits).parse::<i64>()
    } else {
        digits.parse::<i64>()
    };
    parsed.unwrap_or(0)
}

/// Quote a tab name for A1 notation (`'name'`, inner quotes doubled).
pub fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_parse_points_integer_prefix() {
        assert_eq!(parse_points("12"), 12);
        assert_eq!(parse_points(" 7 "), 7);
        assert_eq!(parse_points("3.9"), 3);
        assert_eq!(parse_points("12abc"), 12);
        assert_eq!(parse_points("-4"), -4);
        assert_eq!(parse_points("+5"), 5);
    }

    #[test]
    fn test_parse_points_garbage_is_zero() {
        assert_eq!(parse_points(""), 0);
        assert_eq!(parse_points("abc"), 0);
        assert_eq!(parse_points("-"), 0);
        assert_eq!(parse_points("99999999999999999999999"), 0);
    }

    #[test]
    fn test_snapshot_skips_header_and_indexes_rows() {
        let snapshot = RosterSnapshot::from_rows(vec![
            vec![json!("nickname"), json!("username"), json!("cekincki")],
            vec![json!("Ana"), json!("ana"), json!("15")],
            vec![json!("Bor"), json!("bor#0001")],
        ]);

        assert_eq!(snapshot.len(), 2);
        let ana = snapshot.get("Ana").unwrap();
        assert_eq!(ana.value, 15);
        assert_eq!(ana.row_index, 2);

        let bor = snapshot.get("Bor").unwrap();
        assert_eq!(bor.value, 0);
        assert_eq!(bor.username, "bor#0001");
        assert_eq!(bor.row_index, 3);

        assert!(!snapshot.contains("nickname"));
    }

    #[test]
    fn test_snapshot_skips_empty_nicknames() {
        let snapshot = RosterSnapshot::from_rows(vec![
            vec![json!("nickname")],
            vec![json!(""), json!("ghost"), json!("5")],
            vec![],
        ]);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_snapshot_duplicate_nickname_later_row_wins() {
        let snapshot = RosterSnapshot::from_rows(vec![
            vec![json!("nickname")],
            vec![json!("Ana"), json!("ana"), json!("1")],
            vec![json!("Ana"), json!("ana2"), json!("2")],
        ]);
        let ana = snapshot.get("Ana").unwrap();
        assert_eq!(ana.value, 2);
        assert_eq!(ana.row_index, 3);
    }

    #[test]
    fn test_snapshot_accepts_numeric_cells() {
        let snapshot = RosterSnapshot::from_rows(vec![
            vec![json!("nickname")],
            vec![json!("Ana"), json!("ana"), json!(40)],
        ]);
        assert_eq!(snapshot.get("Ana").unwrap().value, 40);
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("cekincki"), "'cekincki'");
        assert_eq!(quote_sheet_name("Ana's list"), "'Ana''s list'");
    }

    proptest! {
        #[test]
        fn parse_points_reads_back_any_integer(n in any::<i64>()) {
            prop_assert_eq!(parse_points(&n.to_string()), n);
        }

        #[test]
        fn parse_points_ignores_trailing_text(n in 0i64..1_000_000, tail in "[a-z .]{0,8}") {
            prop_assert_eq!(parse_points(&format!("{}{}", n, tail)), n);
        }
    }
}
