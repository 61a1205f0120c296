//! Sheets v4 REST backend

use crate::auth::AccessTokenSource;
use crate::backend::SheetBackend;
use crate::error::{SheetsError, SheetsResult};
use async_trait::async_trait;
use cekincki_types::quote_sheet_name;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    #[serde(default)]
    properties: Option<SheetProperties>,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// HTTP client for one spreadsheet
#[derive(Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("base_url", &self.base_url.as_str())
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish()
    }
}

impl SheetsClient {
    /// Create a client against the public Sheets API
    pub fn new(
        spreadsheet_id: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> SheetsResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Self::with_client(client, DEFAULT_SHEETS_API_BASE, spreadsheet_id, tokens)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> SheetsResult<Self> {
        let spreadsheet_id = spreadsheet_id.into();
        if spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::Config("SPREADSHEET_ID is not set".to_string()));
        }
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| SheetsError::Config(format!("Invalid Sheets API base: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SheetsError::Config(format!(
                "Invalid Sheets API base: {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            spreadsheet_id,
            tokens,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn spreadsheet_url(&self, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("spreadsheets");
            segments.extend(tail);
        }
        url
    }

    fn values_url(&self, range: &str) -> Url {
        self.spreadsheet_url(&[self.spreadsheet_id.as_str(), "values", range])
    }

    async fn authorized(&self, request: RequestBuilder) -> SheetsResult<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> SheetsResult<T> {
        let response = self.authorized(request).await?.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn row_range(tab: &str, row_index: u32) -> String {
    format!("{}!A{}:C{}", quote_sheet_name(tab), row_index, row_index)
}

fn table_range(tab: &str) -> String {
    format!("{}!A:C", quote_sheet_name(tab))
}

#[async_trait]
impl SheetBackend for SheetsClient {
    async fn tab_titles(&self) -> SheetsResult<Vec<String>> {
        let url = self.spreadsheet_url(&[self.spreadsheet_id.as_str()]);
        let meta: SpreadsheetMeta = self
            .send(
                self.client
                    .get(url)
                    .query(&[("fields", "sheets.properties.title")]),
            )
            .await?;

        Ok(meta
            .sheets
            .into_iter()
            .filter_map(|s| s.properties.map(|p| p.title))
            .collect())
    }

    async fn add_tab(&self, title: &str) -> SheetsResult<()> {
        let target = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = self.spreadsheet_url(&[target.as_str()]);
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let _: Value = self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn read_rows(&self, tab: &str) -> SheetsResult<Vec<Vec<Value>>> {
        let url = self.values_url(&table_range(tab));
        let range: ValueRange = self.send(self.client.get(url)).await?;
        Ok(range.values)
    }

    async fn write_row(&self, tab: &str, row_index: u32, row: Vec<Value>) -> SheetsResult<()> {
        let url = self.values_url(&row_range(tab, row_index));
        let body = json!({ "values": [row] });
        let _: Value = self
            .send(
                self.client
                    .put(url)
                    .query(&[("valueInputOption", "RAW")])
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn append_rows(&self, tab: &str, rows: Vec<Vec<Value>>) -> SheetsResult<()> {
        let url = self.values_url(&format!("{}:append", table_range(tab)));
        let body = json!({ "values": rows });
        let _: Value = self
            .send(
                self.client
                    .post(url)
                    .query(&[
                        ("valueInputOption", "RAW"),
                        ("insertDataOption", "INSERT_ROWS"),
                    ])
                    .json(&body),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    fn client(base: &str) -> SheetsClient {
        SheetsClient::with_client(
            Client::new(),
            base,
            "sheet-1",
            Arc::new(StaticToken("t".to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_values_url_quotes_tab() {
        let url = client("https://sheets.googleapis.com/v4").values_url(&table_range("cekincki"));
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-1/values/'cekincki'!A:C"
        );
    }

    #[test]
    fn test_row_range() {
        assert_eq!(row_range("cekincki", 7), "'cekincki'!A7:C7");
    }

    #[test]
    fn test_tab_with_space_is_percent_encoded() {
        let url = client("https://sheets.googleapis.com/v4/").values_url(&table_range("my tab"));
        assert!(url.as_str().ends_with("/values/'my%20tab'!A:C"));
    }

    #[test]
    fn test_empty_spreadsheet_id_rejected() {
        let result = SheetsClient::with_client(
            Client::new(),
            DEFAULT_SHEETS_API_BASE,
            " ",
            Arc::new(StaticToken("t".to_string())),
        );
        assert!(matches!(result, Err(SheetsError::Config(_))));
    }
}
