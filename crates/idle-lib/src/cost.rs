//! Last-30-day cost lookup through the Cost Management query API
//!
//! Costs are grouped by resource id and summed over a fixed trailing
//! 30-day window. Cost data is advisory: a failed continuation page keeps
//! the rows already fetched, and a response without usable columns yields
//! an empty index.

use crate::error::{Result, ScanError};
use crate::transport::{invoke_json, render_command, AzTransport};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Cost Management API version used for queries
pub const COST_API_VERSION: &str = "2025-03-01";

/// Resource id (lower-cased) to trailing-30-day cost
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostIndex {
    costs: HashMap<String, f64>,
    currency: Option<String>,
}

impl CostIndex {
    /// Index with no rows and no currency
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index from a column list and data rows
    ///
    /// Columns are resolved by name so a change in column order does not
    /// break parsing.
    pub fn from_table(columns: &[Column], rows: &[Vec<Value>]) -> Self {
        let Some(layout) = ColumnLayout::resolve(columns) else {
            debug!(?columns, "Cost response lacks cost or resource id column");
            return Self::empty();
        };

        let mut index = Self::empty();
        for row in rows {
            if index.currency.is_none() {
                index.currency = layout
                    .currency
                    .and_then(|i| row.get(i))
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string);
            }

            let Some(resource_id) = row.get(layout.resource_id).and_then(cell_text) else {
                continue;
            };
            let cost = row.get(layout.cost).and_then(cell_number).unwrap_or(0.0);
            index.costs.insert(resource_id.to_lowercase(), cost);
        }
        index
    }

    /// Cost for a resource id, ignoring case
    pub fn get(&self, resource_id: &str) -> Option<f64> {
        if resource_id.is_empty() {
            return None;
        }
        self.costs.get(&resource_id.to_lowercase()).copied()
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Insert a cost directly
    pub fn insert(&mut self, resource_id: &str, cost: f64) {
        self.costs.insert(resource_id.to_lowercase(), cost);
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// Column descriptor from the query response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// One page of a query response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub properties: QueryProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProperties {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    cost: usize,
    resource_id: usize,
    currency: Option<usize>,
}

impl ColumnLayout {
    fn resolve(columns: &[Column]) -> Option<Self> {
        let mut cost = None;
        let mut resource_id = None;
        let mut currency = None;

        for (i, column) in columns.iter().enumerate() {
            let name = column.name.as_deref().unwrap_or_default().to_lowercase();
            match name.as_str() {
                "pretaxcost" | "cost" if cost.is_none() => cost = Some(i),
                "resourceid" if resource_id.is_none() => resource_id = Some(i),
                "currency" if currency.is_none() => currency = Some(i),
                _ => {}
            }
        }

        Some(Self {
            cost: cost?,
            resource_id: resource_id?,
            currency,
        })
    }
}

fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Query body: usage cost summed per resource id over the last 30 days
pub fn query_body() -> Value {
    json!({
        "type": "Usage",
        "timeframe": "Last30Days",
        "dataset": {
            "granularity": "None",
            "aggregation": {
                "totalCost": { "name": "PreTaxCost", "function": "Sum" }
            },
            "grouping": [
                { "type": "Dimension", "name": "ResourceId" }
            ]
        }
    })
}

/// Query endpoint for a subscription
pub fn query_url(subscription_id: &str) -> String {
    format!(
        "https://management.azure.com/subscriptions/{subscription_id}/providers/Microsoft.CostManagement/query?api-version={COST_API_VERSION}"
    )
}

/// Cost lookup bound to a transport
pub struct CostLookup<'a> {
    transport: &'a dyn AzTransport,
}

impl<'a> CostLookup<'a> {
    pub fn new(transport: &'a dyn AzTransport) -> Self {
        Self { transport }
    }

    /// Fetch the cost index for a subscription
    ///
    /// Fails only when the first page fails; continuation failures stop
    /// pagination and keep what was accumulated.
    pub async fn last_30_days(&self, subscription_id: &str) -> Result<CostIndex> {
        let body = query_body().to_string();

        let first = self.fetch_page(&query_url(subscription_id), &body).await?;
        let mut columns = first.properties.columns;
        let mut rows = first.properties.rows;
        let mut next_link = first.properties.next_link.filter(|l| !l.is_empty());
        let mut pages = 1usize;
        let mut visited = HashSet::new();

        while let Some(link) = next_link.take() {
            if !visited.insert(link.clone()) {
                warn!(
                    subscription_id = %subscription_id,
                    pages,
                    next_link = %link,
                    "Cost pagination returned a repeated link, stopping"
                );
                break;
            }
            match self.fetch_page(&link, &body).await {
                Ok(page) => {
                    pages += 1;
                    if columns.is_empty() {
                        columns = page.properties.columns;
                    }
                    rows.extend(page.properties.rows);
                    next_link = page.properties.next_link.filter(|l| !l.is_empty());
                }
                Err(err) => {
                    warn!(
                        subscription_id = %subscription_id,
                        pages,
                        error = %err.summary_line(),
                        "Cost pagination stopped early, using partial rows"
                    );
                }
            }
        }

        let index = CostIndex::from_table(&columns, &rows);
        debug!(
            subscription_id = %subscription_id,
            pages,
            rows = rows.len(),
            resources = index.len(),
            currency = ?index.currency(),
            "Cost index built"
        );
        Ok(index)
    }

    async fn fetch_page(&self, uri: &str, body: &str) -> Result<QueryPage> {
        let args = vec![
            "rest".to_string(),
            "--method".to_string(),
            "post".to_string(),
            "--uri".to_string(),
            uri.to_string(),
            "--body".to_string(),
            body.to_string(),
            "-o".to_string(),
            "json".to_string(),
        ];
        let value: Value = invoke_json(self.transport, &args).await?;
        // `az rest` prints nothing for an empty body, which decodes as `[]`
        if value.as_array().is_some_and(Vec::is_empty) {
            return Ok(QueryPage::default());
        }
        serde_json::from_value(value).map_err(|source| ScanError::Decode {
            command: render_command(&args),
            source,
        })
    }
}
