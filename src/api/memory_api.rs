//! Implements `TransactionApi` with in-memory data that mimics the spreadsheet proxy, including its
//! quirks: amounts are stored as locale-formatted strings, dates as ISO date-times, lists may come
//! back wrapped in an envelope, and not-found is indistinguishable from belonging to another user.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a backend.

use crate::api::TransactionApi;
use crate::error::{Error, ErrorType, Res, Result};
use crate::model::{format_amount, Transaction};
use crate::normalize::RawResponse;
use anyhow::Context;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::io::Cursor;
use tokio::sync::Mutex;
use tracing::trace;

/// How `list` wraps its records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// A bare array.
    #[default]
    Array,
    /// `{"data": [...]}`
    Envelope,
}

/// A failure that the next call will produce instead of doing its work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Timeout,
    Network,
    /// Answer with an HTML page, as a misconfigured endpoint does.
    Html,
}

#[derive(Debug, Default)]
struct Inner {
    /// Rows in sheet order, as JSON objects with the wire field names.
    rows: Vec<Map<String, Value>>,
    failures: VecDeque<Failure>,
    shape: ListShape,
    calls: usize,
    next_id: u64,
}

/// An in-memory stand-in for the spreadsheet proxy.
#[derive(Debug, Default)]
pub struct MemoryApi {
    inner: Mutex<Inner>,
}

impl MemoryApi {
    /// Creates a `MemoryApi` holding `transactions`, stored the way the spreadsheet stores them.
    pub fn new<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let rows = transactions.into_iter().map(to_row).collect();
        Self {
            inner: Mutex::new(Inner {
                rows,
                ..Inner::default()
            }),
        }
    }

    /// Creates a `MemoryApi` seeded with the demo data from this module.
    pub fn seeded() -> Res<Self> {
        let rows = load_csv(SEED_DATA)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                rows,
                ..Inner::default()
            }),
        })
    }

    /// Makes the next calls fail, in order, one failure per call.
    pub async fn fail_next(&self, failure: Failure) {
        self.inner.lock().await.failures.push_back(failure);
    }

    pub async fn set_list_shape(&self, shape: ListShape) {
        self.inner.lock().await.shape = shape;
    }

    /// The number of calls received, including those that failed.
    pub async fn calls(&self) -> usize {
        self.inner.lock().await.calls
    }

    /// The stored rows for `user_id`, normalized.
    pub async fn stored(&self, user_id: &str) -> Vec<Transaction> {
        let inner = self.inner.lock().await;
        inner
            .rows
            .iter()
            .filter(|row| owned_by(row, user_id))
            .filter_map(|row| Transaction::from_raw(&Value::Object(row.clone())).ok())
            .collect()
    }
}

impl Inner {
    /// Counts the call and returns the injected failure, if any.
    fn begin(&mut self, what: &str) -> Result<Option<RawResponse>> {
        self.calls += 1;
        trace!("MemoryApi {what} (call {})", self.calls);
        match self.failures.pop_front() {
            None => Ok(None),
            Some(Failure::Html) => Ok(Some(RawResponse::Html(
                "<!DOCTYPE html><html><body>Cannot GET</body></html>".to_string(),
            ))),
            Some(Failure::Timeout) => Err(Error::msg(
                ErrorType::Timeout,
                format!("Failed to {what}: timed out"),
            )),
            Some(Failure::Network) => Err(Error::msg(
                ErrorType::Network,
                format!("Failed to {what}: connection reset"),
            )),
        }
    }

    fn position(&self, id: &str, user_id: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| owned_by(row, user_id) && row.get("id") == Some(&json!(id)))
    }
}

#[async_trait::async_trait]
impl TransactionApi for MemoryApi {
    async fn list(&self, user_id: &str) -> Result<RawResponse> {
        let mut inner = self.inner.lock().await;
        if let Some(early) = inner.begin("list transactions")? {
            return Ok(early);
        }
        let records: Vec<Value> = inner
            .rows
            .iter()
            .filter(|row| owned_by(row, user_id))
            .cloned()
            .map(Value::Object)
            .collect();
        Ok(match inner.shape {
            ListShape::Array => RawResponse::Records(records),
            ListShape::Envelope => RawResponse::Envelope(records),
        })
    }

    async fn create(&self, transaction: &Transaction) -> Result<RawResponse> {
        let mut inner = self.inner.lock().await;
        if let Some(early) = inner.begin("create a transaction")? {
            return Ok(early);
        }
        let mut row = to_row(transaction);
        if transaction.id().is_empty() {
            inner.next_id += 1;
            row.insert("id".to_string(), json!(format!("row-{}", inner.next_id)));
        }
        inner.rows.push(row.clone());
        Ok(RawResponse::Records(vec![Value::Object(row)]))
    }

    async fn update(
        &self,
        id: &str,
        user_id: &str,
        transaction: &Transaction,
    ) -> Result<RawResponse> {
        let mut inner = self.inner.lock().await;
        if let Some(early) = inner.begin("update a transaction")? {
            return Ok(early);
        }
        let Some(ix) = inner.position(id, user_id) else {
            return Ok(RawResponse::Records(Vec::new()));
        };
        let mut row = to_row(transaction);
        row.insert("id".to_string(), json!(id));
        row.insert("userId".to_string(), json!(user_id));
        inner.rows[ix] = row.clone();
        Ok(RawResponse::Records(vec![Value::Object(row)]))
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<RawResponse> {
        let mut inner = self.inner.lock().await;
        if let Some(early) = inner.begin("delete a transaction")? {
            return Ok(early);
        }
        let deleted = match inner.position(id, user_id) {
            Some(ix) => {
                inner.rows.remove(ix);
                1
            }
            None => 0,
        };
        Ok(RawResponse::from_value(json!({ "deleted": deleted })))
    }
}

fn owned_by(row: &Map<String, Value>, user_id: &str) -> bool {
    row.get("userId").and_then(Value::as_str) == Some(user_id)
}

/// Stores a transaction the way the spreadsheet renders it.
fn to_row(t: &Transaction) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("id".to_string(), json!(t.id()));
    row.insert("userId".to_string(), json!(t.user_id()));
    row.insert("description".to_string(), json!(t.description()));
    row.insert("amount".to_string(), json!(format_amount(t.amount())));
    row.insert(
        "date".to_string(),
        json!(format!("{}T00:00:00.000Z", t.date().format("%Y-%m-%d"))),
    );
    row.insert("category".to_string(), json!(t.category()));
    row.insert("type".to_string(), json!(t.kind().to_string()));
    row
}

/// Loads rows from a CSV-formatted string whose header row holds the wire field names.
fn load_csv(csv_data: &str) -> Res<Vec<Map<String, Value>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    let headers = rdr.headers().context("Seed data has no header row")?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to read a seed data row")?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, field)| (header.to_string(), json!(field)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Seed data for the `demo` user.
const SEED_DATA: &str = r##"id,userId,description,amount,date,category,type
seed-01,demo,Salário mensal,"5.200,00",2025-10-01T00:00:00.000Z,Salário,income
seed-02,demo,Aluguel,"1.850,00",2025-10-02T00:00:00.000Z,Moradia,expense
seed-03,demo,Supermercado,"412,37",2025-10-04T00:00:00.000Z,Alimentação,expense
seed-04,demo,Projeto freelance,"1.200,00",2025-10-06T00:00:00.000Z,Freelance,income
seed-05,demo,Ônibus,"88,00",2025-10-07T00:00:00.000Z,Transporte,expense
seed-06,demo,Farmácia,"64,90",2025-10-09T00:00:00.000Z,Saúde,expense
seed-07,demo,Cinema,"56,00",2025-10-11T00:00:00.000Z,Lazer,expense
seed-08,demo,Conta de luz,"173,45",2025-10-12T00:00:00.000Z,Contas,expense
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TransactionInput, TransactionType};
    use crate::normalize::normalize;
    use chrono::NaiveDate;

    fn transaction(id: &str, user_id: &str, amount: f64) -> Transaction {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Transaction::from_input(
            id,
            user_id,
            TransactionInput::new("Lunch", amount, date, "Alimentação", TransactionType::Expense),
        )
    }

    #[tokio::test]
    async fn test_seeded_rows_normalize() {
        let api = MemoryApi::seeded().unwrap();
        let list = normalize(api.list("demo").await.unwrap()).unwrap();
        assert_eq!(list.len(), 8);
        assert_eq!(list[0].id(), "seed-01");
        assert_eq!(list[0].amount(), 5200.0);
        assert_eq!(list[2].amount(), 412.37);
        assert!(normalize(api.list("nobody").await.unwrap())
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_amounts_are_stored_locale_formatted() {
        let api = MemoryApi::new(&[transaction("a", "u1", 1234.5)]);
        let RawResponse::Records(records) = api.list("u1").await.unwrap() else {
            panic!("expected records");
        };
        assert_eq!(records[0]["amount"], json!("1.234,50"));
        assert_eq!(records[0]["date"], json!("2025-06-01T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let api = MemoryApi::new(&[transaction("a", "u1", 1.0)]);
        api.set_list_shape(ListShape::Envelope).await;
        assert!(matches!(
            api.list("u1").await.unwrap(),
            RawResponse::Envelope(r) if r.len() == 1
        ));
    }

    #[tokio::test]
    async fn test_create_assigns_server_id_when_missing() {
        let api = MemoryApi::default();
        let created = normalize(api.create(&transaction("", "u1", 5.0)).await.unwrap()).unwrap();
        assert_eq!(created[0].id(), "row-1");
        let kept = normalize(api.create(&transaction("mine", "u1", 5.0)).await.unwrap()).unwrap();
        assert_eq!(kept[0].id(), "mine");
    }

    #[tokio::test]
    async fn test_update_other_users_row_is_empty() {
        let api = MemoryApi::new(&[transaction("a", "u1", 1.0)]);
        let raw = api.update("a", "u2", &transaction("a", "u2", 9.0)).await.unwrap();
        assert_eq!(raw, RawResponse::Records(vec![]));
        assert_eq!(api.stored("u1").await[0].amount(), 1.0);
    }

    #[tokio::test]
    async fn test_delete_reports_count() {
        let api = MemoryApi::new(&[transaction("a", "u1", 1.0)]);
        let missing = api.delete("a", "u2").await.unwrap();
        assert_eq!(missing.field("deleted"), Some(&json!(0)));
        let found = api.delete("a", "u1").await.unwrap();
        assert_eq!(found.field("deleted"), Some(&json!(1)));
        assert!(api.stored("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_consumed_in_order() {
        let api = MemoryApi::default();
        api.fail_next(Failure::Timeout).await;
        api.fail_next(Failure::Html).await;
        let err = api.list("u1").await.unwrap_err();
        assert!(err.is(ErrorType::Timeout));
        assert!(api.list("u1").await.unwrap().is_html());
        assert_eq!(api.list("u1").await.unwrap(), RawResponse::Records(vec![]));
        assert_eq!(api.calls().await, 3);
    }
}
