use crate::error::Res;
use crate::model::amount::normalize_amount;
use anyhow::{bail, ensure, Context};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// The date format used in forms and on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether money came in or went out.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A single income or expense belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) description: String,
    pub(crate) amount: f64,
    #[serde(with = "date_format")]
    pub(crate) date: NaiveDate,
    pub(crate) category: String,
    #[serde(rename = "type")]
    pub(crate) kind: TransactionType,
}

impl Transaction {
    /// Builds a `Transaction` from validated `input`.
    pub(crate) fn from_input(
        id: impl Into<String>,
        user_id: impl Into<String>,
        input: TransactionInput,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            description: input.description,
            amount: input.amount,
            date: input.date,
            category: input.category,
            kind: input.kind,
        }
    }

    /// Converts one raw record from the remote service into a `Transaction`.
    ///
    /// The amount never fails (see `normalize_amount`). The record is rejected if it is not an
    /// object, if `id` is missing, or if `date` or `type` cannot be understood.
    pub(crate) fn from_raw(record: &Value) -> Res<Self> {
        let obj = record
            .as_object()
            .with_context(|| format!("Expected a record object but got '{record}'"))?;
        let id = text_field(obj, "id").context("Record is missing 'id'")?;
        let user_id = text_field(obj, "userId")
            .or_else(|| text_field(obj, "user_id"))
            .unwrap_or_default();
        let description = text_field(obj, "description").unwrap_or_default();
        let category = text_field(obj, "category").unwrap_or_default();
        let date_text =
            text_field(obj, "date").with_context(|| format!("Record '{id}' is missing 'date'"))?;
        let date =
            parse_date(&date_text).with_context(|| format!("Record '{id}' has a bad date"))?;
        let kind_text =
            text_field(obj, "type").with_context(|| format!("Record '{id}' is missing 'type'"))?;
        let kind = TransactionType::from_str(kind_text.trim().to_lowercase().as_str())
            .map_err(|e| anyhow::anyhow!("Record '{id}' has an unknown type '{kind_text}': {e}"))?;
        Ok(Self {
            id,
            user_id,
            description,
            amount: normalize_amount(obj.get("amount")),
            date,
            category,
            kind,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// The fields a user fills in to create or edit a transaction. The `id` and `userId` are supplied
/// separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub description: String,
    pub amount: f64,
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl TransactionInput {
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        category: impl Into<String>,
        kind: TransactionType,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category: category.into(),
            kind,
        }
    }

    /// Checks the invariants that must hold before anything is sent to the remote service.
    pub(crate) fn validate(&self) -> Res<()> {
        ensure!(
            !self.description.trim().is_empty(),
            "The description must not be empty"
        );
        ensure!(
            self.amount.is_finite(),
            "The amount must be a number, got {}",
            self.amount
        );
        ensure!(
            self.amount >= 0.0,
            "The amount must not be negative, got {}",
            self.amount
        );
        if !crate::model::is_recommended(self.kind, &self.category) {
            tracing::debug!(
                "Category '{}' is not one of the recommended {} categories",
                self.category,
                self.kind
            );
        }
        Ok(())
    }
}

impl From<Transaction> for TransactionInput {
    fn from(t: Transaction) -> Self {
        Self {
            description: t.description,
            amount: t.amount,
            date: t.date,
            category: t.category,
            kind: t.kind,
        }
    }
}

/// Parses a date given either as `YYYY-MM-DD` or as a full ISO-8601 date-time, in which case only
/// the date part is kept.
pub fn parse_date(s: &str) -> Res<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    // Date-times without an offset, e.g. `2024-01-05T10:00:00`
    match s.split_once('T') {
        Some((date, _)) => NaiveDate::parse_from_str(date, DATE_FORMAT)
            .with_context(|| format!("Unable to parse date '{s}'")),
        None => bail!("Unable to parse date '{s}'"),
    }
}

/// Reads a field as text. Numbers are accepted because spreadsheet cells often come back numeric.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

mod date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_date(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_raw_owner_field() {
        let record = |extra: serde_json::Value| {
            let mut raw = json!({
                "id": "abc",
                "description": "Padaria",
                "amount": 12,
                "date": "2025-05-01",
                "category": "Alimentação",
                "type": "expense"
            });
            if let (Some(raw), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
                raw.extend(extra.clone());
            }
            Transaction::from_raw(&raw).unwrap()
        };
        assert_eq!(record(json!({ "userId": "u1" })).user_id(), "u1");
        assert_eq!(record(json!({ "user_id": "u2" })).user_id(), "u2");
        assert_eq!(record(json!({ "userId": "u1", "user_id": "u2" })).user_id(), "u1");
        assert_eq!(record(json!({})).user_id(), "");
    }

    #[test]
    fn test_from_raw_with_locale_amount() {
        let raw = json!({
            "id": "abc",
            "userId": "u1",
            "description": "Mercado",
            "amount": "1.234,56",
            "date": "2025-03-10T00:00:00.000Z",
            "category": "Alimentação",
            "type": "expense"
        });
        let t = Transaction::from_raw(&raw).unwrap();
        assert_eq!(t.id(), "abc");
        assert_eq!(t.user_id(), "u1");
        assert_eq!(t.amount(), 1234.56);
        assert_eq!(t.date(), date(2025, 3, 10));
        assert!(t.is_expense());
    }

    #[test]
    fn test_from_raw_numeric_id_and_uppercase_type() {
        let raw = json!({
            "id": 7,
            "userId": "u1",
            "description": "Salary",
            "amount": 3000,
            "date": "2025-01-05",
            "category": "Salário",
            "type": "Income"
        });
        let t = Transaction::from_raw(&raw).unwrap();
        assert_eq!(t.id(), "7");
        assert!(t.is_income());
        assert_eq!(t.amount(), 3000.0);
    }

    #[test]
    fn test_from_raw_rejects_non_object() {
        assert!(Transaction::from_raw(&json!("hello")).is_err());
        assert!(Transaction::from_raw(&json!(12)).is_err());
    }

    #[test]
    fn test_from_raw_rejects_unknown_type() {
        let raw = json!({"id": "1", "date": "2025-01-01", "type": "transfer", "amount": 1});
        let err = Transaction::from_raw(&raw).unwrap_err();
        assert!(format!("{err:#}").contains("transfer"));
    }

    #[test]
    fn test_from_raw_rejects_missing_id() {
        let raw = json!({"date": "2025-01-01", "type": "income", "amount": 1});
        assert!(Transaction::from_raw(&raw).is_err());
    }

    #[test]
    fn test_serialize_wire_shape() {
        let input = TransactionInput::new(
            "Bus",
            4.4,
            date(2025, 2, 1),
            "Transporte",
            TransactionType::Expense,
        );
        let t = Transaction::from_input("id-1", "u1", input);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(
            v,
            json!({
                "id": "id-1",
                "userId": "u1",
                "description": "Bus",
                "amount": 4.4,
                "date": "2025-02-01",
                "category": "Transporte",
                "type": "expense"
            })
        );
    }

    #[test]
    fn test_parse_date_variants() {
        assert_eq!(parse_date("2024-12-31").unwrap(), date(2024, 12, 31));
        assert_eq!(parse_date("2024-12-31T23:00:00Z").unwrap(), date(2024, 12, 31));
        assert_eq!(parse_date("2024-12-31T10:00:00").unwrap(), date(2024, 12, 31));
        assert!(parse_date("31/12/2024").is_err());
    }

    #[test]
    fn test_validate() {
        let ok = TransactionInput::new(
            "Rent",
            1500.0,
            date(2025, 1, 1),
            "Moradia",
            TransactionType::Expense,
        );
        assert!(ok.validate().is_ok());

        let mut blank = ok.clone();
        blank.description = "  ".into();
        assert!(blank.validate().is_err());

        let mut negative = ok.clone();
        negative.amount = -1.0;
        assert!(negative.validate().is_err());

        let mut nan = ok;
        nan.amount = f64::NAN;
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_type_display_and_parse() {
        assert_eq!(TransactionType::Income.to_string(), "income");
        assert_eq!(
            TransactionType::from_str("expense").unwrap(),
            TransactionType::Expense
        );
        assert!(TransactionType::from_str("other").is_err());
    }
}
