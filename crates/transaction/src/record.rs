//! Transaction Record

use crate::TransactionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the field holding the transaction amount
pub const AMOUNT_FIELD: &str = "Amount";
/// Name of the field holding the seconds offset of the transaction
pub const TIME_FIELD: &str = "Time";
/// Name of the optional display identifier
pub const ID_FIELD: &str = "id";

/// A transaction submitted for scoring.
///
/// Fields map feature names to numeric values. Fields the scorer does not
/// know are kept for display and explanation. Serialized as a flat object,
/// e.g. `{"id": "t-1", "Amount": 12.5, "V2": 3.6}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(flatten)]
    fields: BTreeMap<String, f64>,
}

impl Transaction {
    /// Create an empty transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transaction from `(name, value)` pairs
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            id: None,
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse a comma separated `key=value` query such as `Amount=120.5, V2=3.6`.
    ///
    /// An `id=...` pair sets the identifier instead of a numeric field.
    pub fn from_query(query: &str) -> Result<Self, TransactionError> {
        let mut transaction = Self::new();

        for pair in query.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| TransactionError::InvalidPair(pair.to_string()))?;
            let (key, value) = (key.trim(), value.trim());

            if key.is_empty() {
                return Err(TransactionError::EmptyField);
            }
            if key.eq_ignore_ascii_case(ID_FIELD) {
                transaction.id = Some(value.to_string());
                continue;
            }

            let parsed = value.parse::<f64>().map_err(|_| TransactionError::NonNumeric {
                field: key.to_string(),
                value: value.to_string(),
            })?;
            transaction.fields.insert(key.to_string(), parsed);
        }

        Ok(transaction)
    }

    /// Attach a display identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add or replace a field before submission
    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Display identifier, if one was supplied
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Value of a field
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }

    /// Whether the transaction carries a field
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// The `Amount` field
    pub fn amount(&self) -> Option<f64> {
        self.get(AMOUNT_FIELD)
    }

    /// All fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, f64)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of numeric fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromStr for Transaction {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_query(s)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");

        match &self.id {
            Some(id) => write!(f, "[{}] {}", id, fields),
            None => write!(f, "{}", fields),
        }
    }
}
