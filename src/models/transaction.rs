use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment state of a transaction. Statuses this dashboard does not know
/// (e.g. `expired`) decode into `Other` with the raw value kept for display.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Completed,
    Cancelled,
    Other(String),
}

impl TransactionStatus {
    pub const KNOWN: [TransactionStatus; 4] = [
        TransactionStatus::Pending,
        TransactionStatus::Paid,
        TransactionStatus::Completed,
        TransactionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => TransactionStatus::Pending,
            "paid" => TransactionStatus::Paid,
            "completed" => TransactionStatus::Completed,
            "cancelled" => TransactionStatus::Cancelled,
            _ => TransactionStatus::Other(raw),
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the known statuses parse; used for filter input.
impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::KNOWN
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown transaction status: {s}"))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub bot_id: i64,
    pub user_id: i64,
    pub product_name: String,
    pub amount: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
}
