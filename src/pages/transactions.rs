use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ApiError;
use crate::i18n;
use crate::models::{Transaction, TransactionStatus};
use crate::pages::{rupiah, StoreBotSelector};
use crate::services::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TransactionStatus),
}

impl StatusFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => tx.status == *status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransactionSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Sum of completed amounts only.
    pub revenue: f64,
}

impl TransactionSummary {
    pub fn of(transactions: &[Transaction]) -> Self {
        let completed: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed)
            .collect();
        Self {
            total: transactions.len(),
            completed: completed.len(),
            pending: transactions
                .iter()
                .filter(|t| t.status == TransactionStatus::Pending)
                .count(),
            revenue: completed.iter().map(|t| t.amount).sum(),
        }
    }
}

pub struct TransactionsPage {
    api: Arc<ApiClient>,
    pub store_bots: StoreBotSelector,
    pub transactions: Vec<Transaction>,
    pub filter: StatusFilter,
}

impl TransactionsPage {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            store_bots: StoreBotSelector::default(),
            transactions: Vec::new(),
            filter: StatusFilter::All,
        }
    }

    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.store_bots = StoreBotSelector::load(&self.api).await?;
        self.refresh().await
    }

    pub async fn select_bot(&mut self, bot_id: i64) -> Result<bool, ApiError> {
        if !self.store_bots.select(bot_id) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        match self.store_bots.selected() {
            Some(bot_id) => self.transactions = self.api.transactions(bot_id).await?,
            None => self.transactions.clear(),
        }
        Ok(())
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn visible(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |t| self.filter.matches(t))
    }

    /// Stats always cover the whole list, whatever the filter.
    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary::of(&self.transactions)
    }

    pub fn render(&self) -> String {
        let locale = self.api.locale();
        let summary = self.summary();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Transaksi: total={} selesai={} pending={} pendapatan={}",
            summary.total,
            summary.completed,
            summary.pending,
            rupiah(summary.revenue),
        );
        for tx in self.visible() {
            let _ = writeln!(
                out,
                "#{:<6} {:<28} {:>14} {:<12} {:<8} {}",
                tx.id,
                tx.product_name,
                rupiah(tx.amount),
                i18n::status_label(locale, tx.status.as_str()),
                tx.payment_method.as_deref().unwrap_or("-"),
                tx.created_at,
            );
        }
        out
    }
}
