//! Dashboard pages: local state plus the operations each screen performs
//! against the backend. Nothing here outlives the page; the backend owns
//! every record.

pub mod bot_detail;
pub mod bots;
pub mod commands;
pub mod products;
pub mod transactions;
pub mod users;
pub mod verification;
pub mod verification_history;

use crate::models::{Bot, BotType};
use crate::services::{ApiClient, ApiResult};

/// Store-type bots with one of them selected, shared by the store pages.
#[derive(Debug, Clone, Default)]
pub struct StoreBotSelector {
    bots: Vec<Bot>,
    selected: Option<i64>,
}

impl StoreBotSelector {
    pub async fn load(api: &ApiClient) -> ApiResult<Self> {
        Ok(Self::from_bots(api.bots().await?))
    }

    /// Keeps store bots only and selects the first one.
    pub fn from_bots(bots: Vec<Bot>) -> Self {
        let bots: Vec<Bot> = bots
            .into_iter()
            .filter(|b| b.bot_type == BotType::Store)
            .collect();
        let selected = bots.first().map(|b| b.id);
        Self { bots, selected }
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn selected_bot(&self) -> Option<&Bot> {
        let id = self.selected?;
        self.bots.iter().find(|b| b.id == id)
    }

    pub fn select(&mut self, bot_id: i64) -> bool {
        if self.bots.iter().any(|b| b.id == bot_id) {
            self.selected = Some(bot_id);
            true
        } else {
            false
        }
    }
}

/// Formats an amount the way the dashboard shows money: `Rp 1.250.000`.
pub fn rupiah(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match frac {
        0 => format!("Rp {sign}{grouped}"),
        f if f % 10 == 0 => format!("Rp {sign}{grouped},{}", f / 10),
        f => format!("Rp {sign}{grouped},{f:02}"),
    }
}
