use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotType {
    #[default]
    Store,
    Sheerid,
    Custom,
}

impl BotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotType::Store => "store",
            BotType::Sheerid => "sheerid",
            BotType::Custom => "custom",
        }
    }
}

impl fmt::Display for BotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "store" => Ok(BotType::Store),
            "sheerid" => Ok(BotType::Sheerid),
            "custom" => Ok(BotType::Custom),
            other => Err(format!("unknown bot type: {other}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Bot {
    pub id: i64,
    pub bot_username: String,
    pub bot_name: String,
    #[serde(default)]
    pub bot_type: BotType,
    pub is_active: bool,
    #[serde(default)]
    pub products_count: i64,
    #[serde(default)]
    pub users_count: i64,
    #[serde(default)]
    pub transactions_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BotDetails {
    pub id: i64,
    pub bot_username: String,
    pub bot_name: String,
    #[serde(default)]
    pub bot_type: BotType,
    pub pakasir_slug: Option<String>,
    /// Masked by the backend; only its presence is meaningful.
    pub pakasir_api_key: Option<String>,
    pub is_active: bool,
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BotStats {
    #[serde(default)]
    pub total_products: i64,
    #[serde(default)]
    pub total_users: i64,
    #[serde(default)]
    pub total_transactions: i64,
    #[serde(default)]
    pub total_revenue: f64,
}

#[derive(Debug, Deserialize)]
pub struct BotsResponse {
    pub bots: Vec<Bot>,
}

#[derive(Debug, Deserialize)]
pub struct BotResponse {
    pub bot: Bot,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BotDetailResponse {
    pub bot: BotDetails,
    #[serde(default)]
    pub stats: BotStats,
}

#[derive(Debug, Serialize)]
pub struct CreateBotRequest {
    pub telegram_token: String,
    pub bot_type: BotType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pakasir_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pakasir_api_key: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct UpdateBotRequest {
    pub bot_name: String,
    pub bot_type: BotType,
    /// Serialized as `null` to clear the slug.
    pub pakasir_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pakasir_api_key: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PakasirTestResult {
    #[serde(default)]
    pub valid: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PakasirTestRequest<'a> {
    pub slug: &'a str,
    pub api_key: &'a str,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Broadcast {
    pub id: i64,
    pub message: String,
    #[serde(default)]
    pub sent_count: i64,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastsResponse {
    pub broadcasts: Vec<Broadcast>,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastResponse {
    pub broadcast: Broadcast,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: Option<String>,
}
