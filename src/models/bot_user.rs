use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BotUser {
    pub id: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub telegram_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_blocked: bool,
    pub created_at: Option<String>,
}

impl BotUser {
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            "-".to_string()
        } else {
            full
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BotUsersResponse {
    pub users: Vec<BotUser>,
}

// Telegram ids arrive as JSON numbers from some backends and strings from others.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected telegram id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telegram_id_accepts_numbers_and_strings() {
        let numeric: BotUser = serde_json::from_str(
            r#"{"id":1,"telegram_id":123456789,"username":"ana","first_name":"Ana","last_name":null,"is_blocked":false,"created_at":null}"#,
        )
        .unwrap();
        assert_eq!(numeric.telegram_id, "123456789");

        let textual: BotUser = serde_json::from_str(
            r#"{"id":2,"telegram_id":"987","username":null,"first_name":null,"last_name":null,"created_at":null}"#,
        )
        .unwrap();
        assert_eq!(textual.telegram_id, "987");
        assert!(!textual.is_blocked);
        assert_eq!(textual.display_name(), "-");
    }
}
