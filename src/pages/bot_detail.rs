use std::fmt::Write;
use std::sync::Arc;

use crate::error::ApiError;
use crate::i18n;
use crate::models::{BotDetails, BotStats, BotType, PakasirTestResult, UpdateBotRequest};
use crate::pages::bots::test_failure_message;
use crate::pages::rupiah;
use crate::services::ApiClient;

/// Placeholder sent to the Pakasir test when only the stored key exists.
const STORED_KEY_PLACEHOLDER: &str = "existing";

/// Editable copy of a bot's settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotSettingsForm {
    pub bot_name: String,
    pub bot_type: BotType,
    pub pakasir_slug: String,
    /// Empty keeps the stored key.
    pub pakasir_api_key: String,
    pub is_active: bool,
}

impl BotSettingsForm {
    fn from_bot(bot: &BotDetails) -> Self {
        Self {
            bot_name: bot.bot_name.clone(),
            bot_type: bot.bot_type,
            pakasir_slug: bot.pakasir_slug.clone().unwrap_or_default(),
            pakasir_api_key: String::new(),
            is_active: bot.is_active,
        }
    }

    pub fn to_request(&self) -> UpdateBotRequest {
        UpdateBotRequest {
            bot_name: self.bot_name.clone(),
            bot_type: self.bot_type,
            pakasir_slug: (!self.pakasir_slug.is_empty()).then(|| self.pakasir_slug.clone()),
            pakasir_api_key: (!self.pakasir_api_key.is_empty())
                .then(|| self.pakasir_api_key.clone()),
            is_active: self.is_active,
        }
    }
}

pub struct BotDetailPage {
    api: Arc<ApiClient>,
    bot_id: i64,
    pub bot: Option<BotDetails>,
    pub stats: BotStats,
    pub form: BotSettingsForm,
    pub error: Option<String>,
    pub success: Option<String>,
    pub pakasir_test: Option<PakasirTestResult>,
    pub deleted: bool,
}

impl BotDetailPage {
    pub fn new(api: Arc<ApiClient>, bot_id: i64) -> Self {
        Self {
            api,
            bot_id,
            bot: None,
            stats: BotStats::default(),
            form: BotSettingsForm::default(),
            error: None,
            success: None,
            pakasir_test: None,
            deleted: false,
        }
    }

    pub fn bot_id(&self) -> i64 {
        self.bot_id
    }

    /// Loads the bot and its stats and resets the form to the stored values.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let detail = self.api.bot(self.bot_id).await?;
        self.form = BotSettingsForm::from_bot(&detail.bot);
        self.stats = detail.stats;
        self.bot = Some(detail.bot);
        Ok(())
    }

    pub async fn save(&mut self) -> Result<(), ApiError> {
        self.error = None;
        self.success = None;

        if let Err(e) = self.api.update_bot(self.bot_id, &self.form.to_request()).await {
            self.error = Some(e.message(self.api.locale()));
            return Err(e);
        }

        self.success = Some(i18n::settings_saved(self.api.locale()).to_string());
        self.load().await
    }

    pub async fn delete(&mut self) -> Result<(), ApiError> {
        match self.api.delete_bot(self.bot_id).await {
            Ok(_) => {
                self.deleted = true;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.message(self.api.locale()));
                Err(e)
            }
        }
    }

    /// Tests Pakasir with the form's slug (or the stored one) and the newly
    /// typed key, falling back to the stored key when one exists.
    pub async fn test_pakasir(&mut self) -> &PakasirTestResult {
        let locale = self.api.locale();
        let stored = self.bot.as_ref();

        let slug = if self.form.pakasir_slug.is_empty() {
            stored
                .and_then(|b| b.pakasir_slug.clone())
                .unwrap_or_default()
        } else {
            self.form.pakasir_slug.clone()
        };
        let has_stored_key = stored
            .and_then(|b| b.pakasir_api_key.as_deref())
            .is_some_and(|k| !k.is_empty());

        let refusal = if slug.is_empty() {
            Some(i18n::pakasir_slug_missing(locale))
        } else if self.form.pakasir_api_key.is_empty() && !has_stored_key {
            Some(i18n::pakasir_key_missing(locale))
        } else {
            None
        };

        let result = match refusal {
            Some(message) => PakasirTestResult {
                valid: false,
                error: Some(message.to_string()),
                ..Default::default()
            },
            None => {
                let key = if self.form.pakasir_api_key.is_empty() {
                    STORED_KEY_PLACEHOLDER
                } else {
                    self.form.pakasir_api_key.as_str()
                };
                match self.api.test_pakasir(&slug, key).await {
                    Ok(result) => result,
                    Err(e) => PakasirTestResult {
                        valid: false,
                        error: Some(test_failure_message(&e, locale)),
                        ..Default::default()
                    },
                }
            }
        };
        self.pakasir_test.insert(result)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let Some(bot) = &self.bot else {
            let _ = writeln!(out, "Bot #{} tidak ditemukan", self.bot_id);
            return out;
        };

        let _ = writeln!(out, "{} (@{})", bot.bot_name, bot.bot_username);
        let _ = writeln!(out, "  tipe        : {}", bot.bot_type);
        let _ = writeln!(out, "  status      : {}", if bot.is_active { "aktif" } else { "nonaktif" });
        let _ = writeln!(out, "  pakasir slug: {}", bot.pakasir_slug.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "  pakasir key : {}", bot.pakasir_api_key.as_deref().unwrap_or("-"));
        let _ = writeln!(
            out,
            "  produk={} user={} transaksi={} pendapatan={}",
            self.stats.total_products,
            self.stats.total_users,
            self.stats.total_transactions,
            rupiah(self.stats.total_revenue),
        );
        if let Some(success) = &self.success {
            let _ = writeln!(out, "{success}");
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "! {error}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use crate::testing::spawn_backend;
    use actix_web::{web, HttpResponse};
    use serde_json::{json, Value};

    async fn detail() -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "bot": {
                "id": 5, "bot_username": "tokobot", "bot_name": "Toko", "bot_type": "store",
                "pakasir_slug": "toko-slug", "pakasir_api_key": "****abcd", "is_active": true
            },
            "stats": { "total_products": 2, "total_revenue": 150000 }
        }))
    }

    async fn pakasir(body: web::Json<Value>) -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "valid": body["api_key"] == "existing",
            "message": body["slug"],
        }))
    }

    async fn update(body: web::Json<Value>) -> HttpResponse {
        if body["bot_name"] == "" {
            return HttpResponse::BadRequest().json(json!({ "error": "Nama bot wajib diisi" }));
        }
        HttpResponse::Ok().json(json!({ "bot": {
            "id": 5, "bot_username": "tokobot", "bot_name": body["bot_name"], "bot_type": "store",
            "is_active": body["is_active"]
        }}))
    }

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/api/bots/5", web::get().to(detail))
            .route("/api/bots/5", web::put().to(update))
            .route("/api/pakasir/test", web::post().to(pakasir));
    }

    #[test]
    fn blank_key_is_not_sent() {
        let form = BotSettingsForm {
            bot_name: "Toko".into(),
            pakasir_slug: String::new(),
            ..Default::default()
        };
        let body = serde_json::to_value(form.to_request()).unwrap();
        assert_eq!(body["pakasir_slug"], Value::Null);
        assert!(body.get("pakasir_api_key").is_none());
    }

    #[actix_web::test]
    async fn pakasir_test_uses_stored_credentials() {
        let (backend, handle) = spawn_backend(routes).await;
        let api = Arc::new(ApiClient::new(format!("{backend}/api"), Locale::Id));
        let mut page = BotDetailPage::new(api, 5);
        page.load().await.unwrap();
        assert_eq!(page.form.pakasir_slug, "toko-slug");
        assert_eq!(page.stats.total_revenue, 150000.0);

        page.form.pakasir_slug.clear();
        let result = page.test_pakasir().await;
        assert!(result.valid);
        assert_eq!(result.message.as_deref(), Some("toko-slug"));

        page.bot.as_mut().unwrap().pakasir_api_key = None;
        let result = page.test_pakasir().await;
        assert_eq!(result.error.as_deref(), Some("API Key belum diisi"));

        page.bot.as_mut().unwrap().pakasir_slug = None;
        let result = page.test_pakasir().await;
        assert_eq!(result.error.as_deref(), Some("Project Slug belum diisi"));

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn save_reports_errors_inline() {
        let (backend, handle) = spawn_backend(routes).await;
        let api = Arc::new(ApiClient::new(format!("{backend}/api"), Locale::Id));
        let mut page = BotDetailPage::new(api, 5);
        page.load().await.unwrap();

        page.form.bot_name.clear();
        assert!(page.save().await.is_err());
        assert_eq!(page.error.as_deref(), Some("Nama bot wajib diisi"));
        assert!(page.success.is_none());

        page.form.bot_name = "Toko Baru".into();
        page.save().await.unwrap();
        assert_eq!(page.success.as_deref(), Some("Pengaturan berhasil disimpan!"));
        assert!(page.error.is_none());

        handle.stop(false).await;
    }
}
