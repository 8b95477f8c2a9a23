use std::fmt::Write;
use std::sync::Arc;

use crate::error::ApiError;
use crate::i18n;
use crate::models::{Bot, BotType, CreateBotRequest, PakasirTestResult};
use crate::services::ApiClient;

/// "Add bot" modal contents.
#[derive(Debug, Clone, Default)]
pub struct NewBotForm {
    pub telegram_token: String,
    pub bot_type: BotType,
    pub pakasir_slug: String,
    pub pakasir_api_key: String,
}

impl NewBotForm {
    /// Pakasir credentials only travel with store bots.
    pub fn to_request(&self) -> CreateBotRequest {
        let store_field = |value: &str| {
            (self.bot_type == BotType::Store && !value.is_empty()).then(|| value.to_string())
        };
        CreateBotRequest {
            telegram_token: self.telegram_token.trim().to_string(),
            bot_type: self.bot_type,
            pakasir_slug: store_field(&self.pakasir_slug),
            pakasir_api_key: store_field(&self.pakasir_api_key),
        }
    }
}

pub struct BotsPage {
    api: Arc<ApiClient>,
    pub bots: Vec<Bot>,
    /// The open "add bot" modal, kept after a failed submit.
    pub form: Option<NewBotForm>,
    pub error: Option<String>,
    pub pakasir_test: Option<PakasirTestResult>,
}

impl BotsPage {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            bots: Vec::new(),
            form: None,
            error: None,
            pakasir_test: None,
        }
    }

    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.bots = self.api.bots().await?;
        Ok(())
    }

    pub fn open_form(&mut self) {
        self.form = Some(NewBotForm::default());
        self.error = None;
        self.pakasir_test = None;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.error = None;
        self.pakasir_test = None;
    }

    /// Submits the open form. On failure the form stays open with the
    /// backend's message; on success the list is re-fetched and the form closed.
    pub async fn submit(&mut self) -> Result<(), ApiError> {
        let Some(form) = &self.form else {
            return Ok(());
        };
        self.error = None;

        if let Err(e) = self.api.create_bot(&form.to_request()).await {
            self.error = Some(e.message(self.api.locale()));
            return Err(e);
        }

        self.load().await?;
        self.close_form();
        Ok(())
    }

    /// Checks the Pakasir credentials typed into the form.
    pub async fn test_pakasir(&mut self) -> &PakasirTestResult {
        let locale = self.api.locale();
        let (slug, key) = match &self.form {
            Some(form) => (form.pakasir_slug.clone(), form.pakasir_api_key.clone()),
            None => Default::default(),
        };

        let result = if slug.is_empty() || key.is_empty() {
            PakasirTestResult {
                valid: false,
                error: Some(i18n::pakasir_fields_required(locale).to_string()),
                ..Default::default()
            }
        } else {
            match self.api.test_pakasir(&slug, &key).await {
                Ok(result) => result,
                Err(e) => PakasirTestResult {
                    valid: false,
                    error: Some(test_failure_message(&e, locale)),
                    ..Default::default()
                },
            }
        };
        self.pakasir_test.insert(result)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Semua Bot ({})", self.bots.len());
        for bot in &self.bots {
            let _ = writeln!(
                out,
                "#{:<4} @{:<24} {:<24} {:<8} {:<9} produk={} user={} transaksi={}",
                bot.id,
                bot.bot_username,
                bot.bot_name,
                bot.bot_type,
                if bot.is_active { "aktif" } else { "nonaktif" },
                bot.products_count,
                bot.users_count,
                bot.transactions_count,
            );
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "! {error}");
        }
        out
    }
}

/// Error text for a failed Pakasir test: the backend's message when it sent
/// one, the generic test failure otherwise.
pub(crate) fn test_failure_message(e: &ApiError, locale: i18n::Locale) -> String {
    match e {
        ApiError::Application {
            message: Some(message),
            ..
        } => message.clone(),
        _ => i18n::pakasir_test_failed(locale).to_string(),
    }
}
