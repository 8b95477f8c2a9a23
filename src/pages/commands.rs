use std::fmt::Write;
use std::sync::Arc;

use crate::error::ApiError;
use crate::i18n;
use crate::models::{default_command, Command, SaveCommandRequest, DEFAULT_STORE_COMMANDS};
use crate::pages::StoreBotSelector;
use crate::services::ApiClient;

pub struct CommandsPage {
    api: Arc<ApiClient>,
    pub store_bots: StoreBotSelector,
    pub commands: Vec<Command>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl CommandsPage {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            store_bots: StoreBotSelector::default(),
            commands: Vec::new(),
            error: None,
            success: None,
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
            Some(bot_id) => self.commands = self.api.commands(bot_id).await?,
            None => self.commands.clear(),
        }
        Ok(())
    }

    fn saved(&self, command_name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.command_name == command_name)
    }

    /// Saved response text, else the built-in default, else empty.
    pub fn text_of(&self, command_name: &str) -> String {
        match self.saved(command_name) {
            Some(cmd) => cmd.response_text.clone(),
            None => default_command(command_name)
                .map(|d| d.default_text.to_string())
                .unwrap_or_default(),
        }
    }

    /// Commands nobody has saved yet are enabled.
    pub fn is_enabled(&self, command_name: &str) -> bool {
        self.saved(command_name).map_or(true, |c| c.is_enabled)
    }

    pub async fn save(&mut self, command_name: &str, response_text: &str) -> Result<(), ApiError> {
        let Some(bot_id) = self.store_bots.selected() else {
            return Ok(());
        };
        self.error = None;
        self.success = None;

        let request = SaveCommandRequest {
            command_name: command_name.to_string(),
            response_text: response_text.to_string(),
            is_enabled: self.is_enabled(command_name),
        };
        if let Err(e) = self.api.save_command(bot_id, &request).await {
            self.error = Some(e.message(self.api.locale()));
            return Err(e);
        }

        self.success = Some(i18n::command_saved(self.api.locale(), command_name));
        self.refresh().await
    }

    /// Flips the enabled flag, keeping the current (possibly default) text.
    pub async fn toggle(&mut self, command_name: &str) -> Result<bool, ApiError> {
        let Some(bot_id) = self.store_bots.selected() else {
            return Ok(false);
        };
        let enabled = !self.is_enabled(command_name);
        let request = SaveCommandRequest {
            command_name: command_name.to_string(),
            response_text: self.text_of(command_name),
            is_enabled: enabled,
        };
        self.api.save_command(bot_id, &request).await?;
        self.refresh().await?;
        Ok(enabled)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for builtin in &DEFAULT_STORE_COMMANDS {
            let name = builtin.command_name;
            let _ = writeln!(
                out,
                "{:<10} [{}] {}",
                name,
                if self.is_enabled(name) { "on " } else { "off" },
                builtin.description,
            );
            for line in self.text_of(name).lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
        if let Some(success) = &self.success {
            let _ = writeln!(out, "{success}");
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "! {error}");
        }
        out
    }
}
