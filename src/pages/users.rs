use std::fmt::Write;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::BotUser;
use crate::pages::StoreBotSelector;
use crate::services::ApiClient;

pub struct UsersPage {
    api: Arc<ApiClient>,
    pub store_bots: StoreBotSelector,
    pub users: Vec<BotUser>,
    pub search: String,
}

impl UsersPage {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            store_bots: StoreBotSelector::default(),
            users: Vec::new(),
            search: String::new(),
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
            Some(bot_id) => self.users = self.api.bot_users(bot_id).await?,
            None => self.users.clear(),
        }
        Ok(())
    }

    /// Case-insensitive match on username or first name.
    pub fn visible(&self) -> impl Iterator<Item = &BotUser> {
        let needle = self.search.to_lowercase();
        self.users.iter().filter(move |u| {
            let hit = |field: &Option<String>| {
                field
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&needle)
            };
            hit(&u.username) || hit(&u.first_name)
        })
    }

    pub fn active_count(&self) -> usize {
        self.users.iter().filter(|u| !u.is_blocked).count()
    }

    pub fn blocked_count(&self) -> usize {
        self.users.iter().filter(|u| u.is_blocked).count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "User: total={} aktif={} diblokir={}",
            self.users.len(),
            self.active_count(),
            self.blocked_count(),
        );
        for u in self.visible() {
            let _ = writeln!(
                out,
                "{:<14} @{:<24} {:<28} {}",
                u.telegram_id,
                u.username.as_deref().unwrap_or("-"),
                u.display_name(),
                if u.is_blocked { "diblokir" } else { "aktif" },
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use serde_json::json;

    fn users() -> Vec<BotUser> {
        serde_json::from_value(json!([
            { "id": 1, "telegram_id": 1001, "username": "BudiSantoso", "first_name": "Budi" },
            { "id": 2, "telegram_id": "1002", "username": null, "first_name": "Siti", "is_blocked": true },
            { "id": 3, "telegram_id": 1003, "username": "andi_store", "first_name": null }
        ]))
        .unwrap()
    }

    #[test]
    fn search_matches_username_or_first_name() {
        let mut page = UsersPage::new(Arc::new(ApiClient::new("http://127.0.0.1:1/api", Locale::Id)));
        page.users = users();

        page.search = "budi".into();
        assert_eq!(page.visible().map(|u| u.id).collect::<Vec<_>>(), vec![1]);

        page.search = "SITI".into();
        assert_eq!(page.visible().map(|u| u.id).collect::<Vec<_>>(), vec![2]);

        page.search = "store".into();
        assert_eq!(page.visible().map(|u| u.id).collect::<Vec<_>>(), vec![3]);

        page.search.clear();
        assert_eq!(page.visible().count(), 3);

        assert_eq!(page.active_count(), 2);
        assert_eq!(page.blocked_count(), 1);
    }
}
