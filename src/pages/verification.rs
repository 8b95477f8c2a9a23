use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use tracing::warn;

use crate::error::{ApiError, CliError};
use crate::i18n;
use crate::models::{
    IpLookup, LinkCheck, ProxyCheck, ProxyInput, SheerIdSettings, SheerIdType, UserProxy,
    Verification, VerificationSubmission,
};
use crate::services::{ApiClient, IpLocator};

/// Proxy form as typed; the port is parsed on save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyForm {
    pub name: String,
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
}

impl ProxyForm {
    pub fn from_proxy(proxy: &UserProxy) -> Self {
        Self {
            name: proxy.name.clone(),
            host: proxy.host.clone(),
            port: proxy.port.to_string(),
            username: proxy.username.clone().unwrap_or_default(),
            password: String::new(),
        }
    }

    /// `None` when name, host or port is missing or the port is not a number.
    pub fn to_input(&self) -> Option<ProxyInput> {
        let (name, host) = (self.name.trim(), self.host.trim());
        if name.is_empty() || host.is_empty() {
            return None;
        }
        let port = self.port.trim().parse().ok()?;
        let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Some(ProxyInput {
            name: name.to_string(),
            host: host.to_string(),
            port,
            username: optional(&self.username),
            password: optional(&self.password),
        })
    }
}

/// Submit page: link check, submission, settings and the saved proxy list.
pub struct VerificationPage {
    api: Arc<ApiClient>,
    ip_locator: IpLocator,
    pub types: Vec<SheerIdType>,
    pub selected_type: Option<String>,
    pub verifications: Vec<Verification>,
    pub settings: Option<SheerIdSettings>,
    pub proxies: Vec<UserProxy>,
    pub proxy_tests: HashMap<i64, ProxyCheck>,
    pub link_check: Option<LinkCheck>,
    pub submission: Option<VerificationSubmission>,
    pub current_ip: Option<IpLookup>,
}

impl VerificationPage {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            ip_locator: IpLocator::default(),
            types: Vec::new(),
            selected_type: None,
            verifications: Vec::new(),
            settings: None,
            proxies: Vec::new(),
            proxy_tests: HashMap::new(),
            link_check: None,
            submission: None,
            current_ip: None,
        }
    }

    /// Fetches types, verifications, settings and proxies concurrently. Each
    /// part that fails keeps its previous value.
    pub async fn load(&mut self) {
        let (types, verifications, settings, proxies) = futures_util::join!(
            self.api.sheerid_types(),
            self.api.verifications(),
            self.api.sheerid_settings(),
            self.api.proxies(),
        );

        match types {
            Ok(types) => {
                if self.selected_type.is_none() {
                    self.selected_type = types.first().map(|t| t.id.clone());
                }
                self.types = types;
            }
            Err(e) => warn!("Failed to load verification types: {}", e),
        }
        match verifications {
            Ok(list) => self.verifications = list,
            Err(e) => warn!("Failed to load verifications: {}", e),
        }
        match settings {
            Ok(settings) => self.settings = Some(settings),
            Err(e) => warn!("Failed to load settings: {}", e),
        }
        match proxies {
            Ok(list) => self.proxies = list,
            Err(e) => warn!("Failed to load proxies: {}", e),
        }
    }

    pub fn with_ip_locator(mut self, ip_locator: IpLocator) -> Self {
        self.ip_locator = ip_locator;
        self
    }

    pub fn select_type(&mut self, type_id: &str) -> bool {
        if self.types.iter().any(|t| t.id == type_id) {
            self.selected_type = Some(type_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn selected_type_info(&self) -> Option<&SheerIdType> {
        let id = self.selected_type.as_deref()?;
        self.types.iter().find(|t| t.id == id)
    }

    pub async fn check_link(&mut self, url: &str) -> &LinkCheck {
        self.submission = None;
        let verify_type = self.selected_type.clone().unwrap_or_default();
        let result = match self.api.check_link(url, &verify_type).await {
            Ok(check) => check,
            Err(e) => LinkCheck {
                valid: false,
                error: Some(e.message(self.api.locale())),
                step: None,
            },
        };
        self.link_check.insert(result)
    }

    /// Submits the link; a successful submission clears the link check and
    /// re-fetches the verification list.
    pub async fn submit(&mut self, url: &str) -> Result<&VerificationSubmission, CliError> {
        let Some(verify_type) = self.selected_type.clone() else {
            return Err(CliError::Invalid(i18n::required_field(
                self.api.locale(),
                "Tipe verifikasi",
            )));
        };
        if url.trim().is_empty() {
            return Err(CliError::Invalid(i18n::required_field(self.api.locale(), "URL")));
        }

        let result = match self.api.submit_verification(url.trim(), &verify_type).await {
            Ok(submission) => submission,
            Err(e) => VerificationSubmission {
                success: false,
                error: Some(e.message(self.api.locale())),
                ..Default::default()
            },
        };

        if result.success {
            self.link_check = None;
            match self.api.verifications().await {
                Ok(list) => self.verifications = list,
                Err(e) => warn!("Failed to refresh verifications: {}", e),
            }
        }
        Ok(&*self.submission.insert(result))
    }

    /// Address of this machine as seen from outside, asked of public
    /// geo-IP providers directly.
    pub async fn lookup_ip(&mut self) -> &IpLookup {
        let ip = self.ip_locator.lookup().await;
        self.current_ip.insert(ip)
    }

    pub fn active_proxy(&self) -> Option<&UserProxy> {
        self.proxies.iter().find(|p| p.is_active)
    }

    pub async fn add_proxy(&mut self, form: &ProxyForm) -> Result<Option<&UserProxy>, ApiError> {
        let Some(input) = form.to_input() else {
            return Ok(None);
        };
        let proxy = self.api.add_proxy(&input).await?;
        self.proxies.insert(0, proxy);
        Ok(self.proxies.first())
    }

    pub async fn update_proxy(
        &mut self,
        proxy_id: i64,
        form: &ProxyForm,
    ) -> Result<Option<&UserProxy>, ApiError> {
        let Some(input) = form.to_input() else {
            return Ok(None);
        };
        let updated = self.api.update_proxy(proxy_id, &input).await?;
        let Some(slot) = self.proxies.iter_mut().find(|p| p.id == proxy_id) else {
            return Ok(None);
        };
        *slot = updated;
        Ok(Some(&*slot))
    }

    pub async fn delete_proxy(&mut self, proxy_id: i64) -> Result<(), ApiError> {
        self.api.delete_proxy(proxy_id).await?;
        self.proxies.retain(|p| p.id != proxy_id);
        self.proxy_tests.remove(&proxy_id);
        Ok(())
    }

    /// Activation is exclusive: the activated proxy becomes the only active
    /// entry in the local list, without re-fetching it.
    pub async fn activate_proxy(&mut self, proxy_id: i64) -> Result<(), ApiError> {
        self.api.activate_proxy(proxy_id).await?;
        for proxy in &mut self.proxies {
            proxy.is_active = proxy.id == proxy_id;
        }
        self.reload_settings().await;
        Ok(())
    }

    pub async fn deactivate_proxy(&mut self, proxy_id: i64) -> Result<(), ApiError> {
        self.api.deactivate_proxy(proxy_id).await?;
        for proxy in &mut self.proxies {
            proxy.is_active = false;
        }
        self.reload_settings().await;
        Ok(())
    }

    /// Stores the test result and re-fetches the list for the last-test
    /// fields. Active flags are left to the backend.
    pub async fn test_proxy(&mut self, proxy_id: i64) -> Result<&ProxyCheck, ApiError> {
        let check = self.api.test_proxy(proxy_id).await?;
        self.proxy_tests.insert(proxy_id, check);
        match self.api.proxies().await {
            Ok(list) => self.proxies = list,
            Err(e) => warn!("Failed to refresh proxies: {}", e),
        }
        Ok(&self.proxy_tests[&proxy_id])
    }

    async fn reload_settings(&mut self) {
        match self.api.sheerid_settings().await {
            Ok(settings) => self.settings = Some(settings),
            Err(e) => warn!("Failed to refresh settings: {}", e),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Tipe verifikasi:");
        for t in &self.types {
            let marker = if self.selected_type.as_deref() == Some(t.id.as_str()) { '*' } else { ' ' };
            let _ = writeln!(out, " {marker} {} {:<24} {} poin", t.icon, t.name, t.cost);
        }

        let _ = writeln!(out, "Proxy:");
        if self.proxies.is_empty() {
            let _ = writeln!(out, "  (belum ada proxy)");
        }
        for p in &self.proxies {
            let last_test = match p.last_test_success {
                Some(true) => "ok",
                Some(false) => "gagal",
                None => "-",
            };
            let _ = writeln!(
                out,
                "  {} #{:<4} {:<20} {:<28} test={}",
                if p.is_active { "●" } else { "○" },
                p.id,
                p.name,
                p.address(),
                last_test,
            );
        }
        if let Some(settings) = &self.settings {
            let _ = writeln!(
                out,
                "Proxy aktif di pengaturan: {}",
                match (&settings.proxy_host, settings.proxy_port, settings.proxy_enabled) {
                    (Some(host), Some(port), true) => format!("{host}:{port}"),
                    _ => "tidak ada".to_string(),
                }
            );
        }
        match &self.current_ip {
            Some(ip) if ip.success => {
                let _ = writeln!(
                    out,
                    "IP saat ini: {} ({}, {}) via {}",
                    ip.ip.as_deref().unwrap_or("-"),
                    ip.city.as_deref().unwrap_or("-"),
                    ip.country.as_deref().unwrap_or("-"),
                    ip.source.as_deref().unwrap_or("-"),
                );
            }
            Some(ip) => {
                let _ = writeln!(out, "IP saat ini: {}", ip.error.as_deref().unwrap_or("-"));
            }
            None => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use crate::services::ip_lookup::IpProvider;
    use crate::testing::spawn_backend;
    use actix_web::{web, HttpResponse};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Request counters owned by one test's fake backend.
    #[derive(Clone, Default)]
    struct Fetches {
        proxies: Arc<AtomicUsize>,
        settings: Arc<AtomicUsize>,
    }

    fn proxy(id: i64, active: bool) -> serde_json::Value {
        json!({ "id": id, "name": format!("proxy-{id}"), "host": "10.0.0.1", "port": 8000 + id, "is_active": active })
    }

    async fn proxies(fetches: web::Data<Fetches>) -> HttpResponse {
        fetches.proxies.fetch_add(1, Ordering::SeqCst);
        HttpResponse::Ok().json(json!({ "proxies": [proxy(1, true), proxy(2, false), proxy(3, false)] }))
    }

    async fn activate(path: web::Path<i64>) -> HttpResponse {
        HttpResponse::Ok().json(json!({ "proxy": proxy(path.into_inner(), true), "message": "ok" }))
    }

    async fn deactivate() -> HttpResponse {
        HttpResponse::Ok().json(json!({ "message": "Proxy dinonaktifkan" }))
    }

    async fn settings(fetches: web::Data<Fetches>) -> HttpResponse {
        fetches.settings.fetch_add(1, Ordering::SeqCst);
        HttpResponse::Ok().json(json!({ "settings": {
            "proxy_enabled": true, "proxy_host": "10.0.0.1", "proxy_port": 8002, "default_points_cost": 1
        }}))
    }

    async fn types() -> HttpResponse {
        HttpResponse::Ok().json(json!({ "types": [
            { "id": "spotify", "name": "Spotify Student", "cost": 1, "icon": "🎵" },
            { "id": "youtube", "name": "YouTube Premium", "cost": 2, "icon": "📺" }
        ]}))
    }

    async fn broken() -> HttpResponse {
        HttpResponse::InternalServerError().finish()
    }

    fn routes(fetches: &Fetches) -> impl Fn(&mut web::ServiceConfig) + Clone + Send + 'static {
        let fetches = fetches.clone();
        move |cfg: &mut web::ServiceConfig| {
            cfg.app_data(web::Data::new(fetches.clone()))
                .route("/api/sheerid/proxies", web::get().to(proxies))
                .route("/api/sheerid/proxies/{id}/activate", web::post().to(activate))
                .route("/api/sheerid/proxies/{id}/deactivate", web::post().to(deactivate))
                .route("/api/sheerid/settings", web::get().to(settings))
                .route("/api/sheerid/types", web::get().to(types))
                .route("/api/sheerid/verifications", web::get().to(broken));
        }
    }

    #[test]
    fn proxy_form_requires_name_host_and_numeric_port() {
        let mut form = ProxyForm {
            name: "rumah".into(),
            host: "proxy.example".into(),
            port: "80a".into(),
            ..Default::default()
        };
        assert!(form.to_input().is_none());

        form.port = "3128".into();
        let input = form.to_input().unwrap();
        assert_eq!(input.port, 3128);
        assert!(input.username.is_none());

        form.host.clear();
        assert!(form.to_input().is_none());
    }

    #[actix_web::test]
    async fn load_keeps_going_when_one_part_fails() {
        let fetches = Fetches::default();
        let (backend, handle) = spawn_backend(routes(&fetches)).await;
        let api = Arc::new(ApiClient::new(format!("{backend}/api"), Locale::Id));
        let mut page = VerificationPage::new(api);

        page.load().await;
        assert_eq!(page.types.len(), 2);
        assert_eq!(page.selected_type.as_deref(), Some("spotify"));
        assert!(page.verifications.is_empty());
        assert!(page.settings.is_some());
        assert_eq!(page.proxies.len(), 3);
        assert_eq!(fetches.proxies.load(Ordering::SeqCst), 1);
        assert_eq!(fetches.settings.load(Ordering::SeqCst), 1);

        handle.stop(false).await;
    }

    async fn ipinfo() -> HttpResponse {
        HttpResponse::Ok().json(json!({
            "ip": "36.68.10.2", "city": "Surabaya", "region": "East Java", "country": "ID",
            "org": "AS17451 BIZNET", "timezone": "Asia/Jakarta"
        }))
    }

    #[actix_web::test]
    async fn ip_lookup_skips_the_backend_and_falls_back() {
        let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
            cfg.route("/ipapi/json", web::get().to(broken))
                .route("/ipinfo/json", web::get().to(ipinfo));
        })
        .await;
        let locator = IpLocator::with_providers(
            reqwest::Client::new(),
            vec![
                (IpProvider::IpApi, format!("{base}/ipapi/json")),
                (IpProvider::IpInfo, format!("{base}/ipinfo/json")),
                (IpProvider::Ipify, format!("{base}/ipify")),
            ],
        );
        let api = Arc::new(ApiClient::new("http://127.0.0.1:1/api", Locale::Id));
        let mut page = VerificationPage::new(api).with_ip_locator(locator);

        let ip = page.lookup_ip().await;
        assert!(ip.success);
        assert_eq!(ip.source.as_deref(), Some("ipinfo.io"));
        assert!(page
            .render()
            .contains("IP saat ini: 36.68.10.2 (Surabaya, ID) via ipinfo.io"));

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn activation_is_exclusive_without_reload() {
        let fetches = Fetches::default();
        let (backend, handle) = spawn_backend(routes(&fetches)).await;
        let api = Arc::new(ApiClient::new(format!("{backend}/api"), Locale::Id));
        let mut page = VerificationPage::new(api);
        page.load().await;
        assert_eq!(page.active_proxy().map(|p| p.id), Some(1));

        let proxy_fetches = fetches.proxies.load(Ordering::SeqCst);
        let settings_fetches = fetches.settings.load(Ordering::SeqCst);

        page.activate_proxy(2).await.unwrap();
        let active: Vec<i64> = page.proxies.iter().filter(|p| p.is_active).map(|p| p.id).collect();
        assert_eq!(active, vec![2]);
        assert_eq!(fetches.proxies.load(Ordering::SeqCst), proxy_fetches);
        assert_eq!(fetches.settings.load(Ordering::SeqCst), settings_fetches + 1);

        page.deactivate_proxy(2).await.unwrap();
        assert!(page.active_proxy().is_none());
        assert_eq!(page.proxies.len(), 3);

        handle.stop(false).await;
    }
}
