use std::fmt::Write;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use crate::error::ApiError;
use crate::i18n;
use crate::models::{SheerIdType, Verification, VerificationState, VerificationStatus};
use crate::services::{ApiClient, PollEvent, PollSchedule, StatusPoller, StatusSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    pub total: usize,
    pub success: usize,
    pub pending: usize,
    /// failed, fraud_review and error together.
    pub failed: usize,
}

impl HistorySummary {
    pub fn of(verifications: &[Verification]) -> Self {
        let count = |pred: fn(&VerificationState) -> bool| {
            verifications.iter().filter(|v| pred(&v.status)).count()
        };
        Self {
            total: verifications.len(),
            success: count(|s| *s == VerificationState::Success),
            pending: count(|s| *s == VerificationState::Pending),
            failed: count(VerificationState::is_failure),
        }
    }
}

/// Writes a live status into the matching list entry. Results without a
/// reported status leave the entry alone. Returns whether an entry changed.
pub fn apply_status(
    verifications: &mut [Verification],
    verification_id: i64,
    status: &VerificationStatus,
) -> bool {
    if status.status.is_none() {
        return false;
    }
    let Some(state) = status.reported_state() else {
        return false;
    };
    match verifications.iter_mut().find(|v| v.id == verification_id) {
        Some(entry) if entry.status != state => {
            entry.status = state;
            true
        }
        _ => false,
    }
}

struct OpenDetail {
    poller: StatusPoller,
    events: UnboundedReceiver<PollEvent>,
}

pub struct VerificationHistoryPage {
    api: Arc<ApiClient>,
    source: Arc<dyn StatusSource>,
    schedule: PollSchedule,
    pub types: Vec<SheerIdType>,
    pub verifications: Vec<Verification>,
    /// Latest live status of the open detail view.
    pub last_status: Option<VerificationStatus>,
    /// Seconds until the next automatic check.
    pub countdown: Option<u32>,
    detail: Option<OpenDetail>,
}

impl VerificationHistoryPage {
    pub fn new(api: Arc<ApiClient>, schedule: PollSchedule) -> Self {
        let source: Arc<dyn StatusSource> = api.clone();
        Self {
            api,
            source,
            schedule,
            types: Vec::new(),
            verifications: Vec::new(),
            last_status: None,
            countdown: None,
            detail: None,
        }
    }

    /// Checks statuses through `source` instead of the API client.
    pub fn with_status_source(mut self, source: Arc<dyn StatusSource>) -> Self {
        self.source = source;
        self
    }

    pub async fn load(&mut self) -> Result<(), ApiError> {
        let (types, verifications) =
            futures_util::join!(self.api.sheerid_types(), self.api.verifications());
        match types {
            Ok(types) => self.types = types,
            Err(e) => warn!("Failed to load verification types: {}", e),
        }
        self.verifications = verifications?;
        Ok(())
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary::of(&self.verifications)
    }

    pub fn selected(&self) -> Option<&Verification> {
        let id = self.detail.as_ref()?.poller.verification_id();
        self.verifications.iter().find(|v| v.id == id)
    }

    /// Opens the detail view: one immediate status check, then one per
    /// schedule period until the view is closed. Opening another
    /// verification replaces the running poller.
    pub fn open_detail(&mut self, verification_id: i64) -> bool {
        if !self.verifications.iter().any(|v| v.id == verification_id) {
            return false;
        }
        self.last_status = None;
        self.start_polling(verification_id);
        true
    }

    /// Re-arms the countdown for the open view with an immediate check.
    pub fn enable_auto_refresh(&mut self) -> bool {
        match self.detail.as_ref().map(|d| d.poller.verification_id()) {
            Some(id) => {
                self.start_polling(id);
                true
            }
            None => false,
        }
    }

    pub fn close_detail(&mut self) {
        if let Some(detail) = self.detail.take() {
            detail.poller.stop();
        }
        self.last_status = None;
        self.countdown = None;
    }

    pub fn is_polling(&self) -> bool {
        self.detail
            .as_ref()
            .is_some_and(|d| !d.poller.is_finished())
    }

    fn start_polling(&mut self, verification_id: i64) {
        // drop the previous poller first so its checks cannot land afterwards
        self.detail = None;
        let (poller, events) =
            StatusPoller::start(Arc::clone(&self.source), verification_id, self.schedule);
        self.countdown = Some(self.schedule.period);
        self.detail = Some(OpenDetail {
            poller,
            events,
        });
    }

    fn apply(&mut self, event: &PollEvent) {
        let Some(id) = self.detail.as_ref().map(|d| d.poller.verification_id()) else {
            return;
        };
        match event {
            PollEvent::Countdown(n) => self.countdown = Some(*n),
            PollEvent::Status(status) => {
                apply_status(&mut self.verifications, id, status);
                self.last_status = Some(status.clone());
            }
        }
    }

    /// Applies every event already delivered by the poller.
    pub fn drain_events(&mut self) -> usize {
        let mut events = Vec::new();
        if let Some(detail) = self.detail.as_mut() {
            while let Ok(event) = detail.events.try_recv() {
                events.push(event);
            }
        }
        for event in &events {
            self.apply(event);
        }
        events.len()
    }

    /// Waits for the next poller event and applies it. `None` once the view
    /// is closed or the poller has stopped.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        let event = self.detail.as_mut()?.events.recv().await?;
        self.apply(&event);
        Some(event)
    }

    pub fn render(&self) -> String {
        let locale = self.api.locale();
        let summary = self.summary();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Riwayat: total={} berhasil={} pending={} gagal={}",
            summary.total, summary.success, summary.pending, summary.failed,
        );
        for v in &self.verifications {
            let type_name = self
                .types
                .iter()
                .find(|t| t.id == v.verify_type)
                .map_or(v.verify_type.as_str(), |t| t.name.as_str());
            let _ = writeln!(
                out,
                "#{:<6} {:<22} {:<16} {:<24} {}",
                v.id,
                type_name,
                i18n::status_label(locale, v.status.as_str()),
                v.student_name.as_deref().unwrap_or("-"),
                v.created_at,
            );
        }
        out
    }

    pub fn render_detail(&self) -> String {
        let locale = self.api.locale();
        let mut out = String::new();
        let Some(v) = self.selected() else {
            return out;
        };
        let _ = writeln!(out, "Verifikasi #{} ({})", v.id, v.verify_type);
        let _ = writeln!(out, "  status  : {}", i18n::status_label(locale, v.status.as_str()));
        let _ = writeln!(out, "  url     : {}", v.verify_url);
        let _ = writeln!(out, "  nama    : {}", v.student_name.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "  email   : {}", v.student_email.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "  sekolah : {}", v.school_name.as_deref().unwrap_or("-"));
        if let Some(error) = &v.error_details {
            let _ = writeln!(out, "  error   : {error}");
        }
        if let Some(status) = &self.last_status {
            let shown = status
                .status_display
                .as_deref()
                .or(status.status.as_deref())
                .unwrap_or("-");
            let _ = writeln!(out, "  live    : {shown}");
            if let Some(message) = &status.message {
                let _ = writeln!(out, "  pesan   : {message}");
            }
            if let Some(url) = status.claim_url.as_ref().or(status.redirect_url.as_ref()) {
                let _ = writeln!(out, "  klaim   : {url}");
            }
        }
        if let Some(n) = self.countdown {
            let _ = writeln!(out, "  cek ulang dalam {n} detik");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    struct ApprovingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for ApprovingSource {
        async fn check_status(&self, verification_id: i64) -> Result<VerificationStatus, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VerificationStatus {
                success: true,
                approved: Some(n > 0),
                status: Some(if n > 0 { "approved" } else { "pending" }.into()),
                verification_id: Some(verification_id),
                ..Default::default()
            })
        }
    }

    fn verifications() -> Vec<Verification> {
        serde_json::from_value(json!([
            { "id": 1, "verify_type": "spotify", "verify_url": "https://x/1", "status": "pending",
              "result_message": null, "student_name": "Ana", "student_email": null, "school_name": null,
              "redirect_url": null, "created_at": "2024-05-01", "processed_at": null, "error_details": null },
            { "id": 2, "verify_type": "spotify", "verify_url": "https://x/2", "status": "fraud_review",
              "result_message": null, "student_name": null, "student_email": null, "school_name": null,
              "redirect_url": null, "created_at": "2024-05-02", "processed_at": null, "error_details": null },
            { "id": 3, "verify_type": "youtube", "verify_url": "https://x/3", "status": "error",
              "result_message": null, "student_name": null, "student_email": null, "school_name": null,
              "redirect_url": null, "created_at": "2024-05-03", "processed_at": null, "error_details": "timeout" }
        ]))
        .unwrap()
    }

    fn page(source: Arc<ApprovingSource>) -> VerificationHistoryPage {
        let api = Arc::new(ApiClient::new("http://127.0.0.1:1/api", Locale::Id));
        let mut page =
            VerificationHistoryPage::new(api, PollSchedule::default()).with_status_source(source);
        page.verifications = verifications();
        page
    }

    #[test]
    fn summary_groups_failures() {
        let summary = HistorySummary::of(&verifications());
        assert_eq!(
            summary,
            HistorySummary {
                total: 3,
                success: 0,
                pending: 1,
                failed: 2
            }
        );
    }

    #[test]
    fn status_without_state_changes_nothing() {
        let mut list = verifications();
        let approved_only = VerificationStatus {
            approved: Some(true),
            ..Default::default()
        };
        assert!(!apply_status(&mut list, 1, &approved_only));

        let failed = VerificationStatus {
            status: Some("failed".into()),
            ..Default::default()
        };
        assert!(apply_status(&mut list, 1, &failed));
        assert_eq!(list[0].status, VerificationState::Failed);
        assert!(!apply_status(&mut list, 99, &failed));
    }

    #[test]
    fn intermediate_partner_step_is_kept_verbatim() {
        let mut list = verifications();
        let step = VerificationStatus {
            approved: Some(false),
            status: Some("collectStudentPersonalInfo".into()),
            ..Default::default()
        };
        assert!(apply_status(&mut list, 1, &step));
        assert_eq!(list[0].status.as_str(), "collectStudentPersonalInfo");
        assert!(!apply_status(&mut list, 1, &step));

        let summary = HistorySummary::of(&list);
        assert_eq!((summary.pending, summary.failed), (0, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn open_detail_polls_and_updates_the_list() {
        let source = Arc::new(ApprovingSource {
            calls: AtomicUsize::new(0),
        });
        let mut page = page(source.clone());

        assert!(page.open_detail(1));
        sleep(Duration::from_millis(500)).await;
        page.drain_events();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(page.verifications[0].status, VerificationState::Pending);
        assert_eq!(page.countdown, Some(30));

        sleep(Duration::from_secs(30)).await;
        page.drain_events();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(page.verifications[0].status, VerificationState::Success);
        assert_eq!(page.summary().success, 1);
        assert!(page.render_detail().contains("live    : approved"));

        page.close_detail();
        assert!(page.selected().is_none());
        sleep(Duration::from_secs(90)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(page.drain_events(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_checks_immediately() {
        let source = Arc::new(ApprovingSource {
            calls: AtomicUsize::new(0),
        });
        let mut page = page(source.clone());
        assert!(!page.enable_auto_refresh());
        assert!(!page.open_detail(42));

        page.open_detail(2);
        sleep(Duration::from_secs(10)).await;
        assert!(page.enable_auto_refresh());
        sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        page.drain_events();
        assert_eq!(page.countdown, Some(30));
        assert!(page.is_polling());
    }
}
