use serde::{Deserialize, Serialize};

/// Lifecycle state of a submitted verification as stored by the backend.
/// Any state outside the known set is kept verbatim in `Other`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum VerificationState {
    Pending,
    Success,
    Failed,
    FraudReview,
    Error,
    DocUpload,
    Other(String),
}

impl VerificationState {
    pub fn as_str(&self) -> &str {
        match self {
            VerificationState::Pending => "pending",
            VerificationState::Success => "success",
            VerificationState::Failed => "failed",
            VerificationState::FraudReview => "fraud_review",
            VerificationState::Error => "error",
            VerificationState::DocUpload => "doc_upload",
            VerificationState::Other(raw) => raw,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => VerificationState::Pending,
            "success" => VerificationState::Success,
            "failed" => VerificationState::Failed,
            "fraud_review" => VerificationState::FraudReview,
            "error" => VerificationState::Error,
            "doc_upload" => VerificationState::DocUpload,
            other => VerificationState::Other(other.to_string()),
        }
    }

    /// Counted under "failed" in the history summary.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            VerificationState::Failed | VerificationState::FraudReview | VerificationState::Error
        )
    }
}

impl From<String> for VerificationState {
    fn from(raw: String) -> Self {
        match VerificationState::parse(&raw) {
            VerificationState::Other(_) => VerificationState::Other(raw),
            known => known,
        }
    }
}

impl From<VerificationState> for String {
    fn from(state: VerificationState) -> Self {
        match state {
            VerificationState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Verification {
    pub id: i64,
    pub verify_type: String,
    pub verify_url: String,
    #[serde(default)]
    pub verify_id: Option<String>,
    pub status: VerificationState,
    pub result_message: Option<String>,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub school_name: Option<String>,
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub points_cost: i64,
    pub created_at: String,
    pub processed_at: Option<String>,
    pub error_details: Option<String>,
}

/// Live status reported by `/sheerid/verifications/{id}/status`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct VerificationStatus {
    #[serde(default)]
    pub success: bool,
    pub approved: Option<bool>,
    pub status: Option<String>,
    pub status_display: Option<String>,
    pub message: Option<String>,
    pub redirect_url: Option<String>,
    pub claim_url: Option<String>,
    pub credits: Option<i64>,
    pub verify_type: Option<String>,
    pub verification_id: Option<i64>,
    pub error: Option<String>,
}

impl VerificationStatus {
    /// State to show in the list: approval wins over the raw status field.
    pub fn reported_state(&self) -> Option<VerificationState> {
        if self.approved == Some(true) {
            return Some(VerificationState::Success);
        }
        self.status.as_deref().map(VerificationState::parse)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.reported_state(),
            Some(VerificationState::Success | VerificationState::Failed | VerificationState::Error)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SheerIdType {
    pub id: String,
    pub name: String,
    pub cost: i64,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct TypesResponse {
    pub types: Vec<SheerIdType>,
}

#[derive(Debug, Serialize)]
pub struct VerifyLinkRequest<'a> {
    pub url: &'a str,
    #[serde(rename = "type")]
    pub verify_type: &'a str,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LinkCheck {
    #[serde(default)]
    pub valid: bool,
    pub error: Option<String>,
    pub step: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct VerificationSubmission {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub verification_id: i64,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub school_name: Option<String>,
    pub redirect_url: Option<String>,
    pub points_cost: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct VerificationsResponse {
    pub verifications: Vec<Verification>,
}

#[derive(Debug, Deserialize)]
pub struct VerificationResponse {
    pub verification: Verification,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SheerIdSettings {
    #[serde(default)]
    pub proxy_enabled: bool,
    pub proxy_host: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_password: Option<String>,
    #[serde(default)]
    pub default_points_cost: i64,
}

#[derive(Debug, Deserialize)]
pub struct SettingsResponse {
    pub settings: SheerIdSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_overrides_reported_status() {
        let status = VerificationStatus {
            approved: Some(true),
            status: Some("pending".into()),
            ..Default::default()
        };
        assert_eq!(status.reported_state(), Some(VerificationState::Success));
        assert!(status.is_terminal());
    }

    #[test]
    fn missing_fields_report_nothing() {
        let status = VerificationStatus {
            approved: Some(false),
            ..Default::default()
        };
        assert_eq!(status.reported_state(), None);
        assert!(!status.is_terminal());
    }

    #[test]
    fn unknown_backend_states_deserialize() {
        let state: VerificationState = serde_json::from_str("\"rejected_by_partner\"").unwrap();
        assert_eq!(state, VerificationState::Other("rejected_by_partner".into()));
        assert_eq!(state.as_str(), "rejected_by_partner");
        assert_eq!(serde_json::to_value(&state).unwrap(), "rejected_by_partner");
        let state: VerificationState = serde_json::from_str("\"fraud_review\"").unwrap();
        assert!(state.is_failure());
    }
}
