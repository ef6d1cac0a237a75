// Response models returned from the session boundary
//
// Shape matches what a UI layer binds to: a generic envelope plus serializable views of the form.

use serde::{Deserialize, Serialize};

use crate::wizard::fields::Candidate;

// =========================
// Generic wrapper
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Present on failures so the user-facing message can be matched to the log entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            correlation_id: None,
        }
    }

    pub fn fail(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            correlation_id: Some(correlation_id.into()),
        }
    }

    /// Failure that still carries data (e.g. the form snapshot after a failed load).
    pub fn fail_with_data(
        data: T,
        message: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
            correlation_id: Some(correlation_id.into()),
        }
    }
}

// =========================
// Form views
// =========================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub field: String,
    /// "idle" | "loading" | "empty" | "ready" | "error"
    pub status: String,
    #[serde(default)]
    pub options: Vec<Candidate>,
    pub selected: Option<Candidate>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub page: String,
    pub navigation: String,
    pub fields: Vec<FieldView>,
    pub resource_group: Option<String>,
    pub region: Option<String>,
}

impl FormSnapshot {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.field == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub page: String,
    /// "editing" | "validating" | "blocked" | "advanced"
    pub state: String,
    #[serde(default)]
    pub messages: Vec<String>,
}
