// Azure resource models
//
// Wire DTOs mirror the Azure Resource Manager JSON (camelCase); the domain types are what the
// wizard keeps in its lookup indexes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    #[serde(default, alias = "display_name")]
    pub display_name: String,
}

/// An account credential known to the credential provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    /// Stale accounts need re-authentication before any token can be issued.
    #[serde(default)]
    pub is_stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Subscription GUID (not the `/subscriptions/<guid>` path).
    pub id: String,
    pub name: String,
    pub tenant_id: String,
    #[serde(default)]
    pub state: String,
}

impl Subscription {
    pub fn is_enabled(&self) -> bool {
        self.state.is_empty() || self.state.eq_ignore_ascii_case("enabled")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlServer {
    /// Full resource identity, e.g. `/subscriptions/X/resourceGroups/RG/providers/Microsoft.Sql/servers/name`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlDatabase {
    pub id: String,
    pub name: String,
}

/// Bearer token issued for one tenant/resource pair.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &crate::utils::logging::mask_sensitive(&self.token))
            .field("token_type", &self.token_type)
            .finish()
    }
}

// =========================
// ARM wire shapes
// =========================

/// `{ "value": [...], "nextLink": "..." }` list envelope used by every management list call.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default, rename = "nextLink")]
    pub next_link: Option<String>,
}

/// `{ "error": { "code": "...", "message": "..." } }` returned on non-2xx.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmErrorBody {
    #[serde(default)]
    pub error: Option<ArmErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub subscription_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl SubscriptionDto {
    /// `tenant_fallback` is the tenant the listing token was issued for.
    pub fn into_subscription(self, tenant_fallback: &str) -> Subscription {
        let name = if self.display_name.trim().is_empty() {
            self.subscription_id.clone()
        } else {
            self.display_name
        };
        Subscription {
            id: self.subscription_id,
            name,
            tenant_id: self
                .tenant_id
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| tenant_fallback.to_string()),
            state: self.state,
        }
    }
}
