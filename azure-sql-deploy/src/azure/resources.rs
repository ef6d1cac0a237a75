// Resource provider
//
// Subscriptions visible to an account, gathered tenant by tenant.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use super::credentials::{AzureResource, CredentialProvider};
use super::management::ManagementClient;
use crate::error::DeployResult;
use crate::models::azure::{Account, Subscription};

#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// `include_all = false` keeps only subscriptions in the `Enabled` state.
    async fn get_subscriptions(
        &self,
        account: &Account,
        include_all: bool,
    ) -> DeployResult<Vec<Subscription>>;
}

pub struct ArmResourceProvider {
    credentials: Arc<dyn CredentialProvider>,
    management: Arc<ManagementClient>,
}

impl ArmResourceProvider {
    pub fn new(credentials: Arc<dyn CredentialProvider>, management: Arc<ManagementClient>) -> Self {
        Self {
            credentials,
            management,
        }
    }
}

#[async_trait]
impl ResourceProvider for ArmResourceProvider {
    async fn get_subscriptions(
        &self,
        account: &Account,
        include_all: bool,
    ) -> DeployResult<Vec<Subscription>> {
        if account.tenants.is_empty() {
            log::warn!(
                "[PHASE: cascade] [STEP: load_subscriptions] Account '{}' has no tenants",
                account.display_name
            );
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for tenant in &account.tenants {
            let token = self
                .credentials
                .get_account_security_token(account, &tenant.id, AzureResource::ResourceManagement)
                .await?;
            let listed = self
                .management
                .list_subscriptions(&token)
                .await?
                .into_result("list subscriptions")?;

            for dto in listed {
                let sub = dto.into_subscription(&tenant.id);
                if !include_all && !sub.is_enabled() {
                    continue;
                }
                if seen.insert(sub.id.clone()) {
                    out.push(sub);
                }
            }
        }

        log::debug!(
            "[PHASE: cascade] [STEP: load_subscriptions] {} subscription(s) across {} tenant(s)",
            out.len(),
            account.tenants.len()
        );
        Ok(out)
    }
}
