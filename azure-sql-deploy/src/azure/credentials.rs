// Credential provider
//
// Token retrieval is delegated to whoever owns sign-in. The wizard only asks for the account list
// and for a bearer token scoped to one tenant and one resource.

use async_trait::async_trait;

use crate::config::AccountConfig;
use crate::error::{DeployError, DeployResult};
use crate::models::azure::{AccessToken, Account};
use crate::utils::logging::mask_sensitive;

/// Resource a token is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AzureResource {
    ResourceManagement,
}

impl AzureResource {
    pub fn scope(&self) -> &'static str {
        match self {
            AzureResource::ResourceManagement => "https://management.azure.com/",
        }
    }
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_all_accounts(&self) -> DeployResult<Vec<Account>>;

    async fn get_account_security_token(
        &self,
        account: &Account,
        tenant_id: &str,
        resource: AzureResource,
    ) -> DeployResult<AccessToken>;
}

struct StaticEntry {
    account: Account,
    token: Option<String>,
}

/// Accounts and tokens supplied up front (settings file, environment, or tests).
pub struct StaticCredentialProvider {
    entries: Vec<StaticEntry>,
}

impl StaticCredentialProvider {
    pub fn new(entries: Vec<(Account, Option<String>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(account, token)| StaticEntry { account, token })
                .collect(),
        }
    }

    /// Build from configured accounts. `access_token_env` wins over an inline `access_token`.
    pub fn from_settings(accounts: &[AccountConfig]) -> Self {
        let entries = accounts
            .iter()
            .map(|cfg| {
                let from_env = cfg
                    .access_token_env
                    .as_deref()
                    .and_then(|name| std::env::var(name).ok())
                    .filter(|t| !t.trim().is_empty());
                if cfg.access_token_env.is_some() && from_env.is_none() {
                    log::warn!(
                        "[PHASE: credentials] Token variable for account '{}' is not set",
                        cfg.display_name
                    );
                }
                let token = from_env.or_else(|| cfg.access_token.clone());
                let account = Account {
                    id: cfg.id.clone(),
                    display_name: cfg.display_name.clone(),
                    user_id: cfg.user_id.clone(),
                    tenants: cfg.tenants.clone(),
                    is_stale: cfg.is_stale,
                };
                (account, token)
            })
            .collect();
        Self::new(entries)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn get_all_accounts(&self) -> DeployResult<Vec<Account>> {
        Ok(self.entries.iter().map(|e| e.account.clone()).collect())
    }

    async fn get_account_security_token(
        &self,
        account: &Account,
        tenant_id: &str,
        resource: AzureResource,
    ) -> DeployResult<AccessToken> {
        let credential_error = |details: String| DeployError::Credential {
            account: account.display_name.clone(),
            details,
        };

        let entry = self
            .entries
            .iter()
            .find(|e| e.account.id == account.id)
            .ok_or_else(|| credential_error("account is not signed in".to_string()))?;

        if entry.account.is_stale {
            return Err(credential_error(
                "account credentials are stale; sign in again".to_string(),
            ));
        }
        if !entry.account.tenants.is_empty()
            && !entry.account.tenants.iter().any(|t| t.id == tenant_id)
        {
            return Err(credential_error(format!(
                "tenant '{}' is not associated with the account",
                tenant_id
            )));
        }
        let token = entry
            .token
            .clone()
            .ok_or_else(|| credential_error("no access token configured".to_string()))?;

        log::debug!(
            "[PHASE: credentials] [STEP: token] Issued token for user {} tenant {} scope {}",
            mask_sensitive(&entry.account.user_id),
            tenant_id,
            resource.scope()
        );
        Ok(AccessToken {
            token,
            token_type: "Bearer".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::azure::Tenant;

    fn account(id: &str, stale: bool) -> Account {
        Account {
            id: id.to_string(),
            display_name: format!("{} user", id),
            user_id: format!("{}@contoso.com", id),
            tenants: vec![Tenant {
                id: "tenant-a".to_string(),
                display_name: "Contoso".to_string(),
            }],
            is_stale: stale,
        }
    }

    #[tokio::test]
    async fn accounts_keep_provider_order() {
        let provider = StaticCredentialProvider::new(vec![
            (account("zeta", false), None),
            (account("alpha", false), None),
        ]);
        let ids: Vec<String> = provider
            .get_all_accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn token_issued_for_known_tenant() {
        let a = account("a", false);
        let provider = StaticCredentialProvider::new(vec![(a.clone(), Some("tok".to_string()))]);
        let token = provider
            .get_account_security_token(&a, "tenant-a", AzureResource::ResourceManagement)
            .await
            .unwrap();
        assert_eq!(token.token, "tok");
        assert_eq!(token.token_type, "Bearer");
    }

    #[tokio::test]
    async fn unknown_tenant_is_credential_error() {
        let a = account("a", false);
        let provider = StaticCredentialProvider::new(vec![(a.clone(), Some("tok".to_string()))]);
        let err = provider
            .get_account_security_token(&a, "tenant-z", AzureResource::ResourceManagement)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Credential { .. }));
    }

    #[tokio::test]
    async fn stale_account_is_credential_error() {
        let a = account("a", true);
        let provider = StaticCredentialProvider::new(vec![(a.clone(), Some("tok".to_string()))]);
        let err = provider
            .get_account_security_token(&a, "tenant-a", AzureResource::ResourceManagement)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("stale"));
    }

    #[tokio::test]
    async fn missing_token_is_credential_error() {
        let a = account("a", false);
        let provider = StaticCredentialProvider::new(vec![(a.clone(), None)]);
        let err = provider
            .get_account_security_token(&a, "tenant-a", AzureResource::ResourceManagement)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no access token"));
    }

    #[tokio::test]
    async fn from_settings_reads_token_variable() {
        let var = "AZSQL_DEPLOY_TEST_TOKEN_FROM_SETTINGS";
        std::env::set_var(var, "env-token");
        let cfg = AccountConfig {
            id: "acct".to_string(),
            display_name: "Acct".to_string(),
            user_id: String::new(),
            tenants: Vec::new(),
            access_token: Some("inline-token".to_string()),
            access_token_env: Some(var.to_string()),
            is_stale: false,
        };
        let provider = StaticCredentialProvider::from_settings(&[cfg]);
        let accounts = provider.get_all_accounts().await.unwrap();
        let token = provider
            .get_account_security_token(&accounts[0], "any-tenant", AzureResource::ResourceManagement)
            .await
            .unwrap();
        assert_eq!(token.token, "env-token");
        std::env::remove_var(var);
    }

    #[test]
    fn scopes_are_resource_urls() {
        assert_eq!(
            AzureResource::ResourceManagement.scope(),
            "https://management.azure.com/"
        );
    }
}
