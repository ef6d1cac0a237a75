// Field loader
//
// One fresh fetch per call. Produces labelled candidates paired with the full resource object so
// the store can rebuild its lookup index from the same list the dropdown shows.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use super::fields::{Candidate, Field};
use super::store::UpstreamSnapshot;
use crate::azure::{AzureResource, CredentialProvider, ManagementClient, ResourceProvider};
use crate::error::{DeployError, DeployResult};
use crate::models::azure::{Account, SqlServer, Subscription};

#[derive(Debug, Clone)]
pub enum Loaded {
    Accounts(Vec<(Candidate, Account)>),
    Subscriptions(Vec<(Candidate, Subscription)>),
    Servers(Vec<(Candidate, SqlServer)>),
}

impl Loaded {
    pub fn candidates(&self) -> Vec<Candidate> {
        fn firsts<T>(items: &[(Candidate, T)]) -> Vec<Candidate> {
            items.iter().map(|(c, _)| c.clone()).collect()
        }
        match self {
            Loaded::Accounts(items) => firsts(items),
            Loaded::Subscriptions(items) => firsts(items),
            Loaded::Servers(items) => firsts(items),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Loaded::Accounts(items) => items.is_empty(),
            Loaded::Subscriptions(items) => items.is_empty(),
            Loaded::Servers(items) => items.is_empty(),
        }
    }
}

/// Case-insensitive ascending; labels equal ignoring case fall back to ordinal order.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn sort_by_label<T>(items: &mut [(Candidate, T)]) {
    items.sort_by(|(a, _), (b, _)| compare_labels(&a.display_name, &b.display_name));
}

/// Suffix repeated labels with " (2)", " (3)", ... in list order. A generated label never
/// collides with any label already in the list, original or generated.
fn make_labels_unique<T>(items: &mut [(Candidate, T)]) {
    let originals: HashSet<String> = items
        .iter()
        .map(|(c, _)| c.display_name.clone())
        .collect();
    let mut used: HashSet<String> = HashSet::new();
    for (candidate, _) in items.iter_mut() {
        if used.insert(candidate.display_name.clone()) {
            continue;
        }
        let mut n = 2;
        let label = loop {
            let attempt = format!("{} ({})", candidate.display_name, n);
            if !used.contains(&attempt) && !originals.contains(&attempt) {
                break attempt;
            }
            n += 1;
        };
        used.insert(label.clone());
        candidate.display_name = label;
    }
}

pub fn subscription_label(sub: &Subscription) -> String {
    format!("{} ({})", sub.name, sub.id)
}

#[derive(Clone)]
pub struct FieldLoader {
    credentials: Arc<dyn CredentialProvider>,
    resources: Arc<dyn ResourceProvider>,
    management: Arc<ManagementClient>,
}

impl FieldLoader {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        resources: Arc<dyn ResourceProvider>,
        management: Arc<ManagementClient>,
    ) -> Self {
        Self {
            credentials,
            resources,
            management,
        }
    }

    pub async fn load(&self, field: Field, upstream: &UpstreamSnapshot) -> DeployResult<Loaded> {
        match field {
            Field::Account => self.load_accounts().await,
            Field::Subscription => self.load_subscriptions(upstream.account.as_ref()).await,
            Field::Server => {
                self.load_servers(upstream.account.as_ref(), upstream.subscription.as_ref())
                    .await
            }
            Field::ResourceGroup => Err(DeployError::DerivedField(field)),
        }
    }

    async fn load_accounts(&self) -> DeployResult<Loaded> {
        let accounts = self.credentials.get_all_accounts().await?;
        let mut items: Vec<(Candidate, Account)> = accounts
            .into_iter()
            .map(|a| (Candidate::new(a.display_name.clone(), a.id.clone()), a))
            .collect();
        make_labels_unique(&mut items);
        log::info!(
            "[PHASE: cascade] [STEP: load_accounts] {} account(s)",
            items.len()
        );
        Ok(Loaded::Accounts(items))
    }

    async fn load_subscriptions(&self, account: Option<&Account>) -> DeployResult<Loaded> {
        let Some(account) = account else {
            log::debug!("[PHASE: cascade] [STEP: load_subscriptions] No account selected");
            return Ok(Loaded::Subscriptions(Vec::new()));
        };
        let subs = self.resources.get_subscriptions(account, true).await?;
        let mut items: Vec<(Candidate, Subscription)> = subs
            .into_iter()
            .map(|s| (Candidate::new(subscription_label(&s), s.id.clone()), s))
            .collect();
        sort_by_label(&mut items);
        make_labels_unique(&mut items);
        log::info!(
            "[PHASE: cascade] [STEP: load_subscriptions] {} subscription(s)",
            items.len()
        );
        Ok(Loaded::Subscriptions(items))
    }

    async fn load_servers(
        &self,
        account: Option<&Account>,
        subscription: Option<&Subscription>,
    ) -> DeployResult<Loaded> {
        let (Some(account), Some(subscription)) = (account, subscription) else {
            log::debug!("[PHASE: cascade] [STEP: load_servers] No subscription selected");
            return Ok(Loaded::Servers(Vec::new()));
        };
        let token = self
            .credentials
            .get_account_security_token(
                account,
                &subscription.tenant_id,
                AzureResource::ResourceManagement,
            )
            .await?;
        let servers = self
            .management
            .list_sql_servers(&token, &subscription.id)
            .await?
            .into_result("list servers")?;

        let mut items: Vec<(Candidate, SqlServer)> = servers
            .into_iter()
            .map(|s| (Candidate::new(s.name.clone(), s.id.clone()), s))
            .collect();
        sort_by_label(&mut items);
        make_labels_unique(&mut items);
        log::info!(
            "[PHASE: cascade] [STEP: load_servers] {} server(s) in subscription {}",
            items.len(),
            subscription.id
        );
        Ok(Loaded::Servers(items))
    }

    /// Whether `name` already exists on the selected server (case-insensitive).
    pub async fn database_exists(&self, upstream: &UpstreamSnapshot, name: &str) -> DeployResult<bool> {
        let (Some(account), Some(subscription), Some(server)) = (
            upstream.account.as_ref(),
            upstream.subscription.as_ref(),
            upstream.server.as_ref(),
        ) else {
            return Ok(false);
        };
        let token = self
            .credentials
            .get_account_security_token(
                account,
                &subscription.tenant_id,
                AzureResource::ResourceManagement,
            )
            .await?;
        let databases = self
            .management
            .list_databases(&token, &server.id)
            .await?
            .into_result("list databases")?;
        let wanted = name.trim();
        Ok(databases
            .iter()
            .any(|db| db.name.eq_ignore_ascii_case(wanted)))
    }
}
