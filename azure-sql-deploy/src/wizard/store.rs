// Selection store
//
// Current selections plus the candidate -> resource lookup indexes, in dropdown order. Indexes
// are rebuilt wholesale on every reload, never merged. The canonical object behind a selection is
// always found through the candidate's identity; labels are only for matching user input.

use super::fields::{Candidate, Field};
use super::graph;
use crate::azure::resource_id::resource_group_from_id;
use crate::models::azure::{Account, SqlServer, Subscription};

/// Resolved upstream objects captured when a load begins.
#[derive(Debug, Clone, Default)]
pub struct UpstreamSnapshot {
    pub account: Option<Account>,
    pub subscription: Option<Subscription>,
    pub server: Option<SqlServer>,
}

#[derive(Debug, Default)]
pub struct SelectionStore {
    account: Option<Candidate>,
    subscription: Option<Candidate>,
    server: Option<Candidate>,
    resource_group: Option<String>,
    account_index: Vec<(Candidate, Account)>,
    subscription_index: Vec<(Candidate, Subscription)>,
    server_index: Vec<(Candidate, SqlServer)>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<Candidate> {
        match field {
            Field::Account => self.account.clone(),
            Field::Subscription => self.subscription.clone(),
            Field::Server => self.server.clone(),
            Field::ResourceGroup => self
                .resource_group
                .as_ref()
                .map(|rg| Candidate::new(rg.clone(), rg.clone())),
        }
    }

    pub fn resource_group(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    /// Returns true when the stored value changed. A change clears every downstream field.
    pub fn set(&mut self, field: Field, value: Option<Candidate>) -> bool {
        if graph::is_derived(field) {
            log::warn!(
                "[PHASE: selection] Ignoring direct write to derived field '{}'",
                field.as_id()
            );
            return false;
        }
        // An empty identity is the "no servers" placeholder, not a selection.
        let value = value.filter(|c| !c.identity.is_empty());

        let slot = match field {
            Field::Account => &mut self.account,
            Field::Subscription => &mut self.subscription,
            Field::Server => &mut self.server,
            Field::ResourceGroup => return false,
        };
        if *slot == value {
            return false;
        }
        *slot = value;

        self.clear_dependents(field);
        if field == Field::Server {
            self.resource_group = self
                .server
                .as_ref()
                .and_then(|s| resource_group_from_id(&s.identity));
        }
        true
    }

    /// Clear values and indexes of every field transitively downstream of `field`.
    pub fn clear_dependents(&mut self, field: Field) {
        for dep in graph::downstream(field) {
            match dep {
                Field::Account => {
                    self.account = None;
                    self.account_index.clear();
                }
                Field::Subscription => {
                    self.subscription = None;
                    self.subscription_index.clear();
                }
                Field::Server => {
                    self.server = None;
                    self.server_index.clear();
                }
                Field::ResourceGroup => self.resource_group = None,
            }
        }
    }

    pub fn replace_accounts(&mut self, entries: &[(Candidate, Account)]) {
        self.account_index = entries.to_vec();
    }

    pub fn replace_subscriptions(&mut self, entries: &[(Candidate, Subscription)]) {
        self.subscription_index = entries.to_vec();
    }

    pub fn replace_servers(&mut self, entries: &[(Candidate, SqlServer)]) {
        self.server_index = entries.to_vec();
    }

    /// Map user input back to an indexed candidate: exact label, then exact identity, then
    /// identity ignoring ASCII case. Ties go to the earliest entry in dropdown order.
    pub fn resolve(&self, field: Field, query: &str) -> Option<Candidate> {
        fn find<T>(index: &[(Candidate, T)], query: &str) -> Option<Candidate> {
            index
                .iter()
                .find(|(c, _)| c.display_name == query)
                .or_else(|| index.iter().find(|(c, _)| c.identity == query))
                .or_else(|| {
                    index
                        .iter()
                        .find(|(c, _)| c.identity.eq_ignore_ascii_case(query))
                })
                .map(|(c, _)| c.clone())
        }

        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        match field {
            Field::Account => find(&self.account_index, query),
            Field::Subscription => find(&self.subscription_index, query),
            Field::Server => find(&self.server_index, query),
            Field::ResourceGroup => None,
        }
    }

    fn lookup<'a, T>(index: &'a [(Candidate, T)], selected: Option<&Candidate>) -> Option<&'a T> {
        let selected = selected?;
        index
            .iter()
            .find(|(c, _)| c.identity == selected.identity)
            .map(|(_, item)| item)
    }

    pub fn account(&self) -> Option<&Account> {
        Self::lookup(&self.account_index, self.account.as_ref())
    }

    pub fn subscription(&self) -> Option<&Subscription> {
        Self::lookup(&self.subscription_index, self.subscription.as_ref())
    }

    pub fn server(&self) -> Option<&SqlServer> {
        Self::lookup(&self.server_index, self.server.as_ref())
    }

    pub fn upstream_snapshot(&self) -> UpstreamSnapshot {
        UpstreamSnapshot {
            account: self.account().cloned(),
            subscription: self.subscription().cloned(),
            server: self.server().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> (Candidate, Account) {
        (
            Candidate::new(format!("{} user", id), id),
            Account {
                id: id.to_string(),
                display_name: format!("{} user", id),
                user_id: String::new(),
                tenants: Vec::new(),
                is_stale: false,
            },
        )
    }

    fn subscription(id: &str, name: &str) -> (Candidate, Subscription) {
        (
            Candidate::new(format!("{} ({})", name, id), id),
            Subscription {
                id: id.to_string(),
                name: name.to_string(),
                tenant_id: "t".to_string(),
                state: "Enabled".to_string(),
            },
        )
    }

    fn server(sub: &str, rg: &str, name: &str) -> (Candidate, SqlServer) {
        let id = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Sql/servers/{}",
            sub, rg, name
        );
        (
            Candidate::new(name, id.clone()),
            SqlServer {
                id,
                name: name.to_string(),
                location: None,
            },
        )
    }

    fn populated() -> SelectionStore {
        let mut store = SelectionStore::new();
        let a = account("a");
        store.replace_accounts(&[a.clone()]);
        store.set(Field::Account, Some(a.0));
        let s = subscription("X", "Dev");
        store.replace_subscriptions(&[s.clone()]);
        store.set(Field::Subscription, Some(s.0));
        let srv = server("X", "RG1", "srv1");
        store.replace_servers(&[srv.clone()]);
        store.set(Field::Server, Some(srv.0));
        store
    }

    #[test]
    fn server_selection_derives_resource_group() {
        let store = populated();
        assert_eq!(store.resource_group(), Some("RG1"));
        assert_eq!(
            store.get(Field::ResourceGroup),
            Some(Candidate::new("RG1", "RG1"))
        );
    }

    #[test]
    fn changing_account_clears_everything_downstream() {
        let mut store = populated();
        let b = account("b");
        store.replace_accounts(&[account("a"), b.clone()]);
        assert!(store.set(Field::Account, Some(b.0)));

        assert_eq!(store.get(Field::Subscription), None);
        assert_eq!(store.get(Field::Server), None);
        assert_eq!(store.resource_group(), None);
        assert!(store.resolve(Field::Subscription, "Dev (X)").is_none());
        assert!(store.subscription().is_none());
    }

    #[test]
    fn changing_subscription_keeps_account() {
        let mut store = populated();
        let other = subscription("Y", "Prod");
        store.replace_subscriptions(&[subscription("X", "Dev"), other.clone()]);
        store.set(Field::Subscription, Some(other.0));
        assert!(store.get(Field::Account).is_some());
        assert_eq!(store.get(Field::Server), None);
        assert_eq!(store.resource_group(), None);
    }

    #[test]
    fn unchanged_value_is_not_a_change() {
        let mut store = populated();
        let same = store.get(Field::Account);
        assert!(!store.set(Field::Account, same));
        assert_eq!(store.resource_group(), Some("RG1"));
    }

    #[test]
    fn resource_group_cannot_be_written() {
        let mut store = populated();
        assert!(!store.set(Field::ResourceGroup, Some(Candidate::new("other", "other"))));
        assert_eq!(store.resource_group(), Some("RG1"));
    }

    #[test]
    fn placeholder_server_is_never_stored() {
        let mut store = populated();
        store.set(Field::Server, Some(Candidate::new("No servers found", "")));
        assert_eq!(store.get(Field::Server), None);
        assert_eq!(store.resource_group(), None);
    }

    #[test]
    fn resolve_by_label_or_identity() {
        let store = populated();
        assert_eq!(
            store.resolve(Field::Subscription, "Dev (X)").map(|c| c.identity),
            Some("X".to_string())
        );
        assert_eq!(
            store.resolve(Field::Subscription, "x").map(|c| c.display_name),
            Some("Dev (X)".to_string())
        );
        assert!(store.resolve(Field::Subscription, "nope").is_none());
        assert!(store.resolve(Field::ResourceGroup, "RG1").is_none());
    }

    #[test]
    fn canonical_object_follows_identity_not_label() {
        let mut store = SelectionStore::new();
        let (_, first) = account("a1");
        let (_, second) = account("a2");
        // Two entries sharing a label must still resolve to the selected identity.
        store.replace_accounts(&[
            (Candidate::new("Bob", "a1"), first),
            (Candidate::new("Bob", "a2"), second),
        ]);
        store.set(Field::Account, Some(Candidate::new("Bob", "a2")));
        assert_eq!(store.account().map(|a| a.id.as_str()), Some("a2"));
        assert_eq!(
            store.upstream_snapshot().account.map(|a| a.id),
            Some("a2".to_string())
        );
    }

    #[test]
    fn exact_identity_wins_over_case_insensitive_match() {
        let mut store = SelectionStore::new();
        store.replace_subscriptions(&[subscription("abc", "Lower"), subscription("ABC", "Upper")]);
        assert_eq!(
            store.resolve(Field::Subscription, "ABC").map(|c| c.display_name),
            Some("Upper (ABC)".to_string())
        );
        assert_eq!(
            store.resolve(Field::Subscription, "abc").map(|c| c.display_name),
            Some("Lower (abc)".to_string())
        );
        assert_eq!(
            store.resolve(Field::Subscription, "Abc").map(|c| c.display_name),
            Some("Lower (abc)".to_string())
        );
    }

    #[test]
    fn index_replacement_drops_old_entries() {
        let mut store = populated();
        store.replace_servers(&[server("X", "RG2", "srv2")]);
        assert!(store.resolve(Field::Server, "srv1").is_none());
        assert!(store.resolve(Field::Server, "srv2").is_some());
    }

    #[test]
    fn snapshot_resolves_full_objects() {
        let snap = populated().upstream_snapshot();
        assert_eq!(snap.account.map(|a| a.id), Some("a".to_string()));
        assert_eq!(snap.subscription.map(|s| s.name), Some("Dev".to_string()));
        assert_eq!(snap.server.map(|s| s.name), Some("srv1".to_string()));
    }
}
