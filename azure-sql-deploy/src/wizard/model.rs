// Wizard model
//
// Everything the wizard pages mutate, kept behind a single lock: selections, field load states,
// the database settings page, and the navigation state machine.

use super::fields::{display_options, Candidate, Field, FieldBoard, FieldState};
use super::graph;
use super::loader::Loaded;
use super::navigation::{WizardNavigator, WizardPage};
use super::settings::DatabaseSettings;
use super::store::{SelectionStore, UpstreamSnapshot};
use super::validator;
use crate::error::{DeployError, DeployResult};
use crate::models::responses::{FieldView, FormSnapshot};
use crate::notebook::{DeploymentParameters, FirewallRule};

#[derive(Debug, Default)]
pub struct WizardModel {
    pub store: SelectionStore,
    pub fields: FieldBoard,
    pub database: DatabaseSettings,
    pub navigation: WizardNavigator,
}

impl WizardModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a selection. On change, every downstream field loses its options and any in-flight
    /// load for it is orphaned before anything new is fetched.
    pub fn apply_selection(&mut self, field: Field, value: Option<Candidate>) -> bool {
        let changed = self.store.set(field, value);
        if changed {
            for dep in graph::downstream(field) {
                if !graph::is_derived(dep) {
                    self.fields.invalidate(dep);
                }
            }
            self.navigation.mark_edited();
        }
        changed
    }

    /// Rebuild the field's lookup index from a completed load.
    pub fn replace_index(&mut self, loaded: &Loaded) {
        match loaded {
            Loaded::Accounts(items) => self.store.replace_accounts(items),
            Loaded::Subscriptions(items) => self.store.replace_subscriptions(items),
            Loaded::Servers(items) => self.store.replace_servers(items),
        }
    }

    pub fn upstream_snapshot(&self) -> UpstreamSnapshot {
        self.store.upstream_snapshot()
    }

    pub fn validate_azure_settings(&self) -> Vec<String> {
        validator::validate(&self.store, &self.fields)
    }

    pub fn update_database(&mut self, settings: DatabaseSettings) {
        if self.database != settings {
            self.database = settings;
            self.navigation.mark_edited();
        }
    }

    /// Synchronous checks for `page`. The database-name lookup is done by the caller.
    pub fn validate_page(&self, page: WizardPage) -> Vec<String> {
        match page {
            WizardPage::AzureSettings => self.validate_azure_settings(),
            WizardPage::DatabaseSettings => self.database.validate(),
            WizardPage::Summary => {
                let mut errors = self.validate_azure_settings();
                errors.extend(self.database.validate());
                errors
            }
        }
    }

    pub fn deployment_parameters(&self) -> DeployResult<DeploymentParameters> {
        let mut errors = self.validate_azure_settings();
        errors.extend(self.database.validate());
        if !errors.is_empty() {
            return Err(DeployError::Incomplete(errors.join(" ")));
        }

        let (Some(account), Some(subscription), Some(server)) = (
            self.store.account(),
            self.store.subscription(),
            self.store.server(),
        ) else {
            return Err(DeployError::Incomplete(
                "Azure selections are incomplete.".to_string(),
            ));
        };
        let resource_group = self.store.resource_group().ok_or_else(|| {
            DeployError::Incomplete(format!(
                "Unable to determine the resource group of server '{}'.",
                server.name
            ))
        })?;

        let db = &self.database;
        Ok(DeploymentParameters {
            account_name: account.display_name.clone(),
            subscription_id: subscription.id.clone(),
            subscription_name: subscription.name.clone(),
            tenant_id: subscription.tenant_id.clone(),
            resource_group: resource_group.to_string(),
            server_name: server.name.clone(),
            location: server.location.clone(),
            database_name: db.database_name.trim().to_string(),
            collation: db.collation.trim().to_string(),
            firewall_rule: db.create_firewall_rule.then(|| FirewallRule {
                name: db.firewall_rule_name.trim().to_string(),
                start_ip_address: db.start_ip_address.trim().to_string(),
                end_ip_address: db.end_ip_address.trim().to_string(),
            }),
        })
    }

    pub fn field_view(&self, field: Field) -> FieldView {
        if graph::is_derived(field) {
            let selected = self.store.get(field);
            return FieldView {
                field: field.as_id().to_string(),
                status: if selected.is_some() { "ready" } else { "idle" }.to_string(),
                options: selected.iter().cloned().collect(),
                selected,
                message: None,
            };
        }
        let state = self.fields.state(field);
        FieldView {
            field: field.as_id().to_string(),
            status: state.as_id().to_string(),
            options: display_options(field, state),
            selected: self.store.get(field),
            message: match state {
                FieldState::Error(message) => Some(message.clone()),
                _ => None,
            },
        }
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            page: self.navigation.page().as_id().to_string(),
            navigation: self.navigation.state().as_id().to_string(),
            fields: Field::ALL.iter().map(|f| self.field_view(*f)).collect(),
            resource_group: self.store.resource_group().map(str::to_string),
            region: self.store.server().and_then(|s| s.location.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::azure::{Account, SqlServer, Subscription};

    fn settled() -> WizardModel {
        let mut model = WizardModel::new();
        let account = (
            Candidate::new("Contoso", "a"),
            Account {
                id: "a".to_string(),
                display_name: "Contoso".to_string(),
                user_id: String::new(),
                tenants: Vec::new(),
                is_stale: false,
            },
        );
        model.replace_index(&Loaded::Accounts(vec![account.clone()]));
        model.apply_selection(Field::Account, Some(account.0));

        let sub = (
            Candidate::new("Dev (X)", "X"),
            Subscription {
                id: "X".to_string(),
                name: "Dev".to_string(),
                tenant_id: "tenant-1".to_string(),
                state: "Enabled".to_string(),
            },
        );
        model.replace_index(&Loaded::Subscriptions(vec![sub.clone()]));
        model.apply_selection(Field::Subscription, Some(sub.0));

        let id = "/subscriptions/X/resourceGroups/RG1/providers/Microsoft.Sql/servers/srv1";
        let server = (
            Candidate::new("srv1", id),
            SqlServer {
                id: id.to_string(),
                name: "srv1".to_string(),
                location: Some("westus2".to_string()),
            },
        );
        model.replace_index(&Loaded::Servers(vec![server.clone()]));
        model.apply_selection(Field::Server, Some(server.0));

        model.database = DatabaseSettings {
            database_name: "orders".to_string(),
            firewall_rule_name: "office".to_string(),
            start_ip_address: "10.0.0.1".to_string(),
            end_ip_address: "10.0.0.20".to_string(),
            ..DatabaseSettings::default()
        };
        model
    }

    #[test]
    fn selection_change_invalidates_downstream_field_states() {
        let mut model = settled();
        let ticket = model.fields.begin_load(Field::Server);
        model.apply_selection(Field::Subscription, None);
        assert!(!model.fields.is_current(&ticket));
        assert_eq!(model.fields.state(Field::Server), &FieldState::Idle);
        assert!(model.store.get(Field::Server).is_none());
    }

    #[test]
    fn parameters_built_from_settled_model() {
        let params = settled().deployment_parameters().unwrap();
        assert_eq!(params.resource_group, "RG1");
        assert_eq!(params.subscription_id, "X");
        assert_eq!(params.tenant_id, "tenant-1");
        assert_eq!(params.location.as_deref(), Some("westus2"));
        assert_eq!(params.firewall_rule.unwrap().name, "office");
    }

    #[test]
    fn parameters_refused_when_incomplete() {
        let mut model = settled();
        model.apply_selection(Field::Subscription, None);
        let err = model.deployment_parameters().unwrap_err();
        assert!(err.to_string().contains("Select a subscription."), "{}", err);
    }

    #[test]
    fn snapshot_shows_sentinel_for_empty_server_list() {
        let mut model = settled();
        model.apply_selection(Field::Subscription, None);
        let ticket = model.fields.begin_load(Field::Server);
        model.fields.finish(&ticket, FieldState::Empty);

        let snap = model.snapshot();
        let server = snap.field("server").unwrap();
        assert_eq!(server.status, "empty");
        assert_eq!(server.options, vec![Candidate::new("No servers found", "")]);
        assert!(server.selected.is_none());
        assert!(snap.resource_group.is_none());
    }

    #[test]
    fn snapshot_reports_derived_resource_group() {
        let snap = settled().snapshot();
        assert_eq!(snap.resource_group.as_deref(), Some("RG1"));
        assert_eq!(snap.region.as_deref(), Some("westus2"));
        assert_eq!(snap.field("resourceGroup").unwrap().status, "ready");
    }

    #[test]
    fn database_edit_returns_navigation_to_editing() {
        let mut model = settled();
        model.navigation.begin_forward();
        let mut db = model.database.clone();
        db.database_name = "billing".to_string();
        model.update_database(db);
        assert_eq!(model.navigation.state().as_id(), "editing");
    }
}
