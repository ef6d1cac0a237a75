// Deterministic wizard proof run
//
// Drives the full cascade, validation, navigation and notebook steps against canned management
// responses and writes `wizard_cascade_smoke_transcript.log` to the log folder.

use anyhow::{anyhow, Result};
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::azure::{
    ArmResourceProvider, CannedTransport, ManagementClient, StaticCredentialProvider,
};
use crate::config::ManagementSettings;
use crate::models::azure::{Account, Tenant};
use crate::models::responses::{ApiResponse, FormSnapshot, NavigationResponse};
use crate::wizard::cascade::{CascadeEmitter, CascadeEvent};
use crate::wizard::fields::Field;
use crate::wizard::loader::FieldLoader;
use crate::wizard::session::WizardSession;
use crate::wizard::settings::DatabaseSettings;

pub const TRANSCRIPT_FILE: &str = "wizard_cascade_smoke_transcript.log";
pub const NOTEBOOK_FILE: &str = "wizard_cascade_smoke_notebook.ipynb";

const SMOKE_TOKEN: &str = "smoke-token-not-a-secret";
const SERVER_ID: &str =
    "/subscriptions/11111111-0000-0000-0000-000000000001/resourceGroups/rg-orders/providers/Microsoft.Sql/servers/orders-sql";

fn smoke_account(id: &str, name: &str) -> Account {
    Account {
        id: id.to_string(),
        display_name: name.to_string(),
        user_id: format!("{}@contoso.example", id),
        tenants: vec![Tenant {
            id: "tenant-contoso".to_string(),
            display_name: "Contoso".to_string(),
        }],
        is_stale: false,
    }
}

fn canned_transport() -> CannedTransport {
    CannedTransport::new()
        .with_json(
            "/subscriptions",
            200,
            json!({ "value": [
                { "subscriptionId": "22222222-0000-0000-0000-000000000002", "displayName": "sandbox", "state": "Enabled" },
                { "subscriptionId": "11111111-0000-0000-0000-000000000001", "displayName": "Production", "state": "Enabled" },
                { "subscriptionId": "33333333-0000-0000-0000-000000000003", "displayName": "Test", "state": "Disabled" }
            ]}),
        )
        .with_json(
            "/subscriptions/11111111-0000-0000-0000-000000000001/providers/Microsoft.Sql/servers",
            200,
            json!({ "value": [
                { "name": "orders-sql", "id": SERVER_ID, "location": "westus2" }
            ]}),
        )
        .with_json(
            "/subscriptions/22222222-0000-0000-0000-000000000002/providers/Microsoft.Sql/servers",
            200,
            json!({ "value": [] }),
        )
        .with_json(
            "/subscriptions/33333333-0000-0000-0000-000000000003/providers/Microsoft.Sql/servers",
            200,
            json!({ "value": [] }),
        )
        .with_json(
            &format!("{}/databases", SERVER_ID),
            200,
            json!({ "value": [ { "name": "master", "id": format!("{}/databases/master", SERVER_ID) } ] }),
        )
}

struct Transcript {
    lines: Vec<String>,
    failures: Vec<String>,
}

impl Transcript {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn check(&mut self, label: &str, ok: bool) {
        self.push(format!("CHECK {} {}", if ok { "PASS" } else { "FAIL" }, label));
        if !ok {
            self.failures.push(label.to_string());
        }
    }

    fn snapshot(&mut self, step: &str, resp: &ApiResponse<FormSnapshot>) {
        self.push(format!(
            "STEP {} success={} error={}",
            step,
            resp.success,
            resp.error.as_deref().unwrap_or("-")
        ));
        if let Some(snap) = &resp.data {
            for view in &snap.fields {
                let options: Vec<&str> = view.options.iter().map(|c| c.display_name.as_str()).collect();
                self.push(format!(
                    "  FIELD {} status={} selected={} options=[{}]",
                    view.field,
                    view.status,
                    view.selected
                        .as_ref()
                        .map(|c| c.display_name.as_str())
                        .unwrap_or("-"),
                    options.join(", ")
                ));
            }
        }
    }

    fn navigation(&mut self, step: &str, resp: &ApiResponse<NavigationResponse>) {
        if let Some(nav) = &resp.data {
            self.push(format!(
                "STEP {} page={} state={} messages={:?}",
                step, nav.page, nav.state, nav.messages
            ));
        } else {
            self.push(format!(
                "STEP {} error={}",
                step,
                resp.error.as_deref().unwrap_or("-")
            ));
        }
    }
}

fn nav_is(resp: &ApiResponse<NavigationResponse>, page: &str, state: &str) -> bool {
    resp.data
        .as_ref()
        .map(|n| n.page == page && n.state == state)
        .unwrap_or(false)
}

/// Run the proof against canned data, writing the transcript and notebook into `out_dir`.
pub async fn wizard_cascade_smoke(out_dir: &Path) -> Result<()> {
    let transcript_path = out_dir.join(TRANSCRIPT_FILE);
    let notebook_path = out_dir.join(NOTEBOOK_FILE);

    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let emitter: CascadeEmitter = Arc::new(move |event: CascadeEvent| {
        if let Ok(mut lines) = sink.lock() {
            lines.push(format!("  EVENT {:?}", event));
        }
    });

    let transport = Arc::new(canned_transport());
    let accounts = vec![
        smoke_account("contoso-admin", "Contoso Admin"),
        smoke_account("fabrikam-ops", "Fabrikam Ops"),
    ];
    let credentials = Arc::new(StaticCredentialProvider::new(
        accounts
            .into_iter()
            .map(|a| (a, Some(SMOKE_TOKEN.to_string())))
            .collect(),
    ));
    let management = Arc::new(ManagementClient::new(
        transport.clone(),
        ManagementSettings::default(),
    ));
    let resources = Arc::new(ArmResourceProvider::new(
        credentials.clone(),
        Arc::clone(&management),
    ));
    let session = WizardSession::new(
        FieldLoader::new(credentials, resources, management),
        Some(emitter),
    );

    let mut t = Transcript {
        lines: vec!["WIZARD_CASCADE_SMOKE begin".to_string()],
        failures: Vec::new(),
    };
    let drain_events = |t: &mut Transcript| {
        if let Ok(mut pending) = events.lock() {
            t.lines.append(&mut pending);
        }
    };

    // 1. Open: accounts in provider order, subscriptions sorted, first server selected.
    let opened = session.open().await;
    drain_events(&mut t);
    t.snapshot("open", &opened);
    let snap = opened.data.clone();
    t.check("open succeeded", opened.success);
    t.check(
        "subscriptions sorted case-insensitively",
        snap.as_ref()
            .and_then(|s| s.field("subscription"))
            .map(|f| {
                let names: Vec<&str> = f.options.iter().map(|c| c.display_name.as_str()).collect();
                names.len() == 3
                    && names[0].starts_with("Production")
                    && names[1].starts_with("sandbox")
                    && names[2].starts_with("Test")
            })
            .unwrap_or(false),
    );
    t.check(
        "resource group derived from server id",
        snap.as_ref().and_then(|s| s.resource_group.as_deref()) == Some("rg-orders"),
    );

    // 2. Subscription without servers: sentinel shown, forward blocked.
    let sandbox = session
        .select(Field::Subscription, "22222222-0000-0000-0000-000000000002")
        .await;
    drain_events(&mut t);
    t.snapshot("select_sandbox", &sandbox);
    t.check(
        "empty server list shows the placeholder",
        sandbox
            .data
            .as_ref()
            .and_then(|s| s.field("server"))
            .map(|f| f.status == "empty" && f.options.len() == 1 && f.options[0].identity.is_empty())
            .unwrap_or(false),
    );
    let blocked = session.next().await;
    t.navigation("next_without_server", &blocked);
    t.check(
        "forward blocked without a server",
        nav_is(&blocked, "azureSettings", "blocked"),
    );

    // 3. Subscription with a server: forward allowed.
    let production = session
        .select(Field::Subscription, "11111111-0000-0000-0000-000000000001")
        .await;
    drain_events(&mut t);
    t.snapshot("select_production", &production);
    let advanced = session.next().await;
    t.navigation("next_azure_settings", &advanced);
    t.check(
        "azure settings page advanced",
        nav_is(&advanced, "databaseSettings", "advanced"),
    );

    // 4. Invalid database settings block; valid ones pass the name lookup.
    let invalid = DatabaseSettings {
        database_name: "master".to_string(),
        firewall_rule_name: "office".to_string(),
        start_ip_address: "10.0.0.20".to_string(),
        end_ip_address: "10.0.0.1".to_string(),
        ..DatabaseSettings::default()
    };
    session.update_database_settings(invalid).await;
    let blocked = session.next().await;
    t.navigation("next_invalid_database", &blocked);
    t.check(
        "invalid database settings blocked",
        nav_is(&blocked, "databaseSettings", "blocked")
            && blocked.data.as_ref().map(|n| n.messages.len()) == Some(2),
    );

    let valid = DatabaseSettings {
        database_name: "orders".to_string(),
        firewall_rule_name: "office".to_string(),
        start_ip_address: "10.0.0.1".to_string(),
        end_ip_address: "10.0.0.20".to_string(),
        ..DatabaseSettings::default()
    };
    session.update_database_settings(valid).await;
    let advanced = session.next().await;
    t.navigation("next_database_settings", &advanced);
    t.check(
        "database settings page advanced",
        nav_is(&advanced, "summary", "advanced"),
    );

    // 5. Back is unconditional; forward again returns to the summary.
    let back = session.back().await;
    t.navigation("back", &back);
    t.check("back always allowed", nav_is(&back, "databaseSettings", "editing"));
    let again = session.next().await;
    t.navigation("next_again", &again);

    // 6. Summary: generate the notebook.
    let finish = session.next().await;
    t.navigation("next_summary", &finish);
    t.check("summary validated", nav_is(&finish, "summary", "advanced"));
    let written = session.generate_notebook(&notebook_path).await;
    t.push(format!(
        "STEP generate_notebook success={} path={}",
        written.success,
        written.data.as_deref().unwrap_or("-")
    ));
    let notebook_text = std::fs::read_to_string(&notebook_path).unwrap_or_default();
    t.check("notebook written", written.success && !notebook_text.is_empty());
    t.check(
        "notebook carries no token",
        !notebook_text.contains(SMOKE_TOKEN),
    );

    t.push(format!(
        "REQUESTS {} (servers={}, databases={})",
        transport.requests().len(),
        transport.count_matching("Microsoft.Sql/servers?"),
        transport.count_matching("/databases?")
    ));
    t.push(format!(
        "WIZARD_CASCADE_SMOKE end failures={}",
        t.failures.len()
    ));

    let mut body = t.lines.join("\n");
    body.push('\n');
    tokio::fs::write(&transcript_path, body).await?;
    log::info!(
        "[PHASE: smoke] [STEP: transcript] Wrote {}",
        transcript_path.display()
    );

    if t.failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("smoke checks failed: {}", t.failures.join("; ")))
    }
}
