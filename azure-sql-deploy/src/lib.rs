// Azure SQL Database deployment wizard
// Library entry point

pub mod azure;
pub mod config;
pub mod error;
pub mod models;
pub mod notebook;
pub mod smoke;
pub mod utils;
pub mod wizard;

use anyhow::{anyhow, bail, Context};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::azure::{ArmResourceProvider, ManagementClient, ReqwestTransport, StaticCredentialProvider};
use crate::config::{LoggingSettings, Settings};
use crate::models::requests::DeploymentAnswers;
use crate::models::responses::{ApiResponse, NavigationResponse};
use crate::wizard::{Field, FieldLoader, WizardSession};

/// Initialize logging with dual format (JSON + human-readable). Returns the log folder.
fn init_logging(
    settings: &LoggingSettings,
    with_stdout: bool,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_dir = match &settings.directory {
        Some(dir) => dir.clone(),
        None => utils::path_resolver::resolve_log_folder()?,
    };
    std::fs::create_dir_all(&log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");
    let json_log_file = log_dir.join(format!("azsql-deploy-{}.log", timestamp));
    let txt_log_file = log_dir.join(format!("azsql-deploy-{}.txt", timestamp));

    let mut dispatch = fern::Dispatch::new().level(settings.level_filter());

    if with_stdout {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let meta = utils::logging::parse_log_metadata(&message.to_string());
                    out.finish(format_args!(
                        "{}",
                        utils::logging::format_human_readable_log(
                            &timestamp_local.to_string(),
                            record.level(),
                            record.target(),
                            &meta,
                        )
                    ));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_utc = chrono::Utc::now().to_rfc3339();
                    let meta = utils::logging::parse_log_metadata(&message.to_string());
                    out.finish(format_args!(
                        "{}\n",
                        utils::logging::format_json_log(
                            &timestamp_utc,
                            record.level(),
                            record.target(),
                            &meta,
                        )
                    ));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(move |out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    let meta = utils::logging::parse_log_metadata(&message.to_string());
                    out.finish(format_args!(
                        "{}\n",
                        utils::logging::format_human_readable_log(
                            &timestamp_local.to_string(),
                            record.level(),
                            record.target(),
                            &meta,
                        )
                    ));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    log::info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(log_dir)
}

fn log_dir_or_fallback(settings: &LoggingSettings, with_stdout: bool) -> PathBuf {
    match init_logging(settings, with_stdout) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            utils::path_resolver::resolve_deployment_folder().join("Deploy_Wizard_Log")
        }
    }
}

fn block_on<F: std::future::Future<Output = anyhow::Result<()>>>(
    what: &str,
    fut: F,
) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to create async runtime for {}: {}", what, e))?;
    rt.block_on(fut)
}

/// Deterministic cascade proof runner (for automated verification / log capture).
/// Writes `wizard_cascade_smoke_transcript.log` under the log folder and exits 0/1.
pub fn run_wizard_smoke() {
    let log_dir = log_dir_or_fallback(&LoggingSettings::default(), false);
    info!(
        "[PHASE: initialization] Wizard cascade smoke starting at {}",
        chrono::Utc::now()
    );

    let result = std::fs::create_dir_all(&log_dir)
        .map_err(anyhow::Error::from)
        .and_then(|_| block_on("wizard smoke", smoke::wizard_cascade_smoke(&log_dir)));

    match result {
        Ok(()) => {
            println!(
                "Wizard cascade smoke passed. Transcript: {}",
                log_dir.join(smoke::TRANSCRIPT_FILE).display()
            );
        }
        Err(e) => {
            error!(
                "[PHASE: smoke] [STEP: wizard_cascade] Smoke exited with error: {:?}",
                e
            );
            eprintln!("Wizard smoke failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn require_advanced(resp: ApiResponse<NavigationResponse>) -> anyhow::Result<NavigationResponse> {
    let Some(nav) = resp.data else {
        bail!(resp.error.unwrap_or_else(|| "Navigation failed.".to_string()));
    };
    if nav.state != "advanced" {
        bail!(
            "Cannot continue from {}: {}",
            nav.page,
            if nav.messages.is_empty() {
                resp.error.unwrap_or_else(|| "validation failed".to_string())
            } else {
                nav.messages.join(" ")
            }
        );
    }
    Ok(nav)
}

/// Drive a session with pre-recorded answers through every page, ending validated on the summary.
pub async fn apply_answers(
    session: &WizardSession,
    answers: &DeploymentAnswers,
) -> anyhow::Result<()> {
    let opened = session.open().await;
    if !opened.success {
        bail!(opened
            .error
            .unwrap_or_else(|| "Unable to open the wizard.".to_string()));
    }

    let picks = [
        (Field::Account, answers.account.as_deref()),
        (Field::Subscription, answers.subscription.as_deref()),
        (Field::Server, answers.server.as_deref()),
    ];
    for (field, query) in picks {
        let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
            continue;
        };
        info!(
            "[PHASE: answers] [STEP: {}] Selecting '{}'",
            field.as_id(),
            query
        );
        let resp = session.select(field, query).await;
        if !resp.success {
            bail!(resp
                .error
                .unwrap_or_else(|| format!("Unable to select '{}'.", query)));
        }
    }

    require_advanced(session.next().await)?;
    session
        .update_database_settings(answers.database.clone())
        .await;
    require_advanced(session.next().await)?;
    // Summary re-validates every page before anything is generated.
    require_advanced(session.next().await)?;
    Ok(())
}

async fn generate_from_answers(
    answers_path: &Path,
    config_path: Option<&Path>,
    out: Option<&Path>,
    settings: Settings,
) -> anyhow::Result<()> {
    let answers = DeploymentAnswers::load(answers_path)
        .with_context(|| format!("Failed to read answers file {}", answers_path.display()))?;
    info!(
        "[PHASE: answers] [STEP: load] Answers {} (config: {:?})",
        answers_path.display(),
        config_path
    );

    let transport = Arc::new(ReqwestTransport::new(settings.management.timeout())?);
    let credentials = Arc::new(StaticCredentialProvider::from_settings(&settings.accounts));
    let management = Arc::new(ManagementClient::new(transport, settings.management.clone()));
    let resources = Arc::new(ArmResourceProvider::new(
        credentials.clone(),
        Arc::clone(&management),
    ));
    let session = WizardSession::new(FieldLoader::new(credentials, resources, management), None)
        .with_kernel(settings.notebook.kernel_name.clone());

    apply_answers(&session, &answers).await?;

    let path = utils::path_resolver::resolve_notebook_path(
        out,
        settings.notebook.output_dir.as_deref(),
        answers.database.database_name.trim(),
    );
    let written = session.generate_notebook(&path).await;
    if !written.success {
        bail!(written
            .error
            .unwrap_or_else(|| "Notebook generation failed.".to_string()));
    }
    println!("Notebook written to {}", path.display());
    Ok(())
}

/// Non-interactive run: apply an answers file to the live wizard and write the notebook. Exits 0/1.
pub fn run_generate_notebook(answers_path: PathBuf, config_path: Option<PathBuf>, out: Option<PathBuf>) {
    let settings = match Settings::load(config_path.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    log_dir_or_fallback(&settings.logging, settings.logging.stdout);
    info!(
        "[PHASE: initialization] Notebook generation starting at {}",
        chrono::Utc::now()
    );

    let result = block_on(
        "notebook generation",
        generate_from_answers(&answers_path, config_path.as_deref(), out.as_deref(), settings),
    );
    if let Err(e) = result {
        error!(
            "[PHASE: notebook] [STEP: generate] Run exited with error: {:?}",
            e
        );
        eprintln!("Deployment wizard error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::CannedTransport;
    use crate::wizard::loader::test_support::*;
    use crate::wizard::DatabaseSettings;
    use serde_json::json;

    const SERVER_ID: &str = "/subscriptions/X/resourceGroups/RG1/providers/Microsoft.Sql/servers/srv1";

    fn session() -> WizardSession {
        let transport = Arc::new(
            CannedTransport::new()
                .with_json(
                    "/subscriptions/X/providers/Microsoft.Sql/servers",
                    200,
                    json!({ "value": [ { "name": "srv1", "id": SERVER_ID } ] }),
                )
                .with_json(
                    "/subscriptions/Y/providers/Microsoft.Sql/servers",
                    200,
                    json!({ "value": [] }),
                )
                .with_json(
                    &format!("{}/databases", SERVER_ID),
                    200,
                    json!({ "value": [] }),
                ),
        );
        let mut resources = MapResourceProvider::default();
        resources.by_account.insert(
            "a".to_string(),
            vec![subscription("X", "Dev"), subscription("Y", "Bare")],
        );
        WizardSession::new(
            loader_with(vec![account("a")], Arc::new(resources), transport),
            None,
        )
    }

    fn answers(subscription: &str) -> DeploymentAnswers {
        DeploymentAnswers {
            account: Some("Account a".to_string()),
            subscription: Some(subscription.to_string()),
            server: None,
            database: DatabaseSettings {
                database_name: "orders".to_string(),
                firewall_rule_name: "office".to_string(),
                start_ip_address: "10.0.0.1".to_string(),
                end_ip_address: "10.0.0.20".to_string(),
                ..DatabaseSettings::default()
            },
        }
    }

    #[tokio::test]
    async fn answers_drive_session_to_summary() {
        let s = session();
        apply_answers(&s, &answers("x")).await.unwrap();
        let snap = s.snapshot().await;
        assert_eq!(snap.page, "summary");
        assert_eq!(snap.resource_group.as_deref(), Some("RG1"));
        assert!(s.deployment_parameters().await.success);
    }

    #[tokio::test]
    async fn answers_with_serverless_subscription_fail() {
        let err = apply_answers(&session(), &answers("Bare (Y)"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No servers found"), "{}", err);
    }

    #[tokio::test]
    async fn unknown_answer_is_reported() {
        let err = apply_answers(&session(), &answers("Prod"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'Prod'"), "{}", err);
    }
}
