// Wizard session
//
// The action boundary: every handler a UI would bind (dropdown change, Next, Back, Generate)
// lands here. Failures are logged with a correlation id and returned as user-facing messages.
// Nothing is retried automatically.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::cascade::{CascadeEmitter, CascadeExecutor, ChainOutcome};
use super::fields::Field;
use super::loader::FieldLoader;
use super::model::WizardModel;
use super::navigation::{NavigationState, WizardPage};
use super::settings::DatabaseSettings;
use crate::error::DeployError;
use crate::models::responses::{ApiResponse, FormSnapshot, NavigationResponse};
use crate::notebook::{generate_notebook_for_kernel, write_notebook, DeploymentParameters};

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone)]
pub struct WizardSession {
    model: Arc<Mutex<WizardModel>>,
    executor: CascadeExecutor,
    kernel_name: String,
}

impl WizardSession {
    pub fn new(loader: FieldLoader, emitter: Option<CascadeEmitter>) -> Self {
        let model = Arc::new(Mutex::new(WizardModel::new()));
        let executor = CascadeExecutor::new(Arc::clone(&model), loader, emitter);
        Self {
            model,
            executor,
            kernel_name: crate::notebook::DEFAULT_KERNEL.to_string(),
        }
    }

    pub fn with_kernel(mut self, kernel_name: impl Into<String>) -> Self {
        self.kernel_name = kernel_name.into();
        self
    }

    async fn fail_with_snapshot(
        &self,
        step: &str,
        err: &DeployError,
    ) -> ApiResponse<FormSnapshot> {
        let corr = correlation_id();
        log::error!(
            "[PHASE: wizard] [STEP: {}] correlation_id={} {}",
            step,
            corr,
            err
        );
        let snapshot = self.snapshot().await;
        ApiResponse::fail_with_data(snapshot, err.user_message(), corr)
    }

    async fn chain_response(
        &self,
        step: &str,
        outcome: Result<ChainOutcome, DeployError>,
    ) -> ApiResponse<FormSnapshot> {
        match outcome {
            Ok(ChainOutcome::NoAccounts) => {
                let corr = correlation_id();
                log::warn!(
                    "[PHASE: wizard] [STEP: {}] correlation_id={} no accounts available",
                    step,
                    corr
                );
                ApiResponse::fail_with_data(
                    self.snapshot().await,
                    "No Azure accounts found. Sign in to an Azure account to continue.",
                    corr,
                )
            }
            Ok(_) => ApiResponse::ok(self.snapshot().await),
            Err(e) => self.fail_with_snapshot(step, &e).await,
        }
    }

    /// Build the form and cascade default selections.
    pub async fn open(&self) -> ApiResponse<FormSnapshot> {
        log::info!("[PHASE: wizard] [STEP: open] Opening deployment wizard");
        let outcome = self.executor.initialize().await;
        self.chain_response("open", outcome).await
    }

    pub async fn select(&self, field: Field, query: &str) -> ApiResponse<FormSnapshot> {
        let outcome = self.executor.select(field, query).await;
        self.chain_response(field.as_id(), outcome).await
    }

    pub async fn update_database_settings(
        &self,
        settings: DatabaseSettings,
    ) -> ApiResponse<FormSnapshot> {
        {
            let mut model = self.model.lock().await;
            model.update_database(settings);
        }
        ApiResponse::ok(self.snapshot().await)
    }

    /// Forward navigation attempt for the current page.
    pub async fn next(&self) -> ApiResponse<NavigationResponse> {
        let (page, mut errors, upstream, db_name) = {
            let mut model = self.model.lock().await;
            let page = model.navigation.begin_forward();
            (
                page,
                model.validate_page(page),
                model.upstream_snapshot(),
                model.database.database_name.clone(),
            )
        };
        log::info!(
            "[PHASE: navigation] [STEP: next] Validating page {}",
            page.as_id()
        );

        if errors.is_empty() && page == WizardPage::DatabaseSettings {
            match self
                .executor
                .loader()
                .database_exists(&upstream, &db_name)
                .await
            {
                Ok(true) => {
                    let model = self.model.lock().await;
                    errors.push(model.database.name_taken_message());
                }
                Ok(false) => {}
                Err(e) => {
                    let corr = correlation_id();
                    log::error!(
                        "[PHASE: navigation] [STEP: database_exists] correlation_id={} {}",
                        corr,
                        e
                    );
                    let mut model = self.model.lock().await;
                    let state = model.navigation.finish_forward(vec![e.user_message()]).clone();
                    return ApiResponse::fail_with_data(
                        NavigationResponse {
                            page: model.navigation.page().as_id().to_string(),
                            state: state.as_id().to_string(),
                            messages: state.messages().to_vec(),
                        },
                        e.user_message(),
                        corr,
                    );
                }
            }
        }

        let mut model = self.model.lock().await;
        let state = model.navigation.finish_forward(errors).clone();
        if let NavigationState::Blocked(messages) = &state {
            log::warn!(
                "[PHASE: navigation] [STEP: next] Blocked on {}: {}",
                page.as_id(),
                messages.join(" | ")
            );
        }
        ApiResponse::ok(NavigationResponse {
            page: model.navigation.page().as_id().to_string(),
            state: state.as_id().to_string(),
            messages: state.messages().to_vec(),
        })
    }

    pub async fn back(&self) -> ApiResponse<NavigationResponse> {
        let mut model = self.model.lock().await;
        let page = model.navigation.back();
        log::info!("[PHASE: navigation] [STEP: back] Now on {}", page.as_id());
        ApiResponse::ok(NavigationResponse {
            page: page.as_id().to_string(),
            state: model.navigation.state().as_id().to_string(),
            messages: Vec::new(),
        })
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        self.model.lock().await.snapshot()
    }

    pub async fn deployment_parameters(&self) -> ApiResponse<DeploymentParameters> {
        let result = self.model.lock().await.deployment_parameters();
        match result {
            Ok(params) => ApiResponse::ok(params),
            Err(e) => {
                let corr = correlation_id();
                log::warn!(
                    "[PHASE: notebook] [STEP: parameters] correlation_id={} {}",
                    corr,
                    e
                );
                ApiResponse::fail(e.user_message(), corr)
            }
        }
    }

    /// Build the notebook from the settled answers and write it to `path`.
    pub async fn generate_notebook(&self, path: &Path) -> ApiResponse<String> {
        let params = match self.model.lock().await.deployment_parameters() {
            Ok(params) => params,
            Err(e) => {
                let corr = correlation_id();
                log::warn!(
                    "[PHASE: notebook] [STEP: generate] correlation_id={} {}",
                    corr,
                    e
                );
                return ApiResponse::fail(e.user_message(), corr);
            }
        };

        let notebook = generate_notebook_for_kernel(&params, &self.kernel_name);
        match write_notebook(path, &notebook) {
            Ok(()) => ApiResponse::ok(path.display().to_string()),
            Err(e) => {
                let corr = correlation_id();
                log::error!(
                    "[PHASE: notebook] [STEP: write] correlation_id={} {}",
                    corr,
                    e
                );
                ApiResponse::fail(e.user_message(), corr)
            }
        }
    }
}
