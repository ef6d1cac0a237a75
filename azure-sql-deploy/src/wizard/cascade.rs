// Cascade executor
//
// Runs reload chains level by level. Level N+1 starts only after level N's completion has been
// applied to the model, so a field is never fetched against a stale upstream value. Every fetch
// carries a ticket; a completion whose ticket is no longer current is dropped and ends its chain.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::fields::{Field, FieldState};
use super::graph;
use super::loader::FieldLoader;
use super::model::WizardModel;
use crate::error::{DeployError, DeployResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeEvent {
    Cleared { field: Field },
    Loading { field: Field },
    Ready { field: Field, count: usize },
    Empty { field: Field },
    Failed { field: Field, message: String },
    Selected { field: Field, display_name: String },
    Superseded { field: Field },
}

pub type CascadeEmitter = Arc<dyn Fn(CascadeEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every level completed.
    Settled,
    /// The account list came back empty; nothing downstream was fetched.
    NoAccounts,
    /// A newer selection orphaned this chain's fetch for `Field`.
    Superseded(Field),
}

#[derive(Clone)]
pub struct CascadeExecutor {
    model: Arc<Mutex<WizardModel>>,
    loader: FieldLoader,
    emitter: Option<CascadeEmitter>,
}

impl CascadeExecutor {
    pub fn new(
        model: Arc<Mutex<WizardModel>>,
        loader: FieldLoader,
        emitter: Option<CascadeEmitter>,
    ) -> Self {
        Self {
            model,
            loader,
            emitter,
        }
    }

    pub fn model(&self) -> Arc<Mutex<WizardModel>> {
        Arc::clone(&self.model)
    }

    pub fn loader(&self) -> &FieldLoader {
        &self.loader
    }

    fn emit(&self, event: CascadeEvent) {
        if let Some(emitter) = &self.emitter {
            emitter(event);
        }
    }

    /// Load accounts and cascade defaults all the way down.
    pub async fn initialize(&self) -> DeployResult<ChainOutcome> {
        log::info!("[PHASE: cascade] [STEP: initialize] Loading accounts");
        {
            let mut model = self.model.lock().await;
            model.apply_selection(Field::Account, None);
        }
        self.reload_chain(vec![Field::Account]).await
    }

    /// Apply a user choice (display label or identity) and reload what depends on it.
    pub async fn select(&self, field: Field, query: &str) -> DeployResult<ChainOutcome> {
        if graph::is_derived(field) {
            return Err(DeployError::DerivedField(field));
        }

        let (changed, display_name) = {
            let mut model = self.model.lock().await;
            let candidate =
                model
                    .store
                    .resolve(field, query)
                    .ok_or_else(|| DeployError::UnknownOption {
                        field,
                        query: query.to_string(),
                    })?;
            let display_name = candidate.display_name.clone();
            (model.apply_selection(field, Some(candidate)), display_name)
        };

        if !changed {
            return Ok(ChainOutcome::Settled);
        }
        // Emitters run without the model lock held.
        for dep in graph::downstream(field) {
            self.emit(CascadeEvent::Cleared { field: dep });
        }
        log::info!(
            "[PHASE: selection] [STEP: {}] Selected '{}'",
            field.as_id(),
            display_name
        );
        self.emit(CascadeEvent::Selected {
            field,
            display_name,
        });
        self.reload_chain(graph::reload_targets(field)).await
    }

    async fn reload_chain(&self, start: Vec<Field>) -> DeployResult<ChainOutcome> {
        let mut queue: VecDeque<Field> = start.into();

        while let Some(field) = queue.pop_front() {
            let (ticket, upstream) = {
                let mut model = self.model.lock().await;
                (model.fields.begin_load(field), model.upstream_snapshot())
            };
            self.emit(CascadeEvent::Loading { field });

            let result = self.loader.load(field, &upstream).await;

            let mut model = self.model.lock().await;
            if !model.fields.is_current(&ticket) {
                log::debug!(
                    "[PHASE: cascade] [STEP: {}] Discarding superseded load #{}",
                    field.as_id(),
                    ticket.stamp
                );
                drop(model);
                self.emit(CascadeEvent::Superseded { field });
                return Ok(ChainOutcome::Superseded(field));
            }

            let loaded = match result {
                Ok(loaded) => loaded,
                Err(e) => {
                    let message = e.user_message();
                    model
                        .fields
                        .finish(&ticket, FieldState::Error(message.clone()));
                    drop(model);
                    log::error!(
                        "[PHASE: cascade] [STEP: {}] Load failed: {}",
                        field.as_id(),
                        e
                    );
                    self.emit(CascadeEvent::Failed { field, message });
                    return Err(e);
                }
            };

            let candidates = loaded.candidates();
            model.replace_index(&loaded);
            let default = candidates.first().cloned();
            if loaded.is_empty() {
                model.fields.finish(&ticket, FieldState::Empty);
            } else {
                model
                    .fields
                    .finish(&ticket, FieldState::Ready(candidates.clone()));
            }
            model.apply_selection(field, default.clone());
            drop(model);

            match &default {
                Some(selected) => {
                    self.emit(CascadeEvent::Ready {
                        field,
                        count: candidates.len(),
                    });
                    self.emit(CascadeEvent::Selected {
                        field,
                        display_name: selected.display_name.clone(),
                    });
                }
                None => self.emit(CascadeEvent::Empty { field }),
            }

            if default.is_none() && field == Field::Account {
                log::warn!(
                    "[PHASE: cascade] [STEP: account] No Azure accounts found. Sign in to continue."
                );
                return Ok(ChainOutcome::NoAccounts);
            }
            queue.extend(graph::reload_targets(field));
        }

        Ok(ChainOutcome::Settled)
    }
}
