// Deployment wizard core
//
// Dependent-field cascade (account -> subscription -> server -> resource group), page validation,
// navigation, and the session boundary a front end binds to.

pub mod cascade;
pub mod fields;
pub mod graph;
pub mod loader;
pub mod model;
pub mod navigation;
pub mod session;
pub mod settings;
pub mod store;
pub mod validator;

pub use cascade::{CascadeEmitter, CascadeEvent, CascadeExecutor, ChainOutcome};
pub use fields::{Candidate, Field, FieldState};
pub use loader::FieldLoader;
pub use navigation::{NavigationState, WizardPage};
pub use session::WizardSession;
pub use settings::DatabaseSettings;
