// Azure settings page validation
//
// Returns the messages that block forward navigation; an empty list means the page may advance.
// Decisions are made on field values and state tags. The "No servers found" text is never
// inspected.

use super::fields::{Field, FieldBoard, FieldState};
use super::store::SelectionStore;

pub const NO_SERVERS_MESSAGE: &str = "No servers found in the selected subscription. Select a different subscription that contains at least one server.";

fn missing_message(field: Field, state: &FieldState) -> String {
    match (field, state) {
        _ if state.is_loading() => format!(
            "The {} list is still loading. Wait for it to finish before continuing.",
            field.label()
        ),
        (_, FieldState::Error(message)) => {
            format!("Unable to load the {} list: {}", field.label(), message)
        }
        (Field::Account, FieldState::Empty) => {
            "No Azure accounts found. Sign in to an Azure account to continue.".to_string()
        }
        (Field::Subscription, FieldState::Empty) => {
            "No subscriptions found for the selected account. Select a different account."
                .to_string()
        }
        (Field::Server, FieldState::Empty) => NO_SERVERS_MESSAGE.to_string(),
        _ => {
            let label = field.label();
            let article = if matches!(label.chars().next(), Some(c) if "AEIOUaeiou".contains(c)) {
                "an"
            } else {
                "a"
            };
            format!("Select {} {}.", article, label)
        }
    }
}

pub fn validate(store: &SelectionStore, fields: &FieldBoard) -> Vec<String> {
    for field in [Field::Account, Field::Subscription] {
        if store.get(field).is_none() {
            // Downstream fields are meaningless until this one is set.
            return vec![missing_message(field, fields.state(field))];
        }
    }

    match store.get(Field::Server) {
        Some(server) if !server.identity.is_empty() => Vec::new(),
        Some(_) => vec![NO_SERVERS_MESSAGE.to_string()],
        None => vec![missing_message(Field::Server, fields.state(Field::Server))],
    }
}
