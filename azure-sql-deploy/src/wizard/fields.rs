// Selectable fields and their load states
//
// Field state is a tagged variant. The "No servers found" text is a display concern produced by
// `display_options`; validation looks at the `Empty` tag, never at the text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display text the UI shows in place of an empty server list.
pub const NO_SERVERS_FOUND: &str = "No servers found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Account,
    Subscription,
    Server,
    ResourceGroup,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Account,
        Field::Subscription,
        Field::Server,
        Field::ResourceGroup,
    ];

    pub fn as_id(&self) -> &'static str {
        match self {
            Field::Account => "account",
            Field::Subscription => "subscription",
            Field::Server => "server",
            Field::ResourceGroup => "resourceGroup",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Account => "Azure account",
            Field::Subscription => "subscription",
            Field::Server => "server",
            Field::ResourceGroup => "resource group",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One selectable option: what the dropdown shows and what identifies the resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub display_name: String,
    pub identity: String,
}

impl Candidate {
    pub fn new(display_name: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            identity: identity.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Idle,
    Loading,
    /// The fetch completed and returned nothing.
    Empty,
    Ready(Vec<Candidate>),
    Error(String),
}

impl FieldState {
    pub fn as_id(&self) -> &'static str {
        match self {
            FieldState::Idle => "idle",
            FieldState::Loading => "loading",
            FieldState::Empty => "empty",
            FieldState::Ready(_) => "ready",
            FieldState::Error(_) => "error",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FieldState::Loading)
    }

    pub fn candidates(&self) -> &[Candidate] {
        match self {
            FieldState::Ready(list) => list,
            _ => &[],
        }
    }
}

/// Options the dropdown for `field` should show in `state`.
pub fn display_options(field: Field, state: &FieldState) -> Vec<Candidate> {
    match (field, state) {
        (Field::Server, FieldState::Empty) => vec![Candidate::new(NO_SERVERS_FOUND, "")],
        (_, FieldState::Ready(list)) => list.clone(),
        _ => Vec::new(),
    }
}

/// Issued when a load begins; only the latest ticket for a field may complete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub field: Field,
    pub stamp: u64,
}

#[derive(Debug, Default)]
struct FieldSlot {
    state: FieldState,
    issued: u64,
}

/// Load state plus sequence stamp for every fetchable field.
#[derive(Debug, Default)]
pub struct FieldBoard {
    slots: HashMap<Field, FieldSlot>,
}

impl FieldBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, field: Field) -> &FieldState {
        static IDLE: FieldState = FieldState::Idle;
        self.slots.get(&field).map(|s| &s.state).unwrap_or(&IDLE)
    }

    /// Enter `Loading` and supersede any in-flight load for the field.
    pub fn begin_load(&mut self, field: Field) -> LoadTicket {
        let slot = self.slots.entry(field).or_default();
        slot.issued += 1;
        slot.state = FieldState::Loading;
        LoadTicket {
            field,
            stamp: slot.issued,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.slots
            .get(&ticket.field)
            .map(|s| s.issued == ticket.stamp)
            .unwrap_or(false)
    }

    /// Apply a completion. Returns false (and changes nothing) for a superseded ticket.
    pub fn finish(&mut self, ticket: &LoadTicket, state: FieldState) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        if let Some(slot) = self.slots.get_mut(&ticket.field) {
            slot.state = state;
        }
        true
    }

    /// Upstream changed: drop the field's options and orphan any in-flight load.
    pub fn invalidate(&mut self, field: Field) {
        let slot = self.slots.entry(field).or_default();
        slot.issued += 1;
        slot.state = FieldState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_server_state_shows_single_sentinel_entry() {
        let options = display_options(Field::Server, &FieldState::Empty);
        assert_eq!(options, vec![Candidate::new("No servers found", "")]);
    }

    #[test]
    fn empty_subscription_state_shows_nothing() {
        assert!(display_options(Field::Subscription, &FieldState::Empty).is_empty());
    }

    #[test]
    fn newer_ticket_supersedes_older() {
        let mut board = FieldBoard::new();
        let first = board.begin_load(Field::Subscription);
        let second = board.begin_load(Field::Subscription);

        assert!(!board.finish(&first, FieldState::Empty));
        assert!(board.state(Field::Subscription).is_loading());

        assert!(board.finish(&second, FieldState::Ready(vec![Candidate::new("a", "1")])));
        assert_eq!(board.state(Field::Subscription).candidates().len(), 1);
    }

    #[test]
    fn invalidate_orphans_in_flight_ticket() {
        let mut board = FieldBoard::new();
        let ticket = board.begin_load(Field::Server);
        board.invalidate(Field::Server);

        assert!(!board.is_current(&ticket));
        assert_eq!(board.state(Field::Server), &FieldState::Idle);
        assert!(!board.finish(&ticket, FieldState::Empty));
        assert_eq!(board.state(Field::Server), &FieldState::Idle);
    }

    #[test]
    fn untouched_field_is_idle() {
        let board = FieldBoard::new();
        assert_eq!(board.state(Field::Account), &FieldState::Idle);
    }
}
