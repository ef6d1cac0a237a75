// Field dependency graph
//
// account -> subscription -> server -> resourceGroup (derived)
//
// A change to a field schedules one reload per direct dependent. Reloads chain: the next level
// starts only after the previous level's completion has updated the selection store.

use super::fields::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    /// Dependent's candidates must be fetched again.
    Reload,
    /// Dependent is computed from the upstream value; nothing to fetch.
    Derive,
}

const EDGES: &[(Field, Field, EdgeKind)] = &[
    (Field::Account, Field::Subscription, EdgeKind::Reload),
    (Field::Subscription, Field::Server, EdgeKind::Reload),
    (Field::Server, Field::ResourceGroup, EdgeKind::Derive),
];

pub fn direct_dependents(field: Field) -> Vec<Field> {
    EDGES
        .iter()
        .filter(|(from, _, _)| *from == field)
        .map(|(_, to, _)| *to)
        .collect()
}

/// Direct dependents that need a fetch when `field` changes.
pub fn reload_targets(field: Field) -> Vec<Field> {
    EDGES
        .iter()
        .filter(|(from, _, kind)| *from == field && *kind == EdgeKind::Reload)
        .map(|(_, to, _)| *to)
        .collect()
}

/// Every field transitively downstream of `field`, nearest first.
pub fn downstream(field: Field) -> Vec<Field> {
    let mut out = direct_dependents(field);
    let mut next = 0;
    while next < out.len() {
        for dep in direct_dependents(out[next]) {
            if !out.contains(&dep) {
                out.push(dep);
            }
        }
        next += 1;
    }
    out
}

pub fn upstream(field: Field) -> Option<Field> {
    EDGES
        .iter()
        .find(|(_, to, _)| *to == field)
        .map(|(from, _, _)| *from)
}

pub fn is_derived(field: Field) -> bool {
    EDGES
        .iter()
        .any(|(_, to, kind)| *to == field && *kind == EdgeKind::Derive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_downstream_is_full_chain_in_order() {
        assert_eq!(
            downstream(Field::Account),
            vec![Field::Subscription, Field::Server, Field::ResourceGroup]
        );
    }

    #[test]
    fn reload_targets_are_single_direct_dependent() {
        assert_eq!(reload_targets(Field::Account), vec![Field::Subscription]);
        assert_eq!(reload_targets(Field::Subscription), vec![Field::Server]);
        // resource group is derived, never fetched
        assert!(reload_targets(Field::Server).is_empty());
        assert_eq!(direct_dependents(Field::Server), vec![Field::ResourceGroup]);
    }

    #[test]
    fn leaf_has_no_dependents() {
        assert!(downstream(Field::ResourceGroup).is_empty());
    }

    #[test]
    fn upstream_and_derived() {
        assert_eq!(upstream(Field::Account), None);
        assert_eq!(upstream(Field::Server), Some(Field::Subscription));
        assert!(is_derived(Field::ResourceGroup));
        assert!(!is_derived(Field::Server));
    }

    #[test]
    fn graph_is_acyclic() {
        for field in Field::ALL {
            assert!(!downstream(field).contains(&field), "{:?} reaches itself", field);
        }
    }
}
