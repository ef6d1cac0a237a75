// Resource identity parsing
//
// ARM ids look like `/subscriptions/<sub>/resourceGroups/<rg>/providers/<ns>/<type>/<name>`.
// Segment names are case-insensitive in ARM, so markers are matched ignoring ASCII case.

const RESOURCE_GROUPS_MARKER: &str = "/resourcegroups/";

/// Resource group named in `id`, or None when the id carries no resource group segment.
pub fn resource_group_from_id(id: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `id`.
    let lowered = id.to_ascii_lowercase();
    let start = lowered.find(RESOURCE_GROUPS_MARKER)? + RESOURCE_GROUPS_MARKER.len();
    let rest = &id[start..];
    let end = rest.find('/').unwrap_or(rest.len());
    let group = &rest[..end];
    if group.is_empty() {
        None
    } else {
        Some(group.to_string())
    }
}
