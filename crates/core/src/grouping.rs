use serde::{Deserialize, Serialize};

use crate::model::Event;

/// Identity assigned to events that lack the attribute a strategy needs.
pub const UNATTRIBUTED: &str = "unattributed";

const EXTENSION_INTERNAL_PREFIX: &str = "extensions::";
const V8_NATIVE_PREFIX: &str = "native ";

/// Aggregation policy: maps an event to the string identity under which
/// sibling occurrences merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupBy {
    /// No cross-sibling aggregation. In the top-down tree every occurrence
    /// becomes its own node; the bottom-up tree falls back to [`event_id`].
    #[default]
    None,
    EventName,
    Category,
    Url,
    /// Host of the event URL, reduced to its last two labels.
    Domain,
    /// Full host of the event URL.
    Subdomain,
    Frame,
}

impl GroupBy {
    /// The grouping identity for `event`, or `None` when this policy does
    /// not aggregate at all.
    pub fn group_key(&self, event: &Event) -> Option<String> {
        match self {
            GroupBy::None => None,
            GroupBy::EventName => Some(event.name.clone()),
            GroupBy::Category => Some(attr_or_sentinel(event.category.as_deref())),
            GroupBy::Url => Some(attr_or_sentinel(event.url.as_deref())),
            GroupBy::Domain => Some(domain_key(event, true)),
            GroupBy::Subdomain => Some(domain_key(event, false)),
            GroupBy::Frame => Some(attr_or_sentinel(event.frame_id.as_deref())),
        }
    }
}

/// Per-name-and-source identity: distinguishes same-named functions from
/// different scripts while still merging repeated calls to the same one.
pub fn event_id(event: &Event) -> String {
    match event.url.as_deref() {
        Some(url) => format!("{}@{}", event.name, url),
        None => event.name.clone(),
    }
}

fn attr_or_sentinel(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNATTRIBUTED.to_string(),
    }
}

/// Host-derived identity. Extension-internal and V8-builtin pseudo-URLs
/// collapse into their own buckets; numeric hosts are never shortened.
fn domain_key(event: &Event, collapse_subdomains: bool) -> String {
    let Some(url) = event.url.as_deref() else {
        return UNATTRIBUTED.to_string();
    };
    if url.starts_with(EXTENSION_INTERNAL_PREFIX) {
        return EXTENSION_INTERNAL_PREFIX.to_string();
    }
    if url.starts_with(V8_NATIVE_PREFIX) {
        return V8_NATIVE_PREFIX.to_string();
    }
    let Some((scheme, rest)) = url.split_once("://") else {
        return UNATTRIBUTED.to_string();
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        return UNATTRIBUTED.to_string();
    }
    if scheme == "chrome-extension" {
        return format!("{scheme}://{host}");
    }
    if !collapse_subdomains {
        return host.to_string();
    }
    if host.chars().all(|c| c == '.' || c.is_ascii_digit()) {
        return host.to_string();
    }
    match host.rmatch_indices('.').nth(1) {
        Some((dot, _)) => host[dot + 1..].to_string(),
        None => host.to_string(),
    }
}
