//! Recipient resolution.
//!
//! Addresses are compared case-insensitively and the first spelling seen wins.
//! No syntactic validation happens here; the transport rejects what it cannot parse.

use crate::{MaintenanceStore, Result, StaticRecipients};
use std::collections::HashSet;

/// Trim, drop empties and dedupe (case-insensitive), keeping first-seen order.
pub fn normalize_addresses<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for item in items {
        let address = item.as_ref().trim();
        if address.is_empty() {
            continue;
        }
        if seen.insert(address.to_lowercase()) {
            out.push(address.to_string());
        }
    }

    out
}

/// Split a comma-separated address list.
pub fn split_address_list(raw: &str) -> Vec<String> {
    normalize_addresses(raw.split(','))
}

impl StaticRecipients {
    pub fn from_lists(to: &str, cc: &str, bcc: &str) -> Self {
        Self {
            to: split_address_list(to),
            cc: split_address_list(cc),
            bcc: split_address_list(bcc),
        }
    }
}

/// Email of the task's responsible operator, if one is assigned.
pub async fn resolve_for_task(store: &dyn MaintenanceStore, task_id: i64) -> Result<Vec<String>> {
    let emails = store.recipients_for_task(task_id).await?;
    Ok(normalize_addresses(emails))
}
