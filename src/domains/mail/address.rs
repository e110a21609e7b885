//! Email address syntax validation.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Addresses split by syntactic validity, in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddressPartition {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

/// Split `addresses` into valid and invalid entries.
///
/// Entries are trimmed first; blank entries are dropped from both lists.
pub fn partition_addresses<S: AsRef<str>>(addresses: &[S]) -> AddressPartition {
    let mut partition = AddressPartition::default();

    for raw in addresses {
        let address = raw.as_ref().trim();
        if address.is_empty() {
            continue;
        }

        if EMAIL_PATTERN.is_match(address) {
            partition.valid.push(address.to_string());
        } else {
            warn!("Invalid email address format: {}", address);
            partition.invalid.push(address.to_string());
        }
    }

    partition
}
