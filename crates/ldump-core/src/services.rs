//! Service deny-list filtering

use crate::error::{DumpError, DumpResult};
use ldump_document::{value_kind, ConfigDocument, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Section holding the service declarations
pub const SERVICES: &str = "services";

/// Service classes that conflict with the downstream container extension
///
/// Every entry must be present upstream: a class that is no longer declared
/// means this list is out of date.
pub const DISABLED_SERVICES: [&str; 5] = [
    "Larastan\\Larastan\\ReturnTypes\\ApplicationMakeDynamicReturnTypeExtension",
    "Larastan\\Larastan\\ReturnTypes\\AppMakeDynamicReturnTypeExtension",
    "Larastan\\Larastan\\ReturnTypes\\ContainerArrayAccessDynamicMethodReturnTypeExtension",
    "Larastan\\Larastan\\ReturnTypes\\ContainerMakeDynamicReturnTypeExtension",
    "Larastan\\Larastan\\Methods\\Extension",
];

/// Class name of a service entry, empty when absent or not a string
#[must_use]
pub fn service_class(service: &Value) -> &str {
    service
        .as_mapping()
        .and_then(|s| s.get("class"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Drop every `services` entry whose class is in `deny_list`
///
/// Remaining entries keep their relative order. Returns the removed classes in
/// document order.
///
/// # Errors
/// - [`DumpError::MissingOrMalformedSection`] if `services` is not a sequence
/// - [`DumpError::DriftedDenyList`] if any deny-listed class was not found,
///   listing those classes in deny-list order
pub fn remove_services(document: &mut ConfigDocument, deny_list: &[&str]) -> DumpResult<Vec<String>> {
    let services = match document.root_mut().get_mut(SERVICES) {
        Some(Value::Sequence(services)) => services,
        other => {
            return Err(DumpError::section(
                SERVICES,
                "sequence",
                other.map_or("missing", |v| value_kind(v)),
            ))
        }
    };

    let denied: BTreeSet<&str> = deny_list.iter().copied().collect();
    let mut removed = Vec::new();

    services.retain(|service| {
        let class = service_class(service);
        if denied.contains(class) {
            removed.push(class.to_string());
            false
        } else {
            true
        }
    });

    let matched: BTreeSet<&str> = removed.iter().map(String::as_str).collect();
    let missing: Vec<String> = deny_list
        .iter()
        .filter(|class| !matched.contains(*class))
        .map(|class| (*class).to_string())
        .collect();

    if !missing.is_empty() {
        return Err(DumpError::DriftedDenyList { missing });
    }

    debug!(removed = removed.len(), remaining = services.len(), "filtered services");
    Ok(removed)
}

/// [`remove_services`] with [`DISABLED_SERVICES`]
///
/// # Errors
/// See [`remove_services`].
pub fn remove_disabled_services(document: &mut ConfigDocument) -> DumpResult<Vec<String>> {
    remove_services(document, &DISABLED_SERVICES)
}
