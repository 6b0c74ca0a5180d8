//! Diff-suppression hooks shared by the user-config schemas

use std::net::IpAddr;
use tfplug::{Dynamic, ResourceData};

pub const DEFAULT_IP_FILTER: &str = "0.0.0.0/0";

/// Create-only fields cannot change once the resource exists
pub fn create_only(_key: &str, _old: &str, _new: &str, data: &ResourceData) -> bool {
    !data.id().is_empty()
}

/// Ignore changes on user-config objects the user never set explicitly
pub fn empty_object(key: &str, old: &str, new: &str, _data: &ResourceData) -> bool {
    // An object holding only defaults reads back as a list of one element
    // while the configuration has none.
    if old == "1" && new == "0" && key.ends_with(".#") {
        return true;
    }

    if new.is_empty() && !old.is_empty() {
        return true;
    }

    // Booleans stored as strings come back as "0"/"1" from older states
    (new == "0" && old == "false") || (new == "1" && old == "true")
}

/// `ip_filter` defaults to `0.0.0.0/0` on the server; removing that default
/// from the configuration is not a change.
pub fn ip_filter_array(key: &str, old: &str, new: &str, data: &ResourceData) -> bool {
    if old != "1" || new != "0" || !key.ends_with(".ip_filter.#") {
        return false;
    }

    let path = key.trim_end_matches(".#");
    match data.get_old(path) {
        Some(Dynamic::List(items)) => {
            items.len() == 1 && items[0].as_string() == Some(DEFAULT_IP_FILTER)
        }
        _ => true,
    }
}

/// Entries of `ip_filter`: the server default, and CIDRs that differ only
/// in notation (`10.0.0.1` and `10.0.0.1/32`).
pub fn ip_filter_value(key: &str, old: &str, new: &str, _data: &ResourceData) -> bool {
    if old == DEFAULT_IP_FILTER && new.is_empty() && key.ends_with(".ip_filter.0") {
        return true;
    }

    !old.is_empty() && !new.is_empty() && normalize_cidr(old) == normalize_cidr(new)
}

/// Canonical `address/prefix` form of an IP filter entry. Entries that are
/// not addresses are returned unchanged.
pub fn normalize_cidr(value: &str) -> String {
    let value = value.trim();
    let (address, prefix) = match value.split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (value, None),
    };

    let Ok(ip) = address.parse::<IpAddr>() else {
        return value.to_string();
    };

    let prefix = match prefix {
        Some(prefix) => match prefix.parse::<u8>() {
            Ok(prefix) => prefix,
            Err(_) => return value.to_string(),
        },
        None if ip.is_ipv4() => 32,
        None => 128,
    };

    format!("{}/{}", ip, prefix)
}
