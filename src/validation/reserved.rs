//! Reserved type-name table.
//!
//! The schema generator manufactures types with these names (or name
//! shapes); a user definition reusing one would silently collide with the
//! generated artifact, so the validator rejects them up front.

use lazy_static::lazy_static;
use regex::Regex;

pub struct ReservedName {
    pub pattern: Regex,
    pub error: &'static str,
}

lazy_static! {
    pub static ref RESERVED_TYPE_NAMES: Vec<ReservedName> = vec![
        ReservedName {
            pattern: Regex::new(r"^PageInfo$").expect("hardcoded pattern"),
            error: "Type or Interface with name `PageInfo` reserved to support the pagination model of connections",
        },
        ReservedName {
            pattern: Regex::new(r"^.+Connection$").expect("hardcoded pattern"),
            error: "Type or Interface with name ending `Connection` are reserved to support the pagination model of connections",
        },
        ReservedName {
            pattern: Regex::new(r"^Node$").expect("hardcoded pattern"),
            error: "Type or Interface with name `Node` reserved to support relay",
        },
        ReservedName {
            pattern: Regex::new(r"^CreateInfo$").expect("hardcoded pattern"),
            error: "Type or Interface with name `CreateInfo` reserved to support the create mutation response",
        },
        ReservedName {
            pattern: Regex::new(r"^UpdateInfo$").expect("hardcoded pattern"),
            error: "Type or Interface with name `UpdateInfo` reserved to support the update mutation response",
        },
        ReservedName {
            pattern: Regex::new(r"^DeleteInfo$").expect("hardcoded pattern"),
            error: "Type or Interface with name `DeleteInfo` reserved to support the delete mutation response",
        },
        ReservedName {
            pattern: Regex::new(r"^SortDirection$").expect("hardcoded pattern"),
            error: "Type or Interface with name `SortDirection` reserved to support sorting",
        },
    ];
}

/// Return the reserved-name violation for `type_name`, if any.
pub fn check_reserved(type_name: &str) -> Option<&'static str> {
    RESERVED_TYPE_NAMES
        .iter()
        .find(|reserved| reserved.pattern.is_match(type_name))
        .map(|reserved| reserved.error)
}
