use std::collections::HashSet;
use std::sync::Mutex;
use lazy_static::lazy_static;
use log::error;

pub const SINGLE_SESSION: &str = "At most one build session is running";
pub const IDLE_AFTER_TERMINAL: &str = "Build flag is clear after a terminal state";

lazy_static! {
    /// Descriptions of the invariants that have held at least once.
    static ref CHECKED_INVARIANTS: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
}

/// Asserts a lifecycle invariant.
///
/// A violation panics in debug and test builds and is logged in release builds, where the
/// builder keeps running. A holding invariant is recorded for [`contract_test`].
pub fn assert_invariant(condition: bool, description: &str, component: Option<&str>) {
    if !condition {
        let msg = format!(
            "CRITICAL INVARIANT VIOLATION [{}]: {}",
            component.unwrap_or("General"),
            description
        );
        error!("{}", msg);
        if cfg!(debug_assertions) {
            panic!("{}", msg);
        }
    } else if let Ok(mut set) = CHECKED_INVARIANTS.lock() {
        set.insert(description.to_string());
    }
}

/// Panics unless every invariant in `required` has been asserted somewhere in this process.
#[cfg(test)]
pub fn contract_test(context: &str, required: &[&str]) {
    let checked = CHECKED_INVARIANTS.lock().unwrap();
    let missing: Vec<&&str> = required.iter().filter(|r| !checked.contains(**r)).collect();
    // Release the lock before asserting so a failed contract does not poison it.
    drop(checked);
    assert!(
        missing.is_empty(),
        "Contract Test Failed for '{}'. The following invariants were NOT checked:\n{:#?}",
        context,
        missing
    );
}
