//! Runtime invariant checks with contract-test bookkeeping
//!
//! Production code states its invariants with [`check_invariant!`]. Each
//! check is recorded per thread, so a test can drive a scenario and then
//! call [`assert_contract`] to prove the invariants it depends on were
//! actually exercised, not just declared.
//!
//! ```rust,ignore
//! check_invariant!(self.session.is_none(), "single active session", "start_session");
//!
//! #[test]
//! fn contract_session_lifecycle() {
//!     // ... drive the controller ...
//!     assert_contract("session lifecycle", &["single active session"]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static CHECKED: RefCell<HashMap<&'static str, u64>> = RefCell::new(HashMap::new());
}

/// Check an invariant and record that it was evaluated.
///
/// Panics with the invariant name and site when the condition is false.
#[macro_export]
macro_rules! check_invariant {
    ($condition:expr, $name:expr) => {
        $crate::invariants::__record_invariant($condition, $name, module_path!())
    };
    ($condition:expr, $name:expr, $site:expr) => {
        $crate::invariants::__record_invariant($condition, $name, $site)
    };
}

#[doc(hidden)]
pub fn __record_invariant(condition: bool, name: &'static str, site: &str) {
    CHECKED.with(|checked| {
        *checked.borrow_mut().entry(name).or_insert(0) += 1;
    });

    if !condition {
        log::error!("Invariant violated at {}: {}", site, name);
        panic!("INVARIANT VIOLATION [{}]: {}", site, name);
    }
}

/// How many times `name` was checked on this thread
pub fn times_checked(name: &str) -> u64 {
    CHECKED.with(|checked| checked.borrow().get(name).copied().unwrap_or(0))
}

/// Panic unless every invariant in `required` was checked on this thread.
pub fn assert_contract(contract: &str, required: &[&str]) {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| times_checked(name) == 0)
        .collect();

    if !missing.is_empty() {
        panic!(
            "CONTRACT FAILURE [{}]: invariants never checked:\n  - {}",
            contract,
            missing.join("\n  - ")
        );
    }
}

/// Forget every recorded check on this thread
pub fn reset_invariant_log() {
    CHECKED.with(|checked| checked.borrow_mut().clear());
}
