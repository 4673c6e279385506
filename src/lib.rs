#![doc(test(attr(deny(warnings))))]

//! Couple Bucks core: the shared-expense ledger, category budgets with
//! monthly rollover, recurring bills, and split computation backing a
//! two-person household budgeting app.

pub mod domain;
pub mod errors;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Couple Bucks core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
