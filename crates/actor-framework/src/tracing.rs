//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//!
//! ## Configuration
//!
//! Output uses the compact format and hides the module prefix (`with_target(false)`);
//! actors tag their lines with `entity_type` instead. Levels come from `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run     # lifecycle and writes
//! RUST_LOG=debug cargo run    # every request with its payload
//! ```
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: startup and shutdown with the final store size
//! - **Store Operations**: Insert, Get, FindOne, Query, ConditionalUpdate, Delete
//! - **Conflicts**: failed preconditions at `warn`, with the record id
//!
//! With `RUST_LOG=info` a bay call looks like:
//!
//! ```text
//! INFO Updated entity_type="BaySlot" id=bay
//! INFO Updated entity_type="Order" id=7f3c...
//! INFO call_next:Order entered loading order_id=7f3c... queue_number=1
//! ```

/// Install the global subscriber. Call once, at process start.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
