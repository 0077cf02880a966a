//! Property-based soundness tests.
//!
//! Run with: `cargo test --test property`

mod queue_props;
mod splash_props;
