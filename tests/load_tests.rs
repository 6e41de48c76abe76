//! Load Test Runner
//!
//! This file makes the load tests discoverable by cargo test.
//!
//! The slow load tests are marked as #[ignore]. To run them:
//! ```bash
//! cargo test --test load_tests -- --ignored --test-threads=1
//! ```

mod load;
