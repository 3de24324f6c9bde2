/*
 * Responsibility
 * - Two logging tiers for token verification
 *   - warn: failure category only (safe for shared log pipelines)
 *   - debug: category + claim/config detail (operator troubleshooting)
 * - Key material is never passed in here
 */
use std::fmt;

use tracing::{debug, warn};

use super::category::FailureCategory;
use crate::error::AuthError;

/// Log target for every authentication event.
///
/// Ex:
/// RUST_LOG=info,bearer_gate::auth=debug cargo run
pub const TARGET: &str = "bearer_gate::auth";

/// Warn tier. `AuthError` renders only a category or a fixed string.
pub fn rejected(reason: &AuthError) {
    warn!(target: TARGET, reason = %reason, "JWT authentication failed");
}

/// Debug tier. `detail` may carry claim values and configured expectations.
pub fn detail(category: FailureCategory, detail: fmt::Arguments<'_>) {
    debug!(target: TARGET, category = %category, "{}", detail);
}
