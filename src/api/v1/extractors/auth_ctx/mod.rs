/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the verified principal (AuthCtx) to handlers
 * - axum-specific code lives in core, the type in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
