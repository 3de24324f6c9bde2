pub mod category;
pub mod channel;
pub mod claims;
pub mod factory;
pub mod header;
pub mod keys;
pub mod principal;
pub mod tiered_log;
pub mod verifier;

pub use category::FailureCategory;
pub use channel::FailureChannel;
pub use factory::build_verifier;
pub use principal::ValidatedPrincipal;
pub use verifier::{DetailedJwtVerifier, MinimalJwtVerifier, TokenValidationPipeline, TokenVerifier};
