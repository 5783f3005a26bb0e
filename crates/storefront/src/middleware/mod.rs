//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with a `request_id` field)
//! 3. Request ID (fill the span field, echo the header)
//! 4. Catalog seeding (product routes only)

pub mod request_id;
pub mod seed;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use seed::ensure_catalog_seeded;
