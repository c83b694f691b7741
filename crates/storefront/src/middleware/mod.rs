//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (record in span, tag in Sentry, echo in response)
//! 4. CSP nonce (generate per-request nonce for scripts)
//! 5. Security headers (CSP with the request nonce, isolation headers)
//! 6. Session lock (one cart post at a time per session cookie)
//! 7. Session layer (tower-sessions with in-memory store)
//! 8. Rate limiting (governor, per route group)

pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod session_lock;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{cart_rate_limiter, contact_rate_limiter};
pub use request_id::{make_request_span, request_id_middleware};
pub use security_headers::{SecurityPolicy, security_headers_middleware};
pub use session::create_session_layer;
pub use session_lock::{SessionLocks, session_lock_middleware};
