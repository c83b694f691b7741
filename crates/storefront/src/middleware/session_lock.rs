//! One cart write at a time per visitor.
//!
//! tower-sessions loads the session record when a request first touches it
//! and saves the whole record after the handler returns, so two cart posts
//! from the same visitor running side by side would each write back their
//! own copy and the later save would drop the other's change. This layer
//! sits outside the session layer and holds a per-cookie lock for the whole
//! request, session save included.
//!
//! Requests without a session cookie are not serialized: each of them starts
//! a fresh session anyway.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{Request, State},
    http::{Method, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tower_sessions::cookie::Cookie;

use super::session::SESSION_COOKIE_NAME;

/// Path prefix of the routes that write the cart slot.
const CART_PREFIX: &str = "/cart";

/// Per-session locks, keyed by session cookie value.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, session: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(session.to_owned()).or_default())
    }

    /// Drop the entry once nobody holds or waits on it.
    fn release(&self, session: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(session)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session);
        }
    }

    /// Number of sessions with a request in flight.
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Serialize cart posts that carry the same session cookie.
pub async fn session_lock_middleware(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let writes_cart =
        request.method() == Method::POST && request.uri().path().starts_with(CART_PREFIX);
    let session = if writes_cart {
        session_cookie(&request)
    } else {
        None
    };

    let Some(session) = session else {
        return next.run(request).await;
    };

    let lock = locks.lock_for(&session);
    let response = {
        let _guard = lock.lock().await;
        next.run(request).await
    };
    drop(lock);
    locks.release(&session);

    response
}

/// Value of the session cookie, if the request carries one.
fn session_cookie(request: &Request) -> Option<String> {
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_same_session_shares_lock() {
        let locks = SessionLocks::new();
        let first = locks.lock_for("abc");
        let second = locks.lock_for("abc");
        let other = locks.lock_for("xyz");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(locks.active(), 2);
    }

    #[test]
    fn test_release_waits_for_last_holder() {
        let locks = SessionLocks::new();
        let first = locks.lock_for("abc");
        let second = locks.lock_for("abc");

        drop(first);
        locks.release("abc");
        assert_eq!(locks.active(), 1);

        drop(second);
        locks.release("abc");
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn test_session_cookie_lookup() {
        let request = Request::builder()
            .header(COOKIE, "theme=dark; at_session=s3cr3t")
            .body(Body::empty())
            .unwrap();
        assert_eq!(session_cookie(&request).as_deref(), Some("s3cr3t"));

        let request = Request::builder()
            .header(COOKIE, "theme=dark")
            .body(Body::empty())
            .unwrap();
        assert_eq!(session_cookie(&request), None);
    }
}
