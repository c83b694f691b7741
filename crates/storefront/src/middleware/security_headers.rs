//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The CSP is built per
//! request so it can admit that request's script nonce, the map tile host
//! and the CDN serving HTMX and Leaflet.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};
use url::Url;

use super::CspNonce;
use crate::config::MapConfig;

/// CDN hosting the HTMX and Leaflet bundles.
pub const ASSET_CDN: &str = "https://unpkg.com";

/// Hosts allowed beyond `'self'`, computed once at startup.
#[derive(Clone, Debug)]
pub struct SecurityPolicy {
    img_src: Arc<str>,
}

impl SecurityPolicy {
    /// Build the policy for the configured tile server and the origins
    /// serving listing images.
    #[must_use]
    pub fn new(map: &MapConfig, image_origins: impl IntoIterator<Item = String>) -> Self {
        let mut img_src = format!("'self' data: {ASSET_CDN}");
        for origin in tile_origin(&map.tile_url).into_iter().chain(image_origins) {
            img_src.push(' ');
            img_src.push_str(&origin);
        }
        Self {
            img_src: img_src.into(),
        }
    }

    /// The CSP header value for a request with the given nonce.
    #[must_use]
    pub fn content_security_policy(&self, nonce: Option<&CspNonce>) -> String {
        let nonce = nonce.map(|n| format!(" {}", n.source())).unwrap_or_default();
        format!(
            "default-src 'none'; \
             script-src 'self' {ASSET_CDN}{nonce}; \
             style-src 'self' {ASSET_CDN}; \
             font-src 'self'; \
             img-src {img_src}; \
             connect-src 'self'; \
             frame-src 'none'; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'",
            img_src = self.img_src,
        )
    }
}

/// Origin of a tile URL template, with the `{s}` subdomain placeholder
/// turned into a wildcard: `https://{s}.tile.example.org/{z}/{x}/{y}.png`
/// becomes `https://*.tile.example.org`.
fn tile_origin(template: &str) -> Option<String> {
    let sample = template
        .replace("{s}", "a")
        .replace("{z}", "0")
        .replace("{x}", "0")
        .replace("{y}", "0")
        .replace("{r}", "");
    let url = Url::parse(&sample).ok()?;
    let host = url.host_str()?;
    let host = if template.contains("{s}.") {
        host.replacen("a.", "*.", 1)
    } else {
        host.to_string()
    };
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    Some(format!("{}://{host}{port}", url.scheme()))
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - See [`SecurityPolicy::content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Cross-Origin-Embedder-Policy: credentialless` - Map tiles carry no CORP header
pub async fn security_headers_middleware(
    State(policy): State<SecurityPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    match HeaderValue::from_str(&policy.content_security_policy(nonce.as_ref())) {
        Ok(csp) => {
            headers.insert(CONTENT_SECURITY_POLICY, csp);
        }
        Err(e) => tracing::error!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             microphone=(), \
             geolocation=(), \
             payment=(), \
             usb=(), \
             interest-cohort=()",
        ),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );

    response
}
