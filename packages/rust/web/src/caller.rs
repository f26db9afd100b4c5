//! Builds a [`CallerContext`] from request headers.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use slugpress_shared::CallerContext;

/// A caller is privileged when it presents `Authorization: Bearer <token>`
/// matching the configured bypass token. With no token configured nobody is.
pub fn caller_context(headers: &HeaderMap, bypass_token: Option<&str>) -> CallerContext {
    let Some(expected) = bypass_token else {
        return CallerContext::anonymous();
    };

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if !token.is_empty() && token == expected => CallerContext::privileged(),
        _ => CallerContext::anonymous(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&'static str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = auth {
            h.insert(AUTHORIZATION, HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn matching_bearer_token_is_privileged() {
        let ctx = caller_context(&headers(Some("Bearer s3cret")), Some("s3cret"));
        assert!(ctx.privileged);
    }

    #[test]
    fn wrong_or_missing_token_is_anonymous() {
        assert!(!caller_context(&headers(Some("Bearer nope")), Some("s3cret")).privileged);
        assert!(!caller_context(&headers(Some("s3cret")), Some("s3cret")).privileged);
        assert!(!caller_context(&headers(None), Some("s3cret")).privileged);
    }

    #[test]
    fn no_configured_token_means_nobody_is_privileged() {
        assert!(!caller_context(&headers(Some("Bearer anything")), None).privileged);
    }
}
