//! HTTP surface for slugpress.
//!
//! ## Routes
//!
//! - `GET /` - the configured home page
//! - `GET /{slug}` - any active page
//! - `GET /logout?redirect=<target>` - 303 to a vetted redirect target
//!
//! Page routes run the maintenance gate first, then the resolver, and map
//! the outcome to `200`, `404` or `500` (`503` while in maintenance).

pub mod caller;
pub mod views;

use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use slugpress_core::{GateDecision, MaintenanceGate, Outcome, PageResolver, validate_redirect};

use crate::caller::caller_context;
use crate::views::SiteChrome;

/// Shared state for every request.
#[derive(Clone)]
pub struct AppState {
    pub resolver: PageResolver,
    /// Slug served at `/`.
    pub home_slug: String,
    /// Where rejected redirect targets go instead.
    pub redirect_fallback: String,
    /// Token that makes a caller privileged during maintenance.
    pub bypass_token: Option<String>,
}

/// Build the router with tracing middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/logout", get(logout))
        .route("/{slug}", get(page))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "slugpress listening");
    axum::serve(listener, router(state)).await
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let slug = state.home_slug.clone();
    render_slug(&state, &headers, &slug).await
}

async fn page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    render_slug(&state, &headers, &slug).await
}

#[derive(Debug, Deserialize)]
struct LogoutParams {
    #[serde(default)]
    redirect: String,
}

/// Session teardown happens upstream; this only picks a safe destination.
async fn logout(State(state): State<AppState>, Query(params): Query<LogoutParams>) -> Redirect {
    let target = validate_redirect(
        &params.redirect,
        state.resolver.site_origin(),
        &state.redirect_fallback,
    );
    debug!(requested = %params.redirect, %target, "logout redirect");
    Redirect::to(&target)
}

async fn not_found(State(state): State<AppState>) -> Response {
    let site = SiteChrome::from_settings(state.resolver.settings());
    (StatusCode::NOT_FOUND, Html(views::not_found(&site).into_string())).into_response()
}

async fn render_slug(state: &AppState, headers: &HeaderMap, slug: &str) -> Response {
    let settings = state.resolver.settings();
    let site = SiteChrome::from_settings(settings);
    let caller = caller_context(headers, state.bypass_token.as_deref());

    if let GateDecision::Maintenance { message } = MaintenanceGate::evaluate(settings, &caller) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Html(views::maintenance(&site, &message).into_string()),
        )
            .into_response();
    }

    match state.resolver.resolve(slug).await {
        Outcome::Found(view) => {
            (StatusCode::OK, Html(views::page(&site, &view).into_string())).into_response()
        }
        Outcome::NotFound => {
            (StatusCode::NOT_FOUND, Html(views::not_found(&site).into_string())).into_response()
        }
        Outcome::ServerError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(views::server_error(&site).into_string()),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use chrono::Utc;
    use tower::ServiceExt;

    use slugpress_shared::{
        ContentStore, PageId, PageRecord, Result, SettingsMap, SlugpressError,
        TracingErrorReporter, keys,
    };

    #[derive(Default)]
    struct FakeStore {
        pages: Vec<PageRecord>,
        fail_lookup: bool,
        increments: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for FakeStore {
        async fn find_active_by_slug(&self, slug: &str) -> Result<Option<PageRecord>> {
            if self.fail_lookup {
                return Err(SlugpressError::Storage("secret-dsn: connection refused".into()));
            }
            Ok(self.pages.iter().find(|p| p.slug == slug).cloned())
        }

        async fn increment_view_count(&self, _id: &PageId) -> Result<()> {
            self.increments.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn page(slug: &str, title: &str, content: &str) -> PageRecord {
        let now = Utc::now();
        PageRecord {
            id: PageId::new(),
            slug: slug.into(),
            title: title.into(),
            meta_title: None,
            content: content.into(),
            meta_description: Some(format!("{title} description")),
            is_active: true,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn app(store: Arc<FakeStore>, settings: SettingsMap) -> Router {
        let resolver = PageResolver::new(
            store,
            Arc::new(settings),
            Arc::new(TracingErrorReporter),
            "https://mysite.example",
        );
        router(AppState {
            resolver,
            home_slug: "home".into(),
            redirect_fallback: "/login".into(),
            bypass_token: Some("s3cret".into()),
        })
    }

    fn default_store() -> Arc<FakeStore> {
        Arc::new(FakeStore {
            pages: vec![
                page("home", "Welcome", "<p>Hello</p>"),
                page(
                    "about",
                    "About Us",
                    "<h1>A</h1><h2>B</h2><h2>C</h2><h2>D</h2>",
                ),
            ],
            ..Default::default()
        })
    }

    fn site_settings() -> SettingsMap {
        let mut s = SettingsMap::new();
        s.set(keys::SITE_NAME, "Example Co");
        s
    }

    async fn get(app: Router, uri: &str, auth: Option<&str>) -> (StatusCode, HeaderMap, String) {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = auth {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let resp = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn found_page_renders_with_toc() {
        let store = default_store();
        let (status, _, body) = get(app(store.clone(), site_settings()), "/about", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>About Us | Example Co</title>"));
        assert!(body.contains(r##"<a href="#heading-2">C</a>"##));
        assert!(body.contains(r#"<h2 id="heading-1">B</h2>"#));
        assert!(body.contains(r#"<link rel="canonical" href="https://mysite.example/about">"#));
        assert_eq!(store.increments.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn root_serves_home_slug() {
        let (status, _, body) = get(app(default_store(), site_settings()), "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome"));
    }

    #[tokio::test]
    async fn unknown_slug_is_404() {
        let (status, _, body) = get(app(default_store(), site_settings()), "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Page not found"));

        let (status, _, _) = get(app(default_store(), site_settings()), "/a/b", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_fault_is_500_without_detail() {
        let store = Arc::new(FakeStore {
            fail_lookup: true,
            ..Default::default()
        });
        let (status, _, body) = get(app(store, site_settings()), "/about", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("secret-dsn"));
        assert!(body.contains("Something went wrong"));
    }

    #[tokio::test]
    async fn maintenance_blocks_anonymous_callers_only() {
        let mut settings = site_settings();
        settings.set(keys::MAINTENANCE_MODE, "1");
        settings.set(keys::MAINTENANCE_MESSAGE, "Back soon");
        let store = default_store();

        let (status, _, body) = get(app(store.clone(), settings.clone()), "/about", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Back soon"));
        assert_eq!(store.increments.load(Ordering::SeqCst), 0);

        let (status, _, _) = get(app(store.clone(), settings), "/about", Some("s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.increments.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn logout_redirect_is_vetted() {
        let cases = [
            ("/logout?redirect=/dashboard", "/dashboard"),
            ("/logout?redirect=https%3A%2F%2Fevil.example%2Fx", "/login"),
            ("/logout?redirect=https%3A%2F%2Fmysite.example%2Fok", "https://mysite.example/ok"),
            ("/logout?redirect=%2F%2Fevil.example", "/evil.example"),
            ("/logout", "/login"),
        ];
        for (uri, expected) in cases {
            let (status, headers, _) = get(app(default_store(), site_settings()), uri, None).await;
            assert_eq!(status, StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(
                headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
                Some(expected),
                "{uri}"
            );
        }
    }
}
