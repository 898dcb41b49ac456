use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Form, Json, Router,
    extract::{Request, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use platform_api::ErrorBody;
use platform_authn::{AuthnError, Credentials, SessionKeys, authorize};
use platform_authz::{GuardDecision, RoutePolicy};
use platform_db::DbPool;
use products_hr::HrStore;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{actions, api, cache::PageCache, config::AppConfig, pages, session};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub hr: Arc<HrStore>,
    pub config: Arc<AppConfig>,
    pub keys: Arc<SessionKeys>,
    pub policy: Arc<RoutePolicy>,
    pub cache: Arc<PageCache>,
}

impl AppState {
    pub fn new(pool: DbPool, hr: Arc<HrStore>, config: Arc<AppConfig>) -> Self {
        Self {
            pool,
            hr,
            keys: config.session_keys.clone(),
            policy: Arc::new(RoutePolicy::default()),
            cache: Arc::new(PageCache::new(config.page_cache_ttl)),
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "portal server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::GET])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/login", get(login_form_handler).post(login_handler))
        .route("/logout", post(logout_handler))
        .merge(pages::router())
        .merge(api::router())
        .merge(actions::router())
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// Resolves the session cookie, exposes it to handlers as a request
/// extension and applies the route policy.
async fn route_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = session::session_from_jar(&state.keys, &jar);
    let decision = state
        .policy
        .evaluate(request.uri().path(), user.as_ref().map(|u| u.role));
    match decision {
        GuardDecision::Allow => {
            if let Some(user) = user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        GuardDecision::RedirectToLogin => {
            Redirect::to(&state.policy.login_path).into_response()
        }
        GuardDecision::RedirectToHome => Redirect::to(state.policy.home_path()).into_response(),
    }
}

#[derive(Serialize)]
struct LoginForm {
    action: &'static str,
    method: &'static str,
    fields: [&'static str; 2],
}

async fn login_form_handler() -> Json<LoginForm> {
    Json(LoginForm {
        action: "/login",
        method: "POST",
        fields: ["email", "password"],
    })
}

async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Response {
    let Some(user) = authorize(&credentials) else {
        info!(email = %credentials.email, "login rejected");
        return invalid_credentials();
    };
    match state.keys.issue(&user, state.config.session_ttl) {
        Ok(token) => {
            info!(email = %user.email, role = %user.role, "login succeeded");
            let jar = jar.add(session::session_cookie(&state.config, token));
            (jar, Redirect::to(state.policy.home_path())).into_response()
        }
        Err(err) => platform_api::ApiError::internal(err.into()).into_response(),
    }
}

fn invalid_credentials() -> Response {
    let body = ErrorBody {
        error: AuthnError::InvalidCredentials.to_string(),
        code: "UNAUTHORIZED",
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(user) = session::session_from_jar(&state.keys, &jar) {
        info!(email = %user.email, "logout");
    }
    (session::clear_session(jar), Redirect::to(&state.policy.login_path))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = platform_db::ping(&state.pool).await;
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, Response, header},
    };
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use platform_authn::{SESSION_COOKIE, SessionUser, demo_users};
    use platform_db::DatabaseSettings;
    use products_hr::HrStore;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::{AppState, build_router};
    use crate::config::AppConfig;

    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
    }

    pub async fn app() -> TestApp {
        let secret = STANDARD.encode([7u8; 32]);
        let config = AppConfig::from_lookup(|key| match key {
            "AUTH_SECRET_BASE64" => Some(secret.clone()),
            "SECURE_COOKIES" => Some("false".into()),
            _ => None,
        })
        .unwrap();
        let mut settings = DatabaseSettings::new("sqlite::memory:");
        settings.max_connections = Some(1);
        let pool = platform_db::connect(&settings).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();
        platform_db::seed_demo(&pool).await.unwrap();
        let state = AppState::new(pool, Arc::new(HrStore::seeded()), Arc::new(config));
        TestApp {
            router: build_router(state.clone()),
            state,
        }
    }

    pub fn user(email: &str) -> SessionUser {
        demo_users()
            .into_iter()
            .find(|u| u.email == email)
            .unwrap()
    }

    pub const ADMIN: &str = "admin@portal.local";
    pub const MANAGER: &str = "manager@portal.local";
    pub const EMPLOYEE: &str = "employee@portal.local";

    impl TestApp {
        pub fn cookie_for(&self, email: &str) -> String {
            let token = self
                .state
                .keys
                .issue(&user(email), chrono::Duration::minutes(5))
                .unwrap();
            format!("{SESSION_COOKIE}={token}")
        }

        pub async fn get(&self, uri: &str, as_user: Option<&str>) -> Response<Body> {
            let mut builder = Request::builder().uri(uri);
            if let Some(email) = as_user {
                builder = builder.header(header::COOKIE, self.cookie_for(email));
            }
            self.router
                .clone()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap()
        }

        pub async fn post_form(
            &self,
            uri: &str,
            form: &str,
            as_user: Option<&str>,
        ) -> Response<Body> {
            let mut builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(email) = as_user {
                builder = builder.header(header::COOKIE, self.cookie_for(email));
            }
            self.router
                .clone()
                .oneshot(builder.body(Body::from(form.to_string())).unwrap())
                .await
                .unwrap()
        }
    }

    pub async fn json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use super::testing::*;

    #[tokio::test]
    async fn anonymous_dashboard_requests_redirect_to_login() {
        let app = app().await;
        for path in [
            "/dashboard",
            "/dashboard/employees",
            "/dashboard/requisitions?status=PENDING",
            "/dashboard/admin/audit-logs",
        ] {
            let response = app.get(path, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(location(&response), "/login");
        }
    }

    #[tokio::test]
    async fn non_admins_are_sent_home_from_admin_pages() {
        let app = app().await;
        for who in [MANAGER, EMPLOYEE] {
            let response = app.get("/dashboard/admin/users", Some(who)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/dashboard");
        }
        let response = app.get("/dashboard/admin/users", Some(ADMIN)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn employees_cannot_open_manager_pages() {
        let app = app().await;
        let response = app.get("/dashboard/payroll", Some(EMPLOYEE)).await;
        assert_eq!(location(&response), "/dashboard");
        let response = app.get("/dashboard/documents", Some(EMPLOYEE)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn tampered_cookie_counts_as_signed_out() {
        let app = app().await;
        let response = app
            .router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/dashboard")
                    .header(header::COOKIE, "portal_session=not-a-token")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn login_sets_cookie_and_redirects() {
        let app = app().await;
        let response = app
            .post_form("/login", "email=manager%40portal.local&password=manager123", None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("portal_session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn bad_credentials_get_generic_error() {
        let app = app().await;
        let response = app
            .post_form("/login", "email=admin%40portal.local&password=nope", None)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json(response).await;
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn signed_in_users_skip_the_login_page() {
        let app = app().await;
        let response = app.get("/login", Some(EMPLOYEE)).await;
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let app = app().await;
        let response = app.post_form("/logout", "", Some(ADMIN)).await;
        assert_eq!(location(&response), "/login");
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("portal_session=;"));
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = app().await;
        let body = json(app.get("/health", None).await).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["db_ok"], true);
    }
}
