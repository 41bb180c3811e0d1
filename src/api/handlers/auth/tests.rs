//! Router-level auth tests against the in-memory credential store.

use super::{AuthConfig, AuthState, Environment, SessionClaims, TokenSigner};
use crate::api::{app, guard::GuardMode};
use crate::store::{
    CredentialStore, Database, MIN_COST, MemoryCredentialStore, NewUser, PgCredentialStore, User,
    hash_password,
};
use anyhow::{Context, Result, anyhow};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, Response, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};
use tower::ServiceExt;
use tracing::{Level, instrument::WithSubscriber};
use tracing_subscriber::fmt::MakeWriter;

const SECRET: &str = "test-secret-test-secret-test-secret!";
const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "correct horse battery";

fn config() -> AuthConfig {
    AuthConfig::new(SecretString::from(SECRET.to_string())).with_bcrypt_cost(MIN_COST)
}

async fn seeded_store() -> Result<(Arc<MemoryCredentialStore>, User)> {
    let store = Arc::new(MemoryCredentialStore::new());
    let user = store
        .create_user(NewUser {
            email: EMAIL.to_string(),
            name: "Alice".to_string(),
            password_hash: hash_password(PASSWORD, MIN_COST).await?,
        })
        .await?;
    Ok((store, user))
}

async fn test_app(config: AuthConfig) -> Result<(Router, User)> {
    let (store, user) = seeded_store().await?;
    let state = AuthState::new(config, store)?;
    Ok((app(Arc::new(state)), user))
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

fn get(uri: &str, cookie: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

async fn json_body(response: Response<Body>) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
}

/// Sign in and return the `token=<jwt>` pair for use in a Cookie header.
async fn signed_in_cookie(app: &Router) -> Result<String> {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": EMAIL, "password": PASSWORD }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).context("missing Set-Cookie")?;
    let pair = cookie.split(';').next().context("empty Set-Cookie")?;
    Ok(pair.to_string())
}

/// Formatted log output collected from a scoped subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .with_writer(self.clone())
            .finish()
    }

    fn lines(&self) -> Result<Vec<String>> {
        let buffer = self.0.lock().map_err(|_| anyhow!("log buffer poisoned"))?;
        Ok(String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect())
    }

    /// Whether any line was logged at `level` and contains `needle`.
    fn contains(&self, level: Level, needle: &str) -> Result<bool> {
        let level = level.to_string();
        Ok(self
            .lines()?
            .iter()
            .any(|line| line.contains(&level) && line.contains(needle)))
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn sign_in_sets_cookie_with_matching_claims() -> Result<()> {
    let (app, user) = test_app(config()).await?;

    let response = app
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": EMAIL, "password": PASSWORD }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response).context("missing Set-Cookie")?;
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(!cookie.contains("Secure"));

    let token = cookie
        .trim_start_matches("token=")
        .split(';')
        .next()
        .context("no token value")?;
    let signer = TokenSigner::new(&SecretString::from(SECRET.to_string()), 604_800);
    let claims: SessionClaims = signer.verify(token)?;
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.exp - claims.iat, 604_800);

    let body = json_body(response).await?;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["user"]["email"], json!(EMAIL));
    assert_eq!(body["user"]["name"], json!("Alice"));
    assert_eq!(body["user"]["id"], json!(user.id.to_string()));
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn sign_in_trims_email() -> Result<()> {
    let (app, _) = test_app(config()).await?;
    let response = app
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": format!("  {EMAIL} "), "password": PASSWORD }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() -> Result<()> {
    let (app, _) = test_app(config()).await?;

    let wrong_password = app
        .clone()
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": EMAIL, "password": "not the password" }),
        )?)
        .await?;
    let unknown_email = app
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )?)
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&wrong_password).is_none());
    assert!(set_cookie(&unknown_email).is_none());

    let wrong_password = json_body(wrong_password).await?;
    let unknown_email = json_body(unknown_email).await?;
    assert_eq!(wrong_password, json!({ "error": "Invalid credentials" }));
    assert_eq!(wrong_password, unknown_email);
    Ok(())
}

#[tokio::test]
async fn rejected_sign_in_is_logged_as_warning() -> Result<()> {
    let (app, _) = test_app(config()).await?;
    let logs = CapturedLogs::default();

    let response = app
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": EMAIL, "password": "not the password" }),
        )?)
        .with_subscriber(logs.subscriber())
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(logs.contains(Level::WARN, "sign-in rejected")?);
    assert!(!logs.contains(Level::ERROR, "sign-in")?);
    // The attempted password never reaches the log.
    assert!(!logs.lines()?.iter().any(|line| line.contains("not the password")));
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_rejected() -> Result<()> {
    let (app, _) = test_app(config()).await?;

    for body in [
        json!({ "email": EMAIL }),
        json!({ "password": PASSWORD }),
        json!({ "email": "", "password": "" }),
        json!({ "email": "   ", "password": PASSWORD }),
        json!({}),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/auth/sign-in", &body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(set_cookie(&response).is_none());
        assert_eq!(
            json_body(response).await?,
            json!({ "error": "Email and password are required" })
        );
    }
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let (app, _) = test_app(config()).await?;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/sign-in")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/sign-in")
        .body(Body::from(
            json!({ "email": EMAIL, "password": PASSWORD }).to_string(),
        ))?;
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unreachable_store_is_a_generic_server_error() -> Result<()> {
    let database = Database::new("postgres://cointrack@127.0.0.1:1/cointrack".to_string())
        .with_acquire_timeout(Duration::from_secs(1));
    let store = Arc::new(PgCredentialStore::new(Arc::new(database)));
    let app = app(Arc::new(AuthState::new(config(), store)?));

    let logs = CapturedLogs::default();

    let response = app
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": EMAIL, "password": PASSWORD }),
        )?)
        .with_subscriber(logs.subscriber())
        .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookie(&response).is_none());
    assert_eq!(
        json_body(response).await?,
        json!({ "error": "Something went wrong" })
    );

    // The client sees a generic message; the cause goes to the server log.
    assert!(logs.contains(Level::ERROR, "sign-in failed")?);
    assert!(logs.contains(Level::ERROR, "credential store unavailable")?);
    Ok(())
}

#[tokio::test]
async fn production_cookie_is_secure() -> Result<()> {
    let (app, _) = test_app(config().with_environment(Environment::Production)).await?;
    let response = app
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": EMAIL, "password": PASSWORD }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).context("missing Set-Cookie")?;
    assert!(cookie.contains("; Secure"));
    Ok(())
}

#[tokio::test]
async fn session_returns_user_for_valid_cookie() -> Result<()> {
    let (app, user) = test_app(config()).await?;
    let cookie = signed_in_cookie(&app).await?;

    let response = app
        .clone()
        .oneshot(get("/api/auth/session", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["user"]["id"], json!(user.id.to_string()));

    let response = app.oneshot(get("/api/auth/session", None)?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await?, json!({ "error": "Unauthorized" }));
    Ok(())
}

#[tokio::test]
async fn sign_out_clears_cookie() -> Result<()> {
    let (app, _) = test_app(config()).await?;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/sign-out")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).context("missing Set-Cookie")?;
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(json_body(response).await?, json!({ "success": true }));
    Ok(())
}

#[tokio::test]
async fn sign_up_creates_user_then_conflicts() -> Result<()> {
    let (app, _) = test_app(config()).await?;
    let body = json!({ "name": "Bob", "email": "bob@example.com", "password": "hunter2hunter2" });

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/sign-up", &body)?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await?;
    assert_eq!(created["user"]["email"], json!("bob@example.com"));

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/sign-up", &body)?)
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(response).await?,
        json!({ "error": "User already exists" })
    );

    let response = app
        .oneshot(post_json(
            "/api/auth/sign-in",
            &json!({ "email": "bob@example.com", "password": "hunter2hunter2" }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn sign_up_validates_input() -> Result<()> {
    let (app, _) = test_app(config()).await?;

    for body in [
        json!({ "name": "", "email": "bob@example.com", "password": "hunter2hunter2" }),
        json!({ "name": "Bob", "email": "not-an-email", "password": "hunter2hunter2" }),
        json!({ "name": "Bob", "email": "bob@example.com", "password": "short" }),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/auth/sign-up", &body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
    Ok(())
}

#[tokio::test]
async fn guard_redirects_anonymous_visitors_to_sign_in() -> Result<()> {
    let (app, _) = test_app(config()).await?;

    for path in ["/", "/dashboard", "/settings"] {
        let response = app.clone().oneshot(get(path, None)?).await?;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), Some("/sign-in"), "{path}");
    }

    let response = app.clone().oneshot(get("/sign-in", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get("/sign-up", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn guard_sends_signed_in_visitors_to_dashboard() -> Result<()> {
    let (app, _) = test_app(config()).await?;
    let cookie = signed_in_cookie(&app).await?;

    for path in ["/sign-in", "/sign-up"] {
        let response = app.clone().oneshot(get(path, Some(&cookie))?).await?;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&response), Some("/dashboard"), "{path}");
    }

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/", Some(&cookie))?).await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/dashboard"));
    Ok(())
}

#[tokio::test]
async fn guard_ignores_api_routes() -> Result<()> {
    let (app, _) = test_app(config()).await?;
    let response = app.oneshot(get("/api/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-app"));
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn guard_rejects_forged_cookie_when_verifying() -> Result<()> {
    let (app, _) = test_app(config()).await?;
    let response = app
        .oneshot(get("/dashboard", Some("token=not.a.jwt"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/sign-in"));
    Ok(())
}

#[tokio::test]
async fn guard_accepts_any_cookie_in_presence_only_mode() -> Result<()> {
    let (app, _) = test_app(config().with_guard_mode(GuardMode::PresenceOnly)).await?;

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some("token=not.a.jwt"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Handlers keep verifying even when the guard does not.
    let response = app
        .oneshot(get("/api/auth/session", Some("token=not.a.jwt"))?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_counts_as_no_session() -> Result<()> {
    let (app, user) = test_app(config()).await?;
    let signer = TokenSigner::new(&SecretString::from(SECRET.to_string()), 60);
    let token = signer.issue_at(user.id, 1_000_000)?;
    let cookie = format!("token={token}");

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/sign-in"));

    let response = app
        .oneshot(get("/api/auth/session", Some(&cookie))?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
