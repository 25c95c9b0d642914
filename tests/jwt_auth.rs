use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header, request::Parts},
    middleware::{Next, from_fn},
    response::Response,
    routing::get,
};
use bearer_guard::{
    Claims, Identity, JwtAuth, Located, MaybeIdentity, RequestState, RevocationCheck,
    RevocationError, Secret,
    middleware::{self, JwtAuthBuilder, QueryParam},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "shhhhhh";
const BAD_FORMAT: &str =
    "Bad Authorization header format. Format is \"Authorization: Bearer <token>\"\n";

fn sign(claims: Value, secret: &str) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `/` answers 200 with everything the middleware stored.
fn app(auth: JwtAuth) -> Router {
    let router = Router::new().route(
        "/",
        get(|state: RequestState| async move {
            Json(json!({
                "user": state.user(),
                "jwtdata": state.claims("jwtdata"),
                "token": state.token("token"),
                "authenticated": state.is_authenticated(),
            }))
        }),
    );
    middleware::apply(router, auth)
}

fn builder() -> JwtAuthBuilder {
    JwtAuth::builder().secret(Secret::shared(SECRET))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get_with(name: header::HeaderName, value: &str) -> Request<Body> {
    Request::builder()
        .uri("/")
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}

fn bearer(token: &str) -> Request<Body> {
    get_with(header::AUTHORIZATION, &format!("Bearer {token}"))
}

fn empty() -> Request<Body> {
    Request::builder().uri("/").body(Body::empty()).unwrap()
}

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let (status, body) = send(app(builder().build()), empty()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, BAD_FORMAT);
}

#[tokio::test]
async fn rejection_is_plain_text() {
    let res = app(builder().build()).oneshot(empty()).await.unwrap();
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn wrong_scheme_is_rejected() {
    for value in ["wrong", "Basic abc", "Bearer", "Bearer a b", "bearer abc"] {
        let (status, body) = send(
            app(builder().build()),
            get_with(header::AUTHORIZATION, value),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{value}");
        assert_eq!(body, BAD_FORMAT, "{value}");
    }
}

#[tokio::test]
async fn custom_locator_failure_is_verbatim() {
    let auth = builder()
        .get_token(|_: &Parts| Located::failed(StatusCode::UNAUTHORIZED, "Bad Authorization\n"))
        .build();

    let (status, body) = send(app(auth), bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Bad Authorization\n");
}

#[tokio::test]
async fn custom_locator_status_is_kept_even_with_passthrough() {
    let auth = builder()
        .passthrough(true)
        .get_token(|_: &Parts| Located::failed(StatusCode::FORBIDDEN, "nope"))
        .build();

    let (status, body) = send(app(auth), empty()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "nope");
}

#[tokio::test]
async fn custom_locator_token_is_used() {
    let token = sign(json!({"foo": "bar"}), SECRET);
    let fixed = token.clone();
    let auth = builder()
        .get_token(move |_: &Parts| Located::Token(fixed.clone()))
        .build();

    let (status, body) = send(app(auth), empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["user"]["foo"], "bar");
}

#[tokio::test]
async fn custom_locator_not_found_falls_back_to_header() {
    let auth = builder().get_token(|_: &Parts| Located::NotFound).build();

    let (status, body) = send(app(auth), bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["user"]["foo"], "bar");
}

#[tokio::test]
async fn query_param_source() {
    let token = sign(json!({"foo": "bar"}), SECRET);
    let auth = builder().get_token(QueryParam::new("access_token")).build();

    let req = Request::builder()
        .uri(format!("/?access_token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(auth), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["user"]["foo"], "bar");
}

#[tokio::test]
async fn malformed_token() {
    let (status, body) = send(app(builder().build()), bearer("wrongjwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token\n");

    let (status, body) = send(app(builder().debug(true).build()), bearer("wrongjwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - jwt malformed\n");
}

#[tokio::test]
async fn wrong_signature_detail_only_in_debug() {
    let token = sign(json!({"foo": "bar"}), "different-shhhhhh");

    let (_, body) = send(app(builder().build()), bearer(&token)).await;
    assert_eq!(body, "Invalid token\n");

    let (status, body) = send(app(builder().debug(true).build()), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - invalid signature\n");
}

#[tokio::test]
async fn bad_cookie_is_rejected() {
    let auth = builder().cookie("jwt").debug(true).build();
    let token = sign(json!({"foo": "bar"}), "bad");

    let (status, body) = send(
        app(auth),
        get_with(header::COOKIE, &format!("jwt={token}")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - invalid signature\n");
}

#[tokio::test]
async fn audience_mismatch() {
    let auth = builder()
        .audience("http://expected_audience")
        .debug(true)
        .build();
    let token = sign(json!({"foo": "bar", "aud": "http://wrong_audience"}), SECRET);

    let (status, body) = send(app(auth), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        "Invalid token - jwt audience invalid. expected: http://expected_audience\n"
    );
}

#[tokio::test]
async fn audience_required_when_configured() {
    let auth = builder().audience("x").debug(true).build();
    let token = sign(json!({"foo": "bar"}), SECRET);

    let (status, body) = send(app(auth), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - jwt audience invalid. expected: x\n");
}

#[tokio::test]
async fn expired_token() {
    let token = sign(json!({"foo": "bar", "exp": now() - 100}), SECRET);

    let (status, body) = send(app(builder().debug(true).build()), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - jwt expired\n");

    let lenient = builder().leeway(300).build();
    let (status, _) = send(app(lenient), bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn issuer_mismatch() {
    let auth = builder().issuer("http://foo").debug(true).build();
    let token = sign(json!({"foo": "bar", "iss": "http://wrong"}), SECRET);

    let (status, body) = send(app(auth), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - jwt issuer invalid. expected: http://foo\n");
}

#[tokio::test]
async fn missing_secret() {
    let auth = JwtAuth::builder().build();
    let token = sign(json!({"foo": "bar"}), SECRET);

    let (status, body) = send(app(auth), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid secret\n");
}

async fn set_request_secret(mut req: Request<Body>, next: Next) -> Response {
    RequestState::of_mut(req.extensions_mut()).set_secret(Secret::shared(SECRET));
    next.run(req).await
}

#[tokio::test]
async fn request_secret_wins_over_configured() {
    let auth = JwtAuth::builder()
        .secret(Secret::shared("configured-but-wrong"))
        .build();
    let app = app(auth).layer(from_fn(set_request_secret));

    let (status, body) = send(app, bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["user"]["foo"], "bar");
}

#[tokio::test]
async fn request_secret_without_configured_one() {
    let app = app(JwtAuth::builder().build()).layer(from_fn(set_request_secret));

    let (status, _) = send(app, bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn valid_token_sets_claims() {
    let token = sign(json!({"foo": "bar"}), SECRET);

    let (status, body) = send(app(builder().build()), bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["user"], json!({"foo": "bar"}));
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["token"], Value::Null);
}

#[tokio::test]
async fn custom_key_and_token_key() {
    let auth = builder().key("jwtdata").token_key("token").build();
    let token = sign(json!({"foo": "bar"}), SECRET);

    let (status, body) = send(app(auth), bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let body = json_body(&body);
    assert_eq!(body["jwtdata"]["foo"], "bar");
    assert_eq!(body["user"], Value::Null);
    assert_eq!(body["token"], token);
}

#[tokio::test]
async fn cookie_takes_precedence_over_header() {
    let auth = builder().cookie("jwt").build();
    let cookie_token = sign(json!({"from": "cookie"}), SECRET);
    let header_token = sign(json!({"from": "header"}), SECRET);

    let req = Request::builder()
        .uri("/")
        .header(header::COOKIE, format!("other=1; jwt={cookie_token}"))
        .header(header::AUTHORIZATION, format!("Bearer {header_token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app(auth), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["user"]["from"], "cookie");
}

#[tokio::test]
async fn bad_cookie_is_not_rescued_by_header() {
    let auth = builder().cookie("jwt").debug(true).build();
    let bad = sign(json!({"from": "cookie"}), "bad");
    let good = sign(json!({"from": "header"}), SECRET);

    let req = Request::builder()
        .uri("/")
        .header(header::COOKIE, format!("jwt={bad}"))
        .header(header::AUTHORIZATION, format!("Bearer {good}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app(auth), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - invalid signature\n");
}

#[tokio::test]
async fn empty_cookie_falls_back_to_header() {
    let auth = builder().cookie("jwt").build();
    let token = sign(json!({"from": "header"}), SECRET);

    let req = Request::builder()
        .uri("/")
        .header(header::COOKIE, "jwt=")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app(auth), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["user"]["from"], "header");
}

#[tokio::test]
async fn passthrough_continues_without_claims() {
    let router = Router::new().route(
        "/",
        get(|MaybeIdentity(claims): MaybeIdentity| async move {
            if claims.is_some() {
                StatusCode::OK
            } else {
                StatusCode::NO_CONTENT
            }
        }),
    );
    let app = middleware::apply(router, builder().passthrough(true).build());

    let (status, _) = send(app.clone(), empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app.clone(), bearer("wrongjwt")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app, bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn passthrough_records_the_reason() {
    let router = Router::new().route(
        "/",
        get(|state: RequestState| async move {
            match state.status() {
                Some(bearer_guard::AuthStatus::PassthroughRejected(err)) => err.public_message(true),
                _ => "none".to_string(),
            }
        }),
    );
    let app = middleware::apply(router, builder().passthrough(true).build());

    let (_, body) = send(app, bearer("wrongjwt")).await;
    assert_eq!(body, "Invalid token - jwt malformed");
}

#[tokio::test]
async fn identity_extractor() {
    let router = Router::new().route(
        "/",
        get(|Identity(claims): Identity| async move {
            claims.get_str("foo").unwrap_or_default().to_string()
        }),
    );

    let protected = middleware::apply(router.clone(), builder().build());
    let (status, body) = send(protected, bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "bar");

    // No middleware: nothing to extract.
    let (status, _) = send(router, empty()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

enum Outcome {
    Revoked,
    Valid,
    Fails,
}

struct FixedCheck {
    outcome: Outcome,
    calls: Arc<AtomicUsize>,
}

impl FixedCheck {
    fn new(outcome: Outcome) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                outcome,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl RevocationCheck for FixedCheck {
    fn is_revoked<'a>(
        &'a self,
        _parts: &'a Parts,
        _token: &'a str,
        _claims: &'a Claims,
    ) -> Pin<Box<dyn Future<Output = Result<bool, RevocationError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match self.outcome {
                Outcome::Revoked => Ok(true),
                Outcome::Valid => Ok(false),
                Outcome::Fails => Err(RevocationError::rejected("An error ocurred")),
            }
        })
    }
}

#[tokio::test]
async fn revoked_token() {
    let (check, calls) = FixedCheck::new(Outcome::Revoked);
    let auth = builder().is_revoked(check).build();

    let (status, body) = send(app(auth), bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - Revoked token\n");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn revocation_check_error() {
    let token = sign(json!({"foo": "bar"}), SECRET);

    let (check, _) = FixedCheck::new(Outcome::Fails);
    let (status, body) = send(app(builder().is_revoked(check).build()), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - Revoked token\n");

    let (check, _) = FixedCheck::new(Outcome::Fails);
    let auth = builder().is_revoked(check).debug(true).build();
    let (status, body) = send(app(auth), bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - An error ocurred\n");
}

#[tokio::test]
async fn not_revoked_token() {
    let (check, calls) = FixedCheck::new(Outcome::Valid);
    let auth = builder().is_revoked(check).build();

    let (status, body) = send(app(auth), bearer(&sign(json!({"foo": "bar"}), SECRET))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["user"]["foo"], "bar");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn revocation_not_consulted_for_invalid_tokens() {
    let (check, calls) = FixedCheck::new(Outcome::Valid);
    let auth = builder().is_revoked(check).build();

    let (status, _) = send(app(auth), bearer("wrongjwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn denylist_revocation_round() {
    let denylist = bearer_guard::CacheDenylist::in_memory();
    let auth = builder().is_revoked(denylist.clone()).build();
    let app = app(auth);

    let token = sign(json!({"foo": "bar", "jti": "abc", "exp": now() + 600}), SECRET);
    let (status, _) = send(app.clone(), bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let claims: Claims = serde_json::from_value(json!({"jti": "abc", "exp": now() + 600})).unwrap();
    assert!(denylist.revoke(&token, &claims).await.unwrap());

    let (status, body) = send(app, bearer(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid token - Revoked token\n");
}
