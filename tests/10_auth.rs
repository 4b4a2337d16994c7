mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{location, session_cookie, TestApp};

async fn mount_idp(app: &TestApp, userinfo: Value) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("code=good-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-123",
            "id_token": "id-123",
            "token_type": "Bearer",
            "expires_in": 86400,
        })))
        .mount(&app.idp)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer access-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(userinfo))
        .mount(&app.idp)
        .await;
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get("/health", None).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    Ok(())
}

#[tokio::test]
async fn login_page_links_to_identity_provider() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get("/login", None).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let html = res.text().await?;
    assert!(html.contains(&format!("{}/authorize?response_type=code", app.idp.uri())));
    Ok(())
}

#[tokio::test]
async fn login_skips_page_when_already_signed_in() -> Result<()> {
    let app = TestApp::spawn().await?;

    let parent = app.session_for(&common::parent_user())?;
    let res = app.get("/login", Some(&parent)).await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("/dashboard"));

    let admin = app.session_for(&common::admin_user())?;
    let res = app.get("/login", Some(&admin)).await?;
    assert_eq!(location(&res).as_deref(), Some("/admin/dashboard"));
    Ok(())
}

#[tokio::test]
async fn callback_stores_profile_in_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_idp(
        &app,
        json!({
            "sub": "auth0|parent",
            "email": "parent@example.com",
            "email_verified": true,
            "name": "Pat Parent",
        }),
    )
    .await;

    let res = app.get("/callback?code=good-code&state=xyz", None).await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("/dashboard"));

    let cookie = session_cookie(&res).expect("callback should set the session cookie");

    // the new session is good enough to create the account row
    let res = app.post_json("/api/profile", &cookie, &json!({})).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = res.json::<Value>().await?;
    assert_eq!(profile["email"], "parent@example.com");
    assert_eq!(profile["name"], "Pat Parent");
    assert_eq!(profile["billing_status"], "trial");
    Ok(())
}

#[tokio::test]
async fn callback_sends_admins_to_admin_dashboard() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_idp(
        &app,
        json!({
            "sub": "auth0|ops",
            "email": "ops@partner.org",
            "app_metadata": { "roles": ["admin"] },
        }),
    )
    .await;

    let res = app.get("/callback?code=good-code", None).await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("/admin/dashboard"));
    assert!(session_cookie(&res).is_some());
    Ok(())
}

#[tokio::test]
async fn callback_failures_do_not_create_a_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid_grant"))
        .mount(&app.idp)
        .await;

    let res = app.get("/callback?code=stale-code", None).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_cookie(&res).is_none());
    assert!(res.text().await?.contains("403"));

    let res = app.get("/callback?error=access_denied&error_description=nope", None).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.text().await?.contains("access_denied"));

    let res = app.get("/callback", None).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn logout_expires_cookie_and_returns_home() -> Result<()> {
    let app = TestApp::spawn().await?;
    let cookie = app.session_for(&common::parent_user())?;

    let res = app.get("/logout", Some(&cookie)).await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res).as_deref(), Some("/"));

    let removal = res
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("auth-session="))
        .map(str::to_string)
        .expect("logout should expire the session cookie");
    assert!(removal.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn federated_logout_goes_through_identity_provider() -> Result<()> {
    let app = TestApp::spawn_with(|config| config.security.federated_logout = true).await?;
    let cookie = app.session_for(&common::parent_user())?;

    let res = app.get("/logout", Some(&cookie)).await?;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let target = location(&res).unwrap_or_default();
    assert!(target.starts_with(&format!("{}/v2/logout?returnTo=", app.idp.uri())));
    assert!(target.ends_with("client_id=test-client"));
    Ok(())
}

#[tokio::test]
async fn browser_config_exposes_public_settings_only() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get("/auth/config.js", None).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let script = res.text().await?;
    assert!(script.contains("AUTH0_CLIENT_ID"));
    assert!(!script.contains("test-secret"));

    let config = app.get("/api/config", None).await?.json::<Value>().await?;
    assert_eq!(config["auth0_client_id"], "test-client");
    assert!(config.get("client_secret").is_none());
    Ok(())
}

#[tokio::test]
async fn startup_rejects_an_unrepresentable_session_lifetime() -> Result<()> {
    let result = TestApp::spawn_with(|config| config.security.session_expiry_hours = u64::MAX).await;
    let err = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("SESSION_EXPIRY_HOURS"), "unexpected startup result: {:?}", err);
    Ok(())
}
