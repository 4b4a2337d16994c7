mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

#[tokio::test]
async fn homepage_is_empty_until_saved() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app.get("/api/homepage", None).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["id"], 0);
    assert_eq!(body["header"]["title"], "");

    let res = app.get("/", None).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await?.contains("<title>Home"));
    Ok(())
}

#[tokio::test]
async fn admin_saves_and_visitors_see_content() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.session_for(&common::admin_user())?;

    let document = json!({
        "header": { "title": "Learn anywhere", "subtitle": "Short lessons" },
        "features": { "title": "Why", "highlights": [{ "title": "Videos", "description": "Hundreds", "iconClassName": "fa-play" }] },
        "testimonials": { "list": [{ "text": "Great", "name": "R. Reader" }] },
        "pricing": { "list": [{ "title": "Monthly", "price": "$9", "duration": "month" }] },
    });

    let res = app.post_json("/api/homepage", &admin, &document).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let first = res.json::<Value>().await?;

    let parent = app.session_for(&common::parent_user())?;
    let res = app.post_json("/api/homepage", &parent, &document).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // saving again replaces the single document
    let mut revised = document.clone();
    revised["header"]["title"] = json!("Learn everywhere");
    let second = app.post_json("/api/homepage", &admin, &revised).await?.json::<Value>().await?;
    assert_eq!(first["id"], second["id"]);

    let stored = app.get("/api/homepage", None).await?.json::<Value>().await?;
    assert_eq!(stored["header"]["title"], "Learn everywhere");
    assert_eq!(stored["features"]["highlights"][0]["iconClassName"], "fa-play");

    let html = app.get("/", None).await?.text().await?;
    assert!(html.contains("Learn everywhere"));
    assert!(html.contains("R. Reader"));
    Ok(())
}
