use reqwest::StatusCode;
use serde_json::{json, Value};
use sitebuilder_api::config::AppConfig;
use sitebuilder_api::state::AppState;
use sitebuilder_api::store::Store;
use sitebuilder_core::events::{EventBus, SiteEvent};
use sitebuilder_core::site::Site;
use tokio::sync::broadcast;
use uuid::Uuid;

const TENANT_HOST: &str = "greenleaf.localhost";

struct TestApp {
    base: String,
    client: reqwest::Client,
    events: broadcast::Receiver<SiteEvent>,
    store: Store,
    site_id: Uuid,
}

impl TestApp {
    async fn spawn() -> Self {
        let config = AppConfig::default();
        let store = Store::memory();
        let site = store
            .insert_site(
                Site::new("Green Leaf Nursery", "greenleaf").with_custom_domain("greenleaf-nursery.com"),
                &config.domain_config(),
            )
            .await
            .unwrap();

        let event_bus = EventBus::new(16);
        let events = event_bus.subscribe();
        let state = AppState::new(store.clone(), config, event_bus);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, sitebuilder_api::app(state)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            events,
            store,
            site_id: site.id,
        }
    }

    fn get(&self, host: &str, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base))
            .header("x-forwarded-host", host)
    }

    fn put(&self, host: &str, path: &str) -> reqwest::RequestBuilder {
        self.client
            .put(format!("{}{path}", self.base))
            .header("x-forwarded-host", host)
    }

    fn post(&self, host: &str, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base))
            .header("x-forwarded-host", host)
    }
}

fn section_ids(content: &Value) -> Vec<&str> {
    content["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn site_resolves_by_subdomain_and_custom_domain() {
    let app = TestApp::spawn().await;

    let res = app.get(TENANT_HOST, "/v1/site").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let site: Value = res.json().await.unwrap();
    assert_eq!(site["subdomain"], "greenleaf");
    assert_eq!(site["customDomain"], "greenleaf-nursery.com");

    let res = app
        .get("www.greenleaf-nursery.com", "/v1/site")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_and_platform_hosts_are_not_sites() {
    let app = TestApp::spawn().await;

    let res = app.get("nobody.localhost", "/v1/site").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["type"], "notFound");
    assert_eq!(body["error"]["statusCode"], 404);

    let res = app.get("app.localhost", "/v1/site").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.get("bad_host", "/v1/site").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn legacy_page_is_migrated_sanitized_and_stored() {
    let mut app = TestApp::spawn().await;

    let res = app
        .put(TENANT_HOST, "/v1/pages/home")
        .json(&json!({
            "title": "Green <b>Leaf</b>",
            "content": "<p>Welcome</p><script>alert(1)</script>",
            "primaryColor": "#2f855a"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let saved: Value = res.json().await.unwrap();
    assert_eq!(saved["success"], true);
    assert_eq!(saved["from"]["kind"], "legacy");
    assert_eq!(saved["content"]["version"], "2.0");
    assert_eq!(section_ids(&saved["content"]), ["hero", "text"]);
    assert_eq!(saved["content"]["sections"][0]["data"]["title"], "Green Leaf");
    assert_eq!(saved["content"]["sections"][1]["data"]["content"], "<p>Welcome</p>");

    let SiteEvent::PageSaved(event) = app.events.recv().await.unwrap();
    assert_eq!(event.slug, "home");
    assert!(event.migrated);
    assert_eq!(event.previous_version, None);
    assert_eq!(event.section_count, 2);

    let res = app.get(TENANT_HOST, "/v1/pages/home").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["slug"], "home");
    assert_eq!(page["migrated"], false);
    assert_eq!(page["from"]["kind"], "v2");
    assert_eq!(page["content"], saved["content"]);
}

#[tokio::test]
async fn invalid_pages_are_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .put(TENANT_HOST, "/v1/pages/home")
        .json(&json!({
            "version": "2.0",
            "layout": "landing",
            "sections": [{ "id": "hero", "type": "hero", "data": { "title": 42 } }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["type"], "validationFailed");
    assert!(!body["errors"].as_array().unwrap().is_empty());

    let res = app
        .put(TENANT_HOST, "/v1/pages/home")
        .json(&json!({ "sections": "everything" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = app.get(TENANT_HOST, "/v1/pages/home").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.get(TENANT_HOST, "/v1/pages/Home").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn editor_commands_apply_to_stored_page() {
    let app = TestApp::spawn().await;

    let res = app
        .put(TENANT_HOST, "/v1/pages/home")
        .json(&Value::Null)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created: Value = res.json().await.unwrap();
    assert_eq!(
        section_ids(&created["content"]),
        ["hero", "features", "testimonials", "cta"]
    );

    let res = app
        .post(TENANT_HOST, "/v1/pages/home/edit")
        .json(&json!({
            "commands": [
                { "op": "mergeSection", "id": "hero", "patch": { "title": "Spring <i>sale</i>" } },
                { "op": "removeSection", "id": "testimonials" },
                { "op": "addSection", "sectionType": "faq", "position": 1 }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let edited: Value = res.json().await.unwrap();
    assert_eq!(section_ids(&edited["content"]), ["hero", "faq", "features", "cta"]);
    assert_eq!(edited["content"]["sections"][0]["data"]["title"], "Spring sale");

    let res = app
        .post(TENANT_HOST, "/v1/pages/home/edit")
        .json(&json!({ "commands": [{ "op": "removeSection", "id": "ghost" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Section not found: ghost");

    let res = app.get(TENANT_HOST, "/v1/pages/home").send().await.unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(section_ids(&page["content"]), ["hero", "faq", "features", "cta"]);
}

#[tokio::test]
async fn stored_v1_keys_are_editable_under_the_ids_reads_show() {
    let mut app = TestApp::spawn().await;
    app.store
        .put_page(
            app.site_id,
            "home",
            json!({
                "version": "1.0",
                "sections": {
                    "hero main": { "type": "hero", "order": 1, "data": { "title": "Ferns" } },
                    "a b": { "type": "text", "order": 2, "data": { "content": "<p>one</p>" } },
                    "ab": { "type": "text", "order": 3, "data": { "content": "<p>two</p>" } }
                }
            }),
        )
        .await
        .unwrap();

    let res = app.get(TENANT_HOST, "/v1/pages/home").send().await.unwrap();
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["migrated"], true);
    assert_eq!(section_ids(&page["content"]), ["heromain", "ab", "ab-2"]);

    let res = app
        .post(TENANT_HOST, "/v1/pages/home/edit")
        .json(&json!({
            "commands": [
                { "op": "setVisibility", "id": "heromain", "visible": false },
                { "op": "removeSection", "id": "ab-2" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let edited: Value = res.json().await.unwrap();
    assert_eq!(section_ids(&edited["content"]), ["heromain", "ab"]);
    assert_eq!(edited["content"]["sections"][0]["visible"], false);
    assert_eq!(edited["migrated"], true);

    let SiteEvent::PageSaved(event) = app.events.recv().await.unwrap();
    assert!(event.migrated);
    assert_eq!(event.previous_version.as_deref(), Some("1.0"));
}

#[tokio::test]
async fn content_helpers_need_no_tenant() {
    let app = TestApp::spawn().await;

    let res = app
        .post("localhost", "/v1/content/migrate")
        .json(&json!({
            "version": "1.0",
            "sections": {
                "cta": { "order": 2, "data": { "heading": "Visit us" } },
                "hero": { "order": 1, "data": { "title": "Ferns" } }
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["from"]["kind"], "v1");
    assert_eq!(body["changed"], true);
    assert_eq!(section_ids(&body["content"]), ["hero", "cta"]);

    let res = app
        .post("localhost", "/v1/content/migrate")
        .json(&json!({ "version": "9.0", "title": "Ferns" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .post("localhost", "/v1/content/validate")
        .json(&json!({ "version": "9.0" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["success"], false);
    assert!(report.get("content").is_none());
}

#[tokio::test]
async fn health_reports_store_backend() {
    let app = TestApp::spawn().await;
    let res = app.get("localhost", "/health").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["store"], "memory");
    assert_eq!(body["subscribers"], 1);
}
