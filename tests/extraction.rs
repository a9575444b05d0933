mod helpers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use unfurl::render::Renderer;
use unfurl::{ExtractError, Extractor, SiteKind, SiteRegistry};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

use helpers::{StubRenderer, test_config};

const PNG_BYTES: [u8; 4] = [0x89, b'P', b'N', b'G'];

async fn serve_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn serve_favicon(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/favicon"))
        .and(query_param("type", "FAVICON"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_BYTES.to_vec())
                .insert_header("Content-Type", "image/png"),
        )
        .mount(server)
        .await;
}

fn extractor(server: &MockServer, registry: SiteRegistry, renderer: Arc<dyn Renderer>) -> Extractor {
    Extractor::with_parts(test_config(server), registry, renderer).unwrap()
}

#[tokio::test]
async fn test_generic_article_end_to_end() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/blog/post",
        r#"<html><head>
            <title>Ignored doc title</title>
            <meta property="og:title" content="Shipping the new parser">
            <meta property="og:description" content="How the rewrite went.">
            <meta property="og:image" content="/img/cover.jpg">
        </head><body><article><h1>Shipping</h1></article></body></html>"#,
    )
    .await;
    serve_favicon(&server).await;

    let renderer = Arc::new(StubRenderer::returning(""));
    let extractor = extractor(&server, SiteRegistry::new(), renderer.clone());

    let url = format!("{}/blog/post", server.uri());
    let result = extractor.extract(&url).await.unwrap();

    assert_eq!(result.url, url);
    assert_eq!(result.title, "Shipping the new parser");
    assert_eq!(result.description.as_deref(), Some("How the rewrite went."));
    assert_eq!(
        result.image,
        Some(format!("{}/img/cover.jpg", server.uri()))
    );
    assert_eq!(result.favicon.as_deref(), Some("data:image/png;base64,iVBORw=="));
    assert!(renderer.calls().is_empty());
}

#[tokio::test]
async fn test_favicon_lookup_targets_requested_page() {
    let server = MockServer::start().await;
    serve_html(&server, "/page", "<html><body><h1>Only heading</h1></body></html>").await;

    let url = format!("{}/page", server.uri());
    Mock::given(method("GET"))
        .and(path("/favicon"))
        .and(query_param("client", "SOCIAL"))
        .and(query_param("fallback_opts", "TYPE,SIZE,URL"))
        .and(query_param("url", url.as_str()))
        .and(query_param("size", "16"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_BYTES.to_vec())
                .insert_header("Content-Type", "image/x-icon"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let extractor = extractor(&server, SiteRegistry::new(), Arc::new(StubRenderer::returning("")));
    let result = extractor.extract(&url).await.unwrap();

    assert_eq!(result.title, "Only heading");
    assert_eq!(result.description.as_deref(), Some("Only heading"));
    assert_eq!(result.image, None);
    assert_eq!(result.favicon.as_deref(), Some("data:image/x-icon;base64,iVBORw=="));
}

#[tokio::test]
async fn test_favicon_failure_is_not_fatal() {
    let server = MockServer::start().await;
    serve_html(&server, "/page", "<html><head><title>T</title></head></html>").await;
    Mock::given(method("GET"))
        .and(path("/favicon"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let extractor = extractor(&server, SiteRegistry::new(), Arc::new(StubRenderer::returning("")));
    let result = extractor
        .extract(&format!("{}/page", server.uri()))
        .await
        .unwrap();

    assert_eq!(result.title, "T");
    assert_eq!(result.favicon, None);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("favicon").is_none());
    assert!(json.get("description").is_none());
}

#[tokio::test]
async fn test_headline_site_reads_script_payload() {
    let server = MockServer::start().await;
    serve_html(
        &server,
        "/juejin/post/1",
        r#"<html><head><title>Community</title>
            <meta name="description" content="Summary from meta">
            <script>window.__STATE__={"headline":"Payload title","content":"<p><img src=\"https://cdn.example.com/a.png\"></p>"}</script>
        </head><body><h1>Visible heading</h1></body></html>"#,
    )
    .await;
    serve_favicon(&server).await;

    let extractor = extractor(
        &server,
        SiteRegistry::new().route("juejin", SiteKind::Headline),
        Arc::new(StubRenderer::returning("")),
    );
    let result = extractor
        .extract(&format!("{}/juejin/post/1", server.uri()))
        .await
        .unwrap();

    assert_eq!(result.title, "Payload title");
    assert_eq!(result.description.as_deref(), Some("Summary from meta"));
    assert_eq!(result.image.as_deref(), Some("https://cdn.example.com/a.png"));
}

#[tokio::test]
async fn test_rendered_site_uses_renderer() {
    let server = MockServer::start().await;
    serve_favicon(&server).await;

    let renderer = Arc::new(StubRenderer::returning(
        r#"<html><head><meta name="description" content="Rendered meta"></head>
           <body><h1>Rendered title</h1><p><img src="/ignored.png"></p></body></html>"#,
    ));
    let extractor = extractor(
        &server,
        SiteRegistry::new().route("/spa/", SiteKind::Rendered {
            wait_for: "#root".to_string(),
        }),
        renderer.clone(),
    );

    let url = format!("{}/spa/question/9", server.uri());
    let result = extractor.extract(&url).await.unwrap();

    assert_eq!(result.title, "Rendered title");
    assert_eq!(result.description.as_deref(), Some("Rendered meta"));
    assert_eq!(result.image, None);
    assert!(result.favicon.is_some());
    assert_eq!(renderer.calls(), vec![(url, "#root".to_string())]);

    // The page itself was never fetched over plain HTTP.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() == "/favicon"));
}

#[tokio::test]
async fn test_render_timeout_fails_extraction() {
    let server = MockServer::start().await;
    serve_favicon(&server).await;

    let extractor = extractor(
        &server,
        SiteRegistry::new().route("/spa/", SiteKind::Rendered {
            wait_for: "h1".to_string(),
        }),
        Arc::new(StubRenderer::timing_out()),
    );

    let err = extractor
        .extract(&format!("{}/spa/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::Render(_)));
}

#[tokio::test]
async fn test_http_failure_fails_extraction() {
    let server = MockServer::start().await;
    serve_favicon(&server).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let extractor = extractor(&server, SiteRegistry::new(), Arc::new(StubRenderer::returning("")));
    let err = extractor
        .extract(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::Fetch(_)));
}

#[tokio::test]
async fn test_page_failure_does_not_wait_for_favicon() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/favicon"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG_BYTES.to_vec())
                .insert_header("Content-Type", "image/png")
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let extractor = extractor(&server, SiteRegistry::new(), Arc::new(StubRenderer::returning("")));
    let started = Instant::now();
    let err = extractor
        .extract(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Fetch(_)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_invalid_url_fails_extraction() {
    let server = MockServer::start().await;
    let extractor = extractor(&server, SiteRegistry::new(), Arc::new(StubRenderer::returning("")));

    let err = extractor.extract("not a url").await.unwrap_err();
    assert!(matches!(err, ExtractError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_concurrent_extractions_are_independent() {
    let server = MockServer::start().await;
    serve_favicon(&server).await;
    serve_html(&server, "/a", "<html><head><title>Page A</title></head></html>").await;
    serve_html(&server, "/b", "<html><head><title>Page B</title></head></html>").await;

    let extractor = extractor(&server, SiteRegistry::new(), Arc::new(StubRenderer::returning("")));
    let url_a = format!("{}/a", server.uri());
    let url_b = format!("{}/b", server.uri());
    let (a, b) = tokio::join!(extractor.extract(&url_a), extractor.extract(&url_b));

    assert_eq!(a.unwrap().title, "Page A");
    assert_eq!(b.unwrap().title, "Page B");
}
