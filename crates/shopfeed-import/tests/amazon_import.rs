//! End-to-end import tests against a local server standing in for both the
//! CORS relay and the enrichment provider.

use rust_decimal::Decimal;
use shopfeed_core::{Marketplace, PriceLocale};
use shopfeed_enrich::EnrichClient;
use shopfeed_import::{ImportClient, ImportError, Importer, ProxyPool, RetryPolicy};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT_URL: &str = "https://www.amazon.com/dp/B000000001";
const REFERENCE_URL: &str = "https://www.amazon.com";

fn product_page(body: &str) -> String {
    // Pages shorter than the truncation threshold are rejected as proxy
    // error stubs, so pad the fixture out.
    format!(
        "<html><body>{body}<!-- {} --></body></html>",
        "x".repeat(1200)
    )
}

fn importer_for(server: &MockServer, enricher: Option<EnrichClient>) -> Importer {
    let prefix = format!("{}/relay?url=", server.uri());
    let client = ImportClient::new(5, "shopfeed-test", RetryPolicy::immediate(3))
        .expect("client should build");
    let pool = ProxyPool::new(&[prefix.as_str()], REFERENCE_URL, 5);
    Importer::new(
        client,
        pool,
        RetryPolicy::immediate(3),
        PriceLocale::PointDecimal,
        enricher,
        0,
        2,
    )
}

async fn mount_healthy_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", REFERENCE_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string("<!doctype html><html></html>"))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn imports_a_product_through_the_relay() {
    let server = MockServer::start().await;
    mount_healthy_probe(&server).await;

    let page = product_page(
        r#"<span id="productTitle">Test Widget</span>
           <span class="a-price-whole">19</span>
           <img id="landingImage" src="https://m.media/widget._SL1500_.jpg">"#,
    );
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let importer = importer_for(&server, None);
    let record = importer.import_url(PRODUCT_URL).await.expect("import");

    assert_eq!(record.title, "Test Widget");
    assert_eq!(record.price, Decimal::from(19));
    assert_eq!(record.images, vec!["https://m.media/widget.jpg"]);
    assert_eq!(record.metadata.source, Marketplace::Amazon);
    assert_eq!(record.metadata.source_url.as_deref(), Some(PRODUCT_URL));
    assert_eq!(record.description, "Description not available");
}

// ---------------------------------------------------------------------------
// Fetch failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retries_transient_server_errors() {
    let server = MockServer::start().await;
    mount_healthy_probe(&server).await;

    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    let page = product_page(
        r#"<span id="productTitle">Recovered Widget</span>
           <span class="a-price-whole">12</span>
           <img id="landingImage" src="https://m.media/r.jpg">"#,
    );
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let importer = importer_for(&server, None);
    let record = importer.import_url(PRODUCT_URL).await.expect("import");
    assert_eq!(record.title, "Recovered Widget");
}

#[tokio::test]
async fn persistent_server_errors_surface_after_retries() {
    let server = MockServer::start().await;
    mount_healthy_probe(&server).await;

    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let importer = importer_for(&server, None);
    let err = importer.import_url(PRODUCT_URL).await.unwrap_err();
    assert!(matches!(
        err,
        ImportError::UnexpectedStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn dead_relays_produce_no_working_proxy() {
    let server = MockServer::start().await;

    // Probe answers 200 but with a non-HTML body, so it fails the doctype
    // gate.
    Mock::given(method("GET"))
        .and(path("/relay"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"error\":\"blocked\"}"))
        .mount(&server)
        .await;

    let importer = importer_for(&server, None);
    let err = importer.import_url(PRODUCT_URL).await.unwrap_err();
    assert!(matches!(err, ImportError::NoWorkingProxy { tried: 1 }));
}

// ---------------------------------------------------------------------------
// Page-content failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_wall_surfaces_as_login_redirect() {
    let server = MockServer::start().await;
    mount_healthy_probe(&server).await;

    let page = product_page(r#"<form name="signIn"><input name="email"></form>"#);
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let importer = importer_for(&server, None);
    let err = importer.import_url(PRODUCT_URL).await.unwrap_err();
    assert!(matches!(
        err,
        ImportError::LoginRedirect {
            site: Marketplace::Amazon
        }
    ));
}

#[tokio::test]
async fn page_without_a_price_is_a_missing_field() {
    let server = MockServer::start().await;
    mount_healthy_probe(&server).await;

    let page = product_page(
        r#"<span id="productTitle">Priceless Widget</span>
           <img id="landingImage" src="https://m.media/p.jpg">"#,
    );
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let importer = importer_for(&server, None);
    let err = importer.import_url(PRODUCT_URL).await.unwrap_err();
    assert!(matches!(err, ImportError::MissingField { .. }));
    assert!(err.remediation().is_some());
}

#[tokio::test]
async fn search_urls_are_rejected_before_any_fetch() {
    let server = MockServer::start().await;
    let importer = importer_for(&server, None);
    let err = importer
        .import_url("https://www.amazon.com/s?k=widgets")
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::InvalidUrl { .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enrichment_rewrites_title_and_description() {
    let server = MockServer::start().await;
    mount_healthy_probe(&server).await;

    let page = product_page(
        r#"<span id="productTitle">Test Widget</span>
           <span class="a-price-whole">19</span>
           <img id="landingImage" src="https://m.media/w.jpg">"#,
    );
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let provider = MockServer::start().await;
    let completion = |text: &str| {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
    };
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("copywriter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("A widget you can rely on.")))
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("SEO expert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Premium Test Widget")))
        .mount(&provider)
        .await;

    let enricher = EnrichClient::with_base_url("test-key", "gpt-4", 5, &provider.uri())
        .expect("enrich client should build");
    let importer = importer_for(&server, Some(enricher));
    let record = importer.import_url(PRODUCT_URL).await.expect("import");

    assert_eq!(record.title, "Premium Test Widget");
    assert_eq!(record.description, "A widget you can rely on.");
}

#[tokio::test]
async fn enrichment_provider_failure_aborts_the_import() {
    let server = MockServer::start().await;
    mount_healthy_probe(&server).await;

    let page = product_page(
        r#"<span id="productTitle">Test Widget</span>
           <span class="a-price-whole">19</span>
           <img id="landingImage" src="https://m.media/w.jpg">"#,
    );
    Mock::given(method("GET"))
        .and(path("/relay"))
        .and(query_param("url", PRODUCT_URL))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream error"))
        .mount(&provider)
        .await;

    let enricher = EnrichClient::with_base_url("test-key", "gpt-4", 5, &provider.uri())
        .expect("enrich client should build");
    let importer = importer_for(&server, Some(enricher));
    let err = importer.import_url(PRODUCT_URL).await.unwrap_err();
    assert!(matches!(err, ImportError::Provider(_)));
}
