//! Integration tests for `ShopifyAdminClient` against a local mock server.

use catsync_engine::{
    CommercePlatform, PlatformError, ProductDraft, RetryPolicy, VariantDraft, VariantUpdate,
};
use catsync_shopify::ShopifyAdminClient;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ShopifyAdminClient {
    ShopifyAdminClient::new(&server.uri(), "shpat_test", 5).unwrap()
}

fn draft() -> ProductDraft {
    ProductDraft {
        handle: "ram-shirt".to_string(),
        title: "Ram Shirt".to_string(),
        body_html: "<p>Flannel</p>".to_string(),
        vendor: "Deerhunter".to_string(),
        tags: vec!["Herr".to_string(), "Skjortor".to_string()],
        variants: vec![VariantDraft {
            sku: "5730-376-M".to_string(),
            option1: Some("Green".to_string()),
            option2: Some("M".to_string()),
            price: Decimal::new(62930, 2),
            compare_at_price: Some(Decimal::new(89900, 2)),
            barcode: Some("5701234".to_string()),
            inventory_managed: true,
        }],
        options: vec!["Color".to_string(), "Size".to_string()],
    }
}

fn product_json() -> serde_json::Value {
    json!({
        "product": {
            "id": 1001,
            "handle": "ram-shirt",
            "variants": [{
                "id": 2001,
                "sku": "5730-376-M",
                "option1": "Green",
                "option2": "M",
                "inventory_item_id": 3001
            }]
        }
    })
}

#[tokio::test]
async fn find_product_sends_token_and_matches_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("handle", "ram-shirt"))
        .and(header("X-Shopify-Access-Token", "shpat_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                { "id": 7, "handle": "ram-shirt-2", "variants": [] },
                { "id": 1001, "handle": "ram-shirt", "variants": [{ "id": 2001, "option1": "Default Title" }] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = client(&server).find_product("ram-shirt").await.unwrap().unwrap();

    assert_eq!(found.id, 1001);
    assert_eq!(found.variants[0].id, 2001);
    assert_eq!(found.variants[0].inventory_item_id, None);
}

#[tokio::test]
async fn find_product_returns_none_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": [] })))
        .mount(&server)
        .await;

    assert!(client(&server).find_product("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn create_product_posts_full_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products.json"))
        .and(body_partial_json(json!({
            "product": {
                "handle": "ram-shirt",
                "tags": "Herr, Skjortor",
                "options": [{ "name": "Color" }, { "name": "Size" }],
                "variants": [{
                    "sku": "5730-376-M",
                    "price": "629.30",
                    "compare_at_price": "899.00",
                    "inventory_management": "shopify",
                    "inventory_policy": "deny"
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(product_json()))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server).create_product(&draft()).await.unwrap();

    assert_eq!(created.id, 1001);
    assert_eq!(created.variants[0].inventory_item_id, Some(3001));
}

#[tokio::test]
async fn update_variant_sends_only_pricing_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/variants/2001.json"))
        .and(body_partial_json(json!({
            "variant": { "id": 2001, "price": "349.00", "compare_at_price": null }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "variant": { "id": 2001 } })))
        .expect(1)
        .mount(&server)
        .await;

    let update = VariantUpdate {
        price: Decimal::new(34900, 2),
        compare_at_price: None,
        barcode: None,
    };
    client(&server).update_variant(2001, &update).await.unwrap();
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2.0"))
        .mount(&server)
        .await;

    let err = client(&server).find_product("ram-shirt").await.unwrap_err();

    assert_eq!(
        err,
        PlatformError::RateLimited {
            retry_after_secs: Some(2)
        }
    );
}

#[tokio::test]
async fn unprocessable_entity_is_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "errors": { "title": ["can't be blank"] } })),
        )
        .mount(&server)
        .await;

    let err = client(&server).create_product(&draft()).await.unwrap_err();

    match err {
        PlatformError::Validation { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("can't be blank"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inventory_levels/set.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)
        .set_inventory_level(1, 2, 3)
        .await
        .unwrap_err();

    assert!(err.is_retriable());
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server).find_product("x").await.unwrap_err();

    assert!(matches!(err, PlatformError::InvalidResponse(_)));
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn retry_policy_recovers_from_single_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/1001/images.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/products/1001/images.json"))
        .and(body_partial_json(json!({ "image": { "src": "https://img/5730.jpg" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "image": { "id": 9001 } })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let id = RetryPolicy::immediate(3)
        .run("upload_image", || client.upload_image(1001, "https://img/5730.jpg"))
        .await
        .unwrap();

    assert_eq!(id, 9001);
}

#[tokio::test]
async fn resolve_location_prefers_configured_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(client(&server).resolve_location(Some(55)).await.unwrap(), 55);
}

#[tokio::test]
async fn resolve_location_picks_first_active() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [
                { "id": 1, "active": false },
                { "id": 2, "active": true },
                { "id": 3 }
            ]
        })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).resolve_location(None).await.unwrap(), 2);
}

#[tokio::test]
async fn smart_collection_uses_tag_rule() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/smart_collections.json"))
        .and(body_partial_json(json!({
            "smart_collection": {
                "title": "Jackor",
                "rules": [{ "column": "tag", "relation": "equals", "condition": "Jackor" }]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "smart_collection": { "id": 44, "title": "Jackor" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let collection = client(&server).create_smart_collection("Jackor").await.unwrap();
    assert_eq!(collection.id, 44);
}

#[tokio::test]
async fn publish_sets_global_scope() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/products/1001.json"))
        .and(body_partial_json(json!({
            "product": { "id": 1001, "published": true, "published_scope": "global" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json()))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).publish(1001).await.unwrap();
}
