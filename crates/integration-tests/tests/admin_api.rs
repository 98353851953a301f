//! Admin JSON API against a running admin server.
//!
//! Needs a write-capable account (`ADMIN_TEST_*`) and a viewer account
//! (`ADMIN_TEST_VIEWER_*`), created with `dn-cli admin create`.

use reqwest::StatusCode;
use serde_json::{Value, json};

use delightful_naturals_integration_tests::{admin_client, admin_url, client, location};

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_pages_redirect_and_api_refuses_without_login() {
    let client = client();
    let base = admin_url();

    let resp = client
        .get(format!("{base}/orders"))
        .send()
        .await
        .expect("Failed to get orders page");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/auth/login");

    let resp = client
        .get(format!("{base}/api/orders"))
        .send()
        .await
        .expect("Failed to get orders API");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Error is not JSON");
    assert_eq!(body["error"], "Not logged in");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_wrong_password_is_refused() {
    let resp = client()
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", "nobody@example.com"), ("password", "not-the-password")])
        .send()
        .await
        .expect("Failed to post login");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let html = resp.text().await.expect("Failed to read login page");
    assert!(html.contains("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running admin server and viewer account"]
async fn test_viewer_can_read_but_not_write() {
    let client = admin_client("ADMIN_TEST_VIEWER").await;
    let base = admin_url();

    let resp = client
        .get(format!("{base}/api/testimonials"))
        .send()
        .await
        .expect("Failed to list testimonials");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/api/testimonials"))
        .json(&json!({ "author": "Viewer", "text": "Should not save" }))
        .send()
        .await
        .expect("Failed to post testimonial");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_product_upsert_coerces_and_stores_images() {
    let client = admin_client("ADMIN_TEST").await;
    let base = admin_url();

    // 1x1 transparent PNG
    let png = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";
    let resp = client
        .post(format!("{base}/api/products"))
        .json(&json!({
            "id": "detox-60",
            "name": "Scalp Detox Oil",
            "size": "60 ml",
            "inStock": "yes",
            "price": "189.999",
            "rating": 9,
            "reviews": -3,
            "howToUse": ["Apply", ""],
            "images": [{ "index": 0, "name": "front.png", "type": "image/png", "base64": png }]
        }))
        .send()
        .await
        .expect("Failed to save product");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Product response is not JSON");
    assert_eq!(body["ok"], true);
    let product = &body["product"];
    assert_eq!(product["inStock"], true);
    assert_eq!(product["rating"], 5.0);
    assert_eq!(product["reviews"], 0);
    assert_eq!(product["howToUse"], json!(["Apply"]));

    let resp = client
        .get(format!("{base}/api/products/detox-60/images/0"))
        .send()
        .await
        .expect("Failed to get image");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_product_outside_catalog_is_rejected() {
    let client = admin_client("ADMIN_TEST").await;
    let resp = client
        .post(format!("{}/api/products", admin_url()))
        .json(&json!({ "id": "mystery-oil", "name": "Mystery" }))
        .send()
        .await
        .expect("Failed to post product");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Error is not JSON");
    assert_eq!(body["error"], "Invalid product id");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_image_index_out_of_range_is_400() {
    let client = admin_client("ADMIN_TEST").await;
    let resp = client
        .get(format!("{}/api/products/detox-60/images/21", admin_url()))
        .send()
        .await
        .expect("Failed to get image");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_upload_writes_to_media_store() {
    let client = admin_client("ADMIN_TEST").await;
    let base = admin_url();

    let part = reqwest::multipart::Part::bytes(b"GIF89a".to_vec())
        .file_name("swatch.gif")
        .mime_str("image/gif")
        .expect("Invalid mime");
    let form = reqwest::multipart::Form::new()
        .text("productId", "growth-100")
        .part("file", part);

    let resp = client
        .post(format!("{base}/api/upload"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to upload");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Upload response is not JSON");
    let url = body["url"].as_str().expect("Upload has no url");
    assert!(url.starts_with("/media/products/growth-100/"), "{url}");

    let resp = client
        .get(format!("{base}{url}"))
        .send()
        .await
        .expect("Failed to fetch upload");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_order_list_has_counts_and_rejects_unknown_status() {
    let client = admin_client("ADMIN_TEST").await;
    let base = admin_url();

    let resp = client
        .get(format!("{base}/api/orders?status=all"))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Orders are not JSON");
    assert!(body["items"].is_array());
    assert!(body["counts"]["pending"].is_number());

    let resp = client
        .get(format!("{base}/api/orders?status=lost"))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_missing_order_is_404() {
    let client = admin_client("ADMIN_TEST").await;
    let resp = client
        .patch(format!("{}/api/orders/999999999", admin_url()))
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .expect("Failed to patch order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Content
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_testimonial_defaults() {
    let client = admin_client("ADMIN_TEST").await;
    let resp = client
        .post(format!("{}/api/testimonials", admin_url()))
        .json(&json!({ "name": "Naledi", "message": "Soft hair all week." }))
        .send()
        .await
        .expect("Failed to post testimonial");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Testimonial is not JSON");
    let testimonial = &body["testimonial"];
    assert_eq!(testimonial["author"], "Naledi");
    assert_eq!(testimonial["rating"], 5.0);
    assert_eq!(testimonial["published"], true);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_journal_create_page_and_delete() {
    let client = admin_client("ADMIN_TEST").await;
    let base = admin_url();

    let resp = client
        .post(format!("{base}/api/journal"))
        .json(&json!({ "title": "Integration Test Post!", "tags": ["test"] }))
        .send()
        .await
        .expect("Failed to create post");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Post is not JSON");
    let id = body["item"]["id"].as_str().expect("Post has no id").to_string();
    assert_eq!(body["item"]["slug"], "integration-test-post");

    let resp = client
        .post(format!("{base}/api/journal"))
        .json(&json!({ "title": "   " }))
        .send()
        .await
        .expect("Failed to post");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let page: Value = client
        .get(format!("{base}/api/journal?limit=1&q=integration"))
        .send()
        .await
        .expect("Failed to list posts")
        .json()
        .await
        .expect("Posts are not JSON");
    assert_eq!(page["items"].as_array().map(Vec::len), Some(1));
    assert!(page["nextCursor"].is_string());

    let resp = client
        .delete(format!("{base}/api/journal/{id}"))
        .send()
        .await
        .expect("Failed to delete post");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Legacy proxy
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_proxy_rejects_paths_off_the_allow_list() {
    let client = admin_client("ADMIN_TEST").await;
    let resp = client
        .get(format!("{}/api/proxy?path=/admin/secret.php", admin_url()))
        .send()
        .await
        .expect("Failed to call proxy");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
