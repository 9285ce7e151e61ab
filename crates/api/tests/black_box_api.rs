use std::sync::Arc;

use myshop_api::app::{build_app_with_services, services::AppServices};
use myshop_api::config::AppConfig;
use myshop_infra::{InMemoryProductStore, seed::seed_reference_data};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a seeded in-memory store, on an ephemeral port.
        let store = Arc::new(InMemoryProductStore::new());
        seed_reference_data(store.as_ref()).await.unwrap();
        let services = Arc::new(AppServices::new(store, &AppConfig::default()));
        let app = build_app_with_services(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn first_id(&self, path: &str) -> String {
        let (status, body) = self.get_json(path).await;
        assert_eq!(status, StatusCode::OK);
        body[0]["id"].as_str().unwrap().to_string()
    }

    async fn phone_payload(&self, slug: &str, variants: Vec<Value>) -> Value {
        json!({
            "product_name": format!("Phone {slug}"),
            "slug": slug,
            "manufacturer": self.first_id("/dashboard/manufacturers").await,
            "battery_type": "li-ion",
            "battery_capacity": 3000,
            "ram_storage": 4096,
            "wifi_connectivity": "802.11 a/b/g/n/ac",
            "bluetooth": "bt-4.0",
            "operating_system": self.first_id("/dashboard/operating-systems").await,
            "width": 70.5,
            "height": 147.7,
            "weight": 163,
            "screen_size": 5.8,
            "variants": variants,
        })
    }

    async fn create_phone(&self, slug: &str, variants: Vec<Value>) -> Value {
        let payload = self.phone_payload(slug, variants).await;
        let (status, body) = self
            .send_json(
                reqwest::Method::POST,
                "/dashboard/products?product_type=myshop.smartphonemodel",
                &payload,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn variant(code: &str, storage: u32) -> Value {
    json!({ "product_code": code, "unit_price": 599.9, "storage": storage })
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn reference_lists_are_seeded() {
    let server = TestServer::spawn().await;

    let (status, manufacturers) = server.get_json("/dashboard/manufacturers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manufacturers.as_array().unwrap().len(), 5);

    let (_, systems) = server.get_json("/dashboard/operating-systems").await;
    assert_eq!(systems.as_array().unwrap().len(), 2);

    let (_, images) = server.get_json("/dashboard/images").await;
    assert!(images[0]["url"].as_str().unwrap().starts_with("/media/"));
}

#[tokio::test]
async fn creating_a_phone_persists_model_and_every_variant() {
    let server = TestServer::spawn().await;
    let created = server
        .create_phone(
            "galaxy-s9",
            vec![variant("GS9-64", 64), variant("GS9-128", 128), variant("GS9-256", 256)],
        )
        .await;

    let id = created["id"].as_str().unwrap();
    let variants = created["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 3);
    assert!(variants.iter().all(|v| v["product"] == id));

    let (status, detail) = server.get_json(&format!("/dashboard/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["product_type"], "myshop.smartphonemodel");
    assert_eq!(detail["variants"].as_array().unwrap().len(), 3);
    assert_eq!(detail["variants"][1]["product_code"], "GS9-128");
}

#[tokio::test]
async fn numeric_fields_render_as_json_numbers() {
    let server = TestServer::spawn().await;
    let created = server.create_phone("pixel", vec![variant("PX-64", 64)]).await;

    for field in ["width", "height", "weight", "screen_size"] {
        assert!(created[field].is_number(), "{field} = {}", created[field]);
    }
    assert_eq!(created["width"].as_f64(), Some(70.5));
    assert!(created["variants"][0]["unit_price"].is_number());
}

#[tokio::test]
async fn list_exposes_configured_columns_and_summaries() {
    let server = TestServer::spawn().await;
    server
        .create_phone("iphone-x", vec![variant("IPX-64", 64), variant("IPX-256", 256)])
        .await;

    let (status, body) = server.get_json("/dashboard/products").await;
    assert_eq!(status, StatusCode::OK);

    let columns: Vec<&str> = body["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(columns, ["media", "product_name", "caption", "price"]);
    assert_eq!(body["columns"][1]["link"], true);
    assert_eq!(body["columns"][0]["link"], false);

    let item = &body["items"][0];
    assert_eq!(item["product_name"], "Phone iphone-x");
    assert_eq!(item["product_url"], "/shop/iphone-x");
    assert_eq!(item["price"], "€ 599.90");
}

#[tokio::test]
async fn product_id_mismatch_rejects_the_update_and_changes_nothing() {
    let server = TestServer::spawn().await;
    let first = server.create_phone("phone-a", vec![variant("A-64", 64)]).await;
    let other = server.create_phone("phone-b", vec![variant("B-64", 64)]).await;
    let id = first["id"].as_str().unwrap();

    let mut item = variant("A-128", 128);
    item["product"] = other["id"].clone();
    let (status, body) = server
        .send_json(
            reqwest::Method::PATCH,
            &format!("/dashboard/products/{id}"),
            &json!({ "product_name": "Renamed", "variants": [item] }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["fields"]["variants"][0]["product"][0], "Product ID mismatch");

    let (_, detail) = server.get_json(&format!("/dashboard/products/{id}")).await;
    assert_eq!(detail["product_name"], "Phone phone-a");
    assert_eq!(detail["variants"], first["variants"]);
}

#[tokio::test]
async fn variants_without_id_or_product_are_accepted_on_update() {
    let server = TestServer::spawn().await;
    let created = server.create_phone("nokia", vec![variant("N-32", 32)]).await;
    let id = created["id"].as_str().unwrap();
    let kept = created["variants"][0]["id"].clone();

    let mut edited = variant("N-32", 32);
    edited["id"] = kept.clone();
    edited["product"] = created["id"].clone();
    edited["unit_price"] = json!(499.5);

    let (status, body) = server
        .send_json(
            reqwest::Method::PATCH,
            &format!("/dashboard/products/{id}"),
            &json!({ "variants": [edited, variant("N-64", 64)] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let variants = body["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 2);
    let updated = variants.iter().find(|v| v["id"] == kept).unwrap();
    assert_eq!(updated["unit_price"].as_f64(), Some(499.5));
    assert!(variants.iter().all(|v| v["product"] == created["id"]));
}

#[tokio::test]
async fn smart_card_price_renders_as_quantized_string() {
    let server = TestServer::spawn().await;
    let payload = json!({
        "product_name": "Extreme Pro",
        "slug": "extreme-pro",
        "manufacturer": server.first_id("/dashboard/manufacturers").await,
        "unit_price": "12.99",
        "card_type": "SDXC",
        "speed": 95,
        "product_code": "SDX-64",
        "storage": 64,
    });
    let (status, body) = server
        .send_json(
            reqwest::Method::POST,
            "/dashboard/products?product_type=myshop.smartcard",
            &payload,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["unit_price"], "12.990");
}

#[tokio::test]
async fn delete_removes_the_product() {
    let server = TestServer::spawn().await;
    let created = server.create_phone("moto", vec![variant("M-16", 16)]).await;
    let path = format!("/dashboard/products/{}", created["id"].as_str().unwrap());

    let res = server.client.delete(server.url(&path)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let (status, _) = server.get_json(&path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn form_metadata_is_served_per_product_type() {
    let server = TestServer::spawn().await;

    let (status, form) = server.get_json("/dashboard/forms/products/smartcard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(form["form_name"], "smartcard_form");
    assert_eq!(form["scope_prefix"], "smartcard");

    let (status, _) = server
        .get_json("/dashboard/forms/products/myshop.smartphonemodel")
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_product_type_is_rejected() {
    let server = TestServer::spawn().await;
    let (status, body) = server
        .send_json(
            reqwest::Method::POST,
            "/dashboard/products?product_type=myshop.tablet",
            &json!({ "product_name": "Tab" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
