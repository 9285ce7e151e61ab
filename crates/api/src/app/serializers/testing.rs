//! Shared fixtures for serializer tests.

use serde_json::{Value, json};

use myshop_core::{ImageId, ManufacturerId, OperatingSystemId};
use myshop_infra::{InMemoryProductStore, ProductStore, WriteBatch, WriteOp};
use myshop_products::{Image, Manufacturer, OperatingSystem};

pub struct Fixture {
    store: InMemoryProductStore,
    pub manufacturer: ManufacturerId,
    pub os: OperatingSystemId,
    pub image: ImageId,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = InMemoryProductStore::new();
        let manufacturer = Manufacturer::new("Samsung");
        let os = OperatingSystem::new("Android");
        let image = Image::new("/media/test.jpg", "test");
        let ids = (manufacturer.id, os.id, image.id);
        store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertManufacturer(manufacturer),
                WriteOp::InsertOperatingSystem(os),
                WriteOp::InsertImage(image),
            ]))
            .await
            .unwrap();
        Self {
            store,
            manufacturer: ids.0,
            os: ids.1,
            image: ids.2,
        }
    }

    pub fn store(&self) -> &dyn ProductStore {
        &self.store
    }
}

pub fn card_payload(f: &Fixture, slug: &str, code: &str) -> Value {
    json!({
        "product_name": format!("Card {slug}"),
        "slug": slug,
        "manufacturer": f.manufacturer.to_string(),
        "unit_price": "12.99",
        "card_type": "SDXC",
        "speed": 95,
        "product_code": code,
        "storage": 64,
    })
}

pub fn phone_payload(f: &Fixture, slug: &str, variants: Vec<Value>) -> Value {
    json!({
        "product_name": format!("Phone {slug}"),
        "slug": slug,
        "manufacturer": f.manufacturer.to_string(),
        "battery_type": "li-ion",
        "battery_capacity": 3000,
        "ram_storage": 4096,
        "wifi_connectivity": "802.11 a/b/g/n/ac",
        "bluetooth": "bt-4.0",
        "operating_system": f.os.to_string(),
        "width": 70.5,
        "height": 147.7,
        "weight": 163,
        "screen_size": 5.8,
        "variants": variants,
    })
}

pub fn variant_item(code: &str, storage: u32) -> Value {
    json!({
        "product_code": code,
        "unit_price": 599.9,
        "storage": storage,
    })
}
