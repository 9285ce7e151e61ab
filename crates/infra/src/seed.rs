//! Default reference data for dev setups.

use myshop_products::{Image, Manufacturer, OperatingSystem};

use crate::catalog::{ProductStore, StoreResult, WriteBatch, WriteOp};

const MANUFACTURERS: &[&str] = &["Apple", "Kingston", "Samsung", "SanDisk", "Transcend"];
const OPERATING_SYSTEMS: &[&str] = &["Android", "iOS"];
const IMAGES: &[(&str, &str)] = &[
    ("/media/products/sd-card.jpg", "SD card"),
    ("/media/products/smartphone-front.jpg", "Smartphone front"),
    ("/media/products/smartphone-back.jpg", "Smartphone back"),
];

/// What [`seed_reference_data`] inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub manufacturers: usize,
    pub operating_systems: usize,
    pub images: usize,
}

/// Insert the default manufacturers, operating systems and images.
///
/// Skips everything when the store already holds manufacturers, so it can
/// run on every start.
pub async fn seed_reference_data<S>(store: &S) -> StoreResult<SeedReport>
where
    S: ProductStore + ?Sized,
{
    if !store.manufacturers().await?.is_empty() {
        tracing::debug!("reference data present; skipping seed");
        return Ok(SeedReport::default());
    }

    let mut batch = WriteBatch::new();
    for name in MANUFACTURERS {
        batch.push(WriteOp::InsertManufacturer(Manufacturer::new(*name)));
    }
    for name in OPERATING_SYSTEMS {
        batch.push(WriteOp::InsertOperatingSystem(OperatingSystem::new(*name)));
    }
    for (url, caption) in IMAGES {
        batch.push(WriteOp::InsertImage(Image::new(*url, *caption)));
    }
    store.commit(batch).await?;

    let report = SeedReport {
        manufacturers: MANUFACTURERS.len(),
        operating_systems: OPERATING_SYSTEMS.len(),
        images: IMAGES.len(),
    };
    tracing::info!(
        manufacturers = report.manufacturers,
        operating_systems = report.operating_systems,
        images = report.images,
        "seeded reference data"
    );
    Ok(report)
}
