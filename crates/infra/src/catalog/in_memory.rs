use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use myshop_core::{Entity, ImageId, ManufacturerId, OperatingSystemId, ProductId};
use myshop_products::{
    Image, Manufacturer, OperatingSystem, Product, ProductKind, RelationTargets,
    SmartPhoneVariant,
};

use super::store::{ProductStore, StoreError, StoreResult, WriteBatch, WriteOp};

#[derive(Debug, Clone, Default)]
struct Tables {
    /// Rows are kept with an empty `images`; the relation lives in `product_images`.
    products: HashMap<ProductId, Product>,
    product_images: HashMap<ProductId, Vec<ImageId>>,
    variants: Vec<SmartPhoneVariant>,
    manufacturers: Vec<Manufacturer>,
    operating_systems: Vec<OperatingSystem>,
    images: Vec<Image>,
}

impl Tables {
    fn load(&self, id: &ProductId) -> Option<Product> {
        let mut product = self.products.get(id)?.clone();
        product.images = self.product_images.get(id).cloned().unwrap_or_default();
        Some(product)
    }

    fn apply(&mut self, op: WriteOp) -> StoreResult<()> {
        match op {
            WriteOp::InsertProduct(mut product) => {
                if self.products.contains_key(&product.id) {
                    return Err(StoreError::conflict("product with this id already exists."));
                }
                product.images.clear();
                self.product_images.insert(product.id, Vec::new());
                self.products.insert(product.id, product);
            }
            WriteOp::SaveProduct(mut product) => {
                let Some(row) = self.products.get_mut(&product.id) else {
                    return Err(missing::<Product>(&product.id));
                };
                product.images.clear();
                *row = product;
            }
            WriteOp::DeleteProduct(id) => {
                if self.products.remove(&id).is_none() {
                    return Err(missing::<Product>(&id));
                }
                self.product_images.remove(&id);
                self.variants.retain(|v| v.product != id);
            }
            WriteOp::SetRelation { product, targets } => {
                if !self.products.contains_key(&product) {
                    return Err(missing::<Product>(&product));
                }
                match targets {
                    RelationTargets::Images(ids) => {
                        if let Some(id) = ids.iter().find(|id| !self.images.iter().any(|i| &i.id == *id)) {
                            return Err(StoreError::foreign_key(format!(
                                "Invalid pk \"{id}\" - object does not exist."
                            )));
                        }
                        self.product_images.insert(product, ids);
                    }
                }
            }
            WriteOp::InsertVariant(variant) => {
                if self.variants.iter().any(|v| v.id == variant.id) {
                    return Err(StoreError::conflict(
                        "smart phone variant with this id already exists.",
                    ));
                }
                self.variants.push(variant);
            }
            WriteOp::SaveVariant(variant) => {
                let Some(row) = self.variants.iter_mut().find(|v| v.id == variant.id) else {
                    return Err(missing::<SmartPhoneVariant>(&variant.id));
                };
                *row = variant;
            }
            WriteOp::DeleteVariant(id) => {
                let before = self.variants.len();
                self.variants.retain(|v| v.id != id);
                if self.variants.len() == before {
                    return Err(missing::<SmartPhoneVariant>(&id));
                }
            }
            WriteOp::InsertManufacturer(row) => {
                insert_unique(&mut self.manufacturers, row, |a, b| a.id == b.id, "manufacturer")?
            }
            WriteOp::InsertOperatingSystem(row) => insert_unique(
                &mut self.operating_systems,
                row,
                |a, b| a.id == b.id,
                "operating system",
            )?,
            WriteOp::InsertImage(row) => {
                insert_unique(&mut self.images, row, |a, b| a.id == b.id, "image")?
            }
        }
        Ok(())
    }

    /// Table-wide constraints, checked once every op of a batch is applied.
    fn check(&self) -> StoreResult<()> {
        let mut slugs = HashSet::new();
        let mut card_codes = HashSet::new();
        for product in self.products.values() {
            if !slugs.insert(product.slug.as_str()) {
                return Err(StoreError::conflict("product with this slug already exists."));
            }
            if !self.manufacturers.iter().any(|m| m.id == product.manufacturer) {
                return Err(StoreError::foreign_key(format!(
                    "manufacturer {} does not exist",
                    product.manufacturer
                )));
            }
            match &product.kind {
                ProductKind::SmartCard(card) => {
                    if !card_codes.insert(card.product_code.as_str()) {
                        return Err(StoreError::conflict(
                            "smart card with this product code already exists.",
                        ));
                    }
                }
                ProductKind::SmartPhoneModel(phone) => {
                    if !self.operating_systems.iter().any(|os| os.id == phone.operating_system) {
                        return Err(StoreError::foreign_key(format!(
                            "operating system {} does not exist",
                            phone.operating_system
                        )));
                    }
                }
            }
        }

        let mut variant_codes = HashSet::new();
        for variant in &self.variants {
            if !variant_codes.insert(variant.product_code.as_str()) {
                return Err(StoreError::conflict(
                    "smart phone variant with this product code already exists.",
                ));
            }
            match self.products.get(&variant.product).map(|p| &p.kind) {
                Some(ProductKind::SmartPhoneModel(_)) => {}
                _ => {
                    return Err(StoreError::foreign_key(format!(
                        "smart phone model {} does not exist",
                        variant.product
                    )));
                }
            }
        }
        Ok(())
    }
}

fn missing<E: Entity>(id: &impl core::fmt::Display) -> StoreError {
    StoreError::not_found(format!("{} {id}", E::verbose_name()))
}

fn insert_unique<T>(
    rows: &mut Vec<T>,
    row: T,
    same_id: impl Fn(&T, &T) -> bool,
    label: &str,
) -> StoreResult<()> {
    if rows.iter().any(|r| same_id(r, &row)) {
        return Err(StoreError::conflict(format!("{label} with this id already exists.")));
    }
    rows.push(row);
    Ok(())
}

/// In-memory catalog for tests/dev.
///
/// A commit works on a copy of the tables and swaps it in only when every op
/// and every constraint passed.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<Tables>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> StoreResult<T> {
        let tables = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("catalog lock poisoned"))?;
        Ok(f(&tables))
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        self.read(|t| t.load(&id))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.read(|t| {
            let mut products: Vec<Product> = t.products.keys().filter_map(|id| t.load(id)).collect();
            products.sort_by(|a, b| {
                (a.order, &a.product_name, a.id).cmp(&(b.order, &b.product_name, b.id))
            });
            products
        })
    }

    async fn variants_of(&self, product: ProductId) -> StoreResult<Vec<SmartPhoneVariant>> {
        self.read(|t| {
            t.variants
                .iter()
                .filter(|v| v.product == product)
                .cloned()
                .collect()
        })
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<ProductId>) -> StoreResult<bool> {
        self.read(|t| {
            t.products
                .values()
                .any(|p| p.slug == slug && Some(p.id) != exclude)
        })
    }

    async fn card_code_taken(&self, code: &str, exclude: Option<ProductId>) -> StoreResult<bool> {
        self.read(|t| {
            t.products.values().any(|p| {
                Some(p.id) != exclude
                    && matches!(&p.kind, ProductKind::SmartCard(card) if card.product_code == code)
            })
        })
    }

    async fn manufacturer(&self, id: ManufacturerId) -> StoreResult<Option<Manufacturer>> {
        self.read(|t| t.manufacturers.iter().find(|m| m.id == id).cloned())
    }

    async fn manufacturers(&self) -> StoreResult<Vec<Manufacturer>> {
        self.read(|t| sorted_by_name(&t.manufacturers, |m| &m.name))
    }

    async fn operating_system(&self, id: OperatingSystemId) -> StoreResult<Option<OperatingSystem>> {
        self.read(|t| t.operating_systems.iter().find(|os| os.id == id).cloned())
    }

    async fn operating_systems(&self) -> StoreResult<Vec<OperatingSystem>> {
        self.read(|t| sorted_by_name(&t.operating_systems, |os| &os.name))
    }

    async fn image(&self, id: ImageId) -> StoreResult<Option<Image>> {
        self.read(|t| t.images.iter().find(|i| i.id == id).cloned())
    }

    async fn images(&self) -> StoreResult<Vec<Image>> {
        self.read(|t| t.images.clone())
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut tables = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("catalog lock poisoned"))?;

        let op_count = batch.len();
        let mut staged = tables.clone();
        for op in batch.into_ops() {
            let kind = op.kind();
            staged.apply(op).inspect_err(|err| {
                tracing::debug!(op = kind, error = %err, "write batch rejected");
            })?;
        }
        staged.check().inspect_err(|err| {
            tracing::debug!(error = %err, "write batch violates a constraint");
        })?;

        *tables = staged;
        tracing::debug!(ops = op_count, "write batch committed");
        Ok(())
    }
}

fn sorted_by_name<T: Clone>(rows: &[T], name: impl Fn(&T) -> &String) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| name(a).cmp(name(b)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use myshop_core::VariantId;
    use myshop_products::{Decimal, ProductType, VariantFields};

    struct Fixture {
        store: InMemoryProductStore,
        manufacturer: ManufacturerId,
        os: OperatingSystemId,
        image: ImageId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryProductStore::new();
        let manufacturer = Manufacturer::new("Samsung");
        let os = OperatingSystem::new("Android");
        let image = Image::new("/media/phone.jpg", "front");
        let ids = (manufacturer.id, os.id, image.id);
        store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertManufacturer(manufacturer),
                WriteOp::InsertOperatingSystem(os),
                WriteOp::InsertImage(image),
            ]))
            .await
            .unwrap();
        Fixture {
            store,
            manufacturer: ids.0,
            os: ids.1,
            image: ids.2,
        }
    }

    fn phone(f: &Fixture, slug: &str) -> Product {
        let mut product = Product::blank(ProductType::SmartPhoneModel, Utc::now());
        product.product_name = format!("Phone {slug}");
        product.slug = slug.to_string();
        product.manufacturer = f.manufacturer;
        if let ProductKind::SmartPhoneModel(attrs) = &mut product.kind {
            attrs.operating_system = f.os;
        }
        product
    }

    fn card(f: &Fixture, slug: &str, code: &str) -> Product {
        let mut product = Product::blank(ProductType::SmartCard, Utc::now());
        product.product_name = format!("Card {slug}");
        product.slug = slug.to_string();
        product.manufacturer = f.manufacturer;
        if let ProductKind::SmartCard(attrs) = &mut product.kind {
            attrs.product_code = code.to_string();
        }
        product
    }

    fn variant(parent: ProductId, code: &str) -> SmartPhoneVariant {
        SmartPhoneVariant::create(
            parent,
            VariantFields {
                id: None,
                product_code: code.to_string(),
                unit_price: Decimal::new(49900, 2),
                storage: 64,
            },
        )
    }

    #[tokio::test]
    async fn commit_persists_parent_and_variants() {
        let f = fixture().await;
        let parent = phone(&f, "galaxy");
        let id = parent.id;
        f.store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertProduct(parent),
                WriteOp::InsertVariant(variant(id, "G-32")),
                WriteOp::InsertVariant(variant(id, "G-64")),
            ]))
            .await
            .unwrap();

        assert!(f.store.get_product(id).await.unwrap().is_some());
        let variants = f.store.variants_of(id).await.unwrap();
        assert_eq!(variants.len(), 2);
        assert!(variants.iter().all(|v| v.product == id));
        assert_eq!(variants[0].product_code, "G-32");
    }

    #[tokio::test]
    async fn failing_batch_leaves_tables_untouched() {
        let f = fixture().await;
        let parent = phone(&f, "galaxy");
        let id = parent.id;
        let err = f
            .store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertProduct(parent),
                WriteOp::InsertVariant(variant(id, "DUP")),
                WriteOp::InsertVariant(variant(id, "DUP")),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(f.store.get_product(id).await.unwrap().is_none());
        assert!(f.store.variants_of(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let f = fixture().await;
        f.store
            .commit(WriteBatch::from_iter([WriteOp::InsertProduct(phone(&f, "same"))]))
            .await
            .unwrap();
        let err = f
            .store
            .commit(WriteBatch::from_iter([WriteOp::InsertProduct(card(&f, "same", "C1"))]))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::conflict("product with this slug already exists."));
    }

    #[tokio::test]
    async fn variant_must_point_at_a_smartphone() {
        let f = fixture().await;
        let sd = card(&f, "sd", "C1");
        let id = sd.id;
        let err = f
            .store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertProduct(sd),
                WriteOp::InsertVariant(variant(id, "V1")),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));
    }

    #[tokio::test]
    async fn save_does_not_touch_images() {
        let f = fixture().await;
        let mut product = phone(&f, "galaxy");
        let id = product.id;
        f.store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertProduct(product.clone()),
                WriteOp::SetRelation {
                    product: id,
                    targets: RelationTargets::Images(vec![f.image]),
                },
            ]))
            .await
            .unwrap();

        product.caption = "new caption".to_string();
        product.images.clear();
        f.store
            .commit(WriteBatch::from_iter([WriteOp::SaveProduct(product)]))
            .await
            .unwrap();

        let stored = f.store.get_product(id).await.unwrap().unwrap();
        assert_eq!(stored.caption, "new caption");
        assert_eq!(stored.images, vec![f.image]);
    }

    #[tokio::test]
    async fn unknown_image_is_rejected() {
        let f = fixture().await;
        let product = phone(&f, "galaxy");
        let id = product.id;
        let err = f
            .store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertProduct(product),
                WriteOp::SetRelation {
                    product: id,
                    targets: RelationTargets::Images(vec![ImageId::new()]),
                },
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));
    }

    #[tokio::test]
    async fn delete_cascades_to_variants() {
        let f = fixture().await;
        let parent = phone(&f, "galaxy");
        let id = parent.id;
        f.store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertProduct(parent),
                WriteOp::InsertVariant(variant(id, "G-32")),
            ]))
            .await
            .unwrap();
        f.store
            .commit(WriteBatch::from_iter([WriteOp::DeleteProduct(id)]))
            .await
            .unwrap();

        assert!(f.store.get_product(id).await.unwrap().is_none());
        assert!(f.store.variants_of(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let f = fixture().await;
        let err = f
            .store
            .commit(WriteBatch::from_iter([WriteOp::DeleteVariant(VariantId::new())]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(msg) if msg.starts_with("smart phone variant")));
    }

    #[tokio::test]
    async fn lookups_honour_exclusions_and_ordering() {
        let f = fixture().await;
        let mut first = card(&f, "b-card", "C1");
        first.order = 1;
        let mut second = card(&f, "a-card", "C2");
        second.order = 1;
        let mut third = phone(&f, "z-phone");
        third.order = 0;
        let first_id = first.id;
        f.store
            .commit(WriteBatch::from_iter([
                WriteOp::InsertProduct(first),
                WriteOp::InsertProduct(second),
                WriteOp::InsertProduct(third),
            ]))
            .await
            .unwrap();

        assert!(f.store.card_code_taken("C1", None).await.unwrap());
        assert!(!f.store.card_code_taken("C1", Some(first_id)).await.unwrap());
        assert!(f.store.slug_taken("a-card", None).await.unwrap());

        let slugs: Vec<String> = f
            .store
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, vec!["z-phone", "a-card", "b-card"]);
    }
}
