use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use myshop_core::{ImageId, ManufacturerId, OperatingSystemId, ProductId, VariantId};
use myshop_products::{
    Image, Manufacturer, OperatingSystem, Product, RelationTargets, SmartPhoneVariant,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures, independent of the backing engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("{0}")]
    ForeignKey(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn foreign_key(msg: impl Into<String>) -> Self {
        Self::ForeignKey(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// A single write inside a [`WriteBatch`].
///
/// Product rows and their image relation are written separately: saving a
/// product never touches `images`, only `SetRelation` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    InsertProduct(Product),
    SaveProduct(Product),
    /// Removes the product together with its variants and image links.
    DeleteProduct(ProductId),
    SetRelation {
        product: ProductId,
        targets: RelationTargets,
    },
    InsertVariant(SmartPhoneVariant),
    SaveVariant(SmartPhoneVariant),
    DeleteVariant(VariantId),
    InsertManufacturer(Manufacturer),
    InsertOperatingSystem(OperatingSystem),
    InsertImage(Image),
}

impl WriteOp {
    pub fn kind(&self) -> &'static str {
        match self {
            WriteOp::InsertProduct(_) => "insert_product",
            WriteOp::SaveProduct(_) => "save_product",
            WriteOp::DeleteProduct(_) => "delete_product",
            WriteOp::SetRelation { .. } => "set_relation",
            WriteOp::InsertVariant(_) => "insert_variant",
            WriteOp::SaveVariant(_) => "save_variant",
            WriteOp::DeleteVariant(_) => "delete_variant",
            WriteOp::InsertManufacturer(_) => "insert_manufacturer",
            WriteOp::InsertOperatingSystem(_) => "insert_operating_system",
            WriteOp::InsertImage(_) => "insert_image",
        }
    }
}

/// Ordered writes committed as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Storage abstraction for the catalog.
///
/// Products are returned with their `images` relation loaded.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// All products, ordered by `order` then `product_name`.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Variants owned by `product`, in insertion order.
    async fn variants_of(&self, product: ProductId) -> StoreResult<Vec<SmartPhoneVariant>>;

    async fn slug_taken(&self, slug: &str, exclude: Option<ProductId>) -> StoreResult<bool>;

    /// Whether a smart card other than `exclude` already uses `code`.
    async fn card_code_taken(&self, code: &str, exclude: Option<ProductId>) -> StoreResult<bool>;

    async fn manufacturer(&self, id: ManufacturerId) -> StoreResult<Option<Manufacturer>>;
    async fn manufacturers(&self) -> StoreResult<Vec<Manufacturer>>;

    async fn operating_system(&self, id: OperatingSystemId) -> StoreResult<Option<OperatingSystem>>;
    async fn operating_systems(&self) -> StoreResult<Vec<OperatingSystem>>;

    async fn image(&self, id: ImageId) -> StoreResult<Option<Image>>;
    async fn images(&self) -> StoreResult<Vec<Image>>;

    /// Apply every op in order, or none of them.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).get_product(id).await
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        (**self).list_products().await
    }

    async fn variants_of(&self, product: ProductId) -> StoreResult<Vec<SmartPhoneVariant>> {
        (**self).variants_of(product).await
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<ProductId>) -> StoreResult<bool> {
        (**self).slug_taken(slug, exclude).await
    }

    async fn card_code_taken(&self, code: &str, exclude: Option<ProductId>) -> StoreResult<bool> {
        (**self).card_code_taken(code, exclude).await
    }

    async fn manufacturer(&self, id: ManufacturerId) -> StoreResult<Option<Manufacturer>> {
        (**self).manufacturer(id).await
    }

    async fn manufacturers(&self) -> StoreResult<Vec<Manufacturer>> {
        (**self).manufacturers().await
    }

    async fn operating_system(&self, id: OperatingSystemId) -> StoreResult<Option<OperatingSystem>> {
        (**self).operating_system(id).await
    }

    async fn operating_systems(&self) -> StoreResult<Vec<OperatingSystem>> {
        (**self).operating_systems().await
    }

    async fn image(&self, id: ImageId) -> StoreResult<Option<Image>> {
        (**self).image(id).await
    }

    async fn images(&self) -> StoreResult<Vec<Image>> {
        (**self).images().await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        (**self).commit(batch).await
    }
}
