//! Dashboard view-sets and their router.
//!
//! A view-set declares how a resource shows up in the admin UI: list columns,
//! which columns link to the detail page, the list serializer, and one detail
//! serializer per product type. The router binds view-sets to URL prefixes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use myshop_core::{DomainError, Entity, ProductId};
use myshop_infra::{ProductStore, WriteBatch, WriteOp};
use myshop_products::Product;

use crate::app::errors::{ApiError, ApiResult};
use crate::app::serializers::{
    DetailSerializer, FormDescriptor, ProductSummarySerializer, SerializerContext,
    SmartCardSerializer, SmartPhoneSerializer,
};

mod handlers;
mod router;

pub use router::DashboardRouter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub link: bool,
}

pub struct DashboardViewSet {
    pub list_display: Vec<&'static str>,
    pub list_display_links: Vec<&'static str>,
    pub list_serializer: ProductSummarySerializer,
    /// Keyed by product type identifier, e.g. `myshop.smartcard`.
    pub detail_serializers: BTreeMap<&'static str, Arc<dyn DetailSerializer>>,
}

impl DashboardViewSet {
    pub fn columns(&self) -> Vec<Column> {
        self.list_display
            .iter()
            .map(|&name| Column {
                name,
                link: self.list_display_links.contains(&name),
            })
            .collect()
    }

    pub fn detail_serializer(&self, product_type: &str) -> ApiResult<Arc<dyn DetailSerializer>> {
        self.detail_serializers
            .get(product_type)
            .cloned()
            .ok_or_else(|| ApiError::UnknownProductType(product_type.to_string()))
    }

    pub fn form(&self, product_type: &str) -> ApiResult<FormDescriptor> {
        Ok(self.detail_serializer(product_type)?.form())
    }

    pub async fn list(&self, store: &dyn ProductStore) -> ApiResult<Value> {
        let products = store.list_products().await?;
        let mut items = Vec::with_capacity(products.len());
        for product in &products {
            items.push(self.list_serializer.to_representation(store, product).await?);
        }
        Ok(json!({
            "columns": self.columns(),
            "items": items,
        }))
    }

    pub async fn retrieve(&self, store: &dyn ProductStore, id: ProductId) -> ApiResult<Value> {
        let product = load(store, id).await?;
        let serializer = self.detail_serializer(product.product_type().identifier())?;
        serializer.to_representation(store, &product).await
    }

    pub async fn create(
        &self,
        store: &dyn ProductStore,
        product_type: &str,
        data: &Value,
    ) -> ApiResult<Value> {
        let serializer = self.detail_serializer(product_type)?;
        let ctx = SerializerContext::create(store);
        let changes = serializer
            .validate(&ctx, data)
            .await
            .inspect_err(log_rejection)?;
        let product = serializer.create(store, changes).await?;
        tracing::info!(
            product_id = %product.id,
            product_type = product_type,
            "product created"
        );
        serializer.to_representation(store, &product).await
    }

    pub async fn update(
        &self,
        store: &dyn ProductStore,
        id: ProductId,
        data: &Value,
        partial: bool,
    ) -> ApiResult<Value> {
        let instance = load(store, id).await?;
        let product_type = instance.product_type().identifier();
        let serializer = self.detail_serializer(product_type)?;

        let changes = {
            let ctx = SerializerContext::update(store, &instance, partial);
            serializer
                .validate(&ctx, data)
                .await
                .inspect_err(log_rejection)?
        };
        let product = serializer.update(store, instance, changes).await?;
        tracing::info!(
            product_id = %product.id,
            product_type = product_type,
            partial,
            "product updated"
        );
        serializer.to_representation(store, &product).await
    }

    pub async fn destroy(&self, store: &dyn ProductStore, id: ProductId) -> ApiResult<()> {
        let product = load(store, id).await?;
        store
            .commit(WriteBatch::from_iter([WriteOp::DeleteProduct(product.id)]))
            .await?;
        tracing::info!(
            product_id = %product.id,
            product_type = product.product_type().identifier(),
            "product deleted"
        );
        Ok(())
    }
}

async fn load(store: &dyn ProductStore, id: ProductId) -> ApiResult<Product> {
    store.get_product(id).await?.ok_or_else(|| {
        tracing::debug!(product_id = %id, "{} not found", Product::verbose_name());
        ApiError::Domain(DomainError::NotFound)
    })
}

fn log_rejection(err: &ApiError) {
    if let Some(errors) = err.validation_errors() {
        tracing::debug!(errors = %errors, "product payload rejected");
    }
}

/// The products dashboard.
pub struct ProductsDashboard;

impl ProductsDashboard {
    pub const LIST_DISPLAY: [&'static str; 4] = ["media", "product_name", "caption", "price"];
    pub const LIST_DISPLAY_LINKS: [&'static str; 1] = ["product_name"];

    pub fn view_set(list_serializer: ProductSummarySerializer) -> DashboardViewSet {
        let mut detail_serializers: BTreeMap<&'static str, Arc<dyn DetailSerializer>> =
            BTreeMap::new();
        detail_serializers.insert("myshop.smartcard", Arc::new(SmartCardSerializer));
        detail_serializers.insert("myshop.smartphonemodel", Arc::new(SmartPhoneSerializer::default()));

        DashboardViewSet {
            list_display: Self::LIST_DISPLAY.to_vec(),
            list_display_links: Self::LIST_DISPLAY_LINKS.to_vec(),
            list_serializer,
            detail_serializers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myshop_infra::InMemoryProductStore;
    use myshop_products::{Currency, ProductType};

    fn view_set() -> DashboardViewSet {
        ProductsDashboard::view_set(ProductSummarySerializer::new(Currency::Eur, "/shop"))
    }

    #[test]
    fn declares_columns_and_links() {
        let columns = view_set().columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
        assert_eq!(names, ["media", "product_name", "caption", "price"]);
        let links: Vec<&str> = columns.iter().filter(|c| c.link).map(|c| c.name).collect();
        assert_eq!(links, ["product_name"]);
    }

    #[test]
    fn maps_every_product_type_to_its_serializer() {
        let view_set = view_set();
        for product_type in ProductType::ALL {
            let serializer = view_set.detail_serializer(product_type.identifier()).unwrap();
            assert_eq!(serializer.product_type(), *product_type);
        }
        assert!(matches!(
            view_set.detail_serializer("myshop.commodity"),
            Err(ApiError::UnknownProductType(_))
        ));
    }

    #[tokio::test]
    async fn missing_products_are_not_found() {
        let store = InMemoryProductStore::new();
        let err = view_set().retrieve(&store, ProductId::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Domain(DomainError::NotFound)));
        let err = view_set().destroy(&store, ProductId::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Domain(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn empty_list_still_reports_columns() {
        let store = InMemoryProductStore::new();
        let list = view_set().list(&store).await.unwrap();
        assert_eq!(list["columns"].as_array().unwrap().len(), 4);
        assert_eq!(list["items"], json!([]));
    }
}
