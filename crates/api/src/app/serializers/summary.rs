use serde_json::{Value, json};

use myshop_infra::ProductStore;
use myshop_products::{Currency, Product};

use crate::app::errors::ApiResult;

/// One row of the dashboard product list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummarySerializer {
    currency: Currency,
    product_url_prefix: String,
}

impl ProductSummarySerializer {
    pub fn new(currency: Currency, product_url_prefix: impl Into<String>) -> Self {
        Self {
            currency,
            product_url_prefix: product_url_prefix.into(),
        }
    }

    pub fn product_url(&self, product: &Product) -> String {
        format!("{}/{}", self.product_url_prefix, product.slug)
    }

    pub async fn to_representation(
        &self,
        store: &dyn ProductStore,
        product: &Product,
    ) -> ApiResult<Value> {
        let variants = store.variants_of(product.id).await?;
        let price = product
            .display_price(&variants)
            .map(|amount| self.currency.format(amount));

        let media = match product.images.first() {
            Some(id) => store.image(*id).await?.map(|image| image.url),
            None => None,
        };

        let product_type = product.product_type();
        Ok(json!({
            "id": product.id,
            "product_name": product.product_name,
            "product_url": self.product_url(product),
            "product_type": product_type.identifier(),
            "product_model": product_type.model_name(),
            "price": price,
            "media": media,
            "caption": product.caption,
            "active": product.active,
            "detail_url": format!("/dashboard/products/{}", product.id),
        }))
    }
}
