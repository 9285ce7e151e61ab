//! Fields shared by every product type.

use serde_json::{Value, json};

use myshop_core::{ErrorDetail, ImageId, ManufacturerId, ValidationErrors};
use myshop_infra::StoreResult;
use myshop_products::{FieldValue, Product, ProductChange, RelationTargets};

use super::fields::{self, CharField};
use super::{FieldKind, FieldSpec, SerializerContext, message};

pub fn base_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("id", FieldKind::Uuid).read_only(),
        FieldSpec::new("product_name", FieldKind::Char).required(),
        FieldSpec::new("slug", FieldKind::Slug).required(),
        FieldSpec::new("caption", FieldKind::Text),
        FieldSpec::new("description", FieldKind::Text),
        FieldSpec::new("manufacturer", FieldKind::PrimaryKey).required(),
        FieldSpec::new("order", FieldKind::Integer),
        FieldSpec::new("active", FieldKind::Boolean),
        FieldSpec::new("images", FieldKind::ManyPrimaryKey),
        FieldSpec::new("created_at", FieldKind::DateTime).read_only(),
        FieldSpec::new("updated_at", FieldKind::DateTime).read_only(),
    ]
}

/// Parse one of the shared fields; `None` when `name` is not one of them.
pub fn parse_base_field(name: &str, raw: &Value) -> Option<Result<ProductChange, ErrorDetail>> {
    let value = match name {
        "product_name" => CharField::required(255).parse(raw).map(FieldValue::ProductName),
        "slug" => fields::parse_slug(raw).map(FieldValue::Slug),
        "caption" => CharField::text().parse(raw).map(FieldValue::Caption),
        "description" => CharField::text().parse(raw).map(FieldValue::Description),
        "manufacturer" => fields::parse_pk::<ManufacturerId>(raw).map(FieldValue::Manufacturer),
        "order" => fields::parse_u32(raw).map(FieldValue::Order),
        "active" => fields::parse_bool(raw).map(FieldValue::Active),
        "images" => {
            return Some(
                fields::parse_pk_list::<ImageId>(raw)
                    .map(|ids| ProductChange::SetRelation(RelationTargets::images(ids)))
                    .map_err(message),
            );
        }
        _ => return None,
    };
    Some(value.map(ProductChange::Assign).map_err(message))
}

/// Checks on shared fields that need the store: slug uniqueness and
/// existence of the referenced manufacturer and images.
pub async fn check_base_references(
    ctx: &SerializerContext<'_>,
    changes: &[ProductChange],
    errors: &mut ValidationErrors,
) -> StoreResult<()> {
    for change in changes {
        match change {
            ProductChange::Assign(FieldValue::Slug(slug)) => {
                if ctx.store.slug_taken(slug, ctx.instance_id()).await? {
                    errors.add("slug", "product with this slug already exists.");
                }
            }
            ProductChange::Assign(FieldValue::Manufacturer(id)) => {
                if ctx.store.manufacturer(*id).await?.is_none() {
                    errors.add("manufacturer", fields::does_not_exist(id));
                }
            }
            ProductChange::SetRelation(RelationTargets::Images(ids)) => {
                for id in ids {
                    if ctx.store.image(*id).await?.is_none() {
                        errors.add("images", fields::does_not_exist(id));
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

pub fn base_representation(product: &Product) -> Vec<(&'static str, Value)> {
    let product_type = product.product_type();
    vec![
        ("id", json!(product.id)),
        ("product_type", json!(product_type.identifier())),
        ("product_model", json!(product_type.model_name())),
        ("product_name", json!(product.product_name)),
        ("slug", json!(product.slug)),
        ("caption", json!(product.caption)),
        ("description", json!(product.description)),
        ("manufacturer", json!(product.manufacturer)),
        ("order", json!(product.order)),
        ("active", json!(product.active)),
        ("images", json!(product.images)),
        ("created_at", json!(product.created_at)),
        ("updated_at", json!(product.updated_at)),
    ]
}
