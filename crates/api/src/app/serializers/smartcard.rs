use async_trait::async_trait;
use serde_json::{Value, json};

use myshop_core::DomainError;
use myshop_infra::ProductStore;
use myshop_products::{
    CardType, FieldValue, Product, ProductChange, ProductKind, ProductType, Speed, decimal,
};

use super::fields::{self, CharField};
use super::product::{base_fields, base_representation, check_base_references, parse_base_field};
use super::{DetailSerializer, FieldKind, FieldSpec, SerializerContext, message, object, parse_payload};
use crate::app::errors::{ApiError, ApiResult};

/// Smart cards: every field read/write, prices rendered as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartCardSerializer;

#[async_trait]
impl DetailSerializer for SmartCardSerializer {
    fn product_type(&self) -> ProductType {
        ProductType::SmartCard
    }

    fn form_name(&self) -> String {
        "smartcard_form".to_string()
    }

    fn scope_prefix(&self) -> String {
        "smartcard".to_string()
    }

    fn fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.extend([
            FieldSpec::new("unit_price", FieldKind::Decimal)
                .required()
                .coerce_to_string(true),
            FieldSpec::new("card_type", FieldKind::Choice)
                .required()
                .choices(CardType::choices()),
            FieldSpec::new("speed", FieldKind::Choice)
                .required()
                .choices(Speed::choices()),
            FieldSpec::new("product_code", FieldKind::Char).required(),
            FieldSpec::new("storage", FieldKind::Integer).required(),
        ]);
        fields
    }

    async fn validate(
        &self,
        ctx: &SerializerContext<'_>,
        data: &Value,
    ) -> ApiResult<Vec<ProductChange>> {
        let changes = parse_payload(data, &self.fields(), ctx.partial, |spec, raw| {
            if let Some(parsed) = parse_base_field(spec.name, raw) {
                return parsed;
            }
            let value = match spec.name {
                "unit_price" => fields::parse_decimal(raw, decimal::MONEY).map(FieldValue::UnitPrice),
                "card_type" => fields::parse_choice(raw).map(FieldValue::CardType),
                "speed" => fields::parse_choice(raw).map(FieldValue::Speed),
                "product_code" => CharField::required(255).parse(raw).map(FieldValue::ProductCode),
                "storage" => fields::parse_u32(raw).map(FieldValue::Storage),
                other => Err(format!("unexpected field {other}")),
            };
            value.map(ProductChange::Assign).map_err(message)
        })?;

        let mut errors = myshop_core::ValidationErrors::new();
        check_base_references(ctx, &changes, &mut errors).await?;
        for change in &changes {
            if let ProductChange::Assign(FieldValue::ProductCode(code)) = change {
                if ctx.store.card_code_taken(code, ctx.instance_id()).await? {
                    errors.add("product_code", "smart card with this product code already exists.");
                }
            }
        }
        errors.into_result(changes).map_err(ApiError::from)
    }

    async fn to_representation(&self, _store: &dyn ProductStore, product: &Product) -> ApiResult<Value> {
        let ProductKind::SmartCard(card) = &product.kind else {
            return Err(DomainError::invariant(format!(
                "{} is not a smart card",
                product.id
            ))
            .into());
        };

        let mut entries = base_representation(product);
        entries.extend([
            ("unit_price", fields::render_decimal(card.unit_price, decimal::MONEY, true)),
            ("card_type", json!(card.card_type)),
            ("speed", json!(card.speed)),
            ("product_code", json!(card.product_code)),
            ("storage", json!(card.storage)),
        ]);
        Ok(object(entries))
    }
}
