use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use myshop_core::{DomainError, OperatingSystemId, ValidationErrors};
use myshop_infra::{ProductStore, WriteBatch, WriteOp};
use myshop_products::{
    BatteryType, Bluetooth, FieldValue, Product, ProductChange, ProductKind, ProductType,
    SmartPhoneVariant, WifiConnectivity, decimal,
};

use super::fields::{self, does_not_exist};
use super::product::{base_fields, base_representation, check_base_references, parse_base_field};
use super::variant::InlineListSerializer;
use super::{
    DetailSerializer, FieldKind, FieldSpec, SerializerContext, message, object, parse_payload,
    reload,
};
use crate::app::errors::{ApiError, ApiResult};

/// Smartphone models with their nested variants.
///
/// Physical measurements render as JSON numbers, not strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartPhoneSerializer {
    pub variants: InlineListSerializer,
}

#[async_trait]
impl DetailSerializer for SmartPhoneSerializer {
    fn product_type(&self) -> ProductType {
        ProductType::SmartPhoneModel
    }

    fn fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.extend([
            FieldSpec::new("battery_type", FieldKind::Choice)
                .required()
                .choices(BatteryType::choices()),
            FieldSpec::new("battery_capacity", FieldKind::Integer).required(),
            FieldSpec::new("ram_storage", FieldKind::Integer).required(),
            FieldSpec::new("wifi_connectivity", FieldKind::Choice)
                .required()
                .choices(WifiConnectivity::choices()),
            FieldSpec::new("bluetooth", FieldKind::Choice)
                .required()
                .choices(Bluetooth::choices()),
            FieldSpec::new("gps", FieldKind::Boolean),
            FieldSpec::new("operating_system", FieldKind::PrimaryKey).required(),
            FieldSpec::new("width", FieldKind::Decimal).required().coerce_to_string(false),
            FieldSpec::new("height", FieldKind::Decimal).required().coerce_to_string(false),
            FieldSpec::new("weight", FieldKind::Decimal).required().coerce_to_string(false),
            FieldSpec::new("screen_size", FieldKind::Decimal)
                .required()
                .coerce_to_string(false),
            FieldSpec::new("variants", FieldKind::List)
                .required()
                .children(self.variants.child.fields()),
        ]);
        fields
    }

    async fn validate(
        &self,
        ctx: &SerializerContext<'_>,
        data: &Value,
    ) -> ApiResult<Vec<ProductChange>> {
        let parent = ctx.instance_id();
        let changes = parse_payload(data, &self.fields(), ctx.partial, |spec, raw| {
            if let Some(parsed) = parse_base_field(spec.name, raw) {
                return parsed;
            }
            if spec.name == "variants" {
                return self.variants.validate(parent, raw).map(ProductChange::Variants);
            }
            let value = match spec.name {
                "battery_type" => fields::parse_choice(raw).map(FieldValue::BatteryType),
                "battery_capacity" => fields::parse_u32(raw).map(FieldValue::BatteryCapacity),
                "ram_storage" => fields::parse_u32(raw).map(FieldValue::RamStorage),
                "wifi_connectivity" => fields::parse_choice(raw).map(FieldValue::WifiConnectivity),
                "bluetooth" => fields::parse_choice(raw).map(FieldValue::Bluetooth),
                "gps" => fields::parse_bool(raw).map(FieldValue::Gps),
                "operating_system" => {
                    fields::parse_pk::<OperatingSystemId>(raw).map(FieldValue::OperatingSystem)
                }
                "width" => fields::parse_decimal(raw, decimal::LENGTH_MM).map(FieldValue::Width),
                "height" => fields::parse_decimal(raw, decimal::LENGTH_MM).map(FieldValue::Height),
                "weight" => fields::parse_decimal(raw, decimal::WEIGHT_G).map(FieldValue::Weight),
                "screen_size" => {
                    fields::parse_decimal(raw, decimal::SCREEN_INCH).map(FieldValue::ScreenSize)
                }
                other => Err(format!("unexpected field {other}")),
            };
            value.map(ProductChange::Assign).map_err(message)
        })?;

        let mut errors = ValidationErrors::new();
        check_base_references(ctx, &changes, &mut errors).await?;
        for change in &changes {
            if let ProductChange::Assign(FieldValue::OperatingSystem(id)) = change {
                if ctx.store.operating_system(*id).await?.is_none() {
                    errors.add("operating_system", does_not_exist(id));
                }
            }
        }
        errors.into_result(changes).map_err(ApiError::from)
    }

    /// Create the model from its attributes and model defaults, then one
    /// variant per submitted item, all in one batch with the parent first.
    async fn create(
        &self,
        store: &dyn ProductStore,
        changes: Vec<ProductChange>,
    ) -> ApiResult<Product> {
        let mut product = Product::blank(ProductType::SmartPhoneModel, Utc::now());
        let mut relations = Vec::new();
        let mut variants = Vec::new();
        for change in changes {
            match change {
                ProductChange::Variants(items) => variants = items,
                ProductChange::SetRelation(targets) => relations.push(targets),
                ProductChange::Assign(value) => product.assign(value)?,
            }
        }

        let id = product.id;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertProduct(product));
        for targets in relations {
            batch.push(WriteOp::SetRelation { product: id, targets });
        }
        for fields in variants {
            batch.push(WriteOp::InsertVariant(SmartPhoneVariant::create(id, fields)));
        }
        store.commit(batch).await?;
        reload(store, id).await
    }

    /// Nested variants are reconciled with the stored rows, relations are
    /// replaced, every other attribute is assigned; the model is saved once.
    async fn update(
        &self,
        store: &dyn ProductStore,
        mut instance: Product,
        changes: Vec<ProductChange>,
    ) -> ApiResult<Product> {
        let mut batch = WriteBatch::new();
        for change in changes {
            match change {
                ProductChange::Variants(items) => {
                    let existing = store.variants_of(instance.id).await?;
                    for op in self.variants.reconcile(instance.id, existing, items) {
                        batch.push(op);
                    }
                }
                ProductChange::SetRelation(targets) => {
                    batch.push(WriteOp::SetRelation { product: instance.id, targets });
                }
                ProductChange::Assign(value) => instance.assign(value)?,
            }
        }

        instance.updated_at = Utc::now();
        let id = instance.id;
        batch.push(WriteOp::SaveProduct(instance));
        store.commit(batch).await?;
        reload(store, id).await
    }

    async fn to_representation(&self, store: &dyn ProductStore, product: &Product) -> ApiResult<Value> {
        let ProductKind::SmartPhoneModel(phone) = &product.kind else {
            return Err(DomainError::invariant(format!(
                "{} is not a smart phone model",
                product.id
            ))
            .into());
        };
        let variants = store.variants_of(product.id).await?;

        let mut entries = base_representation(product);
        entries.extend([
            ("battery_type", json!(phone.battery_type)),
            ("battery_capacity", json!(phone.battery_capacity)),
            ("ram_storage", json!(phone.ram_storage)),
            ("wifi_connectivity", json!(phone.wifi_connectivity)),
            ("bluetooth", json!(phone.bluetooth)),
            ("gps", json!(phone.gps)),
            ("operating_system", json!(phone.operating_system)),
            ("width", fields::render_decimal(phone.width, decimal::LENGTH_MM, false)),
            ("height", fields::render_decimal(phone.height, decimal::LENGTH_MM, false)),
            ("weight", fields::render_decimal(phone.weight, decimal::WEIGHT_G, false)),
            (
                "screen_size",
                fields::render_decimal(phone.screen_size, decimal::SCREEN_INCH, false),
            ),
            ("variants", self.variants.to_representation(&variants)),
        ]);
        Ok(object(entries))
    }
}
