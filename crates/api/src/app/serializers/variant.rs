//! Smartphone variants, validated and written only through their model.

use serde_json::{Value, json};

use myshop_core::{ErrorDetail, ProductId, ValidationErrors, VariantId};
use myshop_infra::WriteOp;
use myshop_products::{Decimal, SmartPhoneVariant, VariantFields, decimal};

use super::fields::{self, CharField};
use super::{FieldKind, FieldSpec, message, object, parse_payload};

pub const PRODUCT_ID_MISMATCH: &str = "Product ID mismatch";

enum VariantField {
    Id(VariantId),
    ProductCode(String),
    UnitPrice(Decimal),
    Storage(u32),
    /// The parent reference only takes part in validation.
    Product,
}

/// One variant row.
///
/// `id` and `product` are optional and hidden: the parent comes from the
/// enclosing smartphone. `product_code` carries no uniqueness check here; the
/// store rejects duplicates on commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartPhoneVariantSerializer;

impl SmartPhoneVariantSerializer {
    pub fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("id", FieldKind::Uuid).hidden(),
            FieldSpec::new("product", FieldKind::PrimaryKey).hidden(),
            FieldSpec::new("product_code", FieldKind::Char).required(),
            FieldSpec::new("unit_price", FieldKind::Decimal)
                .required()
                .coerce_to_string(false),
            FieldSpec::new("storage", FieldKind::Integer).required(),
        ]
    }

    /// Validate one submitted item as a complete row.
    ///
    /// `parent` is the smartphone being edited; a submitted `product` must
    /// name it. On create there is no parent yet, so any `product` fails.
    pub fn validate(
        &self,
        parent: Option<ProductId>,
        data: &Value,
    ) -> Result<VariantFields, ValidationErrors> {
        let parsed = parse_payload(data, &self.fields(), false, |spec, raw| {
            let value = match spec.name {
                "id" => fields::parse_uuid(raw).map(VariantField::Id),
                "product" => fields::parse_pk::<ProductId>(raw).and_then(|product| {
                    if Some(product) == parent {
                        Ok(VariantField::Product)
                    } else {
                        Err(PRODUCT_ID_MISMATCH.to_string())
                    }
                }),
                "product_code" => CharField::required(255).parse(raw).map(VariantField::ProductCode),
                "unit_price" => fields::parse_decimal(raw, decimal::MONEY).map(VariantField::UnitPrice),
                "storage" => fields::parse_u32(raw).map(VariantField::Storage),
                other => Err(format!("unexpected field {other}")),
            };
            value.map_err(message)
        })?;

        // Every required field is present once `parse_payload` succeeds.
        let mut row = VariantFields {
            id: None,
            product_code: String::new(),
            unit_price: Decimal::ZERO,
            storage: 0,
        };
        for field in parsed {
            match field {
                VariantField::Id(v) => row.id = Some(v),
                VariantField::ProductCode(v) => row.product_code = v,
                VariantField::UnitPrice(v) => row.unit_price = v,
                VariantField::Storage(v) => row.storage = v,
                VariantField::Product => {}
            }
        }
        Ok(row)
    }

    pub fn to_representation(&self, variant: &SmartPhoneVariant) -> Value {
        object(vec![
            ("id", json!(variant.id)),
            ("product", json!(variant.product)),
            ("product_code", json!(variant.product_code)),
            (
                "unit_price",
                fields::render_decimal(variant.unit_price, decimal::MONEY, false),
            ),
            ("storage", json!(variant.storage)),
        ])
    }
}

/// The nested `variants` list of a smartphone.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineListSerializer {
    pub child: SmartPhoneVariantSerializer,
}

impl InlineListSerializer {
    /// Validate every item; errors are reported index-aligned with the input.
    pub fn validate(
        &self,
        parent: Option<ProductId>,
        data: &Value,
    ) -> Result<Vec<VariantFields>, ErrorDetail> {
        let items = match data {
            Value::Array(items) => items,
            Value::Null => return Err(message(fields::NULL)),
            other => {
                return Err(message(format!(
                    "Expected a list of items but got type \"{}\".",
                    fields::type_name(other)
                )));
            }
        };

        let mut validated = Vec::with_capacity(items.len());
        let mut item_errors = Vec::with_capacity(items.len());
        for item in items {
            match self.child.validate(parent, item) {
                Ok(fields) => {
                    validated.push(fields);
                    item_errors.push(ValidationErrors::new());
                }
                Err(errors) => item_errors.push(errors),
            }
        }

        if item_errors.iter().all(ValidationErrors::is_empty) {
            Ok(validated)
        } else {
            Err(ErrorDetail::Items(item_errors))
        }
    }

    /// Writes that turn the stored rows of `parent` into `submitted`.
    ///
    /// A submitted id matching a stored row edits it in place; any other item
    /// becomes a new row. Stored rows not submitted are deleted. Deletes come
    /// first, then edits, then inserts.
    pub fn reconcile(
        &self,
        parent: ProductId,
        existing: Vec<SmartPhoneVariant>,
        submitted: Vec<VariantFields>,
    ) -> Vec<WriteOp> {
        let mut deletes = Vec::new();
        let mut saves = Vec::new();
        let mut inserts = Vec::new();

        let mut stored = existing;
        for fields in submitted {
            let matched = fields
                .id
                .and_then(|id| stored.iter().position(|v| v.id == id))
                .map(|idx| stored.remove(idx));
            match matched {
                Some(mut variant) => {
                    variant.apply(fields);
                    saves.push(WriteOp::SaveVariant(variant));
                }
                None => inserts.push(WriteOp::InsertVariant(SmartPhoneVariant::create(parent, fields))),
            }
        }
        for variant in stored {
            deletes.push(WriteOp::DeleteVariant(variant.id));
        }

        deletes.into_iter().chain(saves).chain(inserts).collect()
    }

    pub fn to_representation(&self, variants: &[SmartPhoneVariant]) -> Value {
        Value::Array(variants.iter().map(|v| self.child.to_representation(v)).collect())
    }
}
