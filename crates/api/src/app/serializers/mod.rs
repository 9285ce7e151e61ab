//! Dashboard serializers.
//!
//! A detail serializer owns the declared field list of one product type. It
//! validates a JSON payload into [`ProductChange`]s, persists those changes
//! through a [`WriteBatch`], and renders a product back to JSON.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

use myshop_core::{DomainError, ErrorDetail, ProductId, ValidationErrors};
use myshop_infra::{ProductStore, WriteBatch, WriteOp};
use myshop_products::{Product, ProductChange, ProductType};

use crate::app::errors::{ApiError, ApiResult};

pub mod fields;
pub mod product;
pub mod smartcard;
pub mod smartphone;
pub mod summary;
pub mod variant;

#[cfg(test)]
mod testing;

pub use smartcard::SmartCardSerializer;
pub use smartphone::SmartPhoneSerializer;
pub use summary::ProductSummarySerializer;
pub use variant::{InlineListSerializer, SmartPhoneVariantSerializer};

/// What a serializer is validating against.
#[derive(Clone, Copy)]
pub struct SerializerContext<'a> {
    pub store: &'a dyn ProductStore,
    /// The product being edited; `None` on create.
    pub instance: Option<&'a Product>,
    /// PATCH semantics: absent fields are left alone instead of being required.
    pub partial: bool,
}

impl<'a> SerializerContext<'a> {
    pub fn create(store: &'a dyn ProductStore) -> Self {
        Self { store, instance: None, partial: false }
    }

    pub fn update(store: &'a dyn ProductStore, instance: &'a Product, partial: bool) -> Self {
        Self { store, instance: Some(instance), partial }
    }

    pub fn instance_id(&self) -> Option<ProductId> {
        self.instance.map(|p| p.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Uuid,
    Char,
    Slug,
    Text,
    Integer,
    Boolean,
    Decimal,
    Choice,
    PrimaryKey,
    ManyPrimaryKey,
    DateTime,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

/// Declared field of a serializer, also served as form metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub read_only: bool,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coerce_to_string: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldSpec>,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            read_only: false,
            hidden: false,
            choices: None,
            coerce_to_string: None,
            children: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn choices(mut self, choices: Vec<(&'static str, &'static str)>) -> Self {
        self.choices = Some(
            choices
                .into_iter()
                .map(|(value, label)| Choice { value, label })
                .collect(),
        );
        self
    }

    pub fn coerce_to_string(mut self, coerce: bool) -> Self {
        self.coerce_to_string = Some(coerce);
        self
    }

    pub fn children(mut self, children: Vec<FieldSpec>) -> Self {
        self.children = children;
        self
    }
}

/// Form metadata of one product type, consumed by the dashboard UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormDescriptor {
    pub product_type: &'static str,
    pub form_name: String,
    pub scope_prefix: String,
    pub fields: Vec<FieldSpec>,
}

/// Walk the declared fields over a payload object.
///
/// Read-only fields and unknown keys are ignored. A missing field is an error
/// only when it is required and `partial` is off. Results come back in field
/// declaration order; errors are collected for every field before returning.
pub fn parse_payload<T>(
    data: &Value,
    specs: &[FieldSpec],
    partial: bool,
    mut parse: impl FnMut(&FieldSpec, &Value) -> Result<T, ErrorDetail>,
) -> Result<Vec<T>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(object) = data.as_object() else {
        errors.add_non_field(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            fields::type_name(data)
        ));
        return Err(errors);
    };

    let mut parsed = Vec::new();
    for spec in specs.iter().filter(|s| !s.read_only) {
        let Some(raw) = object.get(spec.name) else {
            if spec.required && !partial {
                errors.add(spec.name, fields::REQUIRED);
            }
            continue;
        };
        match parse(spec, raw) {
            Ok(value) => parsed.push(value),
            Err(detail) => record(&mut errors, spec.name, detail),
        }
    }
    errors.into_result(parsed)
}

pub(crate) fn record(errors: &mut ValidationErrors, field: &str, detail: ErrorDetail) {
    match detail {
        ErrorDetail::Messages(messages) => {
            for message in messages {
                errors.add(field, message);
            }
        }
        ErrorDetail::Items(items) => errors.add_items(field, items),
    }
}

pub(crate) fn message(msg: impl Into<String>) -> ErrorDetail {
    ErrorDetail::Messages(vec![msg.into()])
}

/// Serializer for the detail view of one concrete product type.
#[async_trait]
pub trait DetailSerializer: Send + Sync {
    fn product_type(&self) -> ProductType;

    fn fields(&self) -> Vec<FieldSpec>;

    fn form_name(&self) -> String {
        format!("{}_form", self.product_type().model_name())
    }

    fn scope_prefix(&self) -> String {
        self.product_type().model_name().to_string()
    }

    fn form(&self) -> FormDescriptor {
        FormDescriptor {
            product_type: self.product_type().identifier(),
            form_name: self.form_name(),
            scope_prefix: self.scope_prefix(),
            fields: self.fields(),
        }
    }

    /// Turn a payload into changes, or fail with field-keyed errors.
    async fn validate(&self, ctx: &SerializerContext<'_>, data: &Value)
        -> ApiResult<Vec<ProductChange>>;

    /// Persist a new product built from model defaults plus `changes`.
    async fn create(
        &self,
        store: &dyn ProductStore,
        changes: Vec<ProductChange>,
    ) -> ApiResult<Product> {
        let mut product = Product::blank(self.product_type(), Utc::now());
        let mut relations = Vec::new();
        for change in changes {
            match change {
                ProductChange::Assign(value) => product.assign(value)?,
                ProductChange::SetRelation(targets) => relations.push(targets),
                ProductChange::Variants(_) => return Err(unsupported_variants(self.product_type())),
            }
        }

        let id = product.id;
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertProduct(product));
        for targets in relations {
            batch.push(WriteOp::SetRelation { product: id, targets });
        }
        store.commit(batch).await?;
        reload(store, id).await
    }

    /// Apply `changes` to `instance` and save it once.
    async fn update(
        &self,
        store: &dyn ProductStore,
        mut instance: Product,
        changes: Vec<ProductChange>,
    ) -> ApiResult<Product> {
        let mut batch = WriteBatch::new();
        for change in changes {
            match change {
                ProductChange::Assign(value) => instance.assign(value)?,
                ProductChange::SetRelation(targets) => {
                    batch.push(WriteOp::SetRelation { product: instance.id, targets });
                }
                ProductChange::Variants(_) => return Err(unsupported_variants(self.product_type())),
            }
        }
        instance.updated_at = Utc::now();
        let id = instance.id;
        batch.push(WriteOp::SaveProduct(instance));
        store.commit(batch).await?;
        reload(store, id).await
    }

    async fn to_representation(&self, store: &dyn ProductStore, product: &Product)
        -> ApiResult<Value>;
}

fn unsupported_variants(product_type: ProductType) -> ApiError {
    ApiError::Domain(DomainError::invariant(format!(
        "{product_type} does not own variants"
    )))
}

/// Read a product back after a commit.
pub(crate) async fn reload(store: &dyn ProductStore, id: ProductId) -> ApiResult<Product> {
    store
        .get_product(id)
        .await?
        .ok_or(ApiError::Domain(DomainError::NotFound))
}

pub(crate) fn object(entries: Vec<(&str, Value)>) -> Value {
    let mut map = Map::new();
    for (key, value) in entries {
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}
