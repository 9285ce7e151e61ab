//! Postgres-backed catalog store.
//!
//! Products use one row in `products` plus one row in the table of their kind
//! (`smartcards` or `smartphonemodels`). A [`WriteBatch`] runs inside a single
//! transaction; uniqueness constraints are deferred to commit so a batch may
//! shuffle product codes between its own rows.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use myshop_core::{ImageId, ManufacturerId, OperatingSystemId, ProductId};
use myshop_products::{
    Image, Manufacturer, OperatingSystem, Product, ProductKind, ProductType, RelationTargets,
    SmartCard, SmartPhoneModel, SmartPhoneVariant,
};

use super::store::{ProductStore, StoreError, StoreResult, WriteBatch, WriteOp};

const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.product_type,
        p.product_name,
        p.slug,
        p.caption,
        p.description,
        p.manufacturer_id,
        p."order",
        p.active,
        p.created_at,
        p.updated_at,
        c.unit_price AS card_unit_price,
        c.card_type,
        c.speed,
        c.product_code AS card_product_code,
        c.storage AS card_storage,
        m.battery_type,
        m.battery_capacity,
        m.ram_storage,
        m.wifi_connectivity,
        m.bluetooth,
        m.gps,
        m.operating_system_id,
        m.width,
        m.height,
        m.weight,
        m.screen_size,
        COALESCE(
            (SELECT array_agg(pi.image_id ORDER BY pi.position)
             FROM product_images pi
             WHERE pi.product_id = p.id),
            '{}'::uuid[]
        ) AS image_ids
    FROM products p
    LEFT JOIN smartcards c ON c.product_id = p.id
    LEFT JOIN smartphonemodels m ON m.product_id = p.id
"#;

pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::backend(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            r#"{PRODUCT_SELECT} ORDER BY p."order", p.product_name, p.id"#
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    async fn variants_of(&self, product: ProductId) -> StoreResult<Vec<SmartPhoneVariant>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, product_code, unit_price, storage
            FROM smartphonevariants
            WHERE product_id = $1
            ORDER BY position
            "#,
        )
        .bind(product.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("variants_of", e))?;

        rows.iter()
            .map(|row| {
                Ok(SmartPhoneVariant {
                    id: get::<Uuid>(row, "id")?.into(),
                    product: get::<Uuid>(row, "product_id")?.into(),
                    product_code: get(row, "product_code")?,
                    unit_price: get(row, "unit_price")?,
                    storage: get_u32(row, "storage")?,
                })
            })
            .collect()
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<ProductId>) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("slug_taken", e))
    }

    async fn card_code_taken(&self, code: &str, exclude: Option<ProductId>) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM smartcards WHERE product_code = $1 AND ($2::uuid IS NULL OR product_id <> $2))",
        )
        .bind(code)
        .bind(exclude.map(|id| *id.as_uuid()))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("card_code_taken", e))
    }

    async fn manufacturer(&self, id: ManufacturerId) -> StoreResult<Option<Manufacturer>> {
        let row = sqlx::query("SELECT id, name FROM manufacturers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("manufacturer", e))?;
        row.as_ref().map(manufacturer_from_row).transpose()
    }

    async fn manufacturers(&self) -> StoreResult<Vec<Manufacturer>> {
        let rows = sqlx::query("SELECT id, name FROM manufacturers ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("manufacturers", e))?;
        rows.iter().map(manufacturer_from_row).collect()
    }

    async fn operating_system(&self, id: OperatingSystemId) -> StoreResult<Option<OperatingSystem>> {
        let row = sqlx::query("SELECT id, name FROM operating_systems WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("operating_system", e))?;
        row.as_ref().map(operating_system_from_row).transpose()
    }

    async fn operating_systems(&self) -> StoreResult<Vec<OperatingSystem>> {
        let rows = sqlx::query("SELECT id, name FROM operating_systems ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("operating_systems", e))?;
        rows.iter().map(operating_system_from_row).collect()
    }

    async fn image(&self, id: ImageId) -> StoreResult<Option<Image>> {
        let row = sqlx::query("SELECT id, url, caption FROM images WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("image", e))?;
        row.as_ref().map(image_from_row).transpose()
    }

    async fn images(&self) -> StoreResult<Vec<Image>> {
        let rows = sqlx::query("SELECT id, url, caption FROM images ORDER BY position")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("images", e))?;
        rows.iter().map(image_from_row).collect()
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()), err)]
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for op in batch.into_ops() {
            // Dropping `tx` on error rolls the transaction back.
            apply(&mut tx, op).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

async fn apply(tx: &mut Transaction<'_, Postgres>, op: WriteOp) -> StoreResult<()> {
    let kind = op.kind();
    match op {
        WriteOp::InsertProduct(product) => {
            sqlx::query(
                r#"
                INSERT INTO products (
                    id, product_type, product_name, slug, caption, description,
                    manufacturer_id, "order", active, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(product.id.as_uuid())
            .bind(product.product_type().identifier())
            .bind(&product.product_name)
            .bind(&product.slug)
            .bind(&product.caption)
            .bind(&product.description)
            .bind(product.manufacturer.as_uuid())
            .bind(i64::from(product.order))
            .bind(product.active)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(kind, e))?;
            upsert_kind(tx, product.id, &product.kind).await
        }
        WriteOp::SaveProduct(product) => {
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    product_name = $2,
                    slug = $3,
                    caption = $4,
                    description = $5,
                    manufacturer_id = $6,
                    "order" = $7,
                    active = $8,
                    updated_at = $9
                WHERE id = $1
                "#,
            )
            .bind(product.id.as_uuid())
            .bind(&product.product_name)
            .bind(&product.slug)
            .bind(&product.caption)
            .bind(&product.description)
            .bind(product.manufacturer.as_uuid())
            .bind(i64::from(product.order))
            .bind(product.active)
            .bind(product.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(kind, e))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::not_found(format!("product {}", product.id)));
            }
            upsert_kind(tx, product.id, &product.kind).await
        }
        WriteOp::DeleteProduct(id) => {
            let result = sqlx::query("DELETE FROM products WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(kind, e))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::not_found(format!("product {id}")));
            }
            Ok(())
        }
        WriteOp::SetRelation { product, targets } => match targets {
            RelationTargets::Images(ids) => {
                sqlx::query("DELETE FROM product_images WHERE product_id = $1")
                    .bind(product.as_uuid())
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error(kind, e))?;
                for (position, image) in ids.iter().enumerate() {
                    sqlx::query(
                        "INSERT INTO product_images (product_id, image_id, position) VALUES ($1, $2, $3)",
                    )
                    .bind(product.as_uuid())
                    .bind(image.as_uuid())
                    .bind(i32::try_from(position).unwrap_or(i32::MAX))
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error(kind, e))?;
                }
                Ok(())
            }
        },
        WriteOp::InsertVariant(variant) => {
            sqlx::query(
                r#"
                INSERT INTO smartphonevariants (id, product_id, product_code, unit_price, storage)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(variant.id.as_uuid())
            .bind(variant.product.as_uuid())
            .bind(&variant.product_code)
            .bind(variant.unit_price)
            .bind(i64::from(variant.storage))
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(kind, e))?;
            Ok(())
        }
        WriteOp::SaveVariant(variant) => {
            let result = sqlx::query(
                r#"
                UPDATE smartphonevariants
                SET product_id = $2, product_code = $3, unit_price = $4, storage = $5
                WHERE id = $1
                "#,
            )
            .bind(variant.id.as_uuid())
            .bind(variant.product.as_uuid())
            .bind(&variant.product_code)
            .bind(variant.unit_price)
            .bind(i64::from(variant.storage))
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(kind, e))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::not_found(format!("smart phone variant {}", variant.id)));
            }
            Ok(())
        }
        WriteOp::DeleteVariant(id) => {
            let result = sqlx::query("DELETE FROM smartphonevariants WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(kind, e))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::not_found(format!("smart phone variant {id}")));
            }
            Ok(())
        }
        WriteOp::InsertManufacturer(row) => {
            sqlx::query("INSERT INTO manufacturers (id, name) VALUES ($1, $2)")
                .bind(row.id.as_uuid())
                .bind(&row.name)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(kind, e))?;
            Ok(())
        }
        WriteOp::InsertOperatingSystem(row) => {
            sqlx::query("INSERT INTO operating_systems (id, name) VALUES ($1, $2)")
                .bind(row.id.as_uuid())
                .bind(&row.name)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(kind, e))?;
            Ok(())
        }
        WriteOp::InsertImage(row) => {
            sqlx::query("INSERT INTO images (id, url, caption) VALUES ($1, $2, $3)")
                .bind(row.id.as_uuid())
                .bind(&row.url)
                .bind(&row.caption)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error(kind, e))?;
            Ok(())
        }
    }
}

async fn upsert_kind(
    tx: &mut Transaction<'_, Postgres>,
    product: ProductId,
    kind: &ProductKind,
) -> StoreResult<()> {
    match kind {
        ProductKind::SmartCard(card) => {
            sqlx::query(
                r#"
                INSERT INTO smartcards (product_id, unit_price, card_type, speed, product_code, storage)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (product_id) DO UPDATE SET
                    unit_price = EXCLUDED.unit_price,
                    card_type = EXCLUDED.card_type,
                    speed = EXCLUDED.speed,
                    product_code = EXCLUDED.product_code,
                    storage = EXCLUDED.storage
                "#,
            )
            .bind(product.as_uuid())
            .bind(card.unit_price)
            .bind(card.card_type.as_str())
            .bind(card.speed.as_str())
            .bind(&card.product_code)
            .bind(i64::from(card.storage))
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("upsert_smartcard", e))?;
        }
        ProductKind::SmartPhoneModel(phone) => {
            sqlx::query(
                r#"
                INSERT INTO smartphonemodels (
                    product_id, battery_type, battery_capacity, ram_storage,
                    wifi_connectivity, bluetooth, gps, operating_system_id,
                    width, height, weight, screen_size
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (product_id) DO UPDATE SET
                    battery_type = EXCLUDED.battery_type,
                    battery_capacity = EXCLUDED.battery_capacity,
                    ram_storage = EXCLUDED.ram_storage,
                    wifi_connectivity = EXCLUDED.wifi_connectivity,
                    bluetooth = EXCLUDED.bluetooth,
                    gps = EXCLUDED.gps,
                    operating_system_id = EXCLUDED.operating_system_id,
                    width = EXCLUDED.width,
                    height = EXCLUDED.height,
                    weight = EXCLUDED.weight,
                    screen_size = EXCLUDED.screen_size
                "#,
            )
            .bind(product.as_uuid())
            .bind(phone.battery_type.as_str())
            .bind(i64::from(phone.battery_capacity))
            .bind(i64::from(phone.ram_storage))
            .bind(phone.wifi_connectivity.as_str())
            .bind(phone.bluetooth.as_str())
            .bind(phone.gps)
            .bind(phone.operating_system.as_uuid())
            .bind(phone.width)
            .bind(phone.height)
            .bind(phone.weight)
            .bind(phone.screen_size)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("upsert_smartphonemodel", e))?;
        }
    }
    Ok(())
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let product_type = ProductType::from_str(&get::<String>(row, "product_type")?)
        .map_err(|e| StoreError::backend(e.to_string()))?;

    let kind = match product_type {
        ProductType::SmartCard => ProductKind::SmartCard(SmartCard {
            unit_price: get::<Decimal>(row, "card_unit_price")?,
            card_type: get_choice(row, "card_type")?,
            speed: get_choice(row, "speed")?,
            product_code: get(row, "card_product_code")?,
            storage: get_u32(row, "card_storage")?,
        }),
        ProductType::SmartPhoneModel => ProductKind::SmartPhoneModel(SmartPhoneModel {
            battery_type: get_choice(row, "battery_type")?,
            battery_capacity: get_u32(row, "battery_capacity")?,
            ram_storage: get_u32(row, "ram_storage")?,
            wifi_connectivity: get_choice(row, "wifi_connectivity")?,
            bluetooth: get_choice(row, "bluetooth")?,
            gps: get(row, "gps")?,
            operating_system: get::<Uuid>(row, "operating_system_id")?.into(),
            width: get(row, "width")?,
            height: get(row, "height")?,
            weight: get(row, "weight")?,
            screen_size: get(row, "screen_size")?,
        }),
    };

    Ok(Product {
        id: get::<Uuid>(row, "id")?.into(),
        product_name: get(row, "product_name")?,
        slug: get(row, "slug")?,
        caption: get(row, "caption")?,
        description: get(row, "description")?,
        manufacturer: get::<Uuid>(row, "manufacturer_id")?.into(),
        order: get_u32(row, "order")?,
        active: get(row, "active")?,
        images: get::<Vec<Uuid>>(row, "image_ids")?
            .into_iter()
            .map(ImageId::from)
            .collect(),
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
        kind,
    })
}

fn manufacturer_from_row(row: &PgRow) -> StoreResult<Manufacturer> {
    Ok(Manufacturer {
        id: get::<Uuid>(row, "id")?.into(),
        name: get(row, "name")?,
    })
}

fn operating_system_from_row(row: &PgRow) -> StoreResult<OperatingSystem> {
    Ok(OperatingSystem {
        id: get::<Uuid>(row, "id")?.into(),
        name: get(row, "name")?,
    })
}

fn image_from_row(row: &PgRow) -> StoreResult<Image> {
    Ok(Image {
        id: get::<Uuid>(row, "id")?.into(),
        url: get(row, "url")?,
        caption: get(row, "caption")?,
    })
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::backend(format!("failed to read column {column}: {e}")))
}

fn get_u32(row: &PgRow, column: &str) -> StoreResult<u32> {
    let value: i64 = get(row, column)?;
    u32::try_from(value)
        .map_err(|_| StoreError::backend(format!("column {column} out of range: {value}")))
}

fn get_choice<T>(row: &PgRow, column: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = get(row, column)?;
    raw.parse()
        .map_err(|e: T::Err| StoreError::backend(format!("column {column}: {e}")))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::conflict(conflict_message(db_err.constraint())),
            Some("23503") => StoreError::foreign_key(format!(
                "referenced row does not exist ({operation}): {}",
                db_err.message()
            )),
            _ => StoreError::backend(format!(
                "database error in {operation}: {}",
                db_err.message()
            )),
        },
        sqlx::Error::PoolClosed => {
            StoreError::backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn conflict_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("products_slug_key") => "product with this slug already exists.".to_string(),
        Some("smartcards_product_code_key") => {
            "smart card with this product code already exists.".to_string()
        }
        Some("smartphonevariants_product_code_key") => {
            "smart phone variant with this product code already exists.".to_string()
        }
        Some(other) => format!("duplicate value violates {other}"),
        None => "duplicate value".to_string(),
    }
}
