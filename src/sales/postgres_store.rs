// src/sales/postgres_store.rs

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::QueryAs;
use sqlx::{FromRow, Pool, Postgres};

use super::sales_store::SaleStore;
use super::sales_structs::{LineItem, Sale, PRICE_SCALE};
use crate::shared::error::StoreError;

/// One row of the `sales LEFT JOIN line_items` read. A sale without items
/// yields a single row whose item columns are all NULL.
#[derive(FromRow)]
struct SaleItemRow {
    id: i64,
    sold_at: NaiveDateTime,
    item_id: Option<i64>,
    product_name: Option<String>,
    quantity: Option<i32>,
    unit_price: Option<BigDecimal>,
}

/// Folds one joined row into `sales`, which must arrive ordered by sale id.
///
/// NUMERIC values come back from Postgres with extra trailing zeros, so
/// prices are brought back to `PRICE_SCALE`.
fn push_row(sales: &mut Vec<Sale>, row: SaleItemRow) {
    let starts_new_sale = match sales.last() {
        Some(last) => last.id != Some(row.id),
        None => true,
    };
    if starts_new_sale {
        sales.push(Sale {
            id: Some(row.id),
            timestamp: Some(row.sold_at),
            items: Vec::new(),
        });
    }

    if let (Some(item_id), Some(sale)) = (row.item_id, sales.last_mut()) {
        sale.items.push(LineItem {
            id: Some(item_id),
            sale_id: Some(row.id),
            product_name: row.product_name.unwrap_or_default(),
            quantity: row.quantity,
            unit_price: row.unit_price.map(|p| p.with_scale(PRICE_SCALE)),
        });
    }
}

/// Aggregate read with an optional filter on `s`. Sales and their items come
/// from a single statement, so both halves share one snapshot.
fn aggregate_query(filter: &str) -> String {
    format!(
        "SELECT s.id, s.sold_at, li.id AS item_id, li.product_name, li.quantity, li.unit_price \
         FROM sales s LEFT JOIN line_items li ON li.sale_id = s.id \
         {} ORDER BY s.id, li.id",
        filter
    )
}

/// Sale store backed by PostgreSQL.
///
/// Column types must stay NUMERIC so `BigDecimal` round-trips without drift.
#[derive(Debug, Clone)]
pub struct PgSaleStore {
    pool: Pool<Postgres>,
}

impl PgSaleStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url` and brings the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("sales schema migrated");

        Ok(Self::new(pool))
    }

    /// Runs an aggregate read and assembles the sales, in sale id order.
    async fn load<'q>(
        &self,
        query: QueryAs<'q, Postgres, SaleItemRow, PgArguments>,
    ) -> Result<Vec<Sale>, StoreError> {
        let mut sales = Vec::new();
        let mut rows = query.fetch(&self.pool);

        while let Some(row) = rows.try_next().await? {
            push_row(&mut sales, row);
        }

        Ok(sales)
    }
}

#[async_trait]
impl SaleStore for PgSaleStore {
    /// Writes the sale and its items in one transaction.
    ///
    /// Steps:
    /// 1. Upsert the `sales` row. A missing id draws from the serial sequence.
    /// 2. Drop the sale's current `line_items` rows.
    /// 3. Insert every item, keeping ids it already has.
    /// 4. Commit. Any error before this rolls the whole write back on drop.
    async fn save(&self, mut sale: Sale) -> Result<Sale, StoreError> {
        let mut transaction = self.pool.begin().await?;

        // 1. sale row; `total` is written for reporting and never read back

        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO sales (id, sold_at, total) \
             VALUES (COALESCE($1, nextval(pg_get_serial_sequence('sales', 'id'))), $2, $3) \
             ON CONFLICT (id) DO UPDATE SET sold_at = EXCLUDED.sold_at, total = EXCLUDED.total \
             RETURNING id",
        )
        .bind(sale.id)
        .bind(sale.timestamp)
        .bind(sale.total())
        .fetch_one(&mut *transaction)
        .await?;

        sale.id = Some(id);

        // 2. clear the old items so a replaced list leaves nothing behind
        sqlx::query("DELETE FROM line_items WHERE sale_id = $1")
            .bind(id)
            .execute(&mut *transaction)
            .await?;

        // 3. items
        for item in &mut sale.items {
            let (item_id,) = sqlx::query_as::<_, (i64,)>(
                "INSERT INTO line_items (id, sale_id, product_name, quantity, unit_price) \
                 VALUES (COALESCE($1, nextval(pg_get_serial_sequence('line_items', 'id'))), $2, $3, $4, $5) \
                 RETURNING id",
            )
            .bind(item.id)
            .bind(id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(&item.unit_price)
            .fetch_one(&mut *transaction)
            .await?;

            item.id = Some(item_id);
        }
        sale.relink_items();

        // 4. commit
        transaction.commit().await?;
        tracing::debug!(sale_id = id, items = sale.items.len(), "sale row written");

        Ok(sale)
    }

    async fn find_all(&self) -> Result<Vec<Sale>, StoreError> {
        let sql = aggregate_query("");
        self.load(sqlx::query_as::<_, SaleItemRow>(&sql)).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Sale>, StoreError> {
        let sql = aggregate_query("WHERE s.id = $1");
        let mut sales = self
            .load(sqlx::query_as::<_, SaleItemRow>(&sql).bind(id))
            .await?;

        Ok(sales.pop())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        // line_items rows follow through ON DELETE CASCADE.
        sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_timestamp_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sale>, StoreError> {
        // Half-open window: a sale at exactly `end` belongs to the next one.
        let sql = aggregate_query("WHERE s.sold_at >= $1 AND s.sold_at < $2");
        self.load(sqlx::query_as::<_, SaleItemRow>(&sql).bind(start).bind(end))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn sold_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 25)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn item_row(sale_id: i64, item_id: i64, price: &str) -> SaleItemRow {
        SaleItemRow {
            id: sale_id,
            sold_at: sold_at(),
            item_id: Some(item_id),
            product_name: Some(format!("Product {}", item_id)),
            quantity: Some(3),
            unit_price: Some(BigDecimal::from_str(price).unwrap()),
        }
    }

    fn bare_row(sale_id: i64) -> SaleItemRow {
        SaleItemRow {
            id: sale_id,
            sold_at: sold_at(),
            item_id: None,
            product_name: None,
            quantity: None,
            unit_price: None,
        }
    }

    fn assemble(rows: Vec<SaleItemRow>) -> Vec<Sale> {
        let mut sales = Vec::new();
        for row in rows {
            push_row(&mut sales, row);
        }
        sales
    }

    #[test]
    fn rows_group_into_sales_in_order() {
        let sales = assemble(vec![
            item_row(1, 10, "1.00"),
            item_row(1, 11, "2.00"),
            bare_row(2),
            item_row(3, 12, "5.00"),
        ]);

        let ids: Vec<_> = sales.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(sales[0].items.len(), 2);
        assert_eq!(sales[0].items[1].id, Some(11));
        assert!(sales[0].items.iter().all(|i| i.sale_id == Some(1)));
        assert_eq!(sales[2].items[0].sale_id, Some(3));
    }

    #[test]
    fn sale_without_items_has_zero_total() {
        let sales = assemble(vec![bare_row(7)]);

        assert_eq!(sales.len(), 1);
        assert!(sales[0].items.is_empty());
        assert_eq!(sales[0].total(), BigDecimal::from(0));
    }

    #[test]
    fn decoded_prices_are_rescaled_to_cents() {
        // Postgres hands NUMERIC back as 0.1000 for a 0.10 column value.
        let sales = assemble(vec![item_row(1, 10, "0.1000")]);
        let item = &sales[0].items[0];

        assert_eq!(item.unit_price.as_ref().unwrap().to_string(), "0.10");
        assert_eq!(item.subtotal().to_string(), "0.30");
        assert_eq!(sales[0].total().to_string(), "0.30");
    }
}
