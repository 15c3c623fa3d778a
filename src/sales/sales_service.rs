// src/sales/sales_service.rs

use std::sync::Arc;

use bigdecimal::BigDecimal;

use super::period::ProfitPeriod;
use super::sales_store::SaleStore;
use super::sales_structs::{ProfitResponse, Sale, UpdateSale};
use crate::shared::clock::Clock;
use crate::shared::error::{SaleError, SaleResult};

/// Orchestrates every write through the same path: mutate in memory, derive
/// timestamp, links and total, then persist.
#[derive(Clone)]
pub struct SaleService {
    store: Arc<dyn SaleStore>,
    clock: Arc<dyn Clock>,
}

impl SaleService {
    pub fn new(store: Arc<dyn SaleStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stores a new sale. Any id, timestamp or item ids sent by the caller are discarded.
    pub async fn create(&self, mut sale: Sale) -> SaleResult<Sale> {
        sale.id = None;
        let sale = self.persist(sale, true).await?;
        tracing::info!(
            sale_id = ?sale.id,
            items = sale.items.len(),
            total = %sale.total(),
            "sale created"
        );
        Ok(sale)
    }

    pub async fn list(&self) -> SaleResult<Vec<Sale>> {
        let sales = self.store.find_all().await?;
        tracing::debug!(count = sales.len(), "listed sales");
        Ok(sales)
    }

    pub async fn get_by_id(&self, id: i64) -> SaleResult<Option<Sale>> {
        let sale = self.store.find_by_id(id).await?;
        if sale.is_none() {
            tracing::debug!(sale_id = id, "sale not found");
        }
        Ok(sale)
    }

    /// Deletes the sale and its items. The store is only asked to delete ids it holds.
    pub async fn delete_by_id(&self, id: i64) -> SaleResult<()> {
        if self.store.find_by_id(id).await?.is_none() {
            tracing::warn!(sale_id = id, "delete requested for unknown sale");
            return Err(SaleError::NotFound(id));
        }

        self.store.delete_by_id(id).await?;
        tracing::info!(sale_id = id, "sale deleted");
        Ok(())
    }

    /// Applies `update` to an existing sale and re-persists it. `Ok(None)` when
    /// no sale has this id; nothing is written in that case.
    pub async fn update(&self, id: i64, update: UpdateSale) -> SaleResult<Option<Sale>> {
        let Some(mut sale) = self.store.find_by_id(id).await? else {
            tracing::warn!(sale_id = id, "update requested for unknown sale");
            return Ok(None);
        };

        let replaced = update.items.is_some();
        if let Some(items) = update.items {
            sale.items = items;
        }

        let sale = self.persist(sale, replaced).await?;
        tracing::info!(sale_id = id, total = %sale.total(), "sale updated");
        Ok(Some(sale))
    }

    /// Sums the totals of every sale inside the current `period` window.
    pub async fn calculate_profit(&self, period: &str) -> SaleResult<ProfitResponse> {
        let period: ProfitPeriod = period.parse()?;
        let now = self.clock.now();
        let (start, end) = period.window(now).ok_or_else(|| {
            SaleError::invalid(format!("no {} window can be built around {}", period, now))
        })?;

        let sales = self.store.find_by_timestamp_range(start, end).await?;
        let total = sales
            .iter()
            .fold(BigDecimal::from(0), |acc, sale| acc + sale.total());

        tracing::debug!(%period, %start, %end, sales = sales.len(), %total, "profit computed");

        Ok(ProfitResponse {
            period: period.to_string(),
            start,
            end,
            total,
        })
    }

    /// The single write path. Items that came from the caller are validated
    /// and lose any ids they carried.
    async fn persist(&self, mut sale: Sale, items_from_caller: bool) -> SaleResult<Sale> {
        // 1. Caller-supplied items must fit the schema; ids are assigned by the store.
        if items_from_caller {
            for item in &mut sale.items {
                item.validate()?;
                item.id = None;
            }
        }
        // 2. The derived total must fit its column too, or the store would reject it.
        sale.validate_total()?;

        // 3. Server-side fields: timestamp and back-references.
        sale.timestamp = Some(self.clock.now());
        sale.relink_items();

        // 4. One atomic write of the sale and its items.
        Ok(self.store.save(sale).await?)
    }
}
