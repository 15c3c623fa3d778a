// src/sales/sales_store.rs

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::sales_structs::Sale;
use crate::shared::error::StoreError;

/// Persistence contract for sale aggregates.
///
/// A `save` writes the sale and all of its items as one unit; deleting a sale
/// removes its items with it.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Insert-or-update. Assigns the sale id (and missing item ids) on first insert.
    async fn save(&self, sale: Sale) -> Result<Sale, StoreError>;

    /// All sales, ascending by id.
    async fn find_all(&self) -> Result<Vec<Sale>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Sale>, StoreError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;

    /// Sales with `start <= timestamp < end`.
    async fn find_by_timestamp_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sale>, StoreError>;
}

#[derive(Debug)]
struct Tables {
    sales: BTreeMap<i64, Sale>,
    next_sale_id: i64,
    next_item_id: i64,
}

/// In-process store for tests and for running without a database.
#[derive(Debug)]
pub struct InMemorySaleStore {
    inner: RwLock<Tables>,
}

impl InMemorySaleStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables {
                sales: BTreeMap::new(),
                next_sale_id: 1,
                next_item_id: 1,
            }),
        }
    }
}

impl Default for InMemorySaleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E>(_: E) -> StoreError {
    StoreError::Unavailable("in-memory sale store lock poisoned".to_string())
}

#[async_trait]
impl SaleStore for InMemorySaleStore {
    async fn save(&self, mut sale: Sale) -> Result<Sale, StoreError> {
        let mut tables = self.inner.write().map_err(poisoned)?;

        let id = match sale.id {
            Some(id) => id,
            None => {
                let id = tables.next_sale_id;
                tables.next_sale_id += 1;
                id
            }
        };
        // Keep the counter ahead of explicitly supplied ids.
        if id >= tables.next_sale_id {
            tables.next_sale_id = id + 1;
        }

        sale.id = Some(id);
        for item in &mut sale.items {
            if item.id.is_none() {
                item.id = Some(tables.next_item_id);
                tables.next_item_id += 1;
            }
        }
        sale.relink_items();

        tables.sales.insert(id, sale.clone());
        Ok(sale)
    }

    async fn find_all(&self) -> Result<Vec<Sale>, StoreError> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(tables.sales.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Sale>, StoreError> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(tables.sales.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(poisoned)?;
        tables.sales.remove(&id);
        Ok(())
    }

    async fn find_by_timestamp_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sale>, StoreError> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(tables
            .sales
            .values()
            .filter(|sale| matches!(sale.timestamp, Some(ts) if ts >= start && ts < end))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::sales_structs::LineItem;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sale_at(ts: NaiveDateTime, price: &str) -> Sale {
        Sale {
            timestamp: Some(ts),
            ..Sale::with_items(vec![LineItem::new(
                "p",
                1,
                BigDecimal::from_str(price).unwrap(),
            )])
        }
    }

    #[actix_web::test]
    async fn save_assigns_ids_and_links_items() {
        let store = InMemorySaleStore::new();
        let saved = store.save(sale_at(at(25, 10), "1.00")).await.unwrap();

        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.items[0].id, Some(1));
        assert_eq!(saved.items[0].sale_id, Some(1));

        let second = store.save(sale_at(at(25, 11), "2.00")).await.unwrap();
        assert_eq!(second.id, Some(2));
        assert_eq!(second.items[0].id, Some(2));
    }

    #[actix_web::test]
    async fn save_with_existing_id_overwrites() {
        let store = InMemorySaleStore::new();
        let mut saved = store.save(sale_at(at(25, 10), "1.00")).await.unwrap();
        saved.items.push(LineItem::new("q", 2, BigDecimal::from(3)));

        let updated = store.save(saved).await.unwrap();
        assert_eq!(updated.id, Some(1));
        assert_eq!(updated.items[0].id, Some(1));
        assert_eq!(updated.items[1].id, Some(2));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn delete_removes_sale_and_items() {
        let store = InMemorySaleStore::new();
        let saved = store.save(sale_at(at(25, 10), "1.00")).await.unwrap();
        let id = saved.id.unwrap();

        store.delete_by_id(id).await.unwrap();
        assert!(store.find_by_id(id).await.unwrap().is_none());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn range_is_half_open() {
        let store = InMemorySaleStore::new();
        store.save(sale_at(at(25, 0), "1.00")).await.unwrap();
        store.save(sale_at(at(25, 23), "2.00")).await.unwrap();
        store.save(sale_at(at(26, 0), "4.00")).await.unwrap();

        let found = store
            .find_by_timestamp_range(at(25, 0), at(26, 0))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().filter_map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[actix_web::test]
    async fn find_all_is_ordered_by_id() {
        let store = InMemorySaleStore::new();
        for h in [9, 3, 5] {
            store.save(sale_at(at(25, h), "1.00")).await.unwrap();
        }
        let ids: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .iter()
            .filter_map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
