// src/sales/sales_structs.rs

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::shared::error::{SaleError, SaleResult};

/// Widest product name the `line_items` table accepts.
pub const PRODUCT_NAME_MAX_LEN: usize = 100;
/// Fractional digits kept for unit prices (`NUMERIC(10,2)`).
pub const PRICE_SCALE: i64 = 2;
/// Unit prices must stay below this (`NUMERIC(10,2)` holds at most 99999999.99).
pub const UNIT_PRICE_LIMIT: i64 = 100_000_000;
/// Sale totals must stay below this (`sales.total NUMERIC(12,2)`).
pub const SALE_TOTAL_LIMIT: i64 = 10_000_000_000;

/// One product line within a sale.
///
/// `quantity` and `unit_price` are optional so that an incomplete line can be
/// represented before validation; such a line contributes zero to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: Option<i64>,
    /// Owning sale. A lookup key only; the sale owns its items.
    #[serde(default)]
    pub sale_id: Option<i64>,
    pub product_name: String,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub unit_price: Option<BigDecimal>,
}

impl LineItem {
    pub fn new(product_name: impl Into<String>, quantity: i32, unit_price: BigDecimal) -> Self {
        Self {
            id: None,
            sale_id: None,
            product_name: product_name.into(),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        }
    }

    /// `unit_price × quantity`, or zero when either is missing.
    pub fn subtotal(&self) -> BigDecimal {
        match (&self.unit_price, self.quantity) {
            (Some(price), Some(quantity)) => price * &BigDecimal::from(quantity),
            _ => BigDecimal::from(0),
        }
    }

    /// Checks the line against the constraints of the persisted schema.
    pub fn validate(&self) -> SaleResult<()> {
        let name = self.product_name.trim();
        if name.is_empty() {
            return Err(SaleError::invalid("product_name must not be blank"));
        }
        if name.chars().count() > PRODUCT_NAME_MAX_LEN {
            return Err(SaleError::invalid(format!(
                "product_name '{}' exceeds {} characters",
                name, PRODUCT_NAME_MAX_LEN
            )));
        }

        match self.quantity {
            None => {
                return Err(SaleError::invalid(format!(
                    "quantity is required for '{}'",
                    name
                )))
            }
            Some(q) if q < 1 => {
                return Err(SaleError::invalid(format!(
                    "quantity must be at least 1, got {} for '{}'",
                    q, name
                )))
            }
            Some(_) => {}
        }

        match &self.unit_price {
            None => Err(SaleError::invalid(format!(
                "unit_price is required for '{}'",
                name
            ))),
            Some(price) if *price <= BigDecimal::from(0) => Err(SaleError::invalid(format!(
                "unit_price must be greater than 0, got {} for '{}'",
                price, name
            ))),
            Some(price) if *price >= BigDecimal::from(UNIT_PRICE_LIMIT) => {
                Err(SaleError::invalid(format!(
                    "unit_price {} must be below {} for '{}'",
                    price, UNIT_PRICE_LIMIT, name
                )))
            }
            // with_scale truncates, so any change means extra fractional digits
            Some(price) if price.with_scale(PRICE_SCALE) != *price => {
                Err(SaleError::invalid(format!(
                    "unit_price {} has more than {} decimal places for '{}'",
                    price, PRICE_SCALE, name
                )))
            }
            Some(_) => Ok(()),
        }
    }
}

/// A sales transaction. The total is never stored on the struct; it is always
/// derived from the items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sale {
    #[serde(default)]
    pub id: Option<i64>,
    /// Server-assigned on every write; anything a client sends is overwritten.
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Sale {
    pub fn with_items(items: Vec<LineItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Sum of the item subtotals in order; zero for an empty sale.
    pub fn total(&self) -> BigDecimal {
        self.items
            .iter()
            .fold(BigDecimal::from(0), |acc, item| acc + item.subtotal())
    }

    /// Checks that the derived total fits the `sales.total` column.
    pub fn validate_total(&self) -> SaleResult<()> {
        let total = self.total();
        if total >= BigDecimal::from(SALE_TOTAL_LIMIT) {
            return Err(SaleError::invalid(format!(
                "sale total {} must be below {}",
                total, SALE_TOTAL_LIMIT
            )));
        }
        Ok(())
    }

    /// Points every item back at this sale.
    pub fn relink_items(&mut self) {
        let id = self.id;
        for item in &mut self.items {
            item.sale_id = id;
        }
    }
}

/// Partial update. Only the items can be replaced; timestamp and total are
/// recomputed by the service, so they are deliberately absent here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSale {
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
}

/// Line item as rendered by the API, with its derived subtotal.
#[derive(Debug, Serialize, Deserialize)]
pub struct LineItemResponse {
    pub id: Option<i64>,
    pub sale_id: Option<i64>,
    pub product_name: String,
    pub quantity: Option<i32>,
    pub unit_price: Option<BigDecimal>,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_href: String,
}

/// Sale as rendered by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaleResponse {
    pub id: Option<i64>,
    pub timestamp: Option<NaiveDateTime>,
    pub items: Vec<LineItemResponse>,
    pub total: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub links: Option<Links>,
}

impl SaleResponse {
    pub fn with_self_link(mut self) -> Self {
        if let Some(id) = self.id {
            self.links = Some(Links {
                self_href: format!("/api/sales/{}", id),
            });
        }
        self
    }
}

impl From<Sale> for SaleResponse {
    fn from(sale: Sale) -> Self {
        let total = sale.total();
        SaleResponse {
            id: sale.id,
            timestamp: sale.timestamp,
            items: sale
                .items
                .into_iter()
                .map(|item| LineItemResponse {
                    subtotal: item.subtotal(),
                    id: item.id,
                    sale_id: item.sale_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            total,
            links: None,
        }
    }
}

/// Result of a profit query.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfitResponse {
    pub period: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub total: BigDecimal,
}

#[derive(Debug, Deserialize)]
pub struct ProfitQuery {
    pub period: String,
}
