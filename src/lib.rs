// src/lib.rs

//! Sales recording service: sales made of line items, with totals always
//! derived from the items, and profit queries over calendar windows.

pub mod sales;
pub mod shared;

use sales::sales_service::SaleService;

/// State shared by every route.
pub struct AppState {
    pub sales: SaleService,
}
