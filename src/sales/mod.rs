// src/sales/mod.rs

pub mod period;
pub mod postgres_store;
pub mod sales_router;
pub mod sales_service;
pub mod sales_store;
pub mod sales_structs;
