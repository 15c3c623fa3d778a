// src/sales/sales_router.rs

use actix_web::{delete, error::InternalError, get, post, put, web, HttpResponse};

use super::sales_structs::{ProfitQuery, Sale, SaleResponse, UpdateSale};
use crate::shared::error::SaleError;
use crate::shared::shared_structs::GenericResponse;
use crate::AppState;

/// Registers the sale routes. `/profit` goes before `/{id}` so it is not read as an id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Malformed bodies and query strings get the same envelope as service errors.
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(GenericResponse::error(err.to_string()));
        InternalError::from_response(err, response).into()
    });
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(GenericResponse::error(err.to_string()));
        InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .app_data(query_config)
        .service(sales_profit)
        .service(create_sale)
        .service(list_sales)
        .service(get_sale_by_id)
        .service(update_sale)
        .service(delete_sale);
}

/// Creates a sale. Timestamp and total are computed server-side.
///
/// Steps:
/// 1. Deserializes the body; a malformed one is answered by the `JsonConfig` handler.
/// 2. Hands the sale to the service, which validates, stamps and stores it.
/// 3. Answers 201 with the stored sale and its derived total.
#[post("/api/sales")]
pub async fn create_sale(
    data: web::Data<AppState>,
    sale: web::Json<Sale>,
) -> Result<HttpResponse, SaleError> {
    // Client-sent ids and timestamp are dropped by the service
    let created = data.sales.create(sale.into_inner()).await?;

    Ok(HttpResponse::Created().json(GenericResponse::success(
        "Sale created",
        SaleResponse::from(created),
    )))
}

/// Lists every sale in ascending id order, totals included.
#[get("/api/sales")]
pub async fn list_sales(data: web::Data<AppState>) -> Result<HttpResponse, SaleError> {
    let sales: Vec<SaleResponse> = data
        .sales
        .list()
        .await?
        .into_iter()
        .map(SaleResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(GenericResponse::success(
        format!("{} sale(s)", sales.len()),
        sales,
    )))
}

/// Fetches one sale. An unknown id answers 404.
#[get("/api/sales/{id}")]
pub async fn get_sale_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, SaleError> {
    let id = path.into_inner();

    match data.sales.get_by_id(id).await? {
        Some(sale) => Ok(HttpResponse::Ok().json(GenericResponse::success(
            "Sale found",
            SaleResponse::from(sale),
        ))),
        None => Err(SaleError::NotFound(id)),
    }
}

/// Replaces the items of a sale and returns it with a link to itself.
///
/// Steps:
/// 1. Loads the sale; an unknown id answers 404 and nothing is written.
/// 2. Validates the new items, if any. A bad line answers 400 and the stored sale is untouched.
/// 3. Re-stamps the timestamp, recomputes the total and saves.
/// 4. Answers 200 with the sale and its `self` link.
#[put("/api/sales/{id}")]
pub async fn update_sale(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    update: web::Json<UpdateSale>,
) -> Result<HttpResponse, SaleError> {
    let id = path.into_inner();

    // `None` means the id was not found; validation errors come back through `?`
    match data.sales.update(id, update.into_inner()).await? {
        Some(sale) => Ok(HttpResponse::Ok().json(GenericResponse::success(
            "Sale updated",
            SaleResponse::from(sale).with_self_link(),
        ))),
        None => Err(SaleError::NotFound(id)),
    }
}

/// Deletes a sale and its items. An unknown id answers 404.
#[delete("/api/sales/{id}")]
pub async fn delete_sale(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, SaleError> {
    data.sales.delete_by_id(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/sales/profit?period=daily|monthly|annual`
///
/// Steps:
/// 1. Parses the period keyword; an unknown one answers 400 naming the value.
/// 2. Builds the half-open window around the service clock's current time.
/// 3. Sums the totals of the sales inside the window and answers with the bounds.
#[get("/api/sales/profit")]
pub async fn sales_profit(
    data: web::Data<AppState>,
    query: web::Query<ProfitQuery>,
) -> Result<HttpResponse, SaleError> {
    let profit = data.sales.calculate_profit(&query.period).await?;

    Ok(HttpResponse::Ok().json(GenericResponse::success(
        format!("Profit for the {} period", profit.period),
        profit,
    )))
}
