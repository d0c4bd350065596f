use actix_web::HttpResponse;
use serde::Serialize;

use crate::listing::Listing;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// `{"status": "success", "length": n, "data": [...]}`
pub fn list_response<T: Serialize>(items: &[T]) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "length": items.len(),
        "data": items
    }))
}

/// Same envelope as [`list_response`], with an explicit message when the
/// filtered list came back empty.
pub fn listing_response<T: Serialize>(listing: &Listing<T>) -> HttpResponse {
    match listing {
        Listing::Items(items) => list_response(items),
        Listing::Empty { message } => HttpResponse::Ok().json(serde_json::json!({
            "status": "empty",
            "length": 0,
            "data": [],
            "message": message
        })),
    }
}

/// `{"status": "success", "data": value}`
pub fn data_response<T: Serialize>(value: &T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "data": value
    }))
}

pub fn created_response<T: Serialize>(value: &T) -> HttpResponse {
    HttpResponse::Created().json(serde_json::json!({
        "status": "success",
        "data": value
    }))
}
