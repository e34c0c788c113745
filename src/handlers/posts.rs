use std::str::FromStr;

use actix_web::{web, HttpResponse};
use alloy_primitives::Address;

use crate::feed;
use crate::settings::Settings;

/// `GET /posts`: the reconciled global feed, fixtures included when the
/// chain is unreachable (the `source` field says which).
pub async fn list_all(settings: web::Data<Settings>) -> HttpResponse {
    let settings = settings.clone();
    match web::block(move || feed::global_feed(&settings)).await {
        Ok(feed) => HttpResponse::Ok().json(feed),
        Err(e) => {
            error!("global feed worker failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// `GET /posts/{address}`: one account's posts, empty on read failure.
pub async fn list_by_author(
    settings: web::Data<Settings>,
    path: web::Path<String>,
) -> HttpResponse {
    let raw = path.into_inner();
    let address = match Address::from_str(&raw) {
        Ok(address) => address,
        Err(_) => return HttpResponse::BadRequest().body(format!("invalid address: {}", raw)),
    };

    let settings = settings.clone();
    match web::block(move || feed::personal_feed(&settings, &address)).await {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(e) => {
            error!("personal feed worker failed: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
