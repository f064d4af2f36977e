use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};

use crate::{error::Result, model::RawSearchRequest, service::SearchService};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Room for a form selecting every cuisine the facet can offer
pub const MAX_PAYLOAD_BYTES: usize = 256 * 1024;

pub async fn search(
    req: HttpRequest,
    body: web::Bytes,
    service: web::Data<SearchService>,
) -> Result<HttpResponse> {
    let raw = if req.content_type() == FORM_CONTENT_TYPE {
        RawSearchRequest::from_form(&body)?
    } else {
        RawSearchRequest::from_json(&body)?
    };

    let result = service.search(raw).await?;

    Ok(HttpResponse::Ok().json(result))
}

pub async fn index_info(service: web::Data<SearchService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.overview().await?))
}

pub async fn health(service: web::Data<SearchService>) -> HttpResponse {
    HttpResponse::Ok().json(service.health().await)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::default().limit(MAX_PAYLOAD_BYTES))
        .service(web::resource("/search").route(web::post().to(search)))
        .service(web::resource("/info").route(web::get().to(index_info)))
        .service(web::resource("/health").route(web::get().to(health)));
}
