use actix_web::HttpResponse;
use serde::Serialize;

use crate::error::FieldErrors;
use crate::pagination::{Page, PageLinks};

// ============================================================================
// Response Envelope
// ============================================================================
//
//   { "success": true,  "data": ... }
//   { "success": true,  "data": [...], "count", "total", "pagination" }
//   { "success": false, "error": { "message", "fields"? } }
//
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub count: usize,
    pub total: usize,
    pub pagination: PageLinks,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, fields: Option<FieldErrors>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                message: message.into(),
                fields,
            },
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(DataResponse { success: true, data })
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(DataResponse { success: true, data })
}

pub fn page<T: Serialize>(page: Page<T>) -> HttpResponse {
    let pagination = page.links();
    HttpResponse::Ok().json(ListResponse {
        success: true,
        count: page.items.len(),
        total: page.total,
        data: page.items,
        pagination,
    })
}

/// Unpaged list: everything matching is returned at once
pub fn list<T: Serialize>(items: Vec<T>) -> HttpResponse {
    HttpResponse::Ok().json(ListResponse {
        success: true,
        count: items.len(),
        total: items.len(),
        data: items,
        pagination: PageLinks::default(),
    })
}
