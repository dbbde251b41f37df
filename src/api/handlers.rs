use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Session;
use crate::domain::consignment::{
    ConsignmentFilter, ConsignmentStatus, CreateConsignmentRequest, PaymentMethod, UpdateConsignmentRequest,
    UpdateStatusRequest,
};
use crate::domain::pickup::{CreatePickupRequest, UpdatePickupRequest, UpdatePickupStatusRequest};
use crate::domain::queue::AssignTruckRequest;
use crate::error::DomainError;
use crate::pagination::PageRequest;
use super::envelope;
use super::error::ApiError;

type ApiResult = Result<HttpResponse, ApiError>;

// ============================================================================
// Consignments
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ConsignmentQuery {
    pub branch: Option<Uuid>,
    pub origin: Option<Uuid>,
    pub destination: Option<Uuid>,
    pub sender: Option<Uuid>,
    pub recipient: Option<Uuid>,
    pub status: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub number: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ConsignmentQuery {
    fn into_filter(self) -> Result<ConsignmentFilter, DomainError> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ConsignmentStatus>)
            .transpose()
            .map_err(|e| DomainError::invalid_field("status", e.to_string()))?;

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(DomainError::invalid_field("end", "must not be before start"));
            }
        }

        Ok(ConsignmentFilter {
            branch_id: self.branch,
            origin_branch_id: self.origin,
            destination_branch_id: self.destination,
            sender_id: self.sender,
            recipient_id: self.recipient,
            status,
            payment_method: self.payment_method,
            number: self.number.filter(|n| !n.trim().is_empty()),
            start: self.start,
            end: self.end,
        })
    }
}

async fn create_consignment(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateConsignmentRequest>,
) -> ApiResult {
    let record = state.consignments.create(body.into_inner(), &session).await?;
    Ok(envelope::created(record))
}

async fn list_consignments(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<ConsignmentQuery>,
) -> ApiResult {
    let query = query.into_inner();
    let page = PageRequest::new(query.page, query.limit, state.default_limit);
    let filter = query.into_filter()?;

    let records = state.consignments.list(filter, page, &session).await?;
    Ok(envelope::page(records))
}

async fn get_consignment(state: web::Data<AppState>, session: Session, id: web::Path<Uuid>) -> ApiResult {
    let record = state.consignments.get(id.into_inner(), &session).await?;
    Ok(envelope::ok(record))
}

async fn update_consignment(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
    body: web::Json<UpdateConsignmentRequest>,
) -> ApiResult {
    let record = state
        .consignments
        .update(id.into_inner(), body.into_inner(), &session)
        .await?;
    Ok(envelope::ok(record))
}

async fn update_consignment_status(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> ApiResult {
    let record = state
        .consignments
        .update_status(id.into_inner(), body.into_inner(), &session)
        .await?;
    Ok(envelope::ok(record))
}

/// Public: no session required
async fn track_consignment(state: web::Data<AppState>, number: web::Path<String>) -> ApiResult {
    let summary = state.consignments.track_by_number(&number).await?;
    Ok(envelope::ok(summary))
}

// ============================================================================
// Pickups
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct BranchQuery {
    pub branch: Option<Uuid>,
}

async fn create_pickup(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreatePickupRequest>,
) -> ApiResult {
    let record = state.pickups.create(body.into_inner(), &session).await?;
    Ok(envelope::created(record))
}

async fn list_pending_pickups(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<BranchQuery>,
) -> ApiResult {
    let records = state.pickups.list_pending(query.branch, &session).await?;
    Ok(envelope::list(records))
}

async fn update_pickup(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
    body: web::Json<UpdatePickupRequest>,
) -> ApiResult {
    let record = state.pickups.update(id.into_inner(), body.into_inner(), &session).await?;
    Ok(envelope::ok(record))
}

async fn update_pickup_status(
    state: web::Data<AppState>,
    session: Session,
    id: web::Path<Uuid>,
    body: web::Json<UpdatePickupStatusRequest>,
) -> ApiResult {
    let record = state
        .pickups
        .update_status(id.into_inner(), body.into_inner(), &session)
        .await?;
    Ok(envelope::ok(record))
}

async fn delete_pickup(state: web::Data<AppState>, session: Session, id: web::Path<Uuid>) -> ApiResult {
    let id = id.into_inner();
    state.pickups.delete(id, &session).await?;
    Ok(envelope::ok(serde_json::json!({ "id": id })))
}

// ============================================================================
// Queue & Customers
// ============================================================================

async fn list_assignable(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<BranchQuery>,
) -> ApiResult {
    let records = state.queue.list_assignable(query.branch, &session).await?;
    Ok(envelope::list(records))
}

async fn assign_truck(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<AssignTruckRequest>,
) -> ApiResult {
    let record = state.queue.assign(body.into_inner(), &session).await?;
    Ok(envelope::ok(record))
}

async fn get_truck_assignment(
    state: web::Data<AppState>,
    session: Session,
    consignment_id: web::Path<Uuid>,
) -> ApiResult {
    let assignment = state.queue.assignment(consignment_id.into_inner(), &session).await?;
    Ok(envelope::ok(assignment))
}

async fn delete_customer(state: web::Data<AppState>, session: Session, id: web::Path<Uuid>) -> ApiResult {
    let id = id.into_inner();
    state.customers.delete_customer(id, &session).await?;
    Ok(envelope::ok(serde_json::json!({ "id": id })))
}

/// Mount every `/api/v1` route. Expects `web::Data<AppState>` as app data.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::resource("/consignments")
                    .route(web::post().to(create_consignment))
                    .route(web::get().to(list_consignments)),
            )
            .service(
                web::resource("/consignments/{id}")
                    .route(web::get().to(get_consignment))
                    .route(web::put().to(update_consignment)),
            )
            .route("/consignments/{id}/status", web::put().to(update_consignment_status))
            .route("/tracking/{number}", web::get().to(track_consignment))
            .service(
                web::resource("/pickups")
                    .route(web::post().to(create_pickup))
                    .route(web::get().to(list_pending_pickups)),
            )
            .service(
                web::resource("/pickups/{id}")
                    .route(web::put().to(update_pickup))
                    .route(web::delete().to(delete_pickup)),
            )
            .route("/pickups/{id}/status", web::put().to(update_pickup_status))
            .route("/queue/assignable", web::get().to(list_assignable))
            .route("/queue/assignments", web::post().to(assign_truck))
            .route("/queue/assignments/{consignment_id}", web::get().to(get_truck_assignment))
            .route("/customers/{id}", web::delete().to(delete_customer)),
    );
}
