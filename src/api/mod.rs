// ============================================================================
// HTTP Surface - thin actix-web routing over the components
// ============================================================================

pub mod envelope;
pub mod error;
mod extract;
pub mod handlers;

pub use error::ApiError;
pub use handlers::api_routes;

use actix_web::web;

/// Body, query and path extractor settings: malformed input is a
/// VALIDATION failure in the standard envelope.
pub fn input_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| error::malformed_input(err, req)))
        .app_data(web::QueryConfig::default().error_handler(|err, req| error::malformed_input(err, req)))
        .app_data(web::PathConfig::default().error_handler(|err, req| error::malformed_input(err, req)));
}
