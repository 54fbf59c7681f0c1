//! Company handler

use axum::Json;
use portal_types::Organization;

use crate::error::{ApiError, ApiResult};
use crate::extractors::ClientCaller;

/// GET /api/company
///
/// Organization of the signed-in client
pub async fn get_company(caller: ClientCaller) -> ApiResult<Json<Organization>> {
    caller
        .organization
        .map(Json)
        .ok_or(ApiError::MemberNotFound)
}
