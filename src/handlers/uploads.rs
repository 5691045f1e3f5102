use axum::extract::State;

use crate::{
    AppState,
    error::AppError,
    extract::Json,
    models::{PresignedUrlRequest, PresignedUrlResponse},
    storage::upload_key,
};

/// get_presigned_url
///
/// [Public Route] Hands out a 10-minute PUT URL for a registration document. The file never
/// passes through this service; the returned `resource_key` goes into the registration
/// payload.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Presigned URL", body = PresignedUrlResponse),
        (status = 422, description = "File type not allowed for this category"),
        (status = 500, description = "Storage unavailable")
    )
)]
pub async fn get_presigned_url(
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    let content_type = payload.file_type.trim().to_ascii_lowercase();
    if !payload.category.accepts(&content_type) {
        return Err(AppError::validation(format!(
            "{content_type} is not accepted for {}",
            payload.category.prefix()
        )));
    }

    let resource_key = upload_key(payload.category, &payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&resource_key, &content_type)
        .await?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key,
    }))
}
