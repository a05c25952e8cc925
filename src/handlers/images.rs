// Image analysis handlers (multipart field `image`)

use bytes::{BufMut, BytesMut};
use futures_util::TryStreamExt;
use std::convert::Infallible;
use tracing::{error, info};
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::Reply;

use crate::error::ApiError;
use crate::imaging::ImageUpload;
use crate::models::{AnalysisBody, AnalysisResponse, AnalyzeImageResponse, ImageQuery};
use crate::state::AppState;

const IMAGE_FIELD: &str = "image";

/// Pull the `image` part out of a multipart body
pub async fn read_image(form: FormData) -> Result<ImageUpload, ApiError> {
    pin_utils::pin_mut!(form);

    while let Some(part) = form
        .try_next()
        .await
        .map_err(|e| {
            ApiError::bad_request("Invalid multipart body").with_technical_message(e.to_string())
        })?
    {
        if part.name() == IMAGE_FIELD {
            return read_part(part).await;
        }
    }

    Err(ApiError::bad_request("Missing image file"))
}

async fn read_part(part: Part) -> Result<ImageUpload, ApiError> {
    let content_type = part.content_type().map(str::to_string);
    let filename = part.filename().map(str::to_string);

    let stream = part.stream();
    pin_utils::pin_mut!(stream);

    let mut data = BytesMut::new();
    while let Some(chunk) = stream
        .try_next()
        .await
        .map_err(|e| {
            ApiError::bad_request("Failed to read upload").with_technical_message(e.to_string())
        })?
    {
        data.put(chunk);
    }

    Ok(ImageUpload {
        data: data.freeze(),
        content_type,
        filename,
    })
}

/// POST /api/ai/analyze-glucose
pub async fn analyze_glucose_handler(
    form: FormData,
    state: AppState,
) -> Result<Response, Infallible> {
    let upload = match read_image(form).await {
        Ok(upload) => upload,
        Err(e) => return Ok(e.into_response()),
    };
    info!(bytes = upload.data.len(), "POST /api/ai/analyze-glucose");

    let result = match upload.validate() {
        Ok(mime) => state
            .gateway
            .analyze_glucose_image(&upload.data, Some(&mime))
            .await
            .map_err(ApiError::from),
        Err(e) => Err(ApiError::from(e)),
    };

    Ok(match result {
        Ok(reading) => warp::reply::json(
            &AnalysisResponse {
                success: true,
                body: AnalysisBody::from(reading),
            }
            .to_json(),
        )
        .into_response(),
        Err(e) => {
            error!(code = e.code, error = %e.message, "Glucose analysis failed");
            e.into_response()
        }
    })
}

/// POST /api/ai/analyze-food?health_context=
pub async fn analyze_food_handler(
    query: ImageQuery,
    form: FormData,
    state: AppState,
) -> Result<Response, Infallible> {
    let upload = match read_image(form).await {
        Ok(upload) => upload,
        Err(e) => return Ok(e.into_response()),
    };
    info!(bytes = upload.data.len(), "POST /api/ai/analyze-food");

    let result = match upload.validate() {
        Ok(mime) => state
            .gateway
            .analyze_food_image(&upload.data, Some(&mime), query.health_context.as_deref())
            .await
            .map_err(ApiError::from),
        Err(e) => Err(ApiError::from(e)),
    };

    Ok(match result {
        Ok(meal) => warp::reply::json(
            &AnalysisResponse {
                success: true,
                body: AnalysisBody::from(meal),
            }
            .to_json(),
        )
        .into_response(),
        Err(e) => {
            error!(code = e.code, error = %e.message, "Food analysis failed");
            e.into_response()
        }
    })
}

/// POST /api/ai/analyze-image?health_context=&chat_id=&user_id=
pub async fn analyze_image_handler(
    query: ImageQuery,
    form: FormData,
    state: AppState,
) -> Result<Response, Infallible> {
    let upload = match read_image(form).await {
        Ok(upload) => upload,
        Err(e) => return Ok(e.into_response()),
    };
    info!(
        bytes = upload.data.len(),
        chat_id = ?query.chat_id,
        user_id = ?query.user_id,
        "POST /api/ai/analyze-image"
    );

    let result = state
        .images
        .analyze_and_record(
            &upload,
            query.chat_id.as_deref().filter(|id| !id.trim().is_empty()),
            query.user_id.as_deref().filter(|id| !id.trim().is_empty()),
            query.health_context.as_deref(),
        )
        .await;

    Ok(match result {
        Ok(analyzed) => warp::reply::json(&AnalyzeImageResponse {
            success: true,
            chat_id: analyzed.session_id,
            image_path: analyzed.image_path,
            body: AnalysisBody::from(analyzed.analysis),
        })
        .into_response(),
        Err(e) => {
            let e = ApiError::from(e);
            error!(code = e.code, error = %e.message, "Image analysis failed");
            e.into_response()
        }
    })
}
