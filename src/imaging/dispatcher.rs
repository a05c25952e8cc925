use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::gateway::{Gateway, ImageAnalysis, ImageKind};
use crate::imaging::{summary, ImageUpload, ImagingError, MediaStore};
use crate::store::{self, DbClient, NewImageAnalysis, RecordedImageAnalysis};

/// Where analysed images are recorded
#[async_trait]
pub trait AnalysisRecorder: Send + Sync {
    async fn record_image_analysis(
        &self,
        analysis: &NewImageAnalysis,
    ) -> store::Result<RecordedImageAnalysis>;
}

#[async_trait]
impl AnalysisRecorder for DbClient {
    async fn record_image_analysis(
        &self,
        analysis: &NewImageAnalysis,
    ) -> store::Result<RecordedImageAnalysis> {
        DbClient::record_image_analysis(self, analysis).await
    }
}

/// Result of the auto-classify pipeline
#[derive(Debug, Clone)]
pub struct AnalyzedImage {
    pub session_id: String,
    pub image_path: String,
    pub analysis: ImageAnalysis,
    pub recorded: RecordedImageAnalysis,
}

impl AnalyzedImage {
    pub fn kind(&self) -> ImageKind {
        self.analysis.kind()
    }
}

/// Classifies, extracts, stores and records uploaded images
#[derive(Clone)]
pub struct ImageAnalysisService {
    gateway: Gateway,
    recorder: Arc<dyn AnalysisRecorder>,
    media: MediaStore,
}

impl ImageAnalysisService {
    pub fn new(gateway: Gateway, recorder: Arc<dyn AnalysisRecorder>, media: MediaStore) -> Self {
        Self {
            gateway,
            recorder,
            media,
        }
    }

    /// Analyse an upload and record it in the given (or a new) session
    ///
    /// Nothing is written until the model calls succeed. If recording fails
    /// the saved file is removed again.
    pub async fn analyze_and_record(
        &self,
        upload: &ImageUpload,
        session_id: Option<&str>,
        user_id: Option<&str>,
        health_context: Option<&str>,
    ) -> Result<AnalyzedImage, ImagingError> {
        let mime_type = upload.validate()?;

        let analysis = self
            .gateway
            .analyze_image_auto(&upload.data, Some(&mime_type), health_context)
            .await?;

        let stored = self.media.save(&upload.data, &mime_type).await?;
        let (summary, record) = summary::describe(&analysis);

        let request = NewImageAnalysis {
            session_id: session_id.map(str::to_string),
            user_id: user_id.map(str::to_string),
            image_path: stored.relative_path.clone(),
            summary,
            record,
        };

        let recorded = match self.recorder.record_image_analysis(&request).await {
            Ok(recorded) => recorded,
            Err(e) => {
                warn!(error = %e, path = %stored.relative_path, "Recording image analysis failed");
                self.media.remove(&stored).await;
                return Err(e.into());
            }
        };

        info!(
            session_id = %recorded.session_id,
            kind = ?analysis.kind(),
            image_path = %stored.relative_path,
            "Analysed image"
        );

        Ok(AnalyzedImage {
            session_id: recorded.session_id.clone(),
            image_path: stored.relative_path,
            analysis,
            recorded,
        })
    }
}
