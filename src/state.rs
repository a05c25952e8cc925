//! Shared handles passed to every handler

use std::sync::Arc;

use crate::gateway::Gateway;
use crate::imaging::ImageAnalysisService;
use crate::store::DbClient;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub db: DbClient,
    pub images: ImageAnalysisService,
    pub app_name: Arc<str>,
    pub app_version: Arc<str>,
}
