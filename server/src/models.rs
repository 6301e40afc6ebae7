use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The full identifier -> original URL dataset, persisted as one JSON object.
pub type MappingTable = HashMap<String, String>;

/// Body of `POST /api/shorten`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShrinkRequest {
    pub url: String,
}

/// Response of `POST /api/shorten`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShrinkResult {
    pub result: String,
}
