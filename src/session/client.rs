//! HTTP client for the brochure backend API.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::document::{AgentDetails, Document, Page, PhotoId, Preferences, PropertyDetails};
use crate::error::{EditorError, EditorResult};

/// Per-request deadline for AI generation calls. A page whose generation
/// runs past this falls back to its canned default description.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Session payload from the load endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    /// Serving URLs keyed by photo id; photos in `data` carry ids only.
    #[serde(default)]
    pub photo_urls: HashMap<PhotoId, String>,
    pub data: SessionData,
    #[serde(default)]
    pub preferences: Preferences,
}

/// The document portion of a session payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    pub property: PropertyDetails,
    pub agent: AgentDetails,
    pub photos: Vec<crate::document::Photo>,
    pub pages: Vec<Page>,
}

impl SessionResponse {
    /// Builds the in-memory document, resolving each photo's serving URL
    /// from the session's `photo_urls` map.
    pub fn into_document(self) -> (Document, Preferences) {
        let mut document = Document {
            property: self.data.property,
            agent: self.data.agent,
            photos: self.data.photos,
            pages: self.data.pages,
        };
        for photo in &mut document.photos {
            if let Some(url) = self.photo_urls.get(&photo.id) {
                photo.url = Some(url.clone());
            }
        }
        (document, self.preferences)
    }
}

/// Body for the session save endpoint: the full document plus preferences,
/// replacing whatever the backend holds.
#[derive(Debug, Serialize)]
pub struct SaveSessionRequest<'a> {
    pub property: &'a PropertyDetails,
    pub agent: &'a AgentDetails,
    pub photos: &'a [crate::document::Photo],
    pub pages: &'a [Page],
    pub preferences: &'a Preferences,
}

/// Request body for AI room description generation.
#[derive(Debug, Serialize)]
pub struct GenerateRoomRequest<'a> {
    pub prompt: &'a str,
    pub target_words: u32,
    pub session_id: &'a str,
}

/// Per-session AI usage accounting returned with each generation.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct UsageStats {
    pub edits_count: u32,
    pub edit_limit: u32,
    pub total_cost_usd: f64,
    pub edit_limit_reached: bool,
}

/// Generated room description.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRoomResponse {
    pub text: String,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub usage_stats: Option<UsageStats>,
}

/// Request body for the PDF export endpoints.
#[derive(Debug, Serialize)]
pub struct ExportRequest<'a> {
    pub property: &'a PropertyDetails,
    pub agent: &'a AgentDetails,
    pub pages: &'a [Page],
}

/// API client for brochure session operations.
pub struct SessionClient {
    client: Client,
    base_url: String,
}

impl SessionClient {
    /// Create a new client with the given base URL.
    pub fn new(base_url: &str) -> EditorResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET /api/brochure/session/{id} - Load a session
    pub async fn load_session(&self, session_id: &str) -> EditorResult<SessionResponse> {
        let url = format!("{}/api/brochure/session/{}", self.base_url, session_id);
        let resp = self.client.get(&url).send().await?;

        if resp.status().as_u16() == 404 {
            return Err(EditorError::session_not_found(session_id));
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(EditorError::api(status, message));
        }

        resp.json().await.map_err(Into::into)
    }

    /// PUT /api/brochure/session/{id} - Save the full document
    pub async fn save_session(
        &self,
        session_id: &str,
        document: &Document,
        preferences: &Preferences,
    ) -> EditorResult<()> {
        let url = format!("{}/api/brochure/session/{}", self.base_url, session_id);
        let body = SaveSessionRequest {
            property: &document.property,
            agent: &document.agent,
            photos: &document.photos,
            pages: &document.pages,
            preferences,
        };
        let resp = self.client.put(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(EditorError::api(status, message));
        }

        Ok(())
    }

    /// POST /generate/room - Generate one room description
    pub async fn generate_room(
        &self,
        session_id: &str,
        prompt: &str,
        target_words: u32,
    ) -> EditorResult<GenerateRoomResponse> {
        let url = format!("{}/generate/room", self.base_url);
        let body = GenerateRoomRequest {
            prompt,
            target_words,
            session_id,
        };
        let resp = self
            .client
            .post(&url)
            .timeout(GENERATION_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if resp.status().as_u16() == 429 {
            return Err(EditorError::EditLimitReached);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(EditorError::api(status, message));
        }

        resp.json().await.map_err(Into::into)
    }

    /// POST /export/brochure-pdf - Render the brochure to PDF bytes
    pub async fn export_pdf(&self, document: &Document) -> EditorResult<Vec<u8>> {
        self.export_bytes("/export/brochure-pdf", document).await
    }

    /// POST /api/export/brochure - Export the brochure archive
    pub async fn export_brochure(&self, document: &Document) -> EditorResult<Vec<u8>> {
        self.export_bytes("/api/export/brochure", document).await
    }

    async fn export_bytes(&self, path: &str, document: &Document) -> EditorResult<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        let body = ExportRequest {
            property: &document.property,
            agent: &document.agent,
            pages: &document.pages,
        };
        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(EditorError::api(status, message));
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

// =============================================================================
// TESTS
// =============================================================================
