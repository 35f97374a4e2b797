//! Session load and save orchestration.
//!
//! A session can arrive from three places, tried strictly in order:
//! an in-process handoff from the upload flow, the local cache, then the
//! backend. The whole load runs under a hard backstop so a hung backend
//! can never leave the editor on a spinner forever.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::document::{new_id, Document, Page, PageType, Photo, Preferences};
use crate::editor::Editor;
use crate::error::EditorResult;
use crate::session::client::{SessionClient, SessionData};
use crate::session::generate::{generate_descriptions, SkipSignal};

/// Hard ceiling on the whole load sequence. Past it the editor opens on
/// demo defaults instead of waiting.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Interval between auto-save passes.
pub const AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Where the session was actually loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// In-process handoff from the upload flow; backend saves disabled.
    Handoff,
    /// Recovered from the local cache.
    LocalCache,
    /// Fetched from the backend.
    Backend,
    /// Nothing answered within the backstop; demo defaults.
    Fallback,
}

/// Session state handed over in-process by the upload flow.
#[derive(Debug, Clone)]
pub struct HandoffData {
    pub session_id: String,
    pub document: Document,
    pub preferences: Preferences,
}

/// Key/value store for session recovery, the browser's local storage in
/// production and an in-memory map in tests. Implementations must be
/// shareable with the auto-save task, hence the `Send + Sync` bound.
pub trait SessionCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String);
}

/// In-memory [`SessionCache`].
#[derive(Default)]
pub struct MemoryCache {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).cloned()
    }

    fn put(&self, key: &str, value: String) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value);
    }
}

fn cache_key(session_id: &str) -> String {
    format!("brochure_session_{session_id}")
}

/// Cached session payload format.
#[derive(Debug, Serialize, Deserialize)]
struct CachedSession {
    data: SessionData,
    #[serde(default)]
    preferences: Preferences,
}

fn cache_payload(document: &Document, preferences: &Preferences) -> EditorResult<String> {
    let cached = CachedSession {
        data: SessionData {
            property: document.property.clone(),
            agent: document.agent.clone(),
            photos: document.photos.clone(),
            pages: document.pages.clone(),
        },
        preferences: preferences.clone(),
    };
    Ok(serde_json::to_string(&cached)?)
}

/// Load behaviour knobs.
pub struct LoadOptions {
    pub handoff: Option<HandoffData>,
    /// Build a starter page set from analyzed photos when the session has
    /// photos but no pages yet.
    pub auto_generate_pages: bool,
    /// Run AI description generation for pages that want prose.
    pub auto_generate_descriptions: bool,
    /// Signal that aborts description generation in favour of fallbacks.
    pub skip: Option<SkipSignal>,
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            handoff: None,
            auto_generate_pages: true,
            auto_generate_descriptions: true,
            skip: None,
            timeout: LOAD_TIMEOUT,
        }
    }
}

/// Loads a session and returns an initialized editor, with its baseline
/// history snapshot recorded and the dirty flag clear.
pub async fn load(
    session_id: &str,
    client: &SessionClient,
    cache: &dyn SessionCache,
    options: LoadOptions,
) -> EditorResult<(Editor, LoadSource)> {
    let LoadOptions {
        handoff,
        auto_generate_pages,
        auto_generate_descriptions,
        skip,
        timeout,
    } = options;

    let sequence = async {
        let (mut document, preferences, source) =
            resolve_source(session_id, client, cache, handoff).await?;

        if auto_generate_pages && !document.photos.is_empty() && document.pages.is_empty() {
            generate_pages_from_photos(&mut document);
            info!(pages = document.pages.len(), "generated starter pages");
        }

        let descriptions = if auto_generate_descriptions {
            let signal = skip.unwrap_or_else(|| crate::session::generate::skip_channel().1);
            Some(generate_descriptions(client, session_id, &document, signal).await)
        } else {
            None
        };

        EditorResult::Ok((document, preferences, source, descriptions))
    };

    let (document, preferences, source, descriptions) =
        match tokio::time::timeout(timeout, sequence).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("session load exceeded backstop, opening demo defaults");
                (demo_document(), Preferences::default(), LoadSource::Fallback, None)
            }
        };

    let mut editor = Editor::new(document, preferences);
    if source == LoadSource::Handoff {
        editor.disable_saves();
    }
    if let Some(report) = descriptions {
        // Applied before the baseline snapshot so undo bottoms out on the
        // generated brochure, not on empty pages.
        for (page_id, text) in report.descriptions {
            let _ = editor.apply_description(&page_id, text);
        }
    }
    editor.initialize();
    info!(session = session_id, source = ?source, "session loaded");
    Ok((editor, source))
}

async fn resolve_source(
    session_id: &str,
    client: &SessionClient,
    cache: &dyn SessionCache,
    handoff: Option<HandoffData>,
) -> EditorResult<(Document, Preferences, LoadSource)> {
    if let Some(handoff) = handoff {
        if handoff.session_id == session_id {
            return Ok((handoff.document, handoff.preferences, LoadSource::Handoff));
        }
        warn!(
            expected = session_id,
            got = %handoff.session_id,
            "handoff session id mismatch, ignoring"
        );
    }

    if let Some(raw) = cache.get(&cache_key(session_id)) {
        match serde_json::from_str::<CachedSession>(&raw) {
            Ok(cached) => {
                let document = Document {
                    property: cached.data.property,
                    agent: cached.data.agent,
                    photos: cached.data.photos,
                    pages: cached.data.pages,
                };
                return Ok((document, cached.preferences, LoadSource::LocalCache));
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable cached session");
            }
        }
    }

    let response = client.load_session(session_id).await?;
    let (document, preferences) = response.into_document();
    if let Ok(payload) = cache_payload(&document, &preferences) {
        cache.put(&cache_key(session_id), payload);
    }
    Ok((document, preferences, LoadSource::Backend))
}

/// Builds a starter page set from analyzed photos: a cover led by the
/// highest-impact photo, an overview, one content page per room type, and
/// a closing gallery of everything.
pub fn generate_pages_from_photos(document: &mut Document) {
    let mut by_impact: Vec<&Photo> = document.photos.iter().collect();
    by_impact.sort_by(|a, b| {
        b.impact_score
            .unwrap_or(0.0)
            .total_cmp(&a.impact_score.unwrap_or(0.0))
    });
    let hero = by_impact.first().map(|p| p.id.clone());

    let mut pages = Vec::new();
    let mut cover = Page::new(new_id(), PageType::Cover);
    if let Some(hero) = hero {
        cover.photos.push(hero);
    }
    pages.push(cover);

    let mut overview = Page::new(new_id(), PageType::Overview);
    overview.photos = by_impact.iter().take(3).map(|p| p.id.clone()).collect();
    pages.push(overview);

    // One content page per room type, alphabetical for a stable order.
    let mut rooms: Vec<(String, Vec<String>)> = Vec::new();
    for photo in &document.photos {
        let Some(room) = photo.room_type.clone() else {
            continue;
        };
        match rooms.iter_mut().find(|(name, _)| *name == room) {
            Some((_, ids)) => ids.push(photo.id.clone()),
            None => rooms.push((room, vec![photo.id.clone()])),
        }
    }
    rooms.sort_by(|a, b| a.0.cmp(&b.0));
    for (room, photo_ids) in rooms {
        let mut page = Page::new(new_id(), PageType::Content).with_title(title_case(&room));
        page.photos = photo_ids;
        pages.push(page);
    }

    let mut gallery = Page::new(new_id(), PageType::Gallery);
    gallery.photos = document.photos.iter().map(|p| p.id.clone()).collect();
    pages.push(gallery);

    document.pages = pages;
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Demo document shown when no load source answers in time.
fn demo_document() -> Document {
    let mut document = Document::new();
    document.property.address = "Sample Property".to_string();
    document.pages.push(Page::new(new_id(), PageType::Cover));
    document.pages.push(Page::new(new_id(), PageType::Overview));
    document
}

// =============================================================================
// SAVE
// =============================================================================

/// What a save pass actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Document was clean; nothing touched.
    Clean,
    /// Persisted to the backend (and the local cache).
    Saved,
    /// Handoff session: cached locally, backend untouched.
    MemoryOnly,
}

/// Persists the session if it is dirty. DOM edits are reconciled into the
/// model first, so the saved document always matches what is on screen.
/// On backend failure the dirty flag is preserved and the next pass
/// retries.
pub async fn save(
    editor: &mut Editor,
    client: &SessionClient,
    cache: &dyn SessionCache,
    session_id: &str,
) -> EditorResult<SaveOutcome> {
    if !editor.is_dirty() {
        return Ok(SaveOutcome::Clean);
    }

    editor.extract();
    if let Ok(payload) = cache_payload(editor.document(), editor.preferences()) {
        cache.put(&cache_key(session_id), payload);
    }

    if editor.saves_disabled() {
        editor.mark_saved();
        return Ok(SaveOutcome::MemoryOnly);
    }

    client
        .save_session(session_id, editor.document(), editor.preferences())
        .await?;
    editor.mark_saved();
    Ok(SaveOutcome::Saved)
}

// =============================================================================
// AUTO-SAVE
// =============================================================================

/// Background auto-save loop. Dirty-gated: a pass where nothing changed
/// costs no network traffic. Dropping or stopping the handle tears the
/// loop down.
pub struct AutoSave {
    handle: JoinHandle<()>,
}

impl AutoSave {
    /// Spawns the auto-save loop on the current runtime.
    pub fn start(
        editor: Arc<Mutex<Editor>>,
        client: Arc<SessionClient>,
        cache: Arc<dyn SessionCache + Send + Sync>,
        session_id: String,
    ) -> Self {
        Self::with_interval(editor, client, cache, session_id, AUTO_SAVE_INTERVAL)
    }

    /// [`AutoSave::start`] with an explicit tick interval.
    pub fn with_interval(
        editor: Arc<Mutex<Editor>>,
        client: Arc<SessionClient>,
        cache: Arc<dyn SessionCache + Send + Sync>,
        session_id: String,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The immediate first tick would save a just-loaded session.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut editor = editor.lock().await;
                match save(&mut editor, &client, cache.as_ref(), &session_id).await {
                    Ok(SaveOutcome::Saved) => info!("auto-saved session"),
                    Ok(_) => {}
                    Err(err) => error!(error = %err, "auto-save failed, will retry"),
                }
            }
        });
        Self { handle }
    }

    /// Stops the loop.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for AutoSave {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// TESTS
// =============================================================================
