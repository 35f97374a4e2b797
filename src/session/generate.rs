//! Concurrent AI description generation.
//!
//! Pages that want prose are generated in parallel, one backend request
//! per page. Every page ends up with text no matter what: a request that
//! fails, times out or is skipped falls back to the page type's canned
//! default, so the brochure is never left with an empty description.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::document::{Document, Page, PageId, PropertyDetails};
use crate::error::EditorError;
use crate::session::client::{SessionClient, UsageStats, GENERATION_TIMEOUT};

/// Word budget requested per generated description.
pub const TARGET_WORDS: u32 = 60;

/// Sender half of the skip switch. Flipping it makes every in-flight and
/// not-yet-started generation resolve to its fallback immediately.
pub struct SkipSwitch {
    tx: watch::Sender<bool>,
}

/// Receiver half, cloned into each per-page future.
#[derive(Clone)]
pub struct SkipSignal {
    rx: watch::Receiver<bool>,
}

/// Creates a connected skip switch / signal pair.
pub fn skip_channel() -> (SkipSwitch, SkipSignal) {
    let (tx, rx) = watch::channel(false);
    (SkipSwitch { tx }, SkipSignal { rx })
}

impl SkipSwitch {
    /// Requests that generation stop waiting and use fallbacks.
    pub fn skip(&self) {
        // Send only fails when every receiver is gone, i.e. generation
        // already finished.
        let _ = self.tx.send(true);
    }
}

impl SkipSignal {
    fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes only when skip has been requested. A dropped
    /// [`SkipSwitch`] means skip can never arrive, not that it has.
    async fn requested(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Outcome of one generation pass.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Final text per page, generated or fallback.
    pub descriptions: HashMap<PageId, String>,
    /// Pages that received backend-generated text (vs a fallback).
    pub generated: Vec<PageId>,
    /// Latest usage accounting the backend returned, if any.
    pub usage: Option<UsageStats>,
    /// Set when the backend refused a request with the edit-limit error.
    pub edit_limit_reached: bool,
}

/// Generates descriptions for every page that wants prose and has none
/// yet. Requests run concurrently with a per-request deadline; the whole
/// pass completes even if every request fails.
pub async fn generate_descriptions(
    client: &SessionClient,
    session_id: &str,
    document: &Document,
    skip: SkipSignal,
) -> GenerationReport {
    generate_descriptions_with_deadline(client, session_id, document, skip, GENERATION_TIMEOUT)
        .await
}

/// [`generate_descriptions`] with an explicit per-request deadline.
pub async fn generate_descriptions_with_deadline(
    client: &SessionClient,
    session_id: &str,
    document: &Document,
    skip: SkipSignal,
    deadline: Duration,
) -> GenerationReport {
    let pending: Vec<&Page> = document
        .pages
        .iter()
        .filter(|page| page.page_type.wants_description() && !has_description(page))
        .collect();
    if pending.is_empty() {
        return GenerationReport::default();
    }
    info!(pages = pending.len(), "generating descriptions");

    let futures = pending.iter().map(|page| {
        let mut skip = skip.clone();
        async move {
            let prompt = build_prompt(page, &document.property);
            let outcome = generate_one(client, session_id, &prompt, &mut skip, deadline).await;
            (page, outcome)
        }
    });

    let mut report = GenerationReport::default();
    for (page, outcome) in join_all(futures).await {
        let text = match outcome {
            PageOutcome::Generated { text, usage } => {
                report.generated.push(page.id.clone());
                if usage.is_some() {
                    report.usage = usage;
                }
                text
            }
            PageOutcome::EditLimit => {
                report.edit_limit_reached = true;
                page.page_type.default_description().to_string()
            }
            PageOutcome::Fallback => page.page_type.default_description().to_string(),
        };
        report.descriptions.insert(page.id.clone(), text);
    }
    report
}

enum PageOutcome {
    Generated {
        text: String,
        usage: Option<UsageStats>,
    },
    EditLimit,
    Fallback,
}

async fn generate_one(
    client: &SessionClient,
    session_id: &str,
    prompt: &str,
    skip: &mut SkipSignal,
    deadline: Duration,
) -> PageOutcome {
    if skip.is_set() {
        return PageOutcome::Fallback;
    }

    let request = tokio::time::timeout(
        deadline,
        client.generate_room(session_id, prompt, TARGET_WORDS),
    );
    tokio::select! {
        result = request => match result {
            Ok(Ok(resp)) if !resp.text.trim().is_empty() => PageOutcome::Generated {
                text: resp.text,
                usage: resp.usage_stats,
            },
            Ok(Ok(_)) => {
                warn!("generation returned empty text, using fallback");
                PageOutcome::Fallback
            }
            Ok(Err(EditorError::EditLimitReached)) => {
                warn!("edit limit reached, using fallback");
                PageOutcome::EditLimit
            }
            Ok(Err(err)) => {
                warn!(error = %err, "generation failed, using fallback");
                PageOutcome::Fallback
            }
            Err(_) => {
                warn!("generation timed out, using fallback");
                PageOutcome::Fallback
            }
        },
        _ = skip.requested() => PageOutcome::Fallback,
    }
}

fn has_description(page: &Page) -> bool {
    page.content
        .get("description")
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false)
}

fn build_prompt(page: &Page, property: &PropertyDetails) -> String {
    format!(
        "Write a {} word property brochure description for the \"{}\" section \
         of a {}-bedroom {} at {}.",
        TARGET_WORDS,
        page.title,
        property.bedrooms,
        if property.property_type.is_empty() {
            "property"
        } else {
            &property.property_type
        },
        property.address,
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageType;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn document_with_pages(pages: Vec<Page>) -> Document {
        let mut doc = Document::new();
        doc.property.address = "1 High St".to_string();
        doc.pages = pages;
        doc
    }

    #[tokio::test]
    async fn test_all_pages_get_text_even_when_one_times_out() {
        let server = MockServer::start().await;
        // The slow page's request runs past the deadline.
        Mock::given(method("POST"))
            .and(path("/generate/room"))
            .and(body_partial_json(json!({ "prompt": "Write a 60 word property brochure description for the \"Slow\" section of a 0-bedroom property at 1 High St." })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({ "text": "too late" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/generate/room"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "Generated copy.",
                "word_count": 2
            })))
            .mount(&server)
            .await;

        let doc = document_with_pages(vec![
            Page::new("a", PageType::Content).with_title("Fast one"),
            Page::new("b", PageType::Content).with_title("Slow"),
            Page::new("c", PageType::Content).with_title("Fast two"),
        ]);
        let client = SessionClient::new(&server.uri()).unwrap();
        let (_switch, signal) = skip_channel();
        let report = generate_descriptions_with_deadline(
            &client,
            "sess-1",
            &doc,
            signal,
            Duration::from_millis(300),
        )
        .await;

        assert_eq!(report.descriptions.len(), 3);
        assert_eq!(report.descriptions["a"], "Generated copy.");
        assert_eq!(report.descriptions["c"], "Generated copy.");
        // The timed-out page fell back to its canned default.
        assert_eq!(
            report.descriptions["b"],
            PageType::Content.default_description()
        );
        assert_eq!(report.generated.len(), 2);
    }

    #[tokio::test]
    async fn test_pages_with_existing_text_are_left_alone() {
        let server = MockServer::start().await;
        let doc = document_with_pages(vec![
            Page::new("a", PageType::Overview).with_content("description", "Hand-written."),
            Page::new("cover", PageType::Cover),
        ]);
        let client = SessionClient::new(&server.uri()).unwrap();
        let (_switch, signal) = skip_channel();

        let report = generate_descriptions(&client, "sess-1", &doc, signal).await;
        // No request was ever needed, so the unmocked server is never hit.
        assert!(report.descriptions.is_empty());
    }

    #[tokio::test]
    async fn test_skip_switch_resolves_to_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate/room"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(30))
                    .set_body_json(json!({ "text": "never arrives" })),
            )
            .mount(&server)
            .await;

        let doc = document_with_pages(vec![
            Page::new("a", PageType::Details),
            Page::new("b", PageType::Location),
        ]);
        let client = SessionClient::new(&server.uri()).unwrap();
        let (switch, signal) = skip_channel();
        switch.skip();

        let report = generate_descriptions(&client, "sess-1", &doc, signal).await;
        assert_eq!(
            report.descriptions["a"],
            PageType::Details.default_description()
        );
        assert_eq!(
            report.descriptions["b"],
            PageType::Location.default_description()
        );
        assert!(report.generated.is_empty());
    }

    #[tokio::test]
    async fn test_edit_limit_is_reported_and_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate/room"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let doc = document_with_pages(vec![Page::new("a", PageType::Overview)]);
        let client = SessionClient::new(&server.uri()).unwrap();
        let (_switch, signal) = skip_channel();

        let report = generate_descriptions(&client, "sess-1", &doc, signal).await;
        assert!(report.edit_limit_reached);
        assert_eq!(
            report.descriptions["a"],
            PageType::Overview.default_description()
        );
    }
}
