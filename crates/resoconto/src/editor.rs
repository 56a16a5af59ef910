//! Synchronisation between stored report content and a rich-text surface.
//!
//! The surface speaks HTML, storage speaks markdown. Updates flow both ways
//! and each side echoes what the other pushes, so the binding tracks which
//! direction is in flight to stop feedback loops.

use tracing::debug;

use crate::markdown::{normalize_markdown, normalize_rich_text};
use crate::store::ReportStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingState {
    #[default]
    Idle,
    /// Stored content was pushed to the surface; its echo is pending
    ApplyingExternal,
    /// A local edit was emitted as markdown; its echo is pending
    EmittingLocal,
}

#[derive(Debug, Default)]
pub struct EditorBinding {
    state: BindingState,
    surface_html: String,
    last_emitted: Option<String>,
}

impl EditorBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    /// HTML currently shown on the surface
    pub fn surface_html(&self) -> &str {
        &self.surface_html
    }

    /// A stored value arrived. Returns the HTML to push to the surface, or
    /// `None` when the surface is already up to date.
    pub fn set_external(&mut self, stored: &str) -> Option<String> {
        if self.state == BindingState::EmittingLocal
            && self.last_emitted.as_deref() == Some(normalize_markdown(stored).as_str())
        {
            debug!("Acknowledged echo of local edit");
            self.state = BindingState::Idle;
            self.last_emitted = None;
            return None;
        }

        let html = normalize_rich_text(stored);
        if html == self.surface_html {
            self.state = BindingState::Idle;
            return None;
        }

        self.state = BindingState::ApplyingExternal;
        self.surface_html = html.clone();
        Some(html)
    }

    /// The surface reported its content. Returns the markdown to store when
    /// this is a local edit, `None` when it is the echo of an external push.
    pub fn on_surface_update(&mut self, html: &str) -> Option<String> {
        if self.state == BindingState::ApplyingExternal && html == self.surface_html {
            self.state = BindingState::Idle;
            return None;
        }

        let markdown = normalize_markdown(html);
        self.surface_html = html.to_string();
        self.state = BindingState::EmittingLocal;
        self.last_emitted = Some(markdown.clone());
        Some(markdown)
    }
}

/// Editing session for one report.
///
/// A local edit clears the report's confirmation in the store right away and
/// keeps the markdown that a later confirm persists.
pub struct ReportDraft {
    report_id: String,
    store: ReportStore,
    binding: EditorBinding,
    markdown: Option<String>,
}

impl ReportDraft {
    pub fn new(store: ReportStore, report_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            store,
            binding: EditorBinding::new(),
            markdown: None,
        }
    }

    /// Load stored content into the surface
    pub fn load(&mut self, stored: &str) -> Option<String> {
        self.binding.set_external(stored)
    }

    /// Handle a surface update. Returns true if it was a local edit.
    pub async fn on_surface_update(&mut self, html: &str) -> bool {
        let Some(markdown) = self.binding.on_surface_update(html) else {
            return false;
        };
        self.markdown = Some(markdown);
        self.store.mark_unconfirmed(&self.report_id).await;
        true
    }

    /// Markdown of the pending local edit, if any
    pub fn markdown(&self) -> Option<&str> {
        self.markdown.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Period, Report, ReportStatus, Template};
    use chrono::NaiveDate;

    fn confirmed_report(id: &str) -> Report {
        Report {
            id: id.to_string(),
            period: Period::Week,
            start_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 7).unwrap(),
            title: "Week 49".to_string(),
            content: "# Done\n\n- tests".to_string(),
            confirmed: true,
            template: Template::Simple,
            status: ReportStatus::Ready,
            failed_reason: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_external_value_is_pushed_once() {
        let mut binding = EditorBinding::new();

        let html = binding.set_external("# Done").unwrap();
        assert_eq!(html, "<h1>Done</h1>");
        assert_eq!(binding.state(), BindingState::ApplyingExternal);

        // Surface echoes what it was given
        assert_eq!(binding.on_surface_update(&html), None);
        assert_eq!(binding.state(), BindingState::Idle);

        // Same value again is a no-op
        assert_eq!(binding.set_external("# Done"), None);
        assert_eq!(binding.state(), BindingState::Idle);
    }

    #[test]
    fn test_local_edit_is_emitted_as_markdown() {
        let mut binding = EditorBinding::new();
        binding.set_external("# Done");
        binding.on_surface_update("<h1>Done</h1>");

        let markdown = binding
            .on_surface_update("<h1>Done</h1><p><strong>more</strong></p>")
            .unwrap();
        assert_eq!(markdown, "# Done\n\n**more**");
        assert_eq!(binding.state(), BindingState::EmittingLocal);

        // Storage echoes the emitted value back
        assert_eq!(binding.set_external(&markdown), None);
        assert_eq!(binding.state(), BindingState::Idle);
    }

    #[test]
    fn test_external_change_during_local_edit_wins() {
        let mut binding = EditorBinding::new();
        binding.on_surface_update("<p>local</p>");
        assert_eq!(binding.state(), BindingState::EmittingLocal);

        let html = binding.set_external("remote").unwrap();
        assert_eq!(html, "<p>remote</p>");
        assert_eq!(binding.state(), BindingState::ApplyingExternal);
    }

    #[test]
    fn test_differing_update_while_applying_is_local() {
        let mut binding = EditorBinding::new();
        binding.set_external("a");
        assert!(binding.on_surface_update("<p>b</p>").is_some());
        assert_eq!(binding.state(), BindingState::EmittingLocal);
    }

    #[test]
    fn test_stored_html_is_shown_as_is() {
        let mut binding = EditorBinding::new();
        assert_eq!(
            binding.set_external("<p>legacy html</p>").as_deref(),
            Some("<p>legacy html</p>")
        );
    }

    #[tokio::test]
    async fn test_local_edit_clears_confirmation() {
        let store = ReportStore::new();
        let report = confirmed_report("r1");
        store.merge(report.clone()).await;

        let mut draft = ReportDraft::new(store.clone(), "r1");
        let html = draft.load(&report.content).unwrap();

        // Loading and its echo leave confirmation alone
        assert!(!draft.on_surface_update(&html).await);
        assert!(store.get("r1").await.unwrap().confirmed);
        assert_eq!(draft.markdown(), None);

        assert!(draft.on_surface_update("<h1>Done</h1><ul><li>tests</li><li>docs</li></ul>").await);
        assert!(!store.get("r1").await.unwrap().confirmed);
        assert_eq!(draft.markdown(), Some("# Done\n\n- tests\n- docs"));
    }
}
