//! Work-journal report client.
//!
//! Drives report generation against the journal backend by polling until a
//! terminal status, and converts report content between the stored markdown
//! dialect and the HTML subset of the rich-text editor.

pub mod client;
pub mod config;
pub mod editor;
pub mod markdown;
pub mod poller;
pub mod store;
pub mod types;

pub use client::{ApiError, HttpClient, ReportApi};
pub use config::{PollConfig, Settings};
pub use editor::{BindingState, EditorBinding, ReportDraft};
pub use markdown::{html_to_markdown, markdown_to_html, normalize_markdown, normalize_rich_text};
pub use poller::{ReportError, ReportPoller};
pub use store::ReportStore;
pub use types::{GenerationRequest, Period, Report, ReportStatus, Template};
