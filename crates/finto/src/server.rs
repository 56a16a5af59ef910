use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use resoconto::client::codes;
use resoconto::types::{
    ConfirmRequest, EditRequest, Envelope, GenerationRequest, Period, Report, ReportBody,
    ReportListBody, ReportStatus, Template,
};

use crate::html;

/// Prefix of every report id handed out
pub const REPORT_ID_PREFIX: &str = "reportid_";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How the simulated generator behaves
#[derive(Debug, Clone)]
pub struct Behaviour {
    /// Time a report stays queued before the worker claims it
    pub queue_delay: Duration,

    /// Time spent in processing
    pub process_delay: Duration,

    /// When set, every generation fails with this reason
    pub fail_reason: Option<String>,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            queue_delay: Duration::from_millis(500),
            process_delay: Duration::from_millis(1500),
            fail_reason: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("bad request")]
    BadRequest,

    #[error("invalid date")]
    InvalidDate,

    #[error("report does not exist")]
    ReportNotExist,

    #[error("invalid report period")]
    InvalidPeriod,

    #[error("invalid report template")]
    InvalidTemplate,

    #[error("report is not ready yet")]
    NotReady,
}

impl ServiceError {
    pub fn code(&self) -> i64 {
        match self {
            ServiceError::BadRequest => codes::BAD_REQUEST,
            ServiceError::InvalidDate => codes::INVALID_DATE,
            ServiceError::ReportNotExist => codes::REPORT_NOT_EXIST,
            ServiceError::InvalidPeriod => codes::INVALID_REPORT_PERIOD,
            ServiceError::InvalidTemplate => codes::INVALID_REPORT_TEMPLATE,
            ServiceError::NotReady => codes::REPORT_NOT_READY,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::ReportNotExist => StatusCode::NOT_FOUND,
            ServiceError::NotReady => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Envelope::<()>::error(self.code(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

/// A report plus the generation it belongs to. Worker updates carrying an
/// older generation are dropped.
#[derive(Debug, Clone)]
struct StoredReport {
    report: Report,
    gen_version: u32,
}

/// Application state shared across requests
pub struct AppState {
    reports: RwLock<Vec<StoredReport>>,
    pub behaviour: Behaviour,
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn report_title(period: Period, start: NaiveDate, end: NaiveDate) -> String {
    match period {
        Period::Week => format!("{start} - {end} weekly report"),
        Period::Month => format!("{} monthly report", start.format("%Y-%m")),
        Period::Year => format!("{} annual report", start.format("%Y")),
    }
}

/// Stand-in for the model output
fn generated_content(report: &Report) -> String {
    match report.template {
        Template::Formal => format!(
            "# {}\n\n## Summary\n\nWork recorded from **{}** to **{}**.\n\n\
             ## Highlights\n\n- Delivered the planned items\n- Reviewed open issues\n\n\
             ## Next steps\n\n1. Review this draft\n2. Confirm it when it reads right",
            report.title, report.start_date, report.end_date
        ),
        Template::Simple => format!(
            "# {}\n\n- Work from {} to {}\n- *Edit before confirming*",
            report.title, report.start_date, report.end_date
        ),
    }
}

impl AppState {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
            behaviour,
        }
    }

    /// Add a report as-is, e.g. to seed a demo or a test
    pub async fn insert(&self, report: Report) {
        self.reports.write().await.push(StoredReport {
            report,
            gen_version: 1,
        });
    }

    pub async fn get(&self, id: &str) -> Option<Report> {
        self.reports
            .read()
            .await
            .iter()
            .find(|s| s.report.id == id)
            .map(|s| s.report.clone())
    }

    /// Reports of one period, newest range first
    pub async fn list(&self, period: Option<Period>) -> Vec<Report> {
        let mut reports: Vec<Report> = self
            .reports
            .read()
            .await
            .iter()
            .filter(|s| period.is_none_or(|p| s.report.period == p))
            .map(|s| s.report.clone())
            .collect();
        reports.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        reports
    }

    /// Create the report for a range, or reset the existing one and start a
    /// new generation of it. Returns the id and the generation number.
    pub async fn enqueue(&self, request: &GenerationRequest) -> (String, u32) {
        let now = timestamp();
        let title = report_title(request.period, request.start_date, request.end_date);
        let mut reports = self.reports.write().await;

        let existing = reports.iter_mut().find(|s| {
            s.report.period == request.period
                && s.report.start_date == request.start_date
                && s.report.end_date == request.end_date
        });

        if let Some(stored) = existing {
            stored.gen_version += 1;
            let report = &mut stored.report;
            report.template = request.template;
            report.title = title;
            report.status = ReportStatus::Queued;
            report.confirmed = false;
            report.content.clear();
            report.failed_reason = None;
            report.updated_at = now;
            return (report.id.clone(), stored.gen_version);
        }

        let id = format!("{REPORT_ID_PREFIX}{}", Uuid::new_v4().simple());
        reports.push(StoredReport {
            report: Report {
                id: id.clone(),
                period: request.period,
                start_date: request.start_date,
                end_date: request.end_date,
                title,
                content: String::new(),
                confirmed: false,
                template: request.template,
                status: ReportStatus::Queued,
                failed_reason: None,
                created_at: now.clone(),
                updated_at: now,
            },
            gen_version: 1,
        });
        (id, 1)
    }

    /// Apply a worker update if `gen_version` is still current
    pub async fn advance(&self, id: &str, gen_version: u32, apply: impl FnOnce(&mut Report)) -> bool {
        let mut reports = self.reports.write().await;
        match reports
            .iter_mut()
            .find(|s| s.report.id == id && s.gen_version == gen_version)
        {
            Some(stored) => {
                apply(&mut stored.report);
                stored.report.updated_at = timestamp();
                true
            }
            None => false,
        }
    }

    /// Apply a user change to a ready report
    async fn update_ready(&self, id: &str, apply: impl FnOnce(&mut Report)) -> Result<(), ServiceError> {
        let mut reports = self.reports.write().await;
        let stored = reports
            .iter_mut()
            .find(|s| s.report.id == id)
            .ok_or(ServiceError::ReportNotExist)?;
        if stored.report.status != ReportStatus::Ready {
            return Err(ServiceError::NotReady);
        }
        apply(&mut stored.report);
        stored.report.updated_at = timestamp();
        Ok(())
    }
}

/// Simulate the queue consumer for one generation
fn spawn_worker(state: Arc<AppState>, id: String, gen_version: u32) {
    tokio::spawn(async move {
        tokio::time::sleep(state.behaviour.queue_delay).await;

        let claimed = state
            .advance(&id, gen_version, |report| report.status = ReportStatus::Processing)
            .await;
        if !claimed {
            debug!(id = %id, gen_version, "Generation superseded before processing");
            return;
        }

        tokio::time::sleep(state.behaviour.process_delay).await;

        let fail_reason = state.behaviour.fail_reason.clone();
        let finished = state
            .advance(&id, gen_version, |report| match fail_reason {
                Some(reason) => {
                    report.status = ReportStatus::Failed;
                    report.failed_reason = Some(reason);
                }
                None => {
                    report.content = generated_content(report);
                    report.status = ReportStatus::Ready;
                }
            })
            .await;

        if finished {
            info!(id = %id, gen_version, "Generation finished");
        } else {
            debug!(id = %id, gen_version, "Generation superseded, result dropped");
        }
    });
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    period_type: String,
    start_date: String,
    end_date: String,
    template: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    period_type: Option<String>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ServiceError::InvalidDate)
}

/// Validate a generation body the way the backend does: period, template,
/// then dates
fn parse_generation(body: &GenerateBody, today: NaiveDate) -> Result<GenerationRequest, ServiceError> {
    let period: Period = body
        .period_type
        .parse()
        .map_err(|_| ServiceError::InvalidPeriod)?;
    let template: Template = body
        .template
        .parse()
        .map_err(|_| ServiceError::InvalidTemplate)?;
    let start = parse_date(&body.start_date)?;
    let end = parse_date(&body.end_date)?;

    let request = GenerationRequest::new(period, start, end, template);
    request.validate(today).map_err(|e| {
        debug!(error = %e, "Rejected generation request");
        ServiceError::InvalidDate
    })?;
    Ok(request)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/v1/reports", get(list_handler))
        .route("/v1/reports/generate", post(generate_handler))
        .route("/v1/reports/edit", post(edit_handler))
        .route("/v1/reports/confirm", post(confirm_handler))
        .route("/v1/reports/{id}", get(report_handler))
        .with_state(state)
}

/// Start the mock backend
pub async fn serve(port: u16, behaviour: Behaviour) -> anyhow::Result<()> {
    info!(
        queue_ms = behaviour.queue_delay.as_millis() as u64,
        process_ms = behaviour.process_delay.as_millis() as u64,
        failing = behaviour.fail_reason.is_some(),
        "Simulated generator configured"
    );
    let state = Arc::new(AppState::new(behaviour));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(url = %format!("http://{addr}/v1"), "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the report overview page
async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let reports = state.list(None).await;
    Html(html::render_page(&reports).into_string())
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Envelope<String>>, ServiceError> {
    let Json(body) = payload.map_err(|_| ServiceError::BadRequest)?;
    let request = parse_generation(&body, Local::now().date_naive())?;

    let (id, gen_version) = state.enqueue(&request).await;
    info!(id = %id, gen_version, key = %request.key(), "Report queued");
    spawn_worker(state, id.clone(), gen_version);

    Ok(Json(Envelope::ok(id)))
}

async fn report_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<ReportBody>>, ServiceError> {
    let report = state.get(&id).await.ok_or(ServiceError::ReportNotExist)?;
    Ok(Json(Envelope::ok(ReportBody { report })))
}

async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Envelope<ReportListBody>>, ServiceError> {
    let period: Period = query
        .period_type
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| ServiceError::InvalidPeriod)?;
    let report_list = state.list(Some(period)).await;
    Ok(Json(Envelope::ok(ReportListBody { report_list })))
}

async fn edit_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<Envelope<()>>, ServiceError> {
    let Json(body) = payload.map_err(|_| ServiceError::BadRequest)?;
    state
        .update_ready(&body.report_id, |report| {
            report.content = body.content.clone();
            report.confirmed = false;
        })
        .await
        .inspect_err(|e| warn!(id = %body.report_id, error = %e, "Edit rejected"))?;
    info!(id = %body.report_id, bytes = body.content.len(), "Report edited");
    Ok(Json(Envelope::ok(())))
}

async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<Json<Envelope<()>>, ServiceError> {
    let Json(body) = payload.map_err(|_| ServiceError::BadRequest)?;
    state
        .update_ready(&body.report_id, |report| report.confirmed = true)
        .await
        .inspect_err(|e| warn!(id = %body.report_id, error = %e, "Confirm rejected"))?;
    info!(id = %body.report_id, "Report confirmed");
    Ok(Json(Envelope::ok(())))
}
