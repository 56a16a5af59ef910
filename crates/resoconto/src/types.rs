use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reason reported when the backend marks a report failed without saying why
pub const DEFAULT_FAILURE_REASON: &str = "report generation failed";

/// Time span a report summarizes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            other => Err(format!("unknown report period: {other}")),
        }
    }
}

/// Layout used by the generator, fixed for the lifetime of a report instance
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Formal,
    Simple,
}

impl Template {
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Formal => "formal",
            Template::Simple => "simple",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Template::Formal),
            "simple" => Ok(Template::Simple),
            other => Err(format!("unknown report template: {other}")),
        }
    }
}

/// Generation status of a report.
///
/// ```text
/// queued -> processing -> ready
/// queued -> processing -> failed
/// queued -> failed
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Queued,
    Processing,
    Ready,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Queued => "queued",
            ReportStatus::Processing => "processing",
            ReportStatus::Ready => "ready",
            ReportStatus::Failed => "failed",
        }
    }

    /// `ready` and `failed` end a generation
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Ready | ReportStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            ReportStatus::Queued => 0,
            ReportStatus::Processing => 1,
            ReportStatus::Ready | ReportStatus::Failed => 2,
        }
    }

    /// Whether observing `next` after `self` is a legal move.
    ///
    /// Polling can miss intermediate states, so any forward step is accepted
    /// (`queued -> ready` is fine). Leaving a terminal state or moving
    /// backwards is not.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report snapshot as returned by a single fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    /// Opaque identifier, stable across status transitions
    #[serde(rename = "report_id")]
    pub id: String,

    #[serde(rename = "period_type")]
    pub period: Period,

    /// Inclusive range start (YYYY-MM-DD)
    pub start_date: NaiveDate,

    /// Inclusive range end (YYYY-MM-DD)
    pub end_date: NaiveDate,

    pub title: String,

    /// Body in the constrained markdown dialect
    #[serde(default)]
    pub content: String,

    /// User-asserted finality, only meaningful once the report is ready
    #[serde(default)]
    pub confirmed: bool,

    #[serde(default)]
    pub template: Template,

    pub status: ReportStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,
}

impl Report {
    /// The failure reason, falling back to a generic message when the
    /// backend left it blank
    pub fn failure_reason(&self) -> &str {
        self.failed_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_FAILURE_REASON)
    }

    /// Whether this report was produced for the same target as `request`
    pub fn matches(&self, request: &GenerationRequest) -> bool {
        self.period == request.period
            && self.start_date == request.start_date
            && self.end_date == request.end_date
            && self.template == request.template
    }
}

/// Validation failures for a generation request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("cannot generate a report for a future date ({0})")]
    FutureDate(NaiveDate),

    #[error("{start}..{end} is not a whole {period}")]
    PeriodShape {
        period: Period,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Parameters of a generation call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    #[serde(rename = "period_type")]
    pub period: Period,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub template: Template,
}

impl GenerationRequest {
    pub fn new(
        period: Period,
        start_date: NaiveDate,
        end_date: NaiveDate,
        template: Template,
    ) -> Self {
        Self {
            period,
            start_date,
            end_date,
            template,
        }
    }

    /// Build the canonical range containing `anchor`: ISO week (Monday to
    /// Sunday), calendar month, or calendar year.
    pub fn for_period(period: Period, anchor: NaiveDate, template: Template) -> Self {
        let (start, end) = match period {
            Period::Week => {
                let start =
                    anchor - chrono::Duration::days(anchor.weekday().num_days_from_monday() as i64);
                (start, start + chrono::Duration::days(6))
            }
            Period::Month => {
                let start = anchor - chrono::Duration::days(anchor.day0() as i64);
                (start, last_day_of_month(start))
            }
            Period::Year => {
                let start = anchor - chrono::Duration::days(anchor.ordinal0() as i64);
                let end = NaiveDate::from_ymd_opt(anchor.year(), 12, 31).unwrap_or(anchor);
                (start, end)
            }
        };
        Self::new(period, start, end, template)
    }

    /// Key callers use to tell whether a generation targets the same report
    /// as an earlier one
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.period, self.template, self.start_date, self.end_date
        )
    }

    /// Check the range against `today` and the period's shape
    pub fn validate(&self, today: NaiveDate) -> Result<(), RequestError> {
        let (start, end) = (self.start_date, self.end_date);

        if start > end {
            return Err(RequestError::InvertedRange { start, end });
        }
        if end > today {
            return Err(RequestError::FutureDate(end));
        }

        let whole = match self.period {
            Period::Week => {
                start.weekday() == Weekday::Mon
                    && end.weekday() == Weekday::Sun
                    && (end - start).num_days() == 6
            }
            Period::Month => {
                start.year() == end.year()
                    && start.month() == end.month()
                    && start.day() == 1
                    && end == last_day_of_month(start)
            }
            Period::Year => {
                start.year() == end.year()
                    && start.ordinal() == 1
                    && end.month() == 12
                    && end.day() == 31
            }
        };

        if whole {
            Ok(())
        } else {
            Err(RequestError::PeriodShape {
                period: self.period,
                start,
                end,
            })
        }
    }
}

/// Last calendar day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let mut end = date;
    while let Some(next) = end.succ_opt() {
        if next.month() != date.month() {
            break;
        }
        end = next;
    }
    end
}

/// Uniform response envelope: `code == 0` means success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,

    #[serde(default)]
    pub msg: String,

    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Payload of `GET /reports/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBody {
    pub report: Report,
}

/// Payload of `GET /reports`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportListBody {
    #[serde(default)]
    pub report_list: Vec<Report>,
}

/// Body of `POST /reports/edit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    pub report_id: String,
    pub content: String,
}

/// Body of `POST /reports/confirm`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub report_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_report(status: ReportStatus) -> Report {
        Report {
            id: "reportid_1".to_string(),
            period: Period::Week,
            start_date: date("2025-12-08"),
            end_date: date("2025-12-14"),
            title: "Week 50".to_string(),
            content: String::new(),
            confirmed: false,
            template: Template::Formal,
            status,
            failed_reason: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ReportStatus::Queued.is_terminal());
        assert!(!ReportStatus::Processing.is_terminal());
        assert!(ReportStatus::Ready.is_terminal());
        assert!(ReportStatus::Failed.is_terminal());
    }

    #[test]
    fn test_forward_transitions_allowed() {
        use ReportStatus::*;
        assert!(Queued.can_transition_to(Processing));
        assert!(Queued.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Ready));
        assert!(Processing.can_transition_to(Failed));
        // Polling may skip processing entirely
        assert!(Queued.can_transition_to(Ready));
        assert!(Processing.can_transition_to(Processing));
    }

    #[test]
    fn test_leaving_terminal_state_is_rejected() {
        use ReportStatus::*;
        assert!(!Ready.can_transition_to(Processing));
        assert!(!Ready.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Queued));
        assert!(!Processing.can_transition_to(Queued));
    }

    #[test]
    fn test_failure_reason_defaults() {
        let mut report = make_report(ReportStatus::Failed);
        assert_eq!(report.failure_reason(), DEFAULT_FAILURE_REASON);

        report.failed_reason = Some("   ".to_string());
        assert_eq!(report.failure_reason(), DEFAULT_FAILURE_REASON);

        report.failed_reason = Some("quota exceeded".to_string());
        assert_eq!(report.failure_reason(), "quota exceeded");
    }

    #[test]
    fn test_report_deserializes_backend_shape() {
        let json = r#"{
            "report_id": "reportid_abc",
            "period_type": "month",
            "start_date": "2025-11-01",
            "end_date": "2025-11-30",
            "title": "2025-11 monthly",
            "content": "",
            "abstract": "",
            "confirmed": false,
            "template": "simple",
            "status": "processing",
            "created_at": "2025-12-01 09:00:00",
            "updated_at": "2025-12-01 09:00:05"
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();

        assert_eq!(report.id, "reportid_abc");
        assert_eq!(report.period, Period::Month);
        assert_eq!(report.template, Template::Simple);
        assert_eq!(report.status, ReportStatus::Processing);
        assert_eq!(report.start_date, date("2025-11-01"));
        assert!(report.failed_reason.is_none());
    }

    #[test]
    fn test_report_serializes_wire_names() {
        let json = serde_json::to_string(&make_report(ReportStatus::Queued)).unwrap();
        assert!(json.contains("\"report_id\":\"reportid_1\""));
        assert!(json.contains("\"period_type\":\"week\""));
        assert!(json.contains("\"status\":\"queued\""));
        assert!(!json.contains("failed_reason"));
    }

    #[test]
    fn test_request_serializes_wire_names() {
        let request = GenerationRequest::new(
            Period::Week,
            date("2025-12-08"),
            date("2025-12-14"),
            Template::Simple,
        );
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"period_type\":\"week\""));
        assert!(json.contains("\"start_date\":\"2025-12-08\""));
        assert!(json.contains("\"template\":\"simple\""));
    }

    #[test]
    fn test_for_period_week() {
        // 2025-12-10 is a Wednesday
        let request = GenerationRequest::for_period(Period::Week, date("2025-12-10"), Template::Formal);
        assert_eq!(request.start_date, date("2025-12-08"));
        assert_eq!(request.end_date, date("2025-12-14"));
    }

    #[test]
    fn test_for_period_week_on_sunday() {
        let request = GenerationRequest::for_period(Period::Week, date("2025-12-14"), Template::Formal);
        assert_eq!(request.start_date, date("2025-12-08"));
        assert_eq!(request.end_date, date("2025-12-14"));
    }

    #[test]
    fn test_for_period_month_handles_leap_year() {
        let request = GenerationRequest::for_period(Period::Month, date("2024-02-17"), Template::Formal);
        assert_eq!(request.start_date, date("2024-02-01"));
        assert_eq!(request.end_date, date("2024-02-29"));

        let request = GenerationRequest::for_period(Period::Month, date("2025-12-31"), Template::Formal);
        assert_eq!(request.start_date, date("2025-12-01"));
        assert_eq!(request.end_date, date("2025-12-31"));
    }

    #[test]
    fn test_for_period_year() {
        let request = GenerationRequest::for_period(Period::Year, date("2025-06-15"), Template::Simple);
        assert_eq!(request.start_date, date("2025-01-01"));
        assert_eq!(request.end_date, date("2025-12-31"));
    }

    #[test]
    fn test_validate_accepts_canonical_ranges() {
        let today = date("2026-01-10");
        for (period, anchor) in [
            (Period::Week, "2025-12-10"),
            (Period::Month, "2025-02-10"),
            (Period::Year, "2025-07-04"),
        ] {
            let request = GenerationRequest::for_period(period, date(anchor), Template::Formal);
            assert_eq!(request.validate(today), Ok(()), "{period}");
        }
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let request = GenerationRequest::new(
            Period::Week,
            date("2025-12-14"),
            date("2025-12-08"),
            Template::Formal,
        );
        assert!(matches!(
            request.validate(date("2026-01-01")),
            Err(RequestError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_future_range() {
        let request = GenerationRequest::for_period(Period::Week, date("2025-12-10"), Template::Formal);
        assert_eq!(
            request.validate(date("2025-12-12")),
            Err(RequestError::FutureDate(date("2025-12-14")))
        );
    }

    #[test]
    fn test_validate_rejects_partial_periods() {
        let today = date("2026-01-10");
        let partial_week = GenerationRequest::new(
            Period::Week,
            date("2025-12-09"),
            date("2025-12-14"),
            Template::Formal,
        );
        let partial_month = GenerationRequest::new(
            Period::Month,
            date("2025-11-01"),
            date("2025-11-29"),
            Template::Formal,
        );
        let partial_year = GenerationRequest::new(
            Period::Year,
            date("2025-01-02"),
            date("2025-12-31"),
            Template::Formal,
        );

        for request in [partial_week, partial_month, partial_year] {
            assert!(matches!(
                request.validate(today),
                Err(RequestError::PeriodShape { .. })
            ));
        }
    }

    #[test]
    fn test_key_includes_template() {
        let formal = GenerationRequest::for_period(Period::Week, date("2025-12-10"), Template::Formal);
        let simple = GenerationRequest::for_period(Period::Week, date("2025-12-10"), Template::Simple);
        assert_eq!(formal.key(), "week|formal|2025-12-08|2025-12-14");
        assert_ne!(formal.key(), simple.key());
    }

    #[test]
    fn test_report_matches_request() {
        let report = make_report(ReportStatus::Ready);
        let same = GenerationRequest::for_period(Period::Week, date("2025-12-10"), Template::Formal);
        let other = GenerationRequest::for_period(Period::Week, date("2025-12-10"), Template::Simple);
        assert!(report.matches(&same));
        assert!(!report.matches(&other));
    }

    #[test]
    fn test_period_and_template_from_str() {
        assert_eq!("WEEK".parse::<Period>(), Ok(Period::Week));
        assert_eq!(" simple ".parse::<Template>(), Ok(Template::Simple));
        assert!("quarter".parse::<Period>().is_err());
    }

    #[test]
    fn test_envelope_with_null_data() {
        let envelope: Envelope<String> =
            serde_json::from_str(r#"{"code":0,"msg":"ok","data":null}"#).unwrap();
        assert_eq!(envelope.code, 0);
        assert!(envelope.data.is_none());

        let envelope: Envelope<String> = serde_json::from_str(r#"{"code":3007}"#).unwrap();
        assert_eq!(envelope.code, 3007);
        assert!(envelope.msg.is_empty());
    }
}
