use maud::{html, Markup, PreEscaped, DOCTYPE};

use resoconto::markdown::markdown_to_html;
use resoconto::types::{Report, ReportStatus};

pub fn render_page(reports: &[Report]) -> Markup {
    let ready = reports
        .iter()
        .filter(|r| r.status == ReportStatus::Ready)
        .count();

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Finto" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    h1.page-title { "Finto" }
                    div.stats {
                        span #"total-count" { (reports.len()) }
                        " reports, "
                        span #"ready-count" { (ready) }
                        " ready"
                    }
                    @if reports.is_empty() {
                        div.empty-state {
                            p { "No reports generated yet." }
                        }
                    } @else {
                        @for report in reports {
                            (render_report(report))
                        }
                    }
                }
            }
        }
    }
}

fn render_report(report: &Report) -> Markup {
    html! {
        div.report data-report-id=(report.id) {
            div.report-header {
                span.report-title { (report.title) }
                span class={"status status-" (report.status)} { (report.status) }
                @if report.confirmed {
                    span.confirmed { "confirmed" }
                }
            }
            div.report-range { (report.start_date) " to " (report.end_date) " · " (report.template) }
            @match report.status {
                ReportStatus::Ready => div.report-content { (PreEscaped(markdown_to_html(&report.content))) },
                ReportStatus::Failed => div.report-failed { (report.failure_reason()) },
                _ => div.report-pending { "Generating..." },
            }
        }
    }
}

const CSS: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Inter', sans-serif;
    background: #0a0a0a;
    color: #fff;
    line-height: 1.5;
}

.container {
    max-width: 900px;
    margin: 0 auto;
    padding: 40px 24px 60px;
}

.page-title {
    font-size: 3rem;
    font-weight: 900;
    text-transform: uppercase;
    margin-bottom: 8px;
}

.stats {
    color: #888;
    margin-bottom: 32px;
}

.report {
    border: 2px solid #222;
    padding: 20px;
    margin-bottom: 20px;
}

.report-header {
    display: flex;
    gap: 12px;
    align-items: center;
}

.report-title {
    font-weight: 700;
    font-size: 1.2rem;
}

.status {
    font-size: 0.75rem;
    text-transform: uppercase;
    padding: 2px 8px;
    border: 1px solid currentColor;
}

.status-queued, .status-processing { color: #0ff; }
.status-ready { color: #0f0; }
.status-failed { color: #f36; }

.confirmed {
    font-size: 0.75rem;
    color: #ff0;
}

.report-range {
    color: #888;
    font-size: 0.85rem;
    margin: 4px 0 16px;
}

.report-content h1, .report-content h2, .report-content h3 {
    margin: 12px 0 6px;
}

.report-content ul, .report-content ol {
    padding-left: 24px;
}

.report-failed { color: #f36; }
.report-pending { color: #0ff; }

.empty-state {
    color: #666;
    text-align: center;
    padding: 60px 0;
}
"#;
