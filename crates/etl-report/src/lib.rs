pub mod esrs;
pub mod report;

pub use esrs::{EsrsColumns, EsrsReport, compute as compute_esrs};
pub use report::{
    ComplianceReport, DEFAULT_SAMPLE_LIMIT, REPORT_CONTENT_TYPE, ReportError, build,
    collect_samples, report_name,
};
