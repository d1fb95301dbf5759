mod builder;
mod collector;
mod repository;

pub use builder::{ReportError, build_context, generate_report, render_report, report_date};
pub use collector::collect_report_data;
pub use repository::ScanError;
