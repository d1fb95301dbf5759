use chrono::NaiveDate;

use crate::git::GitRunner;
use crate::system::Clock;
use crate::template::{Template, TemplateError};
use crate::types::{Options, ReportContext, ReportData};

use super::collector::collect_report_data;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("could not build template context: {0}")]
    Context(#[from] serde_json::Error),
}

/// Scan the configured repositories and render `opts.template` over the result.
///
/// The template is compiled before anything is scanned, so a broken template
/// fails fast and no output is produced.
///
/// # Errors
/// Returns [`ReportError::Template`] when the template does not compile.
pub fn generate_report(
    opts: &Options,
    git: &dyn GitRunner,
    clock: &dyn Clock,
) -> Result<String, ReportError> {
    let template = Template::compile(&opts.template)?;
    let date = report_date(opts, clock);
    let data = collect_report_data(opts, date, git);
    let context = build_context(data, date, clock);
    render_report(&template, &context)
}

/// The day a report covers: the override in `opts`, else today.
#[must_use]
pub fn report_date(opts: &Options, clock: &dyn Clock) -> NaiveDate {
    opts.date.unwrap_or_else(|| clock.now().date_naive())
}

#[must_use]
pub fn build_context(data: ReportData, date: NaiveDate, clock: &dyn Clock) -> ReportContext {
    ReportContext {
        commits: data.commits,
        staged: data.staged,
        unstaged: data.unstaged,
        branches: data.branches,
        repositories: data.repositories,
        timestamp: clock.now().format("%Y-%m-%d %H:%M").to_string(),
        date: date.format("%Y-%m-%d").to_string(),
    }
}

/// # Errors
/// Returns [`ReportError::Context`] if the context cannot be converted to template data.
pub fn render_report(template: &Template, context: &ReportContext) -> Result<String, ReportError> {
    let value = serde_json::to_value(context)?;
    Ok(template.render(&value))
}
