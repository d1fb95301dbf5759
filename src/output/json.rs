use crate::types::ReportContext;

/// Pretty-printed JSON of the full template context.
///
/// # Errors
/// Returns the serializer error; in practice the context always serializes.
pub fn to_json(context: &ReportContext) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(context)
}
