//! Layout lookup by regulation and report type.

use crate::config::LayoutConfig;

/// Pick the layout for a regulation / report type.
///
/// A layout naming the exact report type wins over a regulation-wide one
/// (`report_type = None`). Returns `None` when nothing matches.
pub fn resolve_layout<'a>(
    layouts: &'a [LayoutConfig],
    regulation: &str,
    report_type: Option<&str>,
) -> Option<&'a LayoutConfig> {
    let for_regulation = || layouts.iter().filter(move |l| l.regulation == regulation);

    report_type
        .and_then(|rt| for_regulation().find(|l| l.report_type.as_deref() == Some(rt)))
        .or_else(|| for_regulation().find(|l| l.report_type.is_none()))
}
