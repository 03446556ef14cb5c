//! Rendering of pipeline diagnostics for the command line.

use ariadne::{Color, Label, Report, ReportKind, Source};
use effmatch_core::{CompilationPhase, Diagnostic, DiagnosticSeverity};

/// Get the display color for a compilation phase.
pub fn phase_color(phase: CompilationPhase) -> Color {
    match phase {
        CompilationPhase::Parsing => Color::Red,
        CompilationPhase::Expansion => Color::Magenta,
    }
}

pub fn report_kind(severity: DiagnosticSeverity) -> ReportKind<'static> {
    match severity {
        DiagnosticSeverity::Error => ReportKind::Error,
        DiagnosticSeverity::Warning => ReportKind::Warning,
        DiagnosticSeverity::Info => ReportKind::Advice,
    }
}

/// Normalize a span to ensure end > start (required by ariadne).
pub fn normalize_span(start: usize, end: usize) -> (usize, usize) {
    (start, end.max(start + 1))
}

/// Print a diagnostic to stderr.
pub fn print_diagnostic(diag: &Diagnostic, source: &str, file_path: &str) {
    let (start, end) = normalize_span(diag.span.start, diag.span.end);

    Report::build(report_kind(diag.severity), (file_path, start..end))
        .with_code(diag.phase)
        .with_message(&diag.message)
        .with_label(
            Label::new((file_path, start..end))
                .with_message(&diag.message)
                .with_color(phase_color(diag.phase)),
        )
        .finish()
        .eprint((file_path, Source::from(source)))
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_colors() {
        assert_eq!(phase_color(CompilationPhase::Parsing), Color::Red);
        assert_eq!(phase_color(CompilationPhase::Expansion), Color::Magenta);
    }

    #[test]
    fn test_report_kind() {
        assert!(matches!(report_kind(DiagnosticSeverity::Error), ReportKind::Error));
        assert!(matches!(report_kind(DiagnosticSeverity::Info), ReportKind::Advice));
    }

    #[test]
    fn test_normalize_span_valid() {
        assert_eq!(normalize_span(0, 10), (0, 10));
        assert_eq!(normalize_span(5, 15), (5, 15));
    }

    #[test]
    fn test_normalize_span_zero_length() {
        assert_eq!(normalize_span(5, 5), (5, 6));
        assert_eq!(normalize_span(0, 0), (0, 1));
    }
}
