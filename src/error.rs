use std::{io, sync::Arc};

use miette::{miette, LabeledSpan, NamedSource, Report, Severity, SourceSpan};

use crate::line::Diagnostic;

/// Source text handed to reports, shared with the file being read.
pub type Source = NamedSource<Arc<str>>;

// Source files

pub fn source_missing(name: &str, e: io::Error) -> Report {
    miette!(
        severity = Severity::Error,
        code = "source::missing",
        help = "check the path and that the file is readable",
        "Could not read source file \"{name}\": {e}",
    )
}

// Includes

pub fn include_depth(span: SourceSpan, src: Source, max: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "include::depth",
        help = format!("at most {max} include-files may be open at once"),
        labels = vec![LabeledSpan::at(span, "one include too many")],
        "Too many levels of include-files.",
    )
    .with_source_code(src)
}

pub fn include_no_name(span: SourceSpan, src: Source) -> Report {
    miette!(
        severity = Severity::Error,
        code = "include::no_name",
        help = "an include line is `$` followed by the file name",
        labels = vec![LabeledSpan::at(span, "no filename")],
        "Include-directive has no filename.",
    )
    .with_source_code(src)
}

pub fn include_missing(span: SourceSpan, src: Source, target: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "include::missing",
        help = "include-files are looked up next to the main source file",
        labels = vec![LabeledSpan::at(span, "included here")],
        "Include-file \"{target}\" does not exist.",
    )
    .with_source_code(src)
}

// Lines

/// Report for a diagnostic recorded while assembling one line.
pub fn line_diagnostic(diagnostic: &Diagnostic, span: SourceSpan, src: Source) -> Report {
    let report = match diagnostic.severity {
        Severity::Error => miette!(
            severity = Severity::Error,
            code = "assemble::fatal",
            labels = vec![LabeledSpan::at(span, "this line")],
            "{}",
            diagnostic.message,
        ),
        _ => miette!(
            severity = Severity::Warning,
            code = "assemble::warning",
            labels = vec![LabeledSpan::at(span, "this line")],
            "{}",
            diagnostic.message,
        ),
    };
    report.with_source_code(src)
}

// Passes

pub fn no_convergence(passes: usize) -> Report {
    miette!(
        severity = Severity::Warning,
        code = "assemble::converge",
        help = "raise the pass limit with `--passes`",
        "Symbol values were still changing after {passes} passes.",
    )
}
