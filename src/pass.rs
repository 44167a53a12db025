//! One pass over a source file and its includes.
//!
//! A pass threads [`LineState`] through every line in order, binds labels,
//! and in the emission pass writes the listing, the object image, the debug
//! line table and the HTML book. Discovery passes run the same loop with
//! output switched off so forward references can settle.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use miette::{NamedSource, Report, Result, Severity, SourceSpan};

use crate::{
    address::ILLEGAL_SYMBOL_VALUE,
    error::{self, Source},
    image::{BankUsage, ObjectImage},
    lexer::{self, HTML_CLOSE, HTML_OPEN, INCLUDE_MARKER},
    line::{trace_line, LineState},
    listing::{self, HtmlBook, HtmlContext},
    resolver::{Resolved, Resolver},
    symbol::{is_embedded_constant, FxMap, LineTable, SymbolKind, SymbolTable},
    table::OpcodeTable,
};

/// Include-files that may be open below the main file.
pub const MAX_INCLUDE_DEPTH: usize = 5;

/// Where source text comes from.
pub trait SourceLoader {
    fn load(&self, name: &str) -> io::Result<String>;
}

/// Reads files relative to a root directory.
#[derive(Clone, Debug)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileLoader { root: root.into() }
    }

    /// Loader rooted at the directory of `main`, plus the name to open it by.
    pub fn for_main(main: &Path) -> (Self, String) {
        let root = main
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = main
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        (FileLoader::new(root), name)
    }
}

impl SourceLoader for FileLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(name))
    }
}

/// In-memory sources, keyed by file name.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    files: FxMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn with_file(mut self, name: &str, text: &str) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: &str, text: &str) {
        self.files.insert(name.to_string(), text.to_string());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no source named {name}"))
        })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PassOptions {
    /// Emission pass: listing, image and line table are written.
    pub write_output: bool,
    pub html: bool,
    /// Print address and bank snapshots for every line to stderr.
    pub trace: bool,
}

#[derive(Debug, Default)]
pub struct PassReport {
    pub fatals: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Report>,
    pub listing: String,
    pub html: Option<HtmlBook>,
}

/// Everything that outlives a single line.
#[derive(Clone, Debug, Default)]
pub struct Assembly {
    pub symbols: SymbolTable,
    pub image: ObjectImage,
    pub usage: BankUsage,
    pub lines: LineTable,
}

/// A source file being read.
struct Frame {
    name: String,
    text: Arc<str>,
    offset: usize,
    line: usize,
}

impl Frame {
    fn new(name: &str, text: String) -> Self {
        Frame {
            name: name.to_string(),
            text: text.into(),
            offset: 0,
            line: 0,
        }
    }

    fn source(&self) -> Source {
        NamedSource::new(&self.name, Arc::clone(&self.text))
    }

    /// Next line without its newline, with the span it covers.
    fn next_line(&mut self) -> Option<(String, SourceSpan)> {
        let rest = &self.text[self.offset..];
        if rest.is_empty() {
            return None;
        }
        let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
        let line = lexer::strip_newline(&rest[..len]).to_string();
        let span = SourceSpan::from((self.offset, line.len()));
        self.offset += len;
        self.line += 1;
        Some((line, span))
    }
}

impl Assembly {
    pub fn new() -> Self {
        Assembly::default()
    }

    fn begin_pass(&mut self) {
        self.symbols.begin_pass();
        self.image.clear();
        self.usage.clear();
        self.lines.clear();
    }

    /// Run one pass over `main` and whatever it includes.
    ///
    /// Line-level problems are tallied in the report and never stop the
    /// pass. Only trouble opening sources ends it early.
    pub fn run_pass<T, L>(
        &mut self,
        table: &T,
        loader: &L,
        main: &str,
        options: PassOptions,
    ) -> Result<PassReport>
    where
        T: OpcodeTable + ?Sized,
        L: SourceLoader + ?Sized,
    {
        self.begin_pass();
        let text = loader
            .load(main)
            .map_err(|e| error::source_missing(main, e))?;

        let mut report = PassReport {
            html: (options.write_output && options.html).then(HtmlBook::new),
            ..PassReport::default()
        };
        let mut state = LineState::initial();
        let mut frame = Frame::new(main, text);
        let mut stack: Vec<Frame> = Vec::new();
        let mut line_all = 0;
        let mut in_html = false;

        loop {
            let Some((line, span)) = frame.next_line() else {
                let Some(parent) = stack.pop() else {
                    break;
                };
                if options.write_output {
                    report.listing.push_str(&format!(
                        "(End of include-file {}, resuming {})\n",
                        frame.name, parent.name
                    ));
                }
                frame = parent;
                continue;
            };
            line_all += 1;

            if in_html {
                if line.trim() == HTML_CLOSE {
                    in_html = false;
                } else if let Some(book) = report.html.as_mut() {
                    let page = book.page(&frame.name);
                    page.push_str(&line);
                    page.push('\n');
                }
                continue;
            }
            if line.trim() == HTML_OPEN {
                in_html = true;
                continue;
            }

            if line.starts_with(INCLUDE_MARKER) {
                let Some(target) = lexer::include_target(&line) else {
                    return Err(error::include_no_name(span, frame.source()));
                };
                if stack.len() >= MAX_INCLUDE_DEPTH {
                    return Err(error::include_depth(span, frame.source(), MAX_INCLUDE_DEPTH));
                }
                let text = loader
                    .load(target)
                    .map_err(|_| error::include_missing(span, frame.source(), target))?;
                if options.write_output {
                    report.listing.push_str(&listing::counters(line_all, frame.line));
                    report.listing.push_str(&line);
                    report.listing.push('\n');
                    if let Some(book) = report.html.as_mut() {
                        let link = listing::html_include(line_all, frame.line, target, &line);
                        book.page(&frame.name).push_str(&link);
                    }
                }
                let child = Frame::new(target, text);
                stack.push(std::mem::replace(&mut frame, child));
                continue;
            }

            let raw = lexer::split_line(&line);
            let Resolved { input, mut output } = Resolver::new(table, &self.symbols, &self.usage)
                .emitting(options.write_output)
                .line(&mut state, &raw);
            self.usage.update(&output.pc);

            let fields = &input.fields;
            if !fields.label.is_empty() && !matches!(fields.operator.as_str(), "MEMORY" | "CHECK=")
            {
                let binding = if output.equals {
                    output.label_value.map(|value| (value, SymbolKind::Label))
                } else if is_embedded_constant(&fields.operator) {
                    Some((input.pc, SymbolKind::Variable))
                } else {
                    Some((input.pc, SymbolKind::Label))
                };
                if let Some((value, kind)) = binding {
                    if let Err(e) =
                        self.symbols
                            .define(&fields.label, value, kind, &frame.name, frame.line)
                    {
                        output.fatal(e.to_string());
                    }
                }
            }

            if options.trace {
                eprintln!("{}", trace_line(&input, &output));
            }

            if let Some(diagnostic) = &output.diagnostic {
                match diagnostic.severity {
                    Severity::Error => report.fatals += 1,
                    _ => report.warnings += 1,
                }
                report
                    .diagnostics
                    .push(error::line_diagnostic(diagnostic, span, frame.source()));
            }

            if !options.write_output {
                continue;
            }

            if let Some(diagnostic) = &output.diagnostic {
                report
                    .listing
                    .push_str(&listing::diagnostic_line(&frame.name, frame.line, diagnostic));
                report.listing.push('\n');
            }
            report
                .listing
                .push_str(&listing::listing_line(line_all, frame.line, &input, &output));
            report.listing.push('\n');

            let pc = &input.pc;
            if output.num_words > 0
                && output.words[0] != ILLEGAL_SYMBOL_VALUE
                && pc.is_valid()
                && pc.is_address()
                && pc.is_fixed()
                && self.image.write(pc, output.words())
            {
                self.lines.add(*pc, &frame.name, frame.line);
            }

            if let Some(book) = report.html.as_mut() {
                let ctx = HtmlContext {
                    table,
                    symbols: &self.symbols,
                    file: &frame.name,
                };
                let html = ctx.line(line_all, frame.line, &input, &output);
                book.page(&frame.name).push_str(&html);
            }
        }

        Ok(report)
    }
}
