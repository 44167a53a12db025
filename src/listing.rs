//! Text listing and the HTML book.

use std::{fmt::Write, path::Path};

use crate::{
    address::{ILLEGAL_SYMBOL_VALUE, WORD_MASK},
    line::{Diagnostic, Fields, LineInput, LineOutput},
    operand,
    symbol::{FxMap, SymbolTable},
    table::{OpClass, OpcodeTable},
};

const BLANK_FIELD: &str = "         ";
const BLANK_WORD: &str = "      ";

/// Line counters at the head of every listing line.
pub fn counters(line_all: usize, line_in_file: usize) -> String {
    format!("{line_all:06},{line_in_file:06}: ")
}

pub fn diagnostic_line(file: &str, line: usize, diagnostic: &Diagnostic) -> String {
    match diagnostic.severity {
        miette::Severity::Error => format!("{file}:{line}: Fatal Error: {}", diagnostic.message),
        _ => format!("Warning: {}:", diagnostic.message),
    }
}

/// Fields as they appear in the listing: alias expansions show the name
/// that was written.
pub fn listed_fields(input: &LineInput) -> Fields {
    let mut fields = input.fields.clone();
    if let Some(alias) = fields.alias.take() {
        fields.operator = alias;
        fields.operand.clear();
    }
    fields
}

fn has_statement(fields: &Fields) -> bool {
    !(fields.label.is_empty()
        && fields.false_label.is_empty()
        && fields.operator.is_empty()
        && fields.operand.is_empty())
}

fn word_field(output: &LineOutput, i: usize) -> String {
    if output.num_words <= i {
        BLANK_WORD.to_string()
    } else if output.words[i] == ILLEGAL_SYMBOL_VALUE {
        "????? ".to_string()
    } else {
        format!("{:05o} ", output.words[i] & WORD_MASK)
    }
}

/// Address, label value and word columns shared by both renderings.
fn columns(input: &LineInput, output: &LineOutput, fields: &Fields) -> String {
    let mut s = String::new();
    if has_statement(fields) {
        s.push_str(&input.pc.listing_field());
    } else {
        s.push_str(BLANK_FIELD);
    }
    match &output.label_value {
        Some(value) => s.push_str(&value.listing_field()),
        None => s.push_str(BLANK_FIELD),
    }
    s.push_str(&word_field(output, 0));
    s.push_str(&word_field(output, 1));
    s
}

/// One assembled line of the text listing, without the trailing newline.
pub fn listing_line(
    line_all: usize,
    line_in_file: usize,
    input: &LineInput,
    output: &LineOutput,
) -> String {
    let fields = listed_fields(input);
    let mut s = counters(line_all, line_in_file);
    if !has_statement(&fields) && fields.comment.is_empty() {
        return s;
    }
    s.push_str(&columns(input, output, &fields));
    let _ = write!(
        s,
        " {:<8} {:<8} {:<8} {:<10} {:<10} {:<8}\t#{}",
        fields.label,
        fields.false_label,
        fields.operator,
        fields.operand,
        fields.mod1,
        fields.mod2,
        fields.comment
    );
    s
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Left-justify in `width` columns, then escape.
pub fn pad(s: &str, width: usize) -> String {
    escape(&format!("{s:<width$}"))
}

/// Anchor name for a symbol; anything outside `[A-Za-z0-9_]` is hex-encoded.
pub fn anchor(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            let _ = write!(out, "_{:02X}", c as u32);
        }
    }
    out
}

/// HTML page name for a source file.
pub fn html_name(file: &str) -> String {
    let path = Path::new(file).with_extension("html");
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{file}.html"))
}

const STYLE: &str = "\
.symbol { color: #800000; font-weight: bold }
.basic { color: #0000a0 }
.pseudo { color: #a000a0 }
.interpretive { color: #008000 }
.downlink { color: #806000 }
.comment { color: #808080 }
.fatal { color: #ff0000; font-weight: bold }
.warning { color: #ff8000; font-weight: bold }
";

/// One HTML page per source file, filled in as the emission pass goes.
#[derive(Clone, Debug, Default)]
pub struct HtmlBook {
    pages: FxMap<String, String>,
}

impl HtmlBook {
    pub fn new() -> Self {
        HtmlBook::default()
    }

    /// Page for `file`, created with its header on first use.
    pub fn page(&mut self, file: &str) -> &mut String {
        self.pages.entry(file.to_string()).or_insert_with(|| {
            format!(
                "<html>\n<head>\n<title>{}</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<pre>\n",
                escape(file)
            )
        })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Closed pages as `(html file name, contents)`.
    pub fn finish(self) -> Vec<(String, String)> {
        self.pages
            .into_iter()
            .map(|(file, mut body)| {
                body.push_str("</pre>\n</body>\n</html>\n");
                (html_name(&file), body)
            })
            .collect()
    }
}

pub fn html_include(line_all: usize, line_in_file: usize, target: &str, text: &str) -> String {
    format!(
        "{}<a href=\"{}\">{}</a>\n",
        counters(line_all, line_in_file),
        html_name(target),
        escape(text)
    )
}

/// Everything the HTML renderer looks things up in.
pub struct HtmlContext<'a, T: ?Sized> {
    pub table: &'a T,
    pub symbols: &'a SymbolTable,
    pub file: &'a str,
}

impl<T: OpcodeTable + ?Sized> HtmlContext<'_, T> {
    fn is_interpretive(&self, name: &str) -> bool {
        self.classify(name) == Some(OpClass::Interpretive)
    }

    fn classify(&self, name: &str) -> Option<OpClass> {
        match name {
            "NOOP" => Some(OpClass::Basic),
            _ => self.table.classify(name),
        }
    }

    fn operand(&self, fields: &Fields, interpretive_operator: bool) -> String {
        let operand = fields.operand.as_str();
        if interpretive_operator && self.is_interpretive(operand) {
            return format!("<span class=\"interpretive\">{}</span> ", pad(operand, 10));
        }
        let (name, suffix) = match self.symbols.get(operand) {
            Some(_) => (operand, ""),
            None => match operand::split_index(operand) {
                (name, index) if index > 0 && self.symbols.get(name).is_some() => {
                    (name, &operand[name.len()..])
                }
                _ => match operand.strip_prefix("$$/") {
                    Some(name) if self.symbols.get(name).is_some() => (name, ""),
                    _ if self.is_interpretive(operand) => {
                        return format!("<span class=\"interpretive\">{}</span> ", pad(operand, 10));
                    }
                    _ => return format!("{} ", pad(operand, 10)),
                },
            },
        };

        let mut s = String::new();
        if operand.starts_with("$$/") {
            s.push_str("$$/");
        }
        let page = match self.symbols.get(name) {
            Some(sym) if sym.file != self.file => html_name(&sym.file),
            _ => String::new(),
        };
        let _ = write!(
            s,
            "<a href=\"{page}#{}\">{}</a>{suffix} ",
            anchor(name),
            escape(name)
        );
        for _ in operand.len()..10 {
            s.push(' ');
        }
        s
    }

    /// One assembled line of HTML, newline included.
    pub fn line(
        &self,
        line_all: usize,
        line_in_file: usize,
        input: &LineInput,
        output: &LineOutput,
    ) -> String {
        let fields = listed_fields(input);
        let mut s = String::new();
        if !fields.label.is_empty() {
            let _ = write!(s, "<a name=\"{}\"></a>", anchor(&fields.label));
        }
        if let Some(diagnostic) = &output.diagnostic {
            let (class, title) = match diagnostic.severity {
                miette::Severity::Error => ("fatal", "Fatal Error"),
                _ => ("warning", "Warning"),
            };
            let _ = writeln!(
                s,
                "<span class=\"{class}\">{title}:  {}</span>",
                escape(&diagnostic.message)
            );
        }
        s.push_str(&counters(line_all, line_in_file));
        if !has_statement(&fields) && fields.comment.is_empty() {
            s.push('\n');
            return s;
        }
        s.push_str(&columns(input, output, &fields));

        if fields.label.is_empty() {
            let _ = write!(s, " {} ", pad("", 8));
        } else {
            let _ = write!(s, " <span class=\"symbol\">{}</span> ", pad(&fields.label, 8));
        }
        let _ = write!(s, "{} ", pad(&fields.false_label, 8));

        let class = self.classify(&fields.operator);
        match class {
            Some(class) => {
                let _ = write!(
                    s,
                    "<span class=\"{}\">{}</span> ",
                    class.css_class(),
                    pad(&fields.operator, 8)
                );
            }
            None => {
                let _ = write!(s, "{} ", pad(&fields.operator, 8));
            }
        }

        s.push_str(&self.operand(&fields, class == Some(OpClass::Interpretive)));
        let _ = write!(s, "{} {}{}", pad(&fields.mod1, 10), pad(&fields.mod2, 8), pad("", 8));
        if !fields.comment.is_empty() {
            let _ = write!(
                s,
                "<span class=\"comment\"># {}</span>",
                escape(&fields.comment)
            );
        }
        s.push('\n');
        s
    }
}
