//! Diagnostic rendering: `path(line,col): error NNNN: text`.

use colored::Colorize;
use rustc_hash::FxHashMap;

use sts_common::{Diagnostic, DiagnosticCategory, LineMap, MessageCatalog};

pub struct Reporter {
    color: bool,
    catalog: MessageCatalog,
    line_maps: FxHashMap<String, LineMap>,
}

impl Reporter {
    pub fn new(catalog: MessageCatalog, color: bool) -> Self {
        Reporter {
            color,
            catalog,
            line_maps: FxHashMap::default(),
        }
    }

    /// Make `path` resolvable to line/character positions.
    pub fn add_source(&mut self, path: &str, text: &str) {
        self.line_maps.insert(path.to_string(), LineMap::build(text));
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|diagnostic| self.format_diagnostic(diagnostic))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        if let Some(location) = self.format_location(diagnostic) {
            output.push_str(&location);
            output.push_str(": ");
        }
        output.push_str(&self.format_category(diagnostic.category));
        output.push(' ');
        output.push_str(&self.format_code(diagnostic.code));
        output.push_str(": ");
        output.push_str(&diagnostic.message_text(&self.catalog));
        output
    }

    /// `None` for whole-program diagnostics.
    fn format_location(&self, diagnostic: &Diagnostic) -> Option<String> {
        let file = diagnostic.file.as_deref()?;
        match self.line_maps.get(file) {
            Some(map) => {
                let position = map.position_of(diagnostic.span.start);
                Some(format!("{file}({},{})", position.line, position.character))
            }
            None => Some(file.to_string()),
        }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.name();
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let label = code.to_string();
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sts_common::Span;
    use sts_common::diagnostics::diagnostic_codes;

    fn reporter() -> Reporter {
        let mut reporter = Reporter::new(MessageCatalog::english(), false);
        reporter.add_source("a.ts", "var a = 1;\nvar b: number = \"s\";\n");
        reporter
    }

    #[test]
    fn test_location_is_one_based() {
        let diagnostic = Diagnostic::new(
            Some("a.ts"),
            Span::new(27, 30),
            diagnostic_codes::TYPE_NOT_ASSIGNABLE,
            vec!["string".to_string(), "number".to_string()],
        );
        assert_eq!(
            reporter().format_diagnostic(&diagnostic),
            "a.ts(2,17): error 2322: Type 'string' is not assignable to type 'number'."
        );
    }

    #[test]
    fn test_whole_program_diagnostic_has_no_location() {
        let diagnostic = Diagnostic::global(diagnostic_codes::CANNOT_FIND_NAME, vec!["x".to_string()]);
        assert_eq!(
            reporter().format_diagnostic(&diagnostic),
            "error 2304: Cannot find name 'x'."
        );
    }

    #[test]
    fn test_warnings_and_unknown_files() {
        let diagnostic = Diagnostic::new(
            Some("other.ts"),
            Span::new(0, 1),
            diagnostic_codes::ANY_FLOWS_INTO_TYPED_POSITION,
            vec!["number".to_string()],
        );
        let rendered = reporter().render(&[diagnostic.clone(), diagnostic]);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("other.ts: warning 9001: "), "{}", lines[0]);
    }
}
