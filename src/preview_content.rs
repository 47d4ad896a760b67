use std::path::Path;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

/// Detect the syntax name for a file based on its extension, falling back
/// to the content's shebang line.
pub fn detect_syntax_name<'a>(path: &Path, content: &'a str) -> &'a str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py") => "Python",
        Some("rs") => "Rust",
        Some("yaml" | "yml") => "YAML",
        Some("json" | "jsonl" | "ndjson") => "JSON",
        Some("toml") => "TOML",
        Some("sh" | "bash" | "zsh") => "Bash",
        Some("sql") => "SQL",
        Some("md" | "markdown") => "Markdown",
        Some("html" | "htm") => "HTML",
        Some("css") => "CSS",
        Some("js" | "jsx") => "JavaScript",
        Some("xml") => "XML",
        Some("go") => "Go",
        None => detect_from_shebang(content),
        _ => "Plain Text",
    }
}

/// Detect syntax from the shebang line of extensionless content.
fn detect_from_shebang(content: &str) -> &'static str {
    let first_line = content.lines().next().unwrap_or("");
    if !first_line.starts_with("#!") {
        return "Plain Text";
    }
    let line = first_line.to_lowercase();
    if line.contains("python") {
        "Python"
    } else if line.contains("bash") || line.contains("/sh") {
        "Bash"
    } else if line.contains("node") || line.contains("deno") {
        "JavaScript"
    } else {
        "Plain Text"
    }
}

/// Load a theme from the built-in theme set by name, with fallback.
fn load_theme(theme_set: &ThemeSet, theme_name: &str) -> Theme {
    theme_set
        .themes
        .get(theme_name)
        .or_else(|| theme_set.themes.get("base16-ocean.dark"))
        .cloned()
        .unwrap_or_default()
}

/// Convert syntect color to ratatui Color.
fn syntect_color_to_ratatui(c: syntect::highlighting::Color) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Turns loaded file content into styled lines for the content panel.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl Highlighter {
    pub fn new(theme_name: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: load_theme(&ThemeSet::load_defaults(), theme_name),
            line_numbers,
        }
    }

    /// Syntax-highlight `content`, choosing the syntax from `path`.
    pub fn highlight(&self, path: &Path, content: &str) -> Vec<Line<'static>> {
        let ss = &self.syntax_set;
        let syntax = ss
            .find_syntax_by_name(detect_syntax_name(path, content))
            .or_else(|| ss.find_syntax_by_extension(path.extension()?.to_str()?))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let total = content.lines().count().max(1);
        let line_num_width = total.to_string().len();

        let mut result_lines = Vec::with_capacity(total);
        for (i, line_str) in content.lines().enumerate() {
            let mut spans: Vec<Span<'static>> = Vec::new();

            if self.line_numbers {
                let num = format!("{:>width$} │ ", i + 1, width = line_num_width);
                spans.push(Span::styled(num, Style::default().fg(Color::DarkGray)));
            }

            // The newline-aware syntax set expects each line to keep its terminator.
            let with_newline = format!("{line_str}\n");
            match highlighter.highlight_line(&with_newline, ss) {
                Ok(ranges) => {
                    for (style, text) in ranges {
                        let text = text.trim_end_matches('\n');
                        if text.is_empty() {
                            continue;
                        }
                        let fg = syntect_color_to_ratatui(style.foreground);
                        spans.push(Span::styled(text.to_string(), Style::default().fg(fg)));
                    }
                }
                Err(_) => spans.push(Span::raw(line_str.to_string())),
            }

            result_lines.push(Line::from(spans));
        }

        if result_lines.is_empty() {
            result_lines.push(Line::from(Span::styled(
                "(empty file)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        result_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn detect_syntax_by_extension() {
        assert_eq!(detect_syntax_name(Path::new("report.json"), ""), "JSON");
        assert_eq!(detect_syntax_name(Path::new("a.yml"), ""), "YAML");
        assert_eq!(detect_syntax_name(Path::new("notes.weird"), ""), "Plain Text");
    }

    #[test]
    fn detect_shebang_for_extensionless() {
        assert_eq!(detect_syntax_name(Path::new("run"), "#!/usr/bin/env python3\n"), "Python");
        assert_eq!(detect_syntax_name(Path::new("run"), "#!/bin/sh\n"), "Bash");
        assert_eq!(detect_syntax_name(Path::new("run"), "plain\n"), "Plain Text");
    }

    #[test]
    fn highlight_json_keeps_text_and_numbers_lines() {
        let hl = Highlighter::new("base16-ocean.dark", true);
        let lines = hl.highlight(Path::new("r.json"), "{\n  \"a\": 1\n}");
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[0]), "1 │ {");
        assert_eq!(line_text(&lines[1]), "2 │   \"a\": 1");
    }

    #[test]
    fn highlight_without_line_numbers() {
        let hl = Highlighter::new("base16-ocean.dark", false);
        let lines = hl.highlight(Path::new("r.txt"), "hello");
        assert_eq!(line_text(&lines[0]), "hello");
    }

    #[test]
    fn highlight_empty_content() {
        let hl = Highlighter::new("base16-ocean.dark", true);
        let lines = hl.highlight(Path::new("r.json"), "");
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "(empty file)");
    }

    #[test]
    fn unknown_theme_falls_back() {
        let hl = Highlighter::new("no-such-theme", true);
        assert!(!hl.highlight(Path::new("a.rs"), "fn main() {}").is_empty());
    }
}
