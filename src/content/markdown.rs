//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::HighlightConfig;

/// Markdown renderer with syntax highlighting.
///
/// Loading the syntax and theme sets is slow, so build one renderer at
/// startup and share it.
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a renderer with the default theme
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create a renderer from the highlight settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(&config.theme)
            .or_else(|| {
                tracing::warn!("Unknown highlight theme '{}', using default", config.theme);
                themes.remove("base16-ocean.dark")
            })
            .unwrap_or_default();

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers: config.line_number,
        }
    }

    /// Render markdown to HTML.
    ///
    /// Output depends only on the input and the renderer settings.
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            lang.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, buf)) = code.take() {
                        let html = self.highlight_code(&buf, lang.as_deref());
                        events.push(Event::Html(CowStr::from(html)));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, buf)) = code.as_mut() {
                        buf.push_str(&text);
                    }
                }
                event if code.is_none() => events.push(event),
                _ => {}
            }
        }

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block; unknown or missing languages are escaped only
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let syntax = lang.and_then(|l| {
            self.syntax_set
                .find_syntax_by_token(l)
                .or_else(|| self.syntax_set.find_syntax_by_extension(l))
        });

        let (Some(lang), Some(syntax)) = (lang, syntax) else {
            return format!("<pre><code>{}</code></pre>\n", html_escape(code));
        };

        match highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme) {
            Ok(highlighted) if self.line_numbers => add_line_numbers(&highlighted, lang),
            Ok(highlighted) => format!(
                "<figure class=\"highlight {}\">{}</figure>\n",
                html_escape(lang),
                highlighted
            ),
            Err(e) => {
                tracing::debug!("Highlighting {} failed: {}", lang, e);
                format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>\n",
                    html_escape(lang),
                    html_escape(code)
                )
            }
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap highlighted code in a two-column table with a line-number gutter
fn add_line_numbers(code: &str, lang: &str) -> String {
    let gutter = (1..=code.lines().count())
        .map(|n| format!("<span class=\"line-number\">{}</span>", n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<figure class=\"highlight {}\"><table><tr><td class=\"gutter\"><pre>{}</pre></td><td class=\"code\">{}</td></tr></table></figure>\n",
        html_escape(lang),
        gutter,
        code
    )
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_link() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("This is [my first blog post](http://127.0.0.1:8000/)");
        assert!(html.contains(r#"<a href="http://127.0.0.1:8000/">my first blog post</a>"#));
    }

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is *a* **test**.\n\n- one\n- two\n");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<em>a</em>"));
        assert!(html.contains("<strong>test</strong>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let text = "## Title\n\n```rust\nfn main() {}\n```\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        assert_eq!(renderer.render(text), renderer.render(text));
        assert_eq!(renderer.render(text), MarkdownRenderer::new().render(text));
    }

    #[test]
    fn test_render_code_blocks() {
        let renderer = MarkdownRenderer::new();

        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains("<figure class=\"highlight rust\">"));
        assert!(html.contains("main"));

        let html = renderer.render("    <indented> & raw\n");
        assert!(html.contains("<pre><code>&lt;indented&gt; &amp; raw"));

        let html = renderer.render("```nosuchlang\nx < y\n```");
        assert!(html.contains("x &lt; y"));
    }

    #[test]
    fn test_line_numbers() {
        let renderer = MarkdownRenderer::with_options(&HighlightConfig {
            line_number: true,
            ..Default::default()
        });
        let html = renderer.render("```python\na = 1\nb = 2\n```");
        assert!(html.contains("<span class=\"line-number\">2</span>"));
    }
}
