//! Markdown → ratatui `Text` renderer.
//!
//! Converts `pulldown_cmark` events into styled `Line`/`Span` values:
//! headings, bold, italic, inline code, links, lists, blockquotes, rules,
//! and fenced code blocks highlighted through syntect when the language tag
//! is recognized.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-eighties.dark";
/// Indent prepended to every line inside a fenced code block.
const CODE_INDENT: &str = "  ";

/// Parse markdown content into styled `Text`.
///
/// Plain text takes `base_fg`; block and inline constructs layer styles on
/// top. Returns owned text (`'static`) so callers aren't constrained by the
/// input lifetime.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        renderer.event(event);
    }
    renderer.finish()
}

// ── Renderer ────────────────────────────────────────────────────────────────

/// Tracks the line under construction plus the block/inline context around it.
struct Renderer {
    done: Vec<Line<'static>>,
    /// Spans of the line currently being assembled.
    current: Vec<Span<'static>>,
    base_fg: Color,
    /// Inline style stack; entries compose via `patch` so bold inside
    /// italic (etc.) nests correctly.
    inline: Vec<Style>,
    /// Blockquote nesting depth (drawn as a `▌` gutter per level).
    quote_depth: usize,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    lists: Vec<Option<u64>>,
    /// Active fenced code block, if any.
    code: Option<CodeState>,
    /// Stored link URL, appended once the link text closes.
    link: Option<String>,
    /// Whether a blank separator line is owed before the next block.
    gap_pending: bool,
}

struct CodeState {
    highlight: Option<HighlightLines<'static>>,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            done: Vec::new(),
            current: Vec::new(),
            base_fg,
            inline: Vec::new(),
            quote_depth: 0,
            lists: Vec::new(),
            code: None,
            link: None,
            gap_pending: false,
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.flush_line();
        Text::from(self.done)
    }

    // ── Style helpers ───────────────────────────────────────────────────

    fn style(&self) -> Style {
        self.inline
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.inline.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.inline.pop();
    }

    // ── Line assembly ───────────────────────────────────────────────────

    /// Push the line under construction, with the blockquote gutter if any.
    fn flush_line(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.emit_line(Line::from(spans));
    }

    fn emit_line(&mut self, mut line: Line<'static>) {
        if self.quote_depth > 0 {
            line.spans.insert(
                0,
                Span::styled(
                    "▌ ".repeat(self.quote_depth),
                    Style::default().fg(Color::DarkGray),
                ),
            );
        }
        self.done.push(line);
    }

    fn span(&mut self, span: Span<'static>) {
        self.current.push(span);
    }

    fn gap_if_pending(&mut self) {
        if self.gap_pending {
            if !self.done.is_empty() {
                self.done.push(Line::default());
            }
            self.gap_pending = false;
        }
    }

    // ── Event dispatch ──────────────────────────────────────────────────

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => {
                let style = Style::default().fg(Color::Yellow);
                self.span(Span::styled(expand_tabs(&c), style));
            }
            Event::SoftBreak => self.span(Span::raw(" ")),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.gap_if_pending();
                self.emit_line(Line::from(Span::styled(
                    "┄".repeat(32),
                    Style::default().fg(Color::DarkGray),
                )));
                self.gap_pending = true;
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.span(Span::raw(marker));
            }
            _ => {} // HTML, footnotes, math - skip
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.gap_if_pending(),
            Tag::Heading { level, .. } => {
                self.gap_if_pending();
                self.push_style(heading_style(level));
            }
            Tag::BlockQuote(_) => {
                self.gap_if_pending();
                self.flush_line();
                self.quote_depth += 1;
                self.push_style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM));
            }
            Tag::CodeBlock(kind) => {
                self.gap_if_pending();
                self.flush_line();
                let lang = match &kind {
                    CodeBlockKind::Fenced(l) => l.as_ref().to_owned(),
                    CodeBlockKind::Indented => String::new(),
                };

                // Language tag header, when there is one to show
                if !lang.is_empty() {
                    self.emit_line(Line::from(Span::styled(
                        lang.clone(),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::BOLD),
                    )));
                }

                let highlight = SYNTAXES.find_syntax_by_token(&lang).map(|syntax| {
                    HighlightLines::new(syntax, &THEMES.themes[CODE_THEME])
                });
                self.code = Some(CodeState { highlight });
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.gap_if_pending();
                }
                self.flush_line();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{indent}{n}. ");
                        *n += 1;
                        m
                    }
                    _ => format!("{indent}• "),
                };
                self.span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {} // Tables, images, definitions - skip
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_line();
                self.gap_pending = true;
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.pop_style();
                self.gap_pending = true;
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth -= 1;
                self.pop_style();
                self.gap_pending = true;
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.gap_pending = true;
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                self.gap_pending = true;
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link.take() {
                    self.span(Span::raw(" <"));
                    self.span(Span::styled(url, Style::default().fg(Color::DarkGray)));
                    self.span(Span::raw(">"));
                }
            }
            _ => {}
        }
    }

    // ── Content handlers ────────────────────────────────────────────────

    fn text(&mut self, cow: CowStr<'_>) {
        let text = expand_tabs(&cow);

        if self.code.is_some() {
            self.code_text(&text);
            return;
        }

        let style = self.style();
        self.span(Span::styled(text, style));
    }

    /// Emit the lines of a fenced code block, highlighted when possible.
    fn code_text(&mut self, text: &str) {
        // Take the state out so highlight_line's borrow of it doesn't
        // conflict with emit_line's borrow of self.
        let mut code = self.code.take().expect("code block state present");

        match code.highlight.as_mut() {
            Some(hl) => {
                for line in LinesWithEndings::from(text) {
                    let spans: Vec<Span<'static>> = match hl.highlight_line(line, &SYNTAXES) {
                        Ok(ranges) => ranges
                            .into_iter()
                            .filter_map(|(hl_style, frag)| {
                                let content = frag.trim_end_matches('\n');
                                if content.is_empty() {
                                    return None;
                                }
                                let fg = Color::Rgb(
                                    hl_style.foreground.r,
                                    hl_style.foreground.g,
                                    hl_style.foreground.b,
                                );
                                Some(Span::styled(
                                    content.to_owned(),
                                    Style::default().fg(fg),
                                ))
                            })
                            .collect(),
                        Err(_) => vec![Span::styled(
                            line.trim_end_matches('\n').to_owned(),
                            Style::default().fg(Color::White),
                        )],
                    };
                    let mut full = vec![Span::raw(CODE_INDENT)];
                    full.extend(spans);
                    self.emit_line(Line::from(full));
                }
            }
            None => {
                for line in text.lines() {
                    self.emit_line(Line::from(vec![
                        Span::raw(CODE_INDENT),
                        Span::styled(line.to_owned(), Style::default().fg(Color::White)),
                    ]));
                }
            }
        }

        self.code = Some(code);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Ratatui renders `\t` as zero-width; expand to spaces up front.
fn expand_tabs(text: &str) -> String {
    if text.contains('\t') {
        text.replace('\t', "    ")
    } else {
        text.to_string()
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}
