use crate::renderer::SyntaxCache;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag};
use textwrap::{wrap, Options};

const ITALIC_ON: &str = "\x1B[3m";
const ITALIC_OFF: &str = "\x1B[23m";
const BOLD_ON: &str = "\x1B[1m";
const BOLD_OFF: &str = "\x1B[22m";
const RESET: &str = "\x1B[0m";

/// Renders assistant replies (markdown) for the terminal.
pub struct MarkdownRenderer {
    wrap_options: Options<'static>,
}

#[derive(Default)]
struct BlockState {
    paragraph: String,
    code_language: Option<String>,
    list_depth: usize,
}

impl MarkdownRenderer {
    pub fn new(width: usize) -> Self {
        let wrap_options = Options::new(width.max(20))
            .initial_indent("  ")
            .subsequent_indent("  ");

        Self { wrap_options }
    }

    pub fn wrap_options(&self) -> &Options<'static> {
        &self.wrap_options
    }

    pub fn render(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len() * 2);
        let mut state = BlockState::default();

        for event in Parser::new(text) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    self.flush_paragraph(&mut output, &mut state);
                    state.code_language = Some(match kind {
                        CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                            lang.trim().to_string()
                        }
                        _ => "txt".to_string(),
                    });
                    output.push('\n');
                }
                Event::End(Tag::CodeBlock(_)) => {
                    state.code_language = None;
                    output.push_str(RESET);
                    output.push('\n');
                }
                Event::Start(Tag::Heading(level, ..)) => {
                    self.flush_paragraph(&mut output, &mut state);
                    state.paragraph.push_str(BOLD_ON);
                    if level == HeadingLevel::H1 {
                        state.paragraph.push_str("# ");
                    }
                }
                Event::End(Tag::Heading(..)) => {
                    state.paragraph.push_str(BOLD_OFF);
                    self.flush_paragraph(&mut output, &mut state);
                    output.push('\n');
                }
                Event::Start(Tag::List(_)) => {
                    self.flush_paragraph(&mut output, &mut state);
                    state.list_depth += 1;
                }
                Event::End(Tag::List(_)) => {
                    state.list_depth = state.list_depth.saturating_sub(1);
                    if state.list_depth == 0 {
                        output.push('\n');
                    }
                }
                Event::Start(Tag::Item) => {
                    self.flush_paragraph(&mut output, &mut state);
                    state.paragraph.push_str("• ");
                }
                Event::End(Tag::Item) => self.flush_paragraph(&mut output, &mut state),
                Event::Start(Tag::Paragraph) => {
                    if !state.paragraph.is_empty() && state.list_depth == 0 {
                        self.flush_paragraph(&mut output, &mut state);
                    }
                }
                Event::End(Tag::Paragraph) => {
                    if state.list_depth == 0 {
                        self.flush_paragraph(&mut output, &mut state);
                        output.push('\n');
                    }
                }
                Event::Start(Tag::Emphasis) => state.paragraph.push_str(ITALIC_ON),
                Event::End(Tag::Emphasis) => state.paragraph.push_str(ITALIC_OFF),
                Event::Start(Tag::Strong) => state.paragraph.push_str(BOLD_ON),
                Event::End(Tag::Strong) => state.paragraph.push_str(BOLD_OFF),
                Event::Code(code) => {
                    state.paragraph.push('`');
                    state.paragraph.push_str(&code);
                    state.paragraph.push('`');
                }
                Event::Text(text) => match &state.code_language {
                    Some(language) => {
                        output.push_str(&SyntaxCache::global().highlight(&text, language))
                    }
                    None => state.paragraph.push_str(&text),
                },
                Event::SoftBreak => state.paragraph.push(' '),
                Event::HardBreak => {
                    self.flush_paragraph(&mut output, &mut state);
                }
                Event::Rule => {
                    self.flush_paragraph(&mut output, &mut state);
                    output.push_str("  ");
                    output.push_str(&"─".repeat(self.wrap_options.width.saturating_sub(4)));
                    output.push_str("\n\n");
                }
                _ => {}
            }
        }

        self.flush_paragraph(&mut output, &mut state);
        output.trim_end().to_string()
    }

    fn flush_paragraph(&self, output: &mut String, state: &mut BlockState) {
        if state.paragraph.is_empty() {
            return;
        }

        let lines = if state.paragraph.starts_with('•') {
            let bullet_indent = "  ".repeat(state.list_depth.max(1));
            let continuation = format!("{bullet_indent}  ");
            let options = Options::new(self.wrap_options.width)
                .initial_indent(&bullet_indent)
                .subsequent_indent(&continuation);
            wrap(&state.paragraph, options)
                .into_iter()
                .map(|line| line.into_owned())
                .collect::<Vec<_>>()
        } else {
            wrap(&state.paragraph, &self.wrap_options)
                .into_iter()
                .map(|line| line.into_owned())
                .collect()
        };

        for line in lines {
            output.push_str(&line);
            output.push('\n');
        }
        state.paragraph.clear();
    }
}
