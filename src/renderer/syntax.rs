use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

const THEME: &str = "base16-ocean.dark";
const CODE_INDENT: &str = "    ";

static SYNTAX_CACHE: Lazy<SyntaxCache> = Lazy::new(SyntaxCache::load);

/// Fence tags models like to emit that the bundled syntaxes know under another name.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("c++", "cpp"),
    ("shell", "sh"),
    ("bash", "sh"),
    ("zsh", "sh"),
    ("console", "sh"),
    ("python3", "python"),
    ("py3", "python"),
    ("golang", "go"),
    ("jsonc", "json"),
    ("yml", "yaml"),
    ("csharp", "cs"),
    ("c#", "cs"),
];

/// Syntax definitions for code blocks in replies. Loaded once per process.
pub struct SyntaxCache {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntaxCache {
    pub fn global() -> &'static SyntaxCache {
        &SYNTAX_CACHE
    }

    fn load() -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: themes.remove(THEME).unwrap_or_default(),
        }
    }

    /// Resolve a fence info string such as `rust,ignore` or `Python title=x`.
    /// Unknown languages fall back to plain text.
    pub fn get_syntax(&self, info: &str) -> &SyntaxReference {
        let tag = info
            .split(|c: char| c == ',' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let token = LANGUAGE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == tag)
            .map_or(tag.as_str(), |(_, target)| *target);

        self.syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight `code` as 24-bit escaped lines, each indented for display.
    pub fn highlight(&self, code: &str, info: &str) -> String {
        let mut highlighter = HighlightLines::new(self.get_syntax(info), &self.theme);
        let mut output = String::with_capacity(code.len() * 2);

        for line in LinesWithEndings::from(code) {
            output.push_str(CODE_INDENT);
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false)),
                Err(_) => output.push_str(line),
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_info_uses_first_token() {
        let cache = SyntaxCache::global();
        assert_eq!(cache.get_syntax("rust,ignore").name, "Rust");
        assert_eq!(cache.get_syntax("Python title=demo.py").name, "Python");
    }

    #[test]
    fn aliases_resolve_to_bundled_syntaxes() {
        let cache = SyntaxCache::global();
        assert_eq!(cache.get_syntax("c++").name, "C++");
        assert_eq!(cache.get_syntax("python3").name, "Python");
        assert_eq!(
            cache.get_syntax("shell").name,
            cache.get_syntax("sh").name
        );
        assert_ne!(cache.get_syntax("shell").name, "Plain Text");
    }

    #[test]
    fn unknown_language_is_plain_text() {
        let cache = SyntaxCache::global();
        assert_eq!(cache.get_syntax("klingon").name, "Plain Text");
        assert_eq!(cache.get_syntax("").name, "Plain Text");
    }

    #[test]
    fn highlighted_lines_are_indented() {
        let out = SyntaxCache::global().highlight("let x = 1;\nlet y = 2;\n", "rust");
        assert_eq!(out.matches(CODE_INDENT).count(), 2);
        assert!(out.contains("\x1b[38;2;"));
    }
}
