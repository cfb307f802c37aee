mod markdown;
mod syntax;
mod table;

pub use markdown::MarkdownRenderer;
pub use syntax::SyntaxCache;
pub use table::ModelTable;
