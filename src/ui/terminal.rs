use crate::models::{Error, ModelDescriptor, Result};
use crate::renderer::{MarkdownRenderer, ModelTable};
use crate::session::{LineSource, Presenter};
use colored::*;
use rustyline::{config::Configurer, error::ReadlineError, DefaultEditor};
use std::io::{self, Write};
use std::path::Path;
use terminal_size::{terminal_size, Width};
use textwrap::wrap;

const WELCOME_MESSAGE: &str = "Welcome to **Workers AI Chat**!\n\n\
Pick a mode and a model, then start typing:\n\n\
* press `Enter` on an empty line or type `q` to leave\n\
* `Ctrl-D` also ends the session";

const INPUT_HISTORY_SIZE: usize = 100;

pub struct TerminalUI {
    renderer: MarkdownRenderer,
    editor: DefaultEditor,
    width: usize,
}

impl TerminalUI {
    pub fn new() -> Result<Self> {
        let width = match terminal_size() {
            Some((Width(w), _)) => (w as usize).saturating_sub(2),
            None => 80,
        };

        let mut editor = DefaultEditor::new()?;
        editor.set_max_history_size(INPUT_HISTORY_SIZE)?;

        Ok(Self {
            renderer: MarkdownRenderer::new(width),
            editor,
            width,
        })
    }

    pub fn show_welcome_message(&self) -> Result<()> {
        clearscreen::clear()?;
        println!("{}", self.renderer.render(WELCOME_MESSAGE).cyan());
        println!();
        Ok(())
    }

    fn clear_status_line(&self) {
        print!("\r{}\r", " ".repeat(self.width));
    }
}

impl LineSource for TerminalUI {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let prompt = format!("\n{}", prompt.blue().bold());
        loop {
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(line.as_str())?;
                    }
                    return Ok(Some(line));
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "Press Enter on an empty line or type 'q' to quit".yellow());
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Presenter for TerminalUI {
    fn render_models(&mut self, models: &[ModelDescriptor]) -> Result<()> {
        let table = ModelTable::new(models, self.width);
        if table.is_empty() {
            println!("{}", "No models available to display.".yellow());
        } else {
            print!("{}", table.render());
        }
        io::stdout().flush()?;
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        println!("{}", message.green());
        Ok(())
    }

    fn thinking(&mut self) -> Result<()> {
        print!("{}", "Thinking...".yellow());
        io::stdout().flush()?;
        Ok(())
    }

    fn present(&mut self, reply: &str) -> Result<()> {
        self.clear_status_line();
        println!("{}", "Assistant's response:".bold());
        println!("{}", self.renderer.render(reply).cyan());
        io::stdout().flush()?;
        Ok(())
    }

    fn image_saved(&mut self, path: &Path, _bytes: usize) -> Result<()> {
        self.clear_status_line();
        println!(
            "{}",
            format!("✅ Image saved as '{}'", path.display()).green()
        );
        Ok(())
    }

    fn report_error(&mut self, error: &Error) {
        self.clear_status_line();
        for line in wrap(&format!("Error: {error}"), self.renderer.wrap_options()) {
            eprintln!("{}", line.red());
        }
    }

    fn farewell(&mut self) -> Result<()> {
        println!("\n{}", "Have a nice time :) Goodbye!".green());
        Ok(())
    }
}
