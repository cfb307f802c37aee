use crate::models::ModelDescriptor;

const HEADERS: [&str; 4] = ["#", "Model Name", "Model Type", "Description"];
const INDEX_WIDTH: usize = 3;
const NAME_WIDTH: usize = 30;
const CAPABILITY_WIDTH: usize = 25;
const MIN_DESCRIPTION_WIDTH: usize = 16;

/// Numbered catalog table. Row numbers are the 1-based indices the selector accepts.
#[derive(Debug)]
pub struct ModelTable {
    rows: Vec<[String; 4]>,
    column_widths: [usize; 4],
}

impl ModelTable {
    pub fn new(models: &[ModelDescriptor], max_width: usize) -> Self {
        // Leading margin, outer borders and " │ " separators.
        let chrome = 2 + 4 + 3 * (HEADERS.len() - 1);
        let description_width = max_width
            .saturating_sub(INDEX_WIDTH + NAME_WIDTH + CAPABILITY_WIDTH + chrome)
            .max(MIN_DESCRIPTION_WIDTH);
        let column_widths = [INDEX_WIDTH, NAME_WIDTH, CAPABILITY_WIDTH, description_width];

        let rows = models
            .iter()
            .enumerate()
            .map(|(i, model)| {
                [
                    (i + 1).to_string(),
                    truncate(model.base_name(), NAME_WIDTH),
                    truncate(model.capability.trim(), CAPABILITY_WIDTH),
                    truncate(model.description.trim(), description_width),
                ]
            })
            .collect();

        Self {
            rows,
            column_widths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut output = String::with_capacity(
            (self.rows.len() * 2 + 3) * (self.column_widths.iter().sum::<usize>() + 16),
        );

        self.render_border(&mut output, '┌', '┬', '┐');
        let headers = HEADERS.map(str::to_string);
        self.render_row(&mut output, &headers);
        self.render_border(&mut output, '├', '┼', '┤');

        for (i, row) in self.rows.iter().enumerate() {
            self.render_row(&mut output, row);
            if i < self.rows.len() - 1 {
                self.render_border(&mut output, '├', '┼', '┤');
            }
        }

        self.render_border(&mut output, '└', '┴', '┘');
        output
    }

    fn render_border(&self, output: &mut String, left: char, middle: char, right: char) {
        output.push_str("  ");
        output.push(left);
        for (i, &width) in self.column_widths.iter().enumerate() {
            output.push_str(&"─".repeat(width + 2));
            if i < self.column_widths.len() - 1 {
                output.push(middle);
            }
        }
        output.push(right);
        output.push('\n');
    }

    fn render_row(&self, output: &mut String, cells: &[String; 4]) {
        output.push_str("  │ ");
        for (i, (cell, &width)) in cells.iter().zip(&self.column_widths).enumerate() {
            let padding = width.saturating_sub(cell.chars().count());
            if i == 0 {
                output.push_str(&" ".repeat(padding));
                output.push_str(cell);
            } else {
                output.push_str(cell);
                output.push_str(&" ".repeat(padding));
            }
            if i < self.column_widths.len() - 1 {
                output.push_str(" │ ");
            }
        }
        output.push_str(" │\n");
    }
}

/// Cut `text` to `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
