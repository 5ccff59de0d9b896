use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_MAX_CONCURRENT: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(500);

/// Placeholder replaced by the cell text when the prompt is built.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Rewrites AI-sounding English into plain conversational English and asks
/// for the bare result only.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "以下文本由AI生成，请降低其中AI的成分，保持英文，看起来更口语，更自然，更通俗易懂，\
如果产生了多个结果，只保留一个意思最为接近的即可，结果不包含你分析的过程，\
不需要你在结果后面使用括号做解释，也不需要“Here’s a more natural and conversational version:” 这种说法与方式，\
只需要你选择好生成的回答后，只告诉我回答，我将直接保存你的返回值作为结果，所以不需要那么多的修饰，只输出转换后的结果，\
其他多余的一句话都不需要：{text}";

/// Worksheet read from and written to when the table is a workbook.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Empty and whitespace-only values are never sent to the remote API.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Immutable parameters of one rewrite run.
#[derive(Clone)]
pub struct RunConfiguration {
    pub batch_size: usize,
    pub max_concurrent: usize,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub prompt_template: String,
    pub request_timeout: Duration,
    pub pacing_delay: Duration,
}

impl RunConfiguration {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }

    pub fn render_prompt(&self, text: &str) -> String {
        self.prompt_template.replace(TEXT_PLACEHOLDER, text)
    }
}

impl fmt::Debug for RunConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfiguration")
            .field("batch_size", &self.batch_size)
            .field("max_concurrent", &self.max_concurrent)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .field("pacing_delay", &self.pacing_delay)
            .finish()
    }
}

/// A loaded dataset. `header` is carried through untouched when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Pads every row (and the header) with empty cells so the table is
    /// rectangular and at least `min_width` columns wide.
    pub fn pad_to(&mut self, min_width: usize) {
        let widest = self
            .rows
            .iter()
            .chain(self.header.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        let width = widest.max(min_width);

        for row in self.rows.iter_mut().chain(self.header.iter_mut()) {
            row.resize(width, String::new());
        }
    }

    /// The cell values of `column`, one per row; missing cells read as empty.
    pub fn column(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or_default())
            .collect()
    }

    /// Caller guarantees the table was padded past `column`.
    pub fn set_column(&mut self, column: usize, values: Vec<String>) {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[column] = value;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub rows: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.rows as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: Table,
    pub summary: RunSummary,
}

/// What a run would do, computed without contacting the API.
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunReport {
    pub rows: usize,
    /// Non-blank source cells, one API request each.
    pub requests: usize,
    pub header: Option<Vec<String>>,
}

impl DryRunReport {
    pub fn from_table(table: &Table, source_column: usize) -> Self {
        let sources = table.column(source_column);
        Self {
            rows: sources.len(),
            requests: sources.iter().filter(|text| !is_blank(text)).count(),
            header: table.header.clone(),
        }
    }

    pub fn skipped(&self) -> usize {
        self.rows - self.requests
    }
}
