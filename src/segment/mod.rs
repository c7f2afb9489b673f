//! Statement segmentation
//!
//! Splits a SQL script into individual statements on `;`, stripping `--` line
//! comments and `/* */` block comments and never splitting inside a quoted
//! string.
//!
//! ## Line boundaries
//!
//! In [`LineMode::ResetPerLine`] (the default) every physical line starts with
//! a fresh scan state: a block comment or string literal left open at the end
//! of a line is not tracked into the next one. [`LineMode::Continuous`] carries
//! the scan state across lines instead. In both modes the statement buffer is
//! kept across lines and lines are joined with `'\n'`.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How scan state is treated at physical line boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineMode {
    /// Every line starts from a fresh scan state
    #[default]
    ResetPerLine,
    /// Quote and comment state persists across lines
    Continuous,
}

impl LineMode {
    pub fn name(&self) -> &'static str {
        match self {
            LineMode::ResetPerLine => "reset-per-line",
            LineMode::Continuous => "continuous",
        }
    }
}

impl fmt::Display for LineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reset" | "reset-per-line" | "per-line" => Ok(LineMode::ResetPerLine),
            "continuous" | "carry" => Ok(LineMode::Continuous),
            _ => Err(format!(
                "Invalid line mode: {}. Expected: reset-per-line, continuous",
                s
            )),
        }
    }
}

/// Scanner state threaded through every character of a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanState {
    in_string: bool,
    string_delimiter: char,
    escape: bool,
    in_block_comment: bool,
    in_line_comment: bool,
    prev_char: Option<char>,
}

/// Incremental statement splitter fed one line at a time
///
/// # Example
///
/// ```rust
/// use sql_ingest::segment::{LineMode, StatementSegmenter};
///
/// let mut segmenter = StatementSegmenter::new(LineMode::ResetPerLine);
/// let done = segmenter.push_line("SELECT 1; SELECT 'a;b' -- trailing");
/// assert_eq!(done, vec!["SELECT 1".to_string()]);
/// assert_eq!(segmenter.finish().as_deref(), Some("SELECT 'a;b'"));
/// ```
#[derive(Debug, Clone)]
pub struct StatementSegmenter {
    mode: LineMode,
    state: ScanState,
    buffer: String,
    lines_seen: usize,
}

impl Default for StatementSegmenter {
    fn default() -> Self {
        Self::new(LineMode::default())
    }
}

impl StatementSegmenter {
    /// Create a segmenter with an empty buffer
    pub fn new(mode: LineMode) -> Self {
        Self {
            mode,
            state: ScanState::default(),
            buffer: String::with_capacity(1024),
            lines_seen: 0,
        }
    }

    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Scan one physical line (without its line terminator) and return the
    /// statements it completed, in order.
    pub fn push_line(&mut self, line: &str) -> Vec<String> {
        let mut completed = Vec::new();

        if self.lines_seen > 0 {
            self.line_break();
        }
        if self.mode == LineMode::ResetPerLine {
            self.state = ScanState::default();
        }

        for c in line.chars() {
            self.scan_char(c, &mut completed);
        }

        self.lines_seen += 1;
        completed
    }

    /// Consume the segmenter and return the trailing statement, if any.
    ///
    /// A final statement without a terminating `;` is still accepted.
    pub fn finish(self) -> Option<String> {
        let statement = self.buffer.trim();
        if statement.is_empty() {
            None
        } else {
            Some(statement.to_string())
        }
    }

    fn line_break(&mut self) {
        match self.mode {
            LineMode::ResetPerLine => {
                if !self.buffer.is_empty() {
                    self.buffer.push('\n');
                }
            }
            LineMode::Continuous => {
                let state = &mut self.state;
                if state.in_line_comment {
                    state.in_line_comment = false;
                    state.prev_char = None;
                    if !self.buffer.is_empty() {
                        self.buffer.push('\n');
                    }
                } else if state.in_block_comment {
                    state.prev_char = Some('\n');
                } else if state.in_string {
                    self.buffer.push('\n');
                    state.escape = false;
                    state.prev_char = Some('\n');
                } else {
                    if !self.buffer.is_empty() {
                        self.buffer.push('\n');
                    }
                    state.escape = false;
                    state.prev_char = None;
                }
            }
        }
    }

    fn scan_char(&mut self, c: char, completed: &mut Vec<String>) {
        let state = &mut self.state;

        if state.in_line_comment {
            return;
        }

        if state.in_block_comment {
            if state.prev_char == Some('*') && c == '/' {
                state.in_block_comment = false;
                state.prev_char = None;
            } else {
                state.prev_char = Some(c);
            }
            return;
        }

        if state.in_string {
            self.buffer.push(c);
            if c == state.string_delimiter && !state.escape {
                state.in_string = false;
                state.string_delimiter = '\0';
            } else {
                state.escape = c == '\\' && !state.escape;
            }
            state.prev_char = Some(c);
            return;
        }

        if c == '\'' || c == '"' {
            self.buffer.push(c);
            state.in_string = true;
            state.string_delimiter = c;
            state.prev_char = Some(c);
            return;
        }

        if state.prev_char == Some('/') && c == '*' {
            self.buffer.pop();
            state.in_block_comment = true;
            state.prev_char = None;
            return;
        }

        if state.prev_char == Some('-') && c == '-' {
            self.buffer.pop();
            state.in_line_comment = true;
            state.prev_char = None;
            return;
        }

        if c == ';' {
            let statement = self.buffer.trim();
            if !statement.is_empty() {
                completed.push(statement.to_string());
            }
            self.buffer.clear();
            state.prev_char = None;
            return;
        }

        self.buffer.push(c);
        state.prev_char = Some(c);
        state.escape = false;
    }
}

/// Lazy iterator of statements over a sequence of lines
pub struct Statements<I> {
    lines: I,
    segmenter: Option<StatementSegmenter>,
    pending: VecDeque<String>,
}

impl<I> Statements<I> {
    pub fn new(lines: I, mode: LineMode) -> Self {
        Self {
            lines,
            segmenter: Some(StatementSegmenter::new(mode)),
            pending: VecDeque::new(),
        }
    }
}

impl<I, S> Iterator for Statements<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(statement) = self.pending.pop_front() {
                return Some(statement);
            }

            let segmenter = self.segmenter.as_mut()?;
            match self.lines.next() {
                Some(line) => self.pending.extend(segmenter.push_line(line.as_ref())),
                None => return self.segmenter.take().and_then(StatementSegmenter::finish),
            }
        }
    }
}

/// Split a whole script held in memory
pub fn split_statements(script: &str, mode: LineMode) -> Statements<std::str::Lines<'_>> {
    Statements::new(script.lines(), mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(script: &str) -> Vec<String> {
        split_statements(script, LineMode::ResetPerLine).collect()
    }

    fn split_continuous(script: &str) -> Vec<String> {
        split_statements(script, LineMode::Continuous).collect()
    }

    #[test]
    fn test_splits_on_terminator() {
        assert_eq!(
            split("INSERT INTO t VALUES (1,2); INSERT INTO t VALUES (3,4)"),
            vec!["INSERT INTO t VALUES (1,2)", "INSERT INTO t VALUES (3,4)"]
        );
    }

    #[test]
    fn test_plain_script_matches_semicolon_substrings() {
        let script = " a ; b;;  ;c d ;e";
        let expected: Vec<String> = script
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        assert_eq!(split(script), expected);
    }

    #[test]
    fn test_blank_statements_dropped() {
        assert!(split(" ; ;\n;  ").is_empty());
        assert!(split("").is_empty());
    }

    #[test]
    fn test_quoted_terminator_kept() {
        assert_eq!(
            split("INSERT INTO t VALUES ('a;b', \"c;d\");"),
            vec!["INSERT INTO t VALUES ('a;b', \"c;d\")"]
        );
    }

    #[test]
    fn test_comment_markers_inside_string_kept() {
        assert_eq!(
            split("SELECT '/* x */', '-- y';"),
            vec!["SELECT '/* x */', '-- y'"]
        );
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        assert_eq!(
            split(r"SELECT 'it\'s; fine'; SELECT 2"),
            vec![r"SELECT 'it\'s; fine'", "SELECT 2"]
        );
    }

    #[test]
    fn test_doubled_quote_inside_string() {
        assert_eq!(split("SELECT 'it''s;ok';"), vec!["SELECT 'it''s;ok'"]);
    }

    #[test]
    fn test_line_comment_removed_until_line_end() {
        assert_eq!(
            split("SELECT 1 -- hidden; not a split\n, 2;"),
            vec!["SELECT 1 \n, 2"]
        );
    }

    #[test]
    fn test_single_line_block_comment_removed() {
        assert_eq!(split("SELECT /* gone; */ 1;"), vec!["SELECT  1"]);
    }

    #[test]
    fn test_multi_line_block_comment_not_tracked_across_lines() {
        // The second line starts from a fresh state, so its text (including
        // the closing marker) is treated as regular SQL.
        assert_eq!(
            split("SELECT 1 /* open\nstill comment */;"),
            vec!["SELECT 1 \nstill comment */"]
        );
    }

    #[test]
    fn test_multi_line_string_not_tracked_across_lines() {
        // The quote on the second line opens a new literal that swallows the
        // final terminator.
        assert_eq!(split("SELECT 'a\nb;c';"), vec!["SELECT 'a\nb", "c';"]);
    }

    #[test]
    fn test_continuous_mode_removes_multi_line_block_comment() {
        assert_eq!(
            split_continuous("SELECT 1 /* open\nstill; comment */;"),
            vec!["SELECT 1"]
        );
    }

    #[test]
    fn test_continuous_mode_keeps_multi_line_string() {
        assert_eq!(
            split_continuous("SELECT 'a\nb;c';"),
            vec!["SELECT 'a\nb;c'"]
        );
    }

    #[test]
    fn test_continuous_mode_line_comment_ends_at_line_break() {
        assert_eq!(
            split_continuous("SELECT 1 -- note\n+ 2;"),
            vec!["SELECT 1 \n+ 2"]
        );
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        assert_eq!(split("SELECT 1;\nSELECT 2"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_statement_spanning_lines() {
        let script = "CREATE TABLE t (\n  id INT,\n  name TEXT\n);";
        assert_eq!(
            split(script),
            vec!["CREATE TABLE t (\n  id INT,\n  name TEXT\n)"]
        );
    }

    #[test]
    fn test_push_line_reports_completed_statements() {
        let mut segmenter = StatementSegmenter::new(LineMode::ResetPerLine);
        assert!(segmenter.push_line("CREATE TABLE t (id INT)").is_empty());
        assert_eq!(
            segmenter.push_line(";INSERT INTO t VALUES (1);"),
            vec!["CREATE TABLE t (id INT)", "INSERT INTO t VALUES (1)"]
        );
        assert_eq!(segmenter.finish(), None);
    }

    #[test]
    fn test_line_mode_from_str() {
        assert_eq!("continuous".parse::<LineMode>(), Ok(LineMode::Continuous));
        assert_eq!(
            "reset-per-line".parse::<LineMode>(),
            Ok(LineMode::ResetPerLine)
        );
        assert!("sometimes".parse::<LineMode>().is_err());
    }
}
