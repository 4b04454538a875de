//! Word wrapping for the transcript pane.

use ratatui::{
    layout::Alignment,
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

/// Pre-wrap `lines` to `width` columns, breaking at spaces and splitting
/// words longer than a full row. Styles and alignment are preserved. Rendering
/// the result without ratatui's `Wrap` keeps the row count and the output in
/// agreement, so `lines.len()` is the exact scroll height.
pub fn prewrap_lines(lines: &[Line], width: u16) -> Vec<Line<'static>> {
    let width = width.max(1) as usize;
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let mut wrapper = LineWrapper::new(width, line.style, line.alignment);
        for span in &line.spans {
            let style = line.style.patch(span.style);
            for ch in span.content.chars() {
                wrapper.push(ch, style);
            }
        }
        wrapper.finish(&mut out);
    }
    out
}

struct LineWrapper {
    width: usize,
    style: Style,
    alignment: Option<Alignment>,
    rows: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_width: usize,
    word: Vec<(char, Style)>,
    word_width: usize,
}

impl LineWrapper {
    fn new(width: usize, style: Style, alignment: Option<Alignment>) -> Self {
        Self {
            width,
            style,
            alignment,
            rows: Vec::new(),
            current: Vec::new(),
            current_width: 0,
            word: Vec::new(),
            word_width: 0,
        }
    }

    fn push(&mut self, ch: char, style: Style) {
        if ch == ' ' {
            self.flush_word();
            if self.current_width < self.width {
                self.append(ch, 1, style);
            } else {
                self.emit();
            }
        } else {
            self.word_width += ch.width().unwrap_or(0);
            self.word.push((ch, style));
        }
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        if self.current_width > 0 && self.current_width + self.word_width > self.width {
            self.emit();
        }
        for (ch, style) in std::mem::take(&mut self.word) {
            let w = ch.width().unwrap_or(0);
            if self.current_width > 0 && self.current_width + w > self.width {
                self.emit();
            }
            self.append(ch, w, style);
        }
        self.word_width = 0;
    }

    fn append(&mut self, ch: char, w: usize, style: Style) {
        match self.current.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push(ch),
            _ => self.current.push(Span::styled(ch.to_string(), style)),
        }
        self.current_width += w;
    }

    fn emit(&mut self) {
        let mut row = Line::from(std::mem::take(&mut self.current));
        row.style = self.style;
        row.alignment = self.alignment;
        self.rows.push(row);
        self.current_width = 0;
    }

    fn finish(mut self, out: &mut Vec<Line<'static>>) {
        self.flush_word();
        if !self.current.is_empty() || self.rows.is_empty() {
            self.emit();
        }
        out.append(&mut self.rows);
    }
}
