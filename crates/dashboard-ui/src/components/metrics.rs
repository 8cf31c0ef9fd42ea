use crate::themes::Theme;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// A single headline figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Metrics laid out side by side as two lines: labels, then values.
///
/// Every column is as wide as its widest cell plus `gap` spaces.
pub struct MetricRow<'a> {
    pub metrics: &'a [Metric],
    pub theme: &'a Theme,
    pub gap: usize,
}

impl<'a> MetricRow<'a> {
    pub fn new(metrics: &'a [Metric], theme: &'a Theme) -> Self {
        Self {
            metrics,
            theme,
            gap: 4,
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'static>> {
        let mut labels = Vec::with_capacity(self.metrics.len());
        let mut values = Vec::with_capacity(self.metrics.len());

        for (i, metric) in self.metrics.iter().enumerate() {
            let width = metric.label.width().max(metric.value.width());
            let gap = if i + 1 == self.metrics.len() { 0 } else { self.gap };
            labels.push(Span::styled(
                pad(&metric.label, width + gap),
                self.theme.label,
            ));
            values.push(Span::styled(
                pad(&metric.value, width + gap),
                self.theme.value,
            ));
        }

        vec![Line::from(labels), Line::from(values)]
    }
}

fn pad(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_metric_row_two_lines() {
        let theme = Theme::dark();
        let metrics = vec![
            Metric::new("Total orders", "3"),
            Metric::new("Total Revenue", "IDR 60,00"),
        ];
        let lines = MetricRow::new(&metrics, &theme).to_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(text_of(&lines[0]), "Total orders    Total Revenue");
        assert_eq!(text_of(&lines[1]), format!("{:<16}{:<13}", "3", "IDR 60,00"));
    }

    #[test]
    fn test_metric_row_columns_aligned() {
        let theme = Theme::dark();
        let metrics = vec![
            Metric::new("Avg", "1.234.567,00"),
            Metric::new("Freq", "1,33"),
        ];
        let lines = MetricRow::new(&metrics, &theme).to_lines();
        assert_eq!(
            lines[0].spans[0].content.width(),
            lines[1].spans[0].content.width()
        );
        assert_eq!(lines[0].spans[0].style, theme.label);
        assert_eq!(lines[1].spans[0].style, theme.value);
    }

    #[test]
    fn test_metric_row_empty() {
        let theme = Theme::dark();
        let lines = MetricRow::new(&[], &theme).to_lines();
        assert!(lines.iter().all(|l| l.spans.is_empty()));
    }
}
