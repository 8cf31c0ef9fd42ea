use crate::themes::Theme;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

/// Configuration controlling the visual appearance of a bar list.
pub struct BarListConfig {
    /// Width in terminal columns of the longest bar.
    pub width: u16,
    /// Character used for the filled portion of a bar.
    pub filled_char: char,
    /// Character used for the empty portion of a bar.
    pub empty_char: char,
    /// Labels wider than this are truncated with `…`.
    pub max_label_width: usize,
}

impl Default for BarListConfig {
    fn default() -> Self {
        Self {
            width: 30,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
            max_label_width: 28,
        }
    }
}

/// One labelled bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarEntry {
    pub label: String,
    pub value: f64,
    /// Text printed after the bar, usually the formatted value.
    pub display: String,
}

impl BarEntry {
    pub fn new(label: impl Into<String>, value: f64, display: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            display: display.into(),
        }
    }
}

// ── BarList ───────────────────────────────────────────────────────────────────

/// Horizontal bar chart drawn with block characters, one bar per line.
///
/// Bars are scaled against the largest value in the list. The first entry is
/// drawn in the theme's highlight colour and the rest in the muted colour.
pub struct BarList<'a> {
    pub entries: &'a [BarEntry],
    pub theme: &'a Theme,
    pub config: BarListConfig,
}

impl<'a> BarList<'a> {
    pub fn new(entries: &'a [BarEntry], theme: &'a Theme) -> Self {
        Self {
            entries,
            theme,
            config: BarListConfig::default(),
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.config.width = width;
        self
    }

    /// Render every entry as a [`Line`]: padded label, bar, value.
    pub fn to_lines(&self) -> Vec<Line<'static>> {
        let max_value = self
            .entries
            .iter()
            .map(|e| e.value)
            .fold(0.0_f64, f64::max);
        let label_width = self
            .entries
            .iter()
            .map(|e| e.label.width().min(self.config.max_label_width))
            .max()
            .unwrap_or(0);

        self.entries
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                let filled = bar_cells(entry.value, max_value, self.config.width);
                let empty = self.config.width.saturating_sub(filled);

                let label = pad_label(&entry.label, label_width, self.config.max_label_width);
                let filled_str = self.config.filled_char.to_string().repeat(filled as usize);
                let empty_str = self.config.empty_char.to_string().repeat(empty as usize);

                Line::from(vec![
                    Span::styled(label, self.theme.label),
                    Span::raw(" "),
                    Span::styled(filled_str, self.theme.bar_style(rank)),
                    Span::styled(empty_str, self.theme.bar_empty),
                    Span::styled(format!(" {}", entry.display), self.theme.bar_label),
                ])
            })
            .collect()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Number of filled cells for `value` on a bar `width` cells long.
///
/// Any positive value gets at least one cell so small entries stay visible.
fn bar_cells(value: f64, max_value: f64, width: u16) -> u16 {
    if max_value <= 0.0 || value <= 0.0 || !value.is_finite() {
        return 0;
    }
    let cells = ((value / max_value) * width as f64).round() as u16;
    cells.clamp(1, width)
}

/// Truncate `label` to `max` display columns and right-pad it to `width`.
fn pad_label(label: &str, width: usize, max: usize) -> String {
    let mut out = String::new();
    if label.width() > max {
        let mut used = 0;
        for c in label.chars() {
            let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w + 1 > max {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push('…');
    } else {
        out.push_str(label);
    }
    let pad = width.saturating_sub(out.width());
    out.push_str(&" ".repeat(pad));
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn sample() -> Vec<BarEntry> {
        vec![
            BarEntry::new("cama_mesa_banho", 10.0, "10"),
            BarEntry::new("toys", 5.0, "5"),
            BarEntry::new("books", 0.0, "0"),
        ]
    }

    #[test]
    fn test_bar_list_one_line_per_entry() {
        let theme = Theme::dark();
        let entries = sample();
        assert_eq!(BarList::new(&entries, &theme).to_lines().len(), 3);
    }

    #[test]
    fn test_bar_list_scales_against_max() {
        let theme = Theme::dark();
        let entries = sample();
        let lines = BarList::new(&entries, &theme).with_width(20).to_lines();

        assert_eq!(lines[0].spans[2].content.chars().count(), 20);
        assert_eq!(lines[1].spans[2].content.chars().count(), 10);
        assert_eq!(lines[2].spans[2].content.chars().count(), 0);
        for line in &lines {
            let bar: usize = line.spans[2].content.chars().count()
                + line.spans[3].content.chars().count();
            assert_eq!(bar, 20);
        }
    }

    #[test]
    fn test_bar_list_highlights_first_entry() {
        let theme = Theme::dark();
        let entries = sample();
        let lines = BarList::new(&entries, &theme).to_lines();
        assert_eq!(lines[0].spans[2].style, theme.bar_highlight);
        assert_eq!(lines[1].spans[2].style, theme.bar_muted);
    }

    #[test]
    fn test_bar_list_labels_aligned() {
        let theme = Theme::dark();
        let entries = sample();
        let lines = BarList::new(&entries, &theme).to_lines();
        let widths: Vec<usize> = lines.iter().map(|l| l.spans[0].content.width()).collect();
        assert!(widths.iter().all(|&w| w == "cama_mesa_banho".len()));
        assert!(text_of(&lines[1]).ends_with(" 5"));
    }

    #[test]
    fn test_bar_list_empty() {
        let theme = Theme::dark();
        assert!(BarList::new(&[], &theme).to_lines().is_empty());
    }

    #[test]
    fn test_small_positive_value_visible() {
        assert_eq!(bar_cells(1.0, 1000.0, 30), 1);
        assert_eq!(bar_cells(0.0, 1000.0, 30), 0);
        assert_eq!(bar_cells(5.0, 0.0, 30), 0);
    }

    #[test]
    fn test_pad_label_truncates_wide_labels() {
        let padded = pad_label("informatica_acessorios", 10, 10);
        assert_eq!(padded.width(), 10);
        assert!(padded.ends_with('…'));
    }

    #[test]
    fn test_pad_label_wide_chars() {
        // CJK characters are two columns each.
        let padded = pad_label("家具", 6, 10);
        assert_eq!(padded.width(), 6);
    }
}
