use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Marker placed either side of the application title.
pub const ACCENT: &str = "◆ ◇";

/// Dashboard header rendering four lines:
///
/// 1. Application title (ALL CAPS).
/// 2. A 60-column `=` separator.
/// 3. Data source, active range and currency in `[ source | range | code ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// Data directory or other label for where the tables came from.
    pub source: &'a str,
    /// Active range, already formatted (e.g. `"2017-01-01 → 2018-08-31"`).
    pub range: &'a str,
    /// Currency code the monetary values are shown in.
    pub currency: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(source: &'a str, range: &'a str, currency: &'a str, theme: &'a Theme) -> Self {
        Self {
            source,
            range,
            currency,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.header_accent),
                Span::styled(" E-COMMERCE DASHBOARD ", self.theme.header),
                Span::styled(ACCENT, self.theme.header_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.separator)),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.source, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.range, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.currency.to_uppercase(), self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
