use serde::{Deserialize, Serialize};

// ── Locale ────────────────────────────────────────────────────────────────────

/// Number and currency conventions for display.
///
/// The dashboard reports rupiah amounts with Colombian-Spanish separators
/// by default, which is why `es_CO` is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    EsCo,
    IdId,
    EnUs,
    DeDe,
}

impl Locale {
    /// Parse a locale tag such as `"es_CO"` or `"en-US"`; unknown tags fall
    /// back to [`Locale::EsCo`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.replace('-', "_").to_lowercase().as_str() {
            "id_id" | "id" => Locale::IdId,
            "en_us" | "en" => Locale::EnUs,
            "de_de" | "de" => Locale::DeDe,
            _ => Locale::EsCo,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EsCo => "es_CO",
            Locale::IdId => "id_ID",
            Locale::EnUs => "en_US",
            Locale::DeDe => "de_DE",
        }
    }

    fn group_separator(&self) -> char {
        match self {
            Locale::EnUs => ',',
            Locale::EsCo | Locale::IdId | Locale::DeDe => '.',
        }
    }

    fn decimal_separator(&self) -> char {
        match self {
            Locale::EnUs => '.',
            Locale::EsCo | Locale::IdId | Locale::DeDe => ',',
        }
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Format a floating-point number with `,` thousands separators and a fixed
/// number of decimal places.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    format_number_in(value, decimals, Locale::EnUs)
}

/// Format a number with the separators of `locale`.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::{format_number_in, Locale};
///
/// assert_eq!(format_number_in(1234567.891, 2, Locale::EsCo), "1.234.567,89");
/// assert_eq!(format_number_in(1234567.891, 2, Locale::EnUs), "1,234,567.89");
/// ```
pub fn format_number_in(value: f64, decimals: u32, locale: Locale) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge exact binary midpoints (1.005) the way a human would round them.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string(), locale.group_separator());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.50" → "50"
        let digits = &frac_str[2..];
        format!("{}{}{}", grouped, locale.decimal_separator(), digits)
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Integer count with thousands separators.
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string(), ',')
}

// ── Currency ──────────────────────────────────────────────────────────────────

/// A currency code plus the locale used to lay it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub code: String,
    pub locale: Locale,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            code: "IDR".to_string(),
            locale: Locale::EsCo,
        }
    }
}

impl CurrencyFormat {
    pub fn new(code: impl Into<String>, locale: Locale) -> Self {
        Self {
            code: code.into().to_uppercase(),
            locale,
        }
    }

    /// Symbol shown for the code; `id_ID` writes rupiah as `Rp`.
    fn symbol(&self) -> &str {
        match (self.locale, self.code.as_str()) {
            (Locale::IdId, "IDR") => "Rp",
            (Locale::EnUs, "USD") => "$",
            (Locale::DeDe, "EUR") => "€",
            _ => &self.code,
        }
    }

    /// Format a monetary amount with two decimals.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashboard_core::formatting::{CurrencyFormat, Locale};
    ///
    /// let idr = CurrencyFormat::default();
    /// assert_eq!(idr.format(1234567.5), "IDR 1.234.567,50");
    ///
    /// let rp = CurrencyFormat::new("IDR", Locale::IdId);
    /// assert_eq!(rp.format(1500.0), "Rp1.500,00");
    ///
    /// let usd = CurrencyFormat::new("usd", Locale::EnUs);
    /// assert_eq!(usd.format(-9.99), "-$9.99");
    /// ```
    pub fn format(&self, amount: f64) -> String {
        let body = format_number_in(amount.abs(), 2, self.locale);
        let sign = if amount < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
            "-"
        } else {
            ""
        };
        let symbol = self.symbol();

        match self.locale {
            Locale::DeDe => format!("{}{} {}", sign, body, symbol),
            Locale::IdId if symbol == "Rp" => format!("{}{}{}", sign, symbol, body),
            Locale::EnUs if symbol == "$" => format!("{}{}{}", sign, symbol, body),
            _ => format!("{}{} {}", sign, symbol, body),
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert `sep` every three digits from the right of an integer string.
fn group_thousands(s: &str, sep: char) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(sep);
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
