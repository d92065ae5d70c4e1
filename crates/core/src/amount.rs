//! Currency amounts: whole-unit coercion, display formatting, and words.

use crate::{Error, Result};

/// Suffix appended to every amount-in-words string.
pub const DEFAULT_CURRENCY_SUFFIX: &str = " Rupees Only";

const ONES: [&str; 20] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// Short-scale group names, by power of one thousand.
const SCALES: [&str; 7] = [
    "",
    "Thousand",
    "Million",
    "Billion",
    "Trillion",
    "Quadrillion",
    "Quintillion",
];

/// Words for 1..=99.
fn below_hundred(n: u64) -> String {
    let n = n as usize;
    if n < 20 {
        ONES[n].to_string()
    } else if n % 10 == 0 {
        TENS[n / 10].to_string()
    } else {
        format!("{}-{}", TENS[n / 10], ONES[n % 10])
    }
}

/// Words for 1..=999.
fn below_thousand(n: u64) -> Vec<String> {
    let mut words = Vec::new();
    let hundreds = n / 100;
    let rest = n % 100;

    if hundreds > 0 {
        words.push(ONES[hundreds as usize].to_string());
        words.push("Hundred".to_string());
        if rest > 0 {
            words.push("And".to_string());
        }
    }
    if rest > 0 {
        words.push(below_hundred(rest));
    }

    words
}

/// English cardinal words for `n`, title-cased.
pub fn cardinal_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push(rest % 1000);
        rest /= 1000;
    }

    let mut words: Vec<String> = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        // A trailing group under one hundred is joined with "And"
        // ("One Thousand And One").
        if scale == 0 && group < 100 && !words.is_empty() {
            words.push("And".to_string());
        }
        words.extend(below_thousand(group));
        if scale > 0 {
            words.push(SCALES[scale].to_string());
        }
    }

    words.join(" ")
}

/// Insert ',' between every three integer digits of a plain decimal string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats donation amounts for receipts.
#[derive(Debug, Clone)]
pub struct AmountFormatter {
    suffix: String,
}

impl Default for AmountFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl AmountFormatter {
    /// Create a formatter using the rupee suffix.
    pub fn new() -> Self {
        Self {
            suffix: DEFAULT_CURRENCY_SUFFIX.to_string(),
        }
    }

    /// Use a different currency suffix (include the leading space).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Coerce a recorded amount to whole units, truncating toward zero.
    ///
    /// Negative amounts (reversal entries) are kept; only values with no
    /// whole-unit equivalent are rejected.
    pub fn whole_units(&self, value: f64) -> Result<i64> {
        if !value.is_finite() {
            return Err(Error::InvalidAmount(format!(
                "{} is not a finite number",
                value
            )));
        }
        let truncated = value.trunc();
        if truncated >= i64::MAX as f64 || truncated < i64::MIN as f64 {
            return Err(Error::InvalidAmount(format!("{} is out of range", value)));
        }

        Ok(truncated as i64)
    }

    /// Amount in words followed by the currency suffix.
    pub fn to_words(&self, amount: i64) -> String {
        let words = cardinal_words(amount.unsigned_abs());
        if amount < 0 {
            format!("Minus {}{}", words, self.suffix)
        } else {
            format!("{}{}", words, self.suffix)
        }
    }

    /// Two decimals with comma thousands separators ("1,500.00").
    pub fn format_display(&self, value: f64) -> String {
        let fixed = format!("{:.2}", value.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let sign = if value < 0.0 { "-" } else { "" };

        format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_numbers() {
        assert_eq!(cardinal_words(0), "Zero");
        assert_eq!(cardinal_words(7), "Seven");
        assert_eq!(cardinal_words(13), "Thirteen");
        assert_eq!(cardinal_words(40), "Forty");
        assert_eq!(cardinal_words(21), "Twenty-One");
        assert_eq!(cardinal_words(99), "Ninety-Nine");
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(cardinal_words(100), "One Hundred");
        assert_eq!(cardinal_words(101), "One Hundred And One");
        assert_eq!(cardinal_words(999), "Nine Hundred And Ninety-Nine");
    }

    #[test]
    fn test_thousands_and_beyond() {
        assert_eq!(cardinal_words(1500), "One Thousand Five Hundred");
        assert_eq!(cardinal_words(1001), "One Thousand And One");
        assert_eq!(cardinal_words(2019), "Two Thousand And Nineteen");
        assert_eq!(
            cardinal_words(100_250),
            "One Hundred Thousand Two Hundred And Fifty"
        );
        assert_eq!(
            cardinal_words(2_000_005),
            "Two Million And Five"
        );
        assert_eq!(cardinal_words(1_000_000_000), "One Billion");
    }

    #[test]
    fn test_largest_value() {
        let words = cardinal_words(u64::MAX);
        assert!(words.starts_with("Eighteen Quintillion"));
    }

    #[test]
    fn test_to_words_suffix() {
        let amounts = AmountFormatter::new();

        assert_eq!(
            amounts.to_words(1500),
            "One Thousand Five Hundred Rupees Only"
        );
        assert_eq!(amounts.to_words(0), "Zero Rupees Only");
    }

    #[test]
    fn test_to_words_is_deterministic() {
        let amounts = AmountFormatter::new();

        for n in [0, 1, 19, 20, 100, 1234, 56_789, 1_000_001] {
            let first = amounts.to_words(n);
            assert_eq!(first, amounts.to_words(n));
            assert!(first.ends_with(" Rupees Only"));
        }
    }

    #[test]
    fn test_custom_suffix() {
        let amounts = AmountFormatter::new().with_suffix(" Dollars");
        assert_eq!(amounts.to_words(2), "Two Dollars");
    }

    #[test]
    fn test_whole_units_truncates() {
        let amounts = AmountFormatter::new();

        assert_eq!(amounts.whole_units(1500.0).unwrap(), 1500);
        assert_eq!(amounts.whole_units(1500.99).unwrap(), 1500);
        assert_eq!(amounts.whole_units(0.4).unwrap(), 0);
        assert_eq!(amounts.whole_units(-500.0).unwrap(), -500);
        assert_eq!(amounts.whole_units(-0.4).unwrap(), 0);
        assert_eq!(amounts.whole_units(-7.9).unwrap(), -7);
    }

    #[test]
    fn test_whole_units_rejects_invalid() {
        let amounts = AmountFormatter::new();

        assert!(matches!(
            amounts.whole_units(f64::NAN),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            amounts.whole_units(f64::INFINITY),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            amounts.whole_units(1e20),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_negative_amount_words() {
        let amounts = AmountFormatter::new();

        let reversal = amounts.whole_units(-500.0).unwrap();
        assert_eq!(amounts.to_words(reversal), "Minus Five Hundred Rupees Only");

        let small = amounts.whole_units(-0.4).unwrap();
        assert_eq!(amounts.to_words(small), "Zero Rupees Only");

        assert!(amounts.to_words(i64::MIN).starts_with("Minus Nine Quintillion"));
    }

    #[test]
    fn test_format_display() {
        let amounts = AmountFormatter::new();

        assert_eq!(amounts.format_display(0.0), "0.00");
        assert_eq!(amounts.format_display(999.5), "999.50");
        assert_eq!(amounts.format_display(1500.0), "1,500.00");
        assert_eq!(amounts.format_display(1234567.891), "1,234,567.89");
        assert_eq!(amounts.format_display(-2500.0), "-2,500.00");
    }
}
