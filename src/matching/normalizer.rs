use regex::Regex;

use crate::utils::error::{AppError, Result};

/// Turns free-text price labels into numbers.
///
/// Only the first numeric token is used, so `"49,99"` reads as `49.0` and
/// `"$10 was $20"` as `10.0`. Multi-price labels are not disambiguated.
/// Any Unicode decimal digit counts, so `"１９.９９"` reads as `19.99`.
#[derive(Debug, Clone)]
pub struct PriceNormalizer {
    price_regex: Regex,
    digit_regex: Regex,
}

impl Default for PriceNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceNormalizer {
    pub fn new() -> Self {
        PriceNormalizer {
            price_regex: Regex::new(r"\$?(\d+\.?\d*)").expect("static price pattern"),
            digit_regex: Regex::new(r"^\d$").expect("static digit pattern"),
        }
    }

    pub fn normalize(&self, text: &str) -> Result<f64> {
        self.price_regex
            .captures(text)
            .and_then(|captures| captures.get(1))
            .and_then(|digits| self.to_ascii(digits.as_str()).parse::<f64>().ok())
            .ok_or_else(|| AppError::PriceParse {
                text: text.to_string(),
            })
    }

    fn to_ascii(&self, token: &str) -> String {
        token
            .chars()
            .map(|c| {
                if c.is_ascii() {
                    c
                } else {
                    self.decimal_value(c).unwrap_or(c)
                }
            })
            .collect()
    }

    fn is_decimal_digit(&self, code_point: u32) -> bool {
        char::from_u32(code_point)
            .map(|c| self.digit_regex.is_match(c.encode_utf8(&mut [0; 4])))
            .unwrap_or(false)
    }

    // Decimal digits are encoded in contiguous runs of ten starting at zero,
    // so a digit's value is its offset from the start of its run, mod 10.
    fn decimal_value(&self, c: char) -> Option<char> {
        let code_point = c as u32;
        if !self.is_decimal_digit(code_point) {
            return None;
        }

        let mut start = code_point;
        while start > 0 && self.is_decimal_digit(start - 1) {
            start -= 1;
        }
        char::from_digit((code_point - start) % 10, 10)
    }
}
