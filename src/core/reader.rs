//! Text-to-value extraction for rendered storefront regions.
//!
//! Nothing here returns an error for a parse miss: counts come back as a
//! [`CountReading`] and money lookups as `Option`/`bool`.

use crate::domain::model::{CountReading, Money};
use regex::Regex;

pub const PRODUCT_COUNT_PATTERN: &str = r"(\d+) Product\(s\) found";
pub const QUANTITY_PATTERN: &str = r"Quantity:\s*(\d+)";
const MONEY_PATTERN: &str = r"\$\s*(\d+)\s*\.\s*(\d{2})";

/// Pattern for the cart header marker: the close glyph, the item count, then "Cart".
pub fn cart_marker_pattern(glyph: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"{}(\d+)Cart", regex::escape(glyph)))
}

/// Tri-state count read: `text` is `None` when the region was not visible.
pub fn read_count(text: Option<&str>, pattern: &Regex) -> CountReading {
    let Some(text) = text else {
        return CountReading::ExtractionFailed("region not visible".to_string());
    };
    let Some(captures) = pattern.captures(text) else {
        return CountReading::ExtractionFailed(format!("pattern '{}' did not match", pattern));
    };
    let Some(digits) = captures.get(1) else {
        return CountReading::ExtractionFailed(format!(
            "pattern '{}' has no capture group",
            pattern
        ));
    };
    match digits.as_str().trim().parse::<u64>() {
        Ok(0) => CountReading::ConfirmedAbsent,
        Ok(n) => CountReading::Found(n),
        Err(e) => CountReading::ExtractionFailed(format!(
            "captured '{}' is not a count: {}",
            digits.as_str(),
            e
        )),
    }
}

/// Legacy integer read: `0` stands for both "zero" and "could not tell".
pub fn extract_count(text: &str, pattern: &Regex) -> u64 {
    read_count(Some(text), pattern).or_zero("count")
}

/// First `$ D.CC` amount in `text`, whitespace tolerated around `$` and `.`.
pub fn extract_money(text: &str) -> Option<Money> {
    let re = Regex::new(MONEY_PATTERN).ok()?;
    let captures = re.captures(text)?;
    let dollars = captures.get(1)?.as_str().parse::<u64>().ok()?;
    let cents = captures.get(2)?.as_str().parse::<u64>().ok()?;
    Money::checked_new(dollars, cents)
}

/// Tolerant pattern for exactly `amount`: `$`, dollars, `.`, two cent digits, with
/// optional whitespace between the tokens and no further digit after the cents.
pub fn money_pattern(amount: &Money) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"\$\s*{}\s*\.\s*{:02}(?:[^0-9]|$)",
        amount.dollars(),
        amount.cents()
    ))
}

pub fn matches_money(text: &str, amount: &Money) -> bool {
    match money_pattern(amount) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::warn!("Failed to build money pattern for {}: {}", amount, e);
            false
        }
    }
}

/// Quantity shown on a single cart line, if the line renders one.
pub fn extract_quantity(text: &str) -> Option<u32> {
    let re = Regex::new(QUANTITY_PATTERN).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_count_re() -> Regex {
        Regex::new(PRODUCT_COUNT_PATTERN).unwrap()
    }

    #[test]
    fn test_read_product_count_caption() {
        let re = product_count_re();
        assert_eq!(
            read_count(Some("16 Product(s) found"), &re),
            CountReading::Found(16)
        );
        assert_eq!(
            read_count(Some("Sizes: XS S M\n0 Product(s) found"), &re),
            CountReading::ConfirmedAbsent
        );
        assert!(matches!(
            read_count(Some("Loading..."), &re),
            CountReading::ExtractionFailed(_)
        ));
        assert!(matches!(
            read_count(None, &re),
            CountReading::ExtractionFailed(_)
        ));
    }

    #[test]
    fn test_cart_marker_needs_contiguous_tokens() {
        let re = cart_marker_pattern("X").unwrap();
        assert_eq!(
            read_count(Some("X3CartXCropped Stay GroovyQuantity: 3"), &re),
            CountReading::Found(3)
        );
        assert_eq!(read_count(Some("X0Cart"), &re), CountReading::ConfirmedAbsent);
        assert!(matches!(
            read_count(Some("X 3 Cart"), &re),
            CountReading::ExtractionFailed(_)
        ));
    }

    #[test]
    fn test_extract_count_collapses_misses_to_zero() {
        let re = product_count_re();
        assert_eq!(extract_count("8 Product(s) found", &re), 8);
        assert_eq!(extract_count("nothing here", &re), 0);
    }

    #[test]
    fn test_capture_overflow_is_an_extraction_failure() {
        let re = product_count_re();
        let reading = read_count(Some("99999999999999999999999 Product(s) found"), &re);
        assert!(matches!(reading, CountReading::ExtractionFailed(_)));
    }

    #[test]
    fn test_money_pattern_tolerates_whitespace() {
        let amount = Money::new(10, 90);
        for rendered in ["$10.90", "$ 10.90", "$ 10 . 90", "$\n10\t.\n90", "SUBTOTAL$ 10.90Checkout"] {
            assert!(matches_money(rendered, &amount), "should match {:?}", rendered);
        }
    }

    #[test]
    fn test_money_pattern_rejects_other_amounts() {
        let amount = Money::new(10, 90);
        for rendered in ["$ 10.95", "$ 110.90", "$ 0.90", "$ 10.905", "10.90", "$ 21.80"] {
            assert!(!matches_money(rendered, &amount), "should not match {:?}", rendered);
        }
        assert!(matches_money("$ 0.90", &Money::new(0, 90)));
    }

    #[test]
    fn test_extract_money_decomposes_amounts() {
        assert_eq!(extract_money("Subtotal: $ 48 . 30"), Some(Money::new(48, 30)));
        assert_eq!(extract_money("no price"), None);
        assert_eq!(extract_money("$10.90 or 9 x $ 1.21"), Some(Money::new(10, 90)));
    }

    #[test]
    fn test_extract_money_misses_on_overflow() {
        assert_eq!(extract_money("SUBTOTAL $ 200000000000000000.00"), None);
        assert_eq!(extract_money("SUBTOTAL $ 99999999999999999999.00"), None);
    }

    #[test]
    fn test_extract_quantity() {
        assert_eq!(extract_quantity("Quantity: 2"), Some(2));
        assert_eq!(extract_quantity("Cropped Stay GroovyQuantity:  11$ 10.90"), Some(11));
        assert_eq!(extract_quantity("Add to cart"), None);
    }
}
