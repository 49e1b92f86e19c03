/// Common types and utilities shared across handlers and services
use rust_decimal::Decimal;
use serde::Serializer;

/// Renders money with exactly two decimal places
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

/// `serialize_with` helper emitting a two-decimal string
pub fn serialize_money<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_money(*amount))
}

/// Trims and drops empty strings
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Priced {
        #[serde(serialize_with = "serialize_money")]
        price: Decimal,
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(format_money(dec!(0)), "0.00");
        assert_eq!(format_money(dec!(150.5)), "150.50");
        assert_eq!(format_money(dec!(200.005)), "200.00");
        assert_eq!(format_money(dec!(19.999)), "20.00");
    }

    #[test]
    fn money_serializes_as_string() {
        let json = serde_json::to_value(Priced { price: dec!(550.5) }).unwrap();
        assert_eq!(json["price"], "550.50");
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" 1 Main St ".into())), Some("1 Main St".into()));
        assert_eq!(non_blank(None), None);
    }
}
