use cbk_common::{Rate, Vnd, BASIS_POINTS_PER_UNIT};
use log::*;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::MarketplaceApiError;

/// Both marketplaces send amounts as decimal strings, and sometimes as bare numbers.
pub fn parse_amount(amount: &str) -> Result<Vnd, MarketplaceApiError> {
    amount
        .parse::<Vnd>()
        .map_err(|e| MarketplaceApiError::InvalidCurrencyAmount(format!("Invalid amount: {amount}. {e}")))
}

/// TikTok reports commission rates as percentages: `"10"` is 10%.
pub fn parse_percent_rate(rate: &str) -> Result<Rate, MarketplaceApiError> {
    let parsed = Rate::from_percent_str(rate).map_err(|e| MarketplaceApiError::InvalidRate(e.to_string()))?;
    commission_rate(parsed, rate)
}

/// Shopee reports product commission rates as fractions: `"0.05"` is 5%.
pub fn parse_fraction_rate(rate: &str) -> Result<Rate, MarketplaceApiError> {
    let parsed = Rate::from_fraction_str(rate).map_err(|e| MarketplaceApiError::InvalidRate(e.to_string()))?;
    commission_rate(parsed, rate)
}

/// A commission can never be more than the order it was paid on.
fn commission_rate(rate: Rate, raw: &str) -> Result<Rate, MarketplaceApiError> {
    if rate.is_proportion() {
        Ok(rate)
    } else {
        Err(MarketplaceApiError::InvalidRate(format!("{raw} is more than 100%")))
    }
}

/// The effective commission rate of an order, from the commission actually paid on it. Truncated to whole basis
/// points, so re-applying the rate can come out up to one basis point short.
pub fn implied_rate(commission: Vnd, total: Vnd) -> Result<Rate, MarketplaceApiError> {
    if total.value() <= 0 || commission.value() <= 0 {
        return Ok(Rate::ZERO);
    }
    if commission > total {
        return Err(MarketplaceApiError::InvalidRate(format!("commission {commission} exceeds order total {total}")));
    }
    let bps = i128::from(commission.value()) * i128::from(BASIS_POINTS_PER_UNIT) / i128::from(total.value());
    // commission <= total, so bps <= BASIS_POINTS_PER_UNIT
    let bps = i64::try_from(bps).map_err(|e| MarketplaceApiError::InvalidRate(e.to_string()))?;
    Ok(Rate::from_bps(bps))
}

/// Follows a share link to wherever it finally lands. Non-success statuses are not errors: the landing URL is all we
/// want.
pub async fn follow_redirects(client: &Client, url: &str) -> Result<String, MarketplaceApiError> {
    let response = client.get(url).send().await.map_err(|e| MarketplaceApiError::RestResponseError(e.to_string()))?;
    let resolved = response.url().to_string();
    debug!("🔗️ Resolved {url} -> {resolved}");
    Ok(resolved)
}

/// Accepts `"123.4"`, `123.4` or `null`.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::default()),
        other => Err(serde::de::Error::custom(format!("expected a string or number, got {other}"))),
    }
}

pub fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let s = string_or_number(deserializer)?;
    Ok(Some(s).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn amounts_and_rates() {
        assert_eq!(parse_amount("129000").unwrap(), Vnd::from(129_000));
        assert_eq!(parse_amount("129000.6").unwrap(), Vnd::from(129_001));
        assert!(parse_amount("a lot").is_err());
        assert_eq!(parse_percent_rate("10").unwrap(), Rate::from_bps(1000));
        assert_eq!(parse_fraction_rate("0.05").unwrap(), Rate::from_bps(500));
    }

    #[test]
    fn implied_rates() {
        assert_eq!(implied_rate(Vnd::from(10_000), Vnd::from(100_000)).unwrap(), Rate::from_bps(1000));
        assert_eq!(implied_rate(Vnd::from(1), Vnd::from(3)).unwrap(), Rate::from_bps(3333));
        assert_eq!(implied_rate(Vnd::from(500), Vnd::from(0)).unwrap(), Rate::ZERO);
        assert_eq!(implied_rate(Vnd::from(i64::MAX), Vnd::from(i64::MAX)).unwrap(), Rate::ONE);
        assert!(matches!(
            implied_rate(Vnd::from(200_000), Vnd::from(100_000)),
            Err(MarketplaceApiError::InvalidRate(_))
        ));
    }

    #[test]
    fn hostile_rates_and_amounts() {
        assert!(matches!(parse_percent_rate("92233720368547759"), Err(MarketplaceApiError::InvalidRate(_))));
        assert!(matches!(parse_percent_rate("100.01"), Err(MarketplaceApiError::InvalidRate(_))));
        assert!(matches!(parse_fraction_rate("1.5"), Err(MarketplaceApiError::InvalidRate(_))));
        assert_eq!(parse_percent_rate("100").unwrap(), Rate::ONE);
        assert_eq!(parse_fraction_rate("1").unwrap(), Rate::ONE);
        assert!(matches!(
            parse_amount("9223372036854775807.9"),
            Err(MarketplaceApiError::InvalidCurrencyAmount(_))
        ));
    }

    #[test]
    fn lenient_numbers() {
        #[derive(Deserialize)]
        struct Item {
            #[serde(deserialize_with = "string_or_number")]
            price: String,
            #[serde(default, deserialize_with = "optional_string_or_number")]
            rate: Option<String>,
        }
        let item: Item = serde_json::from_str(r#"{"price": 1500, "rate": null}"#).unwrap();
        assert_eq!(item.price, "1500");
        assert_eq!(item.rate, None);
        let item: Item = serde_json::from_str(r#"{"price": "99.5", "rate": "0.1"}"#).unwrap();
        assert_eq!(item.price, "99.5");
        assert_eq!(item.rate.as_deref(), Some("0.1"));
        assert!(serde_json::from_str::<Item>(r#"{"price": [1]}"#).is_err());
    }
}
