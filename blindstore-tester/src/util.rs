use anyhow::{Context, Result};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens. Decimal and `0x`-prefixed hex are accepted; negatives
/// fold to their magnitude.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    tokens
        .iter()
        .map(|token| {
            if let Some(hex) = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
            {
                return u64::from_str_radix(hex, 16)
                    .with_context(|| format!("invalid hex seed '{token}'"));
            }
            if let Ok(value) = token.parse::<i64>() {
                return Ok(value.unsigned_abs());
            }
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed '{token}'"))
        })
        .collect()
}
