//! Per-field fallback combinator.

use tracing::warn;

use crate::ShareError;

/// Decode one field independently of all others.
///
/// Returns the parsed value, or `default` together with the reason the raw
/// value could not be used.
pub fn decode_field<T, F>(
    field: &'static str,
    raw: Option<&str>,
    default: T,
    parse: F,
) -> (T, Option<ShareError>)
where
    F: FnOnce(&str) -> Result<T, String>,
{
    let Some(raw) = raw else {
        return (default, Some(ShareError::Missing { field }));
    };
    match parse(raw) {
        Ok(value) => (value, None),
        Err(reason) => {
            warn!(field, value = raw, %reason, "falling back to default share parameter");
            (
                default,
                Some(ShareError::Malformed {
                    field,
                    value: raw.to_string(),
                    reason,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_u8(raw: &str) -> Result<u8, String> {
        raw.parse().map_err(|e| format!("{e}"))
    }

    #[test]
    fn parsed_value_wins() {
        assert_eq!(decode_field("n", Some("7"), 1, parse_u8), (7, None));
    }

    #[test]
    fn missing_value_uses_default() {
        let (value, warning) = decode_field("n", None, 1, parse_u8);
        assert_eq!(value, 1);
        assert_eq!(warning, Some(ShareError::Missing { field: "n" }));
    }

    #[test]
    fn malformed_value_uses_default() {
        let (value, warning) = decode_field("n", Some("300"), 1, parse_u8);
        assert_eq!(value, 1);
        assert!(matches!(warning, Some(ShareError::Malformed { field: "n", .. })));
    }
}
