use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

/*
  Block timestamps come back with whatever fractional-second precision the
  serving node felt like using (0, 3, 6 or 9 digits have all been observed).
  Contract: pad or truncate the fraction to exactly 6 digits before parsing,
  reject anything that does not look like an RFC 3339 instant. Dates are
  always derived in UTC.
*/

/// Normalize the fractional seconds of an RFC 3339 timestamp to 6 digits.
/// Timestamps without a fraction pass through unchanged.
pub fn normalize_rfc3339(ts: &str) -> Result<String> {
    let (body, offset) = match ts.strip_suffix('Z') {
        Some(body) => (body, "Z"),
        None => match ts.rfind(|c| c == '+' || c == '-') {
            // "YYYY-MM-DDTHH:MM:SS" is 19 chars, a date hyphen can't be this far in
            Some(pos) if pos >= 19 => (&ts[..pos], &ts[pos..]),
            _ => (ts, ""),
        },
    };

    let (secs, frac) = match body.split_once('.') {
        Some(parts) => parts,
        None => return Ok(ts.to_string()),
    };

    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        bail!("unexpected timestamp format: {:?}", ts);
    }

    let frac6 = format!("{:0<6}", &frac[..frac.len().min(6)]);
    Ok(format!("{}.{}{}", secs, frac6, offset))
}

/// Derive the UTC calendar date of a block timestamp.
pub fn utc_date(ts: &str) -> Result<NaiveDate> {
    let normalized = normalize_rfc3339(ts)?;
    let parsed = DateTime::parse_from_rfc3339(&normalized)
        .with_context(|| format!("unparseable block timestamp: {:?}", ts))?;
    Ok(parsed.with_timezone(&Utc).date_naive())
}

#[cfg(test)]
mod tests {
    use super::{normalize_rfc3339, utc_date};

    #[test]
    fn it_pads_short_fractions() {
        assert_eq!(
            normalize_rfc3339("2023-06-01T12:34:56.5Z").unwrap(),
            "2023-06-01T12:34:56.500000Z"
        );
    }

    #[test]
    fn it_truncates_nanosecond_fractions() {
        assert_eq!(
            normalize_rfc3339("2023-06-01T12:34:56.123456789Z").unwrap(),
            "2023-06-01T12:34:56.123456Z"
        );
    }

    #[test]
    fn it_keeps_numeric_offsets() {
        assert_eq!(
            normalize_rfc3339("2023-06-01T12:34:56.42+05:00").unwrap(),
            "2023-06-01T12:34:56.420000+05:00"
        );
    }

    #[test]
    fn it_passes_through_whole_seconds() {
        assert_eq!(
            normalize_rfc3339("2023-06-01T12:34:56Z").unwrap(),
            "2023-06-01T12:34:56Z"
        );
    }

    #[test]
    fn it_rejects_non_digit_fractions() {
        assert!(normalize_rfc3339("2023-06-01T12:34:56.12a4Z").is_err());
        assert!(normalize_rfc3339("2023-06-01T12:34:56.Z").is_err());
    }

    #[test]
    fn it_derives_utc_dates_across_offsets() {
        // 02:30 at +05:00 is 21:30 UTC the previous day
        let date = utc_date("2023-06-01T02:30:00.123+05:00").unwrap();
        assert_eq!(date.to_string(), "2023-05-31");
    }

    #[test]
    fn it_fails_loudly_on_garbage() {
        assert!(utc_date("last tuesday").is_err());
        assert!(utc_date("").is_err());
    }
}
