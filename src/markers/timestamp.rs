use super::error::MarkerError;

/// Parse `HH:MM:SS` into whole seconds. Components need not be zero padded
/// and are not bounded (`00:90:00` is 5400 seconds).
pub fn decode(text: &str) -> Result<u64, MarkerError> {
    let trimmed = text.trim();
    let comps: Vec<&str> = trimmed.split(':').collect();
    if comps.len() != 3 {
        return Err(MarkerError::TimestampComponents(trimmed.to_string()));
    }

    let mut parsed = [0u64; 3];
    for (slot, comp) in parsed.iter_mut().zip(&comps) {
        *slot = comp
            .parse::<u64>()
            .map_err(|_| MarkerError::TimestampComponent {
                timestamp: trimmed.to_string(),
                component: comp.to_string(),
            })?;
    }
    let [hh, mm, ss] = parsed;

    hh.checked_mul(60 * 60)
        .and_then(|h| mm.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(ss))
        .ok_or_else(|| MarkerError::TimestampOverflow(trimmed.to_string()))
}

/// Format whole seconds as `HH:MM:SS`. Hours grow past two digits instead
/// of wrapping.
pub fn encode(secs: u64) -> String {
    let hh = secs / 60 / 60;
    let mm = secs / 60 % 60;
    let ss = secs % 60;
    format!("{hh:02}:{mm:02}:{ss:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_padded_and_unpadded_components() {
        assert_eq!(decode("00:00:00").unwrap(), 0);
        assert_eq!(decode("01:02:03").unwrap(), 3723);
        assert_eq!(decode("1:2:3").unwrap(), 3723);
        assert_eq!(decode("00:90:00").unwrap(), 5400);
        assert_eq!(decode("100:00:01").unwrap(), 360_001);
    }

    #[test]
    fn rejects_wrong_component_count() {
        assert_eq!(
            decode("01:02"),
            Err(MarkerError::TimestampComponents("01:02".to_string()))
        );
        assert!(matches!(
            decode("01:02:03:04"),
            Err(MarkerError::TimestampComponents(_))
        ));
        assert!(matches!(decode(""), Err(MarkerError::TimestampComponents(_))));
    }

    #[test]
    fn rejects_non_numeric_component() {
        assert_eq!(
            decode("01:xx:03"),
            Err(MarkerError::TimestampComponent {
                timestamp: "01:xx:03".to_string(),
                component: "xx".to_string(),
            })
        );
        assert!(decode("01:-2:03").is_err());
        assert!(decode("01::03").is_err());
    }

    #[test]
    fn encodes_with_zero_padding() {
        assert_eq!(encode(0), "00:00:00");
        assert_eq!(encode(15), "00:00:15");
        assert_eq!(encode(3723), "01:02:03");
        assert_eq!(encode(359_999), "99:59:59");
        assert_eq!(encode(360_000), "100:00:00");
    }

    #[test]
    fn encode_then_decode_is_identity() {
        for secs in (0..=359_999u64).step_by(7) {
            assert_eq!(decode(&encode(secs)).unwrap(), secs);
        }
        assert_eq!(decode(&encode(359_999)).unwrap(), 359_999);
    }
}
