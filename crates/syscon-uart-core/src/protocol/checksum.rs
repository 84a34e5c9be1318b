//! Additive checksum
//!
//! Every checksummed frame carries the 8-bit sum of its payload bytes as two
//! uppercase hex digits.

/// Sum of all bytes modulo 256
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Format a checksum as two uppercase hex digits
pub fn format(value: u8) -> String {
    format!("{:02X}", value)
}

/// Recompute the checksum of `payload` and compare it with `claimed_hex`.
///
/// The comparison ignores case. Anything other than the two expected digits
/// fails to verify.
pub fn verify(payload: &[u8], claimed_hex: &str) -> bool {
    claimed_hex.eq_ignore_ascii_case(&format(checksum(payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(format(checksum(b"")), "00");
    }

    #[test]
    fn test_wraps_modulo_256() {
        // 'V' + 'E' + 'R' = 0x56 + 0x45 + 0x52 = 0xED
        assert_eq!(checksum(b"VER"), 0xED);
        assert_eq!(checksum(&[0xFF, 0x02]), 0x01);
    }

    #[test]
    fn test_format_pads_and_uppercases() {
        assert_eq!(format(0x0a), "0A");
        assert_eq!(format(0xed), "ED");
    }

    #[test]
    fn test_verify_is_case_insensitive() {
        assert!(verify(b"VER", "ED"));
        assert!(verify(b"VER", "ed"));
        assert!(!verify(b"VER", "EE"));
        assert!(!verify(b"VER", "0ED"));
        assert!(!verify(b"VER", ""));
    }

    #[test]
    fn test_verify_accepts_own_format() {
        let payloads: [&[u8]; 5] = [
            b"",
            b"OK 00000000",
            b"SETCMDLONG FF FF",
            b"EEP SET 2800 40 00112233",
            &[0x7F; 300],
        ];
        for payload in payloads {
            assert!(verify(payload, &format(checksum(payload))));
        }
    }
}
