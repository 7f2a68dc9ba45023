/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms, collision-free at pager scale)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Alphabet for guest ticket PINs (uppercase letters + digits).
pub const TICKET_PIN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a guest ticket PIN.
pub const TICKET_PIN_LEN: usize = 4;

/// Generate a random 4-character ticket PIN (A-Z, 0-9).
///
/// Uniqueness among active orders is the caller's concern; this is just
/// the raw draw.
pub fn generate_ticket_pin() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..TICKET_PIN_LEN)
        .map(|_| TICKET_PIN_ALPHABET[rng.gen_range(0..TICKET_PIN_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_pin_has_expected_shape() {
        for _ in 0..100 {
            let pin = generate_ticket_pin();
            assert_eq!(pin.len(), TICKET_PIN_LEN);
            assert!(pin.bytes().all(|b| TICKET_PIN_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn snowflake_ids_fit_in_53_bits() {
        for _ in 0..100 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id < (1i64 << 53));
        }
    }
}
