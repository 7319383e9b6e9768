//! CPF check-digit validation (modulo-11 algorithm).

/// Returns true when `id` is a structurally valid CPF. Formatting characters
/// are stripped before checking; invalid input never panics, it is just
/// `false`.
pub fn is_valid_cpf(id: &str) -> bool {
    let digits: Vec<u32> = id.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return false;
    }

    // Sequences like 111.111.111-11 satisfy the checksum but are reserved
    // as invalid.
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9], 10) == digits[9] && check_digit(&digits[..10], 11) == digits[10]
}

/// Weighted sum with descending weights starting at `first_weight`, reduced
/// mod 11; remainders below 2 map to 0.
fn check_digit(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=first_weight).rev())
        .map(|(d, w)| d * w)
        .sum();

    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

/// Strips formatting and returns the bare 11-digit CPF, or `None` when the
/// input is not a valid CPF.
pub fn normalize_cpf(id: &str) -> Option<String> {
    let digits: String = id.chars().filter(|c| c.is_ascii_digit()).collect();
    if is_valid_cpf(&digits) {
        Some(digits)
    } else {
        None
    }
}
