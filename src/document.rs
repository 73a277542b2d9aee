/// Length of a normalised document number (CPF).
pub const DOCUMENT_LEN: usize = 11;

/// Strip separators (dots, dashes, slashes, spaces) from a document number.
pub fn normalize_document(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Validate an 11-digit document number through its two check digits.
pub fn is_valid_document(raw: &str) -> bool {
    let digits: Vec<u32> = match normalize_document(raw)
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
    {
        Some(d) if d.len() == DOCUMENT_LEN => d,
        _ => return false,
    };

    // 000.000.000-00, 111.111.111-11, ... pass the arithmetic but are not issued
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Weighted mod-11 check digit; weights run from `len + 1` down to 2.
fn check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}
