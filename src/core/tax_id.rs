//! Tax identifier (DIČ) structure and checksum rules.
//!
//! A tax identifier is the country prefix `CZ` followed by either
//! - 8 digits: a legal-entity number with a mod-11 check digit,
//! - 9 digits starting with `6`: a special personal number with a mapped check digit,
//! - 9 or 10 digits otherwise: a birth number (10-digit ones divisible by 11).

use super::error::FieldError;

pub const TAX_ID_PREFIX: &str = "CZ";

const SPECIAL_CHECK_DIGITS: [u32; 11] = [8, 7, 6, 5, 4, 3, 2, 1, 0, 9, 8];

/// Validate a tax identifier's prefix, length and check digit.
pub fn check_tax_id(raw: &str) -> Result<(), FieldError> {
    if raw.is_empty() {
        return Err(FieldError::Missing);
    }
    let Some(number) = raw.strip_prefix(TAX_ID_PREFIX) else {
        return Err(FieldError::Format(format!(
            "'{raw}' must start with {TAX_ID_PREFIX}"
        )));
    };
    if !(8..=10).contains(&number.len()) || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::Format(format!(
            "'{raw}' must be {TAX_ID_PREFIX} followed by 8 to 10 digits"
        )));
    }

    let digits: Vec<u32> = number.bytes().map(|b| u32::from(b - b'0')).collect();
    let valid = match digits.len() {
        8 => legal_entity_valid(&digits),
        9 if digits[0] == 6 => special_valid(&digits),
        _ => birth_number_valid(&digits),
    };

    if valid { Ok(()) } else { Err(FieldError::Checksum) }
}

fn weighted_sum(digits: &[u32]) -> u32 {
    digits
        .iter()
        .zip((2..=8).rev())
        .map(|(d, w)| d * w)
        .sum()
}

fn legal_entity_valid(digits: &[u32]) -> bool {
    let expected = match weighted_sum(&digits[..7]) % 11 {
        0 => 1,
        1 => 0,
        r => 11 - r,
    };
    digits[7] == expected
}

fn special_valid(digits: &[u32]) -> bool {
    let diff = 11 - weighted_sum(&digits[1..8]) % 11;
    digits[8] == SPECIAL_CHECK_DIGITS[(diff - 1) as usize]
}

fn birth_number_valid(digits: &[u32]) -> bool {
    let year = digits[0] * 10 + digits[1];
    let month = digits[2] * 10 + digits[3];
    let day = digits[4] * 10 + digits[5];

    let month_ok = matches!(month, 1..=12 | 21..=32 | 51..=62 | 71..=82);
    if !month_ok || !(1..=31).contains(&day) {
        return false;
    }

    if digits.len() == 9 {
        // nine-digit birth numbers were only issued before 1954
        return year < 54;
    }

    let value: u64 = digits.iter().fold(0, |acc, d| acc * 10 + u64::from(*d));
    if value % 11 == 0 {
        return true;
    }
    // legacy numbers whose first nine digits leave remainder 10 carry check digit 0
    (value / 10) % 11 == 10 && digits[9] == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_entity_numbers() {
        assert!(check_tax_id("CZ00000019").is_ok());
        assert!(check_tax_id("CZ25596641").is_ok());
        assert_eq!(check_tax_id("CZ00000018"), Err(FieldError::Checksum));
    }

    #[test]
    fn special_numbers() {
        assert!(check_tax_id("CZ683555118").is_ok());
        assert_eq!(check_tax_id("CZ683555117"), Err(FieldError::Checksum));
    }

    #[test]
    fn ten_digit_birth_numbers() {
        assert!(check_tax_id("CZ1212121218").is_ok());
        assert_eq!(check_tax_id("CZ1212121219"), Err(FieldError::Checksum));
        // month 13 does not exist
        assert_eq!(check_tax_id("CZ1213121217"), Err(FieldError::Checksum));
    }

    #[test]
    fn nine_digit_birth_numbers() {
        assert!(check_tax_id("CZ530101123").is_ok());
        assert_eq!(check_tax_id("CZ540101123"), Err(FieldError::Checksum));
    }

    #[test]
    fn structural_errors() {
        assert_eq!(check_tax_id(""), Err(FieldError::Missing));
        assert!(matches!(check_tax_id("SK00000019"), Err(FieldError::Format(_))));
        assert!(matches!(check_tax_id("CZ1234567"), Err(FieldError::Format(_))));
        assert!(matches!(check_tax_id("CZ12345678901"), Err(FieldError::Format(_))));
        assert!(matches!(check_tax_id("CZ0000001A"), Err(FieldError::Format(_))));
        assert!(matches!(check_tax_id("cz00000019"), Err(FieldError::Format(_))));
    }
}
