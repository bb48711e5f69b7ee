//! Structural validation and confidence scoring of addresses
//!
//! Scores are summed in hundredths and only converted to a float at the
//! end, so equal inputs always produce bit-identical confidences.

use std::ops::RangeInclusive;

const BASE_SCORE: u32 = 40;
const TRUSTED_TLD_BONUS: u32 = 20;
const SHORT_ADDRESS_BONUS: u32 = 10;
const LOCAL_PART_BONUS: u32 = 10;
const NO_DIGIT_RUN_BONUS: u32 = 10;
const MAILTO_BOOST: u32 = 10;
const MAX_SCORE: u32 = 100;

const TRUSTED_TLDS: &[&str] = &["com", "org", "net", "edu", "gov"];
const SHORT_ADDRESS_LIMIT: usize = 50;
const PLAUSIBLE_LOCAL_PART: RangeInclusive<usize> = 3..=30;
const DIGIT_RUN_LIMIT: usize = 5;

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_LABEL_LEN: usize = 63;

/// Scores a lowercase address
///
/// # Arguments
///
/// * `address` - An address that already passed [`is_well_formed`]
/// * `from_mailto` - Whether the address came from an explicit mailto link
///
/// # Returns
///
/// A confidence in [0, 1]
pub fn score(address: &str, from_mailto: bool) -> f64 {
    let (local, domain) = address.rsplit_once('@').unwrap_or((address, ""));
    let tld = domain.rsplit('.').next().unwrap_or_default();

    let mut points = BASE_SCORE;
    if TRUSTED_TLDS.contains(&tld) {
        points += TRUSTED_TLD_BONUS;
    }
    if address.len() < SHORT_ADDRESS_LIMIT {
        points += SHORT_ADDRESS_BONUS;
    }
    if PLAUSIBLE_LOCAL_PART.contains(&local.len()) {
        points += LOCAL_PART_BONUS;
    }
    if !has_digit_run(address, DIGIT_RUN_LIMIT) {
        points += NO_DIGIT_RUN_BONUS;
    }
    if from_mailto {
        points += MAILTO_BOOST;
    }

    f64::from(points.min(MAX_SCORE)) / 100.0
}

/// Checks that an address is syntactically deliverable
///
/// The local part must be 1-64 characters without leading, trailing or
/// doubled dots. The domain needs at least two labels of 1-63 alphanumeric
/// or hyphen characters that do not start or end with a hyphen, and an
/// alphabetic top-level label.
pub fn is_well_formed(address: &str) -> bool {
    if address.len() > MAX_ADDRESS_LEN {
        return false;
    }

    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };

    if local.is_empty()
        || local.len() > MAX_LOCAL_PART_LEN
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    let tld_ok = labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);

    labels_ok && tld_ok
}

fn has_digit_run(s: &str, limit: usize) -> bool {
    let mut run = 0;
    for c in s.chars() {
        if c.is_ascii_digit() {
            run += 1;
            if run >= limit {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}
