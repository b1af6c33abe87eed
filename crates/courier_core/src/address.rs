use std::error::Error;
use std::fmt;

/// Region completion defaults used when a raw address arrives partially
/// qualified. Local numbers missing their area code get `area_code`
/// prepended; area-qualified numbers missing the country prefix get
/// `country_code` prepended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDefaults {
    /// Digit count of a short local number without its area code. A number
    /// of this length or one digit longer is treated as local.
    pub subscriber_len_short: usize,
    pub area_code: String,
    pub country_code: String,
}

impl Default for RegionDefaults {
    fn default() -> Self {
        Self {
            subscriber_len_short: 8,
            area_code: "62".to_string(),
            country_code: "55".to_string(),
        }
    }
}

/// Fully qualified dialable address: `{country}{area}{subscriber}` digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalAddress(String);

impl CanonicalAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The address without the region's country prefix, if it carries one.
    /// Used to build search query variants.
    pub fn without_country_code(&self, region: &RegionDefaults) -> Option<&str> {
        self.0.strip_prefix(region.country_code.as_str())
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    /// The raw input contained no digits at all.
    Empty,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::Empty => write!(f, "address contains no digits"),
        }
    }
}

impl Error for NormalizeError {}

/// Normalize a raw contact string into a canonical dialable address.
///
/// Two-stage completion, in this order:
/// 1. exactly `subscriber_len_short` or `subscriber_len_short + 1` digits are
///    assumed to be a local number missing its area code;
/// 2. after that, exactly 10 or 11 digits are assumed to be missing the
///    country prefix.
///
/// Any other length passes through unchanged; some deployments pre-supply
/// full international numbers. Running country-code qualification before
/// area completion would mis-qualify numbers of ambiguous length, so the
/// stage order is fixed. Normalization is idempotent on canonical input.
pub fn normalize(raw: &str, region: &RegionDefaults) -> Result<CanonicalAddress, NormalizeError> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(NormalizeError::Empty);
    }

    if digits.len() == region.subscriber_len_short
        || digits.len() == region.subscriber_len_short + 1
    {
        digits = format!("{}{}", region.area_code, digits);
    }
    if digits.len() == 10 || digits.len() == 11 {
        digits = format!("{}{}", region.country_code, digits);
    }

    Ok(CanonicalAddress(digits))
}
