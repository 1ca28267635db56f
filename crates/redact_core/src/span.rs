use std::fmt;
use std::str::FromStr;

/// Confidence assigned to spans the user adds by hand.
pub const MANUAL_CONFIDENCE: f32 = 0.80;

/// Spans at or above this confidence count as high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PiiType {
    Email,
    Phone,
    Ic,
    CreditCard,
    Name,
    Address,
    DateOfBirth,
    DriverLicense,
    Passport,
    BankAccount,
    IpAddress,
    Religion,
    Ethnicity,
    Other,
}

impl PiiType {
    pub const ALL: [PiiType; 14] = [
        PiiType::Email,
        PiiType::Phone,
        PiiType::Ic,
        PiiType::CreditCard,
        PiiType::Name,
        PiiType::Address,
        PiiType::DateOfBirth,
        PiiType::DriverLicense,
        PiiType::Passport,
        PiiType::BankAccount,
        PiiType::IpAddress,
        PiiType::Religion,
        PiiType::Ethnicity,
        PiiType::Other,
    ];

    /// Wire identifier, e.g. `date_of_birth`.
    pub fn as_str(self) -> &'static str {
        match self {
            PiiType::Email => "email",
            PiiType::Phone => "phone",
            PiiType::Ic => "ic",
            PiiType::CreditCard => "credit_card",
            PiiType::Name => "name",
            PiiType::Address => "address",
            PiiType::DateOfBirth => "date_of_birth",
            PiiType::DriverLicense => "driver_license",
            PiiType::Passport => "passport",
            PiiType::BankAccount => "bank_account",
            PiiType::IpAddress => "ip_address",
            PiiType::Religion => "religion",
            PiiType::Ethnicity => "ethnicity",
            PiiType::Other => "other",
        }
    }

    /// Human readable label, e.g. `DATE OF BIRTH`.
    pub fn label(self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }

    /// Lenient mapping used for detector output: `nric` is an alias of `ic`
    /// and anything unknown becomes `Other`.
    pub fn from_wire(raw: &str) -> PiiType {
        match raw.trim().to_ascii_lowercase().as_str() {
            "nric" => PiiType::Ic,
            other => other.parse().unwrap_or(PiiType::Other),
        }
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown PII type `{0}`")]
pub struct UnknownPiiType(pub String);

impl FromStr for PiiType {
    type Err = UnknownPiiType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        PiiType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == raw)
            .ok_or_else(|| UnknownPiiType(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Detected,
    Manual,
}

/// Half-open range `[start, end)` counted in Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharRange {
    pub start: usize,
    pub end: usize,
}

impl CharRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Symmetric half-open intersection test.
    pub fn overlaps(&self, other: &CharRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for CharRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub pii_type: PiiType,
    pub range: CharRange,
    pub confidence: f32,
    pub origin: Origin,
}

impl Span {
    pub fn detected(
        text: impl Into<String>,
        pii_type: PiiType,
        range: CharRange,
        confidence: f32,
    ) -> Self {
        Self {
            text: text.into(),
            pii_type,
            range,
            confidence,
            origin: Origin::Detected,
        }
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= HIGH_CONFIDENCE_THRESHOLD
    }
}

/// Immutable document text with a char-to-byte boundary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    text: String,
    // boundaries[i] is the byte offset of char i; the last entry is text.len().
    boundaries: Vec<usize>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut boundaries: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
        boundaries.push(text.len());
        Self {
            id: id.into(),
            text,
            boundaries,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in Unicode scalar values.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Slice by char range; `None` when the range is reversed or out of bounds.
    pub fn slice(&self, range: CharRange) -> Option<&str> {
        if range.start > range.end || range.end > self.char_len() {
            return None;
        }
        let start = self.boundaries[range.start];
        let end = self.boundaries[range.end];
        self.text.get(start..end)
    }
}
