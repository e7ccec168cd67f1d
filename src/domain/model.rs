use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// A non-negative currency amount held as whole cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money {
    cents: u64,
}

impl Money {
    pub const ZERO: Money = Money { cents: 0 };

    /// Builds an amount from its dollar and cent components; cents above 99 carry over.
    /// Saturates at `u64::MAX` cents; use [`Money::checked_new`] for untrusted input.
    pub fn new(dollars: u64, cents: u64) -> Self {
        Self {
            cents: dollars.saturating_mul(100).saturating_add(cents),
        }
    }

    /// `None` when the amount does not fit in `u64` cents.
    pub fn checked_new(dollars: u64, cents: u64) -> Option<Self> {
        dollars
            .checked_mul(100)
            .and_then(|whole| whole.checked_add(cents))
            .map(Self::from_cents)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Self::from_cents)
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(u64::from(quantity))
            .map(Self::from_cents)
    }

    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn total_cents(&self) -> u64 {
        self.cents
    }

    pub fn dollars(&self) -> u64 {
        self.cents / 100
    }

    /// Fractional part, always rendered with two digits.
    pub fn cents(&self) -> u64 {
        self.cents % 100
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.dollars(), self.cents())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid money amount '{input}': {reason}")]
pub struct MoneyParseError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason| MoneyParseError {
            input: s.to_string(),
            reason,
        };
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
        if trimmed.is_empty() {
            return Err(fail("empty amount"));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(fail("dollar component must be digits"));
        }
        if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(fail("at most two fractional digits are allowed"));
        }

        let dollars: u64 = whole.parse().map_err(|_| fail("dollar component overflows"))?;
        let cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| fail("bad cents"))? * 10,
            _ => fraction.parse::<u64>().map_err(|_| fail("bad cents"))?,
        };
        Money::checked_new(dollars, cents).ok_or_else(|| fail("amount overflows"))
    }
}

/// Saturating; see [`Money::checked_add`].
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::from_cents(self.cents.saturating_add(rhs.cents))
    }
}

/// Saturating; see [`Money::checked_mul`].
impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, quantity: u32) -> Money {
        Money::from_cents(self.cents.saturating_mul(u64::from(quantity)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawMoney {
            Text(String),
            Integer(u64),
            Float(f64),
        }

        match RawMoney::deserialize(deserializer)? {
            RawMoney::Text(text) => text.parse().map_err(serde::de::Error::custom),
            RawMoney::Integer(dollars) => Money::checked_new(dollars, 0).ok_or_else(|| {
                serde::de::Error::custom(format!("money amount {} overflows", dollars))
            }),
            RawMoney::Float(value)
                if value.is_finite() && value >= 0.0 && value * 100.0 < u64::MAX as f64 =>
            {
                // Config files may carry prices as TOML floats; round once at the boundary.
                Ok(Money::from_cents((value * 100.0).round() as u64))
            }
            RawMoney::Float(value) => Err(serde::de::Error::custom(format!(
                "money amount must be a non-negative number in range, got {}",
                value
            ))),
        }
    }
}

/// Outcome of reading a count out of rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountReading {
    Found(u64),
    /// The marker was present and reported zero.
    ConfirmedAbsent,
    ExtractionFailed(String),
}

impl CountReading {
    /// Collapses to a plain integer, logging a diagnostic when the answer is not definitive.
    pub fn or_zero(&self, what: &str) -> u64 {
        match self {
            CountReading::Found(n) => *n,
            CountReading::ConfirmedAbsent => {
                tracing::debug!("{} reads as zero", what);
                0
            }
            CountReading::ExtractionFailed(reason) => {
                tracing::warn!("Failed to get {}: {}; reporting 0", what, reason);
                0
            }
        }
    }

    pub fn is_definitive(&self) -> bool {
        !matches!(self, CountReading::ExtractionFailed(_))
    }
}

/// One distinct product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub quantity: u32,
}

/// Typed snapshot of what the cart currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainState {
    pub item_count: u64,
    pub unique_line_count: usize,
    pub subtotal: Money,
    pub lines: Vec<CartLine>,
}

impl DomainState {
    /// Sum of the per-line quantities.
    pub fn quantity_total(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn line(&self, name: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.name == name)
    }
}

/// How a cart line is addressed.
///
/// `Position` counts controls in document order, which follows insertion order on the
/// storefront; scenarios that reorder the catalogue must switch to `Product`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRef {
    Position(usize),
    Product(String),
}

impl LineRef {
    pub fn product(name: &str) -> Self {
        LineRef::Product(name.to_string())
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::Position(i) => write!(f, "line #{}", i),
            LineRef::Product(name) => write!(f, "line '{}'", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Open,
}

/// Expected catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductData {
    pub name: String,
    pub price: Money,
    pub sizes: Vec<String>,
}

impl ProductData {
    pub fn new(name: &str, price: Money, sizes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            price,
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size)
    }
}

/// Location of the storefront's advertised source repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReference {
    url: String,
}

impl RepositoryReference {
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationFailure> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(ValidationFailure::ReferenceMissing {
                reason: "repository url could not be extracted".to_string(),
            });
        }
        crate::utils::validation::validate_url("repository.url", raw).map_err(|e| {
            ValidationFailure::ReferenceMissing {
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            url: raw.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    ExtractReference,
    VerifyReachable,
    Clone,
    VerifyContents,
    Release,
}

impl PipelineStage {
    pub fn number(&self) -> u8 {
        match self {
            PipelineStage::ExtractReference => 1,
            PipelineStage::VerifyReachable => 2,
            PipelineStage::Clone => 3,
            PipelineStage::VerifyContents => 4,
            PipelineStage::Release => 5,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::ExtractReference => "extract reference",
            PipelineStage::VerifyReachable => "verify reachable",
            PipelineStage::Clone => "clone",
            PipelineStage::VerifyContents => "verify contents",
            PipelineStage::Release => "release workspace",
        };
        write!(f, "stage {} ({})", self.number(), name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("repository reference missing: {reason}")]
    ReferenceMissing { reason: String },

    #[error("{url} is unreachable (status {status:?})")]
    ResourceUnreachable { url: String, status: Option<u16> },

    #[error("failed to clone repository: {reason}")]
    CloneFailure { reason: String },

    #[error("{} not found in repository", .path.display())]
    MissingExpectedFile { path: PathBuf },

    #[error("{} is empty", .path.display())]
    EmptyExpectedFile { path: PathBuf },
}

impl ValidationFailure {
    pub fn stage(&self) -> PipelineStage {
        match self {
            ValidationFailure::ReferenceMissing { .. } => PipelineStage::ExtractReference,
            ValidationFailure::ResourceUnreachable { .. } => PipelineStage::VerifyReachable,
            ValidationFailure::CloneFailure { .. } => PipelineStage::Clone,
            ValidationFailure::MissingExpectedFile { .. }
            | ValidationFailure::EmptyExpectedFile { .. } => PipelineStage::VerifyContents,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ValidationFailure::ReferenceMissing { .. } => {
                "Check that the storefront still links to its repository"
            }
            ValidationFailure::ResourceUnreachable { .. } => {
                "Check that the repository is public and the URL is correct"
            }
            ValidationFailure::CloneFailure { .. } => {
                "Check that git is installed and the repository allows anonymous clones"
            }
            ValidationFailure::MissingExpectedFile { .. }
            | ValidationFailure::EmptyExpectedFile { .. } => {
                "Add the expected file with some content at the repository root"
            }
        }
    }
}

/// Successful run of the repository validation pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub reference: RepositoryReference,
    pub expected_file: String,
    pub expected_file_size: u64,
    pub workspace: PathBuf,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}
