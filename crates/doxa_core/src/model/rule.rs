//! Validation rule model.
//!
//! # Responsibility
//! - Define rule records and the validation pass (`domain`) each feeds.
//! - Define the closed set of sort orders rule listings accept.
//!
//! # Invariants
//! - `doc` and `corpus` are SQL `LIKE` patterns (`%` wildcard).
//! - Sort columns come only from [`RuleSortKey`]; caller text never reaches SQL.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Autoincrement identity of one validation rule.
pub type RuleId = i64;

/// Validation pass a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDomain {
    Xml,
    Meta,
    Ether,
    Export,
}

impl RuleDomain {
    pub const ALL: [RuleDomain; 4] = [Self::Xml, Self::Meta, Self::Ether, Self::Export];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Meta => "meta",
            Self::Ether => "ether",
            Self::Export => "export",
        }
    }

    /// Whether changing a rule of this domain can affect every document,
    /// rather than only spreadsheet-mode ones.
    pub fn invalidates_all_documents(self) -> bool {
        matches!(self, Self::Meta)
    }
}

impl Display for RuleDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleDomain {
    type Err = RuleParseError;

    /// Accepts any letter case and surrounding whitespace.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RuleParseError::UnknownDomain(value.to_string()))
    }
}

/// One stored validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub doc: String,
    pub corpus: String,
    pub domain: RuleDomain,
    pub name: String,
    pub operator: String,
    pub argument: String,
}

/// Input for creating or replacing a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRule {
    pub doc: String,
    pub corpus: String,
    pub domain: RuleDomain,
    pub name: String,
    pub operator: String,
    pub argument: String,
}

impl NewRule {
    pub fn new(
        doc: impl Into<String>,
        corpus: impl Into<String>,
        domain: RuleDomain,
        name: impl Into<String>,
        operator: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            doc: doc.into(),
            corpus: corpus.into(),
            domain,
            name: name.into(),
            operator: operator.into(),
            argument: argument.into(),
        }
    }
}

/// Column a rule listing may be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSortKey {
    Corpus,
    Doc,
    Domain,
    Name,
    Operator,
    Argument,
    #[default]
    Id,
}

impl RuleSortKey {
    pub fn column(self) -> &'static str {
        match self {
            Self::Corpus => "corpus",
            Self::Doc => "doc",
            Self::Domain => "domain",
            Self::Name => "name",
            Self::Operator => "operator",
            Self::Argument => "argument",
            Self::Id => "id",
        }
    }
}

impl FromStr for RuleSortKey {
    type Err = RuleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "corpus" => Ok(Self::Corpus),
            "doc" => Ok(Self::Doc),
            "domain" => Ok(Self::Domain),
            "name" => Ok(Self::Name),
            "operator" => Ok(Self::Operator),
            "argument" => Ok(Self::Argument),
            "id" => Ok(Self::Id),
            _ => Err(RuleParseError::UnknownSortKey(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated ordering for `get_sorted_rules`.
///
/// Parses UI tokens such as `"name"` or `"corpus DESC"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSort {
    pub key: RuleSortKey,
    pub direction: SortDirection,
}

impl RuleSort {
    pub fn new(key: RuleSortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Renders the `ORDER BY` operand from enumerated parts only.
    pub fn order_by_clause(self) -> String {
        format!("{} {}", self.key.column(), self.direction.keyword())
    }
}

impl FromStr for RuleSort {
    type Err = RuleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split_whitespace();
        let key = parts
            .next()
            .ok_or_else(|| RuleParseError::UnknownSortKey(value.to_string()))?
            .parse::<RuleSortKey>()?;

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Err(RuleParseError::UnknownSortDirection(value.to_string())),
        };

        if parts.next().is_some() {
            return Err(RuleParseError::UnknownSortDirection(value.to_string()));
        }

        Ok(Self { key, direction })
    }
}

/// Error for rule-related text that does not map to a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleParseError {
    UnknownDomain(String),
    UnknownSortKey(String),
    UnknownSortDirection(String),
}

impl Display for RuleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDomain(value) => {
                write!(f, "unknown rule domain `{value}`; expected xml|meta|ether|export")
            }
            Self::UnknownSortKey(value) => write!(f, "unknown rule sort key in `{value}`"),
            Self::UnknownSortDirection(value) => {
                write!(f, "unknown rule sort direction in `{value}`; expected ASC|DESC")
            }
        }
    }
}

impl Error for RuleParseError {}
