//! Token construction options

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ResolverError;
use crate::value::TokenValue;

/// Character-case family a string token is constrained to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Case {
    #[serde(rename = "lower")]
    Lower,
    #[serde(rename = "upper")]
    Upper,
    #[serde(rename = "lowerCamel")]
    LowerCamel,
    #[serde(rename = "UpperCamel")]
    UpperCamel,
}

impl Case {
    /// Base regex for the case, without padding
    pub fn regex(self) -> &'static str {
        match self {
            Case::Lower => "[a-z]",
            Case::Upper => "[A-Z]",
            Case::LowerCamel => "[a-z][a-zA-Z]",
            Case::UpperCamel => "[A-Z][a-zA-Z]",
        }
    }

    /// Camel cases carry a fixed leading character outside the padded class
    pub fn is_camel(self) -> bool {
        matches!(self, Case::LowerCamel | Case::UpperCamel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Case::Lower => "lower",
            Case::Upper => "upper",
            Case::LowerCamel => "lowerCamel",
            Case::UpperCamel => "UpperCamel",
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Case {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lower" => Ok(Case::Lower),
            "upper" => Ok(Case::Upper),
            "lowerCamel" => Ok(Case::LowerCamel),
            "UpperCamel" => Ok(Case::UpperCamel),
            _ => Err(ResolverError::UnknownCase(s.to_string())),
        }
    }
}

/// Configuration a token is constructed from
///
/// `regex` is mutually exclusive with `choices`, `padmin`, `padmax` and `case`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// Type tag of the token kind (`int`, `str`, `custom`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub regex: Option<String>,
    pub choices: Option<Vec<TokenValue>>,
    pub padmin: Option<i64>,
    pub padmax: Option<i64>,
    pub padalign: Option<char>,
    pub padchar: Option<char>,
    pub padstrict: Option<bool>,
    pub case: Option<Case>,
    pub format_spec: Option<String>,
    pub description: Option<String>,
    pub default: Option<TokenValue>,
}

impl TokenConfig {
    /// Create a configuration for the given token type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn with_choices<V: Into<TokenValue>>(mut self, choices: impl IntoIterator<Item = V>) -> Self {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_padmin(mut self, padmin: i64) -> Self {
        self.padmin = Some(padmin);
        self
    }

    pub fn with_padmax(mut self, padmax: i64) -> Self {
        self.padmax = Some(padmax);
        self
    }

    pub fn with_padalign(mut self, padalign: char) -> Self {
        self.padalign = Some(padalign);
        self
    }

    pub fn with_padchar(mut self, padchar: char) -> Self {
        self.padchar = Some(padchar);
        self
    }

    pub fn with_padstrict(mut self, padstrict: bool) -> Self {
        self.padstrict = Some(padstrict);
        self
    }

    pub fn with_case(mut self, case: Case) -> Self {
        self.case = Some(case);
        self
    }

    pub fn with_format_spec(mut self, spec: impl Into<String>) -> Self {
        self.format_spec = Some(spec.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<TokenValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Whether any option that conflicts with an explicit regex is set
    pub fn has_construction_keywords(&self) -> bool {
        self.choices.is_some() || self.padmin.is_some() || self.padmax.is_some() || self.case.is_some()
    }

    /// Validated padding bounds
    pub fn padding(&self) -> Result<(Option<usize>, Option<usize>), ResolverError> {
        validate_padding(self.padmin, self.padmax)
    }
}

/// Validate padding bounds: both non-negative and `padmin <= padmax`
pub fn validate_padding(
    padmin: Option<i64>,
    padmax: Option<i64>,
) -> Result<(Option<usize>, Option<usize>), ResolverError> {
    let check = |field: &'static str, value: Option<i64>| match value {
        Some(v) if v < 0 => Err(ResolverError::NegativePadding { field, value: v }),
        Some(v) => usize::try_from(v)
            .map(Some)
            .map_err(|_| ResolverError::NegativePadding { field, value: v }),
        None => Ok(None),
    };
    let min = check("Padmin", padmin)?;
    let max = check("Padmax", padmax)?;

    if let (Some(lo), Some(hi), Some(min_raw), Some(max_raw)) = (min, max, padmin, padmax) {
        if hi < lo {
            return Err(ResolverError::InvalidPadding {
                padmin: min_raw,
                padmax: max_raw,
            });
        }
    }
    Ok((min, max))
}

/// Regex quantifier enforcing the padding bounds; unbounded (`+`) when neither is given
pub fn regex_padding(padmin: Option<usize>, padmax: Option<usize>) -> String {
    match (padmin, padmax) {
        (Some(lo), Some(hi)) => format!("{{{},{}}}", lo, hi),
        (Some(lo), None) => format!("{{{},}}", lo),
        (None, Some(hi)) => format!("{{0,{}}}", hi),
        (None, None) => "+".to_string(),
    }
}
