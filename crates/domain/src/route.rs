//! Route templates and the single-segment path matcher.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use campus_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// HTTP method selector for a route entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    /// `GET` requests.
    Get,
    /// `POST` requests.
    Post,
    /// `PUT` requests.
    Put,
    /// `PATCH` requests.
    Patch,
    /// `DELETE` requests.
    Delete,
    /// Every method.
    Any,
}

impl RouteMethod {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Any => "ANY",
        }
    }

    /// Returns whether an entry declared with `self` applies to a request
    /// made with `request_method`.
    #[must_use]
    pub fn accepts(&self, request_method: Self) -> bool {
        *self == Self::Any || *self == request_method
    }

    /// Returns whether two entry selectors can apply to the same request.
    #[must_use]
    pub fn overlaps(&self, other: Self) -> bool {
        *self == Self::Any || other == Self::Any || *self == other
    }
}

impl FromStr for RouteMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "ANY" | "*" => Ok(Self::Any),
            _ => Err(AppError::Validation(format!(
                "unsupported route method '{value}'"
            ))),
        }
    }
}

impl Display for RouteMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One `/`-delimited part of a route template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSegment {
    /// Matches the identical concrete segment (case-sensitive).
    Literal(String),
    /// Matches exactly one non-empty concrete segment. Holds the parameter name.
    Dynamic(String),
}

impl TemplateSegment {
    fn parse(raw: &str, template: &str) -> AppResult<Self> {
        if raw.is_empty() {
            return Err(AppError::Validation(format!(
                "route template '{template}' contains an empty segment"
            )));
        }

        let Some(inner) = raw.strip_prefix('[') else {
            if raw.contains(['[', ']']) {
                return Err(AppError::Validation(format!(
                    "route template '{template}' has a malformed segment '{raw}'"
                )));
            }
            return Ok(Self::Literal(raw.to_owned()));
        };

        let Some(name) = inner.strip_suffix(']') else {
            return Err(AppError::Validation(format!(
                "route template '{template}' has an unterminated dynamic segment '{raw}'"
            )));
        };

        if name.starts_with('[') || name.starts_with("...") {
            return Err(AppError::Validation(format!(
                "route template '{template}' uses catch-all segment '{raw}', only single-segment parameters are supported"
            )));
        }

        let is_identifier = !name.is_empty()
            && name
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || character == '_' || character == '-');
        if !is_identifier {
            return Err(AppError::Validation(format!(
                "route template '{template}' has an invalid parameter name in '{raw}'"
            )));
        }

        Ok(Self::Dynamic(name.to_owned()))
    }

    /// Returns whether this is a literal segment.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    fn matches(&self, concrete: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == concrete,
            Self::Dynamic(_) => !concrete.is_empty(),
        }
    }
}

/// Parsed path pattern such as `/api/hr/employees/[id]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<TemplateSegment>,
}

impl RouteTemplate {
    /// Parses and validates a route template.
    pub fn parse(template: &str) -> AppResult<Self> {
        if !template.starts_with('/') {
            return Err(AppError::Validation(format!(
                "route template '{template}' must start with '/'"
            )));
        }

        let segments = split_path(template)
            .map(|segment| TemplateSegment::parse(segment, template))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            raw: template.to_owned(),
            segments,
        })
    }

    /// Returns the template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of literal segments before the first dynamic segment.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .take_while(|segment| segment.is_literal())
            .count()
    }

    /// Cumulative character length of all literal segments.
    #[must_use]
    pub fn literal_length(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                TemplateSegment::Literal(literal) => literal.chars().count(),
                TemplateSegment::Dynamic(_) => 0,
            })
            .sum()
    }

    /// Ranking used to pick between several matching templates.
    #[must_use]
    pub fn rank(&self) -> (usize, usize) {
        (self.specificity(), self.literal_length())
    }

    /// Returns whether both templates have the same shape, ignoring
    /// parameter names.
    #[must_use]
    pub fn is_structurally_identical(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (TemplateSegment::Literal(left), TemplateSegment::Literal(right)) => {
                        left == right
                    }
                    (TemplateSegment::Dynamic(_), TemplateSegment::Dynamic(_)) => true,
                    _ => false,
                })
    }

    /// Returns whether some concrete path is matched by both templates.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (TemplateSegment::Literal(left), TemplateSegment::Literal(right)) => {
                        left == right
                    }
                    _ => true,
                })
    }

    /// Builds a concrete path by replacing every dynamic segment with `value`.
    #[must_use]
    pub fn instantiate(&self, value: &str) -> String {
        if self.segments.is_empty() {
            return "/".to_owned();
        }

        self.segments.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            match segment {
                TemplateSegment::Literal(literal) => path.push_str(literal),
                TemplateSegment::Dynamic(_) => path.push_str(value),
            }
            path
        })
    }
}

impl Display for RouteTemplate {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.raw)
    }
}

/// Outcome of matching one template against one concrete path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMatch {
    /// Whether every segment matched.
    pub matched: bool,
    /// Literal segments before the first dynamic one; zero when unmatched.
    pub specificity: usize,
}

impl PathMatch {
    const NO_MATCH: Self = Self {
        matched: false,
        specificity: 0,
    };
}

/// Matches a concrete request path against a template.
#[must_use]
pub fn match_path(template: &RouteTemplate, concrete_path: &str) -> PathMatch {
    let mut concrete = split_path(concrete_path);
    let mut segments = template.segments().iter();

    loop {
        match (segments.next(), concrete.next()) {
            (None, None) => {
                return PathMatch {
                    matched: true,
                    specificity: template.specificity(),
                };
            }
            (Some(segment), Some(value)) if segment.matches(value) => {}
            _ => return PathMatch::NO_MATCH,
        }
    }
}

/// Splits a path into segments, ignoring one leading and one trailing slash.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.split('/').filter({
        let is_root = trimmed.is_empty();
        move |_| !is_root
    })
}

/// Number of segments in a concrete path.
#[must_use]
pub fn segment_count(path: &str) -> usize {
    split_path(path).count()
}
