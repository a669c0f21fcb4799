use crate::error::{InvoiceSplitterError, Result};
use crate::types::{RuleOptions, DEFAULT_MARKERS};
use regex::{Regex, RegexBuilder};
use std::fmt;

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Any of the substrings. Stored lowercased when matching ignores case.
    Literal(Vec<String>),
    Pattern(Regex),
}

/// Compiled criterion deciding whether a page starts a new invoice.
#[derive(Debug, Clone)]
pub struct MarkerRule {
    matcher: Matcher,
    case_sensitive: bool,
    scan_limit: Option<usize>,
}

impl MarkerRule {
    pub fn literal<I, S>(markers: I, case_sensitive: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let markers: Vec<String> = markers.into_iter().map(Into::into).collect();
        if markers.is_empty() {
            return Err(InvoiceSplitterError::InvalidRule {
                reason: "at least one marker is required".to_string(),
            });
        }
        if let Some(blank) = markers.iter().find(|m| m.trim().is_empty()) {
            return Err(InvoiceSplitterError::InvalidRule {
                reason: format!("marker {:?} is empty", blank),
            });
        }

        let markers = if case_sensitive {
            markers
        } else {
            markers.iter().map(|m| m.to_lowercase()).collect()
        };

        Ok(Self {
            matcher: Matcher::Literal(markers),
            case_sensitive,
            scan_limit: None,
        })
    }

    pub fn pattern(pattern: &str, case_sensitive: bool) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(InvoiceSplitterError::InvalidRule {
                reason: "regex pattern is empty".to_string(),
            });
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| InvoiceSplitterError::InvalidRule {
                reason: format!("invalid regex pattern {:?}: {}", pattern, e),
            })?;

        Ok(Self {
            matcher: Matcher::Pattern(regex),
            case_sensitive,
            scan_limit: None,
        })
    }

    /// Builds the rule for one invocation. Markers and a pattern are mutually
    /// exclusive; with neither, [`DEFAULT_MARKERS`] apply.
    pub fn from_options(options: &RuleOptions) -> Result<Self> {
        let markers: Vec<&str> = options
            .markers
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect();

        if let Some(pattern) = options.regex.as_deref() {
            if !markers.is_empty() {
                return Err(InvoiceSplitterError::Config {
                    reason: "marker text and regex pattern are mutually exclusive".to_string(),
                });
            }
            return Self::pattern(pattern, options.case_sensitive)?.with_scan_limit(options.scan_limit);
        }

        let rule = if markers.is_empty() {
            if !options.markers.is_empty() {
                return Err(InvoiceSplitterError::InvalidRule {
                    reason: "marker text is empty".to_string(),
                });
            }
            Self::literal(DEFAULT_MARKERS.iter().copied(), options.case_sensitive)?
        } else {
            Self::literal(markers, options.case_sensitive)?
        };

        rule.with_scan_limit(options.scan_limit)
    }

    pub fn with_scan_limit(mut self, scan_limit: Option<usize>) -> Result<Self> {
        if scan_limit == Some(0) {
            return Err(InvoiceSplitterError::Config {
                reason: "scan limit must be greater than 0".to_string(),
            });
        }
        self.scan_limit = scan_limit;
        Ok(self)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn scan_limit(&self) -> Option<usize> {
        self.scan_limit
    }

    pub fn is_match(&self, text: &str) -> bool {
        let window = self.scan_window(text);

        match &self.matcher {
            Matcher::Literal(markers) if self.case_sensitive => {
                markers.iter().any(|m| window.contains(m.as_str()))
            }
            Matcher::Literal(markers) => {
                let folded = window.to_lowercase();
                markers.iter().any(|m| folded.contains(m.as_str()))
            }
            Matcher::Pattern(regex) => regex.is_match(window),
        }
    }

    fn scan_window<'a>(&self, text: &'a str) -> &'a str {
        match self.scan_limit {
            Some(limit) => match text.char_indices().nth(limit) {
                Some((cut, _)) => &text[..cut],
                None => text,
            },
            None => text,
        }
    }
}

impl fmt::Display for MarkerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Matcher::Literal(markers) => write!(f, "markers {:?}", markers)?,
            Matcher::Pattern(regex) => write!(f, "pattern /{}/", regex.as_str())?,
        }
        if !self.case_sensitive {
            write!(f, " (ignoring case)")?;
        }
        if let Some(limit) = self.scan_limit {
            write!(f, " within first {} chars", limit)?;
        }
        Ok(())
    }
}
