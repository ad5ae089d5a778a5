use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Sentinel accepted by every filter selector to mean "no restriction".
pub const ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    // Categories are compared verbatim, so only the exact sentinel means "all".
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(if raw == ALL {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(raw.to_string())
        })
    }
}

/// Status selector as shown in the UI ("Under Review") normalized to the
/// stored form ("under-review").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

impl StatusFilter {
    pub fn matches(&self, status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

pub fn normalize_status_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "-")
}

impl FromStr for StatusFilter {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(if raw == ALL {
            StatusFilter::All
        } else {
            StatusFilter::Only(normalize_status_label(raw))
        })
    }
}

/// Changelog type selector; the sentinel and the type are both case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeFilter {
    #[default]
    All,
    Only(String),
}

impl TypeFilter {
    pub fn matches(&self, entry_type: &str) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => wanted == entry_type,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Ok(if normalized == "all" {
            TypeFilter::All
        } else {
            TypeFilter::Only(normalized)
        })
    }
}

/// Ordering for feedback lists and roadmap columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackSort {
    #[default]
    VotesDesc,
    VotesAsc,
    DateDesc,
    DateAsc,
    /// Unknown keys keep the filtered order.
    Unsorted,
}

impl FeedbackSort {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackSort::VotesDesc => "votes-desc",
            FeedbackSort::VotesAsc => "votes-asc",
            FeedbackSort::DateDesc => "date-desc",
            FeedbackSort::DateAsc => "date-asc",
            FeedbackSort::Unsorted => "none",
        }
    }
}

impl FromStr for FeedbackSort {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw {
            "votes-desc" => FeedbackSort::VotesDesc,
            "votes-asc" => FeedbackSort::VotesAsc,
            "date-desc" => FeedbackSort::DateDesc,
            "date-asc" => FeedbackSort::DateAsc,
            _ => FeedbackSort::Unsorted,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangelogSort {
    #[default]
    DateDesc,
    DateAsc,
    Type,
    Unsorted,
}

impl ChangelogSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangelogSort::DateDesc => "date-desc",
            ChangelogSort::DateAsc => "date-asc",
            ChangelogSort::Type => "type",
            ChangelogSort::Unsorted => "none",
        }
    }
}

impl FromStr for ChangelogSort {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw {
            "date-desc" => ChangelogSort::DateDesc,
            "date-asc" => ChangelogSort::DateAsc,
            "type" => ChangelogSort::Type,
            _ => ChangelogSort::Unsorted,
        })
    }
}

/// Parse a selector that can never fail.
pub fn parse<T: FromStr<Err = Infallible>>(raw: &str) -> T {
    match raw.parse() {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
