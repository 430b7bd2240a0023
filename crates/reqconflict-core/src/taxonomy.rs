//! The closed conflict taxonomy.
//!
//! Every category that is ever stored or reported is a [`ConflictCategory`].
//! Free text from the inference service only becomes a category through
//! [`ConflictCategory::from_label`], which accepts exact labels and nothing else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown conflict category: {0:?}")]
pub struct UnknownCategory(pub String);

/// A conflict category label, including the `No Conflict` and `Other` sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConflictCategory {
    Performance,
    Compliance,
    Safety,
    Cost,
    Battery,
    Environmental,
    Structural,
    Comfort,
    PowerSource,
    Sustainability,
    Regulatory,
    Material,
    Technology,
    Resource,
    Design,
    Weight,
    Aesthetic,
    Usability,
    Maintenance,
    Durability,
    Connectivity,
    Security,
    Thermal,
    Schedule,
    Contradiction,
    NoConflict,
    Other,
}

impl ConflictCategory {
    /// Every category in enumeration order, sentinels last.
    pub const ALL: [ConflictCategory; 27] = [
        Self::Performance,
        Self::Compliance,
        Self::Safety,
        Self::Cost,
        Self::Battery,
        Self::Environmental,
        Self::Structural,
        Self::Comfort,
        Self::PowerSource,
        Self::Sustainability,
        Self::Regulatory,
        Self::Material,
        Self::Technology,
        Self::Resource,
        Self::Design,
        Self::Weight,
        Self::Aesthetic,
        Self::Usability,
        Self::Maintenance,
        Self::Durability,
        Self::Connectivity,
        Self::Security,
        Self::Thermal,
        Self::Schedule,
        Self::Contradiction,
        Self::NoConflict,
        Self::Other,
    ];

    /// The exact label used on the wire and in output tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Performance => "Performance Conflict",
            Self::Compliance => "Compliance Conflict",
            Self::Safety => "Safety Conflict",
            Self::Cost => "Cost Conflict",
            Self::Battery => "Battery Conflict",
            Self::Environmental => "Environmental Conflict",
            Self::Structural => "Structural Conflict",
            Self::Comfort => "Comfort Conflict",
            Self::PowerSource => "Power Source Conflict",
            Self::Sustainability => "Sustainability Conflict",
            Self::Regulatory => "Regulatory Conflict",
            Self::Material => "Material Conflict",
            Self::Technology => "Technology Conflict",
            Self::Resource => "Resource Conflict",
            Self::Design => "Design Conflict",
            Self::Weight => "Weight Conflict",
            Self::Aesthetic => "Aesthetic Conflict",
            Self::Usability => "Usability Conflict",
            Self::Maintenance => "Maintenance Conflict",
            Self::Durability => "Durability Conflict",
            Self::Connectivity => "Connectivity Conflict",
            Self::Security => "Security Conflict",
            Self::Thermal => "Thermal Conflict",
            Self::Schedule => "Schedule Conflict",
            Self::Contradiction => "Contradiction",
            Self::NoConflict => "No Conflict",
            Self::Other => "Other",
        }
    }

    /// One-line meaning shown to the model next to the label.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Performance => "one requirement limits speed, power, range or throughput the other demands",
            Self::Compliance => "satisfying one requirement breaks a mandated standard the other relies on",
            Self::Safety => "one requirement weakens a safety provision the other establishes",
            Self::Cost => "the requirements cannot both be met within the implied budget",
            Self::Battery => "competing demands on battery capacity, charging or longevity",
            Self::Environmental => "one requirement increases emissions, noise or waste the other restricts",
            Self::Structural => "incompatible demands on frame, chassis or load-bearing parts",
            Self::Comfort => "one requirement degrades rider or user comfort the other requires",
            Self::PowerSource => "incompatible assumptions about fuel, electric or hybrid propulsion",
            Self::Sustainability => "one requirement undermines long-term sustainability goals of the other",
            Self::Regulatory => "the requirements imply contradictory legal or homologation positions",
            Self::Material => "the requirements call for incompatible materials",
            Self::Technology => "the requirements assume incompatible technologies or architectures",
            Self::Resource => "competing demands on a shared, limited resource",
            Self::Design => "incompatible design intents or form factors",
            Self::Weight => "one requirement adds mass the other forbids",
            Self::Aesthetic => "incompatible styling or visual requirements",
            Self::Usability => "one requirement makes the product harder to use in a way the other rules out",
            Self::Maintenance => "one requirement complicates servicing the other keeps simple",
            Self::Durability => "one requirement shortens service life the other guarantees",
            Self::Connectivity => "incompatible demands on communication interfaces or networking",
            Self::Security => "one requirement exposes an attack surface the other must close",
            Self::Thermal => "competing demands on heat generation or dissipation",
            Self::Schedule => "the requirements cannot both be delivered in the implied timeline",
            Self::Contradiction => "the requirements directly negate each other",
            Self::NoConflict => "the requirements are compatible",
            Self::Other => "a conflict that fits none of the categories above",
        }
    }

    /// Parse an exact label. Anything that is not a known label is rejected.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Parse an exact label, coercing unknown text to [`ConflictCategory::Other`].
    pub fn from_label_or_other(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Self::Other)
    }

    /// `No Conflict` and `Other` are reserved outcomes, not conflict types.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::NoConflict | Self::Other)
    }

    pub fn is_conflict(&self) -> bool {
        *self != Self::NoConflict
    }

    /// The named conflict categories, sentinels excluded.
    pub fn named() -> impl Iterator<Item = ConflictCategory> {
        Self::ALL.into_iter().filter(|c| !c.is_sentinel())
    }
}

impl fmt::Display for ConflictCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConflictCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for ConflictCategory {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConflictCategory> for String {
    fn from(value: ConflictCategory) -> Self {
        value.label().to_string()
    }
}
