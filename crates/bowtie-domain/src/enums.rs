//! Closed value sets used by Bowtie controls
//!
//! Each set is exhaustive: the wire strings below are the only accepted
//! spellings, matched exactly. `unknown` is the sanctioned value whenever the
//! source narrative does not support a more specific choice.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every member of the set, in declaration order
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// JSON field name this set constrains
            pub const FIELD: &'static str = $field;

            /// Wire spelling of the value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )+
                }
            }

            /// Exact-match parse; synonyms and case variants are rejected
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Wire spellings of every member
            pub fn allowed() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| {
                    format!("Invalid {}: '{}' (allowed: {})", $field, s, Self::allowed().join(", "))
                })
            }
        }
    };
}

closed_enum! {
    /// Which side of the top event a control sits on
    Side, "side" {
        /// Left side: stops a threat from reaching the top event
        Prevention => "prevention",
        /// Right side: limits a consequence once the top event occurred
        Mitigation => "mitigation",
    }
}

closed_enum! {
    /// Physical nature of a barrier
    BarrierType, "barrier_type" {
        /// Hardware or instrumented protection
        Engineering => "engineering",
        /// Procedures, permits, supervision
        Administrative => "administrative",
        /// Personal protective equipment
        Ppe => "ppe",
        /// Not determinable from the narrative
        Unknown => "unknown",
    }
}

closed_enum! {
    /// Position of a barrier in the defense-in-depth sequence
    LineOfDefense, "line_of_defense" {
        /// First line
        First => "1st",
        /// Second line
        Second => "2nd",
        /// Third line
        Third => "3rd",
        /// Recovery measure after the event
        Recovery => "recovery",
        /// Not determinable from the narrative
        Unknown => "unknown",
    }
}

closed_enum! {
    /// Observed state of a barrier during the incident
    BarrierStatus, "barrier_status" {
        /// Worked as intended
        Active => "active",
        /// Partially effective
        Degraded => "degraded",
        /// Demanded and did not work
        Failed => "failed",
        /// Deliberately defeated or overridden
        Bypassed => "bypassed",
        /// Required but absent
        NotInstalled => "not_installed",
        /// Not determinable from the narrative
        Unknown => "unknown",
    }
}

closed_enum! {
    /// Strength of the textual evidence backing a control
    Confidence, "confidence" {
        /// Explicitly stated in the narrative
        High => "high",
        /// Strongly implied
        Medium => "medium",
        /// Weakly implied or inferred
        Low => "low",
    }
}

impl Confidence {
    /// Numeric score used for corpus averages (high = 1.0, low = 0.0)
    pub fn score(&self) -> f64 {
        match self {
            Confidence::High => 1.0,
            Confidence::Medium => 0.5,
            Confidence::Low => 0.0,
        }
    }
}
