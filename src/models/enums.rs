use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(RecordKind {
    Prescription => "prescription",
    LabReport => "lab_report",
});

str_enum!(Marker {
    None => "none",
    High => "high",
    Low => "low",
});

impl Marker {
    /// Single-letter flag printed next to an out-of-range result.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::High => "H",
            Self::Low => "L",
        }
    }

    pub fn is_flagged(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::None
    }
}

impl RecordKind {
    /// Human label used in document titles and issued-identifier filenames.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Prescription => "Prescription",
            Self::LabReport => "LabReport",
        }
    }

    /// Generic lowercase label used when no identifier was issued.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Prescription => "prescription",
            Self::LabReport => "lab-report",
        }
    }
}
