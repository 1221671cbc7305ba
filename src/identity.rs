//! Local OS identity facts used for product-name resolution.
//!
//! The identity source (registry/CIM reads, out of scope here) supplies a
//! product family, an optional display version, and a processor architecture.
//! Family classification must succeed before any matching is attempted: an
//! unrecognized family fails identity construction rather than guessing.

use serde::{Deserialize, Serialize};

/// Supported Windows client product families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductFamily {
    Windows10,
    Windows11,
}

impl ProductFamily {
    /// The family prefix exactly as it appears in bulletin product names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows10 => "Windows 10",
            Self::Windows11 => "Windows 11",
        }
    }

    /// Classify a free-form OS name into a family.
    ///
    /// `"Windows 11"` is checked first so it is never shadowed by the
    /// `"Windows 1"`-adjacent substring of a Windows 10 name.
    pub fn classify(os_name: &str) -> Option<Self> {
        let lower = os_name.to_ascii_lowercase();
        if lower.contains("windows 11") {
            Some(Self::Windows11)
        } else if lower.contains("windows 10") {
            Some(Self::Windows10)
        } else {
            None
        }
    }

    /// All recognized families, used to pre-filter family-shaped rows.
    pub fn all() -> &'static [ProductFamily] {
        &[Self::Windows10, Self::Windows11]
    }
}

/// Processor architectures as the bulletin corpus names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    X64,
    Arm64,
    X86,
}

impl Architecture {
    /// Map a raw architecture token (`x64`, `AMD64`, `ARM64`, `x86`, ...)
    /// to the closed set. Unknown tokens default to `X64`, the overwhelmingly
    /// common case for this corpus.
    pub fn classify(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower == "x64" || lower == "amd64" {
            Self::X64
        } else if lower.contains("arm64") {
            Self::Arm64
        } else if lower == "x86" || lower == "32-bit" {
            Self::X86
        } else {
            Self::X64
        }
    }

    /// The architecture suffix used in canonical product names:
    /// `"x64-based Systems"`, `"ARM64-based Systems"`, `"32-bit Systems"`.
    pub fn product_suffix(&self) -> &'static str {
        match self {
            Self::X64 => "x64-based Systems",
            Self::Arm64 => "ARM64-based Systems",
            Self::X86 => "32-bit Systems",
        }
    }
}

/// Identity facts resolved from the local host, input to the product resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub family: ProductFamily,
    /// Display version token such as `24H2`; absent on older builds.
    pub display_version: Option<String>,
    pub architecture: Architecture,
}

impl ResolvedIdentity {
    /// Build an identity from raw OS facts.
    ///
    /// Returns `None` when the family cannot be determined — resolution never
    /// proceeds on a guessed family.
    pub fn from_os_facts(
        os_name: &str,
        display_version: Option<&str>,
        architecture: &str,
    ) -> Option<Self> {
        let family = ProductFamily::classify(os_name)?;
        let display_version = display_version
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Some(Self {
            family,
            display_version,
            architecture: Architecture::classify(architecture),
        })
    }
}
