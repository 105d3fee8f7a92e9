//! Supported output languages and the language-or-default attribute resolver.
//!
//! Every language-bearing attribute of a hit (name, country, city, street) is
//! resolved the same way: the value stored for the requested language wins,
//! otherwise the attribute's `default` value is used, otherwise the attribute
//! is left out. Address layout rules live in [`LANGUAGE_PROFILES`] so that a
//! new language only needs a new table row.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::hit::{HitDocument, LocaleKey, scalar_text};

/// A language the façade can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    #[default]
    En,
    Fr,
    It,
}

/// Where the housenumber goes when a display name is synthesized from an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressOrder {
    /// `"12 Main Street"`
    HousenumberFirst,
    /// `"Hauptstraße 12"`
    StreetFirst,
}

/// Static per-language data.
#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    pub language: Language,
    pub code: &'static str,
    pub address_order: AddressOrder,
}

/// Indexed by the `Language` discriminant.
pub static LANGUAGE_PROFILES: [LanguageProfile; 4] = [
    LanguageProfile {
        language: Language::De,
        code: "de",
        address_order: AddressOrder::StreetFirst,
    },
    LanguageProfile {
        language: Language::En,
        code: "en",
        address_order: AddressOrder::HousenumberFirst,
    },
    LanguageProfile {
        language: Language::Fr,
        code: "fr",
        address_order: AddressOrder::HousenumberFirst,
    },
    LanguageProfile {
        language: Language::It,
        code: "it",
        address_order: AddressOrder::StreetFirst,
    },
];

impl Language {
    /// Look up a language by its code, returning `None` for unsupported codes.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        LANGUAGE_PROFILES
            .iter()
            .find(|profile| profile.code == code)
            .map(|profile| profile.language)
    }

    /// Resolve an optional request parameter, falling back to the default language.
    #[must_use]
    pub fn resolve(code: Option<&str>) -> Self {
        code.and_then(Self::from_code).unwrap_or_default()
    }

    #[must_use]
    pub fn profile(self) -> &'static LanguageProfile {
        &LANGUAGE_PROFILES[self as usize]
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        self.profile().code
    }

    #[must_use]
    pub fn address_order(self) -> AddressOrder {
        self.profile().address_order
    }

    /// Join a housenumber and a street in this language's order.
    ///
    /// A missing street yields the bare housenumber.
    #[must_use]
    pub fn address_label(self, housenumber: &str, street: Option<&str>) -> String {
        let parts = match self.address_order() {
            AddressOrder::HousenumberFirst => [Some(housenumber), street],
            AddressOrder::StreetFirst => [street, Some(housenumber)],
        };
        parts
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .join(" ")
    }

    pub fn all() -> impl Iterator<Item = Self> {
        LANGUAGE_PROFILES.iter().map(|profile| profile.language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Resolve a language-bearing attribute of a hit.
///
/// Empty values count as absent, so an empty translation still falls back to
/// the default value.
pub fn resolve_localized<H>(hit: &H, attribute: &str, language: Language) -> Option<String>
where
    H: HitDocument + ?Sized,
{
    [LocaleKey::Language(language), LocaleKey::Default]
        .into_iter()
        .filter_map(|key| hit.localized_value(attribute, key))
        .filter_map(scalar_text)
        .find(|value| !value.is_empty())
}
