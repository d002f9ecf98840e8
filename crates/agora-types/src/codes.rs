use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} code '{value}'")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of industry codes. Listing and job category slugs are built
/// from these tokens, and investor profiles pick from the same set, so the
/// matching scorer never compares free-text strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Fintech,
    Saas,
    Ecommerce,
    Retail,
    Health,
    Biotech,
    Energy,
    Agritech,
    Education,
    Gaming,
    Logistics,
    Media,
    Travel,
    Proptech,
    Manufacturing,
}

impl Industry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Fintech => "fintech",
            Industry::Saas => "saas",
            Industry::Ecommerce => "ecommerce",
            Industry::Retail => "retail",
            Industry::Health => "health",
            Industry::Biotech => "biotech",
            Industry::Energy => "energy",
            Industry::Agritech => "agritech",
            Industry::Education => "education",
            Industry::Gaming => "gaming",
            Industry::Logistics => "logistics",
            Industry::Media => "media",
            Industry::Travel => "travel",
            Industry::Proptech => "proptech",
            Industry::Manufacturing => "manufacturing",
        }
    }
}

impl FromStr for Industry {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fintech" => Ok(Industry::Fintech),
            "saas" => Ok(Industry::Saas),
            "ecommerce" => Ok(Industry::Ecommerce),
            "retail" => Ok(Industry::Retail),
            "health" => Ok(Industry::Health),
            "biotech" => Ok(Industry::Biotech),
            "energy" => Ok(Industry::Energy),
            "agritech" => Ok(Industry::Agritech),
            "education" => Ok(Industry::Education),
            "gaming" => Ok(Industry::Gaming),
            "logistics" => Ok(Industry::Logistics),
            "media" => Ok(Industry::Media),
            "travel" => Ok(Industry::Travel),
            "proptech" => Ok(Industry::Proptech),
            "manufacturing" => Ok(Industry::Manufacturing),
            _ => Err(UnknownCode { kind: "industry", value: s.to_string() }),
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Funding/maturity stage an investor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idea,
    Prototype,
    Seed,
    Growth,
    Established,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idea => "idea",
            Stage::Prototype => "prototype",
            Stage::Seed => "seed",
            Stage::Growth => "growth",
            Stage::Established => "established",
        }
    }
}

impl FromStr for Stage {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idea" => Ok(Stage::Idea),
            "prototype" => Ok(Stage::Prototype),
            "seed" => Ok(Stage::Seed),
            "growth" => Ok(Stage::Growth),
            "established" => Ok(Stage::Established),
            _ => Err(UnknownCode { kind: "stage", value: s.to_string() }),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uppercase two-letter country code, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CountryCode {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 2 && s.bytes().all(|b| b.is_ascii_alphabetic()) {
            Ok(CountryCode(s.to_ascii_uppercase()))
        } else {
            Err(UnknownCode { kind: "country", value: s.to_string() })
        }
    }
}

impl TryFrom<String> for CountryCode {
    type Error = UnknownCode;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> String {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a `-`-separated category slug into the distinct industry tokens it
/// names. Every token must be a known code and the slug must name at least
/// one, so invalid categories are rejected at write time.
pub fn parse_category_slug(slug: &str) -> Result<Vec<Industry>, UnknownCode> {
    let mut tokens = Vec::new();
    for token in slug.split('-').filter(|t| !t.is_empty()) {
        let code: Industry = token.parse()?;
        if !tokens.contains(&code) {
            tokens.push(code);
        }
    }
    if tokens.is_empty() {
        return Err(UnknownCode { kind: "category", value: slug.to_string() });
    }
    Ok(tokens)
}

/// Parse a whitespace-separated list of codes as stored in the database.
pub fn parse_code_list<T: FromStr>(raw: &str) -> Result<Vec<T>, T::Err> {
    raw.split_whitespace().map(|token| token.parse()).collect()
}

/// Render a code list back to its whitespace-separated storage form.
pub fn join_code_list<T: fmt::Display>(codes: &[T]) -> String {
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_slug_splits_and_dedupes() {
        let tokens = parse_category_slug("fintech-saas-fintech").unwrap();
        assert_eq!(tokens, vec![Industry::Fintech, Industry::Saas]);
    }

    #[test]
    fn category_slug_rejects_unknown_token() {
        let err = parse_category_slug("fintech-underwater").unwrap_err();
        assert_eq!(err.value, "underwater");
    }

    #[test]
    fn category_slug_rejects_empty() {
        assert!(parse_category_slug("").is_err());
        assert!(parse_category_slug("--").is_err());
    }

    #[test]
    fn country_code_validates_and_uppercases() {
        let code: CountryCode = "fr".parse().unwrap();
        assert_eq!(code.as_str(), "FR");
        assert!("FRA".parse::<CountryCode>().is_err());
        assert!("1X".parse::<CountryCode>().is_err());
    }

    #[test]
    fn code_list_round_trip() {
        let codes: Vec<Industry> = parse_code_list("fintech energy").unwrap();
        assert_eq!(codes, vec![Industry::Fintech, Industry::Energy]);
        assert_eq!(join_code_list(&codes), "fintech energy");
    }
}
