//! Product codes.
//!
//! See the NSIDC G02158 user guide, Table 2, for the full list of model outputs.

use std::{collections::BTreeSet, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A modelled variable, identified in file names by a four digit product code.
pub enum Product {
    Precipitation,
    SnowWaterEquivalent,
    SnowDepth,
    SnowPackTemperature,
    BlowingSnowSublimation,
    SnowMelt,
    SnowPackSublimation,
}

impl Product {
    pub const ALL: [Product; 7] = [
        Product::Precipitation,
        Product::SnowWaterEquivalent,
        Product::SnowDepth,
        Product::SnowPackTemperature,
        Product::BlowingSnowSublimation,
        Product::SnowMelt,
        Product::SnowPackSublimation,
    ];

    /// Products processed when the caller does not choose any.
    pub const DEFAULT: [Product; 3] = [
        Product::Precipitation,
        Product::SnowWaterEquivalent,
        Product::SnowPackSublimation,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        Product::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Product::Precipitation => "1025",
            Product::SnowWaterEquivalent => "1034",
            Product::SnowDepth => "1036",
            Product::SnowPackTemperature => "1038",
            Product::BlowingSnowSublimation => "1039",
            Product::SnowMelt => "1044",
            Product::SnowPackSublimation => "1050",
        }
    }

    /// The abbreviation used in output raster names.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Product::Precipitation => "PREC",
            Product::SnowWaterEquivalent => "SNWE",
            Product::SnowDepth => "SNOD",
            Product::SnowPackTemperature => "SPAT",
            Product::BlowingSnowSublimation => "BlSS",
            Product::SnowMelt => "SMLT",
            Product::SnowPackSublimation => "SSUB",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Product::Precipitation => "Precipitation",
            Product::SnowWaterEquivalent => "Snow water equivalent",
            Product::SnowDepth => "Snow depth",
            Product::SnowPackTemperature => "Snow pack average temperature",
            Product::BlowingSnowSublimation => "Blowing snow sublimation",
            Product::SnowMelt => "Snow melt",
            Product::SnowPackSublimation => "Snow pack sublimation",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.abbreviation(), self.code())
    }
}

impl FromStr for Product {
    type Err = String;

    /// Accepts either the product code or the abbreviation, e.g. `1034` or `snwe`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Product::from_code(s)
            .or_else(|| {
                Product::ALL
                    .into_iter()
                    .find(|p| p.abbreviation().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| format!("unknown SNODAS product `{}`", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The set of products a run will unpack.
pub struct VariableSet(BTreeSet<Product>);

impl VariableSet {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        VariableSet(products.into_iter().collect())
    }

    pub fn contains(&self, product: Product) -> bool {
        self.0.contains(&product)
    }

    /// True if `code` names a product in the set. Codes outside the table never match.
    pub fn contains_code(&self, code: &str) -> bool {
        Product::from_code(code).is_some_and(|p| self.contains(p))
    }
}

impl Default for VariableSet {
    fn default() -> Self {
        VariableSet::new(Product::DEFAULT)
    }
}

// -- Tests -------------------------------------------------------------------
