//! Parses SNODAS member file names.
//!
//! A member name such as `us_ssmv01025SlL01T0024TTNATS2003100105DP001.dat.gz` carries
//! the product code in the four characters that start five after `ssmv`, and the date in the
//! eight characters that start two after `TS`. Precipitation grids also carry a phase token,
//! `L01` for liquid and `L00` for solid.

use chrono::NaiveDate;

use crate::error::NameError;

use super::Product;

const CODE_MARKER: &str = "ssmv";
const CODE_OFFSET: usize = 5;
const CODE_WIDTH: usize = 4;

const DATE_MARKER: &str = "TS";
const DATE_OFFSET: usize = 2;
const DATE_WIDTH: usize = 8;

const LIQUID_TOKEN: &str = "L01";
const SOLID_TOKEN: &str = "L00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipitationPhase {
    Liquid,
    Solid,
}

impl PrecipitationPhase {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.contains(LIQUID_TOKEN) {
            Some(PrecipitationPhase::Liquid)
        } else if name.contains(SOLID_TOKEN) {
            Some(PrecipitationPhase::Solid)
        } else {
            None
        }
    }

    pub fn qualifier(&self) -> &'static str {
        match self {
            PrecipitationPhase::Liquid => "LQD",
            PrecipitationPhase::Solid => "SOL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The identity of a decompressed data grid.
pub struct MemberName {
    pub product: Product,
    pub date: NaiveDate,
    pub phase: Option<PrecipitationPhase>,
}

impl MemberName {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let code = product_code(name)?;
        let product = Product::from_code(code).ok_or_else(|| NameError::UnknownProduct {
            code: code.to_string(),
            name: name.to_string(),
        })?;
        let date = product_date(name)?;

        let phase = match product {
            Product::Precipitation => Some(
                PrecipitationPhase::from_name(name).ok_or_else(|| NameError::MissingPhase {
                    name: name.to_string(),
                })?,
            ),
            _ => None,
        };

        Ok(MemberName {
            product,
            date,
            phase,
        })
    }

    /// Output name `<date><abbreviation>[<qualifier>].tif`.
    pub fn raster_name(&self) -> String {
        format!(
            "{}{}{}.tif",
            self.date.format("%Y%m%d"),
            self.product.abbreviation(),
            self.phase.map(|p| p.qualifier()).unwrap_or_default()
        )
    }
}

/// Returns the four digit product code of a member name.
pub fn product_code(name: &str) -> Result<&str, NameError> {
    let code = fixed_width(name, CODE_MARKER, CODE_OFFSET, CODE_WIDTH)?;
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NameError::MalformedCode {
            code: code.to_string(),
            name: name.to_string(),
        });
    }

    Ok(code)
}

/// Returns the date embedded in a member name.
pub fn product_date(name: &str) -> Result<NaiveDate, NameError> {
    let token = fixed_width(name, DATE_MARKER, DATE_OFFSET, DATE_WIDTH)?;

    NaiveDate::parse_from_str(token, "%Y%m%d").map_err(|_| NameError::MalformedDate {
        token: token.to_string(),
        name: name.to_string(),
    })
}

// The token of `width` characters starting `offset` characters after the first `marker`.
fn fixed_width<'a>(
    name: &'a str,
    marker: &'static str,
    offset: usize,
    width: usize,
) -> Result<&'a str, NameError> {
    let start = name.find(marker).ok_or_else(|| NameError::MissingMarker {
        marker,
        name: name.to_string(),
    })? + offset;

    name.get(start..start + width)
        .ok_or_else(|| NameError::Truncated {
            marker,
            width,
            name: name.to_string(),
        })
}

// -- Tests -------------------------------------------------------------------
