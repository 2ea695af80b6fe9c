//! Lists the SNODAS products.

use crate::product::{Product, VariableSet};

pub fn products() -> Vec<String> {
    let defaults = VariableSet::default();

    Product::ALL
        .iter()
        .map(|p| {
            format!(
                "{}  {:<4}  {:<30}{}",
                p.code(),
                p.abbreviation(),
                p.description(),
                if defaults.contains(*p) { "  (default)" } else { "" }
            )
        })
        .collect()
}

// -- Tests -------------------------------------------------------------------
