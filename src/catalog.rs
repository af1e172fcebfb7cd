//! Static box catalogue and pricing rules.
//!
//! The catalogue is fixed reference data: every run enumerates the same
//! category x name x size cross product, so products are identical across
//! runs and independent of the random seed.

use crate::schema::{format_id, Product};
use chrono::NaiveDate;

/// Dataset epoch: products exist from this date, and no generated date
/// precedes it.
pub const DATASET_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(d) => d,
    None => panic!("invalid dataset epoch"),
};

/// Product names per category.
pub const BOX_CATALOGUE: &[(&str, &[&str])] = &[
    (
        "general_purpose",
        &[
            "Boxify Classic",
            "Stow Mate",
            "Neat Nest",
            "Tidy Vault",
            "Cubix Hold",
        ],
    ),
    (
        "premium",
        &[
            "Luxe Fold",
            "Velari Box",
            "Monobox Signature",
            "EvoCrate",
            "Silhouette Box",
        ],
    ),
    (
        "eco_friendly",
        &[
            "Green Pack",
            "Eco Nest Crate",
            "ReLeaf Box",
            "Earth Fold",
            "Bio Box",
        ],
    ),
    (
        "heavy_duty",
        &[
            "Haul Pro",
            "Strong Stash",
            "Load Boxer",
            "Transit Max",
            "Grip Box",
        ],
    ),
    (
        "gift_decorative",
        &[
            "Charm Crate",
            "Gifty Glow",
            "Wrap Nest",
            "Aura Box",
            "Velvet Case",
        ],
    ),
    (
        "flatpack_stackable",
        &[
            "Stack Right",
            "Fold Box",
            "Slim Nest",
            "Snap Crate",
            "Quick Stack",
        ],
    ),
];

/// Box size label with dimensions in cm (width, length, height).
pub const BOX_SIZES: &[(&str, f64, f64, f64)] = &[
    ("Small", 20.5, 25.5, 15.5),
    ("Medium", 30.5, 35.5, 20.5),
    ("Large", 40.5, 50.5, 30.5),
    ("Extra Large", 50.5, 60.5, 40.5),
];

/// Base price per size label, before the category multiplier.
pub const SIZE_BASE_PRICE: &[(&str, f64)] = &[
    ("Small", 32.00),
    ("Medium", 55.00),
    ("Large", 78.00),
    ("Extra Large", 92.00),
];

/// Price multiplier per category.
pub const CATEGORY_PRICE_MULTIPLIER: &[(&str, f64)] = &[
    ("general_purpose", 1.1),
    ("premium", 1.5),
    ("eco_friendly", 1.2),
    ("heavy_duty", 1.3),
    ("gift_decorative", 1.4),
    ("flatpack_stackable", 1.15),
];

/// Round a price to 2 decimal places.
pub fn round_price(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn lookup(table: &[(&str, f64)], key: &str) -> f64 {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(1.0)
}

/// Price for a size label within a category.
pub fn product_price(category: &str, size_label: &str) -> f64 {
    let base = lookup(SIZE_BASE_PRICE, size_label);
    let multiplier = lookup(CATEGORY_PRICE_MULTIPLIER, category);
    round_price(base * multiplier)
}

/// Enumerate the full catalogue cross product, assigning sequential
/// zero-padded ids starting at "00000001".
pub fn build_products() -> Vec<Product> {
    let mut products = Vec::with_capacity(BOX_CATALOGUE.len() * 5 * BOX_SIZES.len());
    let mut product_id = 1u64;

    for (category, names) in BOX_CATALOGUE {
        for name in names.iter() {
            for (size_label, width, length, height) in BOX_SIZES {
                products.push(Product {
                    product_id: format_id(product_id),
                    product_category: (*category).to_string(),
                    product_name: (*name).to_string(),
                    product_size_label: (*size_label).to_string(),
                    product_width_cm: *width,
                    product_length_cm: *length,
                    product_height_cm: *height,
                    product_price: product_price(category, size_label),
                    product_created_date: DATASET_EPOCH,
                    product_updated_date: None,
                });
                product_id += 1;
            }
        }
    }

    products
}
