//! Catalog layer - the weighted stock variants facilities rotate through

pub mod variant;

pub use variant::{SelectionContext, StockVariant, VariantCatalog, WeightCurve};
