//! Stock variants - what a facility can offer after a rotation
//!
//! Each variant carries a base weight and a curve that scales it with the
//! size of the settlement the facility serves.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RotationError};
use crate::rotation::selector::Variant;

/// Context a stock variant is weighted against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionContext {
    /// Population of the settlement the facility serves
    pub population: f64,
}

impl SelectionContext {
    pub fn new(population: f64) -> Self {
        Self { population }
    }
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// How a variant's weight scales with population
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightCurve {
    Flat,
    /// Grows with every resident
    Linear { per_capita: f64 },
    /// Only offered once the settlement is big enough
    Threshold { min_population: f64 },
    /// S-curve centred on `midpoint`
    Logistic { midpoint: f64, steepness: f64 },
}

impl WeightCurve {
    pub fn apply(&self, base_weight: f64, population: f64) -> f64 {
        match *self {
            WeightCurve::Flat => base_weight,
            WeightCurve::Linear { per_capita } => (base_weight + per_capita * population).max(0.0),
            WeightCurve::Threshold { min_population } => {
                if population >= min_population {
                    base_weight
                } else {
                    0.0
                }
            }
            WeightCurve::Logistic {
                midpoint,
                steepness,
            } => base_weight / (1.0 + (-steepness * (population - midpoint)).exp()),
        }
    }
}

impl Default for WeightCurve {
    fn default() -> Self {
        Self::Flat
    }
}

/// A stock assignment a facility can rotate into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockVariant {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Weight before population scaling
    pub base_weight: f64,
    pub curve: WeightCurve,
}

impl StockVariant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_weight,
            curve: WeightCurve::Flat,
        }
    }

    pub fn with_curve(mut self, curve: WeightCurve) -> Self {
        self.curve = curve;
        self
    }
}

impl Variant for StockVariant {
    type Context = SelectionContext;

    fn weight(&self, ctx: &SelectionContext) -> f64 {
        self.curve.apply(self.base_weight, ctx.population)
    }
}

/// Ordered list of variants a coordinator selects from
#[derive(Debug, Clone)]
pub struct VariantCatalog<V> {
    variants: Vec<V>,
}

impl<V> Default for VariantCatalog<V> {
    fn default() -> Self {
        Self {
            variants: Vec::new(),
        }
    }
}

impl<V> From<Vec<V>> for VariantCatalog<V> {
    fn from(variants: Vec<V>) -> Self {
        Self { variants }
    }
}

impl<V> VariantCatalog<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, variant: V) {
        self.variants.push(variant);
    }

    pub fn as_slice(&self) -> &[V] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.variants.iter()
    }
}

impl VariantCatalog<StockVariant> {
    /// Built-in general-store stock list
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(StockVariant::new("staples", "Staples", 10.0));
        catalog.add(
            StockVariant::new("tools", "Tools and Hardware", 2.0)
                .with_curve(WeightCurve::Linear { per_capita: 0.02 }),
        );
        catalog.add(
            StockVariant::new("textiles", "Textiles", 4.0).with_curve(WeightCurve::Logistic {
                midpoint: 150.0,
                steepness: 0.05,
            }),
        );
        catalog.add(
            StockVariant::new("curios", "Curios", 1.5).with_curve(WeightCurve::Threshold {
                min_population: 250.0,
            }),
        );

        catalog
    }

    /// Get a variant by ID
    pub fn get(&self, id: &str) -> Option<&StockVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// Load variants from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse variants from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let toml_data: TomlVariants = toml::from_str(content)?;

        let mut catalog = Self::new();
        for variant in toml_data.variants {
            catalog.add(variant.into_variant()?);
        }
        Ok(catalog)
    }
}

/// TOML representation of a variants file
#[derive(Debug, Deserialize)]
struct TomlVariants {
    #[serde(default)]
    variants: Vec<TomlVariant>,
}

/// TOML representation of a single variant
#[derive(Debug, Deserialize)]
struct TomlVariant {
    id: String,
    name: String,
    weight: f64,
    #[serde(default)]
    curve: Option<String>,
    per_capita: Option<f64>,
    min_population: Option<f64>,
    midpoint: Option<f64>,
    steepness: Option<f64>,
}

impl TomlVariant {
    fn into_variant(self) -> Result<StockVariant> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(RotationError::CatalogLoad(format!(
                "variant '{}' has invalid weight {}",
                self.id, self.weight
            )));
        }

        let curve_name = self.curve.as_deref().unwrap_or("flat").to_lowercase();
        let curve = match curve_name.as_str() {
            "flat" => WeightCurve::Flat,
            "linear" => WeightCurve::Linear {
                per_capita: self.require("per_capita", self.per_capita)?,
            },
            "threshold" => WeightCurve::Threshold {
                min_population: self.require("min_population", self.min_population)?,
            },
            "logistic" => WeightCurve::Logistic {
                midpoint: self.require("midpoint", self.midpoint)?,
                steepness: self.require("steepness", self.steepness)?,
            },
            _ => {
                return Err(RotationError::CatalogLoad(format!(
                    "variant '{}' has unknown curve '{}'",
                    self.id, curve_name
                )))
            }
        };

        Ok(StockVariant {
            id: self.id,
            name: self.name,
            base_weight: self.weight,
            curve,
        })
    }

    fn require(&self, field: &str, value: Option<f64>) -> Result<f64> {
        value.ok_or_else(|| {
            RotationError::CatalogLoad(format!("variant '{}' is missing '{}'", self.id, field))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_curve_ignores_population() {
        let v = StockVariant::new("staples", "Staples", 10.0);
        assert_eq!(v.weight(&SelectionContext::new(0.0)), 10.0);
        assert_eq!(v.weight(&SelectionContext::new(5000.0)), 10.0);
    }

    #[test]
    fn test_linear_curve_floors_at_zero() {
        let curve = WeightCurve::Linear { per_capita: -0.1 };
        assert!((curve.apply(2.0, 10.0) - 1.0).abs() < 1e-9);
        assert_eq!(curve.apply(2.0, 100.0), 0.0);
    }

    #[test]
    fn test_threshold_curve() {
        let curve = WeightCurve::Threshold {
            min_population: 250.0,
        };
        assert_eq!(curve.apply(1.5, 249.0), 0.0);
        assert_eq!(curve.apply(1.5, 250.0), 1.5);
    }

    #[test]
    fn test_logistic_curve_midpoint_is_half() {
        let curve = WeightCurve::Logistic {
            midpoint: 150.0,
            steepness: 0.05,
        };
        assert!((curve.apply(4.0, 150.0) - 2.0).abs() < 1e-9);
        assert!(curve.apply(4.0, 1000.0) > 3.9);
        assert!(curve.apply(4.0, 0.0) < 0.1);
    }

    #[test]
    fn test_catalog_defaults() {
        let catalog = VariantCatalog::with_defaults();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.get("staples").is_some());
        assert!(catalog.get("curios").is_some());
        assert!(catalog.get("nonexistent").is_none());
    }

    #[test]
    fn test_catalog_parse_toml() {
        let toml_content = r#"
[[variants]]
id = "bread"
name = "Fresh Bread"
weight = 5.0

[[variants]]
id = "lanterns"
name = "Lanterns"
weight = 2.0
curve = "Linear"
per_capita = 0.01

[[variants]]
id = "silks"
name = "Silks"
weight = 1.0
curve = "THRESHOLD"
min_population = 400.0
"#;

        let catalog = VariantCatalog::parse_toml(toml_content).expect("Failed to parse TOML");
        assert_eq!(catalog.len(), 3);

        let bread = catalog.get("bread").expect("Should have bread");
        assert_eq!(bread.curve, WeightCurve::Flat);
        assert_eq!(bread.base_weight, 5.0);

        let lanterns = catalog.get("lanterns").expect("Should have lanterns");
        assert_eq!(lanterns.curve, WeightCurve::Linear { per_capita: 0.01 });

        let silks = catalog.get("silks").expect("Should have silks");
        assert_eq!(
            silks.curve,
            WeightCurve::Threshold {
                min_population: 400.0
            }
        );
    }

    #[test]
    fn test_catalog_toml_unknown_curve() {
        let toml_content = r#"
[[variants]]
id = "odd"
name = "Odd"
weight = 1.0
curve = "Sawtooth"
"#;
        match VariantCatalog::parse_toml(toml_content) {
            Err(RotationError::CatalogLoad(msg)) => assert!(msg.contains("sawtooth")),
            other => panic!("Expected CatalogLoad error, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_catalog_toml_missing_curve_parameter() {
        let toml_content = r#"
[[variants]]
id = "odd"
name = "Odd"
weight = 1.0
curve = "logistic"
midpoint = 10.0
"#;
        match VariantCatalog::parse_toml(toml_content) {
            Err(RotationError::CatalogLoad(msg)) => assert!(msg.contains("steepness")),
            other => panic!("Expected CatalogLoad error, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_catalog_toml_negative_weight() {
        let toml_content = r#"
[[variants]]
id = "debt"
name = "Debt"
weight = -1.0
"#;
        assert!(matches!(
            VariantCatalog::parse_toml(toml_content),
            Err(RotationError::CatalogLoad(_))
        ));
    }

    #[test]
    fn test_empty_file_is_empty_catalog() {
        let catalog = VariantCatalog::parse_toml("").expect("Empty file should parse");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_variants_from_file() {
        let path = std::path::Path::new("data/stock_variants.toml");
        let catalog = VariantCatalog::load_from_toml(path)
            .expect("Should load variants from data/stock_variants.toml");

        assert!(catalog.get("staples").is_some());
        assert!(catalog.get("tools").is_some());
        assert!(catalog.get("curios").is_some());
        assert!(catalog.iter().all(|v| v.base_weight >= 0.0));
    }
}
