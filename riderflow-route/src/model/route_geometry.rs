use super::{RouteError, RouteShape};
use geo::Geometry;
use geojson::{Feature, GeoJson};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// name given to shapes whose source did not declare a variant
pub const DEFAULT_VARIANT_NAME: &str = "default";

/// one named version of a route's geometry, e.g. a short-turn or a detour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryVariant {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    pub shapes: Vec<RouteShape>,
}

/// all geometry variants supplied for a single route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub route_id: String,
    pub variants: Vec<GeometryVariant>,
}

impl RouteGeometry {
    /// wraps a single unnamed collection of shapes as the default variant.
    pub fn single(route_id: &str, shapes: Vec<RouteShape>) -> RouteGeometry {
        RouteGeometry {
            route_id: route_id.to_string(),
            variants: vec![GeometryVariant {
                name: DEFAULT_VARIANT_NAME.to_string(),
                is_default: true,
                shapes,
            }],
        }
    }

    /// selects the designated default variant. the first variant flagged as
    /// default wins; otherwise a lone variant, then one named "default", then
    /// the first variant by name. all other variants are treated as alternates.
    pub fn default_variant(&self) -> Result<&GeometryVariant, RouteError> {
        let selected = self
            .variants
            .iter()
            .find(|v| v.is_default)
            .or_else(|| match self.variants.as_slice() {
                [only] => Some(only),
                _ => None,
            })
            .or_else(|| {
                self.variants
                    .iter()
                    .find(|v| v.name == DEFAULT_VARIANT_NAME)
            })
            .or_else(|| self.variants.iter().min_by(|a, b| a.name.cmp(&b.name)))
            .ok_or_else(|| RouteError::MissingVariant(self.route_id.clone()))?;

        let alternates = self
            .variants
            .iter()
            .filter(|v| v.name != selected.name)
            .map(|v| v.name.as_str())
            .collect_vec();
        if !alternates.is_empty() {
            log::debug!(
                "route '{}' using variant '{}', alternates: [{}]",
                self.route_id,
                selected.name,
                alternates.join(", ")
            );
        }
        Ok(selected)
    }

    /// reads a GeoJSON file of LineString/MultiLineString features for a route.
    pub fn from_geojson_file(route_id: &str, filepath: &str) -> Result<RouteGeometry, RouteError> {
        let contents = std::fs::read_to_string(filepath).map_err(|e| {
            RouteError::GeoJsonError(format!("unable to read file {filepath}: {e}"))
        })?;
        RouteGeometry::from_geojson_str(route_id, &contents)
    }

    /// builds route geometry from GeoJSON text. features are grouped into
    /// variants using the optional properties
    ///
    /// * `route_id`    - features for other routes are skipped
    /// * `variant`     - variant name, defaults to "default"
    /// * `is_default`  - marks the designated default variant
    /// * `shape_name`  - name attached to each shape
    /// * `shape_order` - ordering annotation attached to each shape
    ///
    /// each part of a MultiLineString becomes its own shape.
    pub fn from_geojson_str(route_id: &str, geojson: &str) -> Result<RouteGeometry, RouteError> {
        let parsed = geojson
            .parse::<GeoJson>()
            .map_err(|e| RouteError::GeoJsonError(e.to_string()))?;
        let features: Vec<Feature> = match parsed {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => {
                return Err(RouteError::GeoJsonError(String::from(
                    "expected a Feature or FeatureCollection, found a bare Geometry",
                )))
            }
        };

        let mut variants: BTreeMap<String, GeometryVariant> = BTreeMap::new();
        for feature in features.into_iter() {
            if let Some(feature_route_id) = string_property(&feature, "route_id") {
                if feature_route_id != route_id {
                    continue;
                }
            }
            let variant_name = string_property(&feature, "variant")
                .unwrap_or_else(|| DEFAULT_VARIANT_NAME.to_string());
            let is_default = feature
                .property("is_default")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let shape_name = string_property(&feature, "shape_name");
            let shape_order = feature
                .property("shape_order")
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok());

            let geojson_geometry = match feature.geometry {
                Some(g) => g,
                None => continue,
            };
            let geometry: Geometry<f64> = Geometry::try_from(geojson_geometry)
                .map_err(|e| RouteError::GeoJsonError(e.to_string()))?;
            let lines = match geometry {
                Geometry::LineString(l) => vec![l],
                Geometry::MultiLineString(mls) => mls.0,
                _ => {
                    log::warn!("route '{route_id}' skipping feature with non-linear geometry");
                    continue;
                }
            };

            let entry = variants
                .entry(variant_name.clone())
                .or_insert_with(|| GeometryVariant {
                    name: variant_name,
                    is_default: false,
                    shapes: vec![],
                });
            entry.is_default |= is_default;
            for line in lines.into_iter() {
                entry.shapes.push(RouteShape {
                    name: shape_name.clone(),
                    order: shape_order,
                    line,
                });
            }
        }

        if variants.is_empty() {
            return Err(RouteError::MissingVariant(route_id.to_string()));
        }
        Ok(RouteGeometry {
            route_id: route_id.to_string(),
            variants: variants.into_values().collect_vec(),
        })
    }
}

/// reads a property as a string, accepting numbers for identifier-like fields.
fn string_property(feature: &Feature, key: &str) -> Option<String> {
    feature.property(key).and_then(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
