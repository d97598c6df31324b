// Reading the regions of the map from a TopoJSON (or GeoJSON) document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use crate::maps::*;

pub fn read_topology(path: &str, object_name: &str) -> BMapResult<Vec<RegionFeature>> {
    let contents = io_common::read_text(path)?;
    let features = parse_topology(&contents, object_name).map_err(|e| {
        warn!("read_topology: could not read {:?}: {}", path, e);
        e
    })?;
    info!(
        "read_topology: {} regions in object {:?} of {:?}",
        features.len(),
        object_name,
        io_common::simplify_file_name(path)
    );
    Ok(features)
}

/// Reads the regions of a document.
///
/// For a topology, the regions are the geometries of the object `object_name`.
/// A GeoJSON feature collection is also accepted, in which case all its
/// features are regions and `object_name` is not used.
pub fn parse_topology(contents: &str, object_name: &str) -> BMapResult<Vec<RegionFeature>> {
    let doc: JSValue = serde_json::from_str(contents).context(ParsingJsonSnafu {
        path: "topology document",
    })?;
    let kind = doc.get("type").and_then(|t| t.as_str()).unwrap_or("").to_string();
    match kind.as_str() {
        "Topology" => {
            let topo: Topology = serde_json::from_value(doc).context(ParsingJsonSnafu {
                path: "topology document",
            })?;
            let object = match topo.objects.get(object_name) {
                Some(o) => o,
                None => {
                    let available: Vec<&str> = topo.objects.keys().map(|k| k.as_str()).collect();
                    return Err(Box::new(MapRunError::MissingTopologyObject {
                        name: object_name.to_string(),
                        available: available.join(", "),
                    }));
                }
            };
            debug!(
                "parse_topology: object {:?} of type {:?}",
                object_name, object.kind
            );
            Ok(object.geometries.iter().map(|g| g.to_feature()).collect())
        }
        "FeatureCollection" => {
            let fc: FeatureCollection = serde_json::from_value(doc).context(ParsingJsonSnafu {
                path: "topology document",
            })?;
            Ok(fc.features.iter().map(|g| g.to_feature()).collect())
        }
        x => Err(Box::new(MapRunError::UnknownDocument {
            kind: x.to_string(),
        })),
    }
}

fn read_feature_id(id: &Option<JSValue>) -> Option<FeatureId> {
    match id {
        Some(JSValue::Number(n)) => n.as_u64().map(FeatureId::Number),
        Some(JSValue::String(s)) if !s.trim().is_empty() => Some(FeatureId::Text(s.trim().to_string())),
        _ => None,
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Properties {
    name: Option<String>,
}

/// A geometry of a topology object, or a GeoJSON feature. Only the identifier
/// and the name are read: the arcs are left to the renderer.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Geometry {
    #[serde(default)]
    id: Option<JSValue>,
    #[serde(default)]
    properties: Option<Properties>,
}

impl Geometry {
    fn to_feature(&self) -> RegionFeature {
        RegionFeature {
            id: read_feature_id(&self.id),
            name: self.properties.as_ref().and_then(|p| p.name.clone()),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct TopologyObject {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    geometries: Vec<Geometry>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct Topology {
    objects: BTreeMap<String, TopologyObject>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
struct FeatureCollection {
    features: Vec<Geometry>,
}
