use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use surfview_common::Mesh;

use crate::error::BridgeError;

/// Calls understood by a viewer module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `{"containerId": "..."}` -> `bool`
    Init,
    /// array of points -> `null`
    DisplayPoints,
    /// mesh object -> `null`
    DisplayMesh,
    ClearScene,
    Dispose,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Init,
        Method::DisplayPoints,
        Method::DisplayMesh,
        Method::ClearScene,
        Method::Dispose,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Init => "init",
            Method::DisplayPoints => "displayPoints",
            Method::DisplayMesh => "displayMesh",
            Method::ClearScene => "clearScene",
            Method::Dispose => "dispose",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownMethod(s.to_string()))
    }
}

/// Argument of [`Method::Init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitArgs {
    pub container_id: String,
}

/// Decode a mesh in the bridge/file format:
/// `{"vertices": [{"x":..,"y":..,"z":..}], "faces": [{"a":..,"b":..,"c":..}]}`.
///
/// Negative or oversized face indices fail here; range against the vertex
/// count is checked later when buffers are built.
pub fn mesh_from_json(json: &str) -> Result<Mesh, BridgeError> {
    Ok(serde_json::from_str(json)?)
}

pub fn mesh_to_json(mesh: &Mesh) -> Result<String, BridgeError> {
    Ok(serde_json::to_string_pretty(mesh)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use surfview_common::{Face, Point3, PointCloud};

    #[test]
    fn method_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
        assert!(matches!(
            "initThreeJS".parse::<Method>(),
            Err(BridgeError::UnknownMethod(name)) if name == "initThreeJS"
        ));
    }

    #[test]
    fn init_args_use_camel_case() {
        let args = InitArgs {
            container_id: "viewer".into(),
        };
        assert_eq!(serde_json::to_value(&args).unwrap(), json!({"containerId": "viewer"}));
    }

    #[test]
    fn mesh_payload_uses_named_fields() {
        let mesh = Mesh::new(
            vec![Point3::new(0.0, 1.0, 2.0)],
            vec![Face::new(0, 0, 0)],
        );
        let value = serde_json::to_value(&mesh).unwrap();
        assert_eq!(
            value,
            json!({
                "vertices": [{"x": 0.0, "y": 1.0, "z": 2.0}],
                "faces": [{"a": 0, "b": 0, "c": 0}]
            })
        );
    }

    #[test]
    fn points_payload_is_a_bare_array() {
        let cloud = PointCloud::new(vec![Point3::new(1.0, 2.0, 3.0)]);
        assert_eq!(
            serde_json::to_value(&cloud).unwrap(),
            json!([{"x": 1.0, "y": 2.0, "z": 3.0}])
        );
    }

    #[test]
    fn negative_index_fails_to_decode() {
        let json = r#"{"vertices": [], "faces": [{"a": -1, "b": 0, "c": 0}]}"#;
        assert!(matches!(mesh_from_json(json), Err(BridgeError::Json(_))));
    }

    #[test]
    fn mesh_file_text_decodes() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Face::new(0, 1, 2)],
        );
        let text = mesh_to_json(&mesh).unwrap();
        assert_eq!(mesh_from_json(&text).unwrap(), mesh);
    }
}
