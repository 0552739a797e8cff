use serde::{Deserialize, Serialize};

/// Changes requested for an existing app.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredLrpUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<u32>,
    /// Opaque platform marker; recorded as the app's "last updated" value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDesiredLrpRequest {
    pub process_guid: String,
    #[serde(default)]
    pub update: DesiredLrpUpdate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_instances() {
        let body = r#"{"process_guid": "myguid", "update": {"instances": 5}}"#;
        let req: UpdateDesiredLrpRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.process_guid, "myguid");
        assert_eq!(req.update.instances, Some(5));
        assert_eq!(req.update.annotation, None);
    }
}
