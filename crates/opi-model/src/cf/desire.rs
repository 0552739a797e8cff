use serde::{Deserialize, Serialize};

/// A single `name=value` pair as sent by the platform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Request to desire one app.
///
/// Either `docker_image_url` is set, or the image is resolved from `droplet_hash`
/// through the staging round trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesireLrpRequest {
    pub process_guid: String,
    #[serde(default, rename = "docker_image")]
    pub docker_image_url: String,
    #[serde(default)]
    pub droplet_hash: String,
    #[serde(default)]
    pub start_command: String,
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub num_instances: u32,
    #[serde(default)]
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_platform_body() {
        let body = r#"{"process_guid" : "myguid", "start_command": "./start", "environment": [ { "name": "env_var", "value": "env_var_value" } ], "num_instances": 5}"#;
        let req: DesireLrpRequest = serde_json::from_str(body).unwrap();

        assert_eq!(req.process_guid, "myguid");
        assert_eq!(req.start_command, "./start");
        assert_eq!(
            req.environment,
            vec![EnvironmentVariable::new("env_var", "env_var_value")]
        );
        assert_eq!(req.num_instances, 5);
        assert!(req.docker_image_url.is_empty());
    }

    #[test]
    fn negative_instances_are_rejected() {
        let body = r#"{"process_guid":"g","num_instances":-1}"#;
        assert!(serde_json::from_str::<DesireLrpRequest>(body).is_err());
    }
}
