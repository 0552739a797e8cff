use serde::{Deserialize, Serialize};

use crate::{ENV_VCAP_APPLICATION, Env};

/// Application metadata embedded by the platform under `VCAP_APPLICATION`.
///
/// Only the fields the pipeline reads are modelled; unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcapApp {
    #[serde(rename = "application_name")]
    pub app_name: String,
    #[serde(rename = "application_id")]
    pub app_id: String,
    pub version: String,
    #[serde(rename = "application_uris")]
    pub app_uris: Vec<String>,
    pub space_name: String,
}

impl VcapApp {
    /// Parse the blob stored under `VCAP_APPLICATION` in `env`.
    ///
    /// An env without the key yields the default (empty) app.
    pub fn from_env(env: &Env) -> Result<Self, serde_json::Error> {
        match env.get(ENV_VCAP_APPLICATION) {
            Some(raw) => serde_json::from_str(raw),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_fields() {
        let mut env = Env::new();
        env.insert(
            ENV_VCAP_APPLICATION.into(),
            r#"{"application_name":"dora","application_id":"a1","application_uris":["dora.example.com"],"space_name":"dev","limits":{"mem":256}}"#.into(),
        );

        let app = VcapApp::from_env(&env).unwrap();
        assert_eq!(app.app_name, "dora");
        assert_eq!(app.app_id, "a1");
        assert_eq!(app.app_uris, vec!["dora.example.com".to_string()]);
        assert_eq!(app.space_name, "dev");
        assert!(app.version.is_empty());
    }

    #[test]
    fn missing_key_is_default() {
        assert_eq!(VcapApp::from_env(&Env::new()).unwrap(), VcapApp::default());
    }

    #[test]
    fn malformed_blob_is_an_error() {
        let mut env = Env::new();
        env.insert(ENV_VCAP_APPLICATION.into(), "{not json".into());
        assert!(VcapApp::from_env(&env).is_err());
    }
}
