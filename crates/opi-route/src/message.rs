use serde::{Deserialize, Serialize};

/// Registration of one app's routes with the platform router.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMessage {
    /// Address the router forwards to.
    pub host: String,
    pub port: u16,
    pub uris: Vec<String>,
    /// Platform app name.
    pub app: String,
    pub private_instance_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let msg = RegistryMessage {
            host: "cf-dora.opi.svc.cluster.local".into(),
            port: 8080,
            uris: vec!["dora.example.com".into()],
            app: "dora".into(),
            private_instance_id: "guid-1".into(),
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "host": "cf-dora.opi.svc.cluster.local",
                "port": 8080,
                "uris": ["dora.example.com"],
                "app": "dora",
                "private_instance_id": "guid-1",
            })
        );
    }
}
