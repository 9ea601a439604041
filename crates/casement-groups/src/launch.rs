//! Typed window creation templates.

use serde::{Deserialize, Serialize};

/// How a window is (re)created on the host. Each creation kind carries
/// only the fields that kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LaunchSpec {
    /// An application started from its manifest.
    Manifest { app_id: String, manifest_url: String },
    /// A child window opened by a running application.
    Programmatic {
        app_id: String,
        name: String,
        url: String,
        #[serde(default = "default_auto_show")]
        auto_show: bool,
    },
    /// The proxy window that stands in for a tab group.
    Tabstrip { url: String },
}

fn default_auto_show() -> bool {
    true
}

/// App id reported for tabstrip proxies.
pub const TABSTRIP_APP_ID: &str = "tabstrip";

impl LaunchSpec {
    pub fn app_id(&self) -> &str {
        match self {
            LaunchSpec::Manifest { app_id, .. } | LaunchSpec::Programmatic { app_id, .. } => {
                app_id
            }
            LaunchSpec::Tabstrip { .. } => TABSTRIP_APP_ID,
        }
    }

    pub fn is_tabstrip(&self) -> bool {
        matches!(self, LaunchSpec::Tabstrip { .. })
    }

    /// Check that every required field is present.
    pub fn validate(&self) -> Result<(), String> {
        let missing = match self {
            LaunchSpec::Manifest {
                app_id,
                manifest_url,
            } => first_empty(&[("appId", app_id), ("manifestUrl", manifest_url)]),
            LaunchSpec::Programmatic {
                app_id, name, url, ..
            } => first_empty(&[("appId", app_id), ("name", name), ("url", url)]),
            LaunchSpec::Tabstrip { url } => first_empty(&[("url", url)]),
        };
        match missing {
            Some(field) => Err(format!("launch spec field `{field}` is empty")),
            None => Ok(()),
        }
    }
}

fn first_empty<'a>(fields: &[(&'a str, &String)]) -> Option<&'a str> {
    fields
        .iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_wire_shape() {
        let spec = LaunchSpec::Manifest {
            app_id: "charts".into(),
            manifest_url: "http://localhost/app.json".into(),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "manifest");
        assert_eq!(json["appId"], "charts");
        assert_eq!(json["manifestUrl"], "http://localhost/app.json");
    }

    #[test]
    fn programmatic_auto_show_defaults_true() {
        let json = r#"{"kind":"programmatic","appId":"a","name":"child","url":"http://x"}"#;
        let spec: LaunchSpec = serde_json::from_str(json).unwrap();
        assert!(matches!(spec, LaunchSpec::Programmatic { auto_show: true, .. }));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let json = r#"{"kind":"bag","anything":1}"#;
        assert!(serde_json::from_str::<LaunchSpec>(json).is_err());
    }

    #[test]
    fn validate_reports_empty_field() {
        let spec = LaunchSpec::Programmatic {
            app_id: "a".into(),
            name: " ".into(),
            url: "http://x".into(),
            auto_show: true,
        };
        let err = spec.validate().unwrap_err();
        assert!(err.contains("`name`"));
    }

    #[test]
    fn tabstrip_app_id() {
        let spec = LaunchSpec::Tabstrip {
            url: "http://strip".into(),
        };
        assert_eq!(spec.app_id(), TABSTRIP_APP_ID);
        assert!(spec.is_tabstrip());
        assert!(spec.validate().is_ok());
    }
}
