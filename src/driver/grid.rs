use super::SessionStatus;
use crate::config::{EnvironmentSpec, GridConfig, GridProvider};
use serde_json::{Map, Value, json};

/// W3C capabilities for one grid environment
pub fn capabilities(grid: &GridConfig, env: &EnvironmentSpec) -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert("browserName".into(), json!(env.browser_name));
    if let Some(version) = &env.browser_version {
        caps.insert("browserVersion".into(), json!(version));
    }

    let session_name = format!("opinion digest - {}", env.label());
    let mut options = Map::new();
    match grid.provider {
        GridProvider::BrowserStack => {
            insert_opt(&mut options, "userName", grid.username.as_deref());
            insert_opt(&mut options, "accessKey", grid.access_key.as_deref());
            insert_opt(&mut options, "os", env.os.as_deref());
            insert_opt(&mut options, "osVersion", env.os_version.as_deref());
            insert_opt(&mut options, "deviceName", env.device_name.as_deref());
            insert_opt(&mut options, "buildName", grid.build_name.as_deref());
            insert_opt(&mut options, "projectName", grid.project_name.as_deref());
            if env.real_mobile {
                options.insert("realMobile".into(), json!("true"));
            }
            options.insert("sessionName".into(), json!(session_name));
            caps.insert("bstack:options".into(), Value::Object(options));
        }
        GridProvider::LambdaTest => {
            insert_opt(&mut options, "username", grid.username.as_deref());
            insert_opt(&mut options, "accessKey", grid.access_key.as_deref());
            let platform = match (&env.os, &env.os_version) {
                (Some(os), Some(version)) => Some(format!("{} {}", os, version)),
                (Some(os), None) => Some(os.clone()),
                _ => None,
            };
            insert_opt(&mut options, "platformName", platform.as_deref());
            insert_opt(&mut options, "deviceName", env.device_name.as_deref());
            insert_opt(&mut options, "build", grid.build_name.as_deref());
            insert_opt(&mut options, "project", grid.project_name.as_deref());
            if env.real_mobile {
                options.insert("isRealMobile".into(), json!(true));
            }
            options.insert("name".into(), json!(session_name));
            options.insert("w3c".into(), json!(true));
            caps.insert("LT:Options".into(), Value::Object(options));
        }
    }
    caps
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        map.insert(key.to_string(), json!(v));
    }
}

/// Script that records a session's result on the grid
pub fn status_script(provider: GridProvider, status: SessionStatus, reason: &str) -> String {
    match provider {
        GridProvider::BrowserStack => {
            let payload = json!({
                "action": "setSessionStatus",
                "arguments": {"status": status.as_str(), "reason": reason},
            });
            format!("browserstack_executor: {}", payload)
        }
        GridProvider::LambdaTest => format!("lambda-status={}", status.as_str()),
    }
}

/// Capabilities for a local session
pub fn local_capabilities(headless: bool) -> Map<String, Value> {
    let mut caps = Map::new();
    if headless {
        caps.insert(
            "goog:chromeOptions".into(),
            json!({"args": ["--headless=new", "--disable-gpu", "--no-sandbox"]}),
        );
    }
    caps
}
