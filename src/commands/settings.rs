use crate::commands::db::data_dir;
use crate::commands::notify::DEFAULT_LOGIN_URL;
use crate::filters::params::{parse, ChangelogSort, FeedbackSort};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 1;

const FEEDBACK_SORTS: &[&str] = &["votes-desc", "votes-asc", "date-desc", "date-asc"];
const CHANGELOG_SORTS: &[&str] = &["date-desc", "date-asc", "type"];

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub login_latency: Duration,
    pub welcome_email_delay: Duration,
    pub welcome_emails_enabled: bool,
    pub login_url: String,
    pub default_feedback_sort: FeedbackSort,
    pub default_roadmap_sort: FeedbackSort,
    pub default_changelog_sort: ChangelogSort,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self::from_value(&default_settings())
    }
}

impl EffectiveSettings {
    fn from_value(settings: &Value) -> Self {
        let millis = |key: &str, default: u64| {
            Duration::from_millis(settings.get(key).and_then(Value::as_u64).unwrap_or(default))
        };
        let text = |key: &str, default: &str| {
            settings
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(default)
                .to_string()
        };

        Self {
            login_latency: millis("loginLatencyMs", 500),
            welcome_email_delay: millis("welcomeEmailDelayMs", 1000),
            welcome_emails_enabled: settings
                .get("welcomeEmailsEnabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            login_url: text("loginUrl", DEFAULT_LOGIN_URL),
            default_feedback_sort: parse(&text("defaultFeedbackSort", "votes-desc")),
            default_roadmap_sort: parse(&text("defaultRoadmapSort", "votes-desc")),
            default_changelog_sort: parse(&text("defaultChangelogSort", "date-desc")),
        }
    }
}

pub async fn get_settings(workspace_path: String) -> Result<Value, String> {
    load_settings_from_disk(&workspace_path)
}

pub async fn save_settings(workspace_path: String, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(&workspace_path, settings)
}

pub fn load_effective_settings(workspace_path: &str) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(workspace_path)?;
    Ok(EffectiveSettings::from_value(&settings))
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_data_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON, using defaults: {e}");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_data_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("Saved settings to {}", path.display());
    Ok(migrated)
}

fn settings_path(workspace_path: &str) -> PathBuf {
    data_dir(workspace_path).join("settings.json")
}

fn ensure_data_dir(workspace_path: &str) -> Result<(), String> {
    let dir = data_dir(workspace_path);
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create {}: {e}", dir.display()))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if version > SETTINGS_SCHEMA_VERSION {
        log::warn!("settings.json schema version {version} is newer than {SETTINGS_SCHEMA_VERSION}");
    }

    fill_missing_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "loginLatencyMs": 500,
        "welcomeEmailDelayMs": 1000,
        "welcomeEmailsEnabled": true,
        "loginUrl": DEFAULT_LOGIN_URL,
        "defaultFeedbackSort": "votes-desc",
        "defaultRoadmapSort": "votes-desc",
        "defaultChangelogSort": "date-desc"
    })
}

/// Fill in every top-level key the file does not set. Settings are flat.
fn fill_missing_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        target_obj
            .entry(key.clone())
            .or_insert_with(|| default_value.clone());
    }
}

/// Overwrite `target` with every key `incoming` sets; other keys are kept.
fn merge_settings(target: &mut Value, incoming: &Value) {
    let (Some(target_obj), Some(incoming_obj)) = (target.as_object_mut(), incoming.as_object()) else {
        return;
    };
    for (key, value) in incoming_obj {
        target_obj.insert(key.clone(), value.clone());
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "loginLatencyMs", 0, 5_000, 500);
    clamp_u64(obj, "welcomeEmailDelayMs", 0, 10_000, 1000);

    sanitize_enum(obj, "defaultFeedbackSort", FEEDBACK_SORTS, "votes-desc");
    sanitize_enum(obj, "defaultRoadmapSort", FEEDBACK_SORTS, "votes-desc");
    sanitize_enum(obj, "defaultChangelogSort", CHANGELOG_SORTS, "date-desc");

    ensure_bool(obj, "welcomeEmailsEnabled", true);

    let login_url = obj
        .get("loginUrl")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_LOGIN_URL)
        .to_string();
    obj.insert("loginUrl".to_string(), json!(login_url));
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}
