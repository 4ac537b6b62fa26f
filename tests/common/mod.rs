use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use webtrail::config::Config;
use webtrail::session::{TimelineEvent, TIMELINE_FILE};

#[allow(dead_code)]
pub fn temp_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("webtrail.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.session.output_dir = dir.join("sessions");
    config.session.trace_stop_timeout_secs = 1;
    config
}

#[allow(dead_code)]
pub fn read_timeline(folder: &Path) -> Vec<TimelineEvent> {
    let contents = fs::read_to_string(folder.join(TIMELINE_FILE)).expect("timeline.json missing");
    serde_json::from_str(&contents).expect("timeline.json is not a timeline")
}

#[allow(dead_code)]
pub fn session_folders(output_dir: &Path) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = fs::read_dir(output_dir)
        .expect("output dir missing")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    folders.sort();
    folders
}

#[allow(dead_code)]
pub const LONG_TASK_TRACE: &str = r#"{"traceEvents": [
    {"name": "RunTask", "ph": "X", "dur": 120000},
    {"name": "EvaluateScript", "ph": "X", "dur": 25000, "args": {"data": {"url": "https://app.example/bundle.js"}}},
    {"name": "Paint", "ph": "X", "dur": 2000}
]}"#;

#[allow(dead_code)]
pub const FEED: &str = concat!(
    r##"{"kind":"click","x":12,"y":34,"selector":"#checkout","tag":"BUTTON"}"##,
    "\n",
    r#"{"kind":"network","url":"https://www.google-analytics.com/collect","status":200,"resource_type":"xhr"}"#,
    "\n",
    r#"{"kind":"network","url":"https://app.example/api/pay","method":"POST","status":402,"resource_type":"fetch","content_type":"application/json","body":"{\"reason\":\"card declined\",\"auth_token\":\"abc\"}"}"#,
    "\n",
    r#"{"kind":"console","level":"error","text":"Payment failed","source":"app.js:10"}"#,
    "\n"
);
