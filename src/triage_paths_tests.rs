use super::*;
use serial_test::serial;

struct HomeGuard(Option<std::ffi::OsString>);

impl HomeGuard {
    fn set(value: &Path) -> Self {
        let previous = std::env::var_os(TRIAGE_HOME_ENV);
        std::env::set_var(TRIAGE_HOME_ENV, value);
        Self(previous)
    }
}

impl Drop for HomeGuard {
    fn drop(&mut self) {
        match self.0.take() {
            Some(value) => std::env::set_var(TRIAGE_HOME_ENV, value),
            None => std::env::remove_var(TRIAGE_HOME_ENV),
        }
    }
}

#[test]
#[serial]
fn test_env_override_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("triage-home");
    let _guard = HomeGuard::set(&root);

    let paths = TriagePaths::resolve(None).unwrap();
    assert_eq!(paths.root(), root.as_path());
    assert!(root.is_dir());
}

#[test]
#[serial]
fn test_configured_dir_wins_over_env() {
    let env_dir = tempfile::tempdir().unwrap();
    let configured = tempfile::tempdir().unwrap();
    let _guard = HomeGuard::set(env_dir.path());

    let paths = TriagePaths::resolve(Some(configured.path())).unwrap();
    assert_eq!(paths.root(), configured.path());
}

#[test]
#[serial]
fn test_default_is_under_home() {
    if dirs::home_dir().is_none() {
        return;
    }
    let previous = std::env::var_os(TRIAGE_HOME_ENV);
    std::env::remove_var(TRIAGE_HOME_ENV);

    let resolved = TriagePaths::resolve(None);

    if let Some(value) = previous {
        std::env::set_var(TRIAGE_HOME_ENV, value);
    }
    let paths = resolved.unwrap();
    assert!(paths.root().ends_with(".appointment-triage"));
}

#[test]
fn test_layout_creates_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    let paths = TriagePaths::resolve(Some(dir.path())).unwrap();

    let appointments = paths.appointments_dir().unwrap();
    let pending = paths.pending_dir().unwrap();
    let log = paths.structured_log_path().unwrap();

    assert!(appointments.is_dir());
    assert!(pending.is_dir());
    assert!(log.parent().unwrap().is_dir());
    assert!(log.ends_with("logs/triage.jsonl"));
    assert_eq!(paths.event_log_path(), dir.path().join("events.jsonl"));
}
