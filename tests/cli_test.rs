use std::fs;
use std::process::Command;

fn atlona_ctl(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_atlona-ctl"));
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("ATLONA_LOG");
    cmd
}

#[test]
fn test_unknown_option_exits_with_one() {
    let home = tempfile::tempdir().unwrap();
    let status = atlona_ctl(&home).arg("--frobnicate").status().unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
#[cfg(target_os = "linux")]
fn test_broken_config_does_not_block_direct_address() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join("config").join("atlona");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[http\ntimeout_secs = ").unwrap();

    // The URL cannot be built, which the amp driver treats as a no-op
    let direct = atlona_ctl(&home)
        .args(["amp", "bad host", "set-mute", "on"])
        .output()
        .unwrap();
    assert_eq!(direct.status.code(), Some(0));

    let named = atlona_ctl(&home)
        .args(["device", "lectern", "state"])
        .output()
        .unwrap();
    assert_eq!(named.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&named.stderr).contains("parsing config file"));
}
