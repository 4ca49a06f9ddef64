use std::path::Path;

use stubgen::config::*;
use tempfile::TempDir;

#[test]
fn test_default_config_has_groovy_patterns() {
    let config = StubConfig::default();
    assert!(config.include.iter().any(|p| p == "**/*.groovy"));
    assert_eq!(config.source_dirs, vec!["src/main/groovy".to_string()]);
    assert_eq!(config.output_extension, "java");
    assert!(config.default_imports);
    assert!(!config.strict);
}

#[test]
fn test_load_missing_config_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = load_config(dir.path()).unwrap();
    assert_eq!(loaded, StubConfig::default());
}

#[test]
fn test_save_and_load_config() {
    let dir = TempDir::new().unwrap();
    let config = StubConfig {
        output_dir: "out/stubs".to_string(),
        strict: true,
        ..StubConfig::default()
    };
    save_config(dir.path(), &config).unwrap();
    assert!(get_config_path(dir.path()).exists());
    assert!(!get_config_path(dir.path()).with_extension("tmp").exists());

    let loaded = load_config(dir.path()).unwrap();
    assert_eq!(config, loaded);
}

#[test]
fn test_partial_config_fills_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(get_stubgen_dir(dir.path())).unwrap();
    std::fs::write(
        get_config_path(dir.path()),
        r#"{ "output_dir": "gen", "verify_output": true }"#,
    )
    .unwrap();

    let loaded = load_config(dir.path()).unwrap();
    assert_eq!(loaded.output_dir, "gen");
    assert!(loaded.verify_output);
    assert_eq!(loaded.include, StubConfig::default().include);
}

#[test]
fn test_malformed_config_is_config_error() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(get_stubgen_dir(dir.path())).unwrap();
    std::fs::write(get_config_path(dir.path()), "{ not json").unwrap();

    let err = load_config(dir.path()).unwrap_err();
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
fn test_should_include_file() {
    let config = StubConfig::default();
    assert!(should_include_file("com/acme/Counter.groovy", &config));
    assert!(should_include_file("com/acme/build.gsh", &config));
    assert!(!should_include_file("com/acme/Counter.java", &config));
    assert!(!should_include_file("com/.hidden/Secret.groovy", &config));
}

#[test]
fn test_exclude_wins_over_include() {
    let config = StubConfig {
        exclude: vec!["**/internal/**".to_string()],
        ..StubConfig::default()
    };
    assert!(!should_include_file("com/acme/internal/Impl.groovy", &config));
    assert!(should_include_file("com/acme/Api.groovy", &config));
}

#[test]
fn test_output_path_resolution() {
    let root = Path::new("/project");
    let config = StubConfig::default();
    assert_eq!(
        config.output_path(root),
        root.join("target/generated-sources/groovy-stubs")
    );

    let absolute = StubConfig {
        output_dir: "/tmp/stubs".to_string(),
        ..StubConfig::default()
    };
    assert_eq!(absolute.output_path(root), Path::new("/tmp/stubs"));
}

#[test]
fn test_stubgen_dir_name() {
    let dir = TempDir::new().unwrap();
    assert!(get_stubgen_dir(dir.path()).ends_with(".stubgen"));
}
