use std::fs;
use std::path::{Path, PathBuf};

use stubgen::config::{save_config, StubConfig};
use stubgen::errors::StubError;
use stubgen::generator::StubGenerator;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "src/main/groovy/com/acme/Counter.groovy",
        "package com.acme\n\nclass Counter {\n  int count\n}\n",
    );
    write(
        root,
        "src/main/groovy/com/acme/Broken.groovy",
        "package com.acme\n\nclass Broken {\n  def (\n}\n",
    );
    write(
        root,
        "src/main/groovy/com/acme/shapes.groovy",
        "package com.acme\n\ninterface Shape { double area() }\n\nclass Square implements Shape {\n  double side\n  double area() { side * side }\n}\n",
    );
    write(root, "src/main/groovy/com/acme/Notes.txt", "not groovy\n");
    dir
}

#[test]
fn test_batch_continues_after_failure() {
    let dir = project();
    let root = dir.path();
    let sources = vec![
        root.join("src/main/groovy/com/acme/Counter.groovy"),
        root.join("src/main/groovy/com/acme/Broken.groovy"),
        root.join("src/main/groovy/com/acme/shapes.groovy"),
    ];

    let generator = StubGenerator::new(root, StubConfig::default());
    let report = generator.generate(&sources).unwrap();

    assert_eq!(report.source_count(), 3);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.stub_count(), 3);
    assert!(report.outcomes[0].is_ok());
    assert!(!report.outcomes[1].is_ok());
    assert!(report.outcomes[2].is_ok());

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.ends_with("Broken.groovy"));
    assert!(matches!(failures[0].1, StubError::Parse { .. }));
}

#[test]
fn test_output_mirrors_package_path() {
    let dir = project();
    let root = dir.path();
    let generator = StubGenerator::new(root, StubConfig::default());
    let paths = generator
        .generate_source(&root.join("src/main/groovy/com/acme/shapes.groovy"))
        .unwrap();

    let out = root.join("target/generated-sources/groovy-stubs/com/acme");
    assert_eq!(paths, vec![out.join("Shape.java"), out.join("Square.java")]);

    let square = fs::read_to_string(out.join("Square.java")).unwrap();
    assert!(square.contains("package com.acme;"));
    assert!(square.contains("public class Square\n"));
    assert!(square.contains("implements Shape, groovy.lang.GroovyObject"));
    assert!(square.contains("public double getSide() {"));
}

#[test]
fn test_generate_all_scans_source_dirs() {
    let dir = project();
    let root = dir.path();
    let generator = StubGenerator::new(root, StubConfig::default());

    let scanned = generator.scan_sources();
    let names: Vec<String> = scanned
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["Broken.groovy", "Counter.groovy", "shapes.groovy"]);

    let report = generator.generate_all().unwrap();
    assert_eq!(report.source_count(), 3);
    assert_eq!(report.failure_count(), 1);
    assert!(generator
        .output_dir()
        .join("com/acme/Counter.java")
        .exists());
    assert!(!generator.output_dir().join("com/acme/Broken.java").exists());
}

#[test]
fn test_open_uses_saved_config() {
    let dir = project();
    let root = dir.path();
    let config = StubConfig {
        output_dir: "stubs".to_string(),
        output_extension: "groovy.java".to_string(),
        exclude: vec!["**/Broken.groovy".to_string()],
        ..StubConfig::default()
    };
    save_config(root, &config).unwrap();

    let generator = StubGenerator::open(root).unwrap();
    let report = generator.generate_all().unwrap();
    assert_eq!(report.failure_count(), 0);
    assert!(root.join("stubs/com/acme/Counter.groovy.java").exists());
}

#[test]
fn test_output_dir_override() {
    let dir = project();
    let root = dir.path();
    let out = TempDir::new().unwrap();
    let generator =
        StubGenerator::new(root, StubConfig::default()).with_output_dir(out.path());
    let paths = generator
        .generate_source(&root.join("src/main/groovy/com/acme/Counter.groovy"))
        .unwrap();
    assert_eq!(paths, vec![out.path().join("com/acme/Counter.java")]);
}

#[test]
fn test_oversized_and_missing_sources_are_file_errors() {
    let dir = project();
    let root = dir.path();
    let config = StubConfig {
        max_file_size: 10,
        ..StubConfig::default()
    };
    let generator = StubGenerator::new(root, config);
    let err = generator
        .generate_source(&root.join("src/main/groovy/com/acme/Counter.groovy"))
        .unwrap_err();
    assert!(matches!(err, StubError::File { .. }));

    let err = generator
        .generate_source(&root.join("src/main/groovy/com/acme/Missing.groovy"))
        .unwrap_err();
    assert!(matches!(err, StubError::File { .. }));
}

#[test]
fn test_failed_write_removes_partial_output() {
    let dir = project();
    let root = dir.path();
    let out = root.join("out");
    // A directory where Square.java should go makes the second write fail.
    fs::create_dir_all(out.join("com/acme/Square.java")).unwrap();

    let generator = StubGenerator::new(root, StubConfig::default()).with_output_dir(&out);
    let err = generator
        .generate_source(&root.join("src/main/groovy/com/acme/shapes.groovy"))
        .unwrap_err();
    assert!(matches!(err, StubError::File { .. }));
    assert!(!out.join("com/acme/Shape.java").exists());
}

#[test]
fn test_verified_output() {
    let dir = project();
    let root = dir.path();
    let config = StubConfig {
        verify_output: true,
        ..StubConfig::default()
    };
    let generator = StubGenerator::new(root, config);
    let report = generator
        .generate(&[root.join("src/main/groovy/com/acme/shapes.groovy")])
        .unwrap();
    assert_eq!(report.failure_count(), 0);
    assert_eq!(report.stub_count(), 2);
}

#[test]
fn test_model_build_failure_is_recoverable() {
    let dir = project();
    let root = dir.path();
    let nested = write(
        root,
        "src/main/groovy/com/acme/Outer.groovy",
        "package com.acme\nclass Outer {\n  class Inner {}\n}\n",
    );
    let counter = root.join("src/main/groovy/com/acme/Counter.groovy");

    let generator = StubGenerator::new(root, StubConfig::default());
    let report = generator.generate(&[nested, counter]).unwrap();
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.stub_count(), 1);
    assert!(matches!(
        report.outcomes[0].result,
        Err(StubError::ModelBuild { .. })
    ));
}

#[test]
fn test_keyword_member_name_fails_only_its_source() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let first = write(root, "src/main/groovy/A.groovy", "class A {\n  int a\n}\n");
    let keyword = write(root, "src/main/groovy/B.groovy", "class B {\n  int for\n}\n");
    let last = write(root, "src/main/groovy/C.groovy", "class C {\n  int c\n}\n");

    let generator = StubGenerator::new(root, StubConfig::default());
    let report = generator.generate(&[first, keyword, last]).unwrap();
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.stub_count(), 2);
    match &report.outcomes[1].result {
        Err(StubError::ModelBuild { message, line, .. }) => {
            assert!(message.contains("'for'"));
            assert_eq!(*line, Some(2));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(generator.output_dir().join("C.java").exists());
}
