use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use ypkg_core::{FormatVersion, Package, PackageError, PackageSettings, ops};

const NANO_V2: &str = r#"name: nano
version: 1.10
release: 4
source:
    - https://www.nano-editor.org/dist/v5/nano-5.4.tar.xz: fe5c50a6ab5e1bed8a4a2c68e5d8f8b1
license: GPL-3.0-or-later # see COPYING
component: system.utils
summary: Small, friendly text editor
description: |
    GNU nano is a small and friendly text editor.
builddeps:
    - pkgconfig(ncursesw) # wide chars
install: |
    %make_install
patterns:
    - /usr/bin
    - devel:
        - /usr/include # headers
"#;

fn fixture(text: &str) -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("package.yml")).expect("utf8 path");
    fs::write(&path, text).expect("write fixture");
    (dir, path)
}

fn read(path: &Utf8Path) -> String {
    fs::read_to_string(path).expect("read back")
}

#[test]
fn bump_changes_only_the_release() {
    let (_dir, path) = fixture(NANO_V2);
    let before = Package::load(&path, &PackageSettings::default())
        .unwrap()
        .convert()
        .unwrap();

    ops::bump(&path, &PackageSettings::default()).unwrap();

    let text = read(&path);
    assert_eq!(text, NANO_V2.replace("release: 4", "release: 5"));

    let mut after = Package::load(&path, &PackageSettings::default())
        .unwrap()
        .convert()
        .unwrap();
    assert_eq!(after.release, before.release + 1);
    after.release = before.release;
    assert_eq!(after, before);
}

#[test]
fn bump_twice_keeps_counting() {
    let (_dir, path) = fixture("name: x\nversion: 1\nrelease: 9\n");
    ops::bump(&path, &PackageSettings::default()).unwrap();
    ops::bump(&path, &PackageSettings::default()).unwrap();
    assert_eq!(read(&path), "name: x\nversion: 1\nrelease: 11\n");
}

#[test]
fn prepare_bump_does_not_write() {
    let (_dir, path) = fixture(NANO_V2);
    let pkg = ops::prepare_bump(&path, &PackageSettings::default()).unwrap();
    let diff = pkg.preview().unwrap();
    assert!(diff.contains("-release: 4"), "{diff}");
    assert!(diff.contains("+release: 5"), "{diff}");
    assert_eq!(read(&path), NANO_V2);
}

#[test]
fn convert_in_place_upgrades_and_bumps() {
    let (_dir, path) = fixture(NANO_V2);
    let pkg = ops::convert_format(&path, FormatVersion::V3, None, &PackageSettings::default())
        .unwrap();
    assert_eq!(pkg.version(), FormatVersion::V3);

    assert_eq!(
        read(&path),
        r#"YPKG: 3
name: nano
version: 1.10
release: 5
source:
    - https://www.nano-editor.org/dist/v5/nano-5.4.tar.xz: fe5c50a6ab5e1bed8a4a2c68e5d8f8b1
license: GPL-3.0-or-later # see COPYING
component: system.utils
summary: Small, friendly text editor
description: |
    GNU nano is a small and friendly text editor.
deps:
    build:
        - pkgconfig(ncursesw) # wide chars
install: |
    %make_install
patterns:
    - /usr/bin
    - devel:
        - /usr/include # headers
"#
    );
    assert_eq!(ops::detect(&path).unwrap(), 3);
}

#[test]
fn convert_to_another_path_leaves_the_source() {
    let (dir, path) = fixture(NANO_V2);
    let out = Utf8PathBuf::from_path_buf(dir.path().join("package.v3.yml")).unwrap();
    let pkg = ops::convert_format(
        &path,
        FormatVersion::V3,
        Some(&out),
        &PackageSettings::default(),
    )
    .unwrap();

    assert_eq!(pkg.path(), out.as_path());
    assert_eq!(read(&path), NANO_V2);
    assert!(read(&out).starts_with("YPKG: 3\n"));
}

#[test]
fn downgrade_merges_check_dependencies() {
    let (_dir, path) = fixture(
        "YPKG: 3\nname: x\nversion: 1\nrelease: 1\ndeps:\n    build:\n        - gcc\n    check:\n        - pytest\n",
    );
    ops::convert_format(&path, FormatVersion::V2, None, &PackageSettings::default()).unwrap();
    assert_eq!(
        read(&path),
        "name: x\nversion: 1\nrelease: 2\nbuilddeps:\n    - gcc\n    - pytest\n"
    );
}

#[test]
fn init_writes_the_template_and_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("package.yml")).unwrap();

    ops::init(&path, FormatVersion::V3, &PackageSettings::default()).unwrap();
    let text = read(&path);
    assert!(text.starts_with("YPKG: 3\nname: Name-Of-Package\nversion: 1.0.0a\nrelease: 1\n"));
    assert!(text.contains("license: GPL-2.0-or-later # CHECK AND/OR CHANGE ME\n"));
    assert_eq!(ops::detect(&path).unwrap(), 3);

    let err = ops::init(&path, FormatVersion::V2, &PackageSettings::default()).unwrap_err();
    assert!(matches!(err, PackageError::Io(_)));
    assert_eq!(read(&path), text);
}

#[test]
fn preview_init_matches_what_init_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("package.yml")).unwrap();

    let preview = ops::preview_init(&path, FormatVersion::V2, &PackageSettings::default()).unwrap();
    assert!(!path.exists());

    ops::init(&path, FormatVersion::V2, &PackageSettings::default()).unwrap();
    assert_eq!(read(&path), preview);
}

#[test]
fn unimplemented_operations_touch_nothing() {
    let (_dir, path) = fixture(NANO_V2);
    let settings = PackageSettings::default();

    let lint = ops::lint(&path, &settings).unwrap_err();
    assert!(matches!(lint, PackageError::NotImplemented { operation: "lint" }));
    assert_eq!(lint.exit_code(), 3);

    let update = ops::update(&path, "8.0", &["https://example.org/nano-8.0.tar.xz".into()], &settings)
        .unwrap_err();
    assert!(matches!(update, PackageError::NotImplemented { operation: "update" }));

    let auto = ops::auto(&["https://example.org/nano-8.0.tar.xz".into()], &settings).unwrap_err();
    assert!(matches!(auto, PackageError::NotImplemented { operation: "auto" }));

    assert_eq!(read(&path), NANO_V2);
}

#[test]
fn invalid_documents_fail_without_writing() {
    let text = "name: x\ncomponent:\n    - devel: programming.devel\n";
    let (_dir, path) = fixture(text);
    let err = ops::bump(&path, &PackageSettings::default()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("invalid `component`"), "{err}");
    assert_eq!(read(&path), text);
}

#[test]
fn custom_reserved_key_is_honoured() {
    let text = "name: x\nversion: 1\nrelease: 1\npatterns:\n    - main:\n        - /usr/bin\n";
    let (_dir, path) = fixture(text);

    let mut settings = PackageSettings::default();
    assert!(Package::load(&path, &settings).is_ok());

    settings.codec = ypkg_core::Codec::new("main");
    let err = Package::load(&path, &settings).unwrap_err();
    assert!(err.to_string().contains("reserved"), "{err}");
}

#[test]
fn negative_and_oversized_markers_are_unsupported_versions() {
    for marker in ["-1", "99999999999"] {
        let text = format!("YPKG: {marker}\nname: x\nversion: 1\nrelease: 1\n");
        let (_dir, path) = fixture(&text);

        assert_eq!(ops::detect(&path).unwrap().to_string(), marker);

        let err = ops::bump(&path, &PackageSettings::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(
            err.to_string().ends_with(&format!("unsupported format version {marker}")),
            "{err}"
        );
        assert_eq!(read(&path), text);
    }
}

#[test]
fn line_separators_survive_a_save() {
    let text = "name: x\nversion: 1\nrelease: 1\nsummary: \"a\\u2028b\"\ndescription: Éditeur « léger » 漢字\n";
    let (_dir, path) = fixture(text);

    ops::bump(&path, &PackageSettings::default()).unwrap();

    assert_eq!(
        read(&path),
        "name: x\nversion: 1\nrelease: 2\nsummary: \"a\\Lb\"\ndescription: Éditeur « léger » 漢字\n"
    );
    let spec = Package::load(&path, &PackageSettings::default())
        .unwrap()
        .convert()
        .unwrap();
    let summary = spec.summary.as_ref().and_then(|v| v.default_value());
    assert_eq!(summary.map(|s| s.value.as_str()), Some("a\u{2028}b"));
    let description = spec.description.as_ref().and_then(|v| v.default_value());
    assert_eq!(
        description.map(|s| s.value.as_str()),
        Some("Éditeur « léger » 漢字")
    );
}

#[test]
fn bump_keeps_comments_after_flow_collections() {
    let text = "name: x\nversion: 1\nrelease: 1\nlicense: [MIT, GPL-2.0]\nsummary: two\n    lines\nrundeps:\n    - MIT # keep me here\n";
    let (_dir, path) = fixture(text);

    ops::bump(&path, &PackageSettings::default()).unwrap();

    let out = read(&path);
    assert!(out.contains("release: 2\n"), "{out}");
    assert!(out.contains("license:\n    - MIT\n    - GPL-2.0\n"), "{out}");
    assert!(out.contains("summary: two lines\n"), "{out}");
    assert!(out.contains("rundeps:\n    - MIT # keep me here\n"), "{out}");
    assert_eq!(out.matches('#').count(), 1, "{out}");
}
