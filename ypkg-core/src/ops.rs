//! Lifecycle operations on package files.
//!
//! `prepare_*` functions stop short of writing so callers can
//! [`Package::preview`] a dry run; the plain variants also save.

use camino::Utf8Path;
use fs_err as fs;
use tracing::info;
use ypkg_schema::{detect_str, record_for};
use ypkg_types::{FormatVersion, PackageSpec};
use ypkg_yaml::emit;

use crate::error::{PackageError, PackageResult};
use crate::package::Package;
use crate::settings::PackageSettings;

/// The version number a file declares.
pub fn detect(path: impl AsRef<Utf8Path>) -> PackageResult<i64> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    detect_str(&text).map_err(PackageError::schema(path))
}

/// Load and increment the release number without saving.
pub fn prepare_bump(path: impl AsRef<Utf8Path>, settings: &PackageSettings) -> PackageResult<Package> {
    let (mut pkg, spec) = load_bumped(path, settings)?;
    pkg.modify(&spec);
    Ok(pkg)
}

/// Increment the release number in place.
pub fn bump(path: impl AsRef<Utf8Path>, settings: &PackageSettings) -> PackageResult<Package> {
    let mut pkg = prepare_bump(path, settings)?;
    pkg.save()?;
    Ok(pkg)
}

/// Rewrite a file in another format version without saving. The release
/// number is bumped as part of the conversion.
pub fn prepare_convert(
    path: impl AsRef<Utf8Path>,
    target: FormatVersion,
    settings: &PackageSettings,
) -> PackageResult<Package> {
    let (mut pkg, spec) = load_bumped(path, settings)?;
    pkg.retarget(target);
    pkg.modify(&spec);
    Ok(pkg)
}

/// Convert `path` to `target`, writing to `out` when given and different,
/// otherwise in place.
pub fn convert_format(
    path: impl AsRef<Utf8Path>,
    target: FormatVersion,
    out: Option<&Utf8Path>,
    settings: &PackageSettings,
) -> PackageResult<Package> {
    let (pkg, spec) = load_bumped(path, settings)?;
    let from = pkg.version();
    let mut pkg = match out {
        Some(out) if out != pkg.path() => pkg.retarget_to(out, target)?,
        _ => {
            let mut pkg = pkg;
            pkg.retarget(target);
            pkg
        }
    };
    pkg.modify(&spec);
    pkg.save()?;
    info!(path = %pkg.path(), %from, to = %target, "converted package");
    Ok(pkg)
}

/// Write a placeholder recipe to a new file.
pub fn init(
    path: impl AsRef<Utf8Path>,
    version: FormatVersion,
    settings: &PackageSettings,
) -> PackageResult<Package> {
    let mut pkg = Package::create(path, version, settings)?;
    pkg.modify(&PackageSpec::template());
    pkg.save()?;
    Ok(pkg)
}

/// The text `init` would write to `path`. Nothing is created.
pub fn preview_init(
    path: impl AsRef<Utf8Path>,
    version: FormatVersion,
    settings: &PackageSettings,
) -> PackageResult<String> {
    let mut record = record_for(version, settings.codec.clone());
    record.modify(&PackageSpec::template());
    let doc = record.encode().map_err(PackageError::schema(path.as_ref()))?;
    Ok(emit(&doc))
}

/// Not implemented; nothing is read.
pub fn lint(_path: impl AsRef<Utf8Path>, _settings: &PackageSettings) -> PackageResult<()> {
    Err(PackageError::NotImplemented { operation: "lint" })
}

/// Not implemented; nothing is read or written.
pub fn update(
    _path: impl AsRef<Utf8Path>,
    _version: &str,
    _sources: &[String],
    _settings: &PackageSettings,
) -> PackageResult<Package> {
    Err(PackageError::NotImplemented {
        operation: "update",
    })
}

/// Not implemented; no file is created.
pub fn auto(_sources: &[String], _settings: &PackageSettings) -> PackageResult<Package> {
    Err(PackageError::NotImplemented { operation: "auto" })
}

fn load_bumped(
    path: impl AsRef<Utf8Path>,
    settings: &PackageSettings,
) -> PackageResult<(Package, PackageSpec)> {
    let pkg = Package::load(path, settings)?;
    let mut spec = pkg.convert()?;
    let release = spec.bump();
    info!(path = %pkg.path(), release, "bumped release");
    Ok((pkg, spec))
}
