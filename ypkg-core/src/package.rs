//! An open package.yml file and the record decoded from it.

use std::io::{Read, Seek, SeekFrom, Write};

use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use tracing::{debug, info};
use ypkg_schema::{VersionedRecord, detect, new_record, record_for};
use ypkg_types::{Codec, FormatVersion, PackageSpec};
use ypkg_yaml::{emit, parse_document};

use crate::error::{PackageError, PackageResult};
use crate::settings::PackageSettings;

/// A package file held open for reading and writing.
///
/// Lifecycle: `load`/`create`, then any number of `convert`/`modify`/`save`
/// rounds, then `close`. Saving after `close` fails with
/// [`PackageError::Closed`].
#[derive(Debug)]
pub struct Package {
    path: Utf8PathBuf,
    file: Option<fs::File>,
    record: Box<dyn VersionedRecord>,
    codec: Codec,
    /// Text last read from or written to disk.
    original: String,
}

impl Package {
    /// Open an existing file, detect its version and decode it.
    pub fn load(path: impl AsRef<Utf8Path>, settings: &PackageSettings) -> PackageResult<Self> {
        let path = path.as_ref().to_owned();
        let mut file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_std_path())?;
        let mut original = String::new();
        file.read_to_string(&mut original)?;

        let err = PackageError::schema;
        let doc = parse_document(&original).map_err(|e| err(&path)(e.into()))?;
        let version = detect(&doc).map_err(err(&path))?;
        let mut record = new_record(version, settings.codec.clone()).map_err(err(&path))?;
        record.decode(&doc).map_err(err(&path))?;
        info!(path = %path, version, "loaded package");

        Ok(Self {
            path,
            file: Some(file),
            record,
            codec: settings.codec.clone(),
            original,
        })
    }

    /// Create a new, empty file. Fails if `path` already exists.
    pub fn create(
        path: impl AsRef<Utf8Path>,
        version: FormatVersion,
        settings: &PackageSettings,
    ) -> PackageResult<Self> {
        let path = path.as_ref().to_owned();
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_std_path())?;
        info!(path = %path, %version, "created package");
        Ok(Self {
            path,
            file: Some(file),
            record: record_for(version, settings.codec.clone()),
            codec: settings.codec.clone(),
            original: String::new(),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn version(&self) -> FormatVersion {
        self.record.version()
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub fn record(&self) -> &dyn VersionedRecord {
        self.record.as_ref()
    }

    /// Lift the record into the canonical model.
    pub fn convert(&self) -> PackageResult<PackageSpec> {
        self.record
            .convert()
            .map_err(PackageError::schema(&self.path))
    }

    /// Replace the record's contents from the canonical model.
    pub fn modify(&mut self, spec: &PackageSpec) {
        self.record.modify(spec);
    }

    /// Switch to an empty record of another version, keeping the file.
    pub fn retarget(&mut self, version: FormatVersion) {
        debug!(path = %self.path, from = %self.version(), to = %version, "retargeting");
        self.record = record_for(version, self.codec.clone());
    }

    /// Switch to an empty record of `version` stored at `path`.
    ///
    /// The current handle is released. `path` is created if missing; its
    /// contents are replaced on the next save.
    pub fn retarget_to(
        mut self,
        path: impl AsRef<Utf8Path>,
        version: FormatVersion,
    ) -> PackageResult<Self> {
        let path = path.as_ref().to_owned();
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_std_path())?;
        self.close();
        self.retarget(version);
        self.path = path;
        self.file = Some(file);
        Ok(self)
    }

    /// The record as YAML text.
    pub fn render(&self) -> PackageResult<String> {
        let doc = self
            .record
            .encode()
            .map_err(PackageError::schema(&self.path))?;
        Ok(emit(&doc))
    }

    /// Unified diff from the text on disk to what `save` would write.
    /// Empty when nothing would change.
    pub fn preview(&self) -> PackageResult<String> {
        let rendered = self.render()?;
        if rendered == self.original {
            return Ok(String::new());
        }
        let patch = diffy::create_patch(&self.original, &rendered);
        Ok(PatchFormatter::new().fmt_patch(&patch).to_string())
    }

    /// Rewrite the whole file in place. Returns the number of bytes written.
    ///
    /// Not atomic: a crash mid-write can leave a truncated file.
    pub fn save(&mut self) -> PackageResult<usize> {
        if self.file.is_none() {
            return Err(PackageError::Closed {
                path: self.path.clone(),
            });
        }
        let text = self.render()?;
        let Some(file) = self.file.as_mut() else {
            return Err(PackageError::Closed {
                path: self.path.clone(),
            });
        };
        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;

        let bytes = text.len();
        info!(path = %self.path, bytes, version = %self.version(), "saved package");
        self.original = text;
        Ok(bytes)
    }

    /// Release the file handle. Idempotent.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            debug!(path = %self.path, "closed package");
        }
    }
}
