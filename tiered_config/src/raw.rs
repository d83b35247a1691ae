//! Whole-file text or binary resources.
//!
//! A [`RawResource`] bypasses codecs and the merge pipeline: it loads a file
//! verbatim and writes it back atomically, optionally with restrictive
//! permissions. Typical uses are certificates, tokens and templates that sit
//! next to structured configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::path::{ensure_parent_dir, expand_home};
use crate::persist::write_atomic;
use crate::{ConfigError, ConfigResult, ModeMismatch, RawDumpError};

/// Whether a resource holds text or bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMode {
    /// Decoded text.
    Text,
    /// Opaque bytes.
    Binary,
}

impl RawMode {
    /// Lower-case name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }
}

/// Character encoding of a text resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TextEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    /// Canonical name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
        }
    }
}

/// Handling of bytes or characters the encoding cannot represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeErrors {
    /// Fail the operation.
    #[default]
    Strict,
    /// Substitute U+FFFD when decoding and `?` when encoding.
    Replace,
    /// Drop the offending input.
    Ignore,
}

/// Content of a raw resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    /// Decoded text.
    Text(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
}

impl RawPayload {
    /// Mode this payload belongs to.
    #[must_use]
    pub const fn mode(&self) -> RawMode {
        match self {
            Self::Text(_) => RawMode::Text,
            Self::Binary(_) => RawMode::Binary,
        }
    }

    /// Text content, if this is a text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Byte content, if this is a binary payload.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(_) => None,
            Self::Binary(bytes) => Some(bytes),
        }
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for RawPayload {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

/// A file loaded and stored verbatim.
///
/// # Examples
///
/// ```rust,no_run
/// use tiered_config::{RawPayload, RawResource};
///
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let token = RawResource::text("~/.config/app/token").file_mode(0o600);
/// token.dump("s3cr3t")?;
/// assert_eq!(token.load()?, Some(RawPayload::Text("s3cr3t".into())));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RawResource {
    path: PathBuf,
    mode: RawMode,
    optional: bool,
    encoding: TextEncoding,
    errors: DecodeErrors,
    file_mode: Option<u32>,
}

impl RawResource {
    fn new(path: &Path, mode: RawMode) -> Self {
        Self {
            path: expand_home(path),
            mode,
            optional: false,
            encoding: TextEncoding::default(),
            errors: DecodeErrors::default(),
            file_mode: None,
        }
    }

    /// Text resource at `path`; a leading `~` is expanded.
    #[must_use]
    pub fn text(path: impl AsRef<Path>) -> Self {
        Self::new(path.as_ref(), RawMode::Text)
    }

    /// Binary resource at `path`; a leading `~` is expanded.
    #[must_use]
    pub fn binary(path: impl AsRef<Path>) -> Self {
        Self::new(path.as_ref(), RawMode::Binary)
    }

    /// Whether a missing file loads as `None` instead of failing.
    #[must_use]
    pub const fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Encoding used for text resources.
    #[must_use]
    pub const fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Policy for undecodable or unencodable text.
    #[must_use]
    pub const fn errors(mut self, errors: DecodeErrors) -> Self {
        self.errors = errors;
        self
    }

    /// Permission bits applied on every dump. Only the lowest nine bits are
    /// used.
    #[must_use]
    pub const fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = Some(mode);
        self
    }

    /// Resolved location of the resource.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the resource was created with.
    #[must_use]
    pub const fn mode(&self) -> RawMode {
        self.mode
    }

    /// Read the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSource`] for a missing required file,
    /// [`ConfigError::Io`] when reading fails and [`ConfigError::Decode`] when
    /// strict text decoding fails.
    pub fn load(&self) -> ConfigResult<Option<RawPayload>> {
        if !self.path.exists() {
            if self.optional {
                debug!(path = %self.path.display(), "optional raw resource is absent");
                return Ok(None);
            }
            return Err(ConfigError::missing_source(self.path.display().to_string()));
        }
        let bytes = std::fs::read(&self.path).map_err(|e| ConfigError::read(&self.path, e))?;
        let payload = match self.mode {
            RawMode::Binary => RawPayload::Binary(bytes),
            RawMode::Text => RawPayload::Text(self.decode(&bytes)?),
        };
        Ok(Some(payload))
    }

    /// Atomically replace the file with `payload`, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`RawDumpError::ModeMismatch`] when the payload kind differs
    /// from the resource mode, and [`RawDumpError::Configuration`] when text
    /// cannot be encoded or the file cannot be written.
    pub fn dump(&self, payload: impl Into<RawPayload>) -> Result<(), RawDumpError> {
        let bytes = match (self.mode, payload.into()) {
            (RawMode::Text, RawPayload::Text(text)) => self.encode(&text)?,
            (RawMode::Binary, RawPayload::Binary(bytes)) => bytes,
            (expected, other) => {
                return Err(ModeMismatch {
                    expected: expected.name(),
                    found: other.mode().name(),
                }
                .into());
            }
        };
        ensure_parent_dir(&self.path).map_err(|e| ConfigError::write(&self.path, e))?;
        write_atomic(&self.path, &bytes, self.file_mode)
            .map_err(|e| ConfigError::write(&self.path, e))?;
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> ConfigResult<String> {
        match self.encoding {
            TextEncoding::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
            TextEncoding::Utf8 => match self.errors {
                DecodeErrors::Strict => std::str::from_utf8(bytes)
                    .map(str::to_owned)
                    .map_err(|e| {
                        Arc::new(ConfigError::Decode {
                            path: self.path.clone(),
                            encoding: self.encoding.name(),
                            message: e.to_string(),
                        })
                    }),
                DecodeErrors::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
                DecodeErrors::Ignore => Ok(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
            },
        }
    }

    fn encode(&self, text: &str) -> ConfigResult<Vec<u8>> {
        match self.encoding {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Latin1 => {
                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    match (u8::try_from(ch), self.errors) {
                        (Ok(byte), _) => out.push(byte),
                        (Err(_), DecodeErrors::Replace) => out.push(b'?'),
                        (Err(_), DecodeErrors::Ignore) => {}
                        (Err(_), DecodeErrors::Strict) => {
                            return Err(ConfigError::encode(
                                &self.path,
                                format!("character {ch:?} cannot be encoded as latin-1"),
                            ));
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow, ensure};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"))
    }

    fn load(resource: &RawResource) -> Result<Option<RawPayload>> {
        resource.load().map_err(|e| anyhow!(e.to_string()))
    }

    #[rstest]
    fn text_round_trip_creates_parents(dir: TempDir) -> Result<()> {
        let resource = RawResource::text(dir.path().join("nested/deeper/motd.txt"));
        resource.dump("hello\nworld")?;
        ensure!(load(&resource)? == Some(RawPayload::Text(String::from("hello\nworld"))));
        Ok(())
    }

    #[rstest]
    fn binary_round_trip(dir: TempDir) -> Result<()> {
        let resource = RawResource::binary(dir.path().join("blob.bin"));
        let bytes: &[u8] = &[0, 159, 146, 150, 255];
        resource.dump(bytes)?;
        ensure!(load(&resource)? == Some(RawPayload::Binary(bytes.to_vec())));
        Ok(())
    }

    #[rstest]
    fn optional_missing_is_none(dir: TempDir) -> Result<()> {
        let resource = RawResource::text(dir.path().join("absent.txt")).optional(true);
        ensure!(load(&resource)?.is_none());
        Ok(())
    }

    #[rstest]
    fn required_missing_fails(dir: TempDir) {
        let err = RawResource::binary(dir.path().join("absent.bin")).load().err();
        assert!(matches!(err.as_deref(), Some(ConfigError::MissingSource { .. })));
    }

    #[rstest]
    #[case(RawResource::text("unused.txt"), RawPayload::Binary(vec![1]), "text", "binary")]
    #[case(RawResource::binary("unused.bin"), RawPayload::from("x"), "binary", "text")]
    fn mode_mismatch_is_a_type_error(
        #[case] resource: RawResource,
        #[case] payload: RawPayload,
        #[case] expected: &str,
        #[case] found: &str,
    ) {
        match resource.dump(payload) {
            Err(RawDumpError::ModeMismatch(mismatch)) => {
                assert_eq!((mismatch.expected, mismatch.found), (expected, found));
            }
            other => panic!("expected a mode mismatch, got {other:?}"),
        }
        assert!(!resource.path().exists());
    }

    #[rstest]
    fn latin1_round_trip(dir: TempDir) -> Result<()> {
        let resource = RawResource::text(dir.path().join("l1.txt")).encoding(TextEncoding::Latin1);
        resource.dump("café")?;
        ensure!(std::fs::read(resource.path())? == [0x63, 0x61, 0x66, 0xE9]);
        ensure!(load(&resource)?.as_ref().and_then(RawPayload::as_text) == Some("café"));
        Ok(())
    }

    #[rstest]
    #[case(DecodeErrors::Replace, Some(b"cost ?5".to_vec()))]
    #[case(DecodeErrors::Ignore, Some(b"cost 5".to_vec()))]
    #[case(DecodeErrors::Strict, None)]
    fn latin1_encoding_policies(
        dir: TempDir,
        #[case] policy: DecodeErrors,
        #[case] expected: Option<Vec<u8>>,
    ) -> Result<()> {
        let resource = RawResource::text(dir.path().join("price.txt"))
            .encoding(TextEncoding::Latin1)
            .errors(policy);
        let outcome = resource.dump("cost €5");
        match expected {
            Some(bytes) => {
                outcome?;
                ensure!(std::fs::read(resource.path())? == bytes);
            }
            None => {
                ensure!(matches!(
                    outcome,
                    Err(RawDumpError::Configuration(ref err)) if matches!(err.as_ref(), ConfigError::Encode { .. })
                ));
                ensure!(!resource.path().exists());
            }
        }
        Ok(())
    }

    #[rstest]
    #[case(DecodeErrors::Replace, Some("a\u{FFFD}b"))]
    #[case(DecodeErrors::Ignore, Some("ab"))]
    #[case(DecodeErrors::Strict, None)]
    fn utf8_decoding_policies(
        dir: TempDir,
        #[case] policy: DecodeErrors,
        #[case] expected: Option<&str>,
    ) -> Result<()> {
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [b'a', 0xFF, b'b'])?;
        let resource = RawResource::text(&path).errors(policy);
        match expected {
            Some(text) => {
                ensure!(load(&resource)?.as_ref().and_then(RawPayload::as_text) == Some(text));
            }
            None => {
                let err = resource.load().err();
                ensure!(matches!(
                    err.as_deref(),
                    Some(ConfigError::Decode { encoding: "utf-8", .. })
                ));
            }
        }
        Ok(())
    }

    #[cfg(unix)]
    #[rstest]
    fn dump_applies_file_mode(dir: TempDir) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let resource = RawResource::text(dir.path().join("secret")).file_mode(0o100_600);
        resource.dump("token")?;
        let mode = std::fs::metadata(resource.path())?.permissions().mode();
        ensure!(mode & 0o777 == 0o600);
        Ok(())
    }
}
