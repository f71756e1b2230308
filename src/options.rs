use std::env::var;
use std::str::FromStr;

/// Options for [`NzCopyStreamReader`][crate::NzCopyStreamReader] and
/// [`NzCopyStreamWriter`][crate::NzCopyStreamWriter].
///
/// Use [`NzCopyOptions::from_env`] to pick up overrides from the environment:
///
/// | Variable                        | Option                    |
/// |---------------------------------|---------------------------|
/// | `NZ_COPY_BATCH_SIZE_HINT_BYTES` | `batch_size_hint_bytes`   |
/// | `NZ_COPY_EXPECT_HEADER`         | `expect_header`           |
/// | `NZ_COPY_VALIDATE_RECORD_OIDS`  | `validate_record_oids`    |
///
/// # Example
///
/// ```rust
/// # use netezza_copy::NzCopyOptions;
/// let options = NzCopyOptions::new()
///     .batch_size_hint_bytes(1 << 20)
///     .expect_header(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NzCopyOptions {
    pub(crate) batch_size_hint_bytes: usize,
    pub(crate) expect_header: bool,
    pub(crate) validate_record_oids: bool,
    pub(crate) row_capacity: usize,
}

impl Default for NzCopyOptions {
    fn default() -> Self {
        NzCopyOptions {
            batch_size_hint_bytes: 16 * 1024 * 1024,
            expect_header: true,
            validate_record_oids: true,
            row_capacity: 1024,
        }
    }
}

impl NzCopyOptions {
    pub fn new() -> Self {
        NzCopyOptions::default()
    }

    /// The default options with any overrides found in the environment.
    ///
    /// Values that don't parse are ignored with a warning.
    pub fn from_env() -> Self {
        let mut options = NzCopyOptions::default();

        if let Some(bytes) = parse_env("NZ_COPY_BATCH_SIZE_HINT_BYTES") {
            options.batch_size_hint_bytes = bytes;
        }

        if let Some(expect_header) = parse_env_bool("NZ_COPY_EXPECT_HEADER") {
            options.expect_header = expect_header;
        }

        if let Some(validate) = parse_env_bool("NZ_COPY_VALIDATE_RECORD_OIDS") {
            options.validate_record_oids = validate;
        }

        options
    }

    /// Sets the approximate size of decoded data after which callers should cut a batch.
    ///
    /// The default is 16 MiB.
    pub fn batch_size_hint_bytes(mut self, bytes: usize) -> Self {
        self.batch_size_hint_bytes = bytes;
        self
    }

    /// Sets whether the stream starts with the `PGCOPY` signature and header.
    ///
    /// Enabled by default.
    pub fn expect_header(mut self, expect: bool) -> Self {
        self.expect_header = expect;
        self
    }

    /// Sets whether the type OID tagged on each member of a nested record is checked
    /// against the member's cataloged type.
    ///
    /// Enabled by default.
    pub fn validate_record_oids(mut self, validate: bool) -> Self {
        self.validate_record_oids = validate;
        self
    }

    /// Sets the number of rows decode buffers are sized for up front.
    pub fn row_capacity(mut self, rows: usize) -> Self {
        self.row_capacity = rows;
        self
    }

    pub fn get_batch_size_hint_bytes(&self) -> usize {
        self.batch_size_hint_bytes
    }

    pub fn get_expect_header(&self) -> bool {
        self.expect_header
    }

    pub fn get_validate_record_oids(&self) -> bool {
        self.validate_record_oids
    }

    pub fn get_row_capacity(&self) -> usize {
        self.row_capacity
    }

    /// Returns `true` once `approx_bytes` of decoded data warrant handing out a batch.
    pub fn batch_size_reached(&self, approx_bytes: usize) -> bool {
        approx_bytes >= self.batch_size_hint_bytes
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let value = var(key).ok()?;

    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(%key, %value, "ignoring unparsable environment variable");
            None
        }
    }
}

fn parse_env_bool(key: &str) -> Option<bool> {
    let value = var(key).ok()?;

    match parse_bool(&value) {
        Some(parsed) => Some(parsed),
        None => {
            tracing::warn!(%key, %value, "ignoring unparsable environment variable");
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
