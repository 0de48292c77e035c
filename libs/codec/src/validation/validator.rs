//! # Top-Level Message Validator
//!
//! Checks the outer frame length against the header, selects the version's
//! validators from the header version byte and hands over to that version's
//! message dispatch.

use super::assembler::VersionValidators;
use super::config::ValidatorConfig;
use crate::error::{GenerateError, ValidationError, ValidationResult};
use crate::wire::{self, OF_MESSAGE_MIN_LENGTH};
use once_cell::sync::OnceCell;
use schema::{ProtocolVersion, Schema};
use std::sync::Arc;
use tracing::{info, warn};

/// Header bytes included in failure logs
const LOGGED_PREFIX: usize = 16;

/// Validators for every assembled protocol version
#[derive(Debug)]
pub struct ValidatorSet {
    schema: Arc<Schema>,
    versions: [Option<VersionValidators>; 4],
    log_failures: bool,
}

impl ValidatorSet {
    /// Assemble every version the schema defines
    pub fn generate(schema: Arc<Schema>) -> Result<Self, GenerateError> {
        let versions: Vec<ProtocolVersion> = schema.versions().into_iter().collect();
        Self::with_versions(schema, &versions)
    }

    /// Assemble only `versions`; versions the schema lacks are skipped
    pub fn with_versions(
        schema: Arc<Schema>,
        versions: &[ProtocolVersion],
    ) -> Result<Self, GenerateError> {
        let available = schema.versions();
        let mut assembled: [Option<VersionValidators>; 4] = Default::default();
        for &version in versions {
            if !available.contains(&version) {
                warn!(%version, "schema does not define this version, skipped");
                continue;
            }
            assembled[version.index()] = Some(VersionValidators::assemble(schema.clone(), version)?);
        }

        info!(
            classes = schema.len(),
            versions = assembled.iter().flatten().count(),
            "validator set ready"
        );

        Ok(Self {
            schema,
            versions: assembled,
            log_failures: true,
        })
    }

    pub fn from_config(config: &ValidatorConfig) -> Result<Self, GenerateError> {
        let schema = config.load_schema()?;
        Ok(Self::with_versions(schema, &config.versions)?.log_failures(config.log_failures))
    }

    /// Process-wide validators for the bundled OpenFlow schema, built on first use
    pub fn openflow() -> Result<&'static ValidatorSet, GenerateError> {
        static OPENFLOW: OnceCell<ValidatorSet> = OnceCell::new();
        OPENFLOW.get_or_try_init(|| -> Result<_, GenerateError> {
            Self::generate(schema::openflow()?)
        })
    }

    pub fn log_failures(mut self, enabled: bool) -> Self {
        self.log_failures = enabled;
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn version(&self, version: ProtocolVersion) -> Option<&VersionValidators> {
        self.versions[version.index()].as_ref()
    }

    /// Assembled versions, oldest first
    pub fn versions(&self) -> impl Iterator<Item = &VersionValidators> + '_ {
        self.versions.iter().flatten()
    }

    /// Validate a complete message whose length is asserted to be `len`
    pub fn validate_message(&self, msg: &[u8], len: usize) -> ValidationResult {
        let result = self.check_message(msg, len);
        if let Err(err) = &result {
            if self.log_failures {
                let prefix = &msg[..msg.len().min(LOGGED_PREFIX)];
                warn!(
                    error = %err,
                    root_cause = %err.root_cause(),
                    len,
                    prefix = %hex::encode(prefix),
                    "message rejected"
                );
            }
        }
        result
    }

    /// `0` on success, otherwise the failure's negative code
    pub fn validate_status(&self, msg: &[u8], len: usize) -> i32 {
        match self.validate_message(msg, len) {
            Ok(()) => 0,
            Err(err) => err.code(),
        }
    }

    fn check_message(&self, msg: &[u8], len: usize) -> ValidationResult {
        let declared = wire::parse_header(msg).map(|header| header.length());
        let frame_ok = len >= OF_MESSAGE_MIN_LENGTH
            && len <= msg.len()
            && declared.is_some_and(|declared| declared as usize == len);
        if !frame_ok {
            return Err(ValidationError::BadFrameLength {
                len,
                available: msg.len(),
                declared,
                minimum: OF_MESSAGE_MIN_LENGTH,
            });
        }

        let msg = &msg[..len];
        let byte = msg[0];
        let validators = ProtocolVersion::try_from(byte)
            .ok()
            .and_then(|version| self.version(version))
            .ok_or(ValidationError::BadVersion { version: byte })?;

        validators.validate_message(msg)
    }
}
