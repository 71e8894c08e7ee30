//! Configuration for blockjournal
//!
//! Centralized configuration with sensible defaults. The enclosing engine
//! resolves these values; nothing here reads files or the environment.

use crate::error::{JournalError, Result};
use crate::filter::BloomFilter;

/// Main configuration for journal readers and filter generation
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Halt the reader on the first corrupted block instead of skipping it
    pub strict_journal: bool,

    /// Verify chunk checksums while reading
    pub verify_checksums: bool,

    // -------------------------------------------------------------------------
    // Filter Configuration
    // -------------------------------------------------------------------------
    /// Bloom filter bits per key (the m/n ratio)
    pub bloom_bits_per_key: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict_journal: false,
            verify_checksums: true,
            bloom_bits_per_key: 10, // ~1% false positives
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reader options derived from this config
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            strict: self.strict_journal,
            checksum: self.verify_checksums,
        }
    }

    /// Bloom filter configured with `bloom_bits_per_key`
    pub fn bloom_filter(&self) -> BloomFilter {
        BloomFilter::new(self.bloom_bits_per_key)
    }

    /// Check values that would produce a useless filter or reader
    pub fn validate(&self) -> Result<()> {
        if self.bloom_bits_per_key == 0 {
            return Err(JournalError::Config(
                "bloom_bits_per_key must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Halt the journal reader on corruption
    pub fn strict_journal(mut self, strict: bool) -> Self {
        self.config.strict_journal = strict;
        self
    }

    /// Enable or disable chunk checksum verification
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    /// Set the bloom filter bits per key
    pub fn bloom_bits_per_key(mut self, bits: usize) -> Self {
        self.config.bloom_bits_per_key = bits;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Options consumed by the journal reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Corrupted or invalid chunks halt the reader entirely.
    /// Orphan chunks are skipped even in strict mode.
    pub strict: bool,

    /// Verify each chunk's checksum
    pub checksum: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            strict: false,
            checksum: true,
        }
    }
}

impl ReaderOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }
}
