//! Platform capability oracle.
//!
//! Decides, before any assertion source is generated, whether a structure or
//! header is expected to exist on the current platform. Structures and
//! headers that are not expected are skipped instead of failing.
//!
//! Answers come from an override table first. Headers without an override
//! are probed by compiling a unit that includes them after the headers listed
//! before them; results are cached per include sequence for the lifetime of
//! the oracle. Structures without an override are
//! [`Capability::Unknown`] and handled according to the [`UnknownPolicy`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::core::HeaderSet;
use crate::util::config::CapabilityConfig;

use super::compile::{CompileError, HeaderProbe};

/// Structures that only exist on Linux.
pub const LINUX_ONLY_STRUCTS: &[&str] = &[
    "ucred",
    "mmsghdr",
    "ip_mreqn",
    "file_handle",
    "f_owner_ex",
    "epoll_data_t",
    "epoll_event",
    "sock_extended_err",
    "scm_timestamping",
    "cpu_set_t",
];

/// Prefix of Linux kernel UAPI headers.
pub const LINUX_HEADER_PREFIX: &str = "linux/";

/// Whether something is expected to exist on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Supported,
    Unsupported,
    /// No override and not probed yet
    Unknown,
}

impl From<bool> for Capability {
    fn from(supported: bool) -> Self {
        if supported {
            Capability::Supported
        } else {
            Capability::Unsupported
        }
    }
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Supported => "supported",
            Capability::Unsupported => "unsupported",
            Capability::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a structure whose capability is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownPolicy {
    /// Run the check; a missing structure then fails to compile
    #[default]
    AssumeSupported,
    /// Skip the check
    Skip,
}

/// Capability lookups shared by every check of a run.
#[derive(Debug, Default)]
pub struct CapabilityOracle {
    structs: HashMap<String, bool>,
    headers: HashMap<String, bool>,
    unknown: UnknownPolicy,
    probed: RwLock<HashMap<HeaderSet, bool>>,
}

impl CapabilityOracle {
    /// An oracle with no overrides.
    pub fn new() -> Self {
        CapabilityOracle::default()
    }

    /// An oracle with the built-in defaults for the host platform.
    pub fn for_host() -> Self {
        let oracle = CapabilityOracle::new();
        if cfg!(target_os = "linux") {
            oracle
        } else {
            oracle.with_linux_unsupported()
        }
    }

    /// Built-in defaults followed by configured overrides.
    pub fn from_config(config: &CapabilityConfig) -> Self {
        let mut oracle = CapabilityOracle::for_host();
        oracle.apply_config(config);
        oracle
    }

    /// Mark Linux-only structures unsupported.
    ///
    /// `linux/*` headers are reported unsupported by [`Self::supports_headers`]
    /// unless overridden.
    pub fn with_linux_unsupported(mut self) -> Self {
        for name in LINUX_ONLY_STRUCTS {
            self.structs.insert(name.to_string(), false);
        }
        self.headers.insert(LINUX_HEADER_PREFIX.to_string(), false);
        self
    }

    pub fn with_struct(mut self, name: impl Into<String>, supported: bool) -> Self {
        self.structs.insert(name.into(), supported);
        self
    }

    pub fn with_header(mut self, header: impl Into<String>, supported: bool) -> Self {
        self.headers.insert(header.into(), supported);
        self
    }

    pub fn with_unknown_policy(mut self, policy: UnknownPolicy) -> Self {
        self.unknown = policy;
        self
    }

    /// Layer overrides from a configuration file on top of this oracle.
    pub fn apply_config(&mut self, config: &CapabilityConfig) {
        if let Some(policy) = config.unknown {
            self.unknown = policy;
        }
        for (name, supported) in &config.structs {
            self.structs.insert(name.clone(), *supported);
        }
        for (header, supported) in &config.headers {
            self.headers.insert(header.clone(), *supported);
        }
    }

    pub fn unknown_policy(&self) -> UnknownPolicy {
        self.unknown
    }

    /// Whether a structure is expected to exist.
    pub fn supports_struct(&self, name: &str) -> Capability {
        match self.structs.get(name) {
            Some(&supported) => Capability::from(supported),
            None => Capability::Unknown,
        }
    }

    /// Whether a check for the structure should run.
    pub fn admits_struct(&self, name: &str) -> bool {
        match self.supports_struct(name) {
            Capability::Supported => true,
            Capability::Unsupported => false,
            Capability::Unknown => self.unknown == UnknownPolicy::AssumeSupported,
        }
    }

    /// Configured capability of a single header, without probing.
    pub fn header_capability(&self, header: &str) -> Capability {
        match self.header_override(header) {
            Some(supported) => Capability::from(supported),
            None => Capability::Unknown,
        }
    }

    /// Cached probe result for exactly this include sequence.
    pub fn probed_capability(&self, headers: &HeaderSet) -> Capability {
        let probed = self.probed.read().unwrap_or_else(PoisonError::into_inner);
        match probed.get(headers) {
            Some(&supported) => Capability::from(supported),
            None => Capability::Unknown,
        }
    }

    /// Whether every header in the set can be included.
    ///
    /// Headers are probed in order, each one after the headers preceding it,
    /// so a header that relies on an earlier include probes correctly.
    /// Results are cached per include sequence, since the same header can
    /// compile in one sequence and not in another. The first unsupported
    /// header ends the lookup.
    pub fn supports_headers(
        &self,
        headers: &HeaderSet,
        probe: &dyn HeaderProbe,
    ) -> Result<bool, CompileError> {
        let mut prefix = HeaderSet::default();

        for header in headers.iter() {
            prefix.push(header);

            let supported = match self.header_capability(header) {
                Capability::Supported => true,
                Capability::Unsupported => false,
                Capability::Unknown => self.probe_cached(&prefix, probe)?,
            };

            if !supported {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn probe_cached(&self, prefix: &HeaderSet, probe: &dyn HeaderProbe) -> Result<bool, CompileError> {
        match self.probed_capability(prefix) {
            Capability::Supported => return Ok(true),
            Capability::Unsupported => return Ok(false),
            Capability::Unknown => {}
        }

        let supported = probe.probe_headers(prefix)?;
        tracing::debug!("Probed [{}]: {}", prefix, Capability::from(supported));

        let mut probed = self.probed.write().unwrap_or_else(PoisonError::into_inner);
        let cached = *probed.entry(prefix.clone()).or_insert(supported);
        Ok(cached)
    }

    /// An exact override wins over a directory-prefix override (`linux/`).
    fn header_override(&self, header: &str) -> Option<bool> {
        if let Some(&supported) = self.headers.get(header) {
            return Some(supported);
        }

        self.headers
            .iter()
            .filter(|(key, _)| key.ends_with('/') && header.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, &supported)| supported)
    }
}
