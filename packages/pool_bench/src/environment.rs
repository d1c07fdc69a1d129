use std::env;

use crate::host_processor_count;

/// The compiler version string, captured by the build script.
const RUSTC_VERSION: &str = env!("POOL_BENCH_RUSTC_VERSION");

/// Facts about the host and toolchain that produced a set of measurements.
///
/// Captured once per run and shown in the report header.
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "plain data record, tests and callers construct it directly"
)]
pub struct Environment {
    /// Version of the Rust toolchain, e.g. `1.86.0`.
    pub rust_version: String,

    /// Name of the compiler implementation.
    pub compiler: String,

    /// Full version string reported by the compiler.
    pub compiler_version: String,

    /// Operating system name, e.g. `Linux`.
    pub os_name: String,

    /// Operating system version or build description.
    pub os_version: String,

    /// Processor architecture identifier, e.g. `x86_64`.
    pub processor: String,

    /// Number of active logical processors on the host.
    pub cpu_count: usize,
}

impl Environment {
    /// Captures the environment of the current process.
    #[must_use]
    pub fn capture() -> Self {
        let host = HostInfo::query();

        Self {
            rust_version: rust_version_from(RUSTC_VERSION),
            compiler: "rustc".to_string(),
            compiler_version: RUSTC_VERSION.to_string(),
            os_name: host.os_name,
            os_version: host.os_version,
            processor: host.machine,
            cpu_count: host_processor_count().get(),
        }
    }

    /// The facts as (caption, value) pairs, in display order.
    #[must_use]
    pub fn facts(&self) -> [(&'static str, String); 7] {
        [
            ("Rust Version", self.rust_version.clone()),
            ("Compiler", self.compiler.clone()),
            ("Compiler Version", self.compiler_version.clone()),
            ("Operating System", self.os_name.clone()),
            ("Operating System Version", self.os_version.clone()),
            ("Processor Version", self.processor.clone()),
            ("Number of CPUs", self.cpu_count.to_string()),
        ]
    }
}

/// Extracts `1.86.0` from `rustc 1.86.0 (05f9846f8 2025-03-31)`.
fn rust_version_from(rustc_version: &str) -> String {
    rustc_version
        .split_whitespace()
        .nth(1)
        .unwrap_or("unknown")
        .to_string()
}

struct HostInfo {
    os_name: String,
    os_version: String,
    machine: String,
}

impl HostInfo {
    #[cfg(unix)]
    fn query() -> Self {
        unix::uname().unwrap_or_else(Self::fallback)
    }

    #[cfg(not(unix))]
    fn query() -> Self {
        Self::fallback()
    }

    fn fallback() -> Self {
        Self {
            os_name: env::consts::OS.to_string(),
            os_version: "unknown".to_string(),
            machine: env::consts::ARCH.to_string(),
        }
    }
}

#[cfg(unix)]
mod unix {
    use std::ffi::CStr;
    use std::mem;

    use super::HostInfo;

    // Thin wrapper over the OS API, verified by the capture test on real hardware.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub(super) fn uname() -> Option<HostInfo> {
        // SAFETY: All zeroes is a valid utsname.
        let mut name: libc::utsname = unsafe { mem::zeroed() };

        // SAFETY: No safety requirements beyond passing a valid pointer.
        let result = unsafe { libc::uname(&raw mut name) };

        if result != 0 {
            return None;
        }

        Some(HostInfo {
            os_name: field(&name.sysname),
            os_version: field(&name.version),
            machine: field(&name.machine),
        })
    }

    fn field(raw: &[libc::c_char]) -> String {
        // SAFETY: uname() fills every field with a nul-terminated string.
        unsafe { CStr::from_ptr(raw.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}
