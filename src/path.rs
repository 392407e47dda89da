// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Logical-name-to-path resolution.
//!
//! Mirrors the environment-driven directory override used throughout the
//! teacher repo's `StorageConfig::base_path` (there expressed as a TOML
//! field; here as an environment variable, since a log engine has no
//! per-process config file of its own).

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable consulted for the default log directory.
pub const DEFAULT_DIR_ENV: &str = "RINGLOG_DIR";

/// Default suffix appended to logical names that carry no extension.
pub const DEFAULT_SUFFIX: &str = ".rlog";

/// Resolve a logical log name to a filesystem path.
///
/// If `name` is already an absolute or relative path containing a
/// directory component, it is used as-is (after appending `suffix` when
/// the name has no extension). Otherwise the directory named by
/// `env_var` is consulted; if unset, the current directory is used.
pub fn resolve(name: &str, suffix: &str, env_var: &str) -> PathBuf {
    let named = Path::new(name);

    let with_suffix = if named.extension().is_some() {
        named.to_path_buf()
    } else {
        let mut s = named.as_os_str().to_owned();
        s.push(suffix);
        PathBuf::from(s)
    };

    if with_suffix.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
        return with_suffix;
    }

    match env::var_os(env_var) {
        Some(dir) if !dir.is_empty() => Path::new(&dir).join(with_suffix),
        _ => with_suffix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_gets_suffix_and_no_dir_override() {
        // SAFETY: test-local env var, no other test observes RINGLOG_DIR_TEST1.
        unsafe { env::remove_var("RINGLOG_DIR_TEST1") };
        let p = resolve("myapp", ".rlog", "RINGLOG_DIR_TEST1");
        assert_eq!(p, PathBuf::from("myapp.rlog"));
    }

    #[test]
    fn bare_name_honors_dir_override() {
        unsafe { env::set_var("RINGLOG_DIR_TEST2", "/var/log/rlog") };
        let p = resolve("myapp", ".rlog", "RINGLOG_DIR_TEST2");
        assert_eq!(p, PathBuf::from("/var/log/rlog/myapp.rlog"));
        unsafe { env::remove_var("RINGLOG_DIR_TEST2") };
    }

    #[test]
    fn name_with_extension_is_untouched() {
        let p = resolve("myapp.bin", ".rlog", "RINGLOG_DIR_TEST3");
        assert_eq!(p, PathBuf::from("myapp.bin"));
    }

    #[test]
    fn name_with_directory_component_ignores_env() {
        unsafe { env::set_var("RINGLOG_DIR_TEST4", "/should/not/be/used") };
        let p = resolve("./logs/myapp", ".rlog", "RINGLOG_DIR_TEST4");
        assert_eq!(p, PathBuf::from("./logs/myapp.rlog"));
        unsafe { env::remove_var("RINGLOG_DIR_TEST4") };
    }
}
