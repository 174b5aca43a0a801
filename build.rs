// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=VIDOUT_VERSION");

    // Packagers can pin the version string without a git checkout
    let version = match std::env::var("VIDOUT_VERSION") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => describe_version(),
    };

    println!("cargo::rustc-env=VIDOUT_BUILD_VERSION={}", version);
}

/// Build a version string from `git describe`.
///
/// - exact tag `v0.1.0` gives `0.1.0+abcdef1`
/// - `v0.1.0-5-gabcdef1` gives `0.1.0+5.abcdef1`
/// - no git at all gives the crate version
fn describe_version() -> String {
    let pkg_version = env!("CARGO_PKG_VERSION").to_string();

    let Some(described) = git(&["describe", "--tags", "--always", "--match", "v*"]) else {
        return pkg_version;
    };
    let described = described.strip_prefix('v').unwrap_or(&described);

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [hash, commits, base] => {
            let hash = hash.strip_prefix('g').unwrap_or(hash);
            format!("{}+{}.{}", base, commits, hash)
        }
        _ if described.contains('.') => match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) => format!("{}+{}", described, hash),
            None => described.to_string(),
        },
        // Untagged repository: describe only printed a hash
        _ => format!("{}+{}", pkg_version, described),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
