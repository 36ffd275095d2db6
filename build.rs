//! Build script for deploy-showcase.
//!
//! Records the version of the compiler building the service so `/health` can
//! report the toolchain actually in use.

use std::process::Command;

fn main() {
    let rustc_version = get_rustc_version().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=SHOWCASE_RUSTC_VERSION={}", rustc_version);

    println!("cargo:rerun-if-env-changed=RUSTC");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Semantic version of the compiler Cargo is using, e.g. `1.82.0`.
fn get_rustc_version() -> Option<String> {
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let output = Command::new(rustc).arg("--version").output().ok()?;

    if !output.status.success() {
        return None;
    }
    // "rustc 1.82.0 (f6e511eec 2024-10-15)"
    let stdout = String::from_utf8(output.stdout).ok()?;
    stdout.split_whitespace().nth(1).map(str::to_string)
}
