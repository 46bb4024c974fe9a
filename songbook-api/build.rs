//! Build script for songbook-api
//!
//! Stamps the binary with the identification logged at start-up:
//! `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE`.
//!
//! Builds outside a git checkout (container images, source tarballs) can
//! pass the revision in `SONGBOOK_GIT_HASH`. A checkout with uncommitted
//! changes gets a `-dirty` suffix.

use std::process::Command;

const GIT_HASH_OVERRIDE: &str = "SONGBOOK_GIT_HASH";

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn git_hash() -> String {
    if let Some(hash) = std::env::var(GIT_HASH_OVERRIDE)
        .ok()
        .filter(|h| !h.trim().is_empty())
    {
        return hash.trim().to_string();
    }

    match git(&["rev-parse", "--short=8", "HEAD"]) {
        Some(hash) => {
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .is_some_and(|status| !status.is_empty());
            if dirty {
                format!("{}-dirty", hash)
            } else {
                hash
            }
        }
        None => "unknown".to_string(),
    }
}

fn main() {
    // Any rerun directive replaces cargo's default of rerunning on package changes
    println!("cargo:rerun-if-env-changed={}", GIT_HASH_OVERRIDE);
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=build.rs");

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
}
