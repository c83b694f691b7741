//! Build script for storefront crate.
//!
//! Fingerprints the stylesheet and scripts so templates can append
//! `?v=<hash>` and the assets can be cached forever.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Assets to fingerprint and the compile-time variable each hash lands in.
const ASSETS: [(&str, &str); 2] = [
    ("static/css/main.css", "CSS_HASH"),
    ("static/js/app.js", "JS_HASH"),
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");

    for (relative, var) in ASSETS {
        let path = Path::new(&manifest_dir).join(relative);
        println!("cargo:rerun-if-changed={}", path.display());
        println!("cargo:rustc-env={var}={}", short_hash(&path));
    }
}

/// First 8 hex chars of the file's SHA-256, or `dev` when it cannot be read.
fn short_hash(path: &Path) -> String {
    match fs::read(path) {
        Ok(content) => {
            let digest = format!("{:x}", Sha256::digest(&content));
            digest[..8].to_string()
        }
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", path.display());
            "dev".to_string()
        }
    }
}
