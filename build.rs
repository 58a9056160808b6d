//! # Build Script
//!
//! Embeds the Windows Application Manifest (`app.manifest`) into the final executable.
//!
//! The manifest controls:
//! - DPI Awareness, so the fixed-size window is not blurred on scaled displays.
//! - `asInvoker` execution level; building an EXE never needs elevation.
//! - Windows Version Compatibility (identifying as Win10/11 compatible).

fn main() {
    println!("cargo:rerun-if-changed=app.manifest");
    // If embedding fails the app still builds, just without the manifest.
    let _ = embed_resource::compile("app.manifest", embed_resource::NONE);
}
