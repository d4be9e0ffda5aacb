//! Embeds a build number into the version string shown by `--version` and the header.
//! `GHD_BUILD_NUMBER` wins over the `BUILD_NUMBER` file; both fall back to "0".

fn main() {
    println!("cargo:rerun-if-changed=BUILD_NUMBER");
    println!("cargo:rerun-if-env-changed=GHD_BUILD_NUMBER");

    let build_number = std::env::var("GHD_BUILD_NUMBER")
        .ok()
        .or_else(|| std::fs::read_to_string("BUILD_NUMBER").ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "0".to_string());

    println!("cargo:rustc-env=BUILD_NUMBER={build_number}");
}
