fn main() {
    // Only the native backend needs the system OpenVG library
    if std::env::var_os("CARGO_FEATURE_NATIVE").is_some() {
        println!("cargo:rustc-link-lib=OpenVG");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
