// Bake the target triple and cargo profile into `radiohub version --extended`.
fn main() {
    for (var, key) in [
        ("TARGET", "RADIOHUB_BUILD_TARGET"),
        ("PROFILE", "RADIOHUB_BUILD_PROFILE"),
    ] {
        if let Ok(value) = std::env::var(var) {
            println!("cargo:rustc-env={key}={value}");
        }
        println!("cargo:rerun-if-env-changed={var}");
    }
}
