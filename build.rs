fn main() {
    // The ESP-IDF environment is only exported for device builds. Host builds
    // (tests, host-station) must not pull in the IDF toolchain.
    if let Ok(target) = std::env::var("TARGET") {
        if target.contains("xtensa") || target.ends_with("-espidf") {
            embuild::espidf::sysenv::output();
        }
    }
}
