fn main() {
    // ESP-IDF build plumbing is only meaningful when cross-compiling the
    // firmware image; host builds (tests, simulation) skip it.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
