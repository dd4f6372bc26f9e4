fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Gather build-time information for the command-line front end.
    built::write_built_file().expect("Failed to acquire build-time information");
}
