use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let (Ok(crate_dir), Ok(out_dir)) = (env::var("CARGO_MANIFEST_DIR"), env::var("OUT_DIR")) else {
        return;
    };

    // Header generation is best-effort; a failure must not break the library build.
    let bindings = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("SCHLUND_FFI_H")
        .with_cpp_compat(true)
        .generate();
    match bindings {
        Ok(bindings) => {
            bindings.write_to_file(PathBuf::from(out_dir).join("schlund_ffi.h"));
        }
        Err(e) => println!("cargo:warning=unable to generate C header: {e}"),
    }
}
