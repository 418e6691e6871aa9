use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const TOOLS: [(&str, &str); 2] = [("yt-dlp", "STREAMLINE_YTDLP"), ("ffmpeg", "STREAMLINE_FFMPEG")];

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo always sets OUT_DIR"));
    let manifest_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").expect("cargo always sets CARGO_MANIFEST_DIR"),
    );
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let suffix = if target_os == "windows" { ".exe" } else { "" };

    for (name, var) in TOOLS {
        println!("cargo:rerun-if-env-changed={var}");

        let bundled = manifest_dir.join("bundle").join(format!("{name}{suffix}"));
        println!("cargo:rerun-if-changed={}", bundled.display());

        let source = env::var_os(var).map(PathBuf::from).unwrap_or(bundled);
        let destination = out_dir.join(name);

        if let Err(reason) = embed(&source, &destination) {
            println!(
                "cargo:warning={name} will not be embedded ({reason}); streamline will look for it on PATH at runtime. Set {var} or place the binary at bundle/{name}{suffix}."
            );
            fs::write(&destination, []).expect("failed to write empty placeholder into OUT_DIR");
        }
    }
}

fn embed(source: &Path, destination: &Path) -> Result<(), String> {
    if !source.is_file() {
        return Err(format!("{} does not exist", source.display()));
    }
    fs::copy(source, destination).map_err(|e| e.to_string())?;
    Ok(())
}
