use std::{env, path::Path};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "PKG_CONFIG_PATH", "VCPKG_ROOT", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // ffmpeg-sys-next finds FFmpeg through pkg-config everywhere except on
    // Windows, where it needs FFMPEG_DIR.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!(
            "cargo:warning=utahframe needs FFmpeg development libraries; set FFMPEG_DIR to an FFmpeg install (for example a vcpkg installed/<triplet> directory)."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = Path::new(&vcpkg_root).join("installed").join(&triplet);
    if candidate.join("include").join("libavcodec").exists() {
        println!(
            "cargo:warning=FFMPEG_DIR is not set; found FFmpeg headers under {}. Export FFMPEG_DIR={} if linking fails.",
            candidate.display(),
            candidate.display(),
        );
    } else {
        println!(
            "cargo:warning=FFMPEG_DIR is not set and no vcpkg FFmpeg install exists at {}.",
            candidate.display(),
        );
    }
}
