//! Emits hints for locating FFmpeg when building on Windows.
//!
//! `ffmpeg-next` discovers FFmpeg through `FFMPEG_DIR`, pkg-config, or
//! vcpkg. On Unix pkg-config usually just works; on Windows an unset
//! `FFMPEG_DIR` is the most common cause of link failures, so point at a
//! vcpkg install when one can be found.

use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let building_for_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !building_for_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match vcpkg_install_dir() {
        None => warn("FFMPEG_DIR is not set; install FFmpeg with vcpkg and set VCPKG_ROOT or FFMPEG_DIR"),
        Some(install) if install.exists() => {
            warn(&format!(
                "using vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to silence this warning",
                install.display()
            ));
            if env::var_os("VCPKGRS_DYNAMIC").is_none() {
                warn("dynamic vcpkg FFmpeg builds also need VCPKGRS_DYNAMIC=1");
            }
        }
        Some(install) => warn(&format!(
            "VCPKG_ROOT is set but {} does not exist",
            install.display()
        )),
    }
}

fn vcpkg_install_dir() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn warn(message: &str) {
    println!("cargo:warning={message}");
}
