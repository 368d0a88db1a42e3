use crate::common::fakes::FakeDownloader;
use ffwizard::toolchain::{
    Architecture, DownloadProgress, FetchError, LocateResult, OperatingSystem, PlatformTarget,
    ToolchainInstall, ensure_toolchain, fetch, locate,
};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const BUILD_DIR: &str = "ffmpeg-master-latest-win64-gpl";

/// In-memory zip with the given (path, contents) entries
fn zip_archive<N: AsRef<str>>(entries: &[(N, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, contents) in entries {
        writer.start_file(name.as_ref(), options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn windows_build() -> Vec<u8> {
    zip_archive(&[
        (format!("{}/bin/ffmpeg.exe", BUILD_DIR), "MZ ffmpeg"),
        (format!("{}/bin/ffprobe.exe", BUILD_DIR), "MZ ffprobe"),
        (format!("{}/bin/ffplay.exe", BUILD_DIR), "MZ ffplay"),
        (format!("{}/doc/README.txt", BUILD_DIR), "docs"),
        (format!("{}/LICENSE.txt", BUILD_DIR), "GPL"),
    ])
}

fn entries_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| e.path())
        .collect();
    found.sort();
    found
}

fn leftover_archives(dir: &Path) -> Vec<PathBuf> {
    entries_with_prefix(dir, "download-")
}

fn scratch_dirs(dir: &Path) -> Vec<PathBuf> {
    entries_with_prefix(dir, "extract-")
}

fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[cfg(unix)]
fn assert_executable(binary: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(binary).unwrap().permissions().mode();
    assert!(mode & 0o111 != 0, "{} is not executable", binary.display());
}

fn windows_x64() -> PlatformTarget {
    PlatformTarget::new(OperatingSystem::Windows, Architecture::X64)
}

#[test]
fn test_unsupported_platform_fails_without_network() {
    let temp = TempDir::new().unwrap();
    let downloader = FakeDownloader::serving(windows_build());
    let platform = PlatformTarget::from_names("plan9", "x86_64");

    let err = fetch(temp.path(), &platform, None, &downloader, &mut |_| {}).unwrap_err();
    assert!(matches!(err, FetchError::PlatformNotSupported { .. }));
    assert_eq!(downloader.calls.get(), 0);

    // A URL override does not make an unknown OS supported
    let err = ensure_toolchain(
        locate(&temp.path().join("ffmpeg"), &platform).unwrap(),
        &platform,
        Some("https://mirror.example/ffmpeg.zip"),
        &downloader,
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, FetchError::PlatformNotSupported { .. }));
    assert_eq!(downloader.calls.get(), 0);
}

#[test]
fn test_installed_toolchain_skips_download() {
    let temp = TempDir::new().unwrap();
    let platform = windows_x64();
    fs::write(temp.path().join("ffmpeg.exe"), b"MZ").unwrap();
    fs::write(temp.path().join("ffprobe.exe"), b"MZ").unwrap();

    let downloader = FakeDownloader::serving(windows_build());
    let located = locate(temp.path(), &platform).unwrap();
    let install = ensure_toolchain(located, &platform, None, &downloader, &mut |_| {}).unwrap();

    assert_eq!(downloader.calls.get(), 0);
    assert_eq!(install.ffmpeg, temp.path().join("ffmpeg.exe"));
    assert_eq!(install.ffprobe, temp.path().join("ffprobe.exe"));
}

#[test]
fn test_ensure_uses_the_located_install_as_is() {
    let temp = TempDir::new().unwrap();
    let platform = windows_x64();
    let install_dir = temp.path().join("never-created");
    let located = LocateResult {
        install: ToolchainInstall::expected(&install_dir, &platform),
        present: true,
    };

    let downloader = FakeDownloader::serving(windows_build());
    let install = ensure_toolchain(located, &platform, None, &downloader, &mut |_| {}).unwrap();

    // No second look at the disk, and nothing fetched
    assert_eq!(install.ffmpeg, install_dir.join("ffmpeg.exe"));
    assert_eq!(downloader.calls.get(), 0);
    assert!(!install_dir.exists());
}

#[test]
fn test_fetch_installs_flat_layout() {
    let temp = TempDir::new().unwrap();
    let install_dir = temp.path().join("ffmpeg");
    let downloader = FakeDownloader::serving(windows_build());
    let mut seen: Vec<DownloadProgress> = Vec::new();

    let install = ensure_toolchain(
        locate(&install_dir, &windows_x64()).unwrap(),
        &windows_x64(),
        None,
        &downloader,
        &mut |p| seen.push(p),
    )
    .unwrap();

    assert_eq!(downloader.calls.get(), 1);
    assert!(downloader.urls.borrow()[0].ends_with("win64-gpl.zip"));

    assert_eq!(fs::read(&install.ffmpeg).unwrap(), b"MZ ffmpeg");
    assert_eq!(fs::read(&install.ffprobe).unwrap(), b"MZ ffprobe");
    // Only the two binaries survive; the extracted build and archive are gone
    assert!(!install_dir.join(BUILD_DIR).exists());
    assert!(!install_dir.join("ffplay.exe").exists());
    assert!(leftover_archives(&install_dir).is_empty());
    assert!(scratch_dirs(&install_dir).is_empty());

    assert_eq!(seen.first().and_then(|p| p.fraction()), Some(0.0));
    assert_eq!(seen.last().and_then(|p| p.fraction()), Some(1.0));

    assert!(locate(&install_dir, &windows_x64()).unwrap().present);
}

#[cfg(unix)]
#[test]
fn test_fetch_marks_binaries_executable() {
    let temp = TempDir::new().unwrap();
    let platform = PlatformTarget::new(OperatingSystem::Linux, Architecture::X64);
    let archive = zip_archive(&[
        ("ffmpeg-n7.1-linux64-gpl/bin/ffmpeg", "#!/bin/sh\n"),
        ("ffmpeg-n7.1-linux64-gpl/bin/ffprobe", "#!/bin/sh\n"),
    ]);
    let downloader = FakeDownloader::serving(archive);

    let install = fetch(
        temp.path(),
        &platform,
        Some("https://mirror.example/ffmpeg-linux64.zip"),
        &downloader,
        &mut |_| {},
    )
    .unwrap();

    assert_eq!(
        downloader.urls.borrow().as_slice(),
        ["https://mirror.example/ffmpeg-linux64.zip"]
    );
    assert_executable(&install.ffmpeg);
    assert_executable(&install.ffprobe);
}

#[cfg(unix)]
#[test]
fn test_fetch_unpacks_linux_tarball() {
    use std::process::Command;

    let temp = TempDir::new().unwrap();
    let build = temp.path().join("build");
    fs::create_dir_all(build.join("ffmpeg-x/bin")).unwrap();
    fs::create_dir_all(build.join("ffmpeg-x/doc")).unwrap();
    fs::write(build.join("ffmpeg-x/bin/ffmpeg"), "#!/bin/sh\necho ffmpeg\n").unwrap();
    fs::write(build.join("ffmpeg-x/bin/ffprobe"), "#!/bin/sh\necho ffprobe\n").unwrap();
    fs::write(build.join("ffmpeg-x/doc/ffmpeg.html"), "<html></html>").unwrap();

    let tarball = temp.path().join("ffmpeg-x.tar.xz");
    let status = Command::new("tar")
        .arg("-cJf")
        .arg(&tarball)
        .arg("-C")
        .arg(&build)
        .arg("ffmpeg-x")
        .status()
        .unwrap();
    assert!(status.success());

    let platform = PlatformTarget::new(OperatingSystem::Linux, Architecture::X64);
    let install_dir = temp.path().join("ffmpeg");
    let downloader = FakeDownloader::serving(fs::read(&tarball).unwrap());

    let install = ensure_toolchain(
        locate(&install_dir, &platform).unwrap(),
        &platform,
        None,
        &downloader,
        &mut |_| {},
    )
    .unwrap();

    assert!(downloader.urls.borrow()[0].ends_with("linux64-gpl.tar.xz"));
    // The build tree, the scratch directory and the tarball are all gone
    assert_eq!(dir_listing(&install_dir), ["ffmpeg", "ffprobe"]);
    assert_eq!(fs::read_to_string(&install.ffmpeg).unwrap(), "#!/bin/sh\necho ffmpeg\n");
    assert_executable(&install.ffmpeg);
    assert_executable(&install.ffprobe);
}

#[cfg(unix)]
#[test]
fn test_fetch_macos_binaries_from_separate_archives() {
    let temp = TempDir::new().unwrap();
    let platform = PlatformTarget::new(OperatingSystem::MacOs, Architecture::X64);
    let downloader = FakeDownloader::routes([
        ("ffmpeg71intel", zip_archive(&[("ffmpeg", "ffmpeg binary")])),
        (
            "ffprobe71intel",
            zip_archive(&[("ffprobe", "ffprobe binary"), ("__MACOSX/._ffprobe", "meta")]),
        ),
    ]);

    let install = ensure_toolchain(
        locate(temp.path(), &platform).unwrap(),
        &platform,
        None,
        &downloader,
        &mut |_| {},
    )
    .unwrap();

    assert_eq!(downloader.calls.get(), 2);
    assert_eq!(fs::read(&install.ffmpeg).unwrap(), b"ffmpeg binary");
    assert_eq!(fs::read(&install.ffprobe).unwrap(), b"ffprobe binary");
    assert_eq!(dir_listing(temp.path()), ["ffmpeg", "ffprobe"]);
    assert_executable(&install.ffmpeg);
    assert_executable(&install.ffprobe);
}

#[test]
fn test_macos_failed_second_download_leaves_scratch_dir() {
    let temp = TempDir::new().unwrap();
    let platform = PlatformTarget::new(OperatingSystem::MacOs, Architecture::Arm64);
    let downloader =
        FakeDownloader::routes([("ffmpeg80arm", zip_archive(&[("ffmpeg", "ffmpeg binary")]))]);

    let err = fetch(temp.path(), &platform, None, &downloader, &mut |_| {}).unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 404, .. }), "{:?}", err);
    assert_eq!(downloader.calls.get(), 2);
    assert!(leftover_archives(temp.path()).is_empty());
    let scratch = scratch_dirs(temp.path());
    assert_eq!(scratch.len(), 1);
    assert!(scratch[0].join("ffmpeg").exists());
    assert!(!temp.path().join("ffmpeg").exists());
}

#[test]
fn test_unexpected_layout_deletes_archive_only() {
    let temp = TempDir::new().unwrap();
    let archive = zip_archive(&[("tools/bin/ffmpeg.exe", "MZ"), ("tools/bin/ffprobe.exe", "MZ")]);
    let downloader = FakeDownloader::serving(archive);

    let err = fetch(temp.path(), &windows_x64(), None, &downloader, &mut |_| {}).unwrap_err();

    assert!(matches!(err, FetchError::LayoutNotFound { .. }), "{:?}", err);
    assert!(leftover_archives(temp.path()).is_empty());
    // Extracted files are left where they are
    let scratch = scratch_dirs(temp.path());
    assert_eq!(scratch.len(), 1);
    assert!(scratch[0].join("tools/bin/ffmpeg.exe").exists());
}

#[test]
fn test_missing_inspector_is_reported() {
    let temp = TempDir::new().unwrap();
    let archive = zip_archive(&[(format!("{}/bin/ffmpeg.exe", BUILD_DIR), "MZ")]);
    let downloader = FakeDownloader::serving(archive);

    let err = fetch(temp.path(), &windows_x64(), None, &downloader, &mut |_| {}).unwrap_err();

    match err {
        FetchError::BinaryMissing { name, .. } => assert_eq!(name, "ffprobe.exe"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(leftover_archives(temp.path()).is_empty());
}

#[test]
fn test_http_failure_surfaces() {
    let temp = TempDir::new().unwrap();
    let downloader = FakeDownloader::not_found();

    let located = locate(temp.path(), &windows_x64()).unwrap();
    let err = ensure_toolchain(located, &windows_x64(), None, &downloader, &mut |_| {})
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 404, .. }));
    assert!(err.to_string().contains("HTTP 404"));
    assert!(leftover_archives(temp.path()).is_empty());
}
