#![allow(dead_code)]

use assert_cmd::Command;
use axum::http::header;
use axum::routing::get;
use axum::Router;
use std::fs::File;
use std::path::Path;
use xz2::write::XzEncoder;

pub const LINUX_ARCHIVE_PATH: &str = "/releases/stable/linux/flutter_linux_3.22.1-stable.tar.xz";

/// The installer binary with the user's own configuration kept out of the way.
pub fn installer(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flutter-installer").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .env_remove("FLUTTER_INSTALLER_BASE_URL")
        .env_remove("FLUTTER_INSTALLER_INSTALL_DIR")
        .env_remove("FLUTTER_INSTALLER_BACKEND")
        .env_remove("FLUTTER_INSTALLER_HOST_OS")
        .env_remove("FLUTTER_INSTALLER_HOST_ARCH");
    cmd
}

/// A minimal Linux SDK archive: `flutter/bin/flutter`.
pub fn linux_sdk_archive(path: &Path) -> Vec<u8> {
    let encoder = XzEncoder::new(File::create(path).unwrap(), 6);
    let mut builder = tar::Builder::new(encoder);
    let body = b"#!/bin/sh\necho Flutter 3.22.1\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, "flutter/bin/flutter", &body[..])
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap();
    std::fs::read(path).unwrap()
}

/// Serves `archive` at the Linux release path and returns the base url.
pub async fn launch_release_server(archive: Vec<u8>) -> String {
    let app = Router::new().route(
        LINUX_ARCHIVE_PATH,
        get(move || {
            let archive = archive.clone();
            async move {
                (
                    [(header::LAST_MODIFIED, "Wed, 15 May 2024 18:00:00 GMT")],
                    archive,
                )
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}
