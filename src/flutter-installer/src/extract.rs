use crate::release::ArchiveFormat;
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tar::Archive;
use tracing::debug;
use xz2::read::XzDecoder;
use zip::ZipArchive;

/// Unpacks a downloaded archive into a directory.
pub trait Extractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<()>;
}

/// Reads archives in-process.
pub struct NativeExtractor;

impl Extractor for NativeExtractor {
    fn extract(&self, archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<()> {
        fs::create_dir_all(dest)?;
        match format {
            ArchiveFormat::Zip => extract_zip(archive, dest),
            ArchiveFormat::TarXz => extract_tar_xz(archive, dest),
        }
        .with_context(|| format!("failed to extract {}", archive.display()))
    }
}

fn extract_tar_xz(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut archive = Archive::new(XzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.unpack(dest)?;
    Ok(())
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut archive = ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(path) => path.to_path_buf(),
            None => {
                debug!(name = entry.name(), "skipping zip entry outside the destination");
                continue;
            }
        };
        let outpath = dest.join(&relative);

        if entry.is_dir() {
            ensure_no_symlink_in(dest, &relative)?;
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = relative.parent() {
            ensure_no_symlink_in(dest, parent)?;
            fs::create_dir_all(dest.join(parent))?;
        }
        if outpath.symlink_metadata().is_ok_and(|meta| meta.file_type().is_symlink()) {
            fs::remove_file(&outpath)?;
        }

        // macOS releases ship framework symlinks, stored as entries whose body is the target
        #[cfg(unix)]
        {
            const S_IFMT: u32 = 0o170000;
            const S_IFLNK: u32 = 0o120000;
            if entry.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
                let mut target = String::new();
                io::Read::read_to_string(&mut entry, &mut target)?;
                check_link_target(&relative, Path::new(&target))?;
                if outpath.symlink_metadata().is_ok() {
                    fs::remove_file(&outpath)?;
                }
                std::os::unix::fs::symlink(target, &outpath)?;
                continue;
            }
        }

        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode & 0o7777))?;
            }
        }
    }
    Ok(())
}

/// Fails if any prefix of `relative` below `dest` is an existing symlink.
fn ensure_no_symlink_in(dest: &Path, relative: &Path) -> Result<()> {
    let mut current = dest.to_path_buf();
    for component in relative.components() {
        current.push(component);
        if current
            .symlink_metadata()
            .is_ok_and(|meta| meta.file_type().is_symlink())
        {
            bail!(
                "refusing to extract {} through symlink {}",
                relative.display(),
                current.display()
            );
        }
    }
    Ok(())
}

/// A link target must be relative and, resolved from the link's directory, stay inside the
/// destination. `..` is only allowed as a leading run so it never climbs out of another link.
fn check_link_target(link: &Path, target: &Path) -> Result<()> {
    let base = link.parent().unwrap_or_else(|| Path::new(""));
    let mut depth = 0usize;
    for component in base.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    let mut seen_normal = false;
    for component in target.components() {
        match component {
            Component::Normal(_) => {
                seen_normal = true;
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir if !seen_normal && depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => bail!(
                "symlink {} points outside the destination: {}",
                link.display(),
                target.display()
            ),
        }
    }
    Ok(())
}

/// Delegates to the host's `unzip` and `tar`.
pub struct SystemExtractor;

impl SystemExtractor {
    fn tool(name: &str) -> Result<PathBuf> {
        which::which(name).with_context(|| format!("{name} was not found on PATH"))
    }
}

impl Extractor for SystemExtractor {
    fn extract(&self, archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<()> {
        fs::create_dir_all(dest)?;

        let mut command = match format {
            ArchiveFormat::Zip => {
                let mut command = Command::new(Self::tool("unzip")?);
                command.arg("-q").arg("-o").arg(archive).arg("-d").arg(dest);
                command
            }
            ArchiveFormat::TarXz => {
                let mut command = Command::new(Self::tool("tar")?);
                command.arg("xf").arg(archive).arg("-C").arg(dest);
                command
            }
        };

        debug!(?command, "running extractor");
        let output = command
            .output()
            .with_context(|| format!("failed to run {:?}", command.get_program()))?;

        if !output.status.success() {
            bail!(
                "{} exited with status {}: {}",
                command.get_program().to_string_lossy(),
                output
                    .status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |code| code.to_string()),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
