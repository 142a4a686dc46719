// src/build/tools.rs

//! Wrappers around the external tools the builder drives: `tar`, `patch`,
//! `cp`, `rsync`, `file`, `strip`.
//!
//! Every invocation is an argv vector; recipe-controlled strings never pass
//! through a shell here. Only recipe *steps* get shell treatment, and that
//! is explicit in the builder.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Run a prepared command, mapping failure onto `Error::Subprocess`.
fn run(mut command: Command, tool: &str) -> Result<()> {
    debug!("running {:?}", command);
    let output = command.output().map_err(|e| Error::Subprocess {
        tool: tool.to_string(),
        status: -1,
        detail: e.to_string(),
    })?;

    if !output.status.success() {
        let mut detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        detail.truncate(512);
        return Err(Error::Subprocess {
            tool: tool.to_string(),
            status: output.status.code().unwrap_or(-1),
            detail,
        });
    }
    Ok(())
}

/// Extract an archive into `dest`, stripping the single leading path
/// component upstream tarballs carry.
pub fn extract_stripped(archive: &Path, dest: &Path) -> Result<()> {
    let mut cmd = Command::new("tar");
    cmd.arg("-C")
        .arg(dest)
        .arg("-xf")
        .arg(archive)
        .arg("--strip-components=1");
    run(cmd, "tar")
}

/// Apply a unified diff inside `source_dir` with strip level 1.
pub fn apply_patch(source_dir: &Path, patch: &Path) -> Result<()> {
    let mut cmd = Command::new("patch");
    cmd.arg("-p1").arg("-i").arg(patch).current_dir(source_dir);
    run(cmd, "patch")
}

/// Mirror the contents of `src` into `dest` preserving attributes
/// (`cp -a src/. dest/`).
pub fn mirror_tree(src: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    let mut cmd = Command::new("cp");
    cmd.arg("-a").arg(src.join(".")).arg(dest);
    run(cmd, "cp")
}

/// Pack a directory's contents into a zstd-compressed tarball.
pub fn pack_zstd(dir: &Path, archive: &Path) -> Result<()> {
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut cmd = Command::new("tar");
    cmd.arg("-C")
        .arg(dir)
        .arg("-I")
        .arg("zstd")
        .arg("-cpf")
        .arg(archive)
        .arg(".");
    run(cmd, "tar")
}

/// Extract a zstd-compressed tarball over `root`, preserving permissions.
pub fn unpack_zstd(archive: &Path, root: &Path) -> Result<()> {
    let mut cmd = Command::new("tar");
    cmd.arg("-C")
        .arg(root)
        .arg("-I")
        .arg("zstd")
        .arg("-xpf")
        .arg(archive);
    run(cmd, "tar")
}

/// Archive one subtree of `root` (e.g. `usr`) into a zstd tarball.
pub fn archive_subtree(root: &Path, subtree: &str, archive: &Path) -> Result<()> {
    if let Some(parent) = archive.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut cmd = Command::new("tar");
    cmd.arg("-C")
        .arg(root)
        .arg("-I")
        .arg("zstd")
        .arg("-cpf")
        .arg(archive)
        .arg(subtree);
    run(cmd, "tar")
}

/// Mirror a pkgroot onto the live root: hard links, ACLs and xattrs
/// preserved, files absent from the source deleted.
pub fn rsync_mirror(pkgroot: &Path, root: &Path) -> Result<()> {
    // rsync distinguishes "dir" from "dir/"; the trailing slash mirrors
    // contents rather than the directory itself.
    let mut src = OsString::from(pkgroot.as_os_str());
    src.push("/");
    let mut cmd = Command::new("rsync");
    cmd.arg("-aHAX").arg("--delete").arg(src).arg(root);
    run(cmd, "rsync")
}

/// Probe whether a file is an ELF object, via the external file-typer.
pub fn is_elf(path: &Path) -> bool {
    Command::new("file")
        .arg("-b")
        .arg(path)
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains("ELF"))
        .unwrap_or(false)
}

/// Strip symbols from a binary.
pub fn strip_file(path: &Path) -> Result<()> {
    let mut cmd = Command::new("strip");
    cmd.arg("--strip-all").arg(path);
    run(cmd, "strip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn have(tool: &str) -> bool {
        Command::new(tool)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_mirror_tree() {
        if !have("cp") {
            eprintln!("skipping: cp not available");
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub/file"), b"content").unwrap();

        mirror_tree(&src, &dest).unwrap();
        assert_eq!(fs::read(dest.join("sub/file")).unwrap(), b"content");
    }

    #[test]
    fn test_extract_strips_leading_component() {
        if !have("tar") {
            eprintln!("skipping: tar not available");
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let tree = tmp.path().join("pkg-1.0");
        fs::create_dir_all(tree.join("src")).unwrap();
        fs::write(tree.join("src/main.c"), b"int main;").unwrap();

        let archive = tmp.path().join("pkg.tar");
        let status = Command::new("tar")
            .arg("-C")
            .arg(tmp.path())
            .arg("-cf")
            .arg(&archive)
            .arg("pkg-1.0")
            .status()
            .unwrap();
        assert!(status.success());

        let work = tmp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        extract_stripped(&archive, &work).unwrap();
        // pkg-1.0/ prefix is gone
        assert!(work.join("src/main.c").exists());
    }

    #[test]
    fn test_failed_tool_reports_status() {
        if !have("tar") {
            eprintln!("skipping: tar not available");
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let err = extract_stripped(&tmp.path().join("missing.tar"), tmp.path()).unwrap_err();
        match err {
            Error::Subprocess { tool, status, .. } => {
                assert_eq!(tool, "tar");
                assert_ne!(status, 0);
            }
            other => panic!("expected Subprocess error, got {:?}", other),
        }
    }

    #[test]
    fn test_is_elf_on_text_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("script");
        fs::write(&path, b"#!/bin/sh\necho hi\n").unwrap();
        // Either file(1) is present and says "not ELF", or the probe
        // degrades to false.
        assert!(!is_elf(&path));
    }
}
