//! TEAM_470: Path resolution and directory name tests

use alloc::sync::Arc;

use super::{flags, setup, setup_with};
use crate::config::VfsConfig;
use crate::error::VfsError;
use crate::file::OpenFlags;
use crate::path::LookupFlags;

fn tree() -> super::Fixture {
    let fx = setup();
    fx.mkdir("/a");
    fx.mkdir("/a/b");
    fx.mkdir("/a/b/c");
    fx.write_file("/a/b/c/f", b"data");
    fx
}

/// Tests: [R1] "/" is the root, [R2] its name is "/"
#[test]
fn test_root_identity() {
    let fx = setup();
    let root = fx.resolve("/").unwrap();
    assert!(Arc::ptr_eq(&root, fx.vfs.root_inode())); // [R1]
    assert!(Arc::ptr_eq(&fx.resolve("//").unwrap(), &root));
    assert_eq!(fx.vfs.directory_name(&fx.task, &root, 4096).unwrap(), "/"); // [R2]
    assert_eq!(
        fx.vfs.directory_name(&fx.task, &root, 0),
        Err(VfsError::NameTooLong)
    );
}

/// Tests: [R3] whole-path lookup equals component-by-component lookup,
/// [R4] the parent split names the last component
#[test]
fn test_decomposition_matches_stepwise() {
    let fx = tree();
    let whole = fx.resolve("/a/b/c/f").unwrap();

    let mut current = fx.vfs.root_inode().clone();
    for name in ["a", "b", "c", "f"] {
        current = fx
            .vfs
            .locate_by_name(&fx.task, &current, name, LookupFlags::FULL)
            .unwrap();
    }
    assert!(Arc::ptr_eq(&whole, &current)); // [R3]

    let (parent, name) = fx.vfs.locate_parent(&fx.task, None, "/a/b/c/f").unwrap();
    assert!(Arc::ptr_eq(&parent, &fx.resolve("/a/b/c").unwrap())); // [R4]
    assert_eq!(name, "f");

    let (parent, name) = fx.vfs.locate_parent(&fx.task, None, "/a/b/").unwrap();
    assert!(Arc::ptr_eq(&parent, &fx.resolve("/a/b").unwrap()));
    assert_eq!(name, "");
}

/// Tests: repeated separators, "." and ".." (including above the root)
#[test]
fn test_dot_components() {
    let fx = tree();
    let c = fx.resolve("/a/b/c").unwrap();
    assert!(Arc::ptr_eq(&fx.resolve("//a///b/c//").unwrap(), &c));
    assert!(Arc::ptr_eq(&fx.resolve("/a/b/../b/./c").unwrap(), &c));
    assert!(Arc::ptr_eq(&fx.resolve("/..").unwrap(), fx.vfs.root_inode()));
    assert!(Arc::ptr_eq(
        &fx.resolve("/../../a").unwrap(),
        &fx.resolve("/a").unwrap()
    ));
}

/// Tests: [R5] intermediate file gives NotADirectory, [R6] missing names give NotFound
#[test]
fn test_resolution_errors() {
    let fx = tree();
    assert_eq!(fx.resolve("/a/b/c/f/x").err(), Some(VfsError::NotADirectory)); // [R5]
    assert_eq!(fx.resolve("/a/b/c/f/.").err(), Some(VfsError::NotADirectory));
    assert_eq!(fx.resolve("/missing").err(), Some(VfsError::NotFound)); // [R6]
    assert_eq!(fx.resolve("/missing/x").err(), Some(VfsError::NotFound));
}

/// Tests: relative paths start at the cwd, chdir/getcwd agree
#[test]
fn test_relative_to_cwd() {
    let fx = tree();
    fx.vfs.chdir(&fx.task, "/a/b").unwrap();
    assert_eq!(fx.cwd(), "/a/b");
    assert!(Arc::ptr_eq(&fx.resolve("c").unwrap(), &fx.resolve("/a/b/c").unwrap()));
    assert!(Arc::ptr_eq(&fx.resolve("../b").unwrap(), &fx.resolve("/a/b").unwrap()));
    assert_eq!(fx.read_file("c/f"), b"data");

    assert_eq!(fx.vfs.chdir(&fx.task, "c/f"), Err(VfsError::NotADirectory));
    assert_eq!(fx.cwd(), "/a/b");
    fx.vfs.chdir(&fx.task, "..").unwrap();
    assert_eq!(fx.cwd(), "/a");
}

/// Tests: a directory handle serves as the base, fchdir, path of a handle
#[test]
fn test_base_handle() {
    let fx = tree();
    let dir = fx.open("/a/b", OpenFlags::O_RDONLY | OpenFlags::O_DIRECTORY).unwrap();
    let stat = fx.vfs.stat(&fx.task, Some(dir), "c/f").unwrap();
    assert_eq!(stat.ino, fx.resolve("/a/b/c/f").unwrap().ino());
    assert_eq!(fx.vfs.get_directory_path(&fx.task, dir, 4096).unwrap(), "/a/b");

    let file = fx.open("/a/b/c/f", OpenFlags::O_RDONLY).unwrap();
    assert_eq!(
        fx.vfs.stat(&fx.task, Some(file), "x").err(),
        Some(VfsError::NotADirectory)
    );
    assert_eq!(
        fx.vfs.get_directory_path(&fx.task, file, 4096),
        Err(VfsError::NotADirectory)
    );

    fx.vfs.fchdir(&fx.task, dir).unwrap();
    assert_eq!(fx.cwd(), "/a/b");
    assert_eq!(fx.vfs.fchdir(&fx.task, file), Err(VfsError::NotADirectory));
}

/// Tests: [R7] capacity bound on reconstructed names, [R8] O_PATH opens directories as bases
#[test]
fn test_directory_name_capacity() {
    let fx = tree();
    let c = fx.resolve("/a/b/c").unwrap();
    assert_eq!(fx.vfs.directory_name(&fx.task, &c, 6).unwrap(), "/a/b/c");
    assert_eq!(
        fx.vfs.directory_name(&fx.task, &c, 5),
        Err(VfsError::NameTooLong)
    ); // [R7]

    let path = fx
        .vfs
        .open(&fx.task, None, "/a", flags(OpenFlags::O_PATH), 0)
        .unwrap();
    assert!(fx.vfs.stat(&fx.task, Some(path), "b/c").is_ok()); // [R8]
}

/// Tests: the configured path_max caps every caller's capacity
#[test]
fn test_path_max_caps_names() {
    let fx = setup_with(VfsConfig {
        path_max: 4,
        ..VfsConfig::default()
    });
    fx.mkdir("/ab");
    fx.mkdir("/ab/cd");
    let ab = fx.resolve("/ab").unwrap();
    assert_eq!(fx.vfs.directory_name(&fx.task, &ab, 4096).unwrap(), "/ab");
    let cd = fx.resolve("/ab/cd").unwrap();
    assert_eq!(
        fx.vfs.directory_name(&fx.task, &cd, 4096),
        Err(VfsError::NameTooLong)
    );

    fx.vfs.chdir(&fx.task, "/ab/cd").unwrap();
    let mut buf = [0u8; 64];
    assert_eq!(
        crate::syscall::sys_getcwd(&fx.vfs, &fx.task, &mut buf),
        Err(linux_raw_sys::errno::ERANGE)
    );
}

/// Tests: names that vanish while a directory is the cwd are reported
#[test]
fn test_removed_cwd() {
    let fx = tree();
    fx.vfs.chdir(&fx.task, "/a/b/c").unwrap();
    fx.vfs.unlink(&fx.task, None, "/a/b/c/f").unwrap();
    fx.vfs.remove_directory(&fx.task, None, "/a/b/c").unwrap();
    // The removed directory still names its old parent, which no longer lists it
    assert_eq!(
        fx.vfs.getcwd(&fx.task, 4096),
        Err(VfsError::NotFound)
    );
}
