//! TEAM_202: VFS Error Types
//!
//! Every resolution and handle operation returns [`VfsResult`]. The syscall
//! boundary turns a [`VfsError`] into a Linux errno and nothing else.

use core::fmt;

use linux_raw_sys::errno;

/// TEAM_202: VFS Error codes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VfsError {
    /// No such file or directory (ENOENT)
    NotFound,
    /// A path component or handle is not a directory (ENOTDIR)
    NotADirectory,
    /// Directory where a file was required (EISDIR)
    IsADirectory,
    /// Unbound or wrong-kind handle (EBADF)
    BadFd,
    /// The node has no operation table for this request (ENOSYS)
    NotImplemented,
    /// The driver does not support this request (EOPNOTSUPP)
    NotSupported,
    /// Symlink recursion or iteration bound exceeded (ELOOP)
    Loop,
    /// Name, link target or path buffer too long (ENAMETOOLONG)
    NameTooLong,
    /// Rename across volumes (EXDEV)
    CrossDevice,
    /// Invalid argument (EINVAL)
    InvalidArgument,
    /// I/O error, including short transfers where exact size was required (EIO)
    IoError,
    /// File exists (EEXIST)
    AlreadyExists,
    /// Directory not empty (ENOTEMPTY)
    DirectoryNotEmpty,
    /// Device or resource busy (EBUSY)
    Busy,
    /// Read-only file system (EROFS)
    ReadOnlyFs,
    /// Handle table full (EMFILE)
    TooManyOpenFiles,
    /// No such filesystem driver (ENODEV)
    NoDevice,
    /// Permission denied (EACCES)
    AccessDenied,
    /// Result does not fit the caller's buffer (ERANGE)
    OutOfRange,
    /// File too large (EFBIG)
    FileTooLarge,
}

impl VfsError {
    /// TEAM_470: Positive errno value
    pub const fn errno(self) -> u32 {
        match self {
            VfsError::NotFound => errno::ENOENT,
            VfsError::NotADirectory => errno::ENOTDIR,
            VfsError::IsADirectory => errno::EISDIR,
            VfsError::BadFd => errno::EBADF,
            VfsError::NotImplemented => errno::ENOSYS,
            VfsError::NotSupported => errno::EOPNOTSUPP,
            VfsError::Loop => errno::ELOOP,
            VfsError::NameTooLong => errno::ENAMETOOLONG,
            VfsError::CrossDevice => errno::EXDEV,
            VfsError::InvalidArgument => errno::EINVAL,
            VfsError::IoError => errno::EIO,
            VfsError::AlreadyExists => errno::EEXIST,
            VfsError::DirectoryNotEmpty => errno::ENOTEMPTY,
            VfsError::Busy => errno::EBUSY,
            VfsError::ReadOnlyFs => errno::EROFS,
            VfsError::TooManyOpenFiles => errno::EMFILE,
            VfsError::NoDevice => errno::ENODEV,
            VfsError::AccessDenied => errno::EACCES,
            VfsError::OutOfRange => errno::ERANGE,
            VfsError::FileTooLarge => errno::EFBIG,
        }
    }

    /// TEAM_202: Convert to POSIX errno value (negative)
    pub const fn to_errno(self) -> i64 {
        -(self.errno() as i64)
    }

    /// TEAM_202: Get error name
    pub const fn name(self) -> &'static str {
        match self {
            VfsError::NotFound => "ENOENT",
            VfsError::NotADirectory => "ENOTDIR",
            VfsError::IsADirectory => "EISDIR",
            VfsError::BadFd => "EBADF",
            VfsError::NotImplemented => "ENOSYS",
            VfsError::NotSupported => "EOPNOTSUPP",
            VfsError::Loop => "ELOOP",
            VfsError::NameTooLong => "ENAMETOOLONG",
            VfsError::CrossDevice => "EXDEV",
            VfsError::InvalidArgument => "EINVAL",
            VfsError::IoError => "EIO",
            VfsError::AlreadyExists => "EEXIST",
            VfsError::DirectoryNotEmpty => "ENOTEMPTY",
            VfsError::Busy => "EBUSY",
            VfsError::ReadOnlyFs => "EROFS",
            VfsError::TooManyOpenFiles => "EMFILE",
            VfsError::NoDevice => "ENODEV",
            VfsError::AccessDenied => "EACCES",
            VfsError::OutOfRange => "ERANGE",
            VfsError::FileTooLarge => "EFBIG",
        }
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            VfsError::NotFound => "No such file or directory",
            VfsError::NotADirectory => "Not a directory",
            VfsError::IsADirectory => "Is a directory",
            VfsError::BadFd => "Bad file descriptor",
            VfsError::NotImplemented => "Function not implemented",
            VfsError::NotSupported => "Operation not supported",
            VfsError::Loop => "Too many levels of symbolic links",
            VfsError::NameTooLong => "File name too long",
            VfsError::CrossDevice => "Invalid cross-device link",
            VfsError::InvalidArgument => "Invalid argument",
            VfsError::IoError => "I/O error",
            VfsError::AlreadyExists => "File exists",
            VfsError::DirectoryNotEmpty => "Directory not empty",
            VfsError::Busy => "Device or resource busy",
            VfsError::ReadOnlyFs => "Read-only file system",
            VfsError::TooManyOpenFiles => "Too many open files",
            VfsError::NoDevice => "No such device",
            VfsError::AccessDenied => "Permission denied",
            VfsError::OutOfRange => "Numerical result out of range",
            VfsError::FileTooLarge => "File too large",
        };
        write!(f, "{} ({})", msg, self.name())
    }
}

/// TEAM_202: Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;
