//! Pseudo-terminal pair used as the debuggee's controlling terminal.
//!
//! The primary side stays with this process and is read by the
//! debuggee-output loop. The secondary side's path is handed to the
//! debugger (`--tty`), which opens it for the program being debugged.
//! This process also keeps the secondary side open: while at least one
//! secondary descriptor exists, reads on the primary side block instead of
//! failing, so the output loop survives until the debuggee first opens the
//! terminal.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::fcntl::OFlag;
use nix::pty::{grantpt, posix_openpt, ptsname_r, unlockpt, PtyMaster};
use tracing::debug;

use crate::Result;

/// An allocated pty pair.
#[derive(Debug)]
pub struct Pty {
    /// Primary side, read by the debuggee-output loop.
    pub primary: PtyMaster,
    /// Secondary side, held open until teardown.
    pub secondary: File,
    /// File-system path of the secondary side.
    pub secondary_path: PathBuf,
}

impl Pty {
    /// Allocate a new pty pair.
    ///
    /// Both descriptors are close-on-exec so they are not inherited by the
    /// debugger; it opens the secondary side by path instead.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`](crate::AppError::Io) if the OS refuses to
    /// allocate or unlock a pty.
    pub fn open() -> Result<Self> {
        let primary = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY | OFlag::O_CLOEXEC)?;
        grantpt(&primary)?;
        unlockpt(&primary)?;
        let secondary_path = PathBuf::from(ptsname_r(&primary)?);

        let secondary = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_NOCTTY.bits())
            .open(&secondary_path)?;

        debug!(path = %secondary_path.display(), "pty allocated");

        Ok(Self {
            primary,
            secondary,
            secondary_path,
        })
    }

    /// Path to pass to the debugger as the debuggee's terminal.
    #[must_use]
    pub fn secondary_path(&self) -> &Path {
        &self.secondary_path
    }
}
