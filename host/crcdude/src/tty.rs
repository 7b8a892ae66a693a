use color_eyre::{eyre, Result};
use eyre::Context;
use nix::poll::{PollFd, PollFlags, PollTimeout};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::mem::MaybeUninit;
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(any(target_os = "ios", target_os = "macos"))]
const IOSSIOSPEED: libc::c_ulong = 0x80045402;
#[cfg(any(target_os = "ios", target_os = "macos"))]
nix::ioctl_write_ptr_bad!(iossiospeed, IOSSIOSPEED, libc::speed_t);

/// Raw 8N1 serial port. Reads time out after `default_timeout` with [`io::ErrorKind::TimedOut`].
#[derive(Debug)]
pub struct Tty {
    file: File,
    default_timeout: Duration,
    path: PathBuf,
}

impl Tty {
    pub fn new<P: AsRef<Path>>(path: P, baud: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            // don't become the controlling terminal, and don't block on open or for data to become
            // available
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK | libc::O_CLOEXEC)
            .open(path)
            .wrap_err_with(|| format!("failed to open {}", path.display()))?;
        let mut this = Self {
            file,
            default_timeout: Duration::from_millis(50),
            path: path.to_path_buf(),
        };
        this.make_raw()?;
        this.set_baud_rate(baud)?;
        Ok(this)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop anything the kernel has buffered in either direction.
    pub fn clear(&mut self) -> Result<()> {
        let r = unsafe { libc::tcflush(self.file.as_raw_fd(), libc::TCIOFLUSH) };
        if r == -1 {
            eyre::bail!("failed to tcflush: {}", nix::errno::Errno::last());
        }
        Ok(())
    }

    fn make_raw(&mut self) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let mut tios = MaybeUninit::uninit();
        if unsafe { libc::tcgetattr(fd, tios.as_mut_ptr()) } != 0 {
            eyre::bail!("failed to tcgetattr: {}", nix::errno::Errno::last());
        }
        let mut tios = unsafe { tios.assume_init() };

        // noncanonical, no echo, no signals, no output processing
        unsafe { libc::cfmakeraw(&mut tios) };
        // 8N1
        tios.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
        tios.c_cflag |= libc::CS8;
        // no hardware or software flow control
        tios.c_cflag &= !libc::CRTSCTS;
        tios.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
        // enable receiver & ignore modem control lines
        tios.c_cflag |= libc::CREAD | libc::CLOCAL;
        // MIN=0 TIME=0: read returns whatever is available without waiting
        tios.c_cc[libc::VMIN] = 0;
        tios.c_cc[libc::VTIME] = 0;

        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tios) } != 0 {
            eyre::bail!("failed to tcsetattr: {}", nix::errno::Errno::last());
        }
        Ok(())
    }

    /// 937500 is not one of the Bxxx constants, so this goes through the platform's arbitrary
    /// speed interface.
    #[cfg(target_os = "linux")]
    pub fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let mut tio2 = MaybeUninit::<libc::termios2>::uninit();
        if unsafe { libc::ioctl(fd, libc::TCGETS2, tio2.as_mut_ptr()) } == -1 {
            eyre::bail!("failed to TCGETS2: {}", nix::errno::Errno::last());
        }
        let mut tio2 = unsafe { tio2.assume_init() };
        tio2.c_cflag &= !libc::CBAUD;
        tio2.c_cflag |= libc::BOTHER;
        tio2.c_ispeed = baud;
        tio2.c_ospeed = baud;
        if unsafe { libc::ioctl(fd, libc::TCSETS2, &tio2 as *const libc::termios2) } == -1 {
            eyre::bail!("failed to set baud rate {baud}: {}", nix::errno::Errno::last());
        }
        Ok(())
    }

    #[cfg(any(target_os = "ios", target_os = "macos"))]
    pub fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        let speed = baud as libc::speed_t;
        unsafe { iossiospeed(self.file.as_raw_fd(), &speed) }
            .wrap_err_with(|| format!("failed to set baud rate {baud}"))?;
        Ok(())
    }

    #[cfg(not(any(target_os = "linux", target_os = "ios", target_os = "macos")))]
    pub fn set_baud_rate(&mut self, baud: u32) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let mut tios = MaybeUninit::uninit();
        if unsafe { libc::tcgetattr(fd, tios.as_mut_ptr()) } != 0 {
            eyre::bail!("failed to tcgetattr: {}", nix::errno::Errno::last());
        }
        let mut tios = unsafe { tios.assume_init() };
        if unsafe { libc::cfsetspeed(&mut tios, baud as libc::speed_t) } != 0
            || unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tios) } != 0
        {
            eyre::bail!("failed to set baud rate {baud}: {}", nix::errno::Errno::last());
        }
        Ok(())
    }

    fn wait_for(&self, flags: PollFlags, timeout: Option<Duration>) -> io::Result<bool> {
        let timeout = match timeout {
            Some(t) => PollTimeout::from(t.as_millis().min(u16::MAX as u128) as u16),
            None => PollTimeout::NONE,
        };
        let mut fds = [PollFd::new(self.file.as_fd(), flags)];
        let n = nix::poll::poll(&mut fds, timeout)?;
        if n == 0 {
            return Ok(false);
        }
        match fds[0].revents() {
            Some(e) if e.contains(PollFlags::POLLHUP) || e.contains(PollFlags::POLLNVAL) => Err(
                io::Error::new(io::ErrorKind::BrokenPipe, "device disconnected"),
            ),
            Some(e) if e.intersects(flags) => Ok(true),
            _ => Err(io::Error::new(io::ErrorKind::Other, "unexpected poll event")),
        }
    }
}

impl Read for Tty {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.wait_for(PollFlags::POLLIN, Some(self.default_timeout))? {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
        }
        self.file.read(buf)
    }
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.wait_for(PollFlags::POLLOUT, None)?;
        match self.file.write(buf) {
            Ok(0) if !buf.is_empty() => Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "write() returned 0",
            )),
            r => r,
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if unsafe { libc::tcdrain(self.file.as_raw_fd()) } == -1 {
            Err(nix::errno::Errno::last().into())
        } else {
            Ok(())
        }
    }
}
