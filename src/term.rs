use std::fmt;
use std::io::{self, ErrorKind, Read, Stdout, Write, stdout};
use std::os::unix::io::RawFd;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{cursor, execute, terminal, Command};
use crossterm::style::ResetColor;
use log::{error, warn};

use crate::TermInt;

const STDIN_FD: RawFd = libc::STDIN_FILENO;
const READ_CHUNK: usize = 64;
const EXIT_PROMPT_GRACE: Duration = Duration::from_millis(500);

/// The terminal as the game loop sees it: a byte sink plus a byte source.
pub trait Console: Write {
    /// Appends whatever input is pending to `buf` without waiting.
    fn read_available(&mut self, buf: &mut Vec<u8>) -> io::Result<()>;

    /// Drops pending input, then waits for a single fresh key.
    fn wait_for_key(&mut self) -> io::Result<()>;
}

/// `ESC[?47h`, the plain alternate-screen switch.
struct EnterAltScreen;

/// `ESC[?47l`
struct LeaveAltScreen;

impl Command for EnterAltScreen {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str("\x1b[?47h")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Ok(())
    }
}

impl Command for LeaveAltScreen {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str("\x1b[?47l")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Owns the terminal for the lifetime of a game: raw, non-blocking input on
/// the alternate screen with the cursor hidden. Dropping it puts everything
/// back the way it was found.
pub struct TermManager {
    stdout: Stdout,
    saved_flags: Option<libc::c_int>,
    raw: bool,
    alt_screen: bool,
}

impl TermManager {
    pub fn new() -> Self {
        TermManager { stdout: stdout(), saved_flags: None, raw: false, alt_screen: false }
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAltScreen, cursor::Hide).context("Error entering alt screen")?;
        self.alt_screen = true;

        terminal::enable_raw_mode().context("Error setting raw mode")?;
        self.raw = true;

        self.saved_flags = Some(set_nonblocking(STDIN_FD).context("Error making stdin non-blocking")?);
        Ok(())
    }

    /// Undoes `setup`. Every step is attempted even if an earlier one fails.
    pub fn restore(&mut self) {
        if let Some(flags) = self.saved_flags.take() {
            if let Err(e) = set_flags(STDIN_FD, flags) {
                error!("Error restoring stdin flags: {}", e);
            }
        }

        if self.raw {
            self.raw = false;
            if let Err(e) = terminal::disable_raw_mode() {
                error!("Error leaving raw mode: {}", e);
            }
        }

        if self.alt_screen {
            self.alt_screen = false;
            if let Err(e) = execute!(self.stdout, ResetColor, cursor::Show, LeaveAltScreen) {
                error!("Error leaving alt screen: {}", e);
            }
        }
    }

    /// Warns when the board plus its two text rows won't fit on screen.
    pub fn check_size(&self, width: TermInt, height: TermInt) {
        match terminal::size() {
            Ok((cols, rows)) => {
                let need = (width as u32 * 2, height as u32 + 2);
                if (cols as u32) < need.0 || (rows as u32) < need.1 {
                    warn!("terminal is {}x{}, board needs {}x{}", cols, rows, need.0, need.1);
                }
            }
            Err(e) => warn!("Error reading terminal size: {}", e),
        }
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        self.restore();
    }
}

impl Write for TermManager {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Console for TermManager {
    fn read_available(&mut self, buf: &mut Vec<u8>) -> io::Result<()> {
        let mut stdin = io::stdin().lock();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            match stdin.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn wait_for_key(&mut self) -> io::Result<()> {
        sleep(EXIT_PROMPT_GRACE);
        let mut discard = vec![];
        self.read_available(&mut discard)?;

        let flags = get_flags(STDIN_FD)?;
        set_flags(STDIN_FD, flags & !libc::O_NONBLOCK)?;
        let mut key = [0u8; 1];
        let res = io::stdin().lock().read(&mut key);
        set_flags(STDIN_FD, flags)?;
        res.map(|_| ())
    }
}

fn get_flags(fd: RawFd) -> io::Result<libc::c_int> {
    // SAFETY: F_GETFL only reads the descriptor's status flags.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(flags)
}

fn set_flags(fd: RawFd, flags: libc::c_int) -> io::Result<()> {
    // SAFETY: F_SETFL only changes the descriptor's status flags.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Switches `fd` to non-blocking reads and returns the flags it had before.
fn set_nonblocking(fd: RawFd) -> io::Result<libc::c_int> {
    let flags = get_flags(fd)?;
    set_flags(fd, flags | libc::O_NONBLOCK)?;
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alt_screen_commands() {
        let mut out: Vec<u8> = vec![];
        crossterm::queue!(out, EnterAltScreen, cursor::Hide).unwrap();
        crossterm::queue!(out, cursor::Show, LeaveAltScreen).unwrap();
        assert_eq!(out, b"\x1b[?47h\x1b[?25l\x1b[?25h\x1b[?47l");
    }

    #[test]
    fn test_restore_without_setup_is_a_no_op() {
        let mut term = TermManager::new();
        term.restore();
        term.restore();
        assert!(term.saved_flags.is_none());
    }
}
