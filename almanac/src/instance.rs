//! Single-instance activation: the first process holds a lock and listens on a
//! unix socket, later invocations forward an activation and exit.

use std::{
    env,
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, Write},
    os::unix::{
        io::AsRawFd,
        net::{UnixListener, UnixStream},
    },
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};

const LOCK_NAME: &str = "almanac.lock";
const SOCKET_NAME: &str = "almanac.sock";
const ACTIVATE: &str = "activate";
const IO_TIMEOUT: Duration = Duration::from_millis(500);

/// A request read from the activation socket.
#[derive(Debug, PartialEq, Eq)]
pub enum Request {
    /// `token` is the invoker's xdg-activation token, if it had one.
    Activate { token: Option<String> },
    Unknown(String),
}

impl Request {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        if command != ACTIVATE {
            return Request::Unknown(line.to_string());
        }
        let token = rest.trim();
        if token.contains(char::is_whitespace) {
            return Request::Unknown(line.to_string());
        }
        Request::Activate { token: (!token.is_empty()).then(|| token.to_string()) }
    }
}

pub enum Instance {
    Primary { guard: Guard, listener: UnixListener },
    Remote,
}

/// Holds the lock for the process lifetime and unlinks the socket on drop.
pub struct Guard {
    _lock: File,
    socket: PathBuf,
}

impl Drop for Guard {
    fn drop(&mut self) {
        fs::remove_file(&self.socket).ok();
    }
}

pub fn runtime_dir() -> PathBuf {
    match env::var_os("XDG_RUNTIME_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            log::warn!("XDG_RUNTIME_DIR not set, using {}", env::temp_dir().display());
            env::temp_dir()
        }
    }
}

pub fn claim(dir: &Path) -> Result<Instance> {
    let lock_path = dir.join(LOCK_NAME);
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;

    let ret = unsafe { libc::flock(lock.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() == std::io::ErrorKind::WouldBlock {
            return Ok(Instance::Remote);
        }
        return Err(err).context("failed to lock instance file");
    }

    let socket = dir.join(SOCKET_NAME);
    if socket.exists() {
        fs::remove_file(&socket)
            .with_context(|| format!("failed to remove stale {}", socket.display()))?;
    }
    let listener = UnixListener::bind(&socket)
        .with_context(|| format!("failed to bind {}", socket.display()))?;
    listener.set_nonblocking(true)?;

    Ok(Instance::Primary { guard: Guard { _lock: lock, socket }, listener })
}

/// The token the launcher handed this process, if any.
pub fn activation_token() -> Option<String> {
    env::var("XDG_ACTIVATION_TOKEN").ok().filter(|t| !t.is_empty())
}

/// Asks the running instance to activate, passing on `token` so it may raise
/// itself. Returns once it acknowledged.
pub fn forward_activation(dir: &Path, token: Option<&str>) -> Result<()> {
    let socket = dir.join(SOCKET_NAME);
    let mut stream = UnixStream::connect(&socket)
        .with_context(|| format!("running instance not reachable at {}", socket.display()))?;
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    let request = match token {
        Some(token) => format!("{ACTIVATE} {token}\n"),
        None => format!("{ACTIVATE}\n"),
    };
    stream.write_all(request.as_bytes())?;
    stream.flush()?;

    let mut reply = String::new();
    BufReader::new(stream).read_line(&mut reply)?;
    match reply.trim() {
        "ok" => Ok(()),
        other => bail!("running instance refused activation: {other}"),
    }
}

/// Reads one request and replies to it.
pub fn handle_client(stream: UnixStream) -> Result<Request> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let request = Request::parse(&line);

    let mut stream = reader.into_inner();
    match &request {
        Request::Activate { .. } => stream.write_all(b"ok\n")?,
        Request::Unknown(command) => {
            stream.write_all(format!("unknown command: {command}\n").as_bytes())?;
            log::warn!("ignoring unknown request {command:?}");
        }
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("almanac-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn accept_blocking(listener: &UnixListener) -> UnixStream {
        loop {
            match listener.accept() {
                Ok((stream, _)) => return stream,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(5));
                }
                Err(e) => panic!("accept failed: {e}"),
            }
        }
    }

    #[test]
    fn second_claim_is_remote() {
        let dir = scratch("claim");
        let first = claim(&dir).unwrap();
        assert!(matches!(first, Instance::Primary { .. }));
        assert!(matches!(claim(&dir).unwrap(), Instance::Remote));
        drop(first);
        assert!(!dir.join(SOCKET_NAME).exists());
        assert!(matches!(claim(&dir).unwrap(), Instance::Primary { .. }));
    }

    #[test]
    fn stale_socket_is_replaced() {
        let dir = scratch("stale");
        let stale = UnixListener::bind(dir.join(SOCKET_NAME)).unwrap();
        drop(stale);
        assert!(matches!(claim(&dir).unwrap(), Instance::Primary { .. }));
    }

    #[test]
    fn activation_round_trip() {
        let dir = scratch("roundtrip");
        let Instance::Primary { guard, listener } = claim(&dir).unwrap() else {
            panic!("expected primary");
        };
        let server = std::thread::spawn(move || {
            let requests: Vec<_> = (0..2)
                .map(|_| handle_client(accept_blocking(&listener)).unwrap())
                .collect();
            drop(guard);
            requests
        });
        forward_activation(&dir, None).unwrap();
        forward_activation(&dir, Some("tok-42")).unwrap();
        assert_eq!(server.join().unwrap(), [
            Request::Activate { token: None },
            Request::Activate { token: Some("tok-42".into()) },
        ]);
    }

    #[test]
    fn request_parsing() {
        assert_eq!(Request::parse("activate\n"), Request::Activate { token: None });
        assert_eq!(Request::parse("activate  \n"), Request::Activate { token: None });
        assert_eq!(Request::parse("activate abc_1\n"), Request::Activate { token: Some("abc_1".into()) });
        assert_eq!(Request::parse("activate a b\n"), Request::Unknown("activate a b".into()));
        assert_eq!(Request::parse("activated\n"), Request::Unknown("activated".into()));
        assert_eq!(Request::parse(""), Request::Unknown(String::new()));
    }

    #[test]
    fn unknown_request_is_refused() {
        let dir = scratch("unknown");
        let Instance::Primary { guard: _guard, listener } = claim(&dir).unwrap() else {
            panic!("expected primary");
        };
        let mut client = UnixStream::connect(dir.join(SOCKET_NAME)).unwrap();
        client.write_all(b"dismiss\n").unwrap();
        assert_eq!(handle_client(accept_blocking(&listener)).unwrap(), Request::Unknown("dismiss".into()));

        let mut reply = String::new();
        BufReader::new(client).read_line(&mut reply).unwrap();
        assert_eq!(reply.trim(), "unknown command: dismiss");
    }

    #[test]
    fn forwarding_without_instance_fails() {
        let dir = scratch("absent");
        assert!(forward_activation(&dir, None).is_err());
    }
}
