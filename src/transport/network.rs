use std::io;
use std::str::FromStr;

/// Network family accepted by `dial` and `listen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// TCP over whichever IP family the address resolves to.
    Tcp,
    Tcp4,
    Tcp6,
    Unix,
    /// In-process pipes handed out by a `MemoryNetwork`.
    Memory,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
            Network::Unix => "unix",
            Network::Memory => "memory",
        }
    }
}

impl FromStr for Network {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            "unix" => Ok(Network::Unix),
            "memory" => Ok(Network::Memory),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported network {other:?}"),
            )),
        }
    }
}
