//! String bindings
//!
//! `[object-uuid@]protseq:network-address[endpoint,option,...]`, for example
//! `ncacn_ip_tcp:10.0.0.5[49712]` or `ncacn_np:fs01[\pipe\svcctl,ndr20]`.
//! A bare host or `host:port` is taken as `ncacn_ip_tcp`.
//!
//! Options are kept verbatim; only the TCP endpoint is interpreted here.

use crate::dcerpc::Uuid;
use crate::error::{Result, RpcError};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Transport named by a string binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolSequence {
    /// `ncacn_ip_tcp`
    IpTcp,
    /// `ncacn_np`, SMB named pipes
    NamedPipe,
    /// `ncacn_http`
    Http,
}

impl ProtocolSequence {
    /// Accepts the protseq names and their short aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ncacn_ip_tcp" | "tcp" => Some(Self::IpTcp),
            "ncacn_np" | "smb" => Some(Self::NamedPipe),
            "ncacn_http" | "http" => Some(Self::Http),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpTcp => "ncacn_ip_tcp",
            Self::NamedPipe => "ncacn_np",
            Self::Http => "ncacn_http",
        }
    }

    /// Tower id used for this protseq in DUALSTRINGARRAY entries.
    pub fn tower_id(&self) -> u16 {
        match self {
            Self::IpTcp => 0x07,
            Self::NamedPipe => 0x0f,
            Self::Http => 0x1f,
        }
    }
}

impl fmt::Display for ProtocolSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed string binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringBinding {
    pub object: Option<Uuid>,
    pub protocol: ProtocolSequence,
    pub network_address: String,
    pub endpoint: Option<String>,
    pub options: Vec<String>,
}

fn invalid(binding: &str, why: &str) -> RpcError {
    RpcError::InvalidBinding(format!("{binding:?}: {why}"))
}

impl StringBinding {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            object: None,
            protocol: ProtocolSequence::IpTcp,
            network_address: host.into(),
            endpoint: Some(port.to_string()),
            options: Vec::new(),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Err(invalid(s, "empty binding"));
        }

        let (object, rest) = match text.split_once('@') {
            Some((uuid, rest)) => {
                let object = Uuid::parse(uuid).ok_or_else(|| invalid(s, "bad object uuid"))?;
                (Some(object), rest)
            }
            None => (None, text),
        };

        let (head, bracketed) = match rest.find('[') {
            Some(open) => {
                let inner = rest[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| invalid(s, "unterminated endpoint"))?;
                (&rest[..open], Some(inner))
            }
            None => (rest, None),
        };

        let mut endpoint = None;
        let (protocol, network_address) = match head.split_once(':') {
            None => (ProtocolSequence::IpTcp, head),
            Some((prefix, address)) => match ProtocolSequence::parse(prefix) {
                Some(protocol) => (protocol, address),
                // host:port shorthand
                None if bracketed.is_none() && address.parse::<u16>().is_ok() => {
                    endpoint = Some(address.to_string());
                    (ProtocolSequence::IpTcp, prefix)
                }
                None => return Err(invalid(s, "unknown protocol sequence")),
            },
        };

        let mut options = Vec::new();
        if let Some(inner) = bracketed {
            for (i, item) in inner.split(',').map(str::trim).enumerate() {
                if let Some(value) = item.strip_prefix("endpoint=") {
                    endpoint = Some(value.to_string());
                } else if i == 0 && !item.contains('=') {
                    endpoint = (!item.is_empty()).then(|| item.to_string());
                } else if !item.is_empty() {
                    options.push(item.to_string());
                }
            }
        }

        let binding = Self {
            object,
            protocol,
            network_address: network_address.trim().to_string(),
            endpoint,
            options,
        };
        if binding.protocol == ProtocolSequence::IpTcp {
            if binding.network_address.is_empty() {
                return Err(invalid(s, "missing host"));
            }
            if let Some(endpoint) = &binding.endpoint {
                endpoint
                    .parse::<u16>()
                    .map_err(|_| invalid(s, "tcp endpoint is not a port"))?;
            }
        }
        Ok(binding)
    }

    /// TCP port from the endpoint, if one was given.
    pub fn port(&self) -> Option<u16> {
        match self.protocol {
            ProtocolSequence::IpTcp => self.endpoint.as_deref()?.parse().ok(),
            _ => None,
        }
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.eq_ignore_ascii_case(name))
    }

    /// Resolve an `ncacn_ip_tcp` binding to a socket address.
    ///
    /// There is no endpoint mapper lookup, so the binding must name the
    /// port.
    pub async fn socket_addr(&self) -> Result<SocketAddr> {
        if self.protocol != ProtocolSequence::IpTcp {
            return Err(RpcError::InvalidBinding(format!(
                "{} cannot be dialled over TCP",
                self.protocol
            )));
        }
        let port = self
            .port()
            .ok_or_else(|| RpcError::InvalidBinding(format!("{self}: no endpoint")))?;
        tokio::net::lookup_host((self.network_address.as_str(), port))
            .await?
            .next()
            .ok_or_else(|| RpcError::InvalidBinding(format!("{self}: host did not resolve")))
    }
}

impl FromStr for StringBinding {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for StringBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(object) = &self.object {
            write!(f, "{object}@")?;
        }
        write!(f, "{}:{}", self.protocol, self.network_address)?;
        if self.endpoint.is_some() || !self.options.is_empty() {
            f.write_str("[")?;
            f.write_str(self.endpoint.as_deref().unwrap_or(""))?;
            for option in &self.options {
                write!(f, ",{option}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}
