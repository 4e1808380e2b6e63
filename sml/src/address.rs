use std::fmt;
use std::io::{Read, Write};
use std::net::Ipv4Addr;

use crate::consensus::{encode, Decodable, Encodable};

/// The advertised P2P endpoint of a masternode.
///
/// On the wire this is a 16-byte address field holding an IPv4-mapped
/// address in the last four bytes, followed by a big-endian port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceAddress {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl Encodable for ServiceAddress {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut addr = [0u8; 16];
        addr[10] = 0xFF;
        addr[11] = 0xFF;
        addr[12..].copy_from_slice(&self.ip.octets());
        let mut len = addr.consensus_encode(writer)?;
        len += self.port.swap_bytes().consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for ServiceAddress {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let addr = <[u8; 16]>::consensus_decode(reader)?;
        let ip = Ipv4Addr::new(addr[12], addr[13], addr[14], addr[15]);
        let port = u16::consensus_decode(reader)?.swap_bytes();
        Ok(ServiceAddress { ip, port })
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
