//! SNTP client packets
//!
//! Only the client side of RFC 4330 is needed: a 48-byte mode-3 request, and
//! the transmit timestamp read back out of the server's mode-4 reply.

use thiserror_no_std::Error;

/// Size of an SNTP packet without extension fields.
pub const SNTP_PACKET_LEN: usize = 48;

pub const SNTP_PORT: u16 = 123;

/// Seconds between the NTP era origin (1900-01-01) and the Unix epoch.
const NTP_UNIX_OFFSET_SECS: u64 = 2_208_988_800;

const MODE_CLIENT: u8 = 3;
const MODE_SERVER: u8 = 4;
const VERSION: u8 = 4;
const LEAP_UNSYNCHRONISED: u8 = 3;

/// Byte offset of the transmit timestamp's seconds field.
const TRANSMIT_SECS_AT: usize = 40;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SntpError {
    #[error("Reply shorter than an SNTP packet")]
    Truncated,
    #[error("Reply is not a server packet")]
    NotServer,
    #[error("Server is not synchronised")]
    Unsynchronised,
    #[error("Reply carries no transmit time")]
    NoTimestamp,
}

/// A client request: leap 0, version 4, mode 3, everything else zero.
pub fn request_packet() -> [u8; SNTP_PACKET_LEN] {
    let mut packet = [0u8; SNTP_PACKET_LEN];
    packet[0] = (VERSION << 3) | MODE_CLIENT;
    packet
}

/// Unix seconds from a server reply.
///
/// Timestamps with the high bit clear are taken to be in NTP era 1
/// (after 2036-02-07), which keeps the conversion valid until 2104.
pub fn parse_reply(reply: &[u8]) -> Result<u64, SntpError> {
    if reply.len() < SNTP_PACKET_LEN {
        return Err(SntpError::Truncated);
    }

    let leap = reply[0] >> 6;
    let mode = reply[0] & 0x07;
    let stratum = reply[1];
    if mode != MODE_SERVER {
        return Err(SntpError::NotServer);
    }
    // stratum 0 is a kiss-of-death packet
    if leap == LEAP_UNSYNCHRONISED || stratum == 0 {
        return Err(SntpError::Unsynchronised);
    }

    let secs = u32::from_be_bytes([
        reply[TRANSMIT_SECS_AT],
        reply[TRANSMIT_SECS_AT + 1],
        reply[TRANSMIT_SECS_AT + 2],
        reply[TRANSMIT_SECS_AT + 3],
    ]) as u64;
    if secs == 0 {
        return Err(SntpError::NoTimestamp);
    }

    let secs = if secs & 0x8000_0000 == 0 {
        secs + (1 << 32)
    } else {
        secs
    };
    Ok(secs - NTP_UNIX_OFFSET_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(ntp_secs: u32) -> [u8; SNTP_PACKET_LEN] {
        let mut packet = [0u8; SNTP_PACKET_LEN];
        packet[0] = (VERSION << 3) | MODE_SERVER;
        packet[1] = 2;
        packet[TRANSMIT_SECS_AT..TRANSMIT_SECS_AT + 4].copy_from_slice(&ntp_secs.to_be_bytes());
        packet
    }

    #[test]
    fn test_request_is_version_4_client() {
        let packet = request_packet();
        assert_eq!(packet[0], 0x23);
        assert!(packet[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reply_converts_to_unix_seconds() {
        // 2024-01-01T00:00:00Z
        let unix = 1_704_067_200u64;
        let ntp = (unix + NTP_UNIX_OFFSET_SECS) as u32;
        assert_eq!(parse_reply(&reply(ntp)), Ok(unix));
    }

    #[test]
    fn test_era_rollover() {
        // 2040-01-01T00:00:00Z lies past the 2036 wrap
        let unix = 2_208_988_800u64;
        let ntp = (unix + NTP_UNIX_OFFSET_SECS - (1 << 32)) as u32;
        assert_eq!(parse_reply(&reply(ntp)), Ok(unix));
    }

    #[test]
    fn test_rejects_bad_replies() {
        assert_eq!(parse_reply(&[0u8; 20]), Err(SntpError::Truncated));
        assert_eq!(parse_reply(&request_packet()), Err(SntpError::NotServer));

        let mut kiss = reply(3_913_056_000);
        kiss[1] = 0;
        assert_eq!(parse_reply(&kiss), Err(SntpError::Unsynchronised));

        let mut unsynced = reply(3_913_056_000);
        unsynced[0] |= 0xC0;
        assert_eq!(parse_reply(&unsynced), Err(SntpError::Unsynchronised));

        assert_eq!(parse_reply(&reply(0)), Err(SntpError::NoTimestamp));
    }
}
