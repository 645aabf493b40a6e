//! Wire format spoken to the motor board: `<speed>,<fwd|rev>`, ASCII, with no
//! terminator. One packet per dispatch.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Direction, MotorState, Speed},
    error::ProtocolError,
};

/// Widest speed field on the wire (`100`).
const MAX_SPEED_DIGITS: usize = 3;
/// Every direction token is exactly this long, which makes the stream
/// self-delimiting.
const DIRECTION_TOKEN_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorCommand {
    pub speed: Speed,
    pub direction: Direction,
}

impl MotorCommand {
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.encode().into_bytes()
    }
}

impl From<MotorState> for MotorCommand {
    fn from(state: MotorState) -> Self {
        Self {
            speed: state.speed,
            direction: state.direction,
        }
    }
}

impl From<MotorCommand> for MotorState {
    fn from(command: MotorCommand) -> Self {
        MotorState::new(command.speed, command.direction)
    }
}

impl fmt::Display for MotorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.speed, self.direction.token())
    }
}

impl FromStr for MotorCommand {
    type Err = ProtocolError;

    fn from_str(packet: &str) -> Result<Self, Self::Err> {
        let packet = packet.trim();
        if packet.is_empty() {
            return Err(ProtocolError::EmptyPacket);
        }

        let (speed, token) =
            packet
                .split_once(',')
                .ok_or_else(|| ProtocolError::MissingSeparator {
                    packet: packet.to_string(),
                })?;

        let speed = speed
            .parse::<i64>()
            .ok()
            .and_then(|value| Speed::new(value).ok())
            .ok_or_else(|| ProtocolError::InvalidSpeed {
                packet: packet.to_string(),
            })?;

        let direction =
            Direction::from_token(token).ok_or_else(|| ProtocolError::UnknownDirection {
                token: token.to_string(),
            })?;

        Ok(Self { speed, direction })
    }
}

/// Incremental decoder for a stream of back-to-back packets.
///
/// Partial packets are kept until the next [`CommandDecoder::feed`]. Bytes that
/// cannot start a packet are dropped up to the next digit and reported as
/// [`ProtocolError::Garbage`].
#[derive(Debug, Default)]
pub struct CommandDecoder {
    buf: Vec<u8>,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of a packet.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<MotorCommand, ProtocolError>> {
        self.buf.extend_from_slice(bytes);
        let mut out = Vec::new();

        while !self.buf.is_empty() {
            let skip = self
                .buf
                .iter()
                .take_while(|b| !b.is_ascii_digit())
                .count();
            if skip > 0 {
                self.buf.drain(..skip);
                out.push(Err(ProtocolError::Garbage { len: skip }));
                continue;
            }

            let digits = self.buf.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > MAX_SPEED_DIGITS {
                self.buf.drain(..digits);
                out.push(Err(ProtocolError::Garbage { len: digits }));
                continue;
            }
            if digits == self.buf.len() {
                break;
            }

            if self.buf[digits] != b',' {
                let packet = String::from_utf8_lossy(&self.buf[..=digits]).into_owned();
                self.buf.drain(..digits);
                out.push(Err(ProtocolError::MissingSeparator { packet }));
                continue;
            }

            let end = digits + 1 + DIRECTION_TOKEN_LEN;
            if self.buf.len() < end {
                let partial = &self.buf[digits + 1..];
                if is_token_prefix(partial) {
                    break;
                }
                let len = digits + 1;
                self.buf.drain(..len);
                out.push(Err(ProtocolError::Garbage { len }));
                continue;
            }

            let token = &self.buf[digits + 1..end];
            if Direction::from_token(&String::from_utf8_lossy(token)).is_none() {
                let token = String::from_utf8_lossy(token).into_owned();
                self.buf.drain(..=digits);
                out.push(Err(ProtocolError::UnknownDirection { token }));
                continue;
            }

            let packet: Vec<u8> = self.buf.drain(..end).collect();
            out.push(String::from_utf8_lossy(&packet).parse());
        }

        out
    }
}

fn is_token_prefix(partial: &[u8]) -> bool {
    [Direction::FORWARD_TOKEN, Direction::REVERSE_TOKEN]
        .iter()
        .any(|token| token.as_bytes().starts_with(partial))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(speed: i64, direction: Direction) -> MotorCommand {
        MotorCommand {
            speed: Speed::new(speed).expect("speed"),
            direction,
        }
    }

    #[test]
    fn encodes_speed_and_direction_token() {
        assert_eq!(command(40, Direction::Forward).encode(), "40,fwd");
        assert_eq!(command(75, Direction::Reverse).encode(), "75,rev");
        assert_eq!(command(0, Direction::Reverse).encode(), "0,rev");
        assert_eq!(command(0, Direction::Forward).into_bytes(), b"0,fwd");
    }

    #[test]
    fn parses_single_packet() {
        assert_eq!(
            "100,rev".parse::<MotorCommand>(),
            Ok(command(100, Direction::Reverse))
        );
        assert_eq!("".parse::<MotorCommand>(), Err(ProtocolError::EmptyPacket));
        assert!(matches!(
            "40fwd".parse::<MotorCommand>(),
            Err(ProtocolError::MissingSeparator { .. })
        ));
        assert!(matches!(
            "140,fwd".parse::<MotorCommand>(),
            Err(ProtocolError::InvalidSpeed { .. })
        ));
        assert_eq!(
            "40,up".parse::<MotorCommand>(),
            Err(ProtocolError::UnknownDirection {
                token: "up".to_string()
            })
        );
    }

    #[test]
    fn decoder_splits_back_to_back_packets() {
        let mut decoder = CommandDecoder::new();
        let decoded = decoder.feed(b"40,fwd0,rev100,fwd");
        assert_eq!(
            decoded,
            vec![
                Ok(command(40, Direction::Forward)),
                Ok(command(0, Direction::Reverse)),
                Ok(command(100, Direction::Forward)),
            ]
        );
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn decoder_holds_partial_packet_across_reads() {
        let mut decoder = CommandDecoder::new();
        assert!(decoder.feed(b"7").is_empty());
        assert!(decoder.feed(b"5,r").is_empty());
        assert_eq!(decoder.pending(), b"75,r");
        assert_eq!(
            decoder.feed(b"ev"),
            vec![Ok(command(75, Direction::Reverse))]
        );
    }

    #[test]
    fn decoder_resynchronises_after_garbage() {
        let mut decoder = CommandDecoder::new();
        let decoded = decoder.feed(b"\r\n40,fwd");
        assert_eq!(
            decoded,
            vec![
                Err(ProtocolError::Garbage { len: 2 }),
                Ok(command(40, Direction::Forward)),
            ]
        );

        let decoded = decoder.feed(b"12,xy9,rev");
        assert_eq!(
            decoded,
            vec![
                Err(ProtocolError::UnknownDirection {
                    token: "xy9".to_string()
                }),
                Err(ProtocolError::Garbage { len: 2 }),
                Ok(command(9, Direction::Reverse)),
            ]
        );
    }
}
