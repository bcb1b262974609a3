//! Short APDU framing
//!
//! Command APDUs are a fixed 4-byte header followed by an optional
//! length-prefixed payload and an optional expected response length:
//!
//! ```text
//! CLA INS P1 P2 [Lc data...] [Le]
//! ```
//!
//! Response APDUs carry the data followed by the two status bytes `SW1 SW2`.

use log::trace;
use scard_core::{ScardError, ScardResult};

/// Largest command payload a short APDU can carry
pub const MAX_SHORT_DATA_LEN: usize = 255;

/// Largest expected response length; encoded as `Le = 0x00`
pub const MAX_SHORT_LE: usize = 256;

/// Status word of a successful command
pub const SW_SUCCESS: u16 = 0x9000;

/// Command APDU (short form)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandApdu {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    data: Vec<u8>,
    le: Option<usize>,
}

impl CommandApdu {
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Expected response length, 1-256
    pub fn with_le(mut self, le: usize) -> Self {
        self.le = Some(le);
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn le(&self) -> Option<usize> {
        self.le
    }

    /// Serialize to wire bytes
    ///
    /// # Error Handling
    /// Returns `Apdu` if the payload exceeds 255 bytes or `Le` is outside 1-256.
    pub fn to_bytes(&self) -> ScardResult<Vec<u8>> {
        if self.data.len() > MAX_SHORT_DATA_LEN {
            return Err(ScardError::Apdu(format!(
                "Command data too long for a short APDU: {} bytes",
                self.data.len()
            )));
        }

        let mut bytes = Vec::with_capacity(4 + 1 + self.data.len() + 1);
        bytes.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);

        if !self.data.is_empty() {
            bytes.push(self.data.len() as u8);
            bytes.extend_from_slice(&self.data);
        }

        match self.le {
            None => {}
            Some(le @ 1..MAX_SHORT_LE) => bytes.push(le as u8),
            Some(MAX_SHORT_LE) => bytes.push(0x00),
            Some(le) => {
                return Err(ScardError::Apdu(format!(
                    "Expected length out of range for a short APDU: {}",
                    le
                )));
            }
        }

        Ok(bytes)
    }
}

/// Response APDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApdu {
    data: Vec<u8>,
    sw1: u8,
    sw2: u8,
}

impl ResponseApdu {
    /// Split raw response bytes into data and status word
    ///
    /// # Error Handling
    /// Returns `Apdu` if fewer than 2 bytes are given.
    pub fn parse(bytes: &[u8]) -> ScardResult<Self> {
        match bytes {
            [data @ .., sw1, sw2] => Ok(Self {
                data: data.to_vec(),
                sw1: *sw1,
                sw2: *sw2,
            }),
            _ => Err(ScardError::Apdu(format!(
                "Response too short for a status word: {} bytes",
                bytes.len()
            ))),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Status word `SW1 SW2`
    pub fn status(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    pub fn is_success(&self) -> bool {
        self.status() == SW_SUCCESS
    }
}

/// Transmit call of a connected card (`SCardTransmit`)
#[cfg_attr(test, mockall::automock)]
pub trait CardChannel {
    fn transmit(&mut self, apdu: &[u8]) -> ScardResult<Vec<u8>>;
}

/// Frame `command`, send it and parse the card's answer
pub fn transmit_apdu<C>(channel: &mut C, command: &CommandApdu) -> ScardResult<ResponseApdu>
where
    C: CardChannel + ?Sized,
{
    let request = command.to_bytes()?;
    trace!("APDU >> {:02X?}", request);
    let response = channel.transmit(&request)?;
    trace!("APDU << {:02X?}", response);
    ResponseApdu::parse(&response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only() {
        let apdu = CommandApdu::new(0x00, 0xA4, 0x04, 0x00);
        assert_eq!(apdu.to_bytes().unwrap(), [0x00, 0xA4, 0x04, 0x00]);
    }

    #[test]
    fn test_select_with_data_and_le() {
        let aid: [u8; 5] = [0xA0, 0x00, 0x00, 0x03, 0x08];
        let apdu = CommandApdu::new(0x00, 0xA4, 0x04, 0x00)
            .with_data(aid)
            .with_le(256);
        assert_eq!(
            apdu.to_bytes().unwrap(),
            [0x00, 0xA4, 0x04, 0x00, 0x05, 0xA0, 0x00, 0x00, 0x03, 0x08, 0x00]
        );

        let apdu = CommandApdu::new(0x00, 0xCA, 0x00, 0x6E).with_le(0x20);
        assert_eq!(apdu.to_bytes().unwrap(), [0x00, 0xCA, 0x00, 0x6E, 0x20]);
    }

    #[test]
    fn test_limits() {
        let apdu = CommandApdu::new(0x00, 0xDA, 0x00, 0x5E).with_data(vec![0x11u8; 255]);
        assert_eq!(apdu.to_bytes().unwrap().len(), 4 + 1 + 255);

        let apdu = CommandApdu::new(0x00, 0xDA, 0x00, 0x5E).with_data(vec![0x11u8; 256]);
        assert!(matches!(apdu.to_bytes(), Err(ScardError::Apdu(_))));

        let apdu = CommandApdu::new(0x00, 0xCA, 0x00, 0x6E).with_le(257);
        assert!(matches!(apdu.to_bytes(), Err(ScardError::Apdu(_))));

        let apdu = CommandApdu::new(0x00, 0xCA, 0x00, 0x6E).with_le(0);
        assert!(matches!(apdu.to_bytes(), Err(ScardError::Apdu(_))));
    }

    #[test]
    fn test_parse_response() {
        let response = ResponseApdu::parse(&[0x01, 0x02, 0x90, 0x00]).unwrap();
        assert_eq!(response.data(), &[0x01, 0x02]);
        assert_eq!(response.status(), 0x9000);
        assert!(response.is_success());

        let response = ResponseApdu::parse(&[0x6A, 0x82]).unwrap();
        assert!(response.data().is_empty());
        assert!(!response.is_success());

        assert!(matches!(
            ResponseApdu::parse(&[0x90]),
            Err(ScardError::Apdu(_))
        ));
    }

    #[test]
    fn test_transmit_apdu() {
        let mut channel = MockCardChannel::new();
        channel
            .expect_transmit()
            .withf(|apdu| *apdu == [0x00, 0xB0, 0x00, 0x00, 0x02])
            .times(1)
            .returning(|_| Ok(vec![0xCA, 0xFE, 0x90, 0x00]));

        let command = CommandApdu::new(0x00, 0xB0, 0x00, 0x00).with_le(2);
        let response = transmit_apdu(&mut channel, &command).unwrap();
        assert_eq!(response.into_data(), vec![0xCA, 0xFE]);
    }

    #[test]
    fn test_transmit_apdu_rejects_before_sending() {
        let mut channel = MockCardChannel::new();
        channel.expect_transmit().times(0);

        let command = CommandApdu::new(0x00, 0xD6, 0x00, 0x00).with_data(vec![0x00u8; 300]);
        assert!(transmit_apdu(&mut channel, &command).is_err());
    }
}
