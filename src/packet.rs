//! Decoding of raw UDP datagrams from the SNAP 10 GbE core

use thiserror::Error;

use crate::{HEADER_SIZE, PACKETS_PER_SPECTRA, PACKET_SIZE, SAMPLES_PER_PACKET};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram was {got} bytes, expected {expected}")]
    WrongSize { expected: usize, got: usize },
}

/// One decoded spectrometer packet: a sequence counter and the Stokes-interleaved
/// accumulator samples, both converted from network byte order.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub sequence: u64,
    pub samples: Box<[i32; SAMPLES_PER_PACKET]>,
}

impl Packet {
    /// Decode a single received datagram. Wrong-size datagrams are rejected
    /// outright, no partial decode is attempted.
    pub fn from_datagram(datagram: &[u8]) -> Result<Self, DecodeError> {
        if datagram.len() != PACKET_SIZE {
            return Err(DecodeError::WrongSize {
                expected: PACKET_SIZE,
                got: datagram.len(),
            });
        }
        let sequence = u64::from_be_bytes(
            datagram[..HEADER_SIZE]
                .try_into()
                .expect("header is exactly 8 bytes"),
        );
        let mut samples = Box::new([0i32; SAMPLES_PER_PACKET]);
        for (i, word) in datagram[HEADER_SIZE..].chunks_exact(4).enumerate() {
            samples[i] = i32::from_be_bytes(word.try_into().expect("chunk is exactly 4 bytes"));
        }
        Ok(Self { sequence, samples })
    }

    /// Which quarter-segment of a full spectrum this packet supplies
    pub fn sub_spectra_index(&self) -> usize {
        (self.sequence % PACKETS_PER_SPECTRA as u64) as usize
    }

    /// Which full spectrum (time sample) this packet belongs to
    pub fn spectra_index(&self) -> u64 {
        self.sequence / PACKETS_PER_SPECTRA as u64
    }
}
