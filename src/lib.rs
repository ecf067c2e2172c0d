pub mod args;
pub mod assemble;
pub mod capture;
pub mod exfil;
pub mod packet;

// Packet geometry, set by the SNAP gateware
pub const PACKETS_PER_SPECTRA: usize = 4;
pub const CHANNELS: usize = 2048;
pub const STOKES_PER_PACKET: usize = 4;

/// Channels each packet contributes per polarization
pub const SEGMENT_SIZE: usize = CHANNELS / PACKETS_PER_SPECTRA;
pub const SAMPLES_PER_PACKET: usize = STOKES_PER_PACKET * SEGMENT_SIZE;

pub const HEADER_SIZE: usize = 8;
pub const PAYLOAD_SIZE: usize = SAMPLES_PER_PACKET * 4;
/// Total UDP datagram size, anything else is malformed
pub const PACKET_SIZE: usize = HEADER_SIZE + PAYLOAD_SIZE;

pub const DEFAULT_PORT: u16 = 10000;

pub type Spectrum = [f32; CHANNELS];
