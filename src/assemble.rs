//! Reassembly of packet quarter-segments into full per-polarization spectra

use tracing::{debug, warn};

use crate::{
    packet::Packet, Spectrum, CHANNELS, PACKETS_PER_SPECTRA, SEGMENT_SIZE, STOKES_PER_PACKET,
};

/// What happened to the packet we just fed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// Discarded, still waiting for the first segment of a spectrum
    AwaitingAlignment,
    /// Placed into the buffers, spectrum not yet complete
    Stored,
    /// This packet was the final segment, the buffers hold a complete spectrum
    Completed(u64),
}

/// Owns the two spectrum buffers and the per-packet session state.
/// Buffers are mutated in place and reused for every spectrum, the
/// previous contents are only ever overwritten, never cleared.
pub struct Assembler {
    spec_xx: Box<Spectrum>,
    spec_yy: Box<Spectrum>,
    flip: bool,
    waiting: bool,
    last_sequence: Option<u64>,
    packets: u64,
}

impl Assembler {
    /// `flip` reverses channel order on placement, undoing a spectral
    /// inversion in the analog chain. Fixed for the whole run.
    pub fn new(flip: bool) -> Self {
        Self {
            spec_xx: Box::new([0f32; CHANNELS]),
            spec_yy: Box::new([0f32; CHANNELS]),
            flip,
            waiting: true,
            last_sequence: None,
            packets: 0,
        }
    }

    /// Place one decoded packet into the spectrum buffers.
    ///
    /// Until a packet with sub-spectrum index 0 arrives, everything is
    /// discarded - we never write a spectrum whose first segments we
    /// didn't see. Sequence discontinuities are reported but not repaired;
    /// the channels the missing packet would have filled keep stale values.
    pub fn process(&mut self, pkt: &Packet) -> ProcessResult {
        let sub_index = pkt.sub_spectra_index();
        if self.waiting {
            if sub_index == 0 {
                self.waiting = false;
            } else {
                debug!(sub_index, "waiting for packet for start of spectra");
                return ProcessResult::AwaitingAlignment;
            }
        }

        if let Some(last) = self.last_sequence {
            if pkt.sequence != last.wrapping_add(1) {
                warn!(
                    last,
                    got = pkt.sequence,
                    "missed a packet"
                );
            }
        }
        self.last_sequence = Some(pkt.sequence);
        self.packets += 1;

        // Samples are Stokes-interleaved, one group per channel slot,
        // with XX first and YY second
        for i in 0..SEGMENT_SIZE {
            let chan = if self.flip {
                CHANNELS - 1 - (sub_index * SEGMENT_SIZE + i)
            } else {
                sub_index * SEGMENT_SIZE + i
            };
            self.spec_xx[chan] = pkt.samples[STOKES_PER_PACKET * i] as f32;
            self.spec_yy[chan] = pkt.samples[STOKES_PER_PACKET * i + 1] as f32;
        }

        if sub_index == PACKETS_PER_SPECTRA - 1 {
            ProcessResult::Completed(pkt.spectra_index())
        } else {
            ProcessResult::Stored
        }
    }

    pub fn spectra(&self) -> (&Spectrum, &Spectrum) {
        (&self.spec_xx, &self.spec_yy)
    }

    /// Total packets placed since the start of capture
    pub fn packets(&self) -> u64 {
        self.packets
    }
}
