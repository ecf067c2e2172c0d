//! This module contains all the capture logic

// The capture thread alternates between blocking on the socket and running
// decode -> assemble synchronously. Completed spectra are handed to the
// writer thread through a bounded channel so disk I/O never backs up the
// receive path. Stop conditions are only evaluated right after a completed
// spectrum - a spectrum in progress is always finished first.

use std::{
    io::ErrorKind,
    net::UdpSocket,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::{
    assemble::{Assembler, ProcessResult},
    packet::Packet,
    Spectrum, PACKET_SIZE,
};

/// A completed spectrum pair on its way to the writer thread
pub type CompletedSpectra = (u64, Box<Spectrum>, Box<Spectrum>);

/// How often to print a progress line, in packets
const REPORT_INTERVAL: u64 = 1000;

/// Evaluated only right after a completed spectrum (or a receive timeout) -
/// mid-spectrum cancellation is not supported
pub fn should_stop(elapsed_secs: u64, record_secs: u64) -> bool {
    elapsed_secs > record_secs
}

/// Drive the pipeline until the recording time elapses or `running` is
/// cleared. Returns the number of packets placed.
pub fn capture_udp(
    socket: &UdpSocket,
    mut assembler: Assembler,
    spectra_tx: Sender<CompletedSpectra>,
    record_secs: u64,
    running: &Arc<AtomicBool>,
) -> u64 {
    let start = Instant::now();
    let mut buf = [0u8; PACKET_SIZE + 1];
    while running.load(Ordering::Relaxed) {
        let n = match socket.recv(&mut buf) {
            Ok(n) => n,
            // Read timeout so a silent upstream can't wedge us past the window
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if should_stop(start.elapsed().as_secs(), record_secs) {
                    break;
                }
                continue;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("socket receive failed - {e}");
                continue;
            }
        };
        let pkt = match Packet::from_datagram(&buf[..n]) {
            Ok(pkt) => pkt,
            Err(e) => {
                // Keep truckin, just drop the runt
                warn!("discarding datagram - {e}");
                continue;
            }
        };
        match assembler.process(&pkt) {
            ProcessResult::AwaitingAlignment | ProcessResult::Stored => (),
            ProcessResult::Completed(index) => {
                let (xx, yy) = assembler.spectra();
                if spectra_tx
                    .send((index, Box::new(*xx), Box::new(*yy)))
                    .is_err()
                {
                    // Writer went away, nothing left to do
                    break;
                }
                if should_stop(start.elapsed().as_secs(), record_secs) {
                    break;
                }
            }
        }
        if assembler.packets() > 0 && assembler.packets() % REPORT_INTERVAL == 0 {
            info!(
                packets = assembler.packets(),
                elapsed = start.elapsed().as_secs(),
                "receiving"
            );
        }
    }
    assembler.packets()
}
