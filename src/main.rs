use std::{
    fs::File,
    io::BufWriter,
    net::UdpSocket,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use crossbeam_channel::bounded;
use spectra_slurper::{
    args::{convert_filter, Args},
    assemble::Assembler,
    capture::{capture_udp, CompletedSpectra},
    exfil::{append_fb_header, FinalizeMeta, SpectraWriter},
    PACKETS_PER_SPECTRA, PACKET_SIZE,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(convert_filter(args.verbose.log_level_filter()))
        .init();

    info!("Filename stem: {}", args.filename);
    info!("Recording time: {} seconds", args.time);
    info!("Source: {}", args.source);
    info!("FPGA accumulation length: {} spectra", args.acc_len);
    info!("ADC sampling rate: {} MHz", args.sample_rate);
    info!("RF center frequency: {} MHz", args.rf_center);
    info!("IF center frequency: {} MHz", args.if_center);
    info!(
        "Spectrum *WILL{}* be flipped",
        if args.flip { "" } else { " NOT" }
    );
    info!(
        "Packet size: {} bytes ({} per spectra)",
        PACKET_SIZE, PACKETS_PER_SPECTRA
    );

    // Socket and file failures here are fatal - we never enter the receive
    // loop half-initialized
    let socket = UdpSocket::bind(("0.0.0.0", args.port))
        .with_context(|| format!("couldn't bind UDP port {}", args.port))?;
    socket
        .set_read_timeout(Some(Duration::from_secs(1)))
        .context("couldn't set socket read timeout")?;

    let start_time = Utc::now().timestamp();
    let fname_xx = format!("{}_xx_{}.raw", args.filename, start_time);
    let fname_yy = format!("{}_yy_{}.raw", args.filename, start_time);
    info!("Writing XX to {fname_xx}");
    info!("Writing YY to {fname_yy}");
    let fxx = File::create(&fname_xx).with_context(|| format!("couldn't create {fname_xx}"))?;
    let fyy = File::create(&fname_yy).with_context(|| format!("couldn't create {fname_yy}"))?;
    let mut writer = SpectraWriter::new(BufWriter::new(fxx), BufWriter::new(fyy));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::Relaxed))
        .context("couldn't install the ctrl-c handler")?;

    // At most one completed spectrum pair in flight per polarization
    let (spectra_tx, spectra_rx) = bounded::<CompletedSpectra>(1);

    let assembler = Assembler::new(args.flip);
    let record_secs = args.time;
    let running_rx = running.clone();
    let capture = thread::spawn(move || {
        capture_udp(&socket, assembler, spectra_tx, record_secs, &running_rx)
    });

    // Consume until the capture thread hangs up the sender
    for (index, xx, yy) in spectra_rx {
        writer
            .write_spectra(index, &xx, &yy)
            .context("writing spectra failed")?;
    }
    let packets = capture
        .join()
        .map_err(|_| anyhow::anyhow!("capture thread panicked"))?;
    info!(
        "Capture finished: {} packets, {} records per polarization",
        packets,
        writer.records()
    );
    drop(writer);

    if args.filterbank {
        append_fb_header(&FinalizeMeta {
            source: &args.source,
            acc_len: args.acc_len,
            sample_rate: args.sample_rate,
            rf_center: args.rf_center,
            if_center: args.if_center,
            filename_xx: &fname_xx,
            start_time,
        });
    }
    Ok(())
}
