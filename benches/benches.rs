use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use spectra_slurper::{
    assemble::Assembler, exfil::SpectraWriter, packet::Packet, CHANNELS, PACKET_SIZE,
};

fn benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();

    let mut dummy_datagram = [0u8; PACKET_SIZE];
    rng.fill(&mut dummy_datagram[..]);

    c.bench_function("datagram decode", |b| {
        b.iter(|| Packet::from_datagram(black_box(&dummy_datagram)).unwrap())
    });

    // Zero the sequence so the assembler is phase-locked from the first packet
    let mut aligned = dummy_datagram;
    aligned[..8].copy_from_slice(&0u64.to_be_bytes());
    let pkt = Packet::from_datagram(&aligned).unwrap();
    let mut asm = Assembler::new(false);
    c.bench_function("segment placement", |b| {
        b.iter(|| asm.process(black_box(&pkt)))
    });

    let xx = Box::new([0f32; CHANNELS]);
    let yy = Box::new([0f32; CHANNELS]);
    let mut writer = SpectraWriter::new(std::io::sink(), std::io::sink());
    let mut index = 0u64;
    c.bench_function("spectra write", |b| {
        b.iter(|| {
            index += 1;
            writer
                .write_spectra(black_box(index), black_box(&xx), black_box(&yy))
                .unwrap()
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
