//! Backend tests for lux-compute.

use lux_compute::{CpuBackend, PreviewBackend, ProbeOutcome, Tier};
use lux_core::RasterImage;

#[test]
fn test_cpu_tier_available() {
    assert!(Tier::Cpu.is_available());
}

#[test]
fn test_cuda_tier_reserved() {
    assert!(!Tier::Cuda.is_available());
    let backend = PreviewBackend::builder().gpu_statistics(false).build();
    let (_, cuda) = backend.probe_report().iter().find(|(t, _)| *t == Tier::Cuda).unwrap();
    assert!(matches!(cuda, ProbeOutcome::Failed(_)));
}

#[test]
fn test_auto_tier() {
    let backend = PreviewBackend::new();
    println!("Auto-selected tier: {}", backend.tier());
    assert_ne!(backend.tier(), Tier::Cuda);
    let selected: Vec<_> = backend
        .probe_report()
        .iter()
        .filter(|(_, o)| *o == ProbeOutcome::Selected)
        .map(|(t, _)| *t)
        .collect();
    assert_eq!(selected, vec![backend.tier()]);
}

#[test]
fn test_describe_auto_selection() {
    let desc = PreviewBackend::new().describe();
    println!("{}", desc);
    assert!(desc.contains("[-] cuda"));
    assert!(desc.contains("[+] gpu") || desc.contains("[+] cpu"));
    assert_eq!(desc.lines().count(), 3);
}

#[test]
fn test_cpu_backend_modes_agree() {
    let mut img = RasterImage::new(16, 9);
    for y in 0..9 {
        for x in 0..16 {
            img.set_pixel(x, y, [(x * 16) as u8, (y * 28) as u8, 77, 255]);
        }
    }
    let serial = CpuBackend::new(false).compute_stats(&img);
    let parallel = CpuBackend::new(true).compute_stats(&img);
    assert_eq!(serial.count, parallel.count);
    assert_eq!(serial.histogram, parallel.histogram);
}
