use spool::{Region, RegionConfig};
use spool_log::RegionLayer;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tracing_subscriber::layer::SubscriberExt;

fn read_segments(root: &Path) -> String {
    spool::fs::list_files(&root.join("files"))
        .unwrap()
        .iter()
        .map(|f| std::fs::read_to_string(&f.path).unwrap())
        .collect()
}

#[test]
fn test_events_recorded() {
    let dir = tempdir().unwrap();
    let region = Arc::new(Region::create(RegionConfig::new(dir.path(), 1 << 20).unwrap()).unwrap());
    let subscriber = tracing_subscriber::registry().with(RegionLayer::new(region.clone()));

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "app", "started {}", 7);
        tracing::warn!(target: "app::net", peer = "10.0.0.1", retries = 3, "slow peer");
        tracing::error!(target: "spool::region", "internal, never recorded");
    });
    region.sync().unwrap();

    let text = read_segments(dir.path());
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2, "{text}");
    assert!(lines[0].ends_with(" I/app: started 7"));
    assert!(lines[1].ends_with(" W/app::net: slow peer peer=10.0.0.1 retries=3"));
}

#[test]
fn test_small_buffer_flushes_lines_in_order() {
    let dir = tempdir().unwrap();
    let config = RegionConfig::new(dir.path(), 1 << 20)
        .unwrap()
        .with_cache_size(64)
        .unwrap();
    let region = Arc::new(Region::create(config).unwrap());
    let subscriber = tracing_subscriber::registry().with(RegionLayer::new(region.clone()));

    tracing::subscriber::with_default(subscriber, || {
        for i in 0..20 {
            tracing::info!(target: "app", "line {}", i);
        }
    });
    region.sync().unwrap();

    // 52 payload bytes hold one line, so every following line overflows
    let stats = region.stats();
    assert_eq!(stats.writes, 20);
    assert_eq!(stats.flushes, 20);

    let text = read_segments(dir.path());
    let expected: Vec<_> = (0..20).map(|i| format!(" I/app: line {}", i)).collect();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 20);
    for (line, suffix) in lines.iter().zip(&expected) {
        assert!(line.ends_with(suffix.as_str()), "{line}");
    }
}
