use meshcloud::export::{read_points, ExportHeader};
use meshcloud::{export, Mesh, PointCloudEntity, SamplingConfig, Strategy, TickStatus};
use std::error::Error;
use std::fs::File;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let strategy: Strategy = args.next().as_deref().unwrap_or("volume").parse()?;
    let path = args.next().unwrap_or_else(|| "cube_points.bin".to_string());

    let mesh = Mesh::cube([0.0, 0.0, 0.0], 1.0);
    let config = SamplingConfig::new(4096, 42, strategy).with_chunk_size(512);
    let mut entity = PointCloudEntity::new(config);
    entity.request_sampling(&mesh)?;

    // A host would call tick from its timer; here we just spin.
    let mut ticks = 0;
    loop {
        ticks += 1;
        match entity.tick()? {
            TickStatus::Running { accepted, target } => {
                tracing::debug!(ticks, accepted, target, "still sampling");
            }
            status => {
                tracing::info!(ticks, ?status, "sampling settled");
                break;
            }
        }
    }

    let size = export::export_record(entity.record(), &path)?;
    let points = read_points(&mut File::open(&path)?)?;
    assert_eq!(points.header, ExportHeader::Complete(size));
    println!("wrote {} points ({} bytes) to {}", points.len(), size, path);
    Ok(())
}
