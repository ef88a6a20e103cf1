use linefield::config;
use linefield::game::lines::TimingLineField;
use linefield::game::lines::recording::RecordingBackend;
use linefield::game::map::MapTiming;
use log::{error, info};

// Simulated frame step, roughly 240Hz.
const FRAME_MS: f32 = 1000.0 / 240.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    // Startup default when config is missing or malformed.
    log::set_max_level(log::LevelFilter::Warn);

    let cfg = config::load(config::CONFIG_PATH);
    log::set_max_level(cfg.log_level.as_level_filter());

    let map = match std::env::args().nth(1) {
        Some(path) => MapTiming::load(&path).map_err(|e| {
            error!("Failed to load map '{path}': {e}");
            e
        })?,
        None => {
            info!("No map given; using the built-in demo chart.");
            MapTiming::demo()
        }
    };

    let length_ms = map.length_ms;
    let mut field = TimingLineField::load(&cfg, map, |_| RecordingBackend::default());

    let mut frames = 0u64;
    let mut peak_active = 0usize;
    let mut overflowed = 0usize;
    let mut time_ms = -2000.0_f32;
    while time_ms <= length_ms + 2000.0 {
        let stats = field.update(time_ms);
        peak_active = peak_active.max(stats.active);
        overflowed += stats.overflowed;
        frames += 1;
        time_ms += FRAME_MS;
    }

    for manager in field.managers() {
        let backend = manager.backend();
        println!(
            "{:>4}: {} lines, pool {} ({} overflow), {} visuals created, {} moves",
            manager.layout().direction.to_string(),
            manager.lines().len(),
            manager.max_visible(),
            manager.pool().overflow_created(),
            backend.created(),
            backend.moves()
        );
    }
    println!("{frames} frames, peak {peak_active} active lines, {overflowed} overflow allocations");

    field.dispose();
    Ok(())
}
