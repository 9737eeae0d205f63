//! A control loop consuming two sensors published from other threads.
//!
//! `cameraState` runs at 20 Hz and `carState` at 100 Hz. The camera stops
//! after one second so the loop can be seen declaring it dead.
//!
//! Run with: cargo run --example control_loop

use std::thread;
use std::time::{Duration, Instant};

use cadence::prelude::*;
use cadence::services::ServiceTable;
use tracing::{info, warn};

#[derive(Debug, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct SensorSample {
    value: f32,
}

impl Payload for SensorSample {
    const WHICH: u16 = 2;
}

fn spawn_sensor(ctx: InprocContext, topic: &'static str, hz: f64, run_for: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut pm: PubMaster = match PubMaster::new(&ctx, [topic]) {
            Ok(pm) => pm,
            Err(e) => {
                warn!("{topic}: {e}");
                return;
            }
        };
        let period = Duration::from_secs_f64(1.0 / hz);
        let start = Instant::now();
        let mut msg = MessageBuilder::new();
        let mut tick = 0u32;
        while start.elapsed() < run_for {
            let built = msg
                .init_event(true)
                .set_payload(&SensorSample {
                    value: tick as f32,
                })
                .map(|_| ());
            if let Err(e) = built.and_then(|()| pm.send(topic, &mut msg)) {
                warn!("{topic}: send failed: {e}");
            }
            tick += 1;
            thread::sleep(period);
        }
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let ctx = InprocContext::create()?;
    let services = ServiceTable::new()
        .with_service("cameraState", 20.0)
        .with_service("carState", 100.0);
    let mut sm: SubMaster = SubMaster::with_config(
        &ctx,
        ["cameraState", "carState"],
        SubMasterConfig::default().with_services(services),
    )?;
    sm.drain()?;

    let sensors = [
        spawn_sensor(ctx.clone(), "cameraState", 20.0, Duration::from_secs(1)),
        spawn_sensor(ctx.clone(), "carState", 100.0, Duration::from_secs(3)),
    ];

    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(3) {
        sm.update(DEFAULT_UPDATE_TIMEOUT_MS)?;
        if sm.frame() % 50 != 0 {
            continue;
        }

        let sample = sm
            .get("carState")?
            .archived::<SensorSample>()
            .map(|s| s.value.to_native());
        info!(
            "frame {:>4}: camera alive={} car alive={} car sample={:?} all_ok={}",
            sm.frame(),
            sm.alive("cameraState")?,
            sm.alive("carState")?,
            sample,
            sm.all_alive_and_valid(&[])?
        );
    }

    for sensor in sensors {
        let _ = sensor.join();
    }
    Ok(())
}
