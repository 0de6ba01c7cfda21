//! Drive the dance core without a renderer: load the bundled rig, switch
//! styles, force a stall and print what happens.

use vizij_dance_core::{
    DanceConfig, DanceEvent, DanceViewer, ManualClock, Mixer, ModelLibrary,
};

fn main() -> anyhow::Result<()> {
    let mut lib = ModelLibrary::new();
    lib.insert_json(include_str!("../tests/fixtures/samba_dancing.json"))?;

    let clock = ManualClock::new(0.0);
    let mut viewer = DanceViewer::new(DanceConfig::default(), lib)?.with_clock(clock.clone());
    viewer.load_model("Samba Dancing")?;

    let dt = 1.0 / 60.0;
    let run = |viewer: &mut DanceViewer, secs: f64| {
        for _ in 0..(secs / dt).round() as usize {
            clock.advance(dt);
            let events = viewer.frame(dt as f32).events.clone();
            for event in events {
                match event {
                    DanceEvent::Status(_) | DanceEvent::TempoVaried { .. } => {}
                    other => println!("[{:6.2}s] {:?}", viewer.now(), other),
                }
            }
        }
    };

    run(&mut viewer, 1.0);
    viewer.select_style("Samba Rock")?;
    run(&mut viewer, 1.0);

    if let Some(h) = viewer.controller().active_handle() {
        println!("forcing a stall on {h:?}");
        if let Some(mixer) = viewer.mixer_mut() {
            mixer.stop(h);
        }
    }
    run(&mut viewer, 2.0);

    println!("{}", serde_json::to_string_pretty(&viewer.status())?);
    Ok(())
}
