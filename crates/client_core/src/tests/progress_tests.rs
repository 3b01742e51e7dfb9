use super::*;

fn meter() -> (ProgressMeter, broadcast::Receiver<ControllerEvent>) {
    let (events, rx) = broadcast::channel(256);
    (ProgressMeter::new(ProgressPolicy::default(), events), rx)
}

fn drain_percents(rx: &mut broadcast::Receiver<ControllerEvent>) -> Vec<f64> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ControllerEvent::Progress(view) = event {
            out.push(view.percent);
        }
    }
    out
}

#[test]
fn transfer_maps_linearly_into_first_thirty_percent() {
    let (meter, _rx) = meter();
    meter.begin(2, Scale::X4);
    assert_eq!(meter.percent(), 0.0);

    meter.record_transfer(50, 100);
    assert!((meter.percent() - 15.0).abs() < f64::EPSILON);
    assert_eq!(meter.view().stage, ProgressStage::Uploading);

    meter.record_transfer(100, 100);
    let view = meter.view();
    assert_eq!(view.percent, TRANSFER_CEILING);
    assert_eq!(view.stage, ProgressStage::Processing);
}

#[test]
fn begin_describes_the_batch() {
    let (meter, _rx) = meter();
    meter.begin(3, Scale::X2);
    let view = meter.view();
    assert_eq!(view.detail, "Upscaling 3 image(s) at 2x");
}

#[test]
fn empty_transfer_goes_straight_to_processing() {
    let (meter, _rx) = meter();
    meter.begin(1, Scale::X4);
    meter.record_transfer(0, 0);
    assert_eq!(meter.view().stage, ProgressStage::Processing);
}

#[test]
fn synthetic_steps_only_apply_while_processing_and_stop_at_ninety() {
    let (meter, _rx) = meter();
    meter.begin(1, Scale::X4);
    meter.synthetic_step(2.0);
    assert_eq!(meter.percent(), 0.0);

    meter.record_transfer(10, 10);
    for _ in 0..100 {
        meter.synthetic_step(2.5);
    }
    assert_eq!(meter.percent(), SYNTHETIC_CEILING);
}

#[test]
fn progress_never_decreases_during_transfer() {
    let (meter, mut rx) = meter();
    meter.begin(1, Scale::X4);
    meter.record_transfer(80, 100);
    meter.record_transfer(40, 100);
    assert!((meter.percent() - 24.0).abs() < 1e-9);

    let percents = drain_percents(&mut rx);
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn complete_forces_one_hundred_from_any_stage() {
    let (meter, _rx) = meter();
    meter.begin(1, Scale::X4);
    meter.record_transfer(1, 10);
    meter.complete();
    assert_eq!(meter.percent(), COMPLETE);

    meter.record_transfer(10, 10);
    meter.synthetic_step(1.0);
    assert_eq!(meter.percent(), COMPLETE);
}

#[test]
fn halt_freezes_value_without_emitting() {
    let (meter, mut rx) = meter();
    meter.begin(1, Scale::X4);
    meter.record_transfer(5, 10);
    drain_percents(&mut rx);

    meter.halt();
    meter.record_transfer(10, 10);
    meter.synthetic_step(3.0);
    assert!((meter.percent() - 15.0).abs() < 1e-9);
    assert!(drain_percents(&mut rx).is_empty());
}

#[test]
fn detached_transfer_progress_ignores_reports() {
    TransferProgress::detached().report(1, 2);
}

#[tokio::test(start_paused = true)]
async fn ticker_climbs_to_the_synthetic_ceiling() {
    let (meter, mut rx) = meter();
    meter.begin(1, Scale::X4);
    meter.record_transfer(1, 1);
    drain_percents(&mut rx);

    let ticker = ProgressTicker::spawn(meter.clone());
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(meter.percent(), SYNTHETIC_CEILING);

    let percents = drain_percents(&mut rx);
    assert!(!percents.is_empty());
    assert!(percents.iter().all(|p| (TRANSFER_CEILING..=SYNTHETIC_CEILING).contains(p)));
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    ticker.cancel();
}

#[tokio::test(start_paused = true)]
async fn ticker_does_not_step_before_the_first_interval() {
    let (meter, _rx) = meter();
    meter.begin(1, Scale::X4);
    meter.record_transfer(1, 1);

    let _ticker = ProgressTicker::spawn(meter.clone());
    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(meter.percent(), TRANSFER_CEILING);
}

#[tokio::test(start_paused = true)]
async fn dropped_ticker_stops_mutating() {
    let (meter, mut rx) = meter();
    meter.begin(1, Scale::X4);
    meter.record_transfer(1, 1);

    let ticker = ProgressTicker::spawn(meter.clone());
    tokio::time::sleep(Duration::from_millis(3500)).await;
    drop(ticker);
    let frozen = meter.percent();
    drain_percents(&mut rx);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(meter.percent(), frozen);
    assert!(drain_percents(&mut rx).is_empty());
}
