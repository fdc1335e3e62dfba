use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use transportlink::bridge::{BridgeConfig, ClockBridge};
use transportlink::host::{spawn_driver, Bbt, HostClient, PortOutput, SimulatedHost, TransportHost};
use transportlink::midi::{ClockMessage, MidiEngine, MockMidiEngine, CLOCKS_PER_BEAT};
use transportlink::session::LocalSession;
use transportlink::tempo::TempoCell;

fn bar_two() -> Bbt {
    Bbt {
        bar: 2,
        beat: 1,
        tick: 0,
        bar_start_tick: 0.0,
        beats_per_bar: 4.0,
        beat_type: 4.0,
        ticks_per_beat: 1920.0,
        beats_per_minute: 120.0,
    }
}

fn forward(engine: &mut dyn MidiEngine, output: PortOutput<'_>) {
    if let PortOutput::Midi(events) = output {
        for event in events {
            engine.send(event.message).unwrap();
        }
    }
}

fn bridge(host: &Arc<SimulatedHost>) -> ClockBridge<LocalSession> {
    ClockBridge::new(
        host.clone(),
        Arc::new(LocalSession::new(120.0)),
        Arc::new(TempoCell::new(120.0)),
        BridgeConfig {
            initial_bpm: 120.0,
            ..BridgeConfig::default()
        },
    )
}

#[test]
fn test_mock_engine_records_in_order() {
    let mut engine = MockMidiEngine::new();
    let observer = engine.clone();
    engine.send(ClockMessage::Start).unwrap();
    engine.send(ClockMessage::Clock).unwrap();
    engine.send(ClockMessage::Stop).unwrap();

    assert_eq!(
        observer.sent(),
        vec![ClockMessage::Start, ClockMessage::Clock, ClockMessage::Stop]
    );
}

#[test]
fn test_one_beat_of_forwarded_clock() {
    let host = Arc::new(SimulatedHost::new(48_000, 512));
    let mut bridge = bridge(&host);
    let mut engine = MockMidiEngine::new();

    host.locate_bbt(bar_two());
    host.start();

    // One beat at 120 BPM is 24000 frames; run a little past it.
    let period = 10_667;
    for cycle in 0..50u64 {
        host.run_cycle(&mut bridge, cycle * period);
        forward(&mut engine, bridge.output());
    }

    let sent = engine.sent();
    assert_eq!(sent[0], ClockMessage::Start);
    let clocks = sent.iter().filter(|m| **m == ClockMessage::Clock).count();
    assert!(clocks > CLOCKS_PER_BEAT as usize);
    assert!(!sent.contains(&ClockMessage::Stop));

    host.stop();
    host.run_cycle(&mut bridge, 50 * period);
    forward(&mut engine, bridge.output());
    assert_eq!(engine.sent().last(), Some(&ClockMessage::Stop));
}

#[test]
fn test_driver_delivers_output_to_sink() {
    let host = Arc::new(SimulatedHost::new(48_000, 512));
    let engine = MockMidiEngine::new();
    let running = Arc::new(AtomicBool::new(true));

    let mut sink_engine = engine.clone();
    let driver = spawn_driver(
        host.clone(),
        Box::new(bridge(&host)),
        running.clone(),
        move |output| forward(&mut sink_engine, output),
    )
    .unwrap();

    host.locate_bbt(bar_two());
    host.start();

    let deadline = Instant::now() + Duration::from_secs(2);
    while !engine.sent().contains(&ClockMessage::Start) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    running.store(false, Ordering::Release);
    driver.join().unwrap();
    assert_eq!(engine.sent().first(), Some(&ClockMessage::Start));
}
