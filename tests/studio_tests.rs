use std::io::Cursor;
use std::thread;
use std::time::Duration;

use phonkmachine::{
    FixedBpm, Instrument, OfflineOutput, PatternStore, PhonkError, SessionState, Studio,
    StudioConfig, Tempo, STEPS,
};

const SR: f32 = 8_000.0;

fn wav(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample(((i % 40) as i16 - 20) * 500).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn studio() -> (Studio, OfflineOutput) {
    let output = OfflineOutput::new(SR);
    (Studio::new(Box::new(output.clone())), output)
}

#[test]
fn invalid_upload_then_play_reports_no_source() {
    let (mut studio, out) = studio();
    assert!(matches!(studio.load_file(b"RIFF but not really"), Err(PhonkError::DecodeFailure(_))));
    assert_eq!(studio.play_track(), Err(PhonkError::NoSourceLoaded));
    assert!(!studio.is_track_playing());
    assert!(out.render(200).iter().all(|s| *s == 0.0));
}

#[test]
fn uploaded_track_plays_and_stops() {
    let (mut studio, out) = studio();
    studio.set_detector(Box::new(FixedBpm(Tempo::new(150).unwrap())));
    assert_eq!(studio.load_file(&wav(16_000, 2, 1_600)).unwrap().bpm(), 150);

    studio.play_track().unwrap();
    assert!(studio.is_track_playing());
    assert!(out.render(200).iter().any(|s| s.abs() > 0.0));

    studio.stop_track();
    assert!(!studio.is_track_playing());
    assert!(out.render(200).iter().all(|s| *s == 0.0));
}

#[test]
fn classic_morro_cowbell_on_the_quarters() {
    let (studio, _out) = studio();
    studio.clear(Instrument::Cowbell);
    studio.load_preset("Classic Morro").unwrap();
    let cowbell = *studio.pattern().steps(Instrument::Cowbell);
    for (step, on) in cowbell.iter().enumerate() {
        assert_eq!(*on, step % 4 == 0, "step {}", step);
    }
}

#[test]
fn volume_and_mute_reach_the_output() {
    let (studio, out) = studio();
    studio.set_master_volume(50.0, false);
    studio.trigger_now(Instrument::Kick);
    let loud = out.render(400);

    studio.set_master_volume(50.0, true);
    studio.trigger_now(Instrument::Kick);
    assert!(out.render(400).iter().all(|s| *s == 0.0));

    assert!(loud.iter().any(|s| s.abs() > 0.0));
    assert!(loud.iter().all(|s| s.abs() <= 0.5));
}

#[test]
fn running_sequencer_fires_hits_and_stop_is_final() {
    let (mut studio, out) = studio();
    studio.set_target_bpm(180);
    studio.start().unwrap();
    thread::sleep(Duration::from_millis(30));
    assert!(studio.is_running());
    // Classic Morro downbeat: kick and cowbell
    assert!(studio.session().lock().active_voices() >= 2);

    studio.stop();
    out.render(8_000);
    assert_eq!(studio.session().lock().active_voices(), 0);
    thread::sleep(Duration::from_millis(150));
    assert_eq!(studio.session().lock().active_voices(), 0);
    assert_eq!(studio.current_step(), 0);
}

#[test]
fn denied_output_keeps_the_clock_alive() {
    let (mut studio, out) = studio();
    out.deny(true);
    studio.start().unwrap();
    thread::sleep(Duration::from_millis(20));
    assert!(studio.is_running());
    assert_eq!(studio.session().lock().state(), SessionState::Uninitialized);
    studio.stop();

    out.deny(false);
    studio.trigger_now(Instrument::HiHat);
    assert_eq!(studio.session().lock().state(), SessionState::Ready);
}

#[test]
fn randomize_only_touches_one_instrument() {
    let (studio, _out) = studio();
    let before = studio.pattern();
    studio.set_density(1.0);
    studio.randomize(Instrument::Snare);
    let after = studio.pattern();
    assert_eq!(after.steps(Instrument::Snare), &[true; STEPS]);
    for other in [Instrument::Kick, Instrument::HiHat, Instrument::Cowbell] {
        assert_eq!(after.steps(other), before.steps(other));
    }
}

#[test]
fn config_file_drives_the_studio() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("groove.pat"),
        "kick:    x...x...x...x...\nsnare:   ....x.......x...\n",
    ).unwrap();
    let cfg_path = dir.path().join("studio.cfg");
    std::fs::write(
        &cfg_path,
        "// late set\nbpm: 92\nvolume: 40\npreset: Aggressive\npattern: groove.pat\ndensity: 0.5\n",
    ).unwrap();

    let config = StudioConfig::load(&cfg_path).unwrap();
    let output = OfflineOutput::new(SR);
    let studio = Studio::with_config(Box::new(output), &config).unwrap();

    assert_eq!(studio.target_tempo().bpm(), 92);
    let pattern = studio.pattern();
    assert_eq!(pattern.density(), 0.5);
    assert_eq!(pattern.active_at(4), vec![Instrument::Kick, Instrument::Snare]);
    assert_eq!(pattern.steps(Instrument::Cowbell), PatternStore::empty().steps(Instrument::Cowbell));
    assert_eq!(studio.session().lock().effective_gain(), 0.4);
}

#[test]
fn config_with_unknown_preset_fails() {
    let config = StudioConfig::from_cfg("preset: Trap House").unwrap();
    let result = Studio::with_config(Box::new(OfflineOutput::new(SR)), &config);
    assert!(matches!(result, Err(PhonkError::UnknownPreset(_))));
}
