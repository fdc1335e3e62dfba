#[cfg(test)]
mod tests {
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;
    use transportlink::bridge::{OutputMode, MAX_PERIOD_FRAMES};
    use transportlink::cli::Args;
    use transportlink::config::{BeatSource, OutputKind, Settings, StartAnnouncement};
    use transportlink::generator::{PulseConfig, StartMode, DEFAULT_CLICKS_PER_BEAT};
    use transportlink::position::BeatSourceKind;
    use transportlink::Error;

    fn missing_config() -> PathBuf {
        std::env::temp_dir().join("transportlink-tests-no-such-file.toml")
    }

    fn load(extra: &[&str]) -> Result<Settings, Error> {
        let config = missing_config();
        let mut argv = vec!["transportlink", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(extra);
        Settings::load(&Args::parse_from(argv))
    }

    #[test]
    fn test_args_default_to_none() {
        let args = Args::parse_from(["transportlink"]);
        assert_eq!(args.initial_bpm, None);
        assert_eq!(args.output_mode, None);
        assert!(!args.list_midi_ports);
        assert_eq!(args.duration, None);
    }

    #[test]
    fn test_short_flags() {
        let args = Args::parse_from([
            "transportlink", "-s", "false", "-b", "133", "-q", "3", "-d", "8", "-t", "960", "-n",
            "bridge",
        ]);
        assert_eq!(args.start_stop_sync, Some(false));
        assert_eq!(args.initial_bpm, Some(133.0));
        assert_eq!(args.initial_quantum, Some(3.0));
        assert_eq!(args.initial_denom, Some(8.0));
        assert_eq!(args.initial_ticks_per_beat, Some(960.0));
        assert_eq!(args.client_name.as_deref(), Some("bridge"));
    }

    #[test]
    fn test_value_enums() {
        let args = Args::parse_from([
            "transportlink",
            "--output-mode",
            "click",
            "--beat-source",
            "free-running",
            "--start-mode",
            "every-bar",
        ]);
        assert_eq!(args.output_mode, Some(OutputKind::Click));
        assert_eq!(args.beat_source, Some(BeatSource::FreeRunning));
        assert_eq!(args.start_mode, Some(StartAnnouncement::EveryBar));
    }

    #[test]
    fn test_unknown_output_mode_is_rejected() {
        assert!(Args::try_parse_from(["transportlink", "--output-mode", "cv"]).is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = load(&[]).unwrap();
        assert_eq!(settings.client_name, "jack-transport-link");
        assert!(settings.start_stop_sync);
        assert_eq!(settings.initial_bpm, 100.0);
        assert_eq!(settings.initial_quantum, 4.0);
        assert_eq!(settings.initial_denom, 4.0);
        assert_eq!(settings.initial_ticks_per_beat, 1920.0);
        assert_eq!(settings.output_mode, OutputKind::MidiClock);
        assert_eq!(settings.beat_source, BeatSource::Session);
        assert_eq!(settings.start_mode, StartAnnouncement::TransportStart);
        assert!(!settings.delay_first_clock);
        assert_eq!(settings.clicks_per_beat, 4);
        assert_eq!(settings.sample_rate, 48_000);
        assert_eq!(settings.period_frames, 512);
        assert_eq!(settings.midi_output, None);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_command_line_overrides_defaults() {
        let settings = load(&[
            "-b",
            "140",
            "--output-mode",
            "click",
            "--clicks-per-beat",
            "2",
            "--midi-output",
            "Through",
        ])
        .unwrap();
        assert_eq!(settings.initial_bpm, 140.0);
        assert_eq!(settings.output_mode, OutputKind::Click);
        assert_eq!(settings.clicks_per_beat, 2);
        assert_eq!(settings.midi_output.as_deref(), Some("Through"));
    }

    #[test]
    fn test_settings_file_layer() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "initial_bpm = 90.0\noutput_mode = \"click\"\nbeat_source = \"free-running\"\nperiod_frames = 256"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let settings = Settings::load(&Args::parse_from(["transportlink", "--config", &path])).unwrap();
        assert_eq!(settings.initial_bpm, 90.0);
        assert_eq!(settings.output_mode, OutputKind::Click);
        assert_eq!(settings.beat_source, BeatSource::FreeRunning);
        assert_eq!(settings.period_frames, 256);

        let settings = Settings::load(&Args::parse_from([
            "transportlink",
            "--config",
            &path,
            "-b",
            "95",
        ]))
        .unwrap();
        assert_eq!(settings.initial_bpm, 95.0);
        assert_eq!(settings.output_mode, OutputKind::Click);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for extra in [
            &["-b", "0"][..],
            &["-q", "0.5"][..],
            &["-d", "0"][..],
            &["-t", "0"][..],
            &["--clicks-per-beat", "0"][..],
            &["--sample-rate", "0"][..],
            &["--period-frames", "0"][..],
            &["--period-frames", "8193"][..],
            &["--log-level", "loud"][..],
        ] {
            match load(extra) {
                Err(Error::Config(_)) => {}
                other => panic!("{:?} should be rejected, got {:?}", extra, other),
            }
        }
    }

    #[test]
    fn test_bridge_config_mapping() {
        let settings = load(&[
            "-b",
            "110",
            "-q",
            "3",
            "--start-mode",
            "every-bar",
            "--delay-first-clock",
            "true",
            "--beat-source",
            "free-running",
            "-s",
            "false",
        ])
        .unwrap();
        let config = settings.bridge_config();

        assert_eq!(config.initial_bpm, 110.0);
        assert_eq!(config.defaults.quantum, 3.0);
        assert_eq!(config.beat_source, BeatSourceKind::FreeRunning);
        assert!(!config.start_stop_sync);
        assert_eq!(
            config.output,
            OutputMode::MidiClock(PulseConfig {
                start_mode: StartMode::EveryBar,
                delay_first_clock: true,
            })
        );

        let click = load(&["--output-mode", "click", "--clicks-per-beat", "3"])
            .unwrap()
            .bridge_config();
        assert_eq!(click.output, OutputMode::Click { clicks_per_beat: 3 });
    }

    #[test]
    fn test_log_filter() {
        let settings = load(&["--log-level", "debug"]).unwrap();
        assert_eq!(settings.log_filter().unwrap(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_largest_click_period_is_accepted() {
        let settings = load(&["--period-frames", "8192"]).unwrap();
        assert_eq!(settings.period_frames as usize, MAX_PERIOD_FRAMES);
        assert_eq!(settings.clicks_per_beat, DEFAULT_CLICKS_PER_BEAT);
    }
}
