use pagepair::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../pagepair.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(cfg.worker.concurrency >= 1);
    assert!(!cfg.paths.out_dir.is_empty());
    assert_eq!(cfg.tools.raster_dpi, 100);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[worker]\nconcurrency = 4\n").expect("parse TOML");
    assert_eq!(cfg.worker.concurrency, 4);
    assert_eq!(cfg.limits.max_input_file_bytes, 5 * 1024 * 1024);
    assert_eq!(cfg.output.manifest_filename, "output.json");
    assert!(cfg.security.reject_url_inputs);
}
