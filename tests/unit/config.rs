use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn defaults_apply_without_env() {
    let cfg = ServiceConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, ServiceConfig::default());
    assert_eq!(cfg.port, 5500);
    assert_eq!(cfg.domain, "http://localhost:5500");
    assert_eq!(
        cfg.font_path,
        PathBuf::from("fonts/TiroDevanagariMarathi-Italic.ttf")
    );
    assert!(!cfg.allow_local_files);
}

#[test]
fn env_values_override_defaults() {
    let cfg = ServiceConfig::from_lookup(lookup(&[
        ("FONT_PATH", "/srv/fonts/a.otf"),
        ("IMAGE_PATH", "/srv/images"),
        ("PUBLIC_PATH", "/srv/public"),
        ("DOMAIN", "https://cap.example.com"),
        ("PORT", "8080"),
        ("ALLOW_LOCAL_FILES", "true"),
    ]))
    .unwrap();
    assert_eq!(cfg.font_path, PathBuf::from("/srv/fonts/a.otf"));
    assert_eq!(cfg.image_dir, PathBuf::from("/srv/images"));
    assert_eq!(cfg.public_dir, PathBuf::from("/srv/public"));
    assert_eq!(cfg.domain, "https://cap.example.com");
    assert_eq!(cfg.port, 8080);
    assert!(cfg.allow_local_files);
}

#[test]
fn blank_env_values_are_ignored() {
    let cfg = ServiceConfig::from_lookup(lookup(&[("PORT", " "), ("DOMAIN", "")])).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.domain, DEFAULT_DOMAIN);
}

#[test]
fn invalid_port_is_an_error() {
    for bad in ["abc", "70000", "-1"] {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", bad)])).unwrap_err();
        assert!(err.to_string().contains("PORT"), "{err}");
    }
    assert!(ServiceConfig::from_lookup(lookup(&[("ALLOW_LOCAL_FILES", "maybe")])).is_err());
}

#[test]
fn cli_overrides_win_over_env() {
    let cfg = ServiceConfig::from_lookup(lookup(&[("PORT", "8080"), ("DOMAIN", "http://a")]))
        .unwrap()
        .with_overrides(ConfigOverrides {
            port: Some(9000),
            ..ConfigOverrides::default()
        });
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.domain, "http://a");
    assert_eq!(cfg.bind_addr(), SocketAddr::from(([0, 0, 0, 0], 9000)));
}

#[test]
fn overrides_parse_from_command_line_flags() {
    use clap::Parser as _;

    #[derive(clap::Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        overrides: ConfigOverrides,
    }

    let cli = Cli::try_parse_from([
        "imgcaption",
        "--port",
        "9000",
        "--image-dir",
        "/srv/images",
        "--allow-local-files",
    ])
    .unwrap();
    let cfg = ServiceConfig::default().with_overrides(cli.overrides);
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.image_dir, PathBuf::from("/srv/images"));
    assert!(cfg.allow_local_files);
    assert_eq!(cfg.domain, DEFAULT_DOMAIN);

    assert!(Cli::try_parse_from(["imgcaption", "--port", "nope"]).is_err());
}
