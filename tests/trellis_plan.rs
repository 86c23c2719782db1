use ecp5_mini::trellis::PrepareOverrides;
use ecp5_mini::{BoardError, Ecp5MiniPlatform, Fragment, Platform};

#[test]
fn bundle_subsignals_get_indexed_locate_lines() {
    let board = Ecp5MiniPlatform::new();
    let mut fragment = Fragment::new();
    fragment.request(&board, "spi_flash_4x", 0).unwrap();
    fragment.request(&board, "sd_card_4bit", 0).unwrap();

    let plan = board
        .toolchain_prepare(&fragment, "flash", &PrepareOverrides::new())
        .unwrap();
    let lpf = &plan.files["flash.lpf"];

    assert!(lpf.starts_with("# Automatically generated"));
    assert!(lpf.contains("BLOCK ASYNCPATHS;\nBLOCK RESETPATHS;\n"));
    assert!(lpf.contains("LOCATE COMP \"spi_flash_4x_0__cs__io\" SITE \"N8\";"));
    assert!(lpf.contains("LOCATE COMP \"spi_flash_4x_0__dq__io[0]\" SITE \"T8\";"));
    assert!(lpf.contains("LOCATE COMP \"spi_flash_4x_0__dq__io[3]\" SITE \"N7\";"));
    assert!(lpf.contains("IOBUF PORT \"sd_card_4bit_0__clk__io\" IO_TYPE=LVCMOS33 SLEWRATE=FAST;"));
    assert!(!lpf.contains("FREQUENCY"));
}

#[test]
fn add_preferences_is_appended_verbatim() {
    let board = Ecp5MiniPlatform::new();
    let overrides =
        PrepareOverrides::new().set("add_preferences", "SYSCONFIG MASTER_SPI_PORT=ENABLE;");
    let plan = board.toolchain_prepare(&Fragment::new(), "top", &overrides).unwrap();
    assert!(plan.files["top.lpf"].ends_with("SYSCONFIG MASTER_SPI_PORT=ENABLE;\n"));
    assert_eq!(plan.options.get("ecppack_opts"), Some("--compress --freq 38.8"));
}

#[test]
fn unrecognized_options_pass_through_to_the_plan() {
    let board = Ecp5MiniPlatform::new();
    let overrides = PrepareOverrides::new().set("script_after_read", "opt_clean");
    let plan = board.toolchain_prepare(&Fragment::new(), "top", &overrides).unwrap();
    assert_eq!(plan.options.get("script_after_read"), Some("opt_clean"));
}

#[test]
fn requesting_unknown_resource_fails() {
    let board = Ecp5MiniPlatform::new();
    let mut fragment = Fragment::new();
    let err = fragment.request(&board, "hdmi", 0).unwrap_err();
    assert!(matches!(err, BoardError::UnknownResource(ref key) if key.name == "hdmi"));
    assert!(fragment.requests().is_empty());
}

#[test]
fn requesting_twice_fails() {
    let board = Ecp5MiniPlatform::new();
    let mut fragment = Fragment::new();
    fragment.request(&board, "led", 0).unwrap();
    assert!(matches!(
        fragment.request(&board, "led", 0),
        Err(BoardError::DuplicateResource(_))
    ));
}

#[test]
fn write_to_materializes_every_file() {
    let board = Ecp5MiniPlatform::new();
    let fragment = ecp5_mini::blinky::blinky(&board).unwrap();
    let plan = board
        .toolchain_prepare(&fragment, "top", &PrepareOverrides::new())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    plan.write_to(dir.path()).unwrap();
    for name in ["top.v", "top.ys", "top.lpf", "build_top.sh"] {
        assert!(dir.path().join(name).exists(), "{name} should be written");
    }
}

#[test]
fn plan_lists_active_low_ports_at_raw_pad_polarity() {
    let board = Ecp5MiniPlatform::new();
    let mut fragment = Fragment::new();
    fragment.request(&board, "program", 0).unwrap();
    fragment.request(&board, "led", 0).unwrap();
    fragment.request(&board, "led", 8).unwrap();
    fragment.request(&board, "spi_flash_1x", 0).unwrap();

    let plan = board
        .toolchain_prepare(&fragment, "top", &PrepareOverrides::new())
        .unwrap();
    assert_eq!(
        plan.active_low_ports,
        vec![
            "program_0__io",
            "led_8__io",
            "spi_flash_1x_0__cs__io",
            "spi_flash_1x_0__wp__io",
            "spi_flash_1x_0__hold__io",
        ]
    );
    assert!(plan.files["top.lpf"].contains("LOCATE COMP \"led_8__io\" SITE \"R8\";"));
}

#[test]
fn blinky_inverts_exactly_the_active_low_leds() {
    let board = Ecp5MiniPlatform::new();
    let fragment = ecp5_mini::blinky::blinky(&board).unwrap();
    let plan = board
        .toolchain_prepare(&fragment, "top", &PrepareOverrides::new())
        .unwrap();
    assert_eq!(plan.active_low_ports, vec!["led_8__io", "led_9__io"]);

    let source = &plan.files["top.v"];
    for n in 0..10 {
        let inverted = source.contains(&format!("assign led_{n}__io = ~counter["));
        assert_eq!(inverted, plan.active_low_ports.contains(&format!("led_{n}__io")));
    }
}
