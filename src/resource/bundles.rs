//! Constructors for the common peripheral bundles found on FPGA boards.

use super::{Attrs, Direction, Pins, Resource, Subsignal};

/// One single-bit output resource per pad, numbered from `first_number`.
pub fn led_resources(
    name: &str,
    first_number: u32,
    pins: &str,
    invert: bool,
    attrs: &Attrs,
) -> Vec<Resource> {
    single_bit_resources(name, first_number, pins, invert, Direction::Output, attrs)
}

/// One single-bit input resource per `(number, pad)` pair.
pub fn button_resources(pins: &[(u32, &str)], invert: bool, attrs: &Attrs) -> Vec<Resource> {
    pins.iter()
        .map(|&(number, pad)| {
            Resource::new("button", number, polarity(pad, Direction::Input, invert))
                .attrs(attrs.clone())
        })
        .collect()
}

fn single_bit_resources(
    name: &str,
    first_number: u32,
    pins: &str,
    invert: bool,
    dir: Direction,
    attrs: &Attrs,
) -> Vec<Resource> {
    pins.split_whitespace()
        .zip(first_number..)
        .map(|(pad, number)| {
            Resource::new(name, number, polarity(pad, dir, invert)).attrs(attrs.clone())
        })
        .collect()
}

fn polarity(pads: &str, dir: Direction, invert: bool) -> Pins {
    if invert {
        Pins::inverted(pads, dir)
    } else {
        Pins::new(pads, dir)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DirectUsbPins<'a> {
    pub d_p: &'a str,
    pub d_n: &'a str,
    pub pullup: Option<&'a str>,
    pub vbus_valid: Option<&'a str>,
}

/// USB data lines wired straight to FPGA pads.
pub fn direct_usb_resource(number: u32, pins: DirectUsbPins<'_>, attrs: &Attrs) -> Resource {
    let mut ios = vec![
        Subsignal::new("d_p", Pins::new(pins.d_p, Direction::InOut)),
        Subsignal::new("d_n", Pins::new(pins.d_n, Direction::InOut)),
    ];
    if let Some(pullup) = pins.pullup {
        ios.push(Subsignal::new("pullup", Pins::new(pullup, Direction::Output)));
    }
    if let Some(vbus_valid) = pins.vbus_valid {
        ios.push(Subsignal::new("vbus_valid", Pins::new(vbus_valid, Direction::Input)));
    }
    Resource::bundle("usb", number, ios).attrs(attrs.clone())
}

#[derive(Debug, Clone, Copy)]
pub struct SpiFlashPins<'a> {
    pub cs: &'a str,
    pub clk: &'a str,
    pub copi: &'a str,
    pub cipo: &'a str,
    pub wp: Option<&'a str>,
    pub hold: Option<&'a str>,
}

/// `spi_flash_1x`, `spi_flash_2x` and (with WP/HOLD wired) `spi_flash_4x`.
///
/// The wider views reuse the pads of `spi_flash_1x`.
pub fn spi_flash_resources(number: u32, pins: SpiFlashPins<'_>, attrs: &Attrs) -> Vec<Resource> {
    let common = || {
        vec![
            Subsignal::new("cs", Pins::inverted(pins.cs, Direction::Output)),
            Subsignal::new("clk", Pins::new(pins.clk, Direction::Output)),
        ]
    };

    let mut io_1x = common();
    io_1x.push(Subsignal::new("copi", Pins::new(pins.copi, Direction::Output)));
    io_1x.push(Subsignal::new("cipo", Pins::new(pins.cipo, Direction::Input)));
    let quad = pins.wp.zip(pins.hold);
    if let Some((wp, hold)) = quad {
        io_1x.push(Subsignal::new("wp", Pins::inverted(wp, Direction::Output)));
        io_1x.push(Subsignal::new("hold", Pins::inverted(hold, Direction::Output)));
    }

    let mut io_2x = common();
    io_2x.push(Subsignal::new(
        "dq",
        Pins::new(&format!("{} {}", pins.copi, pins.cipo), Direction::InOut),
    ));

    let mut resources = vec![
        Resource::bundle("spi_flash_1x", number, io_1x).attrs(attrs.clone()),
        Resource::bundle("spi_flash_2x", number, io_2x)
            .attrs(attrs.clone())
            .sharing("spi_flash_1x", number),
    ];

    if let Some((wp, hold)) = quad {
        let mut io_4x = common();
        io_4x.push(Subsignal::new(
            "dq",
            Pins::new(&format!("{} {} {wp} {hold}", pins.copi, pins.cipo), Direction::InOut),
        ));
        resources.push(
            Resource::bundle("spi_flash_4x", number, io_4x)
                .attrs(attrs.clone())
                .sharing("spi_flash_1x", number),
        );
    }
    resources
}

#[derive(Debug, Clone, Copy)]
pub struct SdCardPins<'a> {
    pub clk: &'a str,
    pub cmd: &'a str,
    pub dat0: &'a str,
    /// `dat1`..`dat3`, present on 4-bit capable slots.
    pub dat_hi: Option<[&'a str; 3]>,
    pub cd: Option<&'a str>,
}

/// `sd_card_spi`, `sd_card_1bit` and `sd_card_4bit` views of one card slot.
///
/// With all four data lines wired, `sd_card_4bit` owns the pads and the other
/// views reuse them; otherwise `sd_card_1bit` owns them.
pub fn sd_card_resources(number: u32, pins: SdCardPins<'_>, attrs: &Attrs) -> Vec<Resource> {
    let common = || -> Vec<Subsignal> {
        pins.cd
            .map(|cd| Subsignal::new("cd", Pins::new(cd, Direction::Input)))
            .into_iter()
            .collect()
    };
    let native = || {
        let mut ios = common();
        ios.push(Subsignal::new("clk", Pins::new(pins.clk, Direction::Output)));
        ios.push(Subsignal::new("cmd", Pins::new(pins.cmd, Direction::Output)));
        ios
    };

    let mut io_1bit = native();
    io_1bit.push(Subsignal::new("dat", Pins::new(pins.dat0, Direction::InOut)));

    let Some([dat1, dat2, dat3]) = pins.dat_hi else {
        return vec![Resource::bundle("sd_card_1bit", number, io_1bit).attrs(attrs.clone())];
    };

    let mut io_spi = common();
    io_spi.push(Subsignal::new("cs", Pins::inverted(dat3, Direction::Output)));
    io_spi.push(Subsignal::new("clk", Pins::new(pins.clk, Direction::Output)));
    io_spi.push(Subsignal::new("copi", Pins::new(pins.cmd, Direction::Output)));
    io_spi.push(Subsignal::new("cipo", Pins::new(pins.dat0, Direction::Input)));

    let mut io_4bit = native();
    io_4bit.push(Subsignal::new(
        "dat",
        Pins::new(&format!("{} {dat1} {dat2} {dat3}", pins.dat0), Direction::InOut),
    ));

    vec![
        Resource::bundle("sd_card_spi", number, io_spi)
            .attrs(attrs.clone())
            .sharing("sd_card_4bit", number),
        Resource::bundle("sd_card_1bit", number, io_1bit)
            .attrs(attrs.clone())
            .sharing("sd_card_4bit", number),
        Resource::bundle("sd_card_4bit", number, io_4bit).attrs(attrs.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Signal;

    fn lvcmos33() -> Attrs {
        Attrs::io_type("LVCMOS33")
    }

    #[test]
    fn leds_are_numbered_from_first_number() {
        let leds = led_resources("led", 8, "R8 A5", true, &lvcmos33());
        let keys: Vec<_> = leds.iter().map(|r| (r.name.as_str(), r.number)).collect();
        assert_eq!(keys, vec![("led", 8), ("led", 9)]);
        match &leds[1].signal {
            Signal::Pins(pins) => {
                assert!(pins.invert);
                assert_eq!(pins.dir, Direction::Output);
            }
            other => panic!("expected flat pins, got {other:?}"),
        }
    }

    #[test]
    fn spi_flash_wide_views_share_1x_pads() {
        let res = spi_flash_resources(
            0,
            SpiFlashPins {
                cs: "N8",
                clk: "N9",
                copi: "T8",
                cipo: "T7",
                wp: Some("M7"),
                hold: Some("N7"),
            },
            &lvcmos33(),
        );
        let names: Vec<_> = res.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["spi_flash_1x", "spi_flash_2x", "spi_flash_4x"]);
        assert!(res[0].is_exclusive());
        assert_eq!(res[0].pads(), vec!["N8", "N9", "T8", "T7", "M7", "N7"]);
        assert_eq!(res[2].pads(), vec!["N8", "N9", "T8", "T7", "M7", "N7"]);
        assert_eq!(res[1].shares, Some(("spi_flash_1x".to_string(), 0)));
    }

    #[test]
    fn spi_flash_without_wp_hold_has_no_quad_view() {
        let res = spi_flash_resources(
            1,
            SpiFlashPins {
                cs: "A1",
                clk: "A2",
                copi: "A3",
                cipo: "A4",
                wp: None,
                hold: None,
            },
            &Attrs::new(),
        );
        assert_eq!(res.len(), 2);
    }

    #[test]
    fn sd_card_spi_mode_maps_dat3_to_chip_select() {
        let res = sd_card_resources(
            0,
            SdCardPins {
                clk: "D12",
                cmd: "D13",
                dat0: "D10",
                dat_hi: Some(["E10", "E13", "C13"]),
                cd: Some("E12"),
            },
            &lvcmos33(),
        );
        let spi = &res[0];
        assert_eq!(spi.name, "sd_card_spi");
        let Signal::Subsignals(subs) = &spi.signal else {
            panic!("sd_card_spi should be a bundle");
        };
        let cs = subs.iter().find(|s| s.name == "cs").expect("cs subsignal");
        assert_eq!(cs.pins.names, vec!["C13"]);
        assert!(cs.pins.invert);
        assert!(res[2].is_exclusive());
    }

    #[test]
    fn direct_usb_optional_lines() {
        let usb = direct_usb_resource(
            0,
            DirectUsbPins {
                d_p: "E9",
                d_n: "D9",
                pullup: Some("B6"),
                vbus_valid: None,
            },
            &Attrs::new(),
        );
        assert_eq!(usb.pads(), vec!["E9", "D9", "B6"]);
    }
}
