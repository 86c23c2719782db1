//! ECP5 Mini: Lattice LFE5U-12F in a 256-ball BGA, 16 MHz oscillator, USB
//! DFU bootloader.

use crate::error::BoardError;
use crate::platform::{DeviceIdentity, Platform};
use crate::products::BuildProducts;
use crate::program::DfuProgrammer;
use crate::resource::bundles::{
    button_resources, direct_usb_resource, led_resources, sd_card_resources, spi_flash_resources,
    DirectUsbPins, SdCardPins, SpiFlashPins,
};
use crate::resource::{Attrs, Clock, Connector, Direction, Pins, Resource};
use crate::trellis::ToolchainOptions;

pub const DEFAULT_ECPPACK_OPTS: &str = "--compress --freq 38.8";

/// Expansion header `io#0`: labels A0..H7, eight banks of eight.
const IO_CONNECTOR: [(&str, &str); 64] = [
    ("A0", "T15"), ("A1", "R16"), ("A2", "P15"), ("A3", "M15"),
    ("A4", "R15"), ("A5", "P16"), ("A6", "N16"), ("A7", "M16"),
    ("B0", "L15"), ("B1", "K15"), ("B2", "J15"), ("B3", "K14"),
    ("B4", "L16"), ("B5", "K16"), ("B6", "J16"), ("B7", "J14"),
    ("C0", "H15"), ("C1", "G15"), ("C2", "H14"), ("C3", "E16"),
    ("C4", "G16"), ("C5", "F16"), ("C6", "G14"), ("C7", "F15"),
    ("D0", "E15"), ("D1", "C15"), ("D2", "D14"), ("D3", "B15"),
    ("D4", "D16"), ("D5", "C16"), ("D6", "C14"), ("D7", "B16"),
    ("E0", "C1"), ("E1", "B1"), ("E2", "A2"), ("E3", "A3"),
    ("E4", "C2"), ("E5", "B2"), ("E6", "B3"), ("E7", "A4"),
    ("F0", "K1"), ("F1", "J1"), ("F2", "G1"), ("F3", "F1"),
    ("F4", "K2"), ("F5", "J2"), ("F6", "H2"), ("F7", "G2"),
    ("G0", "N1"), ("G1", "M1"), ("G2", "L1"), ("G3", "L3"),
    ("G4", "P2"), ("G5", "M2"), ("G6", "L2"), ("G7", "M3"),
    ("H0", "R2"), ("H1", "P4"), ("H2", "N4"), ("H3", "P1"),
    ("H4", "T2"), ("H5", "R3"), ("H6", "P3"), ("H7", "R1"),
];

#[derive(Debug, Clone)]
pub struct Ecp5MiniPlatform {
    identity: DeviceIdentity,
    resources: Vec<Resource>,
    connectors: Vec<Connector>,
}

impl Ecp5MiniPlatform {
    pub fn new() -> Self {
        Self {
            identity: DeviceIdentity {
                device: "LFE5U-12F".to_string(),
                package: "BG256".to_string(),
                speed: "8".to_string(),
                default_clk: "clk16".to_string(),
            },
            resources: resources(),
            connectors: vec![Connector::new("io", 0, IO_CONNECTOR)],
        }
    }
}

impl Default for Ecp5MiniPlatform {
    fn default() -> Self {
        Self::new()
    }
}

fn resources() -> Vec<Resource> {
    let lvcmos33 = Attrs::io_type("LVCMOS33");

    let mut resources = vec![
        Resource::new("clk16", 0, Pins::new("A7", Direction::InOut))
            .clock(Clock::hz(16e6))
            .attrs(lvcmos33.clone()),
        // Pulling this low triggers FPGA reconfiguration.
        Resource::new("program", 0, Pins::inverted("R9", Direction::InOut)).attrs(lvcmos33.clone()),
    ];

    // RGB LEDs are multiplexed: one anode per LED, common R/G/B cathodes.
    resources.extend(led_resources("led", 0, "P14 R13 T14 R14 T4 R4 T3 R5", false, &lvcmos33));
    resources.push(
        Resource::new("led_cathodes", 0, Pins::new("R12 P13 T13", Direction::InOut))
            .attrs(lvcmos33.clone()),
    );

    // Standalone LEDs, then their semantic aliases.
    resources.extend(led_resources("led", 8, "R8 A5", true, &lvcmos33));
    resources.push(
        Resource::new("led_usr", 0, Pins::inverted("R8", Direction::Output))
            .attrs(lvcmos33.clone())
            .sharing("led", 8),
    );
    resources.push(
        Resource::new("led_act", 0, Pins::inverted("A5", Direction::Output))
            .attrs(lvcmos33.clone())
            .sharing("led", 9),
    );

    resources.push(direct_usb_resource(
        0,
        DirectUsbPins {
            d_p: "E9",
            d_n: "D9",
            pullup: Some("B6"),
            vbus_valid: Some("F4"),
        },
        &lvcmos33,
    ));

    // The user button reads back the user LED pad.
    resources.extend(
        button_resources(&[(0, "R8")], true, &lvcmos33)
            .into_iter()
            .map(|button| button.sharing("led", 8)),
    );

    resources.extend(spi_flash_resources(
        0,
        SpiFlashPins {
            cs: "N8",
            clk: "N9",
            cipo: "T7",
            copi: "T8",
            wp: Some("M7"),
            hold: Some("N7"),
        },
        &lvcmos33,
    ));

    resources.extend(sd_card_resources(
        0,
        SdCardPins {
            dat0: "D10",
            dat_hi: Some(["E10", "E13", "C13"]),
            clk: "D12",
            cmd: "D13",
            cd: Some("E12"),
        },
        &Attrs::io_type("LVCMOS33").with("SLEWRATE", "FAST"),
    ));

    resources
}

impl Platform for Ecp5MiniPlatform {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    fn resources(&self) -> &[Resource] {
        &self.resources
    }

    fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    fn default_toolchain_options(&self) -> ToolchainOptions {
        ToolchainOptions::new().with("ecppack_opts", DEFAULT_ECPPACK_OPTS)
    }

    fn toolchain_program(
        &self,
        products: &dyn BuildProducts,
        name: &str,
    ) -> Result<(), BoardError> {
        DfuProgrammer::from_env().program(products, name)
    }
}
