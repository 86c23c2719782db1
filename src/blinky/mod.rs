//! Blinky smoke-test design: every LED toggles at a different rate from the
//! default clock.

use log::info;

use crate::error::BoardError;
use crate::platform::{Fragment, Platform};
use crate::resource::Signal;
use crate::trellis::port_name;

pub const TOP: &str = "top";

/// Builds a fragment driving every single-bit `led` resource of `platform`.
pub fn blinky(platform: &impl Platform) -> Result<Fragment, BoardError> {
    let clk = platform
        .default_clock()
        .ok_or_else(|| BoardError::MissingDefaultClock(platform.identity().default_clk.clone()))?;
    let hz = clk.clock.map(|c| c.frequency_hz).unwrap_or(0.0);

    let mut fragment = Fragment::new();
    fragment.request(platform, &clk.name, clk.number)?;
    let clk_port = port_name(&clk.name, clk.number, &[]);

    let mut leds = Vec::new();
    for led in platform.resources().iter().filter(|r| r.name == "led") {
        let Signal::Pins(pins) = &led.signal else {
            continue;
        };
        if pins.width() != 1 {
            continue;
        }
        fragment.request(platform, &led.name, led.number)?;
        leds.push((port_name(&led.name, led.number, &[]), pins.invert));
    }

    // The slowest LED toggles about once a second.
    let width = counter_width(hz).max(leds.len());
    let mut v = format!("module {TOP}(\n    input wire {clk_port}");
    for (port, _) in &leds {
        v.push_str(&format!(",\n    output wire {port}"));
    }
    v.push_str("\n);\n");
    v.push_str(&format!("    reg [{}:0] counter = 0;\n", width - 1));
    v.push_str(&format!("    always @(posedge {clk_port}) counter <= counter + 1;\n"));
    for (i, (port, invert)) in leds.iter().enumerate() {
        let bit = width - 1 - i;
        let not = if *invert { "~" } else { "" };
        v.push_str(&format!("    assign {port} = {not}counter[{bit}];\n"));
    }
    v.push_str("endmodule\n");

    fragment.add_source(&format!("{TOP}.v"), v);
    info!("blinky drives {} LEDs from {}", leds.len(), clk_port);
    Ok(fragment)
}

fn counter_width(hz: f64) -> usize {
    let mut width = 1;
    while ((1u64 << width) as f64) < hz && width < 48 {
        width += 1;
    }
    width
}
