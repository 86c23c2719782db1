use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::Platform;
use crate::error::{BoardError, ResourceKey};
use crate::trellis;

/// Checks a platform's tables for the mistakes the toolchain would otherwise
/// only report mid-build: unknown parts, duplicate declarations and pads
/// claimed twice.
pub fn validate(platform: &impl Platform) -> Result<(), BoardError> {
    let id = platform.identity();
    trellis::part_options(&id.device, &id.package, &id.speed)?;

    let mut keys = BTreeSet::new();
    for resource in platform.resources() {
        if !keys.insert(resource.key()) {
            return Err(BoardError::DuplicateResource(resource.key()));
        }
        let mut seen = BTreeSet::new();
        for pad in resource.pads() {
            if !seen.insert(pad) {
                return Err(BoardError::PadConflict {
                    pad: pad.to_string(),
                    first: resource.key().to_string(),
                    second: resource.key().to_string(),
                });
            }
        }
    }

    let mut owners: BTreeMap<&str, String> = BTreeMap::new();
    for resource in platform.resources().iter().filter(|r| r.is_exclusive()) {
        for pad in resource.pads() {
            claim(&mut owners, pad, resource.key().to_string())?;
        }
    }

    for resource in platform.resources() {
        let Some(target_key) = resource.shared_key() else {
            continue;
        };
        check_share(platform, resource.key(), target_key, &resource.pads())?;
    }

    let mut connector_keys = BTreeSet::new();
    for connector in platform.connectors() {
        let label = format!("{}#{}", connector.name, connector.number);
        if !connector_keys.insert((connector.name.as_str(), connector.number)) {
            return Err(BoardError::InvalidConnector {
                connector: label,
                reason: "declared twice".to_string(),
            });
        }
        if connector.is_empty() {
            return Err(BoardError::InvalidConnector {
                connector: label,
                reason: "no pins".to_string(),
            });
        }
        for (pin, pad) in &connector.pins {
            if pin.is_empty() || pad.is_empty() {
                return Err(BoardError::InvalidConnector {
                    connector: label,
                    reason: format!("empty mapping {pin:?} -> {pad:?}"),
                });
            }
            claim(&mut owners, pad, format!("{label}:{pin}"))?;
        }
    }

    let clock_ok = platform.default_clock().is_some_and(|r| r.clock.is_some());
    if !clock_ok {
        return Err(BoardError::MissingDefaultClock(id.default_clk.clone()));
    }

    debug!(
        "validated {}: {} resources, {} connectors, {} pads claimed",
        id.device,
        platform.resources().len(),
        platform.connectors().len(),
        owners.len()
    );
    Ok(())
}

fn claim<'a>(
    owners: &mut BTreeMap<&'a str, String>,
    pad: &'a str,
    owner: String,
) -> Result<(), BoardError> {
    if let Some(first) = owners.get(pad) {
        return Err(BoardError::PadConflict {
            pad: pad.to_string(),
            first: first.clone(),
            second: owner,
        });
    }
    owners.insert(pad, owner);
    Ok(())
}

fn check_share(
    platform: &impl Platform,
    resource: ResourceKey,
    target: ResourceKey,
    pads: &[&str],
) -> Result<(), BoardError> {
    let invalid = |reason: String| BoardError::InvalidShare {
        resource: resource.clone(),
        target: target.clone(),
        reason,
    };
    let owner = platform
        .lookup(&target.name, target.number)
        .ok_or_else(|| invalid("target is not declared".to_string()))?;
    if !owner.is_exclusive() {
        return Err(invalid("target is itself shared".to_string()));
    }
    let owned: BTreeSet<&str> = owner.pads().into_iter().collect();
    if let Some(stray) = pads.iter().find(|pad| !owned.contains(*pad)) {
        return Err(invalid(format!("pad {stray} is not owned by the target")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::DeviceIdentity;
    use crate::resource::{Clock, Connector, Direction, Pins, Resource};

    struct TestBoard {
        identity: DeviceIdentity,
        resources: Vec<Resource>,
        connectors: Vec<Connector>,
    }

    impl Platform for TestBoard {
        fn identity(&self) -> &DeviceIdentity {
            &self.identity
        }
        fn resources(&self) -> &[Resource] {
            &self.resources
        }
        fn connectors(&self) -> &[Connector] {
            &self.connectors
        }
    }

    fn board(resources: Vec<Resource>, connectors: Vec<Connector>) -> TestBoard {
        let clk = Resource::new("clk", 0, Pins::new("A7", Direction::Input)).clock(Clock::hz(16e6));
        let mut all = vec![clk];
        all.extend(resources);
        TestBoard {
            identity: DeviceIdentity {
                device: "LFE5U-12F".into(),
                package: "BG256".into(),
                speed: "8".into(),
                default_clk: "clk".into(),
            },
            resources: all,
            connectors,
        }
    }

    fn led(number: u32, pad: &str) -> Resource {
        Resource::new("led", number, Pins::new(pad, Direction::Output))
    }

    #[test]
    fn accepts_disjoint_tables() {
        let b = board(
            vec![led(0, "R8"), led(1, "A5")],
            vec![Connector::new("io", 0, [("A0", "T15")])],
        );
        validate(&b).unwrap();
    }

    #[test]
    fn rejects_duplicate_resource_key() {
        let b = board(vec![led(0, "R8"), led(0, "A5")], vec![]);
        assert!(matches!(
            validate(&b),
            Err(BoardError::DuplicateResource(k)) if k == ResourceKey::new("led", 0)
        ));
    }

    #[test]
    fn rejects_pad_claimed_twice() {
        let b = board(vec![led(0, "R8"), led(1, "R8")], vec![]);
        match validate(&b) {
            Err(BoardError::PadConflict { pad, first, second }) => {
                assert_eq!(pad, "R8");
                assert_eq!(first, "led#0");
                assert_eq!(second, "led#1");
            }
            other => panic!("expected pad conflict, got {other:?}"),
        }
    }

    #[test]
    fn rejects_connector_pad_claimed_by_resource() {
        let b = board(vec![led(0, "T15")], vec![Connector::new("io", 0, [("A0", "T15")])]);
        assert!(matches!(validate(&b), Err(BoardError::PadConflict { .. })));
    }

    #[test]
    fn accepts_shared_view_of_owned_pads() {
        let alias =
            Resource::new("led_usr", 0, Pins::inverted("R8", Direction::Output)).sharing("led", 0);
        let b = board(vec![led(0, "R8"), alias], vec![]);
        validate(&b).unwrap();
    }

    #[test]
    fn rejects_share_with_foreign_pad() {
        let alias =
            Resource::new("led_usr", 0, Pins::new("B1", Direction::Output)).sharing("led", 0);
        let b = board(vec![led(0, "R8"), alias], vec![]);
        assert!(matches!(validate(&b), Err(BoardError::InvalidShare { .. })));
    }

    #[test]
    fn rejects_share_of_undeclared_resource() {
        let alias =
            Resource::new("led_usr", 0, Pins::new("R8", Direction::Output)).sharing("led", 7);
        let b = board(vec![led(0, "R8"), alias], vec![]);
        assert!(matches!(validate(&b), Err(BoardError::InvalidShare { .. })));
    }

    #[test]
    fn rejects_unknown_part() {
        let mut b = board(vec![], vec![]);
        b.identity.device = "LFE5U-99F".into();
        assert!(matches!(validate(&b), Err(BoardError::UnsupportedPart { .. })));
    }

    #[test]
    fn platforms_without_programmer_refuse_to_program() {
        let b = board(vec![], vec![]);
        let err = b
            .toolchain_program(&crate::products::MemoryProducts::new(), "top")
            .unwrap_err();
        assert!(matches!(err, BoardError::Config(_)));
    }

    #[test]
    fn rejects_unclocked_default_clock() {
        let mut b = board(vec![], vec![]);
        b.identity.default_clk = "led".into();
        b.resources.push(led(0, "R8"));
        assert!(matches!(validate(&b), Err(BoardError::MissingDefaultClock(_))));
    }
}
