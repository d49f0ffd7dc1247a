//! Port to net connectivity.

use log::{debug, warn};

use crate::aggregate::Net;
use crate::catalog::{CatalogError, PortCatalog};
use crate::{Component, Instance, PortConnection, Signal};

/// Instances and connections of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connectivity {
    pub instances: Vec<Instance>,
    pub connections: Vec<PortConnection>,
}

/// Connect every component port to the net it lands on.
///
/// A port connects to the first net, in list order, having a segment end at
/// the port's absolute position. The signal of that net takes the port's
/// type (and range, when it has none) unless it is already typed.
///
/// A component without a catalog aborts the whole sheet.
pub fn resolve(
    components: &[Component],
    nets: &[Net],
    signals: &mut [Signal],
    catalog: &dyn PortCatalog,
) -> Result<Connectivity, CatalogError> {
    let mut result = Connectivity::default();

    for (index, component) in components.iter().enumerate() {
        let ports = catalog.lookup(&component.name)?;
        debug!(
            "{} ({}): {} ports",
            component.name,
            component.label,
            ports.len()
        );

        for port in &ports {
            let Some(at) = component.location.checked_add(port.offset) else {
                warn!(
                    "{}: port {} lies outside the sheet coordinate range, leaving it open",
                    component.name, port.name
                );
                continue;
            };
            let Some(net) = nets.iter().find(|net| net.touches(at)) else {
                debug!("  {} at {at}: open", port.name);
                continue;
            };
            debug!("  {} at {at}: {}", port.name, net.name);

            result.connections.push(PortConnection {
                instance: index,
                component: component.name.clone(),
                port: port.name.clone(),
                net: net.name.clone(),
            });

            match signals.iter_mut().find(|s| s.name == net.name) {
                Some(signal) if signal.signal_type.is_empty() => {
                    signal.signal_type = port.port_type.clone();
                    if signal.range.is_empty() {
                        signal.range = port.range.clone();
                    }
                }
                Some(_) => {}
                None => warn!("net {} has no signal to type", net.name),
            }
        }

        result.instances.push(Instance {
            component: component.clone(),
            ports,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::geometry::{Point, Segment};
    use crate::{Port, PortDirection};

    fn component(name: &str, at: (i64, i64)) -> Component {
        Component {
            name: name.to_string(),
            label: String::new(),
            source: None,
            generics: Vec::new(),
            location: Point::from(at),
        }
    }

    fn port(name: &str, ty: &str, range: &str, offset: (i64, i64)) -> Port {
        Port {
            name: name.to_string(),
            port_type: ty.to_string(),
            range: range.to_string(),
            direction: PortDirection::In,
            offset: Point::from(offset),
        }
    }

    fn net(name: &str, segments: &[((i64, i64), (i64, i64))]) -> Net {
        Net {
            name: name.to_string(),
            segments: segments.iter().map(|(a, b)| Segment::new(*a, *b)).collect(),
            synthetic: false,
        }
    }

    #[test]
    fn port_on_net_endpoint_connects_and_types_signal() {
        let catalog =
            InMemoryCatalog::new().with("lib-reg", vec![port("CLK", "std_ulogic", "", (0, 0))]);
        let nets = [net("CLK", &[((100, 100), (100, 300))])];
        let mut signals = vec![Signal::new("CLK")];

        let result = resolve(
            &[component("lib-reg", (100, 100))],
            &nets,
            &mut signals,
            &catalog,
        )
        .unwrap();

        assert_eq!(
            result.connections,
            vec![PortConnection {
                instance: 0,
                component: "lib-reg".to_string(),
                port: "CLK".to_string(),
                net: "CLK".to_string(),
            }]
        );
        assert_eq!(signals[0].signal_type, "std_ulogic");
    }

    #[test]
    fn port_off_every_net_stays_open() {
        let catalog =
            InMemoryCatalog::new().with("lib-reg", vec![port("D", "std_ulogic", "", (0, 50))]);
        let nets = [net("CLK", &[((100, 100), (100, 300))])];
        let mut signals = vec![Signal::new("CLK")];

        let result = resolve(
            &[component("lib-reg", (100, 100))],
            &nets,
            &mut signals,
            &catalog,
        )
        .unwrap();

        assert!(result.connections.is_empty());
        assert_eq!(result.instances[0].ports.len(), 1);
        assert_eq!(signals[0], Signal::new("CLK"));
    }

    #[test]
    fn port_beyond_coordinate_range_stays_open() {
        let catalog = InMemoryCatalog::new().with(
            "lib-reg",
            vec![
                port("far", "std_ulogic", "", (i64::MAX, 0)),
                port("near", "std_ulogic", "", (0, 0)),
            ],
        );
        let nets = [net("CLK", &[((100, 100), (100, 300))])];
        let mut signals = vec![Signal::new("CLK")];

        let result = resolve(
            &[component("lib-reg", (100, 100))],
            &nets,
            &mut signals,
            &catalog,
        )
        .unwrap();

        assert_eq!(result.instances[0].ports.len(), 2);
        assert_eq!(result.connections.len(), 1);
        assert_eq!(result.connections[0].port, "near");
        assert_eq!(result.connections[0].net, "CLK");
    }

    #[test]
    fn interior_points_do_not_connect() {
        let catalog =
            InMemoryCatalog::new().with("lib-reg", vec![port("D", "std_ulogic", "", (0, 0))]);
        let nets = [net("D", &[((0, -100), (0, 100))])];
        let mut signals = vec![Signal::new("D")];
        let result = resolve(&[component("lib-reg", (0, 0))], &nets, &mut signals, &catalog).unwrap();
        assert!(result.connections.is_empty());
    }

    #[test]
    fn first_net_in_list_order_wins() {
        let catalog =
            InMemoryCatalog::new().with("lib-and", vec![port("a", "std_ulogic", "", (0, 0))]);
        let nets = [
            net("first", &[((0, 0), (0, 100))]),
            net("second", &[((0, 0), (100, 0))]),
        ];
        let mut signals = vec![Signal::new("first"), Signal::new("second")];
        let result = resolve(&[component("lib-and", (0, 0))], &nets, &mut signals, &catalog).unwrap();

        assert_eq!(result.connections.len(), 1);
        assert_eq!(result.connections[0].net, "first");
        assert_eq!(signals[1].signal_type, "");
    }

    #[test]
    fn first_inference_wins() {
        let catalog = InMemoryCatalog::new()
            .with(
                "lib-src",
                vec![port("q", "unsigned", "7 downto 0", (0, 0))],
            )
            .with(
                "lib-dst",
                vec![port("d", "std_ulogic_vector", "3 downto 0", (0, 0))],
            );
        let nets = [net("bus", &[((0, 0), (500, 0))])];
        let mut signals = vec![Signal::new("bus")];
        resolve(
            &[component("lib-src", (0, 0)), component("lib-dst", (500, 0))],
            &nets,
            &mut signals,
            &catalog,
        )
        .unwrap();

        assert_eq!(signals[0].signal_type, "unsigned");
        assert_eq!(signals[0].range, "7 downto 0");
    }

    #[test]
    fn declared_type_is_kept_and_range_filled_only_with_type() {
        let catalog = InMemoryCatalog::new().with(
            "lib-src",
            vec![port("q", "unsigned", "7 downto 0", (0, 0))],
        );
        let nets = [net("a", &[((0, 0), (50, 0))]), net("b", &[((0, 0), (0, 50))])];

        let mut typed = Signal::new("a");
        typed.signal_type = "signed".to_string();
        let mut ranged = Signal::new("b");
        ranged.range = "1 downto 0".to_string();
        let mut signals = vec![typed.clone(), ranged];

        resolve(&[component("lib-src", (0, 0))], &nets, &mut signals, &catalog).unwrap();
        assert_eq!(signals[0], typed);

        let catalog = InMemoryCatalog::new().with(
            "lib-src",
            vec![port("q", "unsigned", "7 downto 0", (0, 0))],
        );
        let nets = [net("b", &[((0, 0), (0, 50))])];
        let mut ranged = Signal::new("b");
        ranged.range = "1 downto 0".to_string();
        let mut signals = vec![ranged];
        resolve(&[component("lib-src", (0, 0))], &nets, &mut signals, &catalog).unwrap();
        assert_eq!(signals[0].signal_type, "unsigned");
        assert_eq!(signals[0].range, "1 downto 0");
    }

    #[test]
    fn missing_catalog_is_fatal() {
        let catalog = InMemoryCatalog::new();
        let mut signals = Vec::new();
        let err = resolve(&[component("lib-ghost", (0, 0))], &[], &mut signals, &catalog)
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingPortCatalog { ref component, .. } if component == "lib-ghost"
        ));
    }

    #[test]
    fn connections_follow_component_then_port_order() {
        let catalog = InMemoryCatalog::new().with(
            "lib-buf",
            vec![
                port("a", "std_ulogic", "", (0, 0)),
                port("y", "std_ulogic", "", (100, 0)),
            ],
        );
        let nets = [
            net("n1", &[((0, 0), (0, 50))]),
            net("n2", &[((100, 0), (100, 50)), ((1000, 0), (1000, 50))]),
        ];
        let mut signals = vec![Signal::new("n1"), Signal::new("n2")];
        let result = resolve(
            &[component("lib-buf", (0, 0)), component("lib-buf", (900, 0))],
            &nets,
            &mut signals,
            &catalog,
        )
        .unwrap();

        let summary: Vec<_> = result
            .connections
            .iter()
            .map(|c| (c.instance, c.port.as_str(), c.net.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(0, "a", "n1"), (0, "y", "n2"), (1, "y", "n2")]
        );
    }
}
