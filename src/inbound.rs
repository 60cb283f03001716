//! C4: Inbound Handler.
//!
//! Demultiplexes an incoming value message down to the instance(s) it
//! addresses, applies the per-sample update/release rules, and decides
//! whether the signal's own handler fires or the update is routed through
//! an active source map instead (§4.4).

use crate::clock::Clock;
use crate::device::Device;
use crate::error::DeviceError;
use crate::parse::{parse_properties, parse_value_prefix};
use crate::router::MapId;
use crate::value::{Arg, Scalar};

/// One outcome of processing an inbound message. A single message can
/// produce several, one per bundled sample (§4.1's packed-vector bundling).
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ValueUpdated { instance: usize },
    InstanceReleased { instance: usize },
    Routed { map: MapId, value: Scalar },
}

/// Demux and apply one inbound value message addressed to `signal_path`.
///
/// `local_id` is the caller-assigned local instance id to use if a fresh
/// id-map node must be activated (ignored when `@instance` resolves to an
/// already-active node).
pub fn handle_inbound<C: Clock>(
    device: &mut Device<C>,
    signal_path: &str,
    typetags: &[u8],
    args: &[Arg],
    local_id: u32,
) -> Result<Vec<InboundEvent>, DeviceError> {
    let element_type = device
        .signal(signal_path)
        .ok_or_else(|| DeviceError::UnknownSignal(signal_path.to_string()))?
        .element_type;
    let length = device.signal(signal_path).unwrap().length;

    let prefix = parse_value_prefix(typetags, element_type, length)?;
    let props = parse_properties(typetags, args, prefix.prop_start)?;

    let (signal, table) = device
        .signal_and_table_mut(signal_path)
        .expect("checked above");

    let idx = match props.instance {
        Some(global) => signal.get_with_global_id(table, global, local_id),
        None => signal.get_with_local_id(table, local_id),
    };

    let routed_through_map = device.router().has_source_map(signal_path);
    let now = device.clock().now();
    let mut events = Vec::with_capacity(prefix.count);

    for sample_index in 0..prefix.count {
        let start = sample_index * length;
        let sample: Vec<Option<Scalar>> = args[start..start + length]
            .iter()
            .map(|a| a.as_scalar(element_type))
            .collect();

        let all_null = sample.iter().all(Option::is_none);

        if all_null {
            let (signal, table) = device
                .signal_and_table_mut(signal_path)
                .expect("signal exists");
            signal.release_internal(table, idx, false);
            events.push(InboundEvent::InstanceReleased { instance: idx });
            continue;
        }

        if routed_through_map {
            // A convergent map may need several partial samples before it
            // has a complete vector to forward; only a sample with exactly
            // one scalar can feed a single router slot.
            if let Some(scalar) = sample.iter().find_map(|s| *s) {
                let fired = device
                    .router_mut()
                    .route(signal_path, props.slot, scalar);
                for (map, _destination, value) in fired {
                    events.push(InboundEvent::Routed { map, value });
                }
            }
            continue;
        }

        let signal = device.signal_mut(signal_path).expect("signal exists");
        signal.apply_timetag(idx, &sample, now);
        events.push(InboundEvent::ValueUpdated { instance: idx });
    }

    Ok(events)
}
