//! C5: Query Handler.
//!
//! Builds the reply bundle for a `.../get` request: one value message per
//! active, valued instance of the queried signal, each carrying an
//! `@instance` property so the requester can tell which instance it's
//! looking at (§4.5).

use crate::clock::Clock;
use crate::device::Device;
use crate::error::DeviceError;
use crate::value::{Arg, ElementType, Scalar};

/// One reply to a `.../get` request, ready for the (out-of-scope) transport
/// layer to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReply {
    pub typetags: Vec<u8>,
    pub args: Vec<Arg>,
    pub instance_global_id: Option<u64>,
}

fn scalar_to_arg(s: Scalar) -> Arg {
    match s {
        Scalar::I32(v) => Arg::Int32(v),
        Scalar::F32(v) => Arg::Float32(v),
        Scalar::F64(v) => Arg::Float64(v),
    }
}

/// Answer a query on `signal_path`. `reply_type` lets the requester ask for
/// a different element type than the signal's own (§4.5's coercion step);
/// `None` uses the signal's native type.
pub fn handle_query<C: Clock>(
    device: &Device<C>,
    signal_path: &str,
    reply_type: Option<ElementType>,
) -> Result<Vec<QueryReply>, DeviceError> {
    let signal = device
        .signal(signal_path)
        .ok_or_else(|| DeviceError::UnknownSignal(signal_path.to_string()))?;
    let reply_type = reply_type.unwrap_or(signal.element_type);

    let mut replies = Vec::new();
    for entry in signal.id_maps() {
        let (Some(instance), Some(token)) = (entry.instance(), entry.map_token()) else {
            continue;
        };
        if !instance.has_value() {
            continue;
        }

        let mut typetags = Vec::with_capacity(instance.length());
        let mut args = Vec::with_capacity(instance.length());
        for v in instance.values() {
            let v = v.expect("has_value implies every element is Some");
            let coerced = v.coerce(reply_type);
            typetags.push(reply_type.tag());
            args.push(scalar_to_arg(coerced));
        }

        replies.push(QueryReply {
            typetags,
            args,
            instance_global_id: id_map_global(device, token),
        });
    }

    Ok(replies)
}

fn id_map_global<C: Clock>(device: &Device<C>, token: crate::idmap::IdMapToken) -> Option<u64> {
    device.id_map_table_ref().get(token).map(|n| n.global)
}
