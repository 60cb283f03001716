//! Device core for a peer-to-peer signal-mapping runtime.
//!
//! A device owns a set of named, typed signals, each with one or more
//! concurrent instances, and reconciles incoming value and administrative
//! messages against a local/global id-map, a signal instance store, and a
//! router of active maps between signals. The admin subsystem and the
//! OSC-like transport are treated as external collaborators; this crate only
//! implements the parts described below.

pub mod clock;
pub mod device;
pub mod error;
pub mod idmap;
pub mod inbound;
pub mod instance;
pub mod parse;
pub mod poll;
pub mod property;
pub mod query;
pub mod router;
pub mod signal;
pub mod value;

pub use clock::{Clock, SystemClock, TimeTag};
pub use device::{Device, DeviceConfig};
pub use error::DeviceError;
pub use idmap::{IdMapTable, IdMapToken};
pub use inbound::{handle_inbound, InboundEvent};
pub use poll::{AdminHandle, Poller, SignalTransport, Waiter};
pub use query::{handle_query, QueryReply};
pub use router::{Map, MapId, Router, Slot};
pub use signal::{Direction, Signal};
pub use value::{Arg, ElementType, Scalar};
