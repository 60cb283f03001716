use sigmesh_device::clock::FixedClock;
use sigmesh_device::signal::Direction;
use sigmesh_device::value::{Arg, ElementType, Scalar};
use sigmesh_device::{handle_inbound, handle_query, Device, DeviceConfig, InboundEvent, Slot};

fn device(name: &str) -> Device<FixedClock> {
    Device::new(DeviceConfig::new(name), FixedClock(0)).unwrap()
}

#[test]
fn scalar_update_then_query_round_trips() {
    let mut d = device("dev");
    d.add_signal(sigmesh_device::Signal::new(
        "level",
        "/level",
        ElementType::F32,
        1,
        Direction::Input,
    ))
    .unwrap();

    let events = handle_inbound(&mut d, "/level", b"f", &[Arg::Float32(0.75)], 0).unwrap();
    assert_eq!(events, vec![InboundEvent::ValueUpdated { instance: 0 }]);

    let replies = handle_query(&d, "/level", None).unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].args, vec![Arg::Float32(0.75)]);
}

#[test]
fn packed_vector_update_applies_every_sample_in_the_bundle() {
    let mut d = device("dev");
    d.add_signal(sigmesh_device::Signal::new(
        "xy",
        "/xy",
        ElementType::I32,
        2,
        Direction::Input,
    ))
    .unwrap();

    let events = handle_inbound(
        &mut d,
        "/xy",
        b"iiii",
        &[
            Arg::Int32(1),
            Arg::Int32(2),
            Arg::Int32(3),
            Arg::Int32(4),
        ],
        0,
    )
    .unwrap();
    assert_eq!(events.len(), 2);
}

#[test]
fn remote_instance_activate_then_release() {
    let mut d = device("dev");
    d.add_signal(sigmesh_device::Signal::new(
        "voice",
        "/voice",
        ElementType::F32,
        1,
        Direction::Input,
    ))
    .unwrap();

    let activate = handle_inbound(
        &mut d,
        "/voice",
        b"fsh",
        &[Arg::Float32(1.0), Arg::Str("@instance".into()), Arg::Int64(77)],
        0,
    )
    .unwrap();
    assert_eq!(activate, vec![InboundEvent::ValueUpdated { instance: 0 }]);

    let release = handle_inbound(
        &mut d,
        "/voice",
        b"Nsh",
        &[Arg::Null, Arg::Str("@instance".into()), Arg::Int64(77)],
        0,
    )
    .unwrap();
    assert_eq!(release, vec![InboundEvent::InstanceReleased { instance: 0 }]);
}

#[test]
fn null_to_an_instance_that_was_never_activated_is_a_harmless_no_op() {
    let mut d = device("dev");
    d.add_signal(sigmesh_device::Signal::new(
        "voice",
        "/voice",
        ElementType::F32,
        1,
        Direction::Input,
    ))
    .unwrap();

    let release = handle_inbound(
        &mut d,
        "/voice",
        b"Nsh",
        &[Arg::Null, Arg::Str("@instance".into()), Arg::Int64(999)],
        0,
    )
    .unwrap();
    assert_eq!(release, vec![InboundEvent::InstanceReleased { instance: 0 }]);
}

#[test]
fn convergent_map_rejects_a_partial_vector_until_every_source_reports() {
    let mut d = device("dev");
    d.add_signal(sigmesh_device::Signal::new(
        "x",
        "/x",
        ElementType::F32,
        1,
        Direction::Input,
    ))
    .unwrap();
    d.add_signal(sigmesh_device::Signal::new(
        "y",
        "/y",
        ElementType::F32,
        1,
        Direction::Input,
    ))
    .unwrap();
    d.add_signal(sigmesh_device::Signal::new(
        "xy",
        "/xy",
        ElementType::F32,
        1,
        Direction::Output,
    ))
    .unwrap();

    d.router_mut().add_map(
        vec![Slot::new("/x", None), Slot::new("/y", None)],
        Slot::new("/xy", None),
        None,
    );

    let events_x = handle_inbound(&mut d, "/x", b"f", &[Arg::Float32(1.0)], 0).unwrap();
    assert!(
        events_x.iter().all(|e| !matches!(e, InboundEvent::Routed { .. })),
        "a lone source update must not fire the convergent map"
    );

    let events_y = handle_inbound(&mut d, "/y", b"f", &[Arg::Float32(2.0)], 0).unwrap();
    assert!(events_y
        .iter()
        .any(|e| matches!(e, InboundEvent::Routed { value: Scalar::F32(_), .. })));
}

#[test]
fn registration_rewrites_only_the_global_ids_high_word() {
    let mut d = device("dev");
    let global = d.mint_local_global_id();
    d.id_map_table_mut().activate(0, global);

    d.mark_registered(7);

    let node = d.id_map_table_mut().occupied_mut().next().unwrap();
    assert_eq!(node.global >> 32, 7);
    assert_eq!(node.global & 0xFFFF_FFFF, global & 0xFFFF_FFFF);
}
