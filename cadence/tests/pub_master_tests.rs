//! PubMaster routing over the inproc backend

use cadence::prelude::*;
use cadence::MSG_MULTIPLE_PUBLISHERS;
use cadence::inproc::{InprocPubSocket, InprocSubSocket};
use std::thread;
use std::time::Duration;

#[test]
fn test_unknown_topic_performs_no_io() {
    let ctx = InprocContext::create().unwrap();
    let mut ghost = InprocSubSocket::create(&ctx, "ghost").unwrap();
    let mut pm: PubMaster = PubMaster::new(&ctx, ["carState"]).unwrap();

    let mut msg = MessageBuilder::new();
    msg.init_event(true);
    let err = pm.send("ghost", &mut msg).unwrap_err();
    assert!(matches!(err, CadenceError::UnknownTopic(ref name) if name == "ghost"));
    assert!(pm.send_bytes("ghost", b"raw").is_err());
    assert!(ghost.receive(true).unwrap().is_none());
}

#[test]
fn test_routes_by_name() {
    let ctx = InprocContext::create().unwrap();
    let mut car = InprocSubSocket::create(&ctx, "carState").unwrap();
    let mut radar = InprocSubSocket::create(&ctx, "radarState").unwrap();
    let mut pm: PubMaster = PubMaster::new(&ctx, ["carState", "radarState"]).unwrap();

    let mut msg = MessageBuilder::new();
    msg.init_event(true).set_payload_bytes(2, &[1]).unwrap();
    let sent = pm.send("radarState", &mut msg).unwrap();

    let frame = radar.receive(true).unwrap().unwrap();
    assert_eq!(frame.len(), sent);
    assert!(car.receive(true).unwrap().is_none());

    let reader = MessageReader::new(frame.data()).unwrap();
    assert_eq!(reader.event().payload_bytes(), &[1]);
}

#[test]
fn test_timestamp_is_taken_at_build_time() {
    let ctx = InprocContext::create().unwrap();
    let mut sub = InprocSubSocket::create(&ctx, "carState").unwrap();
    let mut pm: PubMaster = PubMaster::new(&ctx, ["carState"]).unwrap();

    let mut msg = MessageBuilder::new();
    let built_at = msg.init_event(true).log_mono_time();
    thread::sleep(Duration::from_millis(2));
    pm.send("carState", &mut msg).unwrap();
    pm.send("carState", &mut msg).unwrap();

    for _ in 0..2 {
        let frame = sub.receive(true).unwrap().unwrap();
        let reader = MessageReader::new(frame.data()).unwrap();
        assert_eq!(reader.event().log_mono_time(), built_at);
    }

    let rebuilt_at = msg.init_event(true).log_mono_time();
    assert!(rebuilt_at > built_at);
}

#[test]
fn test_send_raw_and_prepared_frames() {
    let ctx = InprocContext::create().unwrap();
    let mut sub = InprocSubSocket::create(&ctx, "logMessage").unwrap();
    let mut pm: PubMaster = PubMaster::new(&ctx, ["logMessage"]).unwrap();

    let mut msg = MessageBuilder::new();
    msg.init_event(true).set_payload_bytes(3, b"boot").unwrap();
    let prepared = Message::copy_from_slice(msg.to_bytes());

    assert_eq!(pm.send_message("logMessage", &prepared).unwrap(), prepared.len());
    assert_eq!(pm.send_bytes("logMessage", prepared.data()).unwrap(), prepared.len());

    for _ in 0..2 {
        let frame = sub.receive(true).unwrap().unwrap();
        assert_eq!(frame.data(), prepared.data());
    }
}

#[test]
fn test_multiple_publishers_share_a_topic() {
    assert_eq!(MSG_MULTIPLE_PUBLISHERS, 100);
    let ctx = InprocContext::create().unwrap();
    let config = SubMasterConfig::default().with_conflate(false);
    let mut sm: SubMaster = SubMaster::with_config(&ctx, ["androidLog"], config).unwrap();
    let mut first: PubMaster = PubMaster::new(&ctx, ["androidLog"]).unwrap();
    let mut second: PubMaster = PubMaster::new(&ctx, ["androidLog"]).unwrap();

    let mut msg = MessageBuilder::new();
    msg.init_event(true).set_payload_bytes(1, &[1]).unwrap();
    first.send("androidLog", &mut msg).unwrap();
    msg.init_event(true).set_payload_bytes(1, &[2]).unwrap();
    second.send("androidLog", &mut msg).unwrap();

    assert_eq!(sm.update(100).unwrap(), 1);
    assert_eq!(sm["androidLog"].event().payload_bytes(), &[2]);
}

#[test]
fn test_failed_topic_fails_construction() {
    let ctx = InprocContext::create().unwrap();
    let err = PubMaster::<InprocTransport>::new(&ctx, ["carState", "bad name"]).unwrap_err();
    assert!(matches!(err, CadenceError::InvalidEndpoint(_)));

    let err = PubMaster::<InprocTransport>::new(&ctx, ["", "carState"]).unwrap_err();
    assert!(matches!(err, CadenceError::InvalidEndpoint(_)));
}

#[test]
fn test_rebuilt_after_failure_routes_normally() {
    let ctx = InprocContext::create().unwrap();
    assert!(PubMaster::<InprocTransport>::new(&ctx, ["carState", "bad/name"]).is_err());

    let mut sub = InprocSubSocket::create(&ctx, "carState").unwrap();
    let mut pm: PubMaster = PubMaster::new(&ctx, ["carState"]).unwrap();
    let mut msg = MessageBuilder::new();
    msg.init_event(true);
    pm.send("carState", &mut msg).unwrap();
    assert!(sub.receive(true).unwrap().is_some());
    assert_eq!(InprocPubSocket::connect(&ctx, "carState").unwrap().subscriber_count(), 1);
}
