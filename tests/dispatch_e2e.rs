use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use courier::{
    AudioMessage, AudioMessageHandler, DispatchConfig, DocumentMessage, DocumentMessageHandler,
    Event, EventKind, Handler, Hub, ImageMessage, ImageMessageHandler, LiveLocationMessage,
    LiveLocationMessageHandler, LocationMessage, LocationMessageHandler, MediaRef, MessageBody,
    NodeContent, ObserverBuilder, ProtocolNode, RawEnvelope, RawMessageHandler, SessionError,
    StatusHandler, TextMessage, TextMessageHandler, VideoMessage, VideoMessageHandler,
};

const DRAIN: Duration = Duration::from_secs(5);

/// Records every delivery by kind, plus a short payload tag.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(EventKind, String)>>,
}

impl Recorder {
    fn record(&self, kind: EventKind, tag: impl Into<String>) {
        self.seen.lock().unwrap().push((kind, tag.into()));
    }

    fn count(&self, kind: EventKind) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    fn total(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn tags(&self, kind: EventKind) -> Vec<String> {
        let mut tags: Vec<String> = self
            .seen
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, t)| t.clone())
            .collect();
        tags.sort();
        tags
    }
}

impl Handler for Recorder {
    fn handle_error(&self, err: SessionError) {
        self.record(EventKind::Error, err.to_string());
    }
}

impl StatusHandler for Recorder {
    fn handle_status(&self, status: String) {
        self.record(EventKind::StatusText, status);
    }
}

impl TextMessageHandler for Recorder {
    fn handle_text_message(&self, message: TextMessage) {
        self.record(EventKind::Text, message.text);
    }
}

impl ImageMessageHandler for Recorder {
    fn handle_image_message(&self, message: ImageMessage) {
        self.record(EventKind::Image, message.caption);
    }
}

impl VideoMessageHandler for Recorder {
    fn handle_video_message(&self, message: VideoMessage) {
        self.record(EventKind::Video, message.info.id);
    }
}

impl AudioMessageHandler for Recorder {
    fn handle_audio_message(&self, message: AudioMessage) {
        self.record(EventKind::Audio, message.info.id);
    }
}

impl DocumentMessageHandler for Recorder {
    fn handle_document_message(&self, message: DocumentMessage) {
        self.record(EventKind::Document, message.info.id);
    }
}

impl LocationMessageHandler for Recorder {
    fn handle_location_message(&self, message: LocationMessage) {
        self.record(EventKind::Location, message.info.id);
    }
}

impl LiveLocationMessageHandler for Recorder {
    fn handle_live_location_message(&self, message: LiveLocationMessage) {
        self.record(EventKind::LiveLocation, message.info.id);
    }
}

impl RawMessageHandler for Recorder {
    fn handle_raw_message(&self, envelope: RawEnvelope) {
        self.record(EventKind::RawEnvelope, envelope.key.id);
    }
}

fn hub() -> Hub {
    Hub::new(DispatchConfig::default()).unwrap()
}

fn text_envelope(id: &str, text: &str) -> RawEnvelope {
    RawEnvelope::new("chat@s.whatsapp.net", id)
        .with_timestamp(1_600_000_000)
        .with_body(MessageBody::conversation(text))
}

fn image_envelope(id: &str, caption: &str) -> RawEnvelope {
    RawEnvelope::new("chat@s.whatsapp.net", id)
        .with_timestamp(1_600_000_000)
        .with_body(MessageBody::image(caption, MediaRef::default()))
}

#[test]
fn text_and_image_observers_each_get_their_own_kind() {
    let hub = hub();
    let a = Arc::new(Recorder::default());
    let b = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&a)).name("a").text().build());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&b)).name("b").image().build());

    hub.dispatch(ProtocolNode::action([
        text_envelope("T1", "hello"),
        image_envelope("I1", "sunset"),
    ]));
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(a.tags(EventKind::Text), vec!["hello"]);
    assert_eq!(a.count(EventKind::RawEnvelope), 0);
    assert_eq!(a.total(), 1);

    assert_eq!(b.tags(EventKind::Image), vec!["sunset"]);
    assert_eq!(b.total(), 1);
}

#[test]
fn error_with_no_observers_returns_normally() {
    let hub = hub();
    hub.dispatch(SessionError::ConnectionClosed {
        reason: "eof".to_string(),
    });
    hub.wait_idle(DRAIN).unwrap();

    let stats = hub.stats();
    assert_eq!(stats.events, 1);
    assert_eq!(stats.deliveries, 0);
}

#[test]
fn errors_reach_every_observer_regardless_of_capabilities() {
    let hub = hub();
    let plain = Arc::new(Recorder::default());
    let rich = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&plain)).build());
    hub.register(
        ObserverBuilder::from_arc(Arc::clone(&rich))
            .status()
            .text()
            .raw()
            .build(),
    );

    hub.dispatch(SessionError::Timeout { duration_ms: 20_000 });
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(plain.count(EventKind::Error), 1);
    assert_eq!(rich.count(EventKind::Error), 1);
    assert_eq!(rich.total(), 1);
}

#[test]
fn action_node_yields_k_raw_and_d_typed_deliveries() {
    let hub = hub();
    let raw = Arc::new(Recorder::default());
    let typed = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&raw)).raw().build());
    hub.register(
        ObserverBuilder::from_arc(Arc::clone(&typed))
            .text()
            .image()
            .build(),
    );

    // k = 4 envelopes, d = 2 decodable.
    hub.dispatch(ProtocolNode::action([
        text_envelope("1", "one"),
        RawEnvelope::new("chat@s.whatsapp.net", "2")
            .with_body(MessageBody::contact_card("Dee", "BEGIN:VCARD")),
        image_envelope("3", "three"),
        RawEnvelope::new("chat@s.whatsapp.net", "4"),
    ]));
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(raw.tags(EventKind::RawEnvelope), vec!["1", "2", "3", "4"]);
    assert_eq!(raw.total(), 4);
    assert_eq!(typed.tags(EventKind::Text), vec!["one"]);
    assert_eq!(typed.tags(EventKind::Image), vec!["three"]);
    assert_eq!(typed.total(), 2);

    let stats = hub.stats();
    assert_eq!(stats.decode_misses, 2);
}

#[test]
fn raw_and_typed_capabilities_on_one_observer_both_fire() {
    let hub = hub();
    let both = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&both)).text().raw().build());

    hub.dispatch(ProtocolNode::action([text_envelope("X", "dup")]));
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(both.count(EventKind::RawEnvelope), 1);
    assert_eq!(both.count(EventKind::Text), 1);
}

#[test]
fn non_envelope_children_are_skipped() {
    let hub = hub();
    let raw = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&raw)).raw().build());

    let node = ProtocolNode::new("action").with_content(NodeContent::Children(vec![
        courier::NodeChild::Node(ProtocolNode::new("read")),
        courier::NodeChild::Envelope(Box::new(text_envelope("only", "x"))),
    ]));
    hub.dispatch(node);
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(raw.tags(EventKind::RawEnvelope), vec!["only"]);
}

#[test]
fn contacts_response_never_produces_events() {
    let hub = hub();
    let everything = Arc::new(Recorder::default());
    hub.register(
        ObserverBuilder::from_arc(Arc::clone(&everything))
            .status()
            .text()
            .raw()
            .build(),
    );

    let content = NodeContent::Children(vec![courier::NodeChild::Node(
        ProtocolNode::new("user")
            .with_attribute("jid", "5511@s.whatsapp.net")
            .with_attribute("notify", "Rui"),
    )]);
    hub.dispatch(ProtocolNode::contacts_response(content));
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(everything.total(), 0);
    let stats = hub.stats();
    assert_eq!(stats.events, 0);
    assert_eq!(stats.contact_updates, 1);
}

#[test]
fn unrelated_response_does_nothing() {
    let hub = hub();
    let everything = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&everything)).raw().build());

    hub.dispatch(
        ProtocolNode::new("response")
            .with_attribute("type", "chat")
            .with_content(NodeContent::Text("ignored".to_string())),
    );
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(everything.total(), 0);
    let stats = hub.stats();
    assert_eq!(stats.events, 0);
    assert_eq!(stats.contact_updates + stats.contact_failures, 0);
    assert_eq!(stats.ignored_nodes, 1);
}

#[test]
fn status_text_goes_only_to_status_observers() {
    let hub = hub();
    let status = Arc::new(Recorder::default());
    let text = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&status)).status().build());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&text)).text().build());

    hub.dispatch(r#"["Presence",{"id":"1@c.us","type":"available"}]"#);
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(status.count(EventKind::StatusText), 1);
    assert_eq!(text.total(), 0);
}

#[test]
fn top_level_envelope_is_delivered_raw_only() {
    let hub = hub();
    let both = Arc::new(Recorder::default());
    let text_only = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&both)).text().raw().build());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&text_only)).text().build());

    hub.dispatch(text_envelope("TL", "top"));
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(both.tags(EventKind::RawEnvelope), vec!["TL"]);
    assert_eq!(both.count(EventKind::Text), 0);
    assert_eq!(text_only.total(), 0);

    let stats = hub.stats();
    assert_eq!(stats.events, 1);
    assert_eq!(stats.deliveries, 1);
    assert_eq!(stats.decode_misses, 0);
}

#[test]
fn handle_delivers_classified_event_directly() {
    let hub = hub();
    let rec = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&rec)).raw().build());

    // Direct fan-out does not decode.
    let delivered = hub.handle(&Event::from(text_envelope("H", "x")));
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(delivered, 1);
    assert_eq!(rec.count(EventKind::RawEnvelope), 1);
    assert_eq!(rec.count(EventKind::Text), 0);
}

struct Exploder {
    calls: AtomicUsize,
}

impl Handler for Exploder {
    fn handle_error(&self, _err: SessionError) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("observer bug");
    }
}

impl TextMessageHandler for Exploder {
    fn handle_text_message(&self, _message: TextMessage) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("observer bug");
    }
}

#[test]
fn panicking_observer_does_not_affect_others() {
    let hub = Hub::new(DispatchConfig {
        workers: 1,
        ..DispatchConfig::default()
    })
    .unwrap();
    let bad = Arc::new(Exploder {
        calls: AtomicUsize::new(0),
    });
    let good = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&bad)).text().build());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&good)).text().build());

    for i in 0..5 {
        hub.dispatch(ProtocolNode::action([text_envelope(&i.to_string(), "msg")]));
    }
    hub.dispatch(SessionError::other("after"));
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(bad.calls.load(Ordering::SeqCst), 6);
    assert_eq!(good.count(EventKind::Text), 5);
    assert_eq!(good.count(EventKind::Error), 1);
    assert_eq!(hub.stats().panicked, 6);
}

#[test]
fn every_chat_variant_routes_to_its_capability() {
    let hub = hub();
    let rec = Arc::new(Recorder::default());
    hub.register(
        ObserverBuilder::from_arc(Arc::clone(&rec))
            .text()
            .image()
            .video()
            .audio()
            .document()
            .location()
            .live_location()
            .build(),
    );

    let json = serde_json::json!({
        "description": "action",
        "content": { "type": "children", "value": [
            { "type": "envelope", "value": { "key": { "remote_jid": "c", "id": "v" },
                "message": { "video_message": { "seconds": 4 } } } },
            { "type": "envelope", "value": { "key": { "remote_jid": "c", "id": "a" },
                "message": { "audio_message": { "ptt": true } } } },
            { "type": "envelope", "value": { "key": { "remote_jid": "c", "id": "d" },
                "message": { "document_message": { "title": "t" } } } },
            { "type": "envelope", "value": { "key": { "remote_jid": "c", "id": "l" },
                "message": { "location_message": { "degrees_latitude": 1.0, "degrees_longitude": 2.0 } } } },
            { "type": "envelope", "value": { "key": { "remote_jid": "c", "id": "ll" },
                "message": { "live_location_message": { "degrees_latitude": 1.0, "degrees_longitude": 2.0 } } } }
        ]}
    });
    let node: ProtocolNode = serde_json::from_value(json).unwrap();
    hub.dispatch(node);
    hub.wait_idle(DRAIN).unwrap();

    assert_eq!(rec.tags(EventKind::Video), vec!["v"]);
    assert_eq!(rec.tags(EventKind::Audio), vec!["a"]);
    assert_eq!(rec.tags(EventKind::Document), vec!["d"]);
    assert_eq!(rec.tags(EventKind::Location), vec!["l"]);
    assert_eq!(rec.tags(EventKind::LiveLocation), vec!["ll"]);
    assert_eq!(rec.total(), 5);
}

#[test]
fn registration_concurrent_with_dispatch_is_safe() {
    let hub = Arc::new(hub());
    let first = Arc::new(Recorder::default());
    hub.register(ObserverBuilder::from_arc(Arc::clone(&first)).text().build());

    let registrar = {
        let hub = Arc::clone(&hub);
        thread::spawn(move || {
            for _ in 0..50 {
                hub.register(ObserverBuilder::new(Recorder::default()).text().build());
            }
        })
    };

    for i in 0..200 {
        hub.dispatch(ProtocolNode::action([text_envelope(&i.to_string(), "x")]));
    }
    registrar.join().unwrap();
    hub.wait_idle(DRAIN).unwrap();

    // The observer registered up front sees every message exactly once.
    assert_eq!(first.count(EventKind::Text), 200);
    assert_eq!(hub.registry().len(), 51);
}
