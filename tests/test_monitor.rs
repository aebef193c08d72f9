mod common;

use std::sync::{Arc, Mutex};

use bson::RawBsonRef;
use bson::oid::ObjectId;
use common::{RecordingHandler, filter_lock};
use driverlog::{ApmCallbacks, Component, Level, LogAndMonitorInstance, Serial, filter};

/// A topology that announces itself at most once per registration state.
///
/// Opening is deferred until something is listening. A registration change
/// (new serial) means the new listeners have not heard the announcement yet.
struct Topology {
    id: ObjectId,
    announced_for: Option<Serial>,
}

impl Topology {
    const fn new(id: ObjectId) -> Self {
        Self {
            id,
            announced_for: None,
        }
    }

    fn maybe_announce(&mut self, instance: &LogAndMonitorInstance) {
        let listening = instance.has_apm_callbacks()
            || instance
                .structured_log()
                .should_log(Level::Debug, Component::TOPOLOGY);
        if !listening || self.announced_for == Some(instance.serial()) {
            return;
        }
        instance.topology_opening(&self.id);
        self.announced_for = Some(instance.serial());
    }

    fn close(&mut self, instance: &LogAndMonitorInstance) {
        if self.announced_for.take().is_some() {
            instance.topology_closed(&self.id);
        }
    }
}

fn topology_id() -> ObjectId {
    ObjectId::parse_str("0123456789abcdef01234567").unwrap()
}

#[test]
fn serials_are_nonzero_and_unique() {
    let a = LogAndMonitorInstance::new();
    let b = LogAndMonitorInstance::new();
    assert_ne!(a.serial(), 0);
    assert_ne!(b.serial(), 0);
    assert_ne!(a.serial(), b.serial());
}

#[test]
fn every_reconfiguration_issues_a_new_serial() {
    let handler = RecordingHandler::new();
    let mut instance = LogAndMonitorInstance::new();
    let mut seen = vec![instance.serial()];

    instance.set_apm_callbacks(Some(&ApmCallbacks::new()), None);
    seen.push(instance.serial());
    instance.set_structured_log_opts(&handler.opts());
    seen.push(instance.serial());
    instance.set_apm_callbacks(None, None);
    seen.push(instance.serial());

    let mut deduped = seen.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), seen.len());
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn opening_is_deferred_until_someone_listens() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);

    let handler = RecordingHandler::new();
    let mut instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    let mut topology = Topology::new(topology_id());

    topology.maybe_announce(&instance);
    assert_eq!(topology.announced_for, None);

    let opened = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&opened);
    let callbacks = ApmCallbacks::new().on_topology_opening(move |e| {
        sink.lock().unwrap().push(e.topology_id.to_hex());
    });
    instance.set_apm_callbacks(Some(&callbacks), None);

    topology.maybe_announce(&instance);
    topology.maybe_announce(&instance);
    assert_eq!(*opened.lock().unwrap(), vec![topology_id().to_hex()]);
    assert_eq!(topology.announced_for, Some(instance.serial()));

    // New registration: the new listeners get their own announcement.
    instance.set_apm_callbacks(Some(&callbacks), None);
    topology.maybe_announce(&instance);
    assert_eq!(opened.lock().unwrap().len(), 2);

    // Logging stayed at Warning, so nothing was logged.
    assert_eq!(handler.count(), 0);
}

#[test]
fn topology_lifecycle_is_logged_at_debug() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    filter::set_max_level(Component::TOPOLOGY, Level::Debug);

    let handler = RecordingHandler::new();
    let instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    let mut topology = Topology::new(topology_id());

    topology.maybe_announce(&instance);
    instance.server_opening(&topology.id, "db1.example.com", 27018);
    instance.server_closed(&topology.id, "db1.example.com", 27018);
    topology.close(&instance);
    topology.close(&instance);

    let entries = handler.entries();
    let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Starting topology monitoring",
            "Starting server monitoring",
            "Stopped server monitoring",
            "Stopped topology monitoring",
        ]
    );
    assert!(entries.iter().all(|e| e.level == Level::Debug));
    assert!(entries.iter().all(|e| e.component == Component::TOPOLOGY));

    let server = &entries[1].document;
    assert_eq!(server.get_str("topologyId").unwrap(), "0123456789abcdef01234567");
    assert_eq!(server.get_str("serverHost").unwrap(), "db1.example.com");
    assert_eq!(server.get("serverPort").unwrap(), Some(RawBsonRef::Int32(27018)));
    filter::set_max_level_all(Level::Warning);
}

#[test]
fn server_callbacks_receive_context() {
    let mut instance = LogAndMonitorInstance::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let opening = Arc::clone(&seen);
    let closed = Arc::clone(&seen);
    let callbacks = ApmCallbacks::new()
        .on_server_opening(move |e| {
            let pool = e.context.and_then(|c| c.downcast_ref::<u32>()).copied();
            opening.lock().unwrap().push((e.host.to_string(), e.port, pool));
        })
        .on_server_closed(move |e| {
            closed.lock().unwrap().push((e.host.to_string(), e.port, None));
        });
    let context: driverlog::ApmContext = Arc::new(7_u32);
    instance.set_apm_callbacks(Some(&callbacks), Some(context));

    instance.server_opening(&topology_id(), "a", 1);
    instance.server_closed(&topology_id(), "a", 1);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("a".to_string(), 1, Some(7)), ("a".to_string(), 1, None)]
    );
}

#[test]
fn client_creation_is_logged_on_connection_component() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    filter::set_max_level(Component::CONNECTION, Level::Debug);

    let handler = RecordingHandler::new();
    let instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    instance.client_created();

    let entry = handler.last();
    assert_eq!(entry.level, Level::Debug);
    assert_eq!(entry.component, Component::CONNECTION);
    assert_eq!(entry.message, "Client created");
    assert_eq!(entry.document.get_str("driverName").unwrap(), "driverlog");
    assert_eq!(
        entry.document.get_str("driverVersion").unwrap(),
        env!("CARGO_PKG_VERSION")
    );
    filter::set_max_level_all(Level::Warning);
}
