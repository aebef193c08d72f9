mod common;

use std::sync::{Arc, Mutex};

use bson::oid::ObjectId;
use bson::{Document, RawBsonRef, RawDocumentBuf, doc, rawdoc};
use common::{RecordingHandler, filter_lock};
use driverlog::{
    ApmCallbacks, ApmContext, Cmd, CmdPayload, CommandError, Component, Level,
    LogAndMonitorInstance, ServerDescription, filter,
};

/// The embedded `failure` document of a materialized entry.
fn failure(document: &RawDocumentBuf) -> Document {
    Document::try_from(document.get_document("failure").unwrap()).unwrap()
}

fn server() -> ServerDescription {
    ServerDescription::new("db1.example.com", 27017)
        .with_connection_id(12)
        .with_service_id(ObjectId::parse_str("65f1a0c2b3d4e5f60718293a").unwrap())
}

#[test]
fn started_event_carries_full_command() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    filter::set_max_level(Component::COMMAND, Level::Debug);

    let handler = RecordingHandler::new();
    let instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    let body = doc! { "find": "users", "filter": { "age": 30 } };
    let cmd = Cmd::new("app", "find", &body).with_operation_id(77);

    instance.command_started(&cmd, 5, &server());

    let entry = handler.last();
    assert_eq!(entry.level, Level::Debug);
    assert_eq!(entry.component, Component::COMMAND);
    assert_eq!(entry.message, "Command started");
    assert_eq!(
        entry.document,
        rawdoc! {
            "message": "Command started",
            "requestId": 5,
            "serverHost": "db1.example.com",
            "serverPort": 27017,
            "serverConnectionId": 12_i64,
            "serviceId": "65f1a0c2b3d4e5f60718293a",
            "databaseName": "app",
            "commandName": "find",
            "operationId": 77_i64,
            "command": r#"{"find":"users","filter":{"age":30}}"#,
        }
    );
}

#[test]
fn succeeded_event_redacts_sensitive_reply() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    filter::set_max_level(Component::COMMAND, Level::Debug);

    let handler = RecordingHandler::new();
    let instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    let body = doc! { "saslStart": 1, "payload": "secret" };
    let reply = doc! { "ok": 1.0, "payload": "server-secret" };
    let cmd = Cmd::new("admin", "saslStart", &body);
    let sd = ServerDescription::new("localhost", 27017);

    instance.command_started(&cmd, 1, &sd);
    instance.command_succeeded(&cmd, 1, &sd, 2500, &reply);

    let entries = handler.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].document.get_str("command").unwrap(), "{}");

    let succeeded = &entries[1].document;
    assert_eq!(entries[1].message, "Command succeeded");
    assert_eq!(succeeded.get_str("reply").unwrap(), "{}");
    assert_eq!(succeeded.get("durationMS").unwrap(), Some(RawBsonRef::Int32(2)));
    assert_eq!(succeeded.get("durationMicros").unwrap(), Some(RawBsonRef::Int64(2500)));
    assert!(succeeded.get("command").unwrap().is_none());
    assert!(succeeded.get("serviceId").unwrap().is_none());
}

#[test]
fn speculative_hello_is_redacted() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    filter::set_max_level(Component::COMMAND, Level::Debug);

    let handler = RecordingHandler::new();
    let instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    let body = doc! { "hello": 1, "speculativeAuthenticate": { "mechanism": "SCRAM-SHA-256" } };
    let cmd = Cmd::new("admin", "hello", &body);

    instance.command_started(&cmd, 2, &ServerDescription::new("localhost", 27017));
    assert_eq!(handler.last().document.get_str("command").unwrap(), "{}");
}

#[test]
fn failed_event_shapes_failure() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    filter::set_max_level(Component::COMMAND, Level::Debug);

    let handler = RecordingHandler::new();
    let instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    let body = doc! { "insert": "coll" };
    let reply = doc! { "ok": 0, "code": 11000, "errmsg": "duplicate key" };
    let cmd = Cmd::new("app", "insert", &body);
    let sd = ServerDescription::new("localhost", 27017);

    instance.command_failed(&cmd, 3, &sd, 10, &reply, &CommandError::server(11000, "duplicate key"));
    assert_eq!(failure(&handler.last().document), reply);

    instance.command_failed(
        &cmd,
        4,
        &sd,
        10,
        &doc! {},
        &CommandError::local(2, 6, "socket timeout"),
    );
    let local_failure = handler.last().document;
    assert_eq!(
        failure(&local_failure),
        doc! { "code": 6, "domain": 2, "message": "socket timeout" }
    );
    assert_eq!(local_failure.get("durationMS").unwrap(), Some(RawBsonRef::Int32(0)));
}

#[test]
fn payload_sequences_are_merged_into_command() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);
    filter::set_max_level(Component::COMMAND, Level::Debug);

    let handler = RecordingHandler::new();
    let instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());
    let body = doc! { "insert": "coll", "ordered": true };
    let docs = [doc! { "_id": 1 }];
    let payloads = [CmdPayload {
        identifier: "documents",
        documents: &docs,
    }];
    let cmd = Cmd::new("app", "insert", &body).with_payloads(&payloads);

    instance.command_started(&cmd, 1, &ServerDescription::new("localhost", 27017));
    assert_eq!(
        handler.last().document.get_str("command").unwrap(),
        r#"{"insert":"coll","ordered":true,"documents":[{"_id":1}]}"#
    );
}

#[test]
fn apm_callbacks_fire_even_when_logging_is_filtered() {
    let _guard = filter_lock();
    filter::set_max_level_all(Level::Warning);

    let handler = RecordingHandler::new();
    let mut instance = LogAndMonitorInstance::with_structured_log_opts(&handler.opts());

    let events = Arc::new(Mutex::new(Vec::new()));
    let started = Arc::clone(&events);
    let succeeded = Arc::clone(&events);
    let failed = Arc::clone(&events);
    let callbacks = ApmCallbacks::new()
        .on_command_started(move |e| {
            let tag = e.context.and_then(|c| c.downcast_ref::<&str>()).copied();
            started
                .lock()
                .unwrap()
                .push(format!("started {} {} {:?}", e.command_name, e.request_id, tag));
        })
        .on_command_succeeded(move |e| {
            succeeded
                .lock()
                .unwrap()
                .push(format!("succeeded {} {}", e.command_name, e.duration_micros));
        })
        .on_command_failed(move |e| {
            failed
                .lock()
                .unwrap()
                .push(format!("failed {} {}", e.command_name, e.error.code));
        });
    let context: ApmContext = Arc::new("tag");
    instance.set_apm_callbacks(Some(&callbacks), Some(context));

    let body = doc! { "ping": 1 };
    let cmd = Cmd::new("admin", "ping", &body);
    let sd = ServerDescription::new("localhost", 27017);
    instance.command_started(&cmd, 9, &sd);
    instance.command_succeeded(&cmd, 9, &sd, 42, &doc! { "ok": 1.0 });
    instance.command_failed(&cmd, 10, &sd, 1, &doc! {}, &CommandError::local(2, 5, "x"));

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "started ping 9 Some(\"tag\")".to_string(),
            "succeeded ping 42".to_string(),
            "failed ping 5".to_string(),
        ]
    );
    assert_eq!(handler.count(), 0);
}
