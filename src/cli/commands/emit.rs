//! `driverlog emit`: push one simulated client and command through the
//! pipeline.
//!
//! Output goes wherever the structured log options point, which by default
//! is stderr. Command events are `Debug` messages, so nothing is printed
//! unless the command component's ceiling allows it.

use bson::{Bson, Document, doc};
use driverlog_core::parse_json_document;

use crate::cli::args::EmitArgs;
use crate::command::{Cmd, CommandError};
use crate::config::LogSettings;
use crate::error::DriverLogError;
use crate::log::StructuredLogOpts;
use crate::monitor::LogAndMonitorInstance;
use crate::observability::install_recorder;
use crate::server_description::ServerDescription;

/// Code reported when `--fail` is given and the reply carries none.
const DEFAULT_FAILURE_CODE: u32 = 8;

/// Emit client creation, then started and succeeded or failed for one
/// command.
///
/// # Errors
///
/// Returns an error if the settings file or a JSON argument is invalid,
/// or if the metrics recorder cannot be installed.
pub fn run(args: &EmitArgs) -> Result<(), DriverLogError> {
    let metrics = if args.print_metrics {
        Some(install_recorder()?)
    } else {
        None
    };

    let opts = match &args.config {
        Some(path) => LogSettings::load(path)?.apply()?,
        None => StructuredLogOpts::new(),
    };
    let instance = LogAndMonitorInstance::with_structured_log_opts(&opts);

    let command = match &args.command {
        Some(json) => parse_json_document(json)?,
        None => {
            let mut command = Document::new();
            command.insert(args.command_name.as_str(), 1);
            command
        }
    };
    let reply = match &args.reply {
        Some(json) => parse_json_document(json)?,
        None if args.fail => doc! { "ok": 0.0, "errmsg": "simulated failure" },
        None => doc! { "ok": 1.0 },
    };

    let cmd = Cmd::new(&args.database, &args.command_name, &command)
        .with_operation_id(args.operation_id);
    let server = ServerDescription::new(args.host.as_str(), args.port);

    tracing::info!(
        command = %args.command_name,
        server = %server.address(),
        serial = instance.serial(),
        "emitting simulated command"
    );

    instance.client_created();
    instance.command_started(&cmd, args.request_id, &server);
    if args.fail {
        let error = server_error(&reply);
        instance.command_failed(
            &cmd,
            args.request_id,
            &server,
            args.duration_micros,
            &reply,
            &error,
        );
    } else {
        instance.command_succeeded(&cmd, args.request_id, &server, args.duration_micros, &reply);
    }

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }
    Ok(())
}

fn server_error(reply: &Document) -> CommandError {
    let code = match reply.get("code") {
        Some(Bson::Int32(code)) => u32::try_from(*code).ok(),
        Some(Bson::Int64(code)) => u32::try_from(*code).ok(),
        _ => None,
    }
    .unwrap_or(DEFAULT_FAILURE_CODE);
    let message = reply.get_str("errmsg").unwrap_or("command failed");
    CommandError::server(code, message)
}
