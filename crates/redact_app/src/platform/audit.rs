use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use redact_engine::{EngineEvent, EngineHandle};

use super::ui::render;
use crate::cli::{AuditArgs, Cli};

pub fn run(cli: &Cli, args: &AuditArgs) -> anyhow::Result<()> {
    let settings = cli.client_settings();
    let wait = settings.request_timeout + Duration::from_secs(5);
    let (engine, events) =
        EngineHandle::with_settings(settings).context("start document service client")?;

    engine.fetch_audit_logs(args.query());

    let event = events
        .recv_timeout(wait)
        .map_err(|_| anyhow!("no answer from {} within {:?}", cli.server_url, wait))?;
    match event {
        EngineEvent::AuditLogsFetched { result } => {
            let entries = result.context("fetch audit logs")?;
            print!("{}", render::audit_table(&entries));
            Ok(())
        }
        other => bail!("unexpected engine event {other:?}"),
    }
}
