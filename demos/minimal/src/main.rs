// demos/minimal/src/main.rs
// ============================================================================
// Module: Converge Minimal Demo
// Description: Minimal end-to-end apply and re-apply using in-memory fakes.
// Purpose: Demonstrate the event stream across two runs, including pruning.
// Dependencies: converge-core, converge-testkit
// ============================================================================

//! ## Overview
//! Applies two config maps against an empty cluster, then re-applies with
//! one of them removed so the second run prunes it. Every event of both
//! runs is written to stdout. The demo is backend-free and suitable for
//! quick verification.

use std::io::Write;

use converge_core::Applier;
use converge_core::ApplierOptions;
use converge_core::Event;
use converge_core::InventoryInfo;
use converge_core::ResourceManifest;
use converge_testkit::FakeActuator;
use converge_testkit::MemoryInventoryClient;
use converge_testkit::ScriptedStatusWatcher;
use converge_testkit::manifests;
use tokio_util::sync::CancellationToken;

/// Runs one apply and writes its events.
async fn run(
    out: &mut impl Write,
    engine: &Applier,
    info: &InventoryInfo,
    desired: Vec<ResourceManifest>,
) -> std::io::Result<()> {
    let mut rx = engine.run(
        info.clone(),
        desired,
        ApplierOptions::default(),
        CancellationToken::new(),
    );
    while let Some(event) = rx.recv().await {
        match event {
            Event::Init(init) => {
                writeln!(out, "plan: {} tasks", init.action_groups.len())?;
            }
            Event::Apply(apply) => {
                writeln!(out, "apply {}: {}", apply.id, apply.operation.as_str())?;
            }
            Event::Prune(prune) => {
                writeln!(out, "prune {}: {}", prune.id, prune.operation.as_str())?;
            }
            Event::Wait(wait) => {
                writeln!(out, "wait {}: {}", wait.id, wait.operation.as_str())?;
            }
            Event::Status(status) => {
                writeln!(out, "status {}: {}", status.id, status.status.as_str())?;
            }
            Event::Delete(delete) => {
                writeln!(out, "delete {}: {}", delete.id, delete.operation.as_str())?;
            }
            Event::Error(error) => {
                writeln!(out, "error: {}", error.error)?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let actuator = FakeActuator::new();
    let inventory = MemoryInventoryClient::new();
    let engine = match Applier::builder()
        .actuator(actuator)
        .status_watcher(ScriptedStatusWatcher::new(Vec::new()))
        .inventory_client(inventory)
        .build_applier()
    {
        Ok(engine) => engine,
        Err(error) => {
            let mut err = std::io::stderr();
            writeln!(err, "builder failure: {error}")?;
            return Ok(());
        }
    };
    let info = InventoryInfo::new("inventory", "default", "demo");

    let settings = manifests::config_map("default", "settings");
    let feature_flags = manifests::config_map("default", "feature-flags");

    let mut out = std::io::stdout();
    writeln!(out, "== first run: apply both ==")?;
    run(&mut out, &engine, &info, vec![settings.clone(), feature_flags.clone()]).await?;

    writeln!(out, "== second run: feature-flags removed ==")?;
    run(&mut out, &engine, &info, vec![settings]).await?;

    Ok(())
}
