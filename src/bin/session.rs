//! Session driver binary
//!
//! Runs every task of a cluster in one process over the in-process
//! fabric, opens a distributed context on the configured task, then
//! closes it again.

use std::sync::Arc;

use tracing::{error, info};
use vortex_dist::cluster::concat_task_name;
use vortex_dist::metrics::gather_system_metrics;
use vortex_dist::remote::InProcessFabric;
use vortex_dist::{DistributedContextConfiguration, ServerContext};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path =
        std::env::var("VORTEX_CLUSTER_CONFIG").unwrap_or_else(|_| "cluster.toml".into());
    let context_id: u64 = std::env::var("CONTEXT_ID")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    info!("Loading cluster configuration from {}", config_path);
    let config = DistributedContextConfiguration::from_file(&config_path)?.with_env_overrides();
    config.validate()?;

    // One server per task, all reachable through the same fabric
    let fabric = InProcessFabric::new();
    let mut servers = Vec::new();
    for job in &config.cluster.jobs {
        for task in &job.tasks {
            let task_name = concat_task_name(&job.name, task.id);
            let server = Arc::new(ServerContext::new(Arc::new(fabric.clone())));
            fabric.register(task_name.clone(), &server);
            servers.push((task_name, server));
        }
    }

    let local_name = concat_task_name(&config.job_name, config.task_id);
    let local = servers
        .iter()
        .find(|(name, _)| *name == local_name)
        .map(|(_, server)| server.clone())
        .ok_or_else(|| format!("no server for local task {}", local_name))?;

    let context = local.create_distributed_context(context_id, config)?;
    info!("Opening context {} from {}", context_id, local_name);

    if let Err(e) = context.create_remote_contexts_async().await {
        error!("Failed to create remote contexts: {}", e);
        return Err(e.into());
    }

    for name in context.collective_groups().names() {
        let group = context.get_collective_group(name)?;
        info!("Collective group {} has {} members", name, group.len());
    }
    for (name, server) in &servers {
        info!(
            "{}: {} context(s), {} device(s)",
            name,
            server.context_count(),
            server.device_manager().len()
        );
    }

    info!("Closing context {}", context_id);
    context.close_remote_contexts_async().await?;
    local.close_distributed_context(context_id)?;

    print!("{}", gather_system_metrics());
    Ok(())
}
