use clap::{Args, Parser, Subcommand, ValueEnum};
use cosched_client::{ApiClient, ApiClientConfig, ClusterReader};
use cosched_core::{from_manifest, ConflictPolicy, CoScheduleConfig, Node, ObjectKey, Pod};
use cosched_extender::{ExtenderConfig, ExtenderServer, ExtenderState};
use cosched_scheduler::{CoSchedulePlugin, CycleContext, Framework};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "cosched",
    about = "Co-schedules KubeVirt VM pods with their Longhorn share-manager"
)]
struct Cli {
    #[command(flatten)]
    cluster: ClusterArgs,

    #[command(flatten)]
    plugin: PluginArgs,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "COSCHED_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler extender endpoint
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8888", env = "COSCHED_BIND")]
        bind: String,
    },
    /// Evaluate one pod against a set of candidate nodes and print the outcome
    Check {
        /// Pod to evaluate, as namespace/name
        #[arg(long, conflicts_with = "pod_file", required_unless_present = "pod_file")]
        pod: Option<String>,
        /// Pod manifest (YAML or JSON) to evaluate instead of fetching one
        #[arg(long)]
        pod_file: Option<PathBuf>,
        /// Candidate node names
        #[arg(long, value_delimiter = ',', required = true)]
        nodes: Vec<String>,
    },
}

/// How to reach the API server
#[derive(Args)]
struct ClusterArgs {
    /// API server URL; the in-cluster configuration is used when absent
    #[arg(long, global = true, env = "COSCHED_API_URL")]
    api_url: Option<String>,
    /// File holding a bearer token
    #[arg(long, global = true, env = "COSCHED_TOKEN_FILE")]
    token_file: Option<PathBuf>,
    /// PEM bundle to trust for the API server certificate
    #[arg(long, global = true, env = "COSCHED_CA_FILE")]
    ca_file: Option<PathBuf>,
    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,
    /// Deadline for the cluster lookups of one scheduling request
    #[arg(long, global = true, default_value_t = 5, env = "COSCHED_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: u64,
}

/// Overrides of the plugin's contract constants
#[derive(Args)]
struct PluginArgs {
    /// Namespace Longhorn runs its share-managers in
    #[arg(long, global = true, default_value = "longhorn-system", env = "COSCHED_COMPANION_NAMESPACE")]
    companion_namespace: String,
    /// Name prefix of share-manager pods
    #[arg(long, global = true, default_value = "share-manager-")]
    share_manager_prefix: String,
    /// What to do when several claims resolve to different nodes (first-match or report)
    #[arg(long, global = true, default_value = "first-match", env = "COSCHED_CONFLICT_POLICY")]
    conflict_policy: ConflictPolicy,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format);

    let request_timeout = Duration::from_secs(cli.cluster.request_timeout_secs);
    let config = plugin_config(&cli.plugin);
    let reader: Arc<dyn ClusterReader> = Arc::new(create_api_client(&cli.cluster, request_timeout)?);
    let plugin = Arc::new(CoSchedulePlugin::new(reader.clone(), config)?);

    match cli.command {
        Commands::Serve { bind } => run_serve(plugin, &bind, request_timeout).await,
        Commands::Check {
            pod,
            pod_file,
            nodes,
        } => run_check(plugin, reader, pod, pod_file, nodes, request_timeout).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn plugin_config(args: &PluginArgs) -> CoScheduleConfig {
    CoScheduleConfig {
        companion_namespace: args.companion_namespace.clone(),
        share_manager_prefix: args.share_manager_prefix.clone(),
        conflict_policy: args.conflict_policy,
        ..Default::default()
    }
}

/// Build the API client from flags, falling back to the in-cluster configuration
fn create_api_client(args: &ClusterArgs, request_timeout: Duration) -> miette::Result<ApiClient> {
    let mut config = match &args.api_url {
        Some(url) => ApiClientConfig::new(url.clone()),
        None => ApiClientConfig::in_cluster()?,
    };

    if let Some(path) = &args.token_file {
        config = config.with_token_file(path)?;
    }
    if let Some(path) = &args.ca_file {
        config = config.with_ca_file(path)?;
    }
    config.accept_invalid_certs = args.insecure;
    let config = config.with_request_timeout(request_timeout);

    info!(api_url = %config.base_url, "Using API server");
    Ok(ApiClient::new(&config)?)
}

/// Run the extender until ctrl-c
async fn run_serve(
    plugin: Arc<CoSchedulePlugin>,
    bind: &str,
    request_timeout: Duration,
) -> miette::Result<()> {
    let listen_addr: std::net::SocketAddr = bind
        .parse()
        .map_err(|e| miette::miette!("Invalid bind address '{}': {}", bind, e))?;

    let token = CancellationToken::new();
    let state = Arc::new(ExtenderState::new(plugin, request_timeout, token.clone()));
    let server = ExtenderServer::new(ExtenderConfig { listen_addr }, state);

    serve_until(server, token, tokio::signal::ctrl_c()).await
}

/// Serve until `shutdown` resolves, returning early if the server fails
async fn serve_until<F>(
    server: ExtenderServer,
    token: CancellationToken,
    shutdown: F,
) -> miette::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    let mut server_handle = tokio::spawn(server.run());

    tokio::select! {
        result = &mut server_handle => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(miette::miette!("Extender server error: {}", e)),
                Err(e) => Err(miette::miette!("Extender server task failed: {}", e)),
            };
        }
        signal = shutdown => {
            signal.map_err(|e| miette::miette!("Failed to listen for ctrl-c: {}", e))?;
        }
    }

    info!("Shutting down gracefully...");
    token.cancel();

    let shutdown_timeout = Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, server_handle).await {
        Ok(Ok(Err(e))) => error!("Extender server error during shutdown: {}", e),
        Ok(Err(e)) => error!("Extender server task failed: {}", e),
        Err(_) => warn!("Extender server did not stop within {:?}", shutdown_timeout),
        Ok(Ok(Ok(()))) => {}
    }

    info!("Shutdown complete");

    Ok(())
}

/// Filter and score one pod against the given nodes
async fn run_check(
    plugin: Arc<CoSchedulePlugin>,
    reader: Arc<dyn ClusterReader>,
    pod_ref: Option<String>,
    pod_file: Option<PathBuf>,
    node_names: Vec<String>,
    request_timeout: Duration,
) -> miette::Result<()> {
    let pod = load_pod(reader.as_ref(), pod_ref, pod_file).await?;
    let pod_key = ObjectKey::for_pod(&pod);

    let nodes: Vec<Node> = node_names
        .iter()
        .map(|name| {
            let mut node = Node::default();
            node.metadata.name = Some(name.clone());
            node
        })
        .collect();

    let gate = plugin.gate(&pod);
    let ctx = CycleContext::background().with_timeout(request_timeout);
    let outcome = Framework::with_plugin(plugin)
        .run_cycle(&ctx, &pod, &nodes)
        .await?;

    println!("pod:  {}", pod_key);
    println!("gate: {:?}", gate);
    println!();
    println!("{:<24} {:<14} {:>6}  REASON", "NODE", "FILTER", "SCORE");
    for result in &outcome.filter_results {
        let score = outcome
            .scores
            .iter()
            .find(|(name, _)| *name == result.node_name)
            .map(|(_, score)| score.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<14} {:>6}  {}",
            result.node_name,
            result.code.to_string(),
            score,
            result.reason.as_deref().unwrap_or("")
        );
    }
    println!();
    match &outcome.selected {
        Some(node) => println!("selected: {}", node),
        None => println!("selected: none (no feasible node)"),
    }

    Ok(())
}

async fn load_pod(
    reader: &dyn ClusterReader,
    pod_ref: Option<String>,
    pod_file: Option<PathBuf>,
) -> miette::Result<Pod> {
    if let Some(path) = pod_file {
        let data = std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("Failed to read pod manifest '{}': {}", path.display(), e))?;
        return Ok(from_manifest(&data)?);
    }

    let reference = pod_ref.ok_or_else(|| miette::miette!("Either --pod or --pod-file is required"))?;
    let key = ObjectKey::parse(&reference)?;

    reader
        .get_pod(&key.namespace, &key.name)
        .await?
        .ok_or_else(|| miette::miette!("Pod {} not found", key))
}
