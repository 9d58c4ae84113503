use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use roster_api::{InProcApi, RosterApi, SearchRequest};
use roster_client::ClientConfig;
use roster_core::FieldMapping;
use roster_query::QueryParams;
use roster_view::{Layout, ViewOptions};
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "rosterctl", version, about = "Search a skills list")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Site root, e.g. https://contoso.example.com/sites/hr
    #[arg(long = "site", env = "ROSTER_SITE_URL", global = true)]
    site: Option<String>,

    /// List title
    #[arg(long = "list", env = "ROSTER_LIST", global = true, default_value = roster_client::config::DEFAULT_LIST)]
    list: String,

    /// Bearer token sent with every request
    #[arg(long = "token", env = "ROSTER_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[arg(long = "connect-timeout-ms", env = "ROSTER_CONNECT_TIMEOUT_MS", global = true, default_value_t = 5_000)]
    connect_timeout_ms: u64,

    #[arg(long = "read-timeout-ms", env = "ROSTER_READ_TIMEOUT_MS", global = true, default_value_t = 30_000)]
    read_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the field mapping in effect
    Fields {
        /// Field mapping JSON file (`[{name, field, value, searchable}]`)
        #[arg(long = "fields")]
        fields: Option<PathBuf>,
    },
    /// Build the list query without sending it
    Query(QueryArgs),
    /// Fetch one page of skills and render it
    Search {
        #[command(flatten)]
        query: QueryArgs,
        /// Hide the result count line
        #[arg(long = "no-count", action = ArgAction::SetTrue)]
        no_count: bool,
        /// Print nothing instead of the no-results message
        #[arg(long = "show-blank", action = ArgAction::SetTrue)]
        show_blank: bool,
        /// Dump fetched records as JSON instead of cards
        #[arg(long = "debug-layout", action = ArgAction::SetTrue)]
        debug_layout: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct QueryArgs {
    /// Free-text term matched against searchable fields
    #[arg(long = "search", short = 's')]
    search: Option<String>,
    /// Raw OData filter combined with the search clause
    #[arg(long = "filter")]
    filter: Option<String>,
    /// OData order, e.g. "Title asc"
    #[arg(long = "order-by")]
    order_by: Option<String>,
    /// Comma-separated select list
    #[arg(long = "select", value_delimiter = ',')]
    select: Vec<String>,
    #[arg(long = "page-size")]
    page_size: Option<u32>,
    /// 1-based page number
    #[arg(long = "page")]
    page: Option<u32>,
    /// Field mapping JSON file (`[{name, field, value, searchable}]`)
    #[arg(long = "fields")]
    fields: Option<PathBuf>,
}

impl QueryArgs {
    fn params(&self) -> QueryParams {
        QueryParams {
            filter: self.filter.clone(),
            order_by: self.order_by.clone(),
            search: self.search.clone(),
            select_fields: self.select.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            page_size: self.page_size,
            page_number: self.page,
        }
    }
}

fn init_tracing() {
    let env = std::env::var("ROSTER_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("ROSTER_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid ROSTER_METRICS_ADDR; expected host:port");
        }
    }
}

fn load_mapping(path: Option<&PathBuf>) -> Result<FieldMapping> {
    let Some(path) = path else { return Ok(FieldMapping::skills_default()) };
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    FieldMapping::from_json(&raw).with_context(|| format!("parsing field mapping {}", path.display()))
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let site = self.site.as_deref().ok_or_else(|| anyhow!("--site or ROSTER_SITE_URL is required"))?;
        Ok(ClientConfig::new(site)
            .with_list(&self.list)
            .with_timeouts(self.connect_timeout_ms, self.read_timeout_ms)
            .with_bearer_token(self.token.clone()))
    }
}

fn print_json<T: Serialize>(v: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Fields { fields } => {
            let mapping = load_mapping(fields.as_ref())?;
            match cli.output {
                Output::Human => {
                    for e in mapping.iter() {
                        let flag = if e.searchable { "searchable" } else { "-" };
                        println!("{} • {} ← {} • {}", e.display_name, e.destination, e.source_path, flag);
                    }
                }
                Output::Json => print_json(&mapping)?,
            }
        }
        Commands::Query(args) => {
            let mapping = load_mapping(args.fields.as_ref())?;
            let api = InProcApi::new(&cli.client_config()?)?;
            let planned = api.plan(&args.params(), &mapping)?;
            info!(url = %planned.url, "query planned");
            match cli.output {
                Output::Human => {
                    let d = &planned.descriptor;
                    println!("select:  {}", d.select.join(","));
                    if !d.expand.is_empty() { println!("expand:  {}", d.expand.join(",")); }
                    if let Some(f) = &d.filter { println!("filter:  {}", f); }
                    if let Some(o) = &d.order_by { println!("orderby: {}", o); }
                    if let Some(t) = d.page_size { println!("top:     {}", t); }
                    if let Some(s) = d.skip { println!("skip:    {}", s); }
                    println!("url:     {}", planned.url);
                }
                Output::Json => print_json(&planned)?,
            }
        }
        Commands::Search { query, no_count, show_blank, debug_layout } => {
            let fields = load_mapping(query.fields.as_ref())?;
            let view = ViewOptions {
                layout: if *debug_layout { Layout::Debug } else { Layout::Cards },
                show_results_count: !*no_count,
                show_blank: *show_blank,
            };
            let api = InProcApi::new(&cli.client_config()?)?;
            let req = SearchRequest { params: query.params(), fields, view };
            match api.search(req).await {
                Ok(resp) => {
                    metrics::counter!("cli_search_total", 1u64, "outcome" => "ok");
                    match cli.output {
                        Output::Human => {
                            print!("{}", resp.view.render(chrono::Utc::now().timestamp()));
                            info!(took_ms = resp.meta.took_ms, "search done");
                        }
                        Output::Json => print_json(&resp)?,
                    }
                }
                Err(e) => {
                    metrics::counter!("cli_search_total", 1u64, "outcome" => "error");
                    error!(error = %e, "search failed");
                    return Err(e.into());
                }
            }
        }
    }
    Ok(())
}
