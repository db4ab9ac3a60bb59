//! DCOM services demo client
//!
//! Resolves the demo exporter, queries the object for the wanted interface
//! through IRemUnknown, then calls it.
//!
//! USAGE:
//!   dcom-services-client [--host HOST] [--port PORT | --binding BINDING] [--verbose] <COMMAND>
//!
//! EXAMPLES:
//!   dcom-services-client alive
//!   dcom-services-client columns --config 'ca01\Issuing CA' CommonName NotAfter
//!   dcom-services-client status --buffer-size 256
//!   dcom-services-client stop --timeout 5000 --force
//!   dcom-services-client --binding "ncacn_ip_tcp:10.0.0.5[1350]" alive

mod common;

use clap::{Parser, Subcommand};
use common::*;
use dcerpc::{CallOptions, DceRpcClient, DceRpcClientBuilder, StringBinding};
use dcom::oxid_resolver::{ObjectExporterClient, ResolveOxidRequest};
use dcom::remunknown::{RemInterfaceRef, RemQueryInterfaceRequest, RemReleaseRequest, RemUnknownClient};
use dcom::types::{protocol_id, Iid, Ipid, OrpcThis};
use msrpc::certview::column_kind;
use msrpc::certview::icertview::{
    CertViewClient, GetColumnCountRequest, GetColumnIndexRequest, OpenConnectionRequest, CERT_VIEW_IID,
};
use msrpc::iiss::iiisservicecontrol::{
    IisServiceControlClient, RebootRequest, StartRequest, StatusRequest, StatusResponse, StopRequest, IIS_SERVICE_CONTROL_IID,
};
use msrpc::oaut::Bstr;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "dcom-services-client")]
#[command(version)]
#[command(about = "Calls the ICertView and IIisServiceControl demo objects")]
struct Args {
    /// Host address to connect to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to connect to
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// String binding such as `ncacn_ip_tcp:host[1350]`; overrides --host and --port
    #[arg(long)]
    binding: Option<StringBinding>,

    /// Log every call
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the exporter for its version and bindings
    Alive,
    /// Open the CA view and look up columns
    Columns {
        /// CA configuration string, `host\CA name`
        #[arg(long, default_value = "localhost\\Demo CA")]
        config: String,
        /// Column names to resolve
        names: Vec<String>,
    },
    /// Query the IIS services
    Status {
        #[arg(long, default_value_t = 512)]
        buffer_size: u32,
    },
    /// Stop the IIS services
    Stop {
        #[arg(long, default_value_t = 30_000)]
        timeout: u32,
        #[arg(long)]
        force: bool,
    },
    /// Start the IIS services
    Start {
        #[arg(long, default_value_t = 30_000)]
        timeout: u32,
    },
    /// Reboot the host
    Reboot {
        #[arg(long, default_value_t = 30_000)]
        timeout: u32,
    },
}

type BoxResult<T> = Result<T, Box<dyn std::error::Error>>;

/// A queried interface pointer, released when done.
struct Acquired {
    rem_unknown: RemUnknownClient,
    ipid: Ipid,
}

impl Acquired {
    /// Resolve the demo exporter and query `unknown` for `iid`.
    async fn query(rpc: &Arc<DceRpcClient>, unknown: Ipid, iid: Iid) -> BoxResult<Self> {
        let exporter = ObjectExporterClient::new(rpc).await?;
        let resolved = exporter
            .resolve_oxid2(
                &ResolveOxidRequest::new(DEMO_OXID, vec![protocol_id::NCACN_IP_TCP]),
                &CallOptions::new(),
            )
            .await?;
        debug!(
            bindings = ?resolved.oxid_bindings.as_ref().and_then(|b| b.tcp_address()),
            version = ?resolved.com_version,
            "resolved exporter"
        );

        let rem_unknown = RemUnknownClient::new(rpc).await?.ipid(resolved.rem_unknown);
        let req = RemQueryInterfaceRequest {
            this: OrpcThis::new(),
            ipid: unknown,
            refs: 1,
            iids: vec![iid],
        };
        let resp = rem_unknown.rem_query_interface(&req, &CallOptions::new()).await?;
        let result = resp.results().first().ok_or("empty RemQueryInterface result")?;
        if result.hresult.is_error() {
            return Err(format!("QueryInterface({iid}) failed: {}", result.hresult).into());
        }
        Ok(Self {
            rem_unknown,
            ipid: result.std.ipid,
        })
    }

    async fn release(self) -> BoxResult<()> {
        let req = RemReleaseRequest {
            this: OrpcThis::new(),
            refs: vec![RemInterfaceRef::new(self.ipid, 1)],
        };
        self.rem_unknown.rem_release(&req, &CallOptions::new()).await?;
        Ok(())
    }
}

async fn alive(rpc: &Arc<DceRpcClient>) -> BoxResult<()> {
    let exporter = ObjectExporterClient::new(rpc).await?;
    let resp = exporter.server_alive2(&CallOptions::new()).await?;
    println!("COM version: {}.{}", resp.com_version.major, resp.com_version.minor);
    if let Some(bindings) = resp.bindings.as_ref() {
        for binding in &bindings.string_bindings {
            println!("binding:     {}", binding.network_addr);
        }
    }
    Ok(())
}

async fn columns(rpc: &Arc<DceRpcClient>, config: String, names: Vec<String>) -> BoxResult<()> {
    let acquired = Acquired::query(rpc, CERT_VIEW_UNKNOWN, CERT_VIEW_IID).await?;
    let view = CertViewClient::new(rpc).await?.ipid(acquired.ipid);
    let opts = CallOptions::new();

    view.open_connection(
        &OpenConnectionRequest {
            this: OrpcThis::new(),
            config: Bstr::new(&config),
        },
        &opts,
    )
    .await?;

    let count = view
        .get_column_count(
            &GetColumnCountRequest {
                this: OrpcThis::new(),
                result_column: column_kind::SCHEMA,
            },
            &opts,
        )
        .await?;
    println!("{config}: {} columns", count.value);

    for name in names {
        let req = GetColumnIndexRequest {
            this: OrpcThis::new(),
            result_column: column_kind::SCHEMA,
            column_name: Bstr::new(&name),
        };
        match view.get_column_index(&req, &opts).await {
            Ok(resp) => println!("  {name:<24} {}", resp.value),
            Err(e) => println!("  {name:<24} {e}"),
        }
    }
    acquired.release().await
}

async fn iis(rpc: &Arc<DceRpcClient>, command: Command) -> BoxResult<()> {
    let acquired = Acquired::query(rpc, IIS_UNKNOWN, IIS_SERVICE_CONTROL_IID).await?;
    let control = IisServiceControlClient::new(rpc).await?.ipid(acquired.ipid);
    let opts = CallOptions::new();

    match command {
        Command::Status { buffer_size } => {
            let req = StatusRequest {
                this: OrpcThis::new(),
                buffer_size,
            };
            let resp = match control.status(&req, &opts).await {
                Ok(resp) => resp,
                Err(err) => {
                    let needed = err.response::<StatusResponse>().map(|r| r.required_buffer_size);
                    match needed {
                        Some(needed) if needed > buffer_size => {
                            debug!(buffer_size, needed, "status buffer too small, retrying");
                            let retry = StatusRequest {
                                this: OrpcThis::new(),
                                buffer_size: needed,
                            };
                            control.status(&retry, &opts).await?
                        }
                        _ => return Err(err.into()),
                    }
                }
            };
            for (name, state) in decode_status(&resp.buffer, resp.num_services as usize) {
                let state = match state {
                    SERVICE_RUNNING => "running",
                    SERVICE_STOPPED => "stopped",
                    _ => "unknown",
                };
                println!("{name:<12} {state}");
            }
        }
        Command::Stop { timeout, force } => {
            let req = StopRequest {
                this: OrpcThis::new(),
                timeout_msecs: timeout,
                force: u32::from(force),
            };
            control.stop(&req, &opts).await?;
            println!("stopped");
        }
        Command::Start { timeout } => {
            let req = StartRequest {
                this: OrpcThis::new(),
                timeout_msecs: timeout,
            };
            control.start(&req, &opts).await?;
            println!("started");
        }
        Command::Reboot { timeout } => {
            let req = RebootRequest {
                this: OrpcThis::new(),
                timeout_msecs: timeout,
                force_apps_closed: 0,
            };
            control.reboot(&req, &opts).await?;
            println!("reboot requested");
        }
        Command::Alive | Command::Columns { .. } => {}
    }
    acquired.release().await
}

#[tokio::main]
async fn main() -> BoxResult<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let binding = args
        .binding
        .unwrap_or_else(|| StringBinding::tcp(args.host, args.port));
    let rpc = Arc::new(DceRpcClientBuilder::new().dial_binding(&binding).await?);

    match args.command {
        Command::Alive => alive(&rpc).await,
        Command::Columns { config, names } => columns(&rpc, config, names).await,
        command => iis(&rpc, command).await,
    }
}
