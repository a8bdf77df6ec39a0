use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response};
use once_cell::sync::OnceCell;
use prometheus::{Encoder, TextEncoder};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;

use crate::account_service::pb::account_service_server::AccountServiceServer;
use crate::account_service::AccountServiceSVC;
use crate::accounts::{AccountRegistry, Ledger};
use crate::broadcast::BroadcastHub;
use crate::config::{self, RuntimeConfig};
use crate::market_api::Market;
use crate::market_service::pb::market_service_server::MarketServiceServer;
use crate::market_service::MarketServiceSVC;
use crate::metrics;

pub type StartError = Box<dyn std::error::Error + Send + Sync>;

static INSTANCE: OnceCell<Mutex<Server>> = OnceCell::new();
pub fn instance() -> &'static Mutex<Server> {
    INSTANCE.get_or_init(|| Mutex::new(Server::builder(config::instance().clone())))
}

pub struct Server {
    config: RuntimeConfig,
    pub(crate) market: Arc<Market>,
    pub(crate) accounts: Arc<AccountRegistry>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Server {
    pub fn builder(config: RuntimeConfig) -> Self {
        let hub = BroadcastHub::new(config.subscriber_capacity, config.delivery_timeout());
        let (shutdown, _) = watch::channel(false);
        Server {
            market: Arc::new(Market::new(hub)),
            accounts: Arc::new(AccountRegistry::new()),
            config,
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Starts the ledger, the clearing loop, the gRPC server and the metrics
    /// server.
    ///
    /// # Returns
    ///
    /// The address the gRPC server is bound to
    pub async fn start(&mut self) -> Result<SocketAddr, StartError> {
        self.start_ledger();
        let addr = self.start_grpc_server().await?;
        self.start_metrics_server()?;
        self.start_clearing();
        Ok(addr)
    }

    /// Signals every task to stop and waits for them.
    ///
    /// Open transaction streams end once their subscriptions are closed.
    pub async fn stop(&mut self) {
        log::info!("server stop");
        let _ = self.shutdown.send(true);
        self.market.hub().close_all();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                log::error!("task ended abnormally: {}", e);
            }
        }
    }

    fn start_ledger(&mut self) {
        let subscription = self.market.hub().subscribe_lossless();
        let ledger = Ledger::new(self.accounts.clone(), subscription);
        self.tasks.push(ledger.spawn());
    }

    fn start_clearing(&mut self) {
        let market = self.market.clone();
        let interval = self.config.tick_interval();
        let shutdown = self.shutdown.subscribe();
        self.tasks
            .push(tokio::spawn(async move { market.run(interval, shutdown).await }));
    }

    async fn start_grpc_server(&mut self) -> Result<SocketAddr, StartError> {
        let listener = TcpListener::bind(self.config.addr.as_str()).await?;
        let addr = listener.local_addr()?;
        let account_service = AccountServiceSVC::new(self.accounts.clone());
        let market_service = MarketServiceSVC::new(self.market.clone(), self.config.stream_buffer);
        let mut shutdown = self.shutdown.subscribe();
        let grpc_server = tonic::transport::Server::builder()
            .add_service(AccountServiceServer::new(account_service))
            .add_service(MarketServiceServer::new(market_service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                let _ = shutdown.changed().await;
            });
        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = grpc_server.await {
                log::error!("grpc server error: {}", e);
            }
        }));
        log::info!("grpc server started on {}", addr);
        Ok(addr)
    }

    fn start_metrics_server(&mut self) -> Result<SocketAddr, StartError> {
        let addr: SocketAddr = self.config.metrics_addr.parse()?;
        let make_svc = make_service_fn(move |_| {
            let registry = metrics::REGISTRY_INSTANCE.clone();
            async move {
                Ok::<_, hyper::Error>(service_fn(move |_: Request<Body>| {
                    let registry = registry.clone();
                    async move {
                        let encoder = TextEncoder::new();
                        let metric_families = registry.gather();
                        let mut buffer = Vec::new();
                        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                            log::error!("failed to encode metrics: {}", e);
                        }
                        Ok::<_, hyper::Error>(Response::new(Body::from(buffer)))
                    }
                }))
            }
        });
        metrics::init_registry();
        let server = hyper::Server::try_bind(&addr)?.serve(make_svc);
        let addr = server.local_addr();
        let mut shutdown = self.shutdown.subscribe();
        let server = server.with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        });
        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = server.await {
                log::error!("metrics server error: {}", e);
            }
        }));
        log::info!("metrics server started on {}", addr);
        Ok(addr)
    }
}
