use std::time::Duration;

use api_types::DiscoveryReport;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use crate::delivery::DeliveryClient;
use crate::delivery::DeliveryOutcome;
use crate::infrastructure::k8s::ClusterApi;
use crate::inventory::Collector;

/// How a single discovery cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The node list could not be fetched, nothing was sent
    CollectionFailed,
    /// The payload could not be built, nothing was sent
    PayloadFailed,
    /// The report was collected but delivery failed
    DeliveryFailed,
    /// The report was collected and the send did not fail
    Completed(DeliveryOutcome),
}

impl CycleOutcome {
    /// A skipped send still counts; only failures before or during delivery do not.
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }
}

/// Runs collect-then-send once on startup and then once per interval.
pub struct Application<C> {
    collector: Collector<C>,
    delivery: DeliveryClient,
    interval: Duration,
    print_payload: bool,
}

impl<C: ClusterApi> Application<C> {
    pub fn new(
        collector: Collector<C>,
        delivery: DeliveryClient,
        interval: Duration,
        print_payload: bool,
    ) -> Self {
        Self {
            collector,
            delivery,
            interval,
            print_payload,
        }
    }

    pub fn delivery(&self) -> &DeliveryClient {
        &self.delivery
    }

    /// Run cycles until the token is cancelled.
    ///
    /// Cancellation is only observed between cycles; a running cycle always finishes.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        info!(interval = ?self.interval, "Starting discovery loop");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    info!("Shutdown signal received, stopping discovery");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// Collect one report and hand it to the delivery client. Failures are logged, never
    /// propagated, so the next tick always runs.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let report = match self.collector.collect().await {
            Ok(report) => report,
            Err(e) => {
                error!("Failed to discover nodes: {e:?}");
                return CycleOutcome::CollectionFailed;
            }
        };

        if let Err(e) = self.print(&report) {
            error!("Failed to create discovery payload: {e:?}");
            return CycleOutcome::PayloadFailed;
        }

        let outcome = match self.delivery.send(&report).await {
            Ok(outcome) => CycleOutcome::Completed(outcome),
            Err(e) => {
                error!("Failed to send discovery result to API: {e:?}");
                CycleOutcome::DeliveryFailed
            }
        };

        info!(
            node_count = report.node_count,
            duration = %report.duration,
            cluster_name = %report.cluster.name,
            cluster_version = %report.cluster.version,
            "Discovery completed"
        );
        outcome
    }

    /// Print the exact payload that will be sent, as pretty JSON on stdout.
    fn print(&self, report: &DiscoveryReport) -> anyhow::Result<()> {
        let envelope = self
            .delivery
            .envelope(report)
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        if self.print_payload {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Ok(())
    }
}
