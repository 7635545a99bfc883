//! Top-level context: owns the published snapshot and runs the update worker
//! and the render loop until shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use wxpanel_core::{Config, DisplayError, TemperatureUnit};
use wxpanel_display::{AssetStore, ConsoleSurface, DirAssetStore, DisplaySurface, PresentationSync};
use wxpanel_weather::clock::{is_clock_synchronized, is_daytime};
use wxpanel_weather::{
    ConditionResolver, ConnectivityState, ReconnectPolicy, SnapshotSlot, UpdateOutcome,
    UpdateScheduler, WeatherSnapshot,
};

use crate::probe::LinkProbe;

/// Application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    slot: SnapshotSlot,
    resolver: Arc<ConditionResolver>,
    cancel: CancellationToken,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            slot: SnapshotSlot::new(),
            resolver: Arc::new(ConditionResolver::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Latest known snapshot, `valid == false` until the first success.
    pub fn current_weather(&self) -> Arc<WeatherSnapshot> {
        self.slot.current()
    }

    pub fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.cancel.cancel();
    }

    /// Run until Ctrl-C or [`App::shutdown`].
    pub async fn run(&self) -> Result<()> {
        let worker = UpdateWorker::from_config(&self.config, self.slot.clone())?;
        let sync = PresentationSync::new(
            ConsoleSurface::new(),
            DirAssetStore::from_config(&self.config.display),
        );
        let render = RenderLoop::new(
            sync,
            self.slot.clone(),
            Arc::clone(&self.resolver),
            &self.config,
        );

        tracing::info!(
            location = %self.config.weather.location,
            interval_secs = self.config.weather.update_interval_secs,
            "Weather panel started"
        );

        let worker_task = tokio::spawn(
            worker.run(self.config.connectivity.tick(), self.cancel.clone()),
        );
        let render_task = tokio::spawn(
            render.run(self.config.display.refresh(), self.cancel.clone()),
        );

        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                }
                self.shutdown();
            }
            _ = self.cancel.cancelled() => {}
        }

        worker_task.await.context("Update worker panicked")?;
        render_task.await.context("Render loop panicked")?;
        tracing::info!("Weather panel stopped");
        Ok(())
    }
}

/// Single writer of connectivity state and the snapshot slot.
pub struct UpdateWorker {
    scheduler: UpdateScheduler,
    link: ConnectivityState,
    probe: LinkProbe,
}

impl UpdateWorker {
    pub fn new(scheduler: UpdateScheduler, link: ConnectivityState, probe: LinkProbe) -> Self {
        Self {
            scheduler,
            link,
            probe,
        }
    }

    pub fn from_config(config: &Config, slot: SnapshotSlot) -> Result<Self> {
        let scheduler = UpdateScheduler::from_config(&config.weather, slot)
            .context("Failed to create weather fetcher")?;
        let link = ConnectivityState::new(ReconnectPolicy::from_config(&config.connectivity));
        let probe = LinkProbe::for_endpoint(
            &config.weather.endpoint,
            config.connectivity.probe_timeout(),
        )?;
        Ok(Self::new(scheduler, link, probe))
    }

    #[cfg(test)]
    pub fn link(&self) -> &ConnectivityState {
        &self.link
    }

    /// One pass: reconnect if due, then let the scheduler decide on a fetch.
    pub async fn step(&mut self, now: Instant) -> UpdateOutcome {
        if self.link.should_retry(now) {
            self.link.begin_attempt(now);
            tracing::debug!("Probing {}", self.probe.target());
            let up = self.probe.probe().await;
            self.link.record_attempt(now, up);
        }

        let outcome = self.scheduler.tick(now, &self.link).await;
        if let UpdateOutcome::Failed(err) = &outcome {
            if err.is_link_failure() {
                self.link.link_lost();
            }
        }
        outcome
    }

    pub async fn run(mut self, tick: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    // An in-flight attempt finishes before cancellation is seen.
                    self.step(Instant::now()).await;
                }
            }
        }
        tracing::debug!("Update worker stopped");
    }
}

/// Reads the slot and drives [`PresentationSync`].
pub struct RenderLoop<S, A> {
    sync: PresentationSync<S, A>,
    slot: SnapshotSlot,
    resolver: Arc<ConditionResolver>,
    unit: TemperatureUnit,
    tz: Tz,
}

impl<S: DisplaySurface, A: AssetStore> RenderLoop<S, A> {
    pub fn new(
        sync: PresentationSync<S, A>,
        slot: SnapshotSlot,
        resolver: Arc<ConditionResolver>,
        config: &Config,
    ) -> Self {
        Self {
            sync,
            slot,
            resolver,
            unit: config.weather.temperature_unit,
            tz: config.display.tz(),
        }
    }

    #[cfg(test)]
    pub fn sync(&self) -> &PresentationSync<S, A> {
        &self.sync
    }

    /// Day/night from the local clock, or the provider's flag until the
    /// clock has been synchronized.
    fn daytime_at(&self, snapshot: &WeatherSnapshot, now: DateTime<Utc>) -> bool {
        if is_clock_synchronized(now) {
            is_daytime(now, self.tz)
        } else {
            snapshot.is_day.unwrap_or(true)
        }
    }

    pub fn render_once(&mut self, now: DateTime<Utc>) -> Result<(), DisplayError> {
        let published = self.slot.published();
        let snapshot = published.snapshot;
        let resolution = self
            .resolver
            .resolve(snapshot.condition_code, self.daytime_at(&snapshot, now));

        let rendered = self.sync.render(&snapshot, &resolution, self.unit, self.tz);
        self.sync.show_status(&published.status)?;
        rendered
    }

    pub async fn run(mut self, refresh: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(refresh);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let slot = self.slot.clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
                _ = slot.changed() => {}
            }
            if let Err(e) = self.render_once(Utc::now()) {
                tracing::warn!("Render failed: {} ({})", e, e.user_message());
            }
        }
        tracing::debug!("Render loop stopped");
    }
}
