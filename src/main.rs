/*
 *  main.rs
 *
 *  Cabinet - insert coin
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runs the panel test on the cabinet hardware, or emulated
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use tokio::signal::unix::{SignalKind, signal};

use cabinet::config::{self, Cli};
use cabinet::display::ChipFactory;
use cabinet::input::{EncoderBank, InputPoller, lines::open_lines};
use cabinet::pacer::{Pacer, TickMode};
use cabinet::panel_test::{CounterView, PanelTest, PanelTestListener};
use cabinet::scheduler::Runtime;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", config::to_yaml(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_millis()
        .init();

    info!("{} - insert coin", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let emulated = cfg.is_emulated();
    let display = ChipFactory::build_manager(&cfg);

    let encoders = Arc::new(EncoderBank::new());
    let pins = cfg.encoder_pins();
    let poller = InputPoller::spawn(Arc::clone(&encoders), cfg.poll_interval(), move || {
        open_lines(&pins, emulated)
    })
    .context("starting encoder poll thread")?;

    let pacer = match cfg.tick_mode() {
        TickMode::Fixed => Pacer::fixed(cfg.tick_period()),
        TickMode::Tempo => Pacer::tempo(cfg.default_bpm()),
    };

    let mut runtime = Runtime::new(
        PanelTest::new(cfg.default_bpm()),
        Box::new(CounterView::new()),
        display,
        encoders,
        pacer,
    )
    .with_poller(poller)
    .with_listener(Box::new(PanelTestListener))
    .with_stats_interval(cfg.stats_interval());

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    let worker = tokio::task::spawn_blocking(move || {
        runtime.run(&flag);
        runtime
    });

    if let Err(e) = signal_handler().await {
        error!("Signal handling failed: {}", e);
    }
    running.store(false, Ordering::Release);

    let runtime = worker.await.context("scheduler thread panicked")?;
    let model = runtime.shutdown();
    info!("Final counters {:?} at {} bpm", model.counters, model.bpm);
    Ok(())
}
