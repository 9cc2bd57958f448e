use std::{
    thread,
    time::{Duration, Instant},
};

use provider_records::{Config, Context, Key, PeerId, ProviderManager};

use clap::Parser;

use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Key to announce providers for
    key: String,
    /// Number of remote providers to announce
    #[arg(short, long, default_value_t = 5)]
    providers: usize,
    /// Provider TTL in milliseconds, sweeps run every tenth of it
    #[arg(short, long, default_value_t = 500)]
    ttl: u64,
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let cli = Cli::parse();

    let ttl = Duration::from_millis(cli.ttl);
    let config = Config {
        sweep_interval: ttl / 10,
        provider_ttl: ttl,
        sentinel_ttl: ttl * 7,
        ..Config::default()
    };

    let (ctx, cancel) = Context::background().with_cancel();

    let local = PeerId::random();
    let manager = ProviderManager::new(&ctx, local.clone(), config).expect("failed to start");

    let key = Key::from(cli.key);

    manager.add_provider(&ctx, key.clone(), local);
    manager.add_provider(&ctx, key.clone(), PeerId::sentinel().clone());
    for _ in 0..cli.providers {
        manager.add_provider(&ctx, key.clone(), PeerId::random());
    }

    lookup(&manager, &ctx, &key);
    println!("Local keys: {:?}", manager.get_local());

    println!("\nWaiting for the provider TTL to pass ...\n");
    thread::sleep(ttl * 2);

    lookup(&manager, &ctx, &key);

    cancel.cancel();
    manager.block_until_shutdown();
}

fn lookup(manager: &ProviderManager, ctx: &Context, key: &Key) {
    let start = Instant::now();

    let query = ctx.with_timeout(Duration::from_secs(1));
    let providers = manager.get_providers(&query, key.clone());

    println!(
        "Found {} providers for {:?} in {:?}",
        providers.len(),
        key,
        start.elapsed()
    );

    for peer in providers {
        println!("  {}", peer);
    }
}
